use mongodb::bson::{oid::ObjectId, Document};
use serde::{Deserialize, Serialize};

use super::unix_now;
use crate::validation::{is_object_id, Validate, ValidationErrors};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "precio")]
    pub price: i64,
    pub stock: i64,
    #[serde(rename = "descripcion")]
    pub description: String,
    /// Advisory reference to a category; never checked for existence
    #[serde(rename = "categoria_id")]
    pub category_id: ObjectId,
    pub timestamp: i64,
}

/// Body of POST /productos
#[derive(Debug, Default, Deserialize)]
pub struct ProductInput {
    #[serde(default)]
    pub nombre: String,
    pub precio: Option<i64>,
    pub stock: Option<i64>,
    #[serde(default)]
    pub descripcion: String,
    #[serde(default)]
    pub categoria_id: String,
}

impl Validate for ProductInput {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if errors.required("nombre", &self.nombre) {
            errors.min_chars("nombre", self.nombre.trim(), 2);
            errors.max_chars("nombre", self.nombre.trim(), 100);
        }
        match self.precio {
            Some(price) => errors.greater_than("precio", price, 0),
            None => errors.add("precio", "El campo 'precio' es requerido".to_string()),
        }
        match self.stock {
            Some(stock) => errors.at_least("stock", stock, 0),
            None => errors.add("stock", "El campo 'stock' es requerido".to_string()),
        }
        if errors.required("descripcion", &self.descripcion) {
            errors.min_chars("descripcion", self.descripcion.trim(), 10);
        }
        if errors.required("categoria_id", &self.categoria_id) {
            errors.exact_chars("categoria_id", &self.categoria_id, 24);
            if self.categoria_id.len() == 24 {
                errors.format("categoria_id", is_object_id(&self.categoria_id));
            }
        }

        errors.into_result()
    }
}

impl ProductInput {
    /// Build the stored product. Call after `validate`.
    pub fn into_product(self) -> Result<Product, ValidationErrors> {
        let category_id = ObjectId::parse_str(&self.categoria_id).map_err(|_| {
            let mut errors = ValidationErrors::new();
            errors.format("categoria_id", false);
            errors
        })?;

        Ok(Product {
            id: None,
            name: self.nombre.trim().to_string(),
            price: self.precio.unwrap_or_default(),
            stock: self.stock.unwrap_or_default(),
            description: self.descripcion.trim().to_string(),
            category_id,
            timestamp: unix_now(),
        })
    }
}

/// Body of PUT /productos/:id. Only the fields present in the payload change,
/// so an explicit `"stock": 0` is applied rather than ignored.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateProductInput {
    pub nombre: Option<String>,
    pub precio: Option<i64>,
    pub stock: Option<i64>,
    pub descripcion: Option<String>,
    pub categoria_id: Option<String>,
}

impl UpdateProductInput {
    pub fn is_empty(&self) -> bool {
        self.nombre.is_none()
            && self.precio.is_none()
            && self.stock.is_none()
            && self.descripcion.is_none()
            && self.categoria_id.is_none()
    }

    /// Merge-patch of the provided fields. Call after `validate`.
    pub fn to_patch(&self) -> Result<Document, ValidationErrors> {
        let mut patch = Document::new();

        if let Some(name) = &self.nombre {
            patch.insert("nombre", name.trim());
        }
        if let Some(price) = self.precio {
            patch.insert("precio", price);
        }
        if let Some(stock) = self.stock {
            patch.insert("stock", stock);
        }
        if let Some(description) = &self.descripcion {
            patch.insert("descripcion", description.trim());
        }
        if let Some(category_id) = &self.categoria_id {
            let id = ObjectId::parse_str(category_id).map_err(|_| {
                let mut errors = ValidationErrors::new();
                errors.format("categoria_id", false);
                errors
            })?;
            patch.insert("categoria_id", id);
        }

        Ok(patch)
    }
}

impl Validate for UpdateProductInput {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if let Some(name) = &self.nombre {
            if errors.required("nombre", name) {
                errors.min_chars("nombre", name.trim(), 2);
                errors.max_chars("nombre", name.trim(), 100);
            }
        }
        if let Some(price) = self.precio {
            errors.greater_than("precio", price, 0);
        }
        if let Some(stock) = self.stock {
            errors.at_least("stock", stock, 0);
        }
        if let Some(description) = &self.descripcion {
            if errors.required("descripcion", description) {
                errors.min_chars("descripcion", description.trim(), 10);
            }
        }
        if let Some(category_id) = &self.categoria_id {
            errors.format("categoria_id", is_object_id(category_id));
        }

        errors.into_result()
    }
}
