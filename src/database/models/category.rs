use mongodb::bson::{doc, oid::ObjectId, Document};
use serde::{Deserialize, Serialize};

use super::unix_now;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    #[serde(rename = "nombre")]
    pub name: String,
    /// Derived from `name` on every write, never set directly
    pub slug: String,
    pub timestamp: i64,
}

impl Category {
    pub fn new(name: &str) -> Self {
        let name = name.trim().to_string();
        Self {
            id: None,
            slug: slug::slugify(&name),
            name,
            timestamp: unix_now(),
        }
    }
}

/// Body of POST and PUT /categorias
#[derive(Debug, Default, Deserialize)]
pub struct CategoryInput {
    #[serde(default)]
    pub nombre: String,
}

impl CategoryInput {
    pub fn has_name(&self) -> bool {
        !self.nombre.trim().is_empty()
    }

    /// Rename patch: name and slug always change together
    pub fn to_patch(&self) -> Document {
        let name = self.nombre.trim();
        doc! { "nombre": name, "slug": slug::slugify(name) }
    }
}
