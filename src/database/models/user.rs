use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

use super::unix_now;
use crate::validation::{is_strong_password, Validate, ValidationErrors};

/// Stored account. Only the bcrypt hash of the password is ever persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "correo")]
    pub email: String,
    #[serde(rename = "telefono")]
    pub phone: String,
    pub password_hash: String,
    pub timestamp: i64,
}

/// Body of POST /seguridad/registro
#[derive(Debug, Default, Deserialize)]
pub struct RegisterInput {
    #[serde(default)]
    pub nombre: String,
    #[serde(default)]
    pub correo: String,
    #[serde(default)]
    pub telefono: String,
    #[serde(default)]
    pub password: String,
}

impl RegisterInput {
    pub fn into_user(self, password_hash: String) -> User {
        User {
            id: None,
            name: self.nombre.trim().to_string(),
            email: self.correo.trim().to_string(),
            phone: self.telefono.trim().to_string(),
            password_hash,
            timestamp: unix_now(),
        }
    }
}

impl Validate for RegisterInput {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.required("nombre", &self.nombre);
        if errors.required("correo", &self.correo) {
            errors.email("correo", self.correo.trim());
        }
        if errors.required("telefono", &self.telefono) {
            errors.numeric("telefono", self.telefono.trim());
        }
        if errors.required("password", &self.password) {
            errors.format("password", is_strong_password(&self.password));
        }
        errors.into_result()
    }
}

/// Body of POST /seguridad/login
#[derive(Debug, Default, Deserialize)]
pub struct LoginInput {
    #[serde(default)]
    pub correo: String,
    #[serde(default)]
    pub password: String,
}

impl Validate for LoginInput {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if errors.required("correo", &self.correo) {
            errors.email("correo", self.correo.trim());
        }
        if errors.required("password", &self.password) {
            errors.format("password", is_strong_password(&self.password));
        }
        errors.into_result()
    }
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub nombre: String,
    /// Ready to paste into an `Authorization` header
    pub token: String,
}
