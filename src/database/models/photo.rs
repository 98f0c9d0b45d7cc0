use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

use super::unix_now;

/// Metadata for an uploaded product image. `name` is the server-generated
/// file name, never the one the client sent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductPhoto {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "producto_id")]
    pub product_id: ObjectId,
    pub timestamp: i64,
}

impl ProductPhoto {
    pub fn new(name: String, product_id: ObjectId) -> Self {
        Self {
            id: None,
            name,
            product_id,
            timestamp: unix_now(),
        }
    }
}
