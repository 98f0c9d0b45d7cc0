pub mod category;
pub mod photo;
pub mod product;
pub mod user;

pub use category::{Category, CategoryInput};
pub use photo::ProductPhoto;
pub use product::{Product, ProductInput, UpdateProductInput};
pub use user::{LoginInput, LoginResponse, RegisterInput, User};

use mongodb::bson::{self, Document};
use serde::Serialize;

use super::store::StoreError;

/// Serialize a model into a store document
pub fn encode<T: Serialize>(value: &T) -> Result<Document, StoreError> {
    Ok(bson::to_document(value)?)
}

/// Seconds since the Unix epoch, the timestamp format every model stores
pub fn unix_now() -> i64 {
    chrono::Utc::now().timestamp()
}
