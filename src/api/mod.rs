pub mod format;

pub use format::{bson_to_json, document_to_json, documents_to_json};
