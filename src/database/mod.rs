pub mod memory;
pub mod models;
pub mod mongo;
pub mod pipeline;
pub mod store;

pub use memory::MemoryStore;
pub use mongo::MongoStore;
pub use pipeline::{Pipeline, SortDirection, Stage};
pub use store::{parse_object_id, provision_collections, DocumentStore, StoreError};
