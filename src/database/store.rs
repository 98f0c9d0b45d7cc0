use async_trait::async_trait;
use mongodb::bson::{doc, oid::ObjectId, Document};
use std::time::Duration;
use thiserror::Error;
use tracing::info;

use super::pipeline::Pipeline;

/// Bound applied to the startup collection provisioning step
pub const PROVISION_TIMEOUT: Duration = Duration::from_secs(10);

pub type MatchedCount = u64;
pub type DeletedCount = u64;

/// Errors from the document store layer
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Error creating collection {collection}: {message}")]
    Provision { collection: String, message: String },

    #[error("Invalid document id: {0}")]
    InvalidId(String),

    #[error("Document not found")]
    NotFound,

    #[error("Query error: {0}")]
    Query(String),

    #[error("Document encoding error: {0}")]
    Encoding(String),

    #[error("{operation} timed out after {after:?}")]
    Timeout {
        operation: &'static str,
        after: Duration,
    },
}

impl From<mongodb::bson::ser::Error> for StoreError {
    fn from(err: mongodb::bson::ser::Error) -> Self {
        StoreError::Encoding(err.to_string())
    }
}

impl From<mongodb::bson::de::Error> for StoreError {
    fn from(err: mongodb::bson::de::Error) -> Self {
        StoreError::Encoding(err.to_string())
    }
}

/// Parse a wire identifier (24 hex characters). Runs before any store round-trip.
pub fn parse_object_id(id: &str) -> Result<ObjectId, StoreError> {
    if id.len() != 24 {
        return Err(StoreError::InvalidId(id.to_string()));
    }
    ObjectId::parse_str(id).map_err(|_| StoreError::InvalidId(id.to_string()))
}

/// Uniform access to a document database, independent of document shape.
///
/// Every operation names the database and collection it works on. The store is
/// shared by all in-flight requests; implementations must be safe to call concurrently.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Liveness check
    async fn ping(&self, database: &str) -> Result<(), StoreError>;

    async fn collection_names(&self, database: &str) -> Result<Vec<String>, StoreError>;

    async fn create_collection(&self, database: &str, name: &str) -> Result<(), StoreError>;

    /// Append a document; the store assigns `_id`.
    async fn insert(
        &self,
        database: &str,
        collection: &str,
        document: Document,
    ) -> Result<ObjectId, StoreError>;

    /// Run the pipeline and materialize every resulting document. Empty is success.
    async fn aggregate(
        &self,
        database: &str,
        collection: &str,
        pipeline: &Pipeline,
    ) -> Result<Vec<Document>, StoreError>;

    /// `$set` only the given fields on the document with this id.
    async fn update_partial(
        &self,
        database: &str,
        collection: &str,
        id: &str,
        fields: Document,
    ) -> Result<MatchedCount, StoreError>;

    async fn delete(
        &self,
        database: &str,
        collection: &str,
        id: &str,
    ) -> Result<DeletedCount, StoreError>;

    /// Same as `aggregate`, but zero results is `StoreError::NotFound`.
    async fn find_by_id_pipeline(
        &self,
        database: &str,
        collection: &str,
        pipeline: &Pipeline,
    ) -> Result<Vec<Document>, StoreError> {
        let documents = self.aggregate(database, collection, pipeline).await?;
        if documents.is_empty() {
            return Err(StoreError::NotFound);
        }
        Ok(documents)
    }

    /// Existence check: absence is an empty result, not an error.
    async fn find_existing(
        &self,
        database: &str,
        collection: &str,
        filter: Document,
    ) -> Result<Vec<Document>, StoreError> {
        let pipeline = Pipeline::new().matching(filter);
        match self.find_by_id_pipeline(database, collection, &pipeline).await {
            Ok(documents) => Ok(documents),
            Err(StoreError::NotFound) => Ok(Vec::new()),
            Err(e) => Err(e),
        }
    }
}

/// Create every required collection that does not exist yet.
///
/// Check-then-create is not atomic: run once at startup, before serving traffic.
/// Returns the names of the collections that were created.
pub async fn provision_collections(
    store: &dyn DocumentStore,
    database: &str,
    required: &[&str],
) -> Result<Vec<String>, StoreError> {
    let provision = async {
        let existing = store.collection_names(database).await?;
        let mut created = Vec::new();

        for name in required {
            if existing.iter().any(|e| e == name) {
                info!("Collection {} already exists", name);
                continue;
            }
            store
                .create_collection(database, name)
                .await
                .map_err(|e| StoreError::Provision {
                    collection: name.to_string(),
                    message: e.to_string(),
                })?;
            info!("Collection {} created", name);
            created.push(name.to_string());
        }

        Ok::<_, StoreError>(created)
    };

    tokio::time::timeout(PROVISION_TIMEOUT, provision)
        .await
        .map_err(|_| StoreError::Timeout {
            operation: "collection provisioning",
            after: PROVISION_TIMEOUT,
        })?
}

/// Filter selecting a single document by identifier
pub fn id_filter(id: ObjectId) -> Document {
    doc! { "_id": id }
}
