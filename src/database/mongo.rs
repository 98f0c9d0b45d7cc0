use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::bson::{doc, oid::ObjectId, Document};
use mongodb::options::ClientOptions;
use mongodb::{Client, Collection};
use std::future::Future;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{info, warn};

use super::pipeline::Pipeline;
use super::store::{
    id_filter, parse_object_id, provision_collections, DeletedCount, DocumentStore, MatchedCount,
    StoreError,
};
use crate::config::DatabaseConfig;

const CLOSE_TIMEOUT: Duration = Duration::from_secs(10);

/// MongoDB-backed document store.
///
/// Cheap to clone: the driver client is reference counted and pools its own connections.
#[derive(Clone)]
pub struct MongoStore {
    client: Client,
    operation_timeout: Duration,
}

impl MongoStore {
    /// Connect, verify liveness and provision the required collections.
    ///
    /// Fails with `StoreError::Connection` when the endpoint cannot be reached
    /// within the configured connect timeout.
    pub async fn connect(config: &DatabaseConfig, required: &[&str]) -> Result<Self, StoreError> {
        let mut options = ClientOptions::parse(&config.uri)
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;
        options.app_name = Some(env!("CARGO_PKG_NAME").to_string());
        options.connect_timeout = Some(config.connect_timeout());
        options.server_selection_timeout = Some(config.connect_timeout());

        let client =
            Client::with_options(options).map_err(|e| StoreError::Connection(e.to_string()))?;

        let store = Self {
            client,
            operation_timeout: config.operation_timeout(),
        };

        match timeout(config.connect_timeout(), store.run_ping(&config.name)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(StoreError::Connection(e.to_string())),
            Err(_) => {
                return Err(StoreError::Connection(format!(
                    "no response within {:?}",
                    config.connect_timeout()
                )))
            }
        }

        provision_collections(&store, &config.name, required).await?;

        info!("Connected to MongoDB database '{}', collections ready", config.name);
        Ok(store)
    }

    /// Release the underlying connections. Consumes the handle, so it runs once.
    pub async fn close(self) {
        match timeout(CLOSE_TIMEOUT, self.client.shutdown()).await {
            Ok(()) => info!("MongoDB connection closed"),
            Err(_) => warn!("Error closing MongoDB connection: no response within {:?}", CLOSE_TIMEOUT),
        }
    }

    fn collection(&self, database: &str, collection: &str) -> Collection<Document> {
        self.client.database(database).collection::<Document>(collection)
    }

    async fn run_ping(&self, database: &str) -> mongodb::error::Result<()> {
        self.client
            .database(database)
            .run_command(doc! { "ping": 1 }, None)
            .await
            .map(|_| ())
    }

    /// Apply the per-operation deadline and map driver errors
    async fn bounded<T, F>(&self, operation: &'static str, fut: F) -> Result<T, StoreError>
    where
        F: Future<Output = mongodb::error::Result<T>> + Send,
    {
        match timeout(self.operation_timeout, fut).await {
            Ok(result) => result.map_err(|e| StoreError::Query(format!("{}: {}", operation, e))),
            Err(_) => Err(StoreError::Timeout {
                operation,
                after: self.operation_timeout,
            }),
        }
    }
}

#[async_trait]
impl DocumentStore for MongoStore {
    async fn ping(&self, database: &str) -> Result<(), StoreError> {
        self.bounded("ping", self.run_ping(database)).await
    }

    async fn collection_names(&self, database: &str) -> Result<Vec<String>, StoreError> {
        let db = self.client.database(database);
        self.bounded("list collections", db.list_collection_names(None))
            .await
    }

    async fn create_collection(&self, database: &str, name: &str) -> Result<(), StoreError> {
        let db = self.client.database(database);
        self.bounded("create collection", db.create_collection(name, None))
            .await
    }

    async fn insert(
        &self,
        database: &str,
        collection: &str,
        document: Document,
    ) -> Result<ObjectId, StoreError> {
        let coll = self.collection(database, collection);
        let result = self
            .bounded("insert", coll.insert_one(document, None))
            .await?;

        result
            .inserted_id
            .as_object_id()
            .ok_or_else(|| StoreError::Query("insert: store returned a non-ObjectId _id".to_string()))
    }

    async fn aggregate(
        &self,
        database: &str,
        collection: &str,
        pipeline: &Pipeline,
    ) -> Result<Vec<Document>, StoreError> {
        let coll = self.collection(database, collection);
        let stages = pipeline.to_documents();

        self.bounded("aggregate", async move {
            let cursor = coll.aggregate(stages, None).await?;
            cursor.try_collect::<Vec<Document>>().await
        })
        .await
    }

    async fn update_partial(
        &self,
        database: &str,
        collection: &str,
        id: &str,
        fields: Document,
    ) -> Result<MatchedCount, StoreError> {
        let object_id = parse_object_id(id)?;
        let coll = self.collection(database, collection);

        // The server rejects an empty $set; answer with a match count instead
        let matched = if fields.is_empty() {
            self.bounded("update", coll.count_documents(id_filter(object_id), None))
                .await?
        } else {
            let update = doc! { "$set": fields };
            self.bounded("update", coll.update_one(id_filter(object_id), update, None))
                .await?
                .matched_count
        };

        if matched == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(matched)
    }

    async fn delete(
        &self,
        database: &str,
        collection: &str,
        id: &str,
    ) -> Result<DeletedCount, StoreError> {
        let object_id = parse_object_id(id)?;
        let coll = self.collection(database, collection);

        let result = self
            .bounded("delete", coll.delete_one(id_filter(object_id), None))
            .await?;

        if result.deleted_count == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(result.deleted_count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn database_config(uri: &str) -> DatabaseConfig {
        DatabaseConfig {
            uri: uri.to_string(),
            name: "catalogo_test".to_string(),
            connect_timeout_secs: 1,
            operation_timeout_secs: 1,
        }
    }

    #[tokio::test]
    async fn unreachable_server_is_a_connection_error() {
        // Nothing listens on port 1
        let result = MongoStore::connect(&database_config("mongodb://127.0.0.1:1"), &["categorias"]).await;
        assert!(
            matches!(result, Err(StoreError::Connection(_))),
            "unexpected outcome: {:?}",
            result.err()
        );
    }

    #[tokio::test]
    async fn malformed_uri_is_a_connection_error() {
        let result = MongoStore::connect(&database_config("postgres://nope"), &[]).await;
        assert!(matches!(result, Err(StoreError::Connection(_))));
    }
}
