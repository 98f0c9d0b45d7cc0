use std::sync::Arc;

use crate::auth::CredentialService;
use crate::config::{AppConfig, CollectionNames};
use crate::database::DocumentStore;
use crate::storage::FileStorage;

/// Shared, read-only handles every handler needs. Cloned per request.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn DocumentStore>,
    pub storage: Arc<dyn FileStorage>,
    pub credentials: Arc<CredentialService>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        store: Arc<dyn DocumentStore>,
        storage: Arc<dyn FileStorage>,
    ) -> Self {
        let credentials = Arc::new(CredentialService::new(&config.security));
        Self {
            store,
            storage,
            credentials,
            config: Arc::new(config),
        }
    }

    pub fn database(&self) -> &str {
        &self.config.database.name
    }

    pub fn collections(&self) -> &CollectionNames {
        &self.config.collections
    }
}
