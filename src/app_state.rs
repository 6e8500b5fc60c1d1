use sqlx::PgPool;
use std::sync::{Arc, OnceLock};

use crate::config::AppConfig;
use crate::services::storage::{ObjectStore, StorageError};

/// Shared application state passed to all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    /// Client used to fetch uploaded photos back during report rendering.
    pub http: reqwest::Client,
    pub config: Arc<AppConfig>,
    storage: Arc<OnceLock<ObjectStore>>,
}

impl AppState {
    pub fn new(db: PgPool, config: AppConfig) -> Self {
        Self {
            db,
            http: reqwest::Client::new(),
            config: Arc::new(config),
            storage: Arc::new(OnceLock::new()),
        }
    }

    /// The object-store client, built on first use. Missing credentials fail
    /// here, at the first operation that needs the store, not at startup.
    pub fn object_store(&self) -> Result<&ObjectStore, StorageError> {
        if let Some(store) = self.storage.get() {
            return Ok(store);
        }
        let store = self.config.object_store()?;
        Ok(self.storage.get_or_init(|| store))
    }
}
