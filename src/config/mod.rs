use serde::Deserialize;

use crate::services::storage::{ObjectStore, StorageError};

#[derive(Debug, Deserialize)]
pub struct AppConfig {
    /// Server bind address (e.g., "0.0.0.0:3000").
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// PostgreSQL connection string
    pub database_url: String,

    /// Object store bucket name
    pub storage_bucket: String,

    /// S3-compatible endpoint URL
    pub storage_endpoint: String,

    /// Public base URL objects are served from (`{base}/{bucket}/{path}`)
    pub storage_public_base_url: String,

    /// Object store access key. Optional at startup: absence only fails the
    /// first operation that actually needs the store.
    pub storage_access_key: Option<String>,

    /// Object store secret key. Optional at startup, like the access key.
    pub storage_secret_key: Option<String>,
}

fn default_bind_addr() -> String {
    "0.0.0.0:3000".to_string()
}

impl AppConfig {
    pub fn from_env() -> Result<Self, envy::Error> {
        dotenvy::dotenv().ok();
        envy::from_env()
    }

    /// Build the object-store client from configuration. Fails with a
    /// descriptive error when either secret credential is missing.
    pub fn object_store(&self) -> Result<ObjectStore, StorageError> {
        let access_key = self.storage_access_key.as_deref().ok_or_else(|| {
            StorageError::Config(
                "STORAGE_ACCESS_KEY is not set; photo and report storage is unavailable".into(),
            )
        })?;
        let secret_key = self.storage_secret_key.as_deref().ok_or_else(|| {
            StorageError::Config(
                "STORAGE_SECRET_KEY is not set; photo and report storage is unavailable".into(),
            )
        })?;

        ObjectStore::new(
            &self.storage_bucket,
            &self.storage_endpoint,
            &self.storage_public_base_url,
            access_key,
            secret_key,
        )
    }
}
