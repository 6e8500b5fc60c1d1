use s3::creds::Credentials;
use s3::{Bucket, Region};

/// Client for an S3-compatible object store holding job photos and
/// generated reports. Objects are public-read; URLs are stable and unsigned.
pub struct ObjectStore {
    bucket: Box<Bucket>,
    bucket_name: String,
    public_base_url: String,
}

impl ObjectStore {
    pub fn new(
        bucket_name: &str,
        endpoint: &str,
        public_base_url: &str,
        access_key: &str,
        secret_key: &str,
    ) -> Result<Self, StorageError> {
        let region = Region::Custom {
            region: "auto".to_string(),
            endpoint: endpoint.to_string(),
        };

        let credentials = Credentials::new(Some(access_key), Some(secret_key), None, None, None)
            .map_err(|e| StorageError::Config(e.to_string()))?;

        let bucket = Bucket::new(bucket_name, region, credentials)
            .map_err(|e| StorageError::Config(e.to_string()))?;

        Ok(Self {
            bucket,
            bucket_name: bucket_name.to_string(),
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Upload bytes at `path`. On success the object is immediately
    /// retrievable at [`Self::url_for`].
    pub async fn put(&self, path: &str, data: &[u8], content_type: &str) -> Result<(), StorageError> {
        self.bucket
            .put_object_with_content_type(path, data, content_type)
            .await
            .map_err(StorageError::Write)?;
        Ok(())
    }

    /// Public URL for an object: `{base}/{bucket}/{path}`.
    pub fn url_for(&self, path: &str) -> String {
        format!("{}/{}/{}", self.public_base_url, self.bucket_name, path)
    }

    /// Recover the bucket-relative path from one of our public URLs.
    pub fn path_from_url(&self, url: &str) -> Option<String> {
        super::paths::object_path_from_url(&self.public_base_url, &self.bucket_name, url)
    }

    /// Delete an object. Callers on the photo-deletion path treat this as
    /// non-fatal; everywhere else it aborts the operation.
    pub async fn delete(&self, path: &str) -> Result<(), StorageError> {
        self.bucket.delete_object(path).await.map_err(StorageError::Delete)?;
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("object store write failed: {0}")]
    Write(s3::error::S3Error),

    #[error("object store delete failed: {0}")]
    Delete(s3::error::S3Error),

    #[error("object store configuration error: {0}")]
    Config(String),
}
