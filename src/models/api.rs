use garde::Validate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::job::Job;
use crate::models::photo::PhotoCategory;

/// Request to open a new documentation job.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateJobRequest {
    #[garde(length(min = 1, max = 500))]
    pub address: String,
}

/// Request to delete an uploaded photo by its public URL.
#[derive(Debug, Deserialize, Validate)]
pub struct DeletePhotoRequest {
    #[garde(length(min = 1, max = 2000))]
    pub storage_url: String,
}

/// Response after uploading a photo.
#[derive(Debug, Serialize, Deserialize)]
pub struct PhotoUploadResponse {
    pub storage_url: String,
    pub category_id: Uuid,
}

/// Photos for one category, in upload order.
#[derive(Debug, Serialize)]
pub struct CategoryPhotos {
    pub category: PhotoCategory,
    pub photo_urls: Vec<String>,
}

/// A job together with its photos grouped per category.
#[derive(Debug, Serialize)]
pub struct JobDetailResponse {
    #[serde(flatten)]
    pub job: Job,
    pub photo_count: i64,
    pub categories: Vec<CategoryPhotos>,
}

/// Error body returned by every failing handler. `step` is set only for
/// approval failures, naming which saga step broke.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step: Option<String>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            step: None,
        }
    }

    pub fn with_step(error: impl Into<String>, step: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            step: Some(step.into()),
        }
    }
}
