use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use garde::Validate;
use serde::Deserialize;
use uuid::Uuid;

use crate::app_state::AppState;
use crate::db::queries;
use crate::models::api::{DeletePhotoRequest, ErrorResponse, PhotoUploadResponse};
use crate::routes::{self, ApiError};
use crate::services::{approval, lifecycle, paths};

/// POST /api/v1/jobs/{id}/photos — multipart upload of one photo.
///
/// Fields: `category_id` (UUID) and `image` (bytes). The blob goes to the
/// object store first, then the metadata row is inserted; an insert failure
/// leaves an orphaned blob behind (accepted, logged).
pub async fn upload_photo(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<PhotoUploadResponse>), ApiError> {
    let mut category_id: Option<Uuid> = None;
    let mut image_data: Option<Vec<u8>> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| routes::bad_request(format!("malformed multipart body: {e}")))?
    {
        let name = field.name().map(|s| s.to_string());
        match name.as_deref() {
            Some("category_id") => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| routes::bad_request(format!("unreadable category_id: {e}")))?;
                category_id = Some(
                    text.parse()
                        .map_err(|_| routes::bad_request("category_id is not a UUID"))?,
                );
            }
            Some("image") => {
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| routes::bad_request(format!("unreadable image field: {e}")))?;
                image_data = Some(data.to_vec());
            }
            _ => {}
        }
    }

    let category_id = category_id.ok_or_else(|| routes::bad_request("missing category_id field"))?;
    let image_data = image_data.ok_or_else(|| routes::bad_request("missing image field"))?;

    let format = image::guess_format(&image_data).map_err(|_| {
        (
            StatusCode::UNSUPPORTED_MEDIA_TYPE,
            Json(ErrorResponse::new("image field is not a recognized image format")),
        )
    })?;
    let extension = format.extensions_str().first().copied().ok_or_else(|| {
        (
            StatusCode::UNSUPPORTED_MEDIA_TYPE,
            Json(ErrorResponse::new("image format has no known file extension")),
        )
    })?;

    let job = lifecycle::load_job(&state.db, job_id)
        .await
        .map_err(routes::lifecycle_error)?;

    let categories = queries::list_categories(&state.db)
        .await
        .map_err(routes::record_store_error)?;
    let category = categories
        .iter()
        .find(|c| c.id == category_id)
        .ok_or_else(|| {
            (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(ErrorResponse::new(format!("unknown photo category {category_id}"))),
            )
        })?;

    let storage = state.object_store().map_err(routes::storage_error)?;

    let path = paths::photo_object_path(&job.address, &job.id.to_string(), &category.name, extension);
    storage
        .put(&path, &image_data, format.to_mime_type())
        .await
        .map_err(routes::storage_error)?;
    let storage_url = storage.url_for(&path);

    if let Err(e) = queries::insert_photo_record(&state.db, job_id, category_id, &storage_url).await {
        tracing::warn!(job_id = %job_id, url = %storage_url, error = %e, "Photo record insert failed, blob left orphaned");
        return Err(routes::record_store_error(e));
    }

    metrics::counter!("photos_uploaded_total").increment(1);
    tracing::info!(job_id = %job_id, category = %category.name, url = %storage_url, "Photo uploaded");

    Ok((
        StatusCode::CREATED,
        Json(PhotoUploadResponse {
            storage_url,
            category_id,
        }),
    ))
}

#[derive(Debug, Deserialize)]
pub struct ListPhotosQuery {
    pub category_id: Uuid,
}

/// GET /api/v1/jobs/{id}/photos?category_id=… — photo URLs in upload order.
pub async fn list_photos(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
    Query(query): Query<ListPhotosQuery>,
) -> Result<Json<Vec<String>>, ApiError> {
    let urls = queries::list_photos_for_category(&state.db, job_id, query.category_id)
        .await
        .map_err(routes::record_store_error)?;
    Ok(Json(urls))
}

/// DELETE /api/v1/jobs/{id}/photos — remove a photo from both stores.
pub async fn delete_photo(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
    Json(req): Json<DeletePhotoRequest>,
) -> Result<StatusCode, ApiError> {
    req.validate()
        .map_err(|e| routes::bad_request(format!("invalid request: {e}")))?;

    approval::delete_photo(&state, job_id, &req.storage_url)
        .await
        .map_err(routes::photo_delete_error)?;

    Ok(StatusCode::NO_CONTENT)
}
