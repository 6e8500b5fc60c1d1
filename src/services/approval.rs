use uuid::Uuid;

use crate::app_state::AppState;
use crate::db::queries;
use crate::models::job::{Job, JobStatus};
use crate::services::report::{self, ReportRenderError};
use crate::services::storage::StorageError;
use crate::services::paths;

/// Failure of the approve saga, labeled with the step that broke. There is
/// no rollback: a failure after the report upload leaves `pdf_url` populated
/// while the status stays `pending_review`, and re-invoking re-renders and
/// overwrites the report object at its deterministic path.
#[derive(Debug, thiserror::Error)]
pub enum ApprovalError {
    #[error("approval blocked: {0}")]
    Validation(String),

    #[error("job {0} not found")]
    NotFound(Uuid),

    #[error("approval step 'storage-init' failed: {0}")]
    Storage(#[source] StorageError),

    #[error("approval step 'gather-photos' failed: {0}")]
    Gather(#[source] sqlx::Error),

    #[error("approval step 'render-report' failed: {0}")]
    Render(#[from] ReportRenderError),

    #[error("approval step 'upload-report' failed: {0}")]
    Upload(#[source] StorageError),

    #[error("approval step 'persist-url' failed: {0}")]
    PersistUrl(#[source] sqlx::Error),

    #[error("approval step 'update-status' failed: {0}")]
    UpdateStatus(#[source] sqlx::Error),
}

impl ApprovalError {
    /// Saga step name for operator-facing failure reports; `None` for
    /// precondition failures that happen before the saga starts.
    pub fn step(&self) -> Option<&'static str> {
        match self {
            Self::Validation(_) | Self::NotFound(_) => None,
            Self::Storage(_) => Some("storage-init"),
            Self::Gather(_) => Some("gather-photos"),
            Self::Render(_) => Some("render-report"),
            Self::Upload(_) => Some("upload-report"),
            Self::PersistUrl(_) => Some("persist-url"),
            Self::UpdateStatus(_) => Some("update-status"),
        }
    }
}

/// Approve a `pending_review` job: gather its photos, render the PDF report,
/// upload it, link it to the job record and set the status to `approved`.
///
/// Steps run in that fixed order with no retries. Each failure surfaces
/// immediately with its step name; partially completed work is left in place.
pub async fn approve_job(state: &AppState, job_id: Uuid) -> Result<Job, ApprovalError> {
    let mut job = queries::get_job(&state.db, job_id)
        .await
        .map_err(ApprovalError::Gather)?
        .ok_or(ApprovalError::NotFound(job_id))?;

    if job.status != JobStatus::PendingReview {
        return Err(ApprovalError::Validation(format!(
            "cannot approve a job in status '{}' (expected 'pending_review')",
            job.status
        )));
    }
    if job.address.trim().is_empty() {
        return Err(ApprovalError::Render(ReportRenderError::EmptyAddress));
    }

    let storage = state.object_store().map_err(ApprovalError::Storage)?;

    let categories = queries::list_categories(&state.db)
        .await
        .map_err(ApprovalError::Gather)?;
    let mut photo_urls = Vec::new();
    for category in &categories {
        let urls = queries::list_photos_for_category(&state.db, job_id, category.id)
            .await
            .map_err(ApprovalError::Gather)?;
        photo_urls.extend(urls);
    }

    tracing::info!(job_id = %job_id, photos = photo_urls.len(), "Rendering approval report");
    let photos = report::fetch_photos(&state.http, &photo_urls).await;
    let pdf = report::render_report(&job.address, &photos)?;

    let path = paths::report_object_path(&job.address, &job.id.to_string());
    storage
        .put(&path, &pdf, "application/pdf")
        .await
        .map_err(ApprovalError::Upload)?;
    let pdf_url = storage.url_for(&path);

    queries::set_pdf_url(&state.db, job_id, Some(&pdf_url))
        .await
        .map_err(ApprovalError::PersistUrl)?;

    queries::update_job_status(&state.db, job_id, JobStatus::Approved)
        .await
        .map_err(ApprovalError::UpdateStatus)?;

    metrics::counter!("jobs_approved_total").increment(1);
    tracing::info!(job_id = %job_id, pdf_url = %pdf_url, "Job approved, report stored");

    job.status = JobStatus::Approved;
    job.pdf_url = Some(pdf_url);
    Ok(job)
}

/// Failure of the photo-deletion saga. Metadata consistency is prioritized:
/// the record delete always runs, but a blob-cleanup failure is still
/// reported to the caller even when the record delete succeeded.
#[derive(Debug, thiserror::Error)]
pub enum PhotoDeleteError {
    #[error("photo record delete failed: {0}")]
    Metadata(#[source] sqlx::Error),

    #[error("photo blob delete failed (metadata removed): {0}")]
    StorageCleanup(#[source] StorageError),

    #[error("object store unavailable, photo blob not deleted: {0}")]
    Storage(#[source] StorageError),

    #[error("url does not belong to this object store: {0}")]
    ForeignUrl(String),
}

/// Delete a photo from both stores. The storage delete is attempted first
/// and its failure is logged but never blocks the record delete; a record
/// delete failure aborts immediately. If only the blob cleanup failed the
/// overall operation still fails so the caller knows the blob persists.
pub async fn delete_photo(
    state: &AppState,
    job_id: Uuid,
    storage_url: &str,
) -> Result<(), PhotoDeleteError> {
    let mut cleanup_failure: Option<PhotoDeleteError> = None;

    match state.object_store() {
        Ok(storage) => match storage.path_from_url(storage_url) {
            Some(path) => {
                if let Err(e) = storage.delete(&path).await {
                    tracing::warn!(job_id = %job_id, url = %storage_url, error = %e, "Photo blob delete failed, removing metadata anyway");
                    cleanup_failure = Some(PhotoDeleteError::StorageCleanup(e));
                }
            }
            None => {
                tracing::warn!(job_id = %job_id, url = %storage_url, "Photo URL not recognized, skipping blob delete");
                cleanup_failure = Some(PhotoDeleteError::ForeignUrl(storage_url.to_string()));
            }
        },
        Err(e) => {
            tracing::warn!(job_id = %job_id, error = %e, "Object store unavailable, skipping blob delete");
            cleanup_failure = Some(PhotoDeleteError::Storage(e));
        }
    }

    let removed = queries::delete_photo_record(&state.db, storage_url, job_id)
        .await
        .map_err(PhotoDeleteError::Metadata)?;

    if removed == 0 {
        tracing::warn!(job_id = %job_id, url = %storage_url, "Photo record was already absent");
    }

    match cleanup_failure {
        Some(e) => Err(e),
        None => {
            tracing::info!(job_id = %job_id, url = %storage_url, "Photo deleted");
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_approval_errors_name_their_step() {
        let err = ApprovalError::UpdateStatus(sqlx::Error::PoolClosed);
        assert_eq!(err.step(), Some("update-status"));
        assert!(err.to_string().contains("update-status"));

        let err = ApprovalError::PersistUrl(sqlx::Error::PoolClosed);
        assert_eq!(err.step(), Some("persist-url"));

        let err = ApprovalError::Render(ReportRenderError::EmptyAddress);
        assert_eq!(err.step(), Some("render-report"));
        assert!(err.to_string().contains("render-report"));
    }

    #[test]
    fn test_precondition_failures_have_no_step() {
        assert_eq!(ApprovalError::Validation("x".into()).step(), None);
        assert_eq!(ApprovalError::NotFound(Uuid::new_v4()).step(), None);
    }
}
