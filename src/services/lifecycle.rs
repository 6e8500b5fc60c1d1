use std::collections::HashMap;

use sqlx::PgPool;
use uuid::Uuid;

use crate::db::queries;
use crate::models::job::{Job, JobStatus};
use crate::models::photo::PhotoCategory;
use crate::services::paths;

#[derive(Debug, thiserror::Error)]
pub enum LifecycleError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("job {0} not found")]
    NotFound(Uuid),

    #[error("record store error: {0}")]
    Store(#[from] sqlx::Error),
}

/// Fetch a job or fail with a not-found error.
pub async fn load_job(pool: &PgPool, job_id: Uuid) -> Result<Job, LifecycleError> {
    queries::get_job(pool, job_id)
        .await?
        .ok_or(LifecycleError::NotFound(job_id))
}

fn ensure_status(job: &Job, expected: JobStatus, event: &str) -> Result<(), LifecycleError> {
    if job.status != expected {
        return Err(LifecycleError::Validation(format!(
            "cannot {event} a job in status '{}' (expected '{expected}')",
            job.status
        )));
    }
    Ok(())
}

/// Open a new job in `active` status.
///
/// The address must be non-empty and must sanitize to a non-empty path
/// segment, since every object path for the job embeds its slug.
pub async fn create_job(pool: &PgPool, address: &str) -> Result<Job, LifecycleError> {
    let address = address.trim();
    if address.is_empty() {
        return Err(LifecycleError::Validation("address must not be empty".into()));
    }
    if paths::sanitize(address).is_empty() {
        return Err(LifecycleError::Validation(
            "address must contain at least one alphanumeric character".into(),
        ));
    }

    let job = queries::create_job(pool, address).await?;
    tracing::info!(job_id = %job.id, address = %job.address, "Job created");
    Ok(job)
}

/// Required categories that have no photo yet, in display order.
///
/// Pure check over already-fetched counts; the store is not re-consulted, so
/// a concurrent photo deletion can race this (accepted).
pub fn missing_required_categories(
    categories: &[PhotoCategory],
    counts: &HashMap<Uuid, i64>,
) -> Vec<String> {
    categories
        .iter()
        .filter(|c| c.required && counts.get(&c.id).copied().unwrap_or(0) == 0)
        .map(|c| c.name.clone())
        .collect()
}

/// Move an `active` job to `pending_review`, provided every required
/// category has at least one photo.
pub async fn submit_for_review(pool: &PgPool, job_id: Uuid) -> Result<Job, LifecycleError> {
    let mut job = load_job(pool, job_id).await?;
    ensure_status(&job, JobStatus::Active, "submit")?;

    let categories = queries::list_categories(pool).await?;
    let counts = queries::photo_counts_by_category(pool, job_id).await?;

    let missing = missing_required_categories(&categories, &counts);
    if !missing.is_empty() {
        return Err(LifecycleError::Validation(format!(
            "missing photos for required categories: {}",
            missing.join(", ")
        )));
    }

    queries::update_job_status(pool, job_id, JobStatus::PendingReview).await?;
    job.status = JobStatus::PendingReview;

    tracing::info!(job_id = %job_id, "Job submitted for review");
    Ok(job)
}

/// Revert an `approved` job to `pending_review`, clearing its report link.
pub async fn undo_approval(pool: &PgPool, job_id: Uuid) -> Result<Job, LifecycleError> {
    let mut job = load_job(pool, job_id).await?;
    ensure_status(&job, JobStatus::Approved, "undo approval for")?;

    queries::undo_approval(pool, job_id).await?;
    job.status = JobStatus::PendingReview;
    job.pdf_url = None;

    tracing::info!(job_id = %job_id, "Approval undone");
    Ok(job)
}

/// Close out an `approved` job. Terminal.
pub async fn mark_complete(pool: &PgPool, job_id: Uuid) -> Result<Job, LifecycleError> {
    let mut job = load_job(pool, job_id).await?;
    ensure_status(&job, JobStatus::Approved, "complete")?;

    queries::update_job_status(pool, job_id, JobStatus::Completed).await?;
    job.status = JobStatus::Completed;

    tracing::info!(job_id = %job_id, "Job completed");
    Ok(job)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn category(name: &str, required: bool) -> PhotoCategory {
        PhotoCategory {
            id: Uuid::new_v4(),
            name: name.to_string(),
            sort_order: 0,
            required,
        }
    }

    fn job_in(status: JobStatus) -> Job {
        Job {
            id: Uuid::new_v4(),
            address: "123 Main St".to_string(),
            status,
            pdf_url: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_missing_required_with_no_photos() {
        let front = category("Front", true);
        let extras = category("Extras", false);
        let missing =
            missing_required_categories(&[front.clone(), extras], &HashMap::new());
        assert_eq!(missing, vec!["Front".to_string()]);
    }

    #[test]
    fn test_missing_required_satisfied_by_one_photo() {
        let front = category("Front", true);
        let mut counts = HashMap::new();
        counts.insert(front.id, 1);
        assert!(missing_required_categories(&[front], &counts).is_empty());
    }

    #[test]
    fn test_optional_categories_never_block() {
        let extras = category("Extras", false);
        assert!(missing_required_categories(&[extras], &HashMap::new()).is_empty());
    }

    #[test]
    fn test_ensure_status_rejects_wrong_state() {
        let job = job_in(JobStatus::Completed);
        let err = ensure_status(&job, JobStatus::Active, "submit").unwrap_err();
        assert!(matches!(err, LifecycleError::Validation(_)));
        assert!(err.to_string().contains("completed"));
    }

    #[test]
    fn test_ensure_status_accepts_expected_state() {
        let job = job_in(JobStatus::Approved);
        assert!(ensure_status(&job, JobStatus::Approved, "complete").is_ok());
    }
}
