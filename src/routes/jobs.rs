use std::str::FromStr;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use futures::future::join_all;
use garde::Validate;
use serde::Deserialize;
use uuid::Uuid;

use crate::app_state::AppState;
use crate::db::queries;
use crate::models::api::{CategoryPhotos, CreateJobRequest, ErrorResponse, JobDetailResponse};
use crate::models::job::{Job, JobStatus};
use crate::routes::{self, ApiError};
use crate::services::{approval, lifecycle};

/// POST /api/v1/jobs — open a new documentation job for an address.
pub async fn create_job(
    State(state): State<AppState>,
    Json(req): Json<CreateJobRequest>,
) -> Result<(StatusCode, Json<Job>), ApiError> {
    req.validate()
        .map_err(|e| routes::bad_request(format!("invalid request: {e}")))?;

    let job = lifecycle::create_job(&state.db, &req.address)
        .await
        .map_err(routes::lifecycle_error)?;

    metrics::counter!("jobs_created_total").increment(1);
    Ok((StatusCode::CREATED, Json(job)))
}

#[derive(Debug, Deserialize)]
pub struct ListJobsQuery {
    /// Comma-separated statuses, e.g. `approved,completed`. Absent = all.
    pub status: Option<String>,
}

/// GET /api/v1/jobs — list jobs, newest first, optionally filtered by status.
pub async fn list_jobs(
    State(state): State<AppState>,
    Query(query): Query<ListJobsQuery>,
) -> Result<Json<Vec<Job>>, ApiError> {
    let statuses = match query.status.as_deref() {
        None | Some("") => Vec::new(),
        Some(raw) => raw
            .split(',')
            .map(|s| {
                JobStatus::from_str(s.trim())
                    .map_err(|_| routes::bad_request(format!("unknown status '{}'", s.trim())))
            })
            .collect::<Result<Vec<_>, _>>()?,
    };

    let jobs = queries::list_jobs(&state.db, &statuses)
        .await
        .map_err(routes::record_store_error)?;
    Ok(Json(jobs))
}

/// GET /api/v1/jobs/active — the crew's current job, if one exists.
pub async fn get_active_job(State(state): State<AppState>) -> Result<Json<Job>, ApiError> {
    let job = queries::get_active_job(&state.db)
        .await
        .map_err(routes::record_store_error)?
        .ok_or_else(|| (StatusCode::NOT_FOUND, Json(ErrorResponse::new("no active job"))))?;
    Ok(Json(job))
}

/// GET /api/v1/jobs/{id} — job details with photos grouped per category.
/// Category listings fan out concurrently; the response keeps category order.
pub async fn get_job(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
) -> Result<Json<JobDetailResponse>, ApiError> {
    let job = lifecycle::load_job(&state.db, job_id)
        .await
        .map_err(routes::lifecycle_error)?;

    let categories = queries::list_categories(&state.db)
        .await
        .map_err(routes::record_store_error)?;

    let listings = join_all(categories.iter().map(|category| {
        let pool = state.db.clone();
        let category_id = category.id;
        async move { queries::list_photos_for_category(&pool, job_id, category_id).await }
    }))
    .await;

    let mut grouped = Vec::with_capacity(categories.len());
    for (category, listing) in categories.into_iter().zip(listings) {
        grouped.push(CategoryPhotos {
            category,
            photo_urls: listing.map_err(routes::record_store_error)?,
        });
    }

    let photo_count = queries::count_photos(&state.db, job_id)
        .await
        .map_err(routes::record_store_error)?;

    Ok(Json(JobDetailResponse {
        job,
        photo_count,
        categories: grouped,
    }))
}

/// POST /api/v1/jobs/{id}/submit — hand the job to the supervisor.
pub async fn submit_for_review(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
) -> Result<Json<Job>, ApiError> {
    let job = lifecycle::submit_for_review(&state.db, job_id)
        .await
        .map_err(routes::lifecycle_error)?;
    Ok(Json(job))
}

/// POST /api/v1/jobs/{id}/approve — run the approval saga.
pub async fn approve(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
) -> Result<Json<Job>, ApiError> {
    let job = approval::approve_job(&state, job_id).await.map_err(|e| {
        metrics::counter!("approval_failures_total").increment(1);
        routes::approval_error(e)
    })?;
    Ok(Json(job))
}

/// POST /api/v1/jobs/{id}/undo-approval — back to review, report link cleared.
pub async fn undo_approval(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
) -> Result<Json<Job>, ApiError> {
    let job = lifecycle::undo_approval(&state.db, job_id)
        .await
        .map_err(routes::lifecycle_error)?;
    Ok(Json(job))
}

/// POST /api/v1/jobs/{id}/complete — close out an approved job.
pub async fn mark_complete(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
) -> Result<Json<Job>, ApiError> {
    let job = lifecycle::mark_complete(&state.db, job_id)
        .await
        .map_err(routes::lifecycle_error)?;
    Ok(Json(job))
}
