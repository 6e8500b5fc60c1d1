use std::collections::HashMap;
use std::str::FromStr;

use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::models::job::{Job, JobStatus};
use crate::models::photo::PhotoCategory;

fn job_from_row(row: &PgRow) -> Result<Job, sqlx::Error> {
    let status_str: String = row.try_get("status")?;
    let status = JobStatus::from_str(&status_str).unwrap_or(JobStatus::Active);

    Ok(Job {
        id: row.try_get("id")?,
        address: row.try_get("address")?,
        status,
        pdf_url: row.try_get("pdf_url")?,
        created_at: row.try_get("created_at")?,
    })
}

/// Insert a new job in `active` status. A partial unique index on the jobs
/// table rejects a second concurrent active job with a constraint error.
pub async fn create_job(pool: &PgPool, address: &str) -> Result<Job, sqlx::Error> {
    let row = sqlx::query(
        r#"
        INSERT INTO jobs (address, status)
        VALUES ($1, 'active')
        RETURNING id, address, status, pdf_url, created_at
        "#,
    )
    .bind(address)
    .fetch_one(pool)
    .await?;

    job_from_row(&row)
}

/// The single job currently in `active` status, if any. At most one row is
/// expected; `LIMIT 1` keeps the result defined if that invariant is ever
/// violated by pre-index data.
pub async fn get_active_job(pool: &PgPool) -> Result<Option<Job>, sqlx::Error> {
    let row = sqlx::query(
        r#"
        SELECT id, address, status, pdf_url, created_at
        FROM jobs
        WHERE status = 'active'
        ORDER BY created_at DESC
        LIMIT 1
        "#,
    )
    .fetch_optional(pool)
    .await?;

    row.as_ref().map(job_from_row).transpose()
}

/// Get a job by ID
pub async fn get_job(pool: &PgPool, job_id: Uuid) -> Result<Option<Job>, sqlx::Error> {
    let row = sqlx::query(
        r#"
        SELECT id, address, status, pdf_url, created_at
        FROM jobs
        WHERE id = $1
        "#,
    )
    .bind(job_id)
    .fetch_optional(pool)
    .await?;

    row.as_ref().map(job_from_row).transpose()
}

/// List jobs filtered by status, newest first. An empty filter lists all.
pub async fn list_jobs(pool: &PgPool, statuses: &[JobStatus]) -> Result<Vec<Job>, sqlx::Error> {
    let status_strings: Vec<String> = statuses.iter().map(|s| s.to_string()).collect();

    let rows = sqlx::query(
        r#"
        SELECT id, address, status, pdf_url, created_at
        FROM jobs
        WHERE cardinality($1::text[]) = 0 OR status = ANY($1)
        ORDER BY created_at DESC
        "#,
    )
    .bind(&status_strings)
    .fetch_all(pool)
    .await?;

    rows.iter().map(job_from_row).collect()
}

/// Update job status
pub async fn update_job_status(
    pool: &PgPool,
    job_id: Uuid,
    status: JobStatus,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE jobs
        SET status = $1
        WHERE id = $2
        "#,
    )
    .bind(status.to_string())
    .bind(job_id)
    .execute(pool)
    .await?;

    Ok(())
}

/// Set or clear the job's generated-report URL.
pub async fn set_pdf_url(
    pool: &PgPool,
    job_id: Uuid,
    pdf_url: Option<&str>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE jobs
        SET pdf_url = $1
        WHERE id = $2
        "#,
    )
    .bind(pdf_url)
    .bind(job_id)
    .execute(pool)
    .await?;

    Ok(())
}

/// Revert an approval: clear the report link and reset the status in one
/// statement so the two fields never disagree.
pub async fn undo_approval(pool: &PgPool, job_id: Uuid) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE jobs
        SET pdf_url = NULL,
            status = 'pending_review'
        WHERE id = $1
        "#,
    )
    .bind(job_id)
    .execute(pool)
    .await?;

    Ok(())
}

/// Record an uploaded photo's metadata pointer.
pub async fn insert_photo_record(
    pool: &PgPool,
    job_id: Uuid,
    category_id: Uuid,
    storage_url: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO photos (job_id, category_id, storage_url)
        VALUES ($1, $2, $3)
        "#,
    )
    .bind(job_id)
    .bind(category_id)
    .bind(storage_url)
    .execute(pool)
    .await?;

    Ok(())
}

/// URLs of a job's photos in one category, in upload order.
pub async fn list_photos_for_category(
    pool: &PgPool,
    job_id: Uuid,
    category_id: Uuid,
) -> Result<Vec<String>, sqlx::Error> {
    let rows = sqlx::query(
        r#"
        SELECT storage_url
        FROM photos
        WHERE job_id = $1 AND category_id = $2
        ORDER BY created_at ASC
        "#,
    )
    .bind(job_id)
    .bind(category_id)
    .fetch_all(pool)
    .await?;

    rows.iter().map(|r| r.try_get("storage_url")).collect()
}

/// Total photos uploaded for a job.
pub async fn count_photos(pool: &PgPool, job_id: Uuid) -> Result<i64, sqlx::Error> {
    let row = sqlx::query(
        r#"
        SELECT COUNT(*) AS count
        FROM photos
        WHERE job_id = $1
        "#,
    )
    .bind(job_id)
    .fetch_one(pool)
    .await?;

    row.try_get("count")
}

/// Per-category photo counts for a job. Categories with no photos are
/// simply absent from the map.
pub async fn photo_counts_by_category(
    pool: &PgPool,
    job_id: Uuid,
) -> Result<HashMap<Uuid, i64>, sqlx::Error> {
    let rows = sqlx::query(
        r#"
        SELECT category_id, COUNT(*) AS count
        FROM photos
        WHERE job_id = $1
        GROUP BY category_id
        "#,
    )
    .bind(job_id)
    .fetch_all(pool)
    .await?;

    rows.iter()
        .map(|r| Ok((r.try_get("category_id")?, r.try_get("count")?)))
        .collect()
}

/// Delete a photo's metadata row by URL. Returns the number of rows removed;
/// zero means the row was already absent, which callers treat as a non-fatal
/// signal rather than an error.
pub async fn delete_photo_record(
    pool: &PgPool,
    storage_url: &str,
    job_id: Uuid,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        r#"
        DELETE FROM photos
        WHERE storage_url = $1 AND job_id = $2
        "#,
    )
    .bind(storage_url)
    .bind(job_id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}

/// All photo categories in display/processing order.
pub async fn list_categories(pool: &PgPool) -> Result<Vec<PhotoCategory>, sqlx::Error> {
    let rows = sqlx::query(
        r#"
        SELECT id, name, sort_order, required
        FROM photo_categories
        ORDER BY sort_order ASC
        "#,
    )
    .fetch_all(pool)
    .await?;

    rows.iter()
        .map(|r| {
            Ok(PhotoCategory {
                id: r.try_get("id")?,
                name: r.try_get("name")?,
                sort_order: r.try_get("sort_order")?,
                required: r.try_get("required")?,
            })
        })
        .collect()
}
