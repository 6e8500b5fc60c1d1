use std::io::Cursor;

use image::{Rgb, RgbImage};
use uuid::Uuid;

use fieldproof::{
    app_state::AppState,
    config::AppConfig,
    db::{self, queries},
    models::job::JobStatus,
    services::{approval, lifecycle, paths},
};

fn sample_jpeg() -> Vec<u8> {
    let img = RgbImage::from_pixel(64, 48, Rgb([120, 90, 60]));
    let mut bytes = Vec::new();
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Jpeg)
        .unwrap();
    bytes
}

/// Integration test: Full job lifecycle
///
/// This test exercises the complete integration:
/// 1. Database connection, migrations and job creation
/// 2. Object store (photo upload / report upload / delete)
/// 3. Required-category gate on submit
/// 4. Approval saga (render + upload + link + status)
/// 5. Undo-approval and completion
/// 6. Photo deletion across both stores
///
/// Note: This requires a running PostgreSQL instance, a reachable
/// S3-compatible bucket, and at least one row in photo_categories, all
/// configured via environment variables.
#[tokio::test]
#[ignore] // Run with: cargo test --test integration_test -- --ignored --test-threads=1
async fn test_full_lifecycle() {
    let config = AppConfig::from_env().expect("Failed to load config");

    let db_pool = db::init_pool(&config.database_url)
        .await
        .expect("Failed to connect to database");
    db::run_migrations(&db_pool)
        .await
        .expect("Failed to run migrations");

    let state = AppState::new(db_pool.clone(), config);
    let storage = state.object_store().expect("Object store not configured");

    let categories = queries::list_categories(&db_pool)
        .await
        .expect("Failed to list categories");
    assert!(
        !categories.is_empty(),
        "seed photo_categories before running this test"
    );

    // 1. Create a job
    let address = format!("1 Integration Way Suite {}", &Uuid::new_v4().to_string()[..8]);
    let job = lifecycle::create_job(&db_pool, &address)
        .await
        .expect("Failed to create job");
    assert_eq!(job.status, JobStatus::Active);
    assert!(job.pdf_url.is_none());

    let active = queries::get_active_job(&db_pool)
        .await
        .expect("Failed to query active job")
        .expect("No active job found");
    assert_eq!(active.id, job.id);

    // 2. Submit must be blocked while a required category has no photo
    let has_required = categories.iter().any(|c| c.required);
    if has_required {
        let err = lifecycle::submit_for_review(&db_pool, job.id)
            .await
            .expect_err("submit must fail without required photos");
        assert!(matches!(err, lifecycle::LifecycleError::Validation(_)));
    }

    // 3. Upload one photo into every required category (or the first one)
    let image = sample_jpeg();
    let targets: Vec<_> = if has_required {
        categories.iter().filter(|c| c.required).collect()
    } else {
        categories.iter().take(1).collect()
    };

    let mut uploaded_urls = Vec::new();
    for category in &targets {
        let path =
            paths::photo_object_path(&job.address, &job.id.to_string(), &category.name, "jpg");
        storage
            .put(&path, &image, "image/jpeg")
            .await
            .expect("Photo upload failed");
        let url = storage.url_for(&path);
        queries::insert_photo_record(&db_pool, job.id, category.id, &url)
            .await
            .expect("Failed to insert photo record");
        uploaded_urls.push((category.id, url));
    }

    assert_eq!(
        queries::count_photos(&db_pool, job.id)
            .await
            .expect("Failed to count photos"),
        targets.len() as i64
    );

    // 4. Submit for review
    let submitted = lifecycle::submit_for_review(&db_pool, job.id)
        .await
        .expect("Submit failed");
    assert_eq!(submitted.status, JobStatus::PendingReview);

    // 5. Approve: renders, uploads and links the report
    let approved = approval::approve_job(&state, job.id)
        .await
        .expect("Approval saga failed");
    assert_eq!(approved.status, JobStatus::Approved);
    let pdf_url = approved.pdf_url.clone().expect("pdf_url not set");

    let pdf = reqwest::get(&pdf_url)
        .await
        .expect("Report fetch failed")
        .bytes()
        .await
        .expect("Report body read failed");
    assert!(pdf.starts_with(b"%PDF"), "stored report is not a PDF");

    // 6. Undo approval clears the link and resets the status
    let reverted = lifecycle::undo_approval(&db_pool, job.id)
        .await
        .expect("Undo approval failed");
    assert_eq!(reverted.status, JobStatus::PendingReview);
    assert!(reverted.pdf_url.is_none());

    let reloaded = queries::get_job(&db_pool, job.id)
        .await
        .expect("Failed to reload job")
        .expect("Job disappeared");
    assert_eq!(reloaded.status, JobStatus::PendingReview);
    assert!(reloaded.pdf_url.is_none());

    // 7. Re-approve (overwrites the same report path) and complete
    approval::approve_job(&state, job.id)
        .await
        .expect("Re-approval failed");
    let completed = lifecycle::mark_complete(&db_pool, job.id)
        .await
        .expect("Complete failed");
    assert_eq!(completed.status, JobStatus::Completed);

    // 8. Delete an uploaded photo from both stores
    let (category_id, url) = uploaded_urls.remove(0);
    approval::delete_photo(&state, job.id, &url)
        .await
        .expect("Photo delete failed");
    let remaining = queries::list_photos_for_category(&db_pool, job.id, category_id)
        .await
        .expect("Failed to list photos");
    assert!(!remaining.contains(&url));

    // Cleanup: remove the stored report object
    let report_path = paths::report_object_path(&job.address, &job.id.to_string());
    let _ = storage.delete(&report_path).await;
}

/// Delete asymmetry: when the blob delete fails but the record delete
/// succeeds, the operation reports failure while the listing no longer
/// contains the photo.
#[tokio::test]
#[ignore] // Run with: cargo test --test integration_test -- --ignored --test-threads=1
async fn test_photo_delete_asymmetry() {
    let mut config = AppConfig::from_env().expect("Failed to load config");

    let db_pool = db::init_pool(&config.database_url)
        .await
        .expect("Failed to connect to database");
    db::run_migrations(&db_pool)
        .await
        .expect("Failed to run migrations");

    let categories = queries::list_categories(&db_pool)
        .await
        .expect("Failed to list categories");
    let category = categories.first().expect("seed photo_categories first");

    let address = format!("2 Asymmetry Ave {}", &Uuid::new_v4().to_string()[..8]);
    let job = lifecycle::create_job(&db_pool, &address)
        .await
        .expect("Failed to create job");
    // Free the single-active-job slot right away; deletion doesn't need it.
    queries::update_job_status(&db_pool, job.id, JobStatus::Completed)
        .await
        .expect("Failed to park job");

    // Upload a real blob with good credentials first.
    let good_state = AppState::new(db_pool.clone(), AppConfig::from_env().unwrap());
    let storage = good_state.object_store().expect("storage not configured");
    let path = paths::photo_object_path(&job.address, &job.id.to_string(), &category.name, "jpg");
    storage
        .put(&path, &sample_jpeg(), "image/jpeg")
        .await
        .expect("Photo upload failed");
    let url = storage.url_for(&path);
    queries::insert_photo_record(&db_pool, job.id, category.id, &url)
        .await
        .expect("Failed to insert photo record");

    // Break the storage credentials so only the blob delete fails.
    config.storage_secret_key = Some("wrong-secret".to_string());
    let broken_state = AppState::new(db_pool.clone(), config);

    let err = approval::delete_photo(&broken_state, job.id, &url)
        .await
        .expect_err("delete must report the blob-cleanup failure");
    assert!(matches!(err, approval::PhotoDeleteError::StorageCleanup(_)));

    // The metadata row is gone regardless.
    let remaining = queries::list_photos_for_category(&db_pool, job.id, category.id)
        .await
        .expect("Failed to list photos");
    assert!(!remaining.contains(&url));

    // Cleanup the orphaned blob with the good credentials.
    let _ = storage.delete(&path).await;
}
