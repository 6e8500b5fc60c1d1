mod app_state;
mod config;
mod db;
mod models;
mod routes;
mod services;

use axum::{routing::get, routing::post, Router};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::sync::Arc;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use app_state::AppState;
use config::AppConfig;

#[tokio::main]
async fn main() {
    // Initialize structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    // Load configuration from environment. Object-store credentials are
    // allowed to be absent here; the first storage operation reports that.
    let config = AppConfig::from_env().expect("Failed to load configuration from environment");

    tracing::info!("Initializing fieldproof server");

    // Initialize Prometheus metrics recorder
    let prometheus_handle = PrometheusBuilder::new()
        .install_recorder()
        .expect("Failed to install Prometheus metrics recorder");
    let prometheus_handle = Arc::new(prometheus_handle);

    // Register application metrics
    metrics::describe_counter!("jobs_created_total", "Total documentation jobs opened");
    metrics::describe_counter!("jobs_approved_total", "Total jobs approved with a stored report");
    metrics::describe_counter!(
        "approval_failures_total",
        "Approval saga runs that failed at some step"
    );
    metrics::describe_counter!("photos_uploaded_total", "Total photos uploaded");

    // Initialize database connection pool
    tracing::info!("Connecting to PostgreSQL database");
    let db_pool = db::init_pool(&config.database_url)
        .await
        .expect("Failed to connect to database");

    // Run database migrations
    tracing::info!("Running database migrations");
    db::run_migrations(&db_pool)
        .await
        .expect("Failed to run database migrations");

    let bind_addr = config.bind_addr.clone();

    // Create shared application state
    let state = AppState::new(db_pool, config);

    // Build API routes
    let app = Router::new()
        .route("/health", get(routes::health::health_check))
        .route("/api/v1/categories", get(routes::categories::list_categories))
        .route(
            "/api/v1/jobs",
            post(routes::jobs::create_job).get(routes::jobs::list_jobs),
        )
        .route("/api/v1/jobs/active", get(routes::jobs::get_active_job))
        .route("/api/v1/jobs/{job_id}", get(routes::jobs::get_job))
        .route("/api/v1/jobs/{job_id}/submit", post(routes::jobs::submit_for_review))
        .route("/api/v1/jobs/{job_id}/approve", post(routes::jobs::approve))
        .route(
            "/api/v1/jobs/{job_id}/undo-approval",
            post(routes::jobs::undo_approval),
        )
        .route("/api/v1/jobs/{job_id}/complete", post(routes::jobs::mark_complete))
        .route(
            "/api/v1/jobs/{job_id}/photos",
            post(routes::photos::upload_photo)
                .get(routes::photos::list_photos)
                .delete(routes::photos::delete_photo),
        )
        .with_state(state)
        // Prometheus metrics endpoint (separate state)
        .route(
            "/metrics",
            get(routes::metrics::prometheus_metrics).with_state(prometheus_handle),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .layer(RequestBodyLimitLayer::new(25 * 1024 * 1024)); // 25 MB limit for photo uploads

    tracing::info!("Starting fieldproof on {}", bind_addr);

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .expect("Failed to bind to address");

    tracing::info!("Server listening on {}", bind_addr);

    axum::serve(listener, app)
        .await
        .expect("Server error");
}
