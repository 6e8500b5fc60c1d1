//! Field-Crew Job Documentation Service
//!
//! This library provides the core functionality for fieldproof: job records
//! progress through a fixed review lifecycle while crews upload
//! category-tagged photos to an S3-compatible object store, and supervisor
//! approval renders those photos into a PDF report linked back to the job.

pub mod app_state;
pub mod config;
pub mod db;
pub mod models;
pub mod routes;
pub mod services;
