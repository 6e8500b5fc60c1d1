use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A named, ordered, optionally-required bucket that photos are filed under.
/// Rows are owned by deployment configuration; this service only reads them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhotoCategory {
    pub id: Uuid,
    pub name: String,
    pub sort_order: i32,
    pub required: bool,
}

/// Metadata pointer linking a job and a category to a stored image's URL.
/// The object store owns the bytes; this row owns the pointer. The two are
/// not transactionally linked.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhotoRecord {
    pub id: Uuid,
    pub job_id: Uuid,
    pub category_id: Uuid,
    pub storage_url: String,
}
