use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use uuid::Uuid;

/// Lifecycle status of a documentation job.
///
/// `active` → `pending_review` → `approved` → `completed`, with
/// `approved` → `pending_review` reachable again via undo-approval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum JobStatus {
    Active,
    PendingReview,
    Approved,
    Completed,
}

/// One field work order, identified by a street address.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: Uuid,
    pub address: String,
    pub status: JobStatus,
    /// Set only by a successful approval; cleared when approval is undone.
    pub pdf_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_status_string_round_trip() {
        for status in [
            JobStatus::Active,
            JobStatus::PendingReview,
            JobStatus::Approved,
            JobStatus::Completed,
        ] {
            let text = status.to_string();
            assert_eq!(JobStatus::from_str(&text).unwrap(), status);
        }
        assert_eq!(JobStatus::PendingReview.to_string(), "pending_review");
    }
}
