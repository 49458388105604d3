// Data models for the corpus catalog
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::corruption::{CorruptionStats, SeverityConfig};

/// One invocation of the corpus builder over a dataset split
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildRun {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub split: String,
    pub base_seed: u64,
    pub severity: SeverityConfig,
    pub status: RunStatus,
    /// Mean F1 over processed performances, set when the run completes
    pub mean_f1: Option<f64>,
    pub processed: i64,
    pub skipped: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Pending,
    Processing,
    Complete,
    Failed,
}

impl RunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Pending => "pending",
            RunStatus::Processing => "processing",
            RunStatus::Complete => "complete",
            RunStatus::Failed => "failed",
        }
    }

    pub fn from_string(s: &str) -> Self {
        match s {
            "pending" => RunStatus::Pending,
            "processing" => RunStatus::Processing,
            "complete" => RunStatus::Complete,
            "failed" => RunStatus::Failed,
            _ => RunStatus::Pending,
        }
    }
}

/// A generated prediction for one performance within a run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerformanceRecord {
    pub id: Uuid,
    pub run_id: Uuid,
    pub performance_id: String,
    pub annotation_path: String,
    pub output_path: String,
    pub output_sha256: String,
    pub bytes: i64,
    /// Number of beats in the cleaned prediction
    pub beat_count: i64,
    pub f1: f64,
    pub stats: CorruptionStats,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunWithPerformances {
    pub run: BuildRun,
    pub performances: Vec<PerformanceRecord>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_status_round_trip() {
        for status in [
            RunStatus::Pending,
            RunStatus::Processing,
            RunStatus::Complete,
            RunStatus::Failed,
        ] {
            assert_eq!(RunStatus::from_string(status.as_str()), status);
        }
        assert_eq!(RunStatus::from_string("bogus"), RunStatus::Pending);
    }
}
