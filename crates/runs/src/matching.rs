//! Matching-run record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use talentmatch_core::{RunId, UserId};
use talentmatch_matching::{FilterMetrics, Preference, ScoredJob};

use crate::status::{MatchingRunStatus, RunError};

/// Per-stage wall-clock durations plus the deterministic filter metrics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchingTimings {
    pub filtering_ms: u64,
    pub agent_ms_total: u64,
    pub total_ms: u64,
    pub deterministic_metrics: FilterMetrics,
}

/// A single execution of the job-matching pipeline.
///
/// Created PENDING at submission; mutated only through the run store's
/// guarded transitions; never deleted by the core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchingRun {
    pub id: RunId,
    pub user_id: UserId,
    pub status: MatchingRunStatus,
    /// Immutable preference snapshot the run executes against.
    pub preference: Preference,
    /// Opaque candidate-profile snapshot forwarded to the scoring stage.
    pub candidate_profile: serde_json::Value,
    pub filtered_jobs_count: u64,
    pub timings: Option<MatchingTimings>,
    pub results: Vec<ScoredJob>,
    pub error: Option<RunError>,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl MatchingRun {
    pub fn new(user_id: UserId, preference: Preference, candidate_profile: serde_json::Value) -> Self {
        Self {
            id: RunId::new(),
            user_id,
            status: MatchingRunStatus::Pending,
            preference,
            candidate_profile,
            filtered_jobs_count: 0,
            timings: None,
            results: Vec::new(),
            error: None,
            created_at: Utc::now(),
            started_at: None,
            completed_at: None,
        }
    }
}
