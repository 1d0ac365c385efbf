//! Candidate-ranking run record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use talentmatch_core::{RequisitionId, RunId};
use talentmatch_ranking::RankedCandidate;

use crate::status::{RankingRunStatus, RunError};

/// Per-stage wall-clock durations for a ranking run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankingTimings {
    pub hard_filter_ms: u64,
    pub scoring_ms: u64,
    pub ranker_ms: u64,
    pub total_ms: u64,
}

/// A single execution of the candidate-ranking pipeline, keyed by the job
/// requisition it ranks candidates for.
///
/// A COMPLETED run for a requisition may be reused instead of recomputed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateRankingRun {
    pub id: RunId,
    pub requisition_id: RequisitionId,
    pub status: RankingRunStatus,
    pub batch_size: usize,
    pub model_name: String,
    pub total_candidates: usize,
    pub processed_candidates: usize,
    pub shortlisted_count: usize,
    pub timings: Option<RankingTimings>,
    pub results: Vec<RankedCandidate>,
    pub error: Option<RunError>,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl CandidateRankingRun {
    pub fn new(requisition_id: RequisitionId, batch_size: usize, model_name: impl Into<String>) -> Self {
        Self {
            id: RunId::new(),
            requisition_id,
            status: RankingRunStatus::Pending,
            batch_size: batch_size.max(1),
            model_name: model_name.into(),
            total_candidates: 0,
            processed_candidates: 0,
            shortlisted_count: 0,
            timings: None,
            results: Vec::new(),
            error: None,
            created_at: Utc::now(),
            started_at: None,
            completed_at: None,
        }
    }
}
