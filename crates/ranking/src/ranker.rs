//! Final ordering and shortlist of scored candidates.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use talentmatch_core::CandidateId;

use crate::scoring::SubScores;

/// Scored candidate before ranking.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateScoreRow {
    pub candidate_id: CandidateId,
    pub candidate_created_at: DateTime<Utc>,
    pub passes_hard_filter: bool,
    pub filter_reasons: Vec<String>,
    pub final_score: f64,
    pub sub_scores: SubScores,
    pub summary: String,
}

/// Result row persisted on a completed ranking run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedCandidate {
    pub rank: u32,
    pub candidate_id: CandidateId,
    pub is_shortlisted: bool,
    pub passes_hard_filter: bool,
    pub final_score: f64,
    pub sub_scores: SubScores,
    pub filter_reasons: Vec<String>,
    pub summary: String,
}

/// Order candidates and shortlist the top `openings`.
///
/// Order: final score desc, coding fit desc, experience fit desc, then
/// import order (created_at asc, id) so equal candidates rank first-come.
pub fn rank_candidates(mut rows: Vec<CandidateScoreRow>, openings: u32) -> Vec<RankedCandidate> {
    rows.sort_by(|a, b| {
        b.final_score
            .total_cmp(&a.final_score)
            .then_with(|| b.sub_scores.coding_fit.cmp(&a.sub_scores.coding_fit))
            .then_with(|| b.sub_scores.experience_fit.cmp(&a.sub_scores.experience_fit))
            .then_with(|| a.candidate_created_at.cmp(&b.candidate_created_at))
            .then_with(|| a.candidate_id.to_string().cmp(&b.candidate_id.to_string()))
    });

    rows.into_iter()
        .enumerate()
        .map(|(idx, row)| {
            let rank = idx as u32 + 1;
            RankedCandidate {
                rank,
                candidate_id: row.candidate_id,
                is_shortlisted: rank <= openings,
                passes_hard_filter: row.passes_hard_filter,
                final_score: row.final_score,
                sub_scores: row.sub_scores,
                filter_reasons: row.filter_reasons,
                summary: row.summary,
            }
        })
        .collect()
}
