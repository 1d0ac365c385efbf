//! Scoring-stage boundary for ranking runs.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::candidate::CandidateProfile;
use crate::hard_filter::{CriterionComparison, HardFilterOutcome};
use crate::preference::RecruiterPreference;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ScoringError {
    #[error("scoring stage failed: {0}")]
    Stage(String),
}

/// Per-dimension scores on a 0–100 scale.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubScores {
    pub education_fit: u32,
    pub experience_fit: u32,
    pub coding_fit: u32,
    pub jd_relevance: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateScore {
    pub sub_scores: SubScores,
    pub final_score: f64,
    pub summary: String,
}

/// Pluggable candidate scoring capability.
///
/// Invoked once per candidate that went through the hard filter; candidates
/// that failed it must score zero. `model_name` is recorded on the run for
/// reproducibility.
pub trait CandidateScorer: Send + Sync {
    fn model_name(&self) -> &str;

    fn score(
        &self,
        candidate: &CandidateProfile,
        preference: &RecruiterPreference,
        hard: &HardFilterOutcome,
        comparisons: &[CriterionComparison],
        job_description: &str,
    ) -> Result<CandidateScore, ScoringError>;
}

/// Deterministic heuristic scorer.
///
/// Weighted composite of education, experience, coding-criteria coverage and
/// description-token overlap.
#[derive(Debug, Default, Clone)]
pub struct HeuristicCandidateScorer;

pub const HEURISTIC_MODEL_NAME: &str = "heuristic-composite-v1";

const JD_TOKEN_WINDOW: usize = 40;
const JD_MIN_TOKEN_LEN: usize = 4;

impl CandidateScorer for HeuristicCandidateScorer {
    fn model_name(&self) -> &str {
        HEURISTIC_MODEL_NAME
    }

    fn score(
        &self,
        candidate: &CandidateProfile,
        preference: &RecruiterPreference,
        hard: &HardFilterOutcome,
        comparisons: &[CriterionComparison],
        job_description: &str,
    ) -> Result<CandidateScore, ScoringError> {
        if !hard.passes_hard_filter {
            return Ok(CandidateScore {
                sub_scores: SubScores::default(),
                final_score: 0.0,
                summary: "Rejected by hard filters".to_string(),
            });
        }

        let education_fit = match candidate.college_tier {
            Some(tier) if preference.allows_tier(tier) => 100,
            _ => 0,
        };

        let experience_fit = match candidate.experience_years {
            Some(years) if preference.experience_in_range(years) => 100,
            _ => 0,
        };

        let coding_fit = if comparisons.is_empty() {
            70
        } else {
            let matched = comparisons.iter().filter(|c| c.matched).count();
            (100 * matched / comparisons.len()) as u32
        };

        let jd_relevance = jd_relevance(candidate, job_description);

        let composite = 0.25 * f64::from(education_fit)
            + 0.25 * f64::from(experience_fit)
            + 0.30 * f64::from(coding_fit)
            + 0.20 * f64::from(jd_relevance);
        let final_score = (composite * 100.0).round() / 100.0;

        Ok(CandidateScore {
            sub_scores: SubScores {
                education_fit,
                experience_fit,
                coding_fit,
                jd_relevance,
            },
            final_score,
            summary: "Composite candidate fit score".to_string(),
        })
    }
}

/// Token overlap between the leading job-description tokens and the
/// candidate's skills/projects text. 5 points per hit, capped at 100.
fn jd_relevance(candidate: &CandidateProfile, job_description: &str) -> u32 {
    let profile_text = format!(
        "{} {}",
        candidate.skills_text.to_lowercase(),
        candidate.projects_text.to_lowercase()
    );

    let jd_lower = job_description.to_lowercase();
    let tokens: BTreeSet<&str> = jd_lower
        .split_whitespace()
        .take(JD_TOKEN_WINDOW)
        .filter(|t| t.len() >= JD_MIN_TOKEN_LEN)
        .collect();

    let hits = tokens
        .iter()
        .filter(|token| profile_text.contains(*token))
        .count() as u32;
    (hits * 5).min(100)
}
