//! Scoring-stage boundary for matching runs.
//!
//! The orchestrator hands filtered jobs to a [`JobScorer`] in bounded
//! batches and ranks the results. The scorer is pluggable; the default is a
//! deterministic heuristic so the service works without an external model.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use talentmatch_core::JobId;

use crate::job::JobPosting;
use crate::preference::Preference;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ScoringError {
    #[error("scoring stage failed: {0}")]
    Stage(String),
}

/// Per-job scores, index-aligned with the scored batch.
///
/// All scores are clamped to `[0, 1]`; the external contract serializes them
/// as decimal strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobScore {
    pub selection_probability: f64,
    pub fit_score: f64,
    pub job_quality_score: f64,
    pub why: String,
}

/// A ranked result row persisted on a completed matching run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredJob {
    pub rank: u32,
    pub job_id: JobId,
    pub listing_ref: String,
    pub selection_probability: f64,
    pub fit_score: f64,
    pub job_quality_score: f64,
    pub why: String,
}

/// Pluggable scoring capability invoked after deterministic filtering.
///
/// Implementations must not mutate shared state and must tolerate an empty
/// batch. The candidate profile is an opaque snapshot; scorers read what
/// they understand and ignore the rest.
pub trait JobScorer: Send + Sync {
    fn score_batch(
        &self,
        jobs: &[JobPosting],
        preference: &Preference,
        candidate_profile: &serde_json::Value,
    ) -> Result<Vec<JobScore>, ScoringError>;
}

pub fn clamp_score(value: f64) -> f64 {
    value.clamp(0.0, 1.0)
}

/// Deterministic heuristic scorer.
///
/// Quality rewards complete postings; fit rewards preference alignment;
/// selection probability blends both with fixed priority weights.
#[derive(Debug, Default, Clone)]
pub struct HeuristicJobScorer;

const WEIGHT_LOCATION: f64 = 0.20;
const WEIGHT_COMPANY_TYPE: f64 = 0.20;

impl JobScorer for HeuristicJobScorer {
    fn score_batch(
        &self,
        jobs: &[JobPosting],
        preference: &Preference,
        _candidate_profile: &serde_json::Value,
    ) -> Result<Vec<JobScore>, ScoringError> {
        Ok(jobs
            .iter()
            .map(|job| score_job(job, preference))
            .collect())
    }
}

fn score_job(job: &JobPosting, preference: &Preference) -> JobScore {
    let mut quality = 0.4;
    if job.description.trim().len() > 120 {
        quality += 0.2;
    }
    if job.apply_url.is_some() {
        quality += 0.2;
    }
    if !job.company_name.is_empty() {
        quality += 0.2;
    }
    let quality = clamp_score(quality);

    let mut fit = 0.35;
    let mut reasons: Vec<&str> = Vec::new();

    if job.work_mode == preference.work_mode {
        fit += 0.20;
        reasons.push("Work mode match");
    }
    if job.employment_type == preference.employment_type {
        fit += 0.20;
        reasons.push("Employment type match");
    }
    if !preference.location.is_empty() && job.location.to_lowercase().contains(&preference.location)
    {
        fit += 0.10;
        reasons.push("Location alignment");
    }
    if job.company_size == preference.company_size {
        fit += 0.10;
        reasons.push("Company size preference match");
    }
    if preference.stipend_range().is_some()
        && job.stipend_min.is_some()
        && job.stipend_max.is_some()
    {
        fit += 0.05;
        reasons.push("Stipend overlap available");
    }
    let fit = clamp_score(fit);

    let selection = clamp_score(
        0.45 * fit + 0.35 * quality + 0.10 * WEIGHT_LOCATION + 0.10 * WEIGHT_COMPANY_TYPE,
    );

    let why = if reasons.is_empty() {
        "General alignment with preferences".to_string()
    } else {
        reasons[..reasons.len().min(3)].join("; ")
    };

    JobScore {
        selection_probability: selection,
        fit_score: fit,
        job_quality_score: quality,
        why,
    }
}

/// Rank scored jobs and keep the top `top_n`.
///
/// Order: selection probability desc, publish date desc (unknown last),
/// created_at desc, listing reference as the final deterministic tie-break.
pub fn rank_top_jobs(jobs: &[JobPosting], scores: &[JobScore], top_n: usize) -> Vec<ScoredJob> {
    let mut rows: Vec<(&JobPosting, &JobScore)> = jobs.iter().zip(scores.iter()).collect();
    rows.sort_by(|(job_a, score_a), (job_b, score_b)| {
        score_b
            .selection_probability
            .total_cmp(&score_a.selection_probability)
            .then_with(|| job_b.published_at.cmp(&job_a.published_at))
            .then_with(|| job_b.created_at.cmp(&job_a.created_at))
            .then_with(|| job_a.listing_ref.cmp(&job_b.listing_ref))
    });

    rows.into_iter()
        .take(top_n)
        .enumerate()
        .map(|(idx, (job, score))| ScoredJob {
            rank: idx as u32 + 1,
            job_id: job.id,
            listing_ref: job.listing_ref.clone(),
            selection_probability: score.selection_probability,
            fit_score: score.fit_score,
            job_quality_score: score.job_quality_score,
            why: score.why.clone(),
        })
        .collect()
}
