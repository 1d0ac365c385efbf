//! Request DTOs and JSON response mapping.
//!
//! Scores cross the wire as decimal strings; timestamps as RFC 3339.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{Value, json};

use talentmatch_matching::{JobPosting, Preference, PreferenceDraft, ScoredJob};
use talentmatch_ranking::{RankedCandidate, RecruiterPreference, RecruiterPreferenceDraft};
use talentmatch_runs::{CandidateRankingRun, MatchingRun, MatchingRunStatus, RankingRunStatus};

#[derive(Debug, Deserialize)]
pub struct CreateMatchingRunRequest {
    pub preferences: Option<PreferenceDraft>,
    pub candidate_profile: Option<Value>,
}

#[derive(Debug, Deserialize)]
pub struct CreateRankingRunRequest {
    pub job_id: Option<String>,
    pub batch_size: Option<i64>,
    pub force_recompute: Option<bool>,
}

pub type MatchJobsPreviewRequest = PreferenceDraft;
pub type RecruiterPreferenceUpsertRequest = RecruiterPreferenceDraft;

#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<usize>,
}

impl PageQuery {
    /// 1-based page number; anything absent or zero means the first page.
    pub fn page(&self) -> usize {
        self.page.unwrap_or(1).max(1)
    }
}

/// Fixed-size page envelope with page-number navigation.
pub fn page_envelope(count: usize, page: usize, page_size: usize, results: Vec<Value>) -> Value {
    let next = if page * page_size < count { Some(page + 1) } else { None };
    let previous = if page > 1 { Some(page - 1) } else { None };
    json!({
        "count": count,
        "next": next,
        "previous": previous,
        "results": results,
    })
}

fn timestamp(value: Option<DateTime<Utc>>) -> Value {
    match value {
        Some(t) => json!(t.to_rfc3339()),
        None => Value::Null,
    }
}

fn decimal_string(value: f64, places: usize) -> String {
    format!("{value:.places$}")
}

pub fn preference_to_json(preference: &Preference) -> Value {
    serde_json::to_value(preference).unwrap_or(Value::Null)
}

pub fn job_to_json(job: &JobPosting) -> Value {
    json!({
        "id": job.id,
        "listing_ref": &job.listing_ref,
        "title": &job.title,
        "company_name": &job.company_name,
        "location": &job.location,
        "work_mode": job.work_mode,
        "employment_type": job.employment_type,
        "internship_duration_weeks": job.internship_duration_weeks,
        "company_size": job.company_size,
        "stipend_min": job.stipend_min.map(|d| d.to_string()),
        "stipend_max": job.stipend_max.map(|d| d.to_string()),
        "stipend_currency": &job.stipend_currency,
        "job_url": &job.job_url,
        "apply_url": &job.apply_url,
        "apply_type": job.apply_type,
        "published_at": job.published_at,
    })
}

fn scored_job_to_json(result: &ScoredJob) -> Value {
    json!({
        "rank": result.rank,
        "job_id": result.job_id,
        "listing_ref": &result.listing_ref,
        "selection_probability": decimal_string(result.selection_probability, 4),
        "fit_score": decimal_string(result.fit_score, 4),
        "job_quality_score": decimal_string(result.job_quality_score, 4),
        "why": &result.why,
    })
}

pub fn matching_run_created(run: &MatchingRun) -> Value {
    json!({
        "run_id": run.id,
        "status": run.status,
        "submitted_at": run.created_at.to_rfc3339(),
    })
}

pub fn matching_run_list_item(run: &MatchingRun) -> Value {
    json!({
        "run_id": run.id,
        "status": run.status,
        "filtered_jobs_count": run.filtered_jobs_count,
        "created_at": run.created_at.to_rfc3339(),
        "completed_at": timestamp(run.completed_at),
    })
}

pub fn matching_run_detail(run: &MatchingRun) -> Value {
    let top_jobs: Vec<Value> = if run.status == MatchingRunStatus::Completed {
        run.results.iter().map(scored_job_to_json).collect()
    } else {
        Vec::new()
    };
    let error = if run.status == MatchingRunStatus::Failed {
        serde_json::to_value(&run.error).unwrap_or(Value::Null)
    } else {
        Value::Null
    };

    json!({
        "run_id": run.id,
        "status": run.status,
        "preference_used": preference_to_json(&run.preference),
        "filtered_jobs_count": run.filtered_jobs_count,
        "timings": serde_json::to_value(&run.timings).unwrap_or(Value::Null),
        "top_jobs": top_jobs,
        "error": error,
        "started_at": timestamp(run.started_at),
        "completed_at": timestamp(run.completed_at),
        "created_at": run.created_at.to_rfc3339(),
    })
}

fn ranked_candidate_to_json(row: &RankedCandidate) -> Value {
    json!({
        "rank": row.rank,
        "candidate_id": row.candidate_id,
        "is_shortlisted": row.is_shortlisted,
        "passes_hard_filter": row.passes_hard_filter,
        "final_score": decimal_string(row.final_score, 2),
        "sub_scores": &row.sub_scores,
        "filter_reasons": &row.filter_reasons,
        "summary": &row.summary,
    })
}

pub fn ranking_run_created(run: &CandidateRankingRun) -> Value {
    json!({
        "run_id": run.id,
        "status": run.status,
        "submitted_at": run.created_at.to_rfc3339(),
    })
}

pub fn ranking_run_list_item(run: &CandidateRankingRun) -> Value {
    json!({
        "run_id": run.id,
        "job_id": run.requisition_id,
        "status": run.status,
        "total_candidates": run.total_candidates,
        "processed_candidates": run.processed_candidates,
        "shortlisted_count": run.shortlisted_count,
        "created_at": run.created_at.to_rfc3339(),
        "completed_at": timestamp(run.completed_at),
    })
}

pub fn ranking_run_detail(run: &CandidateRankingRun) -> Value {
    let error = if run.status == RankingRunStatus::Failed {
        serde_json::to_value(&run.error).unwrap_or(Value::Null)
    } else {
        Value::Null
    };

    json!({
        "run_id": run.id,
        "job_id": run.requisition_id,
        "status": run.status,
        "batch_size": run.batch_size,
        "model_name": &run.model_name,
        "total_candidates": run.total_candidates,
        "processed_candidates": run.processed_candidates,
        "shortlisted_count": run.shortlisted_count,
        "timings": serde_json::to_value(&run.timings).unwrap_or(Value::Null),
        "results": run.results.iter().map(ranked_candidate_to_json).collect::<Vec<_>>(),
        "error": error,
        "started_at": timestamp(run.started_at),
        "completed_at": timestamp(run.completed_at),
        "created_at": run.created_at.to_rfc3339(),
    })
}

pub fn recruiter_preference_to_json(preference: &RecruiterPreference) -> Value {
    json!({
        "job_id": preference.requisition_id,
        "college_tiers": &preference.college_tiers,
        "min_experience_years": preference.min_experience_years,
        "max_experience_years": preference.max_experience_years,
        "number_of_openings": preference.number_of_openings,
        "coding_platform_criteria": &preference.coding_platform_criteria,
    })
}
