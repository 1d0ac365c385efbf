//! Pipeline execution under run-store supervision.
//!
//! The executor is handed nothing but a run id; it reloads all state from
//! the stores, so broker-delivered and inline-fallback invocations are
//! indistinguishable. Every stage edge is a guarded compare-and-set, which
//! makes duplicate task delivery a no-op rather than a replay.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use thiserror::Error;
use tracing::{debug, info, warn};

use talentmatch_core::RunId;
use talentmatch_matching::{JobScorer, filter_jobs, rank_top_jobs};
use talentmatch_ranking::{
    CandidateScoreRow, CandidateScorer, evaluate_criteria, hard_filter, rank_candidates,
};
use talentmatch_runs::{
    MatchingTimings, RankingTimings, RunError, RunStore, RunStoreError, TraceEvent,
};

use crate::dispatch::PipelineTask;
use crate::stores::{CandidateDirectory, JobCatalog, RecruiterPreferenceStore};

#[derive(Debug, Error)]
pub enum ExecuteError {
    #[error("run not found: {0}")]
    RunNotFound(RunId),
    #[error(transparent)]
    Store(#[from] RunStoreError),
}

/// Knobs the pipelines read; fixed at wiring time.
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    /// Cap on jobs handed to the scoring stage.
    pub max_agent_jobs: usize,
    /// Result rows kept on a completed matching run.
    pub top_jobs: usize,
    /// Batch size for matching-side scorer invocations.
    pub scoring_batch_size: usize,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            max_agent_jobs: talentmatch_matching::MAX_AGENT_JOBS,
            top_jobs: 5,
            scoring_batch_size: 50,
        }
    }
}

/// Drives a run from PENDING to a terminal state.
pub struct PipelineExecutor {
    runs: Arc<dyn RunStore>,
    catalog: Arc<dyn JobCatalog>,
    candidates: Arc<dyn CandidateDirectory>,
    recruiter_prefs: Arc<dyn RecruiterPreferenceStore>,
    job_scorer: Arc<dyn JobScorer>,
    candidate_scorer: Arc<dyn CandidateScorer>,
    settings: PipelineSettings,
}

impl PipelineExecutor {
    pub fn new(
        runs: Arc<dyn RunStore>,
        catalog: Arc<dyn JobCatalog>,
        candidates: Arc<dyn CandidateDirectory>,
        recruiter_prefs: Arc<dyn RecruiterPreferenceStore>,
        job_scorer: Arc<dyn JobScorer>,
        candidate_scorer: Arc<dyn CandidateScorer>,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            runs,
            catalog,
            candidates,
            recruiter_prefs,
            job_scorer,
            candidate_scorer,
            settings,
        }
    }

    pub fn execute(&self, task: &PipelineTask) -> Result<(), ExecuteError> {
        match task {
            PipelineTask::MatchJobs(run_id) => self.execute_matching(*run_id),
            PipelineTask::RankCandidates(run_id) => self.execute_ranking(*run_id),
        }
    }

    fn execute_matching(&self, run_id: RunId) -> Result<(), ExecuteError> {
        let run = self
            .runs
            .matching_run(run_id)?
            .ok_or(ExecuteError::RunNotFound(run_id))?;
        if run.status.is_terminal() {
            debug!(run_id = %run_id, status = run.status.as_str(), "matching run already terminal");
            return Ok(());
        }

        let total_clock = Instant::now();
        let run = match self.runs.begin_filtering(run_id) {
            Ok(run) => run,
            Err(RunStoreError::StaleTransition { .. }) => {
                warn!(run_id = %run_id, "stale matching transition, duplicate delivery suppressed");
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };

        let filter_started = Utc::now();
        let filter_clock = Instant::now();
        let corpus = self.catalog.all_jobs();
        let outcome = filter_jobs(&corpus, &run.preference, self.settings.max_agent_jobs);
        let filtering_ms = filter_clock.elapsed().as_millis() as u64;

        let mut timings = MatchingTimings {
            filtering_ms,
            deterministic_metrics: outcome.metrics.clone(),
            ..MatchingTimings::default()
        };
        self.runs
            .record_filtering(run_id, outcome.metrics.ordered_count as u64, timings.clone())?;
        self.runs.append_trace(TraceEvent::success(
            run_id,
            "deterministic_filter",
            serde_json::json!({ "metrics": outcome.metrics }),
            filter_started,
        ))?;

        if outcome.jobs.is_empty() {
            // An empty passing set is a valid outcome: completed, zero results.
            timings.total_ms = total_clock.elapsed().as_millis() as u64;
            self.runs.complete_matching(run_id, Vec::new(), timings)?;
            info!(run_id = %run_id, "matching run completed with empty filtered set");
            return Ok(());
        }

        self.runs.begin_agent_scoring(run_id)?;

        let agent_started = Utc::now();
        let agent_clock = Instant::now();
        let mut scores = Vec::with_capacity(outcome.jobs.len());
        for batch in outcome.jobs.chunks(self.settings.scoring_batch_size.max(1)) {
            match self
                .job_scorer
                .score_batch(batch, &run.preference, &run.candidate_profile)
            {
                Ok(batch_scores) if batch_scores.len() == batch.len() => {
                    scores.extend(batch_scores);
                }
                Ok(batch_scores) => {
                    let message = format!(
                        "scorer returned {} scores for a batch of {}",
                        batch_scores.len(),
                        batch.len()
                    );
                    return self.fail_matching_stage(run_id, "agent_scoring", "SCORING_ERROR", message, agent_started);
                }
                Err(e) => {
                    return self.fail_matching_stage(
                        run_id,
                        "agent_scoring",
                        "AGENT_PIPELINE_ERROR",
                        e.to_string(),
                        agent_started,
                    );
                }
            }
        }

        let top_jobs = rank_top_jobs(&outcome.jobs, &scores, self.settings.top_jobs);
        timings.agent_ms_total = agent_clock.elapsed().as_millis() as u64;
        timings.total_ms = total_clock.elapsed().as_millis() as u64;

        self.runs.append_trace(TraceEvent::success(
            run_id,
            "agent_scoring",
            serde_json::json!({ "scored": scores.len(), "kept": top_jobs.len() }),
            agent_started,
        ))?;
        self.runs.complete_matching(run_id, top_jobs, timings)?;
        info!(run_id = %run_id, "matching run completed");
        Ok(())
    }

    fn fail_matching_stage(
        &self,
        run_id: RunId,
        stage: &str,
        code: &str,
        message: String,
        started_at: chrono::DateTime<Utc>,
    ) -> Result<(), ExecuteError> {
        self.runs.append_trace(TraceEvent::failure(
            run_id,
            stage,
            code,
            message.clone(),
            started_at,
        ))?;
        self.runs.fail_matching(run_id, RunError::new(code, message))?;
        warn!(run_id = %run_id, stage, code, "matching run failed");
        Ok(())
    }

    fn execute_ranking(&self, run_id: RunId) -> Result<(), ExecuteError> {
        let run = self
            .runs
            .ranking_run(run_id)?
            .ok_or(ExecuteError::RunNotFound(run_id))?;
        if run.status.is_terminal() {
            debug!(run_id = %run_id, status = run.status.as_str(), "ranking run already terminal");
            return Ok(());
        }

        let load_started = Utc::now();
        let Some(preference) = self.recruiter_prefs.preference_for(run.requisition_id) else {
            // Creation validates this; the preference may have been removed
            // between creation and execution.
            self.runs.append_trace(TraceEvent::failure(
                run_id,
                "load_preference",
                "MISSING_PREFERENCE",
                "Recruiter preference not found for the job.",
                load_started,
            ))?;
            self.runs.fail_ranking(
                run_id,
                RunError::new(
                    "MISSING_PREFERENCE",
                    "Recruiter preference not found for the job.",
                ),
            )?;
            return Ok(());
        };

        let job_description = self
            .candidates
            .requisition(run.requisition_id)
            .map(|r| r.job_description)
            .unwrap_or_default();
        let candidates = self.candidates.candidates_for(run.requisition_id);

        let total_clock = Instant::now();
        let run = match self.runs.begin_ranking(run_id, candidates.len()) {
            Ok(run) => run,
            Err(RunStoreError::StaleTransition { .. }) => {
                warn!(run_id = %run_id, "stale ranking transition, duplicate delivery suppressed");
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };

        let mut timings = RankingTimings::default();
        let mut rows = Vec::with_capacity(candidates.len());
        let mut processed = 0usize;

        for (batch_index, batch) in candidates.chunks(run.batch_size).enumerate() {
            let batch_started = Utc::now();
            for candidate in batch {
                let hard_clock = Instant::now();
                let comparisons = evaluate_criteria(&preference, candidate);
                let outcome = hard_filter(&preference, candidate, &comparisons);
                timings.hard_filter_ms += hard_clock.elapsed().as_millis() as u64;

                let scoring_clock = Instant::now();
                let score = match self.candidate_scorer.score(
                    candidate,
                    &preference,
                    &outcome,
                    &comparisons,
                    &job_description,
                ) {
                    Ok(score) => score,
                    Err(e) => {
                        self.runs.append_trace(TraceEvent::failure(
                            run_id,
                            "fit_scoring",
                            "SCORING_ERROR",
                            e.to_string(),
                            batch_started,
                        ))?;
                        self.runs
                            .fail_ranking(run_id, RunError::new("SCORING_ERROR", e.to_string()))?;
                        warn!(run_id = %run_id, candidate_id = %candidate.id, "ranking run failed in scoring");
                        return Ok(());
                    }
                };
                timings.scoring_ms += scoring_clock.elapsed().as_millis() as u64;

                rows.push(CandidateScoreRow {
                    candidate_id: candidate.id,
                    candidate_created_at: candidate.created_at,
                    passes_hard_filter: outcome.passes_hard_filter,
                    filter_reasons: outcome.filter_reasons,
                    final_score: score.final_score,
                    sub_scores: score.sub_scores,
                    summary: score.summary,
                });
                processed += 1;
            }

            self.runs.record_ranking_progress(run_id, processed)?;
            self.runs.append_trace(TraceEvent::success(
                run_id,
                "score_batch",
                serde_json::json!({ "batch": batch_index + 1, "size": batch.len() }),
                batch_started,
            ))?;
        }

        let ranker_started = Utc::now();
        let ranker_clock = Instant::now();
        let ranked = rank_candidates(rows, preference.number_of_openings);
        let shortlisted = ranked.iter().filter(|r| r.is_shortlisted).count();
        timings.ranker_ms = ranker_clock.elapsed().as_millis() as u64;
        timings.total_ms = total_clock.elapsed().as_millis() as u64;

        self.runs.append_trace(TraceEvent::success(
            run_id,
            "ranker",
            serde_json::json!({ "ranked": ranked.len(), "shortlisted": shortlisted }),
            ranker_started,
        ))?;
        self.runs
            .complete_ranking(run_id, ranked, shortlisted, timings)?;
        info!(run_id = %run_id, "ranking run completed");
        Ok(())
    }
}
