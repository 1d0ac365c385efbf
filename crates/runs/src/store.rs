//! Run storage.
//!
//! The `RunStore` trait is the persistence seam: every mutation is a named,
//! guarded transition so duplicate task delivery can never replay a stage.
//! The in-memory implementation backs tests and single-process deployments;
//! a database-backed store is a drop-in behind the same trait.

use std::collections::HashMap;
use std::sync::RwLock;

use chrono::Utc;

use talentmatch_core::{RequisitionId, RunId, UserId};
use talentmatch_matching::ScoredJob;
use talentmatch_ranking::RankedCandidate;

use crate::matching::{MatchingRun, MatchingTimings};
use crate::ranking::{CandidateRankingRun, RankingTimings};
use crate::status::{MatchingRunStatus, RankingRunStatus, RunError};
use crate::trace::TraceEvent;

#[derive(Debug, Clone, thiserror::Error)]
pub enum RunStoreError {
    #[error("run not found: {0}")]
    NotFound(RunId),
    #[error("stale transition for run {run}: {from} -> {to}")]
    StaleTransition {
        run: RunId,
        from: &'static str,
        to: &'static str,
    },
    #[error("storage error: {0}")]
    Storage(String),
}

/// Outcome of a ranking-run creation request.
#[derive(Debug, Clone)]
pub struct RankingCreation {
    pub run: CandidateRankingRun,
    /// True when an existing COMPLETED run was returned instead of a new one.
    pub reused: bool,
}

/// Persisted run records and trace events.
pub trait RunStore: Send + Sync {
    // Matching runs.
    fn insert_matching(&self, run: MatchingRun) -> Result<MatchingRun, RunStoreError>;
    fn matching_run(&self, id: RunId) -> Result<Option<MatchingRun>, RunStoreError>;
    /// Caller-scoped page, newest first. Returns (page, total for the caller).
    fn list_matching(
        &self,
        user_id: UserId,
        offset: usize,
        limit: usize,
    ) -> Result<(Vec<MatchingRun>, usize), RunStoreError>;

    /// PENDING -> FILTERING; stamps `started_at`.
    fn begin_filtering(&self, id: RunId) -> Result<MatchingRun, RunStoreError>;
    /// Record filter output while still FILTERING (guarded write, no edge).
    fn record_filtering(
        &self,
        id: RunId,
        filtered_jobs_count: u64,
        timings: MatchingTimings,
    ) -> Result<MatchingRun, RunStoreError>;
    /// FILTERING -> AGENT_RUNNING.
    fn begin_agent_scoring(&self, id: RunId) -> Result<MatchingRun, RunStoreError>;
    /// FILTERING|AGENT_RUNNING -> COMPLETED; persists results + timings.
    fn complete_matching(
        &self,
        id: RunId,
        results: Vec<ScoredJob>,
        timings: MatchingTimings,
    ) -> Result<MatchingRun, RunStoreError>;
    /// Any non-terminal -> FAILED. `completed_at` stays null; results empty.
    fn fail_matching(&self, id: RunId, error: RunError) -> Result<MatchingRun, RunStoreError>;

    // Ranking runs.
    /// Insert a new run, or return the latest COMPLETED run for the
    /// requisition when `force_recompute` is false. Lookup and insert happen
    /// in one critical section so concurrent creates cannot race duplicates.
    fn create_ranking_or_reuse(
        &self,
        run: CandidateRankingRun,
        force_recompute: bool,
    ) -> Result<RankingCreation, RunStoreError>;
    fn ranking_run(&self, id: RunId) -> Result<Option<CandidateRankingRun>, RunStoreError>;
    fn list_ranking(
        &self,
        requisition_id: RequisitionId,
        offset: usize,
        limit: usize,
    ) -> Result<(Vec<CandidateRankingRun>, usize), RunStoreError>;

    /// PENDING -> RUNNING; stamps `started_at` and the candidate total.
    fn begin_ranking(
        &self,
        id: RunId,
        total_candidates: usize,
    ) -> Result<CandidateRankingRun, RunStoreError>;
    /// Progress counter update while RUNNING.
    fn record_ranking_progress(&self, id: RunId, processed: usize) -> Result<(), RunStoreError>;
    /// RUNNING -> COMPLETED.
    fn complete_ranking(
        &self,
        id: RunId,
        results: Vec<RankedCandidate>,
        shortlisted_count: usize,
        timings: RankingTimings,
    ) -> Result<CandidateRankingRun, RunStoreError>;
    /// Any non-terminal -> FAILED.
    fn fail_ranking(&self, id: RunId, error: RunError) -> Result<CandidateRankingRun, RunStoreError>;

    // Trace events (append-only).
    fn append_trace(&self, event: TraceEvent) -> Result<(), RunStoreError>;
    fn trace_events(&self, run_id: RunId) -> Result<Vec<TraceEvent>, RunStoreError>;
}

/// In-memory run store for tests and single-process deployments.
#[derive(Debug, Default)]
pub struct InMemoryRunStore {
    matching: RwLock<HashMap<RunId, MatchingRun>>,
    ranking: RwLock<HashMap<RunId, CandidateRankingRun>>,
    traces: RwLock<Vec<TraceEvent>>,
}

impl InMemoryRunStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn transition_matching(
        &self,
        id: RunId,
        allowed_from: &[MatchingRunStatus],
        to: MatchingRunStatus,
        mutate: impl FnOnce(&mut MatchingRun),
    ) -> Result<MatchingRun, RunStoreError> {
        let mut runs = self.matching.write().unwrap();
        let run = runs.get_mut(&id).ok_or(RunStoreError::NotFound(id))?;
        if !allowed_from.contains(&run.status) {
            return Err(RunStoreError::StaleTransition {
                run: id,
                from: run.status.as_str(),
                to: to.as_str(),
            });
        }
        run.status = to;
        mutate(run);
        Ok(run.clone())
    }

    fn transition_ranking(
        &self,
        id: RunId,
        allowed_from: &[RankingRunStatus],
        to: RankingRunStatus,
        mutate: impl FnOnce(&mut CandidateRankingRun),
    ) -> Result<CandidateRankingRun, RunStoreError> {
        let mut runs = self.ranking.write().unwrap();
        let run = runs.get_mut(&id).ok_or(RunStoreError::NotFound(id))?;
        if !allowed_from.contains(&run.status) {
            return Err(RunStoreError::StaleTransition {
                run: id,
                from: run.status.as_str(),
                to: to.as_str(),
            });
        }
        run.status = to;
        mutate(run);
        Ok(run.clone())
    }
}

impl RunStore for InMemoryRunStore {
    fn insert_matching(&self, run: MatchingRun) -> Result<MatchingRun, RunStoreError> {
        let mut runs = self.matching.write().unwrap();
        if runs.contains_key(&run.id) {
            return Err(RunStoreError::Storage(format!("run already exists: {}", run.id)));
        }
        runs.insert(run.id, run.clone());
        Ok(run)
    }

    fn matching_run(&self, id: RunId) -> Result<Option<MatchingRun>, RunStoreError> {
        Ok(self.matching.read().unwrap().get(&id).cloned())
    }

    fn list_matching(
        &self,
        user_id: UserId,
        offset: usize,
        limit: usize,
    ) -> Result<(Vec<MatchingRun>, usize), RunStoreError> {
        let runs = self.matching.read().unwrap();
        let mut owned: Vec<MatchingRun> = runs
            .values()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect();
        // Newest first; RunId (UUIDv7) breaks created_at ties in insert order.
        owned.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.to_string().cmp(&a.id.to_string()))
        });
        let total = owned.len();
        let page = owned.into_iter().skip(offset).take(limit).collect();
        Ok((page, total))
    }

    fn begin_filtering(&self, id: RunId) -> Result<MatchingRun, RunStoreError> {
        self.transition_matching(
            id,
            &[MatchingRunStatus::Pending],
            MatchingRunStatus::Filtering,
            |run| run.started_at = Some(Utc::now()),
        )
    }

    fn record_filtering(
        &self,
        id: RunId,
        filtered_jobs_count: u64,
        timings: MatchingTimings,
    ) -> Result<MatchingRun, RunStoreError> {
        self.transition_matching(
            id,
            &[MatchingRunStatus::Filtering],
            MatchingRunStatus::Filtering,
            |run| {
                run.filtered_jobs_count = filtered_jobs_count;
                run.timings = Some(timings);
            },
        )
    }

    fn begin_agent_scoring(&self, id: RunId) -> Result<MatchingRun, RunStoreError> {
        self.transition_matching(
            id,
            &[MatchingRunStatus::Filtering],
            MatchingRunStatus::AgentRunning,
            |_| {},
        )
    }

    fn complete_matching(
        &self,
        id: RunId,
        results: Vec<ScoredJob>,
        timings: MatchingTimings,
    ) -> Result<MatchingRun, RunStoreError> {
        self.transition_matching(
            id,
            &[MatchingRunStatus::Filtering, MatchingRunStatus::AgentRunning],
            MatchingRunStatus::Completed,
            |run| {
                run.results = results;
                run.timings = Some(timings);
                run.error = None;
                run.completed_at = Some(Utc::now());
            },
        )
    }

    fn fail_matching(&self, id: RunId, error: RunError) -> Result<MatchingRun, RunStoreError> {
        self.transition_matching(
            id,
            &[
                MatchingRunStatus::Pending,
                MatchingRunStatus::Filtering,
                MatchingRunStatus::AgentRunning,
            ],
            MatchingRunStatus::Failed,
            |run| {
                run.error = Some(error);
                run.results.clear();
                // completed_at intentionally stays null on failure; the FAILED
                // trace event carries the failure timestamp.
            },
        )
    }

    fn create_ranking_or_reuse(
        &self,
        run: CandidateRankingRun,
        force_recompute: bool,
    ) -> Result<RankingCreation, RunStoreError> {
        let mut runs = self.ranking.write().unwrap();
        if !force_recompute {
            let reusable = runs
                .values()
                .filter(|r| {
                    r.requisition_id == run.requisition_id
                        && r.status == RankingRunStatus::Completed
                })
                .max_by_key(|r| r.created_at);
            if let Some(existing) = reusable {
                return Ok(RankingCreation {
                    run: existing.clone(),
                    reused: true,
                });
            }
        }
        if runs.contains_key(&run.id) {
            return Err(RunStoreError::Storage(format!("run already exists: {}", run.id)));
        }
        runs.insert(run.id, run.clone());
        Ok(RankingCreation { run, reused: false })
    }

    fn ranking_run(&self, id: RunId) -> Result<Option<CandidateRankingRun>, RunStoreError> {
        Ok(self.ranking.read().unwrap().get(&id).cloned())
    }

    fn list_ranking(
        &self,
        requisition_id: RequisitionId,
        offset: usize,
        limit: usize,
    ) -> Result<(Vec<CandidateRankingRun>, usize), RunStoreError> {
        let runs = self.ranking.read().unwrap();
        let mut for_job: Vec<CandidateRankingRun> = runs
            .values()
            .filter(|r| r.requisition_id == requisition_id)
            .cloned()
            .collect();
        for_job.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.to_string().cmp(&a.id.to_string()))
        });
        let total = for_job.len();
        let page = for_job.into_iter().skip(offset).take(limit).collect();
        Ok((page, total))
    }

    fn begin_ranking(
        &self,
        id: RunId,
        total_candidates: usize,
    ) -> Result<CandidateRankingRun, RunStoreError> {
        self.transition_ranking(
            id,
            &[RankingRunStatus::Pending],
            RankingRunStatus::Running,
            |run| {
                run.started_at = Some(Utc::now());
                run.total_candidates = total_candidates;
            },
        )
    }

    fn record_ranking_progress(&self, id: RunId, processed: usize) -> Result<(), RunStoreError> {
        self.transition_ranking(
            id,
            &[RankingRunStatus::Running],
            RankingRunStatus::Running,
            |run| run.processed_candidates = processed,
        )
        .map(|_| ())
    }

    fn complete_ranking(
        &self,
        id: RunId,
        results: Vec<RankedCandidate>,
        shortlisted_count: usize,
        timings: RankingTimings,
    ) -> Result<CandidateRankingRun, RunStoreError> {
        self.transition_ranking(
            id,
            &[RankingRunStatus::Running],
            RankingRunStatus::Completed,
            |run| {
                run.results = results;
                run.shortlisted_count = shortlisted_count;
                run.timings = Some(timings);
                run.error = None;
                run.completed_at = Some(Utc::now());
            },
        )
    }

    fn fail_ranking(&self, id: RunId, error: RunError) -> Result<CandidateRankingRun, RunStoreError> {
        self.transition_ranking(
            id,
            &[RankingRunStatus::Pending, RankingRunStatus::Running],
            RankingRunStatus::Failed,
            |run| {
                run.error = Some(error);
                run.results.clear();
            },
        )
    }

    fn append_trace(&self, event: TraceEvent) -> Result<(), RunStoreError> {
        self.traces.write().unwrap().push(event);
        Ok(())
    }

    fn trace_events(&self, run_id: RunId) -> Result<Vec<TraceEvent>, RunStoreError> {
        Ok(self
            .traces
            .read()
            .unwrap()
            .iter()
            .filter(|e| e.run_id == run_id)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use talentmatch_matching::PreferenceDraft;

    use super::*;

    fn preference() -> talentmatch_matching::Preference {
        PreferenceDraft {
            work_mode: Some("REMOTE".into()),
            employment_type: Some("FULL_TIME".into()),
            location: Some("bangalore".into()),
            company_size: Some("STARTUP".into()),
            ..PreferenceDraft::default()
        }
        .normalize()
        .unwrap()
    }

    fn new_run(user_id: UserId) -> MatchingRun {
        MatchingRun::new(user_id, preference(), serde_json::Value::Null)
    }

    #[test]
    fn matching_lifecycle_happy_path() {
        let store = InMemoryRunStore::new();
        let run = store.insert_matching(new_run(UserId::new())).unwrap();

        let run = store.begin_filtering(run.id).unwrap();
        assert_eq!(run.status, MatchingRunStatus::Filtering);
        assert!(run.started_at.is_some());

        store
            .record_filtering(run.id, 3, MatchingTimings::default())
            .unwrap();
        let run = store.begin_agent_scoring(run.id).unwrap();
        assert_eq!(run.status, MatchingRunStatus::AgentRunning);

        let run = store
            .complete_matching(run.id, vec![], MatchingTimings::default())
            .unwrap();
        assert_eq!(run.status, MatchingRunStatus::Completed);
        assert!(run.completed_at.is_some());
        assert!(run.error.is_none());
    }

    #[test]
    fn duplicate_begin_filtering_is_rejected() {
        let store = InMemoryRunStore::new();
        let run = store.insert_matching(new_run(UserId::new())).unwrap();

        store.begin_filtering(run.id).unwrap();
        // Second delivery of the same task must not re-enter the stage.
        assert!(matches!(
            store.begin_filtering(run.id),
            Err(RunStoreError::StaleTransition { .. })
        ));
    }

    #[test]
    fn terminal_runs_never_regress() {
        let store = InMemoryRunStore::new();
        let run = store.insert_matching(new_run(UserId::new())).unwrap();
        store.begin_filtering(run.id).unwrap();
        store
            .complete_matching(run.id, vec![], MatchingTimings::default())
            .unwrap();

        assert!(store.begin_agent_scoring(run.id).is_err());
        assert!(store
            .fail_matching(run.id, RunError::new("X", "late failure"))
            .is_err());
        let stored = store.matching_run(run.id).unwrap().unwrap();
        assert_eq!(stored.status, MatchingRunStatus::Completed);
    }

    #[test]
    fn failure_keeps_completed_at_null_and_clears_results() {
        let store = InMemoryRunStore::new();
        let run = store.insert_matching(new_run(UserId::new())).unwrap();
        store.begin_filtering(run.id).unwrap();

        let failed = store
            .fail_matching(run.id, RunError::new("AGENT_PIPELINE_ERROR", "boom"))
            .unwrap();
        assert_eq!(failed.status, MatchingRunStatus::Failed);
        assert!(failed.completed_at.is_none());
        assert!(failed.results.is_empty());
        assert_eq!(failed.error.as_ref().unwrap().code, "AGENT_PIPELINE_ERROR");
    }

    #[test]
    fn list_is_caller_scoped_newest_first_and_paginated() {
        let store = InMemoryRunStore::new();
        let alice = UserId::new();
        let bob = UserId::new();

        let mut ids = Vec::new();
        for _ in 0..3 {
            ids.push(store.insert_matching(new_run(alice)).unwrap().id);
        }
        store.insert_matching(new_run(bob)).unwrap();

        let (page, total) = store.list_matching(alice, 0, 2).unwrap();
        assert_eq!(total, 3);
        assert_eq!(page.len(), 2);
        assert!(page.iter().all(|r| r.user_id == alice));
        assert!(page[0].created_at >= page[1].created_at);

        let (rest, _) = store.list_matching(alice, 2, 2).unwrap();
        assert_eq!(rest.len(), 1);
    }

    #[test]
    fn ranking_reuse_returns_existing_completed_run() {
        let store = InMemoryRunStore::new();
        let requisition = RequisitionId::new();

        let first = store
            .create_ranking_or_reuse(
                CandidateRankingRun::new(requisition, 10, "heuristic"),
                false,
            )
            .unwrap();
        assert!(!first.reused);

        store.begin_ranking(first.run.id, 0).unwrap();
        store
            .complete_ranking(first.run.id, vec![], 0, RankingTimings::default())
            .unwrap();

        let second = store
            .create_ranking_or_reuse(
                CandidateRankingRun::new(requisition, 10, "heuristic"),
                false,
            )
            .unwrap();
        assert!(second.reused);
        assert_eq!(second.run.id, first.run.id);
    }

    #[test]
    fn ranking_reuse_skips_non_completed_runs() {
        let store = InMemoryRunStore::new();
        let requisition = RequisitionId::new();

        let pending = store
            .create_ranking_or_reuse(
                CandidateRankingRun::new(requisition, 10, "heuristic"),
                false,
            )
            .unwrap();
        assert!(!pending.reused);

        // Still PENDING, so a second request creates a fresh run.
        let second = store
            .create_ranking_or_reuse(
                CandidateRankingRun::new(requisition, 10, "heuristic"),
                false,
            )
            .unwrap();
        assert!(!second.reused);
        assert_ne!(second.run.id, pending.run.id);
    }

    #[test]
    fn force_recompute_always_creates_and_keeps_old_run_queryable() {
        let store = InMemoryRunStore::new();
        let requisition = RequisitionId::new();

        let first = store
            .create_ranking_or_reuse(
                CandidateRankingRun::new(requisition, 10, "heuristic"),
                false,
            )
            .unwrap();
        store.begin_ranking(first.run.id, 0).unwrap();
        store
            .complete_ranking(first.run.id, vec![], 0, RankingTimings::default())
            .unwrap();

        let forced = store
            .create_ranking_or_reuse(
                CandidateRankingRun::new(requisition, 10, "heuristic"),
                true,
            )
            .unwrap();
        assert!(!forced.reused);
        assert_ne!(forced.run.id, first.run.id);
        assert!(store.ranking_run(first.run.id).unwrap().is_some());
    }

    #[test]
    fn ranking_progress_requires_running_state() {
        let store = InMemoryRunStore::new();
        let requisition = RequisitionId::new();
        let created = store
            .create_ranking_or_reuse(
                CandidateRankingRun::new(requisition, 10, "heuristic"),
                false,
            )
            .unwrap();

        assert!(store.record_ranking_progress(created.run.id, 1).is_err());
        store.begin_ranking(created.run.id, 5).unwrap();
        store.record_ranking_progress(created.run.id, 1).unwrap();
        let run = store.ranking_run(created.run.id).unwrap().unwrap();
        assert_eq!(run.processed_candidates, 1);
        assert_eq!(run.total_candidates, 5);
    }

    #[test]
    fn trace_events_append_in_order_per_run() {
        let store = InMemoryRunStore::new();
        let run_id = RunId::new();
        let other = RunId::new();
        let t0 = Utc::now();

        store
            .append_trace(TraceEvent::success(run_id, "deterministic_filter", serde_json::json!({}), t0))
            .unwrap();
        store
            .append_trace(TraceEvent::success(other, "ranker", serde_json::json!({}), t0))
            .unwrap();
        store
            .append_trace(TraceEvent::failure(run_id, "agent_scoring", "X", "boom", t0))
            .unwrap();

        let events = store.trace_events(run_id).unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].stage, "deterministic_filter");
        assert_eq!(events[1].stage, "agent_scoring");
    }
}
