//! Service wiring behind the routes.
//!
//! In-memory stores, the pipeline executor, and the queue-backed dispatcher
//! with its background worker. Everything handlers touch hangs off
//! [`AppServices`]; the worker handle is returned separately so the owner
//! controls its lifetime.

use std::sync::Arc;

use talentmatch_infra::{
    InMemoryActivePreferenceStore, InMemoryCandidateDirectory, InMemoryJobCatalog,
    InMemoryRecruiterPreferenceStore, PipelineExecutor, PipelineLauncher, PipelineSettings,
    WorkerConfig, WorkerHandle, spawn_worker,
};
use talentmatch_matching::HeuristicJobScorer;
use talentmatch_ranking::{CandidateScorer, HeuristicCandidateScorer};
use talentmatch_runs::InMemoryRunStore;

use crate::config::AppConfig;

pub struct AppServices {
    pub config: AppConfig,
    pub runs: Arc<InMemoryRunStore>,
    pub catalog: Arc<InMemoryJobCatalog>,
    pub directory: Arc<InMemoryCandidateDirectory>,
    pub recruiter_prefs: Arc<InMemoryRecruiterPreferenceStore>,
    pub active_prefs: Arc<InMemoryActivePreferenceStore>,
    pub launcher: PipelineLauncher,
    /// Scorer identity recorded on ranking runs.
    pub ranking_model: String,
}

/// Wire the in-memory service graph and start the pipeline worker.
pub fn build_services(config: AppConfig) -> (Arc<AppServices>, WorkerHandle) {
    let runs = Arc::new(InMemoryRunStore::new());
    let catalog = Arc::new(InMemoryJobCatalog::new());
    let directory = Arc::new(InMemoryCandidateDirectory::new());
    let recruiter_prefs = Arc::new(InMemoryRecruiterPreferenceStore::new());
    let active_prefs = Arc::new(InMemoryActivePreferenceStore::new());

    let candidate_scorer = Arc::new(HeuristicCandidateScorer);
    let ranking_model = candidate_scorer.model_name().to_string();

    let executor = Arc::new(PipelineExecutor::new(
        runs.clone(),
        catalog.clone(),
        directory.clone(),
        recruiter_prefs.clone(),
        Arc::new(HeuristicJobScorer),
        candidate_scorer,
        PipelineSettings {
            max_agent_jobs: config.max_agent_jobs,
            top_jobs: config.top_jobs,
            scoring_batch_size: config.scoring_batch_size,
        },
    ));

    let (dispatcher, worker) = spawn_worker(
        executor.clone(),
        WorkerConfig {
            queue_capacity: config.queue_capacity,
            ..WorkerConfig::default()
        },
    );
    let launcher = PipelineLauncher::new(Arc::new(dispatcher), executor);

    let services = Arc::new(AppServices {
        config,
        runs,
        catalog,
        directory,
        recruiter_prefs,
        active_prefs,
        launcher,
        ranking_model,
    });

    (services, worker)
}
