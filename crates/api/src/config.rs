//! Process-wide configuration.
//!
//! Loaded once at startup from the environment and passed by reference into
//! handlers through the service wiring; nothing reads ambient globals after
//! boot. Feature flags gate run creation per pipeline kind.

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: String,
    pub jwt_secret: String,
    /// Gates matching-run creation (503 when off, before any record exists).
    pub matching_runs_enabled: bool,
    /// Gates ranking-run creation.
    pub ranking_runs_enabled: bool,
    /// Fixed page size for list endpoints.
    pub page_size: usize,
    /// Cap on jobs handed to the scoring stage.
    pub max_agent_jobs: usize,
    /// Result rows kept on a completed matching run.
    pub top_jobs: usize,
    /// Matching-side scorer batch size.
    pub scoring_batch_size: usize,
    /// Default ranking batch size when the request omits one.
    pub default_batch_size: usize,
    /// Bounded depth of the dispatch queue.
    pub queue_capacity: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8080".to_string(),
            jwt_secret: "dev-secret".to_string(),
            matching_runs_enabled: true,
            ranking_runs_enabled: true,
            page_size: 10,
            max_agent_jobs: talentmatch_matching::MAX_AGENT_JOBS,
            top_jobs: 5,
            scoring_batch_size: 50,
            default_batch_size: 10,
            queue_capacity: 64,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let jwt_secret = std::env::var("JWT_SECRET").unwrap_or_else(|_| {
            tracing::warn!("JWT_SECRET not set; using insecure dev default");
            defaults.jwt_secret.clone()
        });

        Self {
            bind_addr: env_or("BIND_ADDR", defaults.bind_addr.clone()),
            jwt_secret,
            matching_runs_enabled: env_bool("MATCHING_RUNS_ENABLED", defaults.matching_runs_enabled),
            ranking_runs_enabled: env_bool("RANKING_RUNS_ENABLED", defaults.ranking_runs_enabled),
            page_size: env_usize("RUN_PAGE_SIZE", defaults.page_size),
            max_agent_jobs: env_usize("MAX_AGENT_JOBS", defaults.max_agent_jobs),
            top_jobs: env_usize("TOP_JOBS", defaults.top_jobs),
            scoring_batch_size: env_usize("SCORING_BATCH_SIZE", defaults.scoring_batch_size),
            default_batch_size: env_usize("RANKING_BATCH_SIZE", defaults.default_batch_size),
            queue_capacity: env_usize("PIPELINE_QUEUE_CAPACITY", defaults.queue_capacity),
        }
    }
}

fn env_or(name: &str, default: String) -> String {
    std::env::var(name).unwrap_or(default)
}

fn env_bool(name: &str, default: bool) -> bool {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse::<bool>().ok())
        .unwrap_or(default)
}

fn env_usize(name: &str, default: usize) -> usize {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse::<usize>().ok())
        .filter(|v| *v > 0)
        .unwrap_or(default)
}
