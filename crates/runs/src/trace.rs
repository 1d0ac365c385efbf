//! Append-only pipeline trace events.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use talentmatch_core::RunId;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TraceStatus {
    Success,
    Failed,
}

/// Record of one pipeline stage's start/end/outcome for a run.
///
/// Write-once, owned exclusively by the run that produced it. Used for
/// observability and debugging; never read back by the pipeline itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceEvent {
    pub run_id: RunId,
    pub stage: String,
    pub status: TraceStatus,
    pub detail: serde_json::Value,
    pub error_code: Option<String>,
    pub error_message: Option<String>,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    pub latency_ms: u64,
}

impl TraceEvent {
    pub fn success(
        run_id: RunId,
        stage: impl Into<String>,
        detail: serde_json::Value,
        started_at: DateTime<Utc>,
    ) -> Self {
        let completed_at = Utc::now();
        Self {
            run_id,
            stage: stage.into(),
            status: TraceStatus::Success,
            detail,
            error_code: None,
            error_message: None,
            started_at,
            completed_at,
            latency_ms: (completed_at - started_at).num_milliseconds().max(0) as u64,
        }
    }

    pub fn failure(
        run_id: RunId,
        stage: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
        started_at: DateTime<Utc>,
    ) -> Self {
        let completed_at = Utc::now();
        Self {
            run_id,
            stage: stage.into(),
            status: TraceStatus::Failed,
            detail: serde_json::Value::Null,
            error_code: Some(code.into()),
            error_message: Some(message.into()),
            started_at,
            completed_at,
            latency_ms: (completed_at - started_at).num_milliseconds().max(0) as u64,
        }
    }
}
