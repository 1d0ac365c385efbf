//! Run status state machines and failure recording.
//!
//! Transitions are monotonic and single-direction; no state is revisited.
//! Terminal states accept nothing further. The store enforces these edges
//! with compare-and-set writes; the enums here only *define* them.

use serde::{Deserialize, Serialize};

/// Matching-run lifecycle.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MatchingRunStatus {
    Pending,
    Filtering,
    AgentRunning,
    Completed,
    Failed,
}

impl MatchingRunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchingRunStatus::Pending => "PENDING",
            MatchingRunStatus::Filtering => "FILTERING",
            MatchingRunStatus::AgentRunning => "AGENT_RUNNING",
            MatchingRunStatus::Completed => "COMPLETED",
            MatchingRunStatus::Failed => "FAILED",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, MatchingRunStatus::Completed | MatchingRunStatus::Failed)
    }

    /// Legal forward edges. `Filtering -> Completed` covers the empty-corpus
    /// shortcut (zero filtered jobs means the scoring stage never starts).
    pub fn can_transition_to(&self, next: MatchingRunStatus) -> bool {
        use MatchingRunStatus::*;
        matches!(
            (self, next),
            (Pending, Filtering)
                | (Filtering, AgentRunning)
                | (Filtering, Completed)
                | (AgentRunning, Completed)
                | (Pending, Failed)
                | (Filtering, Failed)
                | (AgentRunning, Failed)
        )
    }
}

/// Ranking-run lifecycle.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RankingRunStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

impl RankingRunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RankingRunStatus::Pending => "PENDING",
            RankingRunStatus::Running => "RUNNING",
            RankingRunStatus::Completed => "COMPLETED",
            RankingRunStatus::Failed => "FAILED",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, RankingRunStatus::Completed | RankingRunStatus::Failed)
    }

    pub fn can_transition_to(&self, next: RankingRunStatus) -> bool {
        use RankingRunStatus::*;
        matches!(
            (self, next),
            (Pending, Running) | (Running, Completed) | (Pending, Failed) | (Running, Failed)
        )
    }
}

/// Error captured on a FAILED run. Always non-empty: every terminal failure
/// carries a code and a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunError {
    pub code: String,
    pub message: String,
}

impl RunError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}
