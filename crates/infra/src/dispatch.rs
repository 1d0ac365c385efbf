//! Task dispatch capability.
//!
//! One task type per pipeline kind, parameterized solely by run id: the
//! executor reloads everything else from the store, so queue-delivered and
//! inline-fallback execution behave identically.

use std::sync::Arc;
use std::sync::mpsc::{SyncSender, TrySendError};

use thiserror::Error;
use tracing::{error, warn};

use talentmatch_core::RunId;

use crate::executor::PipelineExecutor;

/// A pipeline invocation, as carried over the broker boundary.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PipelineTask {
    MatchJobs(RunId),
    RankCandidates(RunId),
}

impl PipelineTask {
    /// Broker-facing task name; part of the worker interface contract.
    pub fn task_name(&self) -> &'static str {
        match self {
            PipelineTask::MatchJobs(_) => "matching.run_pipeline",
            PipelineTask::RankCandidates(_) => "ranking.run_pipeline",
        }
    }

    pub fn run_id(&self) -> RunId {
        match self {
            PipelineTask::MatchJobs(id) | PipelineTask::RankCandidates(id) => *id,
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DispatchError {
    #[error("task queue is full")]
    QueueFull,
    #[error("task queue is disconnected")]
    Disconnected,
    #[error("inline execution failed: {0}")]
    Inline(String),
}

/// Gets a pipeline invocation executed, asynchronously if possible.
pub trait Dispatcher: Send + Sync {
    fn dispatch(&self, task: PipelineTask) -> Result<(), DispatchError>;
}

/// Queue-backed dispatcher feeding the background worker.
///
/// Enqueue failure (queue full, worker gone) surfaces as `DispatchError`;
/// callers recover via the inline fallback.
pub struct QueueDispatcher {
    tx: SyncSender<PipelineTask>,
}

impl QueueDispatcher {
    pub(crate) fn new(tx: SyncSender<PipelineTask>) -> Self {
        Self { tx }
    }
}

impl Dispatcher for QueueDispatcher {
    fn dispatch(&self, task: PipelineTask) -> Result<(), DispatchError> {
        self.tx.try_send(task).map_err(|e| match e {
            TrySendError::Full(_) => DispatchError::QueueFull,
            TrySendError::Disconnected(_) => DispatchError::Disconnected,
        })
    }
}

/// Executes the pipeline synchronously in the calling context.
pub struct InlineDispatcher {
    executor: Arc<PipelineExecutor>,
}

impl InlineDispatcher {
    pub fn new(executor: Arc<PipelineExecutor>) -> Self {
        Self { executor }
    }
}

impl Dispatcher for InlineDispatcher {
    fn dispatch(&self, task: PipelineTask) -> Result<(), DispatchError> {
        self.executor
            .execute(&task)
            .map_err(|e| DispatchError::Inline(e.to_string()))
    }
}

/// Dispatch with transparent synchronous fallback.
///
/// Tries the primary dispatcher; on enqueue failure the pipeline runs inline
/// in the calling context so run creation never loses forward progress, even
/// under broker outage. The client-visible response is identical either way.
pub struct PipelineLauncher {
    dispatcher: Arc<dyn Dispatcher>,
    executor: Arc<PipelineExecutor>,
}

impl PipelineLauncher {
    pub fn new(dispatcher: Arc<dyn Dispatcher>, executor: Arc<PipelineExecutor>) -> Self {
        Self { dispatcher, executor }
    }

    pub fn launch(&self, task: PipelineTask) {
        match self.dispatcher.dispatch(task) {
            Ok(()) => {}
            Err(dispatch_err) => {
                warn!(
                    task = task.task_name(),
                    run_id = %task.run_id(),
                    error = %dispatch_err,
                    "dispatch failed, executing pipeline inline"
                );
                if let Err(exec_err) = self.executor.execute(&task) {
                    // Pipeline-stage failures are captured into the run record;
                    // this only fires when the run itself cannot be loaded.
                    error!(
                        task = task.task_name(),
                        run_id = %task.run_id(),
                        error = %exec_err,
                        "inline fallback execution failed"
                    );
                }
            }
        }
    }
}
