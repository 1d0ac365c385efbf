//! Background worker consuming dispatched pipeline tasks.

use std::sync::Arc;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::Duration;

use tracing::{debug, error, info};

use crate::dispatch::{PipelineTask, QueueDispatcher};
use crate::executor::PipelineExecutor;

#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Thread name for logging.
    pub name: String,
    /// Bounded queue depth between dispatchers and the worker.
    pub queue_capacity: usize,
    /// How often the loop re-checks for shutdown while idle.
    pub poll_interval: Duration,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            name: "pipeline-worker".to_string(),
            queue_capacity: 64,
            poll_interval: Duration::from_millis(100),
        }
    }
}

/// Handle to control the running worker.
#[derive(Debug)]
pub struct WorkerHandle {
    shutdown: mpsc::Sender<()>,
    join: Option<thread::JoinHandle<()>>,
}

impl WorkerHandle {
    /// Request graceful shutdown and wait for the loop to exit.
    pub fn shutdown(mut self) {
        let _ = self.shutdown.send(());
        if let Some(join) = self.join.take() {
            let _ = join.join();
        }
    }
}

/// Spawn the worker thread and return the dispatcher feeding it.
pub fn spawn_worker(
    executor: Arc<PipelineExecutor>,
    config: WorkerConfig,
) -> (QueueDispatcher, WorkerHandle) {
    let (task_tx, task_rx) = mpsc::sync_channel::<PipelineTask>(config.queue_capacity);
    let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();

    let name = config.name.clone();
    let poll_interval = config.poll_interval;
    let join = thread::Builder::new()
        .name(name.clone())
        .spawn(move || {
            info!(worker = %name, "pipeline worker started");
            loop {
                if shutdown_rx.try_recv().is_ok() {
                    break;
                }
                match task_rx.recv_timeout(poll_interval) {
                    Ok(task) => {
                        debug!(
                            worker = %name,
                            task = task.task_name(),
                            run_id = %task.run_id(),
                            "claimed task"
                        );
                        if let Err(e) = executor.execute(&task) {
                            // Stage failures land on the run record; this is an
                            // infrastructural error (run vanished, store down).
                            error!(
                                worker = %name,
                                task = task.task_name(),
                                run_id = %task.run_id(),
                                error = %e,
                                "task execution failed"
                            );
                        }
                    }
                    Err(RecvTimeoutError::Timeout) => continue,
                    Err(RecvTimeoutError::Disconnected) => break,
                }
            }
            info!(worker = %name, "pipeline worker stopped");
        })
        .expect("failed to spawn pipeline worker thread");

    (
        QueueDispatcher::new(task_tx),
        WorkerHandle {
            shutdown: shutdown_tx,
            join: Some(join),
        },
    )
}
