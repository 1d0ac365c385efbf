//! `talentmatch-infra` — execution plumbing around the run store.
//!
//! Read-side store ports with in-memory implementations, the dispatch
//! capability (queue-backed with a synchronous inline fallback), the
//! pipeline executor that drives a run's state machine, and the background
//! worker loop that consumes dispatched tasks.

pub mod dispatch;
pub mod executor;
pub mod stores;
pub mod worker;


pub use dispatch::{DispatchError, Dispatcher, InlineDispatcher, PipelineLauncher, PipelineTask, QueueDispatcher};
pub use executor::{ExecuteError, PipelineExecutor, PipelineSettings};
pub use stores::{
    ActivePreferenceStore, CandidateDirectory, InMemoryActivePreferenceStore,
    InMemoryCandidateDirectory, InMemoryJobCatalog, InMemoryRecruiterPreferenceStore, JobCatalog,
    RecruiterPreferenceStore,
};
pub use worker::{WorkerConfig, WorkerHandle, spawn_worker};
