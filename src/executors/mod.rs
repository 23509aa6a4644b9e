//! # Executors: where service jobs run.
//!
//! - [`Executor`] trait accepting boxed one-shot [`Job`]s
//! - [`ThreadExecutor`] one named OS thread per job
//! - [`ObservableExecutor`] queueing executor with a concurrency limit, able to
//!   [`submit`](ObservableExecutor::submit) whole services
//! - [`dispatch`] picks the right path for a service and an optional executor

mod dispatch;
mod observable;
mod thread;

pub use dispatch::dispatch;
pub use observable::{ObservableConfig, ObservableExecutor};
pub use thread::ThreadExecutor;

use crate::error::BridgeError;

/// One-shot unit handed to an executor.
pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// Runs jobs somewhere else.
///
/// An executor that returns `Err` drops the job without running it.
pub trait Executor: Send + Sync + 'static {
    /// Accepts `job` for execution.
    fn execute(&self, job: Job) -> Result<(), BridgeError>;

    /// Returns `Some` for executors that take whole services (see [`dispatch`]).
    fn as_observable(&self) -> Option<&ObservableExecutor> {
        None
    }
}
