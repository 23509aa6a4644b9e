//! # Blocking bridge onto the controller thread.
//!
//! [`ControllerBridge`] lets any thread run a closure on the controller thread and
//! block until it has run.
//!
//! ## Flow
//! ```text
//! caller thread                          controller thread
//! ─────────────                          ─────────────────
//! run_callable_and_wait(f)
//!   ├─ on controller thread? ─► run f inline, return
//!   ├─ worker = Scheduled
//!   ├─ dispatcher.execute(job) ────────► job: start ─► f() ─► succeed | fail
//!   └─ wait_terminal(worker) ◄────────── terminal signal
//!      └─ take outcome ─► Ok(v) | WorkloadExecutionFailed | WorkloadCancelled
//! ```
//!
//! ## Rules
//! - Jobs reach the controller in call order and run FIFO
//! - An `Err` or a panic from `f` becomes [`BridgeError::WorkloadExecutionFailed`];
//!   `Err(TaskError::Canceled)` becomes [`BridgeError::WorkloadCancelled`]
//! - Interrupting the wait returns [`BridgeError::InterruptedWait`]; `f` still runs
//! - Values are moved out of the worker, so `T` needs no `Clone`

use std::convert::Infallible;
use std::error::Error as StdError;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::controller::Dispatcher;
use crate::error::{BridgeError, TaskError};
use crate::observe::wait_terminal;
use crate::tasks::runner::PendingRun;
use crate::worker::Worker;

const JOB_NAME: &str = "controller-call";

/// Submits work to a [`Dispatcher`] and waits for it.
///
/// ## Example
/// ```
/// use std::sync::Arc;
/// use workbridge::{ControllerBridge, ControllerConfig, ControllerThread};
///
/// let controller = Arc::new(ControllerThread::start(ControllerConfig::default()).unwrap());
/// let bridge = ControllerBridge::new(controller.clone());
///
/// let sum = bridge.run_callable_and_wait(|| Ok::<_, std::io::Error>(7 + 5)).unwrap();
/// assert_eq!(sum, 12);
/// ```
#[derive(Clone)]
pub struct ControllerBridge {
    dispatcher: Arc<dyn Dispatcher>,
}

impl ControllerBridge {
    /// Creates a bridge onto `dispatcher`.
    pub fn new(dispatcher: Arc<dyn Dispatcher>) -> Self {
        Self { dispatcher }
    }

    /// Returns the dispatcher behind this bridge.
    pub fn dispatcher(&self) -> &Arc<dyn Dispatcher> {
        &self.dispatcher
    }

    /// Queues `computation` on the controller and returns its worker without waiting.
    ///
    /// # Errors
    /// [`BridgeError::ControllerStopped`] (or whatever the dispatcher reports) if the
    /// job was refused; the computation then never runs.
    pub fn run_later<T, E, F>(&self, computation: F) -> Result<Worker<T>, BridgeError>
    where
        T: Send + 'static,
        E: Into<Box<dyn StdError + Send + Sync + 'static>>,
        F: FnOnce() -> Result<T, E> + Send + 'static,
    {
        let (worker, run) = pending(computation);
        self.dispatcher.execute(run.into_job())?;
        Ok(worker)
    }

    /// Runs `action` on the controller thread and blocks until it has run.
    pub fn run_and_wait<F>(&self, action: F) -> Result<(), BridgeError>
    where
        F: FnOnce() + Send + 'static,
    {
        self.run_and_wait_interruptibly(action, &CancellationToken::new())
    }

    /// Like [`run_and_wait`](Self::run_and_wait), but gives up waiting once
    /// `interrupt` is cancelled.
    pub fn run_and_wait_interruptibly<F>(
        &self,
        action: F,
        interrupt: &CancellationToken,
    ) -> Result<(), BridgeError>
    where
        F: FnOnce() + Send + 'static,
    {
        self.run_callable_and_wait_interruptibly(
            move || {
                action();
                Ok::<(), Infallible>(())
            },
            interrupt,
        )
    }

    /// Runs `computation` on the controller thread and returns its value.
    ///
    /// # Errors
    /// - [`BridgeError::WorkloadExecutionFailed`] if it returned `Err` or panicked
    /// - [`BridgeError::WorkloadCancelled`] if the job was dropped unrun
    /// - [`BridgeError::ControllerStopped`] if the controller refused the job
    pub fn run_callable_and_wait<T, E, F>(&self, computation: F) -> Result<T, BridgeError>
    where
        T: Send + 'static,
        E: Into<Box<dyn StdError + Send + Sync + 'static>>,
        F: FnOnce() -> Result<T, E> + Send + 'static,
    {
        self.run_callable_and_wait_interruptibly(computation, &CancellationToken::new())
    }

    /// Like [`run_callable_and_wait`](Self::run_callable_and_wait), but returns
    /// [`BridgeError::InterruptedWait`] once `interrupt` is cancelled. The computation
    /// stays queued and still runs.
    pub fn run_callable_and_wait_interruptibly<T, E, F>(
        &self,
        computation: F,
        interrupt: &CancellationToken,
    ) -> Result<T, BridgeError>
    where
        T: Send + 'static,
        E: Into<Box<dyn StdError + Send + Sync + 'static>>,
        F: FnOnce() -> Result<T, E> + Send + 'static,
    {
        let worker = if self.dispatcher.is_dispatch_thread() {
            // Queueing behind ourselves would never return.
            let (worker, run) = pending(computation);
            run.run();
            worker
        } else {
            self.run_later(computation)?
        };

        wait_terminal(&worker, interrupt)?;
        worker
            .take_outcome()
            .ok_or(BridgeError::WorkloadCancelled)?
            .into_result()
    }
}

fn pending<T, E, F>(computation: F) -> (Worker<T>, PendingRun<T>)
where
    T: Send + 'static,
    E: Into<Box<dyn StdError + Send + Sync + 'static>>,
    F: FnOnce() -> Result<T, E> + Send + 'static,
{
    let worker = Worker::scheduled(JOB_NAME);
    let run = PendingRun::new(
        worker.clone(),
        Box::new(move |_ctx: &CancellationToken| computation().map_err(TaskError::from_error)),
    );
    (worker, run)
}
