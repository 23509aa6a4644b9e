//! # Service: a named, restartable workload bound to an executor.
//!
//! Every [`Service::start`] creates a **fresh** [`Worker`], moves it to
//! `Scheduled` and hands one job to the executor. The service remembers the
//! latest worker as [`Service::current`].
//!
//! ## Rules
//! - No executor set: jobs go to a [`ThreadExecutor`] (one named thread per job)
//! - A rejected job is logged; its worker ends `Cancelled`
//! - Restarting never touches earlier workers

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::executors::{Executor, Job, ThreadExecutor};
use crate::tasks::runner::PendingRun;
use crate::tasks::workload::Workload;
use crate::worker::Worker;

/// Named workload plus an optional executor.
///
/// ## Example
/// ```
/// use workbridge::{Service, Workload, wait_for};
///
/// let svc = Service::new("answer", Workload::call(|| Ok::<_, std::io::Error>(42)));
/// let worker = svc.start();
/// assert_eq!(wait_for(&worker).unwrap(), 42);
/// ```
pub struct Service<T> {
    name: Arc<str>,
    workload: Workload<T>,
    executor: Mutex<Option<Arc<dyn Executor>>>,
    current: Mutex<Option<Worker<T>>>,
}

impl<T: Send + 'static> Service<T> {
    /// Creates a service without an executor.
    pub fn new(name: impl Into<Arc<str>>, workload: Workload<T>) -> Self {
        Self {
            name: name.into(),
            workload,
            executor: Mutex::new(None),
            current: Mutex::new(None),
        }
    }

    /// Returns the service name (also used for its workers).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the wrapped workload.
    pub fn workload(&self) -> &Workload<T> {
        &self.workload
    }

    /// Sets the executor used by later [`start`](Self::start) calls.
    pub fn set_executor(&self, executor: Arc<dyn Executor>) {
        *self.executor.lock() = Some(executor);
    }

    /// Returns the configured executor, if any.
    pub fn executor(&self) -> Option<Arc<dyn Executor>> {
        self.executor.lock().clone()
    }

    /// Returns the worker of the latest start.
    pub fn current(&self) -> Option<Worker<T>> {
        self.current.lock().clone()
    }

    /// Starts a new run and returns its worker. Never blocks on the workload.
    pub fn start(&self) -> Worker<T> {
        let (worker, job) = self.prepare();
        let executor: Arc<dyn Executor> = match self.executor() {
            Some(executor) => executor,
            None => Arc::new(ThreadExecutor::default()),
        };

        debug!(service = %self.name, workload = self.workload.label(), "starting service");
        if let Err(err) = executor.execute(job) {
            warn!(service = %self.name, error = err.as_label(), reason = %err, "executor rejected service run");
        }
        worker
    }

    /// Creates the next worker (already `Scheduled`) and the job that drives it.
    pub(crate) fn prepare(&self) -> (Worker<T>, Job) {
        let worker = Worker::scheduled(Arc::clone(&self.name));
        let workload = self.workload.clone();
        let run = PendingRun::new(worker.clone(), Box::new(move |ctx| workload.run(ctx)));
        *self.current.lock() = Some(worker.clone());
        (worker, run.into_job())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::error::BridgeError;
    use crate::observe::wait_for;
    use crate::worker::WorkerState;

    struct Refusing;

    impl Executor for Refusing {
        fn execute(&self, _job: Job) -> Result<(), BridgeError> {
            Err(BridgeError::ExecutorRejected {
                reason: "closed".into(),
            })
        }
    }

    #[test]
    fn default_executor_runs_on_named_thread() {
        let svc = Service::new(
            "where",
            Workload::call(|| {
                Ok::<_, std::io::Error>(std::thread::current().name().map(str::to_owned))
            }),
        );
        let name = wait_for(&svc.start()).unwrap().unwrap_or_default();
        assert!(name.starts_with("workbridge-"), "thread name was {name}");
    }

    #[test]
    fn every_start_creates_a_fresh_worker() {
        let runs = Arc::new(AtomicUsize::new(0));
        let r = Arc::clone(&runs);
        let svc = Service::new(
            "count",
            Workload::call(move || Ok::<_, std::io::Error>(r.fetch_add(1, Ordering::SeqCst))),
        );

        let first = svc.start();
        assert_eq!(wait_for(&first).unwrap(), 0);
        let second = svc.start();
        assert_eq!(wait_for(&second).unwrap(), 1);

        assert_eq!(first.value(), Some(0));
        assert_eq!(svc.current().and_then(|w| w.value()), Some(1));
    }

    #[test]
    fn rejected_run_cancels_worker() {
        let svc = Service::new("refused", Workload::action(|| {}));
        svc.set_executor(Arc::new(Refusing));
        let worker = svc.start();
        assert_eq!(worker.state(), WorkerState::Cancelled);
        assert!(matches!(
            wait_for(&worker),
            Err(BridgeError::WorkloadCancelled)
        ));
    }
}
