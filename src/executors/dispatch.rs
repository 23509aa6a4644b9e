//! Executor-aware service dispatch.

use std::sync::Arc;

use crate::executors::Executor;
use crate::tasks::Service;
use crate::worker::Worker;

/// Runs `service` on `executor` and returns the worker tracking the run.
///
/// - An [`ObservableExecutor`](crate::ObservableExecutor) takes the service through
///   its own [`submit`](crate::ObservableExecutor::submit), keeping its ordering and
///   backpressure.
/// - Any other executor is attached to the service, which is then started.
/// - `None` starts the service with whatever executor it already has.
///
/// Never blocks on the workload.
pub fn dispatch<T: Send + 'static>(
    executor: Option<&Arc<dyn Executor>>,
    service: &Service<T>,
) -> Worker<T> {
    if let Some(observable) = executor.and_then(|e| e.as_observable()) {
        return observable.submit(service);
    }
    if let Some(executor) = executor {
        service.set_executor(Arc::clone(executor));
    }
    service.start()
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::error::BridgeError;
    use crate::executors::{Job, ObservableConfig, ObservableExecutor};
    use crate::observe::wait_for;
    use crate::tasks::Workload;

    #[derive(Default)]
    struct Counting(AtomicUsize);

    impl Executor for Counting {
        fn execute(&self, job: Job) -> Result<(), BridgeError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            job();
            Ok(())
        }
    }

    fn answer() -> Service<u32> {
        Service::new("answer", Workload::call(|| Ok::<_, std::io::Error>(42)))
    }

    #[test]
    fn plain_executor_is_attached_then_started() {
        let counting = Arc::new(Counting::default());
        let exec: Arc<dyn Executor> = counting.clone();
        let svc = answer();

        let worker = dispatch(Some(&exec), &svc);
        assert_eq!(worker.value(), Some(42));
        assert_eq!(counting.0.load(Ordering::SeqCst), 1);
        assert!(svc.executor().is_some());
    }

    #[test]
    fn observable_executor_submits_without_attaching() {
        let exec: Arc<dyn Executor> =
            Arc::new(ObservableExecutor::with_threads(ObservableConfig::default()));
        let svc = answer();

        let worker = dispatch(Some(&exec), &svc);
        assert_eq!(wait_for(&worker).unwrap(), 42);
        assert!(svc.executor().is_none());
        assert!(svc.current().is_some());
    }

    #[test]
    fn no_executor_falls_back_to_service_default() {
        let svc = answer();
        let worker = dispatch(None, &svc);
        assert_eq!(wait_for(&worker).unwrap(), 42);
    }
}
