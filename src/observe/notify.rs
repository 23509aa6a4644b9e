//! # Completion callbacks.
//!
//! [`on_complete`] runs a callback exactly once when a worker becomes terminal and
//! hands it the worker's [`Outcome`]. A worker that is already terminal at
//! registration time still gets its callback, immediately, on the registering
//! thread.

use crate::observe::signal::SignalSubscription;
use crate::worker::{Outcome, Worker};

/// Invokes `callback(outcome)` once, on the worker's transition into a terminal state.
///
/// - Already terminal: the callback runs immediately on the calling thread.
/// - Otherwise: it runs on the thread that drives the terminal transition.
/// - Callbacks registered on the same worker are independent; each fires once.
///
/// The returned subscription can remove a callback that has not fired yet.
///
/// Each callback receives its own copy of the outcome, hence `T: Clone`.
///
/// ## Example
/// ```
/// use std::sync::mpsc;
/// use workbridge::{Outcome, Worker, on_complete};
///
/// let worker = Worker::new("sum");
/// let (tx, rx) = mpsc::channel();
/// on_complete(&worker, move |outcome: Outcome<i32>| tx.send(outcome.success()).unwrap());
///
/// worker.start().unwrap();
/// worker.succeed(12).unwrap();
/// assert_eq!(rx.recv().unwrap(), Some(12));
/// ```
pub fn on_complete<T, F>(worker: &Worker<T>, callback: F) -> SignalSubscription
where
    T: Clone + Send + 'static,
    F: FnOnce(Outcome<T>) + Send + 'static,
{
    let signal = worker.observe_terminal();
    let source = worker.downgrade();
    signal.on_terminal(move || {
        if let Some(outcome) = source.upgrade().and_then(|w| w.outcome()) {
            callback(outcome);
        }
    })
}

/// Invokes `consumer(value)` once if the worker succeeds.
///
/// Cancelled and failed workers never reach the consumer; use [`on_complete`] to
/// see every outcome.
pub fn then<T, F>(worker: &Worker<T>, consumer: F) -> SignalSubscription
where
    T: Clone + Send + 'static,
    F: FnOnce(T) + Send + 'static,
{
    on_complete(worker, move |outcome| {
        if let Outcome::Success(value) = outcome {
            consumer(value);
        }
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::mpsc;

    use parking_lot::Mutex;

    use super::*;
    use crate::error::cause;
    use crate::worker::WorkerState;

    fn collect<T: Clone + Send + 'static>(
        worker: &Worker<T>,
    ) -> Arc<Mutex<Vec<Outcome<T>>>> {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        on_complete(worker, move |o| sink.lock().push(o));
        seen
    }

    #[test]
    fn fires_once_with_success_value() {
        let worker = Worker::new("w");
        let first = collect(&worker);
        let second = collect(&worker);

        worker.start().unwrap();
        assert!(first.lock().is_empty());
        worker.succeed(42).unwrap();

        for seen in [first, second] {
            let seen = seen.lock();
            assert_eq!(seen.len(), 1);
            assert!(matches!(seen[0], Outcome::Success(42)));
        }
    }

    #[test]
    fn already_terminal_worker_still_notifies() {
        let worker = Worker::succeeded("w", "ready");
        let seen = collect(&worker);
        let seen = seen.lock();
        assert_eq!(seen.len(), 1);
        assert!(matches!(seen[0], Outcome::Success("ready")));
    }

    #[test]
    fn cancellation_and_failure_are_distinguishable() {
        let cancelled: Worker<u8> = Worker::new("c");
        let c_seen = collect(&cancelled);
        cancelled.cancel();
        assert_eq!(c_seen.lock()[0].state(), WorkerState::Cancelled);

        let failed: Worker<u8> = Worker::new("f");
        let f_seen = collect(&failed);
        failed.fail(cause("broken")).unwrap();
        match &f_seen.lock()[0] {
            Outcome::Failed(c) => assert_eq!(c.to_string(), "broken"),
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn then_only_sees_success() {
        let (tx, rx) = mpsc::channel();
        let failed: Worker<u8> = Worker::new("f");
        let tx2 = tx.clone();
        then(&failed, move |v| tx2.send(v).unwrap());
        failed.fail(cause("no")).unwrap();

        let ok = Worker::new("ok");
        then(&ok, move |v| tx.send(v).unwrap());
        ok.succeed(9u8).unwrap();

        assert_eq!(rx.recv().unwrap(), 9);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn callback_registered_from_other_thread_fires_on_driver_thread() {
        let worker = Worker::new("w");
        let (tx, rx) = mpsc::channel();
        let observer = worker.clone();
        std::thread::spawn(move || {
            on_complete(&observer, move |o: Outcome<u32>| {
                tx.send((o.success(), std::thread::current().name().map(str::to_owned)))
                    .unwrap();
            });
        })
        .join()
        .unwrap();

        std::thread::Builder::new()
            .name("driver".into())
            .spawn(move || worker.succeed(5).unwrap())
            .unwrap()
            .join()
            .unwrap();

        let (value, thread) = rx.recv().unwrap();
        assert_eq!(value, Some(5));
        assert_eq!(thread.as_deref(), Some("driver"));
    }
}
