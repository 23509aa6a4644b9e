//! # One-shot job that drives a worker through a single run.
//!
//! ```text
//! PendingRun::run()
//!   ├─► worker.start()        (fails if the worker was cancelled meanwhile: body skipped)
//!   ├─► body(cancel_token)    (panics captured)
//!   └─► Ok(v)                 → succeed(v)
//!       Err(Canceled)         → cancel()
//!       Err(Fail | Panicked)  → fail(cause)
//! ```
//!
//! A `PendingRun` dropped before it ran (executor refused it, controller went
//! away) cancels its worker, so nobody waits on it forever.

use std::panic::{AssertUnwindSafe, catch_unwind};

use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::TaskError;
use crate::executors::Job;
use crate::worker::Worker;

/// Body executed by a [`PendingRun`].
pub(crate) type Body<T> =
    Box<dyn FnOnce(&CancellationToken) -> Result<T, TaskError> + Send + 'static>;

pub(crate) struct PendingRun<T: Send + 'static> {
    worker: Worker<T>,
    body: Option<Body<T>>,
}

impl<T: Send + 'static> PendingRun<T> {
    pub(crate) fn new(worker: Worker<T>, body: Body<T>) -> Self {
        Self {
            worker,
            body: Some(body),
        }
    }

    pub(crate) fn into_job(self) -> Job {
        Box::new(move || self.run())
    }

    pub(crate) fn run(mut self) {
        let Some(body) = self.body.take() else {
            return;
        };
        if let Err(err) = self.worker.start() {
            debug!(worker = self.worker.name(), from = err.from.as_label(), "skipping run");
            return;
        }

        let ctx = self.worker.cancel_token();
        let result = catch_unwind(AssertUnwindSafe(|| body(&ctx)))
            .unwrap_or_else(|payload| Err(TaskError::from_panic(payload)));

        let recorded = match result {
            Ok(value) => self.worker.succeed(value).is_ok(),
            Err(err) => {
                debug!(worker = self.worker.name(), error = err.as_label(), "run ended with error");
                match err.into_cause() {
                    Some(cause) => self.worker.fail(cause).is_ok(),
                    None => self.worker.cancel(),
                }
            }
        };
        if !recorded {
            debug!(worker = self.worker.name(), state = self.worker.state().as_label(), "outcome discarded");
        }
    }
}

impl<T: Send + 'static> Drop for PendingRun<T> {
    fn drop(&mut self) {
        if self.body.is_some() && self.worker.cancel() {
            debug!(worker = self.worker.name(), "job dropped before running; worker cancelled");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::worker::{Outcome, WorkerState};

    fn pending<T: Send + 'static>(
        body: impl FnOnce(&CancellationToken) -> Result<T, TaskError> + Send + 'static,
    ) -> (Worker<T>, PendingRun<T>) {
        let worker = Worker::scheduled("job");
        let run = PendingRun::new(worker.clone(), Box::new(body));
        (worker, run)
    }

    #[test]
    fn success_is_recorded() {
        let (worker, run) = pending(|_| Ok(5));
        run.into_job()();
        assert_eq!(worker.value(), Some(5));
    }

    #[test]
    fn canceled_error_cancels_worker() {
        let (worker, run) = pending::<u8>(|_| Err(TaskError::Canceled));
        run.run();
        assert_eq!(worker.state(), WorkerState::Cancelled);
    }

    #[test]
    fn panic_fails_worker() {
        let (worker, run) = pending::<u8>(|_| panic!("bad"));
        run.run();
        match worker.outcome() {
            Some(Outcome::Failed(cause)) => assert_eq!(cause.to_string(), "panicked: bad"),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn dropped_job_cancels_worker() {
        let (worker, run) = pending(|_| Ok(()));
        drop(run.into_job());
        assert_eq!(worker.state(), WorkerState::Cancelled);
    }

    #[test]
    fn cancelled_worker_skips_body() {
        let (worker, run) = pending::<u8>(|_| panic!("must not run"));
        worker.cancel();
        run.run();
        assert_eq!(worker.state(), WorkerState::Cancelled);
    }

    #[test]
    fn body_sees_worker_token() {
        let (worker, run) = pending(|ctx: &CancellationToken| Ok(ctx.is_cancelled()));
        run.run();
        assert_eq!(worker.value(), Some(false));
    }
}
