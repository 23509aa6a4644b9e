//! # Workload: the three shapes of work a service can run.
//!
//! | Variant              | Built with                | Output |
//! |----------------------|---------------------------|--------|
//! | [`Workload::Action`] | [`Workload::action`]      | `()`   |
//! | [`Workload::Call`]   | [`Workload::call`]        | `T`    |
//! | [`Workload::Task`]   | [`Workload::task`]        | `T`    |
//!
//! All three are consumed uniformly through [`Workload::run`], which also turns a
//! panic into [`TaskError::Panicked`].

use std::error::Error as StdError;
use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::error::TaskError;
use crate::tasks::task::TaskRef;

type ActionFn = Arc<dyn Fn() + Send + Sync + 'static>;
type CallFn<T> = Arc<dyn Fn() -> Result<T, TaskError> + Send + Sync + 'static>;

/// Proof that an [`Workload::Action`] produces `T = ()`.
///
/// Only [`Workload::action`] can build one.
pub struct UnitOutput<T>(fn() -> T);

impl<T> Clone for UnitOutput<T> {
    fn clone(&self) -> Self {
        Self(self.0)
    }
}

/// Re-runnable unit of work.
pub enum Workload<T> {
    /// Side effect without a result.
    Action(ActionFn, UnitOutput<T>),
    /// Value-producing computation.
    Call(CallFn<T>),
    /// Named, cancelable task object.
    Task(TaskRef<T>),
}

impl<T> Clone for Workload<T> {
    fn clone(&self) -> Self {
        match self {
            Workload::Action(f, unit) => Workload::Action(Arc::clone(f), unit.clone()),
            Workload::Call(f) => Workload::Call(Arc::clone(f)),
            Workload::Task(t) => Workload::Task(Arc::clone(t)),
        }
    }
}

impl<T: 'static> fmt::Debug for Workload<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Workload").field(&self.label()).finish()
    }
}

impl Workload<()> {
    /// Wraps a side effect.
    pub fn action<F>(f: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        Workload::Action(Arc::new(f), UnitOutput(|| ()))
    }
}

impl<T: 'static> Workload<T> {
    /// Wraps a computation; its error becomes the worker's failure cause.
    ///
    /// A returned [`TaskError`] is kept as is, so `Err(TaskError::Canceled)` ends
    /// the run cancelled rather than failed.
    ///
    /// ## Example
    /// ```
    /// use tokio_util::sync::CancellationToken;
    /// use workbridge::Workload;
    ///
    /// let parse = Workload::call(|| "17".parse::<u32>());
    /// assert_eq!(parse.run(&CancellationToken::new()).unwrap(), 17);
    /// ```
    pub fn call<F, E>(f: F) -> Self
    where
        F: Fn() -> Result<T, E> + Send + Sync + 'static,
        E: Into<Box<dyn StdError + Send + Sync + 'static>>,
    {
        Workload::Call(Arc::new(move || f().map_err(TaskError::from_error)))
    }

    /// Wraps a task object.
    pub fn task(task: TaskRef<T>) -> Self {
        Workload::Task(task)
    }

    /// Short name for logs: the task name, or the shape.
    pub fn label(&self) -> &str {
        match self {
            Workload::Action(..) => "action",
            Workload::Call(_) => "call",
            Workload::Task(t) => t.name(),
        }
    }

    /// Runs the workload once on the calling thread.
    ///
    /// Panics are caught and reported as [`TaskError::Panicked`]. `ctx` is only
    /// visible to [`Workload::Task`]; the other shapes run to completion.
    pub fn run(&self, ctx: &CancellationToken) -> Result<T, TaskError> {
        catch_unwind(AssertUnwindSafe(|| match self {
            Workload::Action(f, unit) => {
                f();
                Ok((unit.0)())
            }
            Workload::Call(f) => f(),
            Workload::Task(t) => t.run(ctx),
        }))
        .unwrap_or_else(|payload| Err(TaskError::from_panic(payload)))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::tasks::TaskFn;

    #[test]
    fn action_runs_side_effect() {
        let hits = Arc::new(AtomicUsize::new(0));
        let h = Arc::clone(&hits);
        let w = Workload::action(move || {
            h.fetch_add(1, Ordering::SeqCst);
        });
        let ctx = CancellationToken::new();
        w.run(&ctx).unwrap();
        w.clone().run(&ctx).unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 2);
        assert_eq!(w.label(), "action");
    }

    #[test]
    fn call_error_becomes_fail() {
        let w: Workload<u32> = Workload::call(|| "x".parse::<u32>());
        match w.run(&CancellationToken::new()) {
            Err(TaskError::Fail { cause }) => assert!(!cause.to_string().is_empty()),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn call_returning_task_error_keeps_it() {
        let w: Workload<u8> = Workload::call(|| Err::<u8, _>(TaskError::Canceled));
        assert!(matches!(
            w.run(&CancellationToken::new()),
            Err(TaskError::Canceled)
        ));
    }

    #[test]
    fn task_sees_cancellation() {
        let task: TaskRef<u8> = TaskFn::arc("poll", |ctx: &CancellationToken| {
            if ctx.is_cancelled() {
                Err(TaskError::Canceled)
            } else {
                Ok(1u8)
            }
        });
        let w = Workload::task(task);
        assert_eq!(w.label(), "poll");

        let ctx = CancellationToken::new();
        assert_eq!(w.run(&ctx).unwrap(), 1);
        ctx.cancel();
        assert!(matches!(w.run(&ctx), Err(TaskError::Canceled)));
    }

    #[test]
    fn panic_is_captured() {
        let w: Workload<u8> = Workload::call(|| -> Result<u8, TaskError> { panic!("kaboom") });
        match w.run(&CancellationToken::new()) {
            Err(TaskError::Panicked { message }) => assert_eq!(message, "kaboom"),
            other => panic!("unexpected: {other:?}"),
        }
    }
}
