//! # Function-backed task (`TaskFn`)
//!
//! [`TaskFn`] wraps a closure `F: Fn(&CancellationToken) -> Result<T, TaskError>`.
//! The closure is `Fn`, so a restarted service calls it again with no hidden state
//! carried between runs; share state explicitly through an `Arc` when needed.
//!
//! ## Example
//! ```rust
//! use tokio_util::sync::CancellationToken;
//! use workbridge::{Task, TaskError, TaskFn, TaskRef};
//!
//! let t: TaskRef<u32> = TaskFn::arc("answer", |ctx: &CancellationToken| {
//!     if ctx.is_cancelled() {
//!         return Err(TaskError::Canceled);
//!     }
//!     Ok(42)
//! });
//!
//! assert_eq!(t.name(), "answer");
//! assert_eq!(t.run(&CancellationToken::new()).unwrap(), 42);
//! ```

use std::borrow::Cow;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::error::TaskError;
use crate::tasks::task::Task;

/// Function-backed task implementation.
#[derive(Debug)]
pub struct TaskFn<F> {
    name: Cow<'static, str>,
    f: F,
}

impl<F> TaskFn<F> {
    /// Creates a new function-backed task.
    ///
    /// Prefer [`TaskFn::arc`] when you immediately need a [`TaskRef`](crate::TaskRef).
    pub fn new(name: impl Into<Cow<'static, str>>, f: F) -> Self {
        Self { name: name.into(), f }
    }

    /// Creates the task and returns it as a shared handle.
    pub fn arc(name: impl Into<Cow<'static, str>>, f: F) -> Arc<Self> {
        Arc::new(Self::new(name, f))
    }
}

impl<T, F> Task<T> for TaskFn<F>
where
    F: Fn(&CancellationToken) -> Result<T, TaskError> + Send + Sync + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn run(&self, ctx: &CancellationToken) -> Result<T, TaskError> {
        (self.f)(ctx)
    }
}
