//! # Task abstraction.
//!
//! This module defines the [`Task`] trait (blocking, cancelable, value-producing).
//! The common handle type is [`TaskRef`], an `Arc<dyn Task<T>>` suitable for sharing
//! between services and executors.
//!
//! A task receives the worker's [`CancellationToken`] and should check it between
//! steps to stop cooperatively when the worker is cancelled.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::error::TaskError;

/// Shared handle to a task object.
pub type TaskRef<T> = Arc<dyn Task<T>>;

/// # Blocking, cancelable unit of work producing a `T`.
///
/// A `Task` has a stable [`name`](Task::name) and a [`run`](Task::run) method that is
/// called on an executor thread. Returning [`TaskError::Canceled`] ends the worker as
/// cancelled; any other error ends it as failed.
///
/// # Example
/// ```
/// use tokio_util::sync::CancellationToken;
/// use workbridge::{Task, TaskError};
///
/// struct Count;
///
/// impl Task<usize> for Count {
///     fn name(&self) -> &str { "count" }
///
///     fn run(&self, ctx: &CancellationToken) -> Result<usize, TaskError> {
///         let mut n = 0;
///         for _ in 0..10 {
///             if ctx.is_cancelled() {
///                 return Err(TaskError::Canceled);
///             }
///             n += 1;
///         }
///         Ok(n)
///     }
/// }
///
/// assert_eq!(Count.run(&CancellationToken::new()).unwrap(), 10);
/// ```
pub trait Task<T>: Send + Sync + 'static {
    /// Returns a stable, human-readable task name.
    fn name(&self) -> &str;

    /// Executes the task on the calling thread until completion or cancellation.
    fn run(&self, ctx: &CancellationToken) -> Result<T, TaskError>;
}
