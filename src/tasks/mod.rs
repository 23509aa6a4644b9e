//! # Tasks, workloads and services.
//!
//! - [`Task`] trait for blocking, cancelable, value-producing tasks
//! - [`TaskFn`] closure-backed task implementation
//! - [`TaskRef`] shared reference to a task (`Arc<dyn Task<T>>`)
//! - [`Workload`] the three workload shapes (action, call, task)
//! - [`Service`] named, restartable workload bound to an executor

pub(crate) mod runner;
mod service;
mod task;
mod task_fn;
mod workload;

pub use service::Service;
pub use task::{Task, TaskRef};
pub use task_fn::TaskFn;
pub use workload::{UnitOutput, Workload};
