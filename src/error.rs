//! Error types used by the bridge, the waiters and the workloads.
//!
//! This module defines three error enums:
//!
//! - [`BridgeError`]: returned by blocking calls (`wait_for`, `run_and_wait`, ...)
//!   and by executors that refuse a job.
//! - [`TaskError`]: returned by workloads; the runner maps it onto a worker outcome.
//! - [`TransitionError`]: an illegal worker state change was requested.
//!
//! Failure causes travel as [`Cause`], a shared `dyn Error`, so one failure can be
//! handed to every waiter and callback of the same worker.

use std::any::Any;
use std::error::Error as StdError;
use std::sync::Arc;

use thiserror::Error;

use crate::worker::WorkerState;

/// Shared failure cause attached to a failed worker.
pub type Cause = Arc<dyn StdError + Send + Sync + 'static>;

/// Converts any boxable error into a [`Cause`].
///
/// # Example
/// ```
/// use workbridge::cause;
///
/// let c = cause("disk full");
/// assert_eq!(c.to_string(), "disk full");
/// ```
pub fn cause(err: impl Into<Box<dyn StdError + Send + Sync + 'static>>) -> Cause {
    Arc::from(err.into())
}

/// # Errors surfaced by blocking calls and executors.
///
/// Every variant is scoped to a single wait or submission; none of them is fatal
/// to the process.
#[non_exhaustive]
#[derive(Error, Debug, Clone)]
pub enum BridgeError {
    /// The caller's wait was interrupted. The workload itself keeps running.
    #[error("wait interrupted")]
    InterruptedWait,

    /// The workload failed while executing.
    #[error("workload execution failed: {cause}")]
    WorkloadExecutionFailed {
        /// What the workload reported (or the panic it raised).
        #[source]
        cause: Cause,
    },

    /// The worker ended in the cancelled state.
    #[error("workload cancelled")]
    WorkloadCancelled,

    /// The controller thread was stopped and no longer accepts work.
    #[error("controller thread stopped")]
    ControllerStopped,

    /// An executor refused the job (for example, a thread could not be spawned).
    #[error("executor rejected job: {reason}")]
    ExecutorRejected {
        /// Why the job was refused.
        reason: String,
    },
}

impl BridgeError {
    /// Returns a short stable label (snake_case) for use in logs.
    ///
    /// # Example
    /// ```
    /// use workbridge::BridgeError;
    ///
    /// assert_eq!(BridgeError::InterruptedWait.as_label(), "interrupted_wait");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            BridgeError::InterruptedWait => "interrupted_wait",
            BridgeError::WorkloadExecutionFailed { .. } => "workload_execution_failed",
            BridgeError::WorkloadCancelled => "workload_cancelled",
            BridgeError::ControllerStopped => "controller_stopped",
            BridgeError::ExecutorRejected { .. } => "executor_rejected",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            BridgeError::InterruptedWait => "interrupted while waiting".to_string(),
            BridgeError::WorkloadExecutionFailed { cause } => format!("failed: {cause}"),
            BridgeError::WorkloadCancelled => "cancelled".to_string(),
            BridgeError::ControllerStopped => "controller stopped".to_string(),
            BridgeError::ExecutorRejected { reason } => format!("rejected: {reason}"),
        }
    }

    /// Returns the failure cause for [`BridgeError::WorkloadExecutionFailed`].
    pub fn failure_cause(&self) -> Option<&Cause> {
        match self {
            BridgeError::WorkloadExecutionFailed { cause } => Some(cause),
            _ => None,
        }
    }
}

/// # Errors produced by workload execution.
///
/// `Canceled` is a cooperative stop and ends the worker as cancelled; the other
/// variants end it as failed.
#[non_exhaustive]
#[derive(Error, Debug, Clone)]
pub enum TaskError {
    /// Workload reported an error.
    #[error("execution failed: {cause}")]
    Fail {
        /// The underlying error.
        cause: Cause,
    },

    /// Workload panicked; the panic was caught by the runner.
    #[error("panicked: {message}")]
    Panicked {
        /// Panic payload rendered as text.
        message: String,
    },

    /// Workload observed its cancellation token and stopped.
    #[error("context cancelled")]
    Canceled,
}

impl TaskError {
    /// Wraps any error as [`TaskError::Fail`].
    pub fn fail(err: impl Into<Box<dyn StdError + Send + Sync + 'static>>) -> Self {
        TaskError::Fail { cause: cause(err) }
    }

    /// Like [`TaskError::fail`], but an error that already is a `TaskError` is
    /// returned unchanged.
    ///
    /// # Example
    /// ```
    /// use workbridge::TaskError;
    ///
    /// assert_eq!(TaskError::from_error(TaskError::Canceled).as_label(), "task_canceled");
    /// assert_eq!(TaskError::from_error("boom").as_label(), "task_failed");
    /// ```
    pub fn from_error(err: impl Into<Box<dyn StdError + Send + Sync + 'static>>) -> Self {
        match err.into().downcast::<TaskError>() {
            Ok(task) => *task,
            Err(other) => TaskError::Fail {
                cause: Arc::from(other),
            },
        }
    }

    /// Builds [`TaskError::Panicked`] from a caught panic payload.
    pub(crate) fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let message = if let Some(msg) = payload.downcast_ref::<&'static str>() {
            (*msg).to_string()
        } else if let Some(msg) = payload.downcast_ref::<String>() {
            msg.clone()
        } else {
            "unknown panic".to_string()
        };
        TaskError::Panicked { message }
    }

    /// Returns a short stable label (snake_case) for use in logs.
    ///
    /// # Example
    /// ```
    /// use workbridge::TaskError;
    ///
    /// let err = TaskError::fail("boom");
    /// assert_eq!(err.as_label(), "task_failed");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            TaskError::Fail { .. } => "task_failed",
            TaskError::Panicked { .. } => "task_panicked",
            TaskError::Canceled => "task_canceled",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            TaskError::Fail { cause } => format!("error: {cause}"),
            TaskError::Panicked { message } => format!("panic: {message}"),
            TaskError::Canceled => "context cancelled".to_string(),
        }
    }

    /// Converts the error into the cause recorded on a failed worker.
    ///
    /// `Fail` unwraps to its inner cause so waiters see the workload's own error;
    /// a panic becomes its own cause. Returns `None` for `Canceled`.
    pub fn into_cause(self) -> Option<Cause> {
        match self {
            TaskError::Fail { cause } => Some(cause),
            TaskError::Canceled => None,
            panicked @ TaskError::Panicked { .. } => Some(Arc::new(panicked) as Cause),
        }
    }
}

/// An illegal worker state change.
///
/// Terminal states are absorbing and non-terminal states only move forward.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("illegal worker transition {from:?} -> {to:?}")]
pub struct TransitionError {
    /// State the worker was in.
    pub from: WorkerState,
    /// State that was requested.
    pub to: WorkerState,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn execution_failure_exposes_source() {
        let err = BridgeError::WorkloadExecutionFailed {
            cause: cause("boom"),
        };
        assert_eq!(err.as_label(), "workload_execution_failed");
        assert_eq!(err.to_string(), "workload execution failed: boom");
        assert_eq!(err.source().map(|s| s.to_string()).as_deref(), Some("boom"));
        assert!(err.failure_cause().is_some());
    }

    #[test]
    fn fail_unwraps_to_inner_cause() {
        let c = TaskError::fail("bad input").into_cause().expect("cause");
        assert_eq!(c.to_string(), "bad input");
    }

    #[test]
    fn panic_becomes_its_own_cause() {
        let c = TaskError::Panicked {
            message: "oops".into(),
        }
        .into_cause()
        .expect("cause");
        assert_eq!(c.to_string(), "panicked: oops");
    }

    #[test]
    fn panic_payload_is_rendered() {
        let err = TaskError::from_panic(Box::new("static str"));
        assert_eq!(err.as_message(), "panic: static str");
        let err = TaskError::from_panic(Box::new(format!("code {}", 7)));
        assert_eq!(err.as_message(), "panic: code 7");
        let err = TaskError::from_panic(Box::new(17u8));
        assert_eq!(err.as_message(), "panic: unknown panic");
    }

    #[test]
    fn canceled_has_no_cause() {
        assert!(TaskError::Canceled.into_cause().is_none());
        assert_eq!(TaskError::Canceled.as_label(), "task_canceled");
    }
}
