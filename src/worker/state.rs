//! # Worker states and terminal outcomes.
//!
//! ```text
//! Ready ──► Scheduled ──► Running ──┬──► Succeeded
//!   │           │            │      ├──► Cancelled
//!   └───────────┴────────────┴──────┴──► Failed
//! ```
//!
//! ## Rules
//! - Non-terminal states only move **forward** (`Ready` → `Scheduled` → `Running`)
//! - Any non-terminal state may move into any terminal state
//! - Terminal states are **absorbing**

use crate::error::{BridgeError, Cause};

/// Lifecycle state of a [`Worker`](crate::Worker).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WorkerState {
    /// Created, not yet handed to an executor.
    Ready,
    /// Handed to an executor, waiting for a thread.
    Scheduled,
    /// Workload is executing.
    Running,
    /// Workload produced a value.
    Succeeded,
    /// Worker was cancelled before or while running.
    Cancelled,
    /// Workload failed.
    Failed,
}

impl WorkerState {
    /// Returns `true` for `Succeeded`, `Cancelled` and `Failed`.
    #[inline]
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            WorkerState::Succeeded | WorkerState::Cancelled | WorkerState::Failed
        )
    }

    /// Returns `true` if a worker in `self` may move to `next`.
    pub fn can_move_to(self, next: WorkerState) -> bool {
        if self.is_terminal() {
            return false;
        }
        next.is_terminal() || next.rank() > self.rank()
    }

    /// Short stable label for logs.
    pub fn as_label(self) -> &'static str {
        match self {
            WorkerState::Ready => "ready",
            WorkerState::Scheduled => "scheduled",
            WorkerState::Running => "running",
            WorkerState::Succeeded => "succeeded",
            WorkerState::Cancelled => "cancelled",
            WorkerState::Failed => "failed",
        }
    }

    fn rank(self) -> u8 {
        match self {
            WorkerState::Ready => 0,
            WorkerState::Scheduled => 1,
            WorkerState::Running => 2,
            WorkerState::Succeeded | WorkerState::Cancelled | WorkerState::Failed => 3,
        }
    }
}

/// Terminal result of a worker.
///
/// Delivered to completion callbacks so success, cancellation and failure stay
/// distinguishable.
#[derive(Debug, Clone)]
pub enum Outcome<T> {
    /// Worker succeeded with a value.
    Success(T),
    /// Worker was cancelled.
    Cancelled,
    /// Worker failed with a cause.
    Failed(Cause),
}

impl<T> Outcome<T> {
    /// Terminal state matching this outcome.
    pub fn state(&self) -> WorkerState {
        match self {
            Outcome::Success(_) => WorkerState::Succeeded,
            Outcome::Cancelled => WorkerState::Cancelled,
            Outcome::Failed(_) => WorkerState::Failed,
        }
    }

    /// Returns the value of a successful outcome.
    pub fn success(self) -> Option<T> {
        match self {
            Outcome::Success(v) => Some(v),
            _ => None,
        }
    }

    /// Maps the outcome onto the result a blocking caller receives.
    pub fn into_result(self) -> Result<T, BridgeError> {
        match self {
            Outcome::Success(v) => Ok(v),
            Outcome::Cancelled => Err(BridgeError::WorkloadCancelled),
            Outcome::Failed(cause) => Err(BridgeError::WorkloadExecutionFailed { cause }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::cause;

    #[test]
    fn terminal_states_are_absorbing() {
        for from in [
            WorkerState::Succeeded,
            WorkerState::Cancelled,
            WorkerState::Failed,
        ] {
            assert!(from.is_terminal());
            assert!(!from.can_move_to(WorkerState::Ready));
            assert!(!from.can_move_to(WorkerState::Running));
            assert!(!from.can_move_to(WorkerState::Cancelled));
        }
    }

    #[test]
    fn non_terminal_states_move_forward_only() {
        assert!(WorkerState::Ready.can_move_to(WorkerState::Scheduled));
        assert!(WorkerState::Ready.can_move_to(WorkerState::Running));
        assert!(WorkerState::Scheduled.can_move_to(WorkerState::Running));
        assert!(!WorkerState::Running.can_move_to(WorkerState::Scheduled));
        assert!(!WorkerState::Running.can_move_to(WorkerState::Running));
        assert!(WorkerState::Ready.can_move_to(WorkerState::Failed));
    }

    #[test]
    fn outcome_maps_to_blocking_result() {
        assert_eq!(Outcome::Success(3).into_result().ok(), Some(3));
        assert!(matches!(
            Outcome::<i32>::Cancelled.into_result(),
            Err(BridgeError::WorkloadCancelled)
        ));
        match Outcome::<i32>::Failed(cause("io")).into_result() {
            Err(BridgeError::WorkloadExecutionFailed { cause }) => {
                assert_eq!(cause.to_string(), "io")
            }
            other => panic!("unexpected: {other:?}"),
        }
    }
}
