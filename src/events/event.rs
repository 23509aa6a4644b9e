//! # Controller events.
//!
//! The [`EventKind`] enum classifies what the controller thread publishes:
//! - **Lifecycle**: controller started, stopping, stopped
//! - **Jobs**: queued, started, finished, panicked
//!
//! The [`Event`] struct carries the metadata: controller name, job id and an
//! optional reason.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases monotonically.
//! Use `seq` to restore the exact order when events are delivered out of order.
//!
//! ## Example
//! ```rust
//! use workbridge::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::JobPanicked)
//!     .with_controller("ui")
//!     .with_job(7)
//!     .with_reason("boom");
//!
//! assert_eq!(ev.kind, EventKind::JobPanicked);
//! assert_eq!(ev.controller.as_deref(), Some("ui"));
//! assert_eq!(ev.job, Some(7));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::SystemTime;

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of controller events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Lifecycle ===
    /// Controller thread entered its loop.
    ///
    /// Sets:
    /// - `controller`: thread name
    ControllerStarted,

    /// `stop()` was called; remaining queued jobs still run.
    ///
    /// Sets:
    /// - `controller`: thread name
    ControllerStopping,

    /// Controller thread drained its queue and left the loop.
    ///
    /// Sets:
    /// - `controller`: thread name
    ControllerStopped,

    // === Jobs ===
    /// Job accepted into the queue.
    ///
    /// Sets:
    /// - `controller`: thread name
    /// - `job`: job id (per controller, starting at 0)
    JobQueued,

    /// Job picked up by the controller thread.
    ///
    /// Sets:
    /// - `controller`, `job`
    JobStarted,

    /// Job returned normally.
    ///
    /// Sets:
    /// - `controller`, `job`
    JobFinished,

    /// Job panicked; the controller thread survived.
    ///
    /// Sets:
    /// - `controller`, `job`
    /// - `reason`: panic message
    JobPanicked,
}

/// Controller event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,
    /// Name of the controller thread.
    pub controller: Option<Arc<str>>,
    /// Job id, if applicable.
    pub job: Option<u64>,
    /// Human-readable reason (panic message).
    pub reason: Option<Arc<str>>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            controller: None,
            job: None,
            reason: None,
        }
    }

    /// Attaches the controller name.
    #[inline]
    pub fn with_controller(mut self, controller: impl Into<Arc<str>>) -> Self {
        self.controller = Some(controller.into());
        self
    }

    /// Attaches a job id.
    #[inline]
    pub fn with_job(mut self, job: u64) -> Self {
        self.job = Some(job);
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Returns `true` for events that describe a single queued job.
    #[inline]
    pub fn is_job_event(&self) -> bool {
        matches!(
            self.kind,
            EventKind::JobQueued
                | EventKind::JobStarted
                | EventKind::JobFinished
                | EventKind::JobPanicked
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seq_is_monotonic() {
        let a = Event::new(EventKind::JobQueued);
        let b = Event::new(EventKind::JobStarted);
        assert!(b.seq > a.seq);
        assert!(a.is_job_event());
        assert!(!Event::new(EventKind::ControllerStopped).is_job_event());
    }
}
