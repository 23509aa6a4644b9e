//! # Worker handle with ordered state delivery.
//!
//! A [`Worker`] is a cheap, cloneable handle to shared state. Whoever executes the
//! workload drives transitions (`schedule`, `start`, `succeed`, `fail`, `cancel`);
//! everybody else observes.
//!
//! ## Delivery model
//! ```text
//! transition(to)
//!   ├─► lock delivery (reentrant, per worker)
//!   ├─► lock state ─► validate ─► store state + outcome ─► snapshot listeners ─► unlock state
//!   ├─► listener_1(to), listener_2(to), ...   (on the transitioning thread)
//!   └─► unlock delivery
//! ```
//!
//! ## Rules
//! - Transitions of one worker are **totally ordered**; every listener sees every transition
//! - `subscribe` captures the current state and registers the listener under the same
//!   lock, so no transition falls between "read" and "listen"
//! - The terminal state and its [`Outcome`] are stored **together**
//! - A panicking listener is logged and skipped; remaining listeners still run

use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, Weak};

use parking_lot::{Mutex, ReentrantMutex};
use tokio_util::sync::CancellationToken;
use tracing::{error, trace};

use crate::error::{Cause, TransitionError};
use crate::observe::{SignalShared, TerminalSignal, observe_terminal};
use crate::worker::state::{Outcome, WorkerState};

type StateListener = Arc<dyn Fn(WorkerState) + Send + Sync + 'static>;

struct Inner<T> {
    state: WorkerState,
    outcome: Option<Outcome<T>>,
    listeners: Vec<(u64, StateListener)>,
    next_id: u64,
}

struct Shared<T> {
    name: Arc<str>,
    inner: Mutex<Inner<T>>,
    delivery: ReentrantMutex<()>,
    token: CancellationToken,
    signal: Mutex<Weak<SignalShared>>,
}

/// Type-erased listener removal, so subscriptions don't carry the worker's `T`.
trait ListenerSource: Send + Sync {
    fn remove_listener(&self, id: u64) -> bool;
}

impl<T: Send + 'static> ListenerSource for Shared<T> {
    fn remove_listener(&self, id: u64) -> bool {
        let mut inner = self.inner.lock();
        let before = inner.listeners.len();
        inner.listeners.retain(|(lid, _)| *lid != id);
        inner.listeners.len() != before
    }
}

/// Handle to a registered state listener.
///
/// Dropping the handle keeps the listener registered; call
/// [`cancel`](StateSubscription::cancel) to remove it. The handle holds the worker
/// weakly.
pub struct StateSubscription {
    source: Weak<dyn ListenerSource>,
    id: u64,
}

impl StateSubscription {
    /// Removes the listener. Returns `false` if it was already gone.
    pub fn cancel(self) -> bool {
        match self.source.upgrade() {
            Some(source) => source.remove_listener(self.id),
            None => false,
        }
    }
}

impl fmt::Debug for StateSubscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateSubscription")
            .field("id", &self.id)
            .finish()
    }
}

/// Shared handle to an observable unit of work.
///
/// ## Example
/// ```
/// use workbridge::{Worker, WorkerState};
///
/// let worker = Worker::new("load");
/// worker.schedule().unwrap();
/// worker.start().unwrap();
/// worker.succeed(42).unwrap();
///
/// assert_eq!(worker.state(), WorkerState::Succeeded);
/// assert_eq!(worker.value(), Some(42));
/// ```
pub struct Worker<T> {
    shared: Arc<Shared<T>>,
}

impl<T> Clone for Worker<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T> fmt::Debug for Worker<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Worker")
            .field("name", &self.shared.name)
            .field("state", &self.shared.inner.lock().state)
            .finish()
    }
}

impl<T: Send + 'static> Worker<T> {
    /// Creates a worker in [`WorkerState::Ready`].
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        Self::with_initial(name.into(), WorkerState::Ready, None)
    }

    /// Creates a worker already handed to an executor.
    pub(crate) fn scheduled(name: impl Into<Arc<str>>) -> Self {
        Self::with_initial(name.into(), WorkerState::Scheduled, None)
    }

    /// Creates a worker that already succeeded with `value`.
    pub fn succeeded(name: impl Into<Arc<str>>, value: T) -> Self {
        Self::with_initial(
            name.into(),
            WorkerState::Succeeded,
            Some(Outcome::Success(value)),
        )
    }

    /// Creates a worker that is already cancelled.
    pub fn cancelled(name: impl Into<Arc<str>>) -> Self {
        let worker = Self::with_initial(
            name.into(),
            WorkerState::Cancelled,
            Some(Outcome::Cancelled),
        );
        worker.shared.token.cancel();
        worker
    }

    /// Creates a worker that already failed with `cause`.
    pub fn failed(name: impl Into<Arc<str>>, cause: Cause) -> Self {
        Self::with_initial(
            name.into(),
            WorkerState::Failed,
            Some(Outcome::Failed(cause)),
        )
    }

    fn with_initial(name: Arc<str>, state: WorkerState, outcome: Option<Outcome<T>>) -> Self {
        Self {
            shared: Arc::new(Shared {
                name,
                inner: Mutex::new(Inner {
                    state,
                    outcome,
                    listeners: Vec::new(),
                    next_id: 0,
                }),
                delivery: ReentrantMutex::new(()),
                token: CancellationToken::new(),
                signal: Mutex::new(Weak::new()),
            }),
        }
    }

    /// Returns the worker name.
    pub fn name(&self) -> &str {
        &self.shared.name
    }

    /// Returns the current state.
    pub fn state(&self) -> WorkerState {
        self.shared.inner.lock().state
    }

    /// Returns `true` once the worker reached a terminal state.
    pub fn is_terminal(&self) -> bool {
        self.state().is_terminal()
    }

    /// Returns the failure cause if the worker failed.
    pub fn failure(&self) -> Option<Cause> {
        match &self.shared.inner.lock().outcome {
            Some(Outcome::Failed(cause)) => Some(Arc::clone(cause)),
            _ => None,
        }
    }

    /// Token cancelled together with the worker; handed to running tasks.
    pub fn cancel_token(&self) -> CancellationToken {
        self.shared.token.clone()
    }

    /// Number of registered state listeners.
    pub fn listener_count(&self) -> usize {
        self.shared.inner.lock().listeners.len()
    }

    /// Registers a state listener and returns the state it starts from.
    ///
    /// The returned state and the registration are captured atomically: every
    /// transition after that state is delivered to `listener`, in order, on the
    /// thread that drives it. Listeners must not drive transitions of this worker.
    pub fn subscribe<F>(&self, listener: F) -> (WorkerState, StateSubscription)
    where
        F: Fn(WorkerState) + Send + Sync + 'static,
    {
        let mut inner = self.shared.inner.lock();
        let id = inner.next_id;
        inner.next_id += 1;
        inner.listeners.push((id, Arc::new(listener)));
        let state = inner.state;
        drop(inner);

        let source: Arc<dyn ListenerSource> = self.shared.clone();
        let subscription = StateSubscription {
            source: Arc::downgrade(&source),
            id,
        };
        (state, subscription)
    }

    /// Returns the worker's terminal signal (see [`observe_terminal`]).
    pub fn observe_terminal(&self) -> TerminalSignal {
        observe_terminal(self)
    }

    /// `Ready` → `Scheduled`.
    pub fn schedule(&self) -> Result<(), TransitionError> {
        self.transition(WorkerState::Scheduled, None)
    }

    /// `Ready | Scheduled` → `Running`.
    pub fn start(&self) -> Result<(), TransitionError> {
        self.transition(WorkerState::Running, None)
    }

    /// Any non-terminal state → `Succeeded`, storing `value`.
    pub fn succeed(&self, value: T) -> Result<(), TransitionError> {
        self.transition(WorkerState::Succeeded, Some(Outcome::Success(value)))
    }

    /// Any non-terminal state → `Failed`, storing `cause`.
    pub fn fail(&self, cause: Cause) -> Result<(), TransitionError> {
        self.transition(WorkerState::Failed, Some(Outcome::Failed(cause)))
    }

    /// Any non-terminal state → `Cancelled`; also cancels [`cancel_token`](Self::cancel_token).
    ///
    /// Returns `false` if the worker was already terminal.
    pub fn cancel(&self) -> bool {
        let cancelled = self
            .transition(WorkerState::Cancelled, Some(Outcome::Cancelled))
            .is_ok();
        if cancelled {
            self.shared.token.cancel();
        }
        cancelled
    }

    /// Returns a weak handle that does not keep the worker alive.
    pub fn downgrade(&self) -> WeakWorker<T> {
        WeakWorker {
            shared: Arc::downgrade(&self.shared),
        }
    }

    /// Removes the stored outcome, leaving the state untouched.
    ///
    /// Only for workers that never escape the crate (bridge jobs).
    pub(crate) fn take_outcome(&self) -> Option<Outcome<T>> {
        self.shared.inner.lock().outcome.take()
    }

    pub(crate) fn signal_slot(&self) -> &Mutex<Weak<SignalShared>> {
        &self.shared.signal
    }

    fn transition(&self, to: WorkerState, outcome: Option<Outcome<T>>) -> Result<(), TransitionError> {
        let _delivery = self.shared.delivery.lock();

        let listeners: Vec<StateListener> = {
            let mut inner = self.shared.inner.lock();
            let from = inner.state;
            if !from.can_move_to(to) {
                return Err(TransitionError { from, to });
            }
            inner.state = to;
            if outcome.is_some() {
                inner.outcome = outcome;
            }
            trace!(worker = %self.shared.name, from = from.as_label(), to = to.as_label(), "worker transition");
            inner.listeners.iter().map(|(_, l)| Arc::clone(l)).collect()
        };

        for listener in listeners {
            if catch_unwind(AssertUnwindSafe(|| listener(to))).is_err() {
                error!(worker = %self.shared.name, to = to.as_label(), "state listener panicked");
            }
        }
        Ok(())
    }
}

impl<T: Clone + Send + 'static> Worker<T> {
    /// Returns the value of a succeeded worker.
    pub fn value(&self) -> Option<T> {
        match &self.shared.inner.lock().outcome {
            Some(Outcome::Success(v)) => Some(v.clone()),
            _ => None,
        }
    }

    /// Returns the terminal outcome, or `None` while the worker is still live.
    pub fn outcome(&self) -> Option<Outcome<T>> {
        self.shared.inner.lock().outcome.clone()
    }
}

/// Weak counterpart of [`Worker`].
pub struct WeakWorker<T> {
    shared: Weak<Shared<T>>,
}

impl<T> Clone for WeakWorker<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Weak::clone(&self.shared),
        }
    }
}

impl<T> WeakWorker<T> {
    /// Upgrades to a strong handle if the worker is still alive.
    pub fn upgrade(&self) -> Option<Worker<T>> {
        self.shared.upgrade().map(|shared| Worker { shared })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex as StdMutex;

    use super::*;
    use crate::error::cause;

    fn recorder() -> (Arc<StdMutex<Vec<WorkerState>>>, impl Fn(WorkerState) + Send + Sync) {
        let seen = Arc::new(StdMutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        (seen, move |s| sink.lock().unwrap().push(s))
    }

    #[test]
    fn delivers_every_transition_in_order() {
        let worker = Worker::new("w");
        let (seen, listener) = recorder();
        let (initial, _sub) = worker.subscribe(listener);
        assert_eq!(initial, WorkerState::Ready);

        worker.schedule().unwrap();
        worker.start().unwrap();
        worker.succeed(1).unwrap();

        assert_eq!(
            *seen.lock().unwrap(),
            vec![
                WorkerState::Scheduled,
                WorkerState::Running,
                WorkerState::Succeeded
            ]
        );
    }

    #[test]
    fn rejects_leaving_terminal_state() {
        let worker = Worker::new("w");
        worker.succeed(5).unwrap();
        let err = worker.fail(cause("late")).unwrap_err();
        assert_eq!(err.from, WorkerState::Succeeded);
        assert_eq!(err.to, WorkerState::Failed);
        assert!(!worker.cancel());
        assert_eq!(worker.value(), Some(5));
    }

    #[test]
    fn cancel_also_cancels_token() {
        let worker: Worker<()> = Worker::new("w");
        let token = worker.cancel_token();
        assert!(worker.cancel());
        assert!(token.is_cancelled());
        assert!(matches!(worker.outcome(), Some(Outcome::Cancelled)));
    }

    #[test]
    fn cancelled_subscription_stops_delivery() {
        let worker = Worker::new("w");
        let (seen, listener) = recorder();
        let (_, sub) = worker.subscribe(listener);
        assert!(sub.cancel());
        assert_eq!(worker.listener_count(), 0);
        worker.succeed(1).unwrap();
        assert!(seen.lock().unwrap().is_empty());
    }

    #[test]
    fn panicking_listener_does_not_block_others() {
        let worker = Worker::new("w");
        let _a = worker.subscribe(|_| panic!("listener bug"));
        let (seen, listener) = recorder();
        let _b = worker.subscribe(listener);
        worker.succeed(1).unwrap();
        assert_eq!(*seen.lock().unwrap(), vec![WorkerState::Succeeded]);
    }

    #[test]
    fn failure_exposes_cause() {
        let worker: Worker<u8> = Worker::failed("w", cause("bad"));
        assert_eq!(worker.state(), WorkerState::Failed);
        assert_eq!(worker.failure().map(|c| c.to_string()).as_deref(), Some("bad"));
        assert_eq!(worker.value(), None);
    }

    #[test]
    fn weak_handle_does_not_keep_worker_alive() {
        let worker: Worker<u8> = Worker::new("w");
        let weak = worker.downgrade();
        assert!(weak.upgrade().is_some());
        drop(worker);
        assert!(weak.upgrade().is_none());
    }
}
