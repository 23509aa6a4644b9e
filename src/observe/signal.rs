//! # Terminal signal: a monotone "is done" flag derived from worker state.
//!
//! [`observe_terminal`] subscribes to a worker's state stream and folds it into a
//! boolean that flips from `false` to `true` exactly once.
//!
//! ## Architecture
//! ```text
//! Worker ── state listener ──► SignalShared::observe(state)
//!                                   │ (terminal?)
//!                                   ▼
//!                              fire() once ──► callback_1() ... callback_n()
//!                                   │
//!                                   └─► detach from worker (nothing left to observe)
//! ```
//!
//! ## Rules
//! - Initial value is computed from the state captured **atomically** with the subscription
//! - The flag never goes back to `false`; callbacks fire at most once
//! - One signal per worker is cached weakly; concurrent observers share it
//! - The worker's listener holds the signal until the terminal edge, then lets go

use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tracing::error;

use crate::worker::{StateSubscription, Worker, WorkerState};

type Callback = Box<dyn FnOnce() + Send + 'static>;

struct SignalState {
    terminal: bool,
    callbacks: Vec<(u64, Callback)>,
    next_id: u64,
}

/// Shared state behind a [`TerminalSignal`].
pub(crate) struct SignalShared {
    state: Mutex<SignalState>,
    subscription: Mutex<Option<StateSubscription>>,
}

impl SignalShared {
    fn new() -> Self {
        Self {
            state: Mutex::new(SignalState {
                terminal: false,
                callbacks: Vec::new(),
                next_id: 0,
            }),
            subscription: Mutex::new(None),
        }
    }

    fn is_terminal(&self) -> bool {
        self.state.lock().terminal
    }

    fn observe(&self, state: WorkerState) {
        if state.is_terminal() {
            self.fire();
        }
    }

    fn fire(&self) {
        let callbacks = {
            let mut state = self.state.lock();
            if state.terminal {
                return;
            }
            state.terminal = true;
            std::mem::take(&mut state.callbacks)
        };

        for (_, callback) in callbacks {
            if catch_unwind(AssertUnwindSafe(callback)).is_err() {
                error!("terminal callback panicked");
            }
        }
        self.detach();
    }

    fn detach(&self) {
        let subscription = self.subscription.lock().take();
        if let Some(subscription) = subscription {
            subscription.cancel();
        }
    }

    fn remove(&self, id: u64) -> bool {
        let mut state = self.state.lock();
        let before = state.callbacks.len();
        state.callbacks.retain(|(cid, _)| *cid != id);
        state.callbacks.len() != before
    }
}

/// Monotone boolean that becomes `true` when its worker reaches a terminal state.
///
/// ## Example
/// ```
/// use std::sync::Arc;
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use workbridge::Worker;
///
/// let worker = Worker::new("job");
/// let signal = worker.observe_terminal();
/// assert!(!signal.get());
///
/// let fired = Arc::new(AtomicUsize::new(0));
/// let counter = Arc::clone(&fired);
/// signal.on_terminal(move || { counter.fetch_add(1, Ordering::SeqCst); });
///
/// worker.start().unwrap();
/// worker.succeed("done").unwrap();
/// assert!(signal.get());
/// assert_eq!(fired.load(Ordering::SeqCst), 1);
/// ```
#[derive(Clone)]
pub struct TerminalSignal {
    shared: Arc<SignalShared>,
}

impl fmt::Debug for TerminalSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TerminalSignal")
            .field("terminal", &self.get())
            .finish()
    }
}

impl TerminalSignal {
    /// Current value: `true` iff the worker is in a terminal state.
    pub fn get(&self) -> bool {
        self.shared.is_terminal()
    }

    /// Registers `callback` for the terminal edge.
    ///
    /// If the signal is already terminal the callback runs **now**, on the calling
    /// thread, and the returned subscription is inert.
    pub fn on_terminal<F>(&self, callback: F) -> SignalSubscription
    where
        F: FnOnce() + Send + 'static,
    {
        match self.try_subscribe(callback) {
            Ok(subscription) => subscription,
            Err(callback) => {
                callback();
                SignalSubscription::inert()
            }
        }
    }

    /// Registers `callback` unless the signal is already terminal.
    ///
    /// On an already-terminal signal the callback is handed back **without** being
    /// called, so callers holding their own locks decide where it runs.
    pub fn try_subscribe<F>(&self, callback: F) -> Result<SignalSubscription, F>
    where
        F: FnOnce() + Send + 'static,
    {
        let mut state = self.shared.state.lock();
        if state.terminal {
            return Err(callback);
        }
        let id = state.next_id;
        state.next_id += 1;
        state.callbacks.push((id, Box::new(callback)));
        Ok(SignalSubscription {
            signal: Arc::downgrade(&self.shared),
            id: Some(id),
        })
    }

    /// Number of callbacks still waiting for the terminal edge.
    pub fn pending_callbacks(&self) -> usize {
        self.shared.state.lock().callbacks.len()
    }
}

/// Handle to a callback registered on a [`TerminalSignal`].
///
/// Dropping the handle keeps the callback registered until it fires; call
/// [`cancel`](SignalSubscription::cancel) to remove it earlier.
#[derive(Debug)]
pub struct SignalSubscription {
    signal: Weak<SignalShared>,
    id: Option<u64>,
}

impl SignalSubscription {
    fn inert() -> Self {
        Self {
            signal: Weak::new(),
            id: None,
        }
    }

    /// Removes the callback if it has not fired yet. Returns `true` if it was removed.
    pub fn cancel(self) -> bool {
        match (self.signal.upgrade(), self.id) {
            (Some(signal), Some(id)) => signal.remove(id),
            _ => false,
        }
    }
}

/// Returns the terminal signal of `worker`, subscribing on first observation.
///
/// The signal is correct for the state at call time and follows every later
/// transition synchronously. Observers of the same worker share one signal while
/// any of them holds it.
pub fn observe_terminal<T: Send + 'static>(worker: &Worker<T>) -> TerminalSignal {
    let mut slot = worker.signal_slot().lock();
    if let Some(shared) = slot.upgrade() {
        return TerminalSignal { shared };
    }

    let shared = Arc::new(SignalShared::new());
    let listener = Arc::clone(&shared);
    let (initial, subscription) = worker.subscribe(move |state| listener.observe(state));
    *shared.subscription.lock() = Some(subscription);
    *slot = Arc::downgrade(&shared);
    drop(slot);

    shared.observe(initial);
    if shared.is_terminal() {
        // A terminal edge delivered before the subscription was stored could not detach it.
        shared.detach();
    }
    TerminalSignal { shared }
}
