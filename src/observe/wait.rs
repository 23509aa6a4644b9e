//! # Blocking wait for worker completion.
//!
//! [`wait_for`] parks the calling thread until a worker is terminal and returns its
//! value or the matching [`BridgeError`].
//!
//! ## Algorithm
//! ```text
//! lock gate ──► signal = observe_terminal(worker)
//!    │             ├─ terminal?  ──► unlock, return outcome
//!    │             └─ register listener: lock gate ─► terminal = true ─► notify ─► unlock
//!    ▼
//! while !terminal:
//!    ├─ interrupt token cancelled? ──► unlock, remove listener, InterruptedWait
//!    └─ condvar.wait(gate)             (re-checks on every wake, spurious or not)
//! unlock, return outcome
//! ```
//!
//! ## Rules
//! - Every signaller holds the gate before notifying; the waiter holds it between
//!   checking and blocking, so no wakeup is lost
//! - A signaller that finds the gate taken **blocks** for it; it never drops the signal
//! - Each wait owns its own gate; gates are never shared across waits
//! - Interruption is a `CancellationToken` owned by the caller; cancelling it ends
//!   the wait, never the worker

use std::pin::pin;
use std::sync::Arc;
use std::task::Context;

use futures::task::{ArcWake, waker};
use parking_lot::{Condvar, Mutex};
use tokio_util::sync::CancellationToken;

use crate::error::BridgeError;
use crate::worker::{Worker, WorkerState};

/// Mutex + condition pair scoped to one wait call.
struct WaitGate {
    terminal: Mutex<bool>,
    cond: Condvar,
}

impl WaitGate {
    fn new() -> Self {
        Self {
            terminal: Mutex::new(false),
            cond: Condvar::new(),
        }
    }

    fn mark_terminal(&self) {
        let mut terminal = self.terminal.lock();
        *terminal = true;
        self.cond.notify_all();
    }
}

/// Wakes the waiter when its interrupt token is cancelled.
impl ArcWake for WaitGate {
    fn wake_by_ref(arc_self: &Arc<Self>) {
        let _guard = arc_self.terminal.lock();
        arc_self.cond.notify_all();
    }
}

/// Blocks until `worker` is terminal and returns its value.
///
/// The value stays on the worker so every waiter gets its own copy, hence
/// `T: Clone`. Wrap the value in an `Arc`, or use [`wait_until_terminal`], when
/// `T` cannot be cloned.
///
/// # Errors
/// - [`BridgeError::WorkloadCancelled`] if the worker was cancelled
/// - [`BridgeError::WorkloadExecutionFailed`] if it failed (cause attached)
///
/// Calling this on a thread the worker's own completion depends on deadlocks; that
/// is the caller's responsibility.
///
/// ## Example
/// ```
/// use std::thread;
/// use workbridge::{Worker, wait_for};
///
/// let worker = Worker::new("answer");
/// let driver = worker.clone();
/// thread::spawn(move || {
///     driver.start().unwrap();
///     driver.succeed(42).unwrap();
/// });
/// assert_eq!(wait_for(&worker).unwrap(), 42);
/// ```
pub fn wait_for<T: Clone + Send + 'static>(worker: &Worker<T>) -> Result<T, BridgeError> {
    wait_for_interruptibly(worker, &CancellationToken::new())
}

/// Like [`wait_for`], but returns [`BridgeError::InterruptedWait`] once `interrupt`
/// is cancelled. The worker keeps running.
pub fn wait_for_interruptibly<T: Clone + Send + 'static>(
    worker: &Worker<T>,
    interrupt: &CancellationToken,
) -> Result<T, BridgeError> {
    wait_terminal(worker, interrupt)?;
    worker
        .outcome()
        .ok_or(BridgeError::WorkloadCancelled)?
        .into_result()
}

/// Blocks until `worker` is terminal and returns the state it ended in.
///
/// Places no bound on `T`; the outcome itself stays on the worker.
///
/// # Errors
/// [`BridgeError::InterruptedWait`] once `interrupt` is cancelled.
///
/// ## Example
/// ```
/// use tokio_util::sync::CancellationToken;
/// use workbridge::{Worker, WorkerState, wait_until_terminal};
///
/// struct Handle;
/// let worker = Worker::succeeded("open", Handle);
/// let state = wait_until_terminal(&worker, &CancellationToken::new()).unwrap();
/// assert_eq!(state, WorkerState::Succeeded);
/// ```
pub fn wait_until_terminal<T: Send + 'static>(
    worker: &Worker<T>,
    interrupt: &CancellationToken,
) -> Result<WorkerState, BridgeError> {
    wait_terminal(worker, interrupt)?;
    Ok(worker.state())
}

/// Blocks until `worker` is terminal or `interrupt` is cancelled.
pub(crate) fn wait_terminal<T: Send + 'static>(
    worker: &Worker<T>,
    interrupt: &CancellationToken,
) -> Result<(), BridgeError> {
    let gate = Arc::new(WaitGate::new());
    let mut terminal = gate.terminal.lock();

    let signal = worker.observe_terminal();
    if signal.get() {
        return Ok(());
    }

    let notifier = Arc::clone(&gate);
    let subscription = match signal.try_subscribe(move || notifier.mark_terminal()) {
        Ok(subscription) => subscription,
        // Went terminal between the check and the registration.
        Err(_) => return Ok(()),
    };

    let interrupt_waker = waker(Arc::clone(&gate));
    let mut cx = Context::from_waker(&interrupt_waker);
    let mut interrupted = pin!(interrupt.cancelled());

    while !*terminal {
        if interrupted.as_mut().poll(&mut cx).is_ready() {
            drop(terminal);
            subscription.cancel();
            return Err(BridgeError::InterruptedWait);
        }
        gate.cond.wait(&mut terminal);
    }
    Ok(())
}
