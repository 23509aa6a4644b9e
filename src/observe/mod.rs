//! # Observing worker completion.
//!
//! - [`observe_terminal`] / [`TerminalSignal`] monotone "is done" flag per worker
//! - [`on_complete`] / [`then`] one-shot callbacks on the terminal edge
//! - [`wait_for`] / [`wait_for_interruptibly`] block a thread until the worker is done
//! - [`wait_until_terminal`] the same wait for values that cannot be cloned

mod notify;
mod signal;
mod wait;

pub use notify::{on_complete, then};
pub use signal::{SignalSubscription, TerminalSignal, observe_terminal};
pub use wait::{wait_for, wait_for_interruptibly, wait_until_terminal};

pub(crate) use signal::SignalShared;
pub(crate) use wait::wait_terminal;
