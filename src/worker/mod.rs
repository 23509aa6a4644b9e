//! # Workers: observable units of asynchronous work.
//!
//! - [`WorkerState`] six-valued lifecycle state
//! - [`Outcome`] tagged terminal result
//! - [`Worker`] shared handle with ordered, synchronous state delivery
//! - [`StateSubscription`] handle for removing a state listener

mod handle;
mod state;

pub use handle::{StateSubscription, WeakWorker, Worker};
pub use state::{Outcome, WorkerState};
