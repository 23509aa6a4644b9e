//! # Controller thread and the blocking bridge onto it.
//!
//! - [`ControllerThread`] one named OS thread running jobs strictly FIFO
//! - [`ControllerBridge`] run-and-wait calls from any thread
//! - [`Dispatcher`] the seam between the two; [`InlineDispatcher`] runs jobs in place
//! - [`ControllerConfig`] thread name and event bus capacity
//!
//! ```text
//! worker threads ──► ControllerBridge ──► Dispatcher::execute ──► ControllerThread
//!       ▲                                                              │
//!       └──────────── wait_terminal(worker) ◄── worker transitions ◄───┘
//! ```

mod bridge;
mod config;
mod dispatcher;
mod inline;
mod thread;

pub use bridge::ControllerBridge;
pub use config::ControllerConfig;
pub use dispatcher::Dispatcher;
pub use inline::InlineDispatcher;
pub use thread::{ControllerStats, ControllerThread};
