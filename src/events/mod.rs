//! Controller events: types and broadcast bus.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and payload metadata
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`
//!
//! The only publisher is [`ControllerThread`](crate::ControllerThread); consumers
//! get receivers through [`ControllerThread::subscribe`](crate::ControllerThread::subscribe).

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};
