//! # Controller thread configuration.
//!
//! # Example
//! ```
//! use workbridge::ControllerConfig;
//!
//! let mut cfg = ControllerConfig::default();
//! cfg.thread_name = "ui".into();
//! cfg.bus_capacity = 0;
//!
//! assert_eq!(cfg.bus_capacity_clamped(), 1);
//! ```

/// Configuration for a [`ControllerThread`](crate::ControllerThread).
#[derive(Clone, Debug)]
pub struct ControllerConfig {
    /// Name of the OS thread (also used in events and logs).
    pub thread_name: String,
    /// Capacity of the event bus channel (clamped to at least 1).
    pub bus_capacity: usize,
}

impl Default for ControllerConfig {
    /// Provides a default configuration:
    /// - `thread_name = "controller"`
    /// - `bus_capacity = 1024`
    fn default() -> Self {
        Self {
            thread_name: "controller".to_string(),
            bus_capacity: 1024,
        }
    }
}

impl ControllerConfig {
    /// Returns the bus capacity, never below 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }
}
