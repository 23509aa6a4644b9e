//! Thread-per-job executor.

use std::borrow::Cow;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread;

use tracing::trace;

use crate::error::BridgeError;
use crate::executors::{Executor, Job};

/// Spawns one named OS thread per job (`{prefix}-{n}`).
#[derive(Debug)]
pub struct ThreadExecutor {
    prefix: Cow<'static, str>,
    spawned: AtomicU64,
}

impl ThreadExecutor {
    /// Creates an executor whose threads are named `{prefix}-{n}`.
    pub fn new(prefix: impl Into<Cow<'static, str>>) -> Self {
        Self {
            prefix: prefix.into(),
            spawned: AtomicU64::new(0),
        }
    }

    /// Number of threads spawned so far.
    pub fn spawned(&self) -> u64 {
        self.spawned.load(Ordering::Relaxed)
    }
}

impl Default for ThreadExecutor {
    fn default() -> Self {
        Self::new("workbridge")
    }
}

impl Executor for ThreadExecutor {
    fn execute(&self, job: Job) -> Result<(), BridgeError> {
        let n = self.spawned.fetch_add(1, Ordering::Relaxed);
        let name = format!("{}-{n}", self.prefix);
        trace!(thread = %name, "spawning job thread");
        thread::Builder::new()
            .name(name)
            .spawn(job)
            .map(drop)
            .map_err(|err| BridgeError::ExecutorRejected {
                reason: err.to_string(),
            })
    }
}
