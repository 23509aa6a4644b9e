//! Dispatcher that runs every job on the submitting thread.

use crate::controller::Dispatcher;
use crate::error::BridgeError;
use crate::executors::{Executor, Job};

/// Runs jobs immediately on the calling thread.
///
/// Every thread counts as the dispatch thread, so bridge calls through it never
/// queue or block. Handy for tests and single-threaded tools.
#[derive(Clone, Copy, Debug, Default)]
pub struct InlineDispatcher;

impl Executor for InlineDispatcher {
    fn execute(&self, job: Job) -> Result<(), BridgeError> {
        job();
        Ok(())
    }
}

impl Dispatcher for InlineDispatcher {
    fn is_dispatch_thread(&self) -> bool {
        true
    }
}
