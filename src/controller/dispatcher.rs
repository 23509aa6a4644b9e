use crate::executors::Executor;

/// Executor bound to a single, identifiable thread.
///
/// Jobs run one at a time, in submission order.
pub trait Dispatcher: Executor {
    /// Returns `true` when called on the thread that runs this dispatcher's jobs.
    fn is_dispatch_thread(&self) -> bool;
}
