//! # Queueing executor with a concurrency limit.
//!
//! ```text
//! submit(service) / execute(job)
//!        │
//!        ▼
//!   pending (FIFO) ──pump──► running < limit? ──► inner executor ──► job ──► slot released ──► pump
//! ```
//!
//! ## Rules
//! - Jobs start in submission order
//! - At most `max_concurrent` jobs run at once (`0` = unlimited)
//! - A job refused by the inner executor is dropped (its worker ends `Cancelled`)
//!   and frees its slot
//! - Draining is a loop: a slot freed inside `pump` on the same thread never
//!   starts a nested `pump`, so queue length does not grow the stack

use std::cell::RefCell;
use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::warn;

use crate::error::BridgeError;
use crate::executors::{Executor, Job, ThreadExecutor};
use crate::tasks::Service;
use crate::worker::Worker;

/// Configuration for [`ObservableExecutor`].
#[derive(Clone, Debug, Default)]
pub struct ObservableConfig {
    /// Maximum number of jobs running at once (0 = unlimited).
    pub max_concurrent: usize,
}

impl ObservableConfig {
    /// Returns the concurrency limit, or `None` when unlimited.
    pub fn concurrency_limit(&self) -> Option<usize> {
        match self.max_concurrent {
            0 => None,
            n => Some(n),
        }
    }
}

struct PoolState {
    pending: VecDeque<Job>,
    running: usize,
}

struct Pool {
    inner: Arc<dyn Executor>,
    limit: Option<usize>,
    state: Mutex<PoolState>,
}

/// Frees a running slot when the job finishes (or is dropped unrun).
struct SlotGuard(Arc<Pool>);

impl Drop for SlotGuard {
    fn drop(&mut self) {
        self.0.state.lock().running -= 1;
        // An inline or refusing inner executor drops the guard inside `pump`;
        // that loop picks up the freed slot itself.
        if !PumpTurn::active(&self.0) {
            pump(&self.0);
        }
    }
}

thread_local! {
    /// Pools whose `pump` loop is on this thread's stack.
    static PUMPING: RefCell<Vec<usize>> = const { RefCell::new(Vec::new()) };
}

/// Marks `pump` as running for one pool on the current thread.
struct PumpTurn(usize);

impl PumpTurn {
    fn key(pool: &Arc<Pool>) -> usize {
        Arc::as_ptr(pool) as usize
    }

    fn enter(pool: &Arc<Pool>) -> Self {
        let key = Self::key(pool);
        PUMPING.with_borrow_mut(|pumping| pumping.push(key));
        Self(key)
    }

    fn active(pool: &Arc<Pool>) -> bool {
        let key = Self::key(pool);
        PUMPING.with_borrow(|pumping| pumping.contains(&key))
    }
}

impl Drop for PumpTurn {
    fn drop(&mut self) {
        PUMPING.with_borrow_mut(|pumping| {
            if let Some(pos) = pumping.iter().rposition(|key| *key == self.0) {
                pumping.remove(pos);
            }
        });
    }
}

fn pump(pool: &Arc<Pool>) {
    let _turn = PumpTurn::enter(pool);
    loop {
        let job = {
            let mut state = pool.state.lock();
            if pool.limit.is_some_and(|limit| state.running >= limit) {
                return;
            }
            let Some(job) = state.pending.pop_front() else {
                return;
            };
            state.running += 1;
            job
        };

        let guard = SlotGuard(Arc::clone(pool));
        let slot: Job = Box::new(move || {
            let _guard = guard;
            job();
        });
        if let Err(err) = pool.inner.execute(slot) {
            warn!(error = err.as_label(), reason = %err, "inner executor rejected queued job");
        }
    }
}

/// Executor that owns ordering and backpressure for the services it runs.
///
/// ## Example
/// ```
/// use workbridge::{ObservableConfig, ObservableExecutor, Service, Workload, wait_for};
///
/// let pool = ObservableExecutor::with_threads(ObservableConfig { max_concurrent: 2 });
/// let svc = Service::new("double", Workload::call(|| Ok::<_, std::io::Error>(2 * 21)));
/// let worker = pool.submit(&svc);
/// assert_eq!(wait_for(&worker).unwrap(), 42);
/// ```
#[derive(Clone)]
pub struct ObservableExecutor {
    pool: Arc<Pool>,
}

impl ObservableExecutor {
    /// Creates a queueing executor in front of `inner`.
    pub fn new(inner: Arc<dyn Executor>, config: ObservableConfig) -> Self {
        Self {
            pool: Arc::new(Pool {
                inner,
                limit: config.concurrency_limit(),
                state: Mutex::new(PoolState {
                    pending: VecDeque::new(),
                    running: 0,
                }),
            }),
        }
    }

    /// Creates a queueing executor in front of a [`ThreadExecutor`].
    pub fn with_threads(config: ObservableConfig) -> Self {
        Self::new(Arc::new(ThreadExecutor::new("observable")), config)
    }

    /// Starts a new run of `service` through this executor and returns its worker immediately.
    pub fn submit<T: Send + 'static>(&self, service: &Service<T>) -> Worker<T> {
        let (worker, job) = service.prepare();
        self.enqueue(job);
        worker
    }

    /// Jobs currently executing.
    pub fn running_count(&self) -> usize {
        self.pool.state.lock().running
    }

    /// Jobs queued behind the concurrency limit.
    pub fn pending_count(&self) -> usize {
        self.pool.state.lock().pending.len()
    }

    fn enqueue(&self, job: Job) {
        self.pool.state.lock().pending.push_back(job);
        pump(&self.pool);
    }
}

impl Executor for ObservableExecutor {
    fn execute(&self, job: Job) -> Result<(), BridgeError> {
        self.enqueue(job);
        Ok(())
    }

    fn as_observable(&self) -> Option<&ObservableExecutor> {
        Some(self)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::mpsc;
    use std::thread;
    use std::time::Duration;

    use super::*;
    use crate::controller::InlineDispatcher;
    use crate::observe::wait_for;
    use crate::tasks::Workload;
    use crate::worker::WorkerState;

    /// Service whose run blocks until a token arrives on the returned sender.
    fn gated(name: &str) -> (Service<()>, mpsc::Sender<()>) {
        let (tx, rx) = mpsc::channel::<()>();
        let rx = Arc::new(Mutex::new(rx));
        let svc = Service::new(
            name.to_string(),
            Workload::action(move || {
                let _ = rx.lock().recv();
            }),
        );
        (svc, tx)
    }

    fn settle(pool: &ObservableExecutor, running: usize, pending: usize) {
        for _ in 0..1000 {
            if pool.running_count() == running && pool.pending_count() == pending {
                return;
            }
            thread::sleep(Duration::from_millis(1));
        }
        panic!(
            "expected running={running} pending={pending}, got running={} pending={}",
            pool.running_count(),
            pool.pending_count()
        );
    }

    #[test]
    fn unlimited_when_zero() {
        assert_eq!(ObservableConfig::default().concurrency_limit(), None);
        assert_eq!(
            ObservableConfig { max_concurrent: 3 }.concurrency_limit(),
            Some(3)
        );
    }

    #[test]
    fn limit_holds_back_extra_jobs() {
        let pool = ObservableExecutor::with_threads(ObservableConfig { max_concurrent: 1 });
        let (a, release_a) = gated("a");
        let (b, release_b) = gated("b");

        let wa = pool.submit(&a);
        let wb = pool.submit(&b);
        settle(&pool, 1, 1);
        assert_eq!(wb.state(), WorkerState::Scheduled);

        release_a.send(()).unwrap();
        wait_for(&wa).unwrap();
        settle(&pool, 1, 0);

        release_b.send(()).unwrap();
        wait_for(&wb).unwrap();
        settle(&pool, 0, 0);
    }

    #[test]
    fn refused_jobs_release_their_slot() {
        struct Refusing;
        impl Executor for Refusing {
            fn execute(&self, _job: Job) -> Result<(), BridgeError> {
                Err(BridgeError::ExecutorRejected {
                    reason: "full".into(),
                })
            }
        }

        let pool = ObservableExecutor::new(Arc::new(Refusing), ObservableConfig { max_concurrent: 1 });
        let svc = Service::new("x", Workload::action(|| {}));
        let first = pool.submit(&svc);
        let second = pool.submit(&svc);
        assert_eq!(first.state(), WorkerState::Cancelled);
        assert_eq!(second.state(), WorkerState::Cancelled);
        assert_eq!(pool.running_count(), 0);
        assert_eq!(pool.pending_count(), 0);
    }

    #[test]
    fn long_queue_behind_inline_executor_drains_in_a_loop() {
        const QUEUED: usize = 200_000;
        let pool = ObservableExecutor::new(
            Arc::new(InlineDispatcher),
            ObservableConfig { max_concurrent: 1 },
        );

        let (release, gate) = mpsc::channel::<()>();
        let blocker = pool.clone();
        let drainer = thread::spawn(move || {
            blocker
                .execute(Box::new(move || {
                    let _ = gate.recv();
                }))
                .unwrap();
        });
        settle(&pool, 1, 0);

        let ran = Arc::new(AtomicUsize::new(0));
        for _ in 0..QUEUED {
            let ran = Arc::clone(&ran);
            pool.execute(Box::new(move || {
                ran.fetch_add(1, Ordering::Relaxed);
            }))
            .unwrap();
        }
        assert_eq!(pool.pending_count(), QUEUED);

        release.send(()).unwrap();
        drainer.join().unwrap();
        assert_eq!(ran.load(Ordering::Relaxed), QUEUED);
        settle(&pool, 0, 0);
    }

    #[test]
    fn reports_itself_as_observable() {
        let pool = ObservableExecutor::with_threads(ObservableConfig::default());
        let exec: Arc<dyn Executor> = Arc::new(pool);
        assert!(exec.as_observable().is_some());
        assert!(ThreadExecutor::default().as_observable().is_none());
    }
}
