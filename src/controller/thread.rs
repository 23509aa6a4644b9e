//! # Controller thread: one named OS thread running queued jobs strictly FIFO.
//!
//! ```text
//! execute(job) ──► mpsc (unbounded) ──► controller thread loop
//!   (any thread)                            │
//!                                           ├─► JobStarted
//!                                           ├─► job()  (panic caught, thread survives)
//!                                           └─► JobFinished | JobPanicked
//! stop()  ──► drop sender ──► loop drains what is queued ──► ControllerStopped
//! ```
//!
//! ## Rules
//! - Jobs never run in parallel and run in the order they were accepted
//! - After `stop()` new jobs are refused with [`BridgeError::ControllerStopped`];
//!   jobs accepted before still run
//! - Dropping the last handle stops and joins the thread (unless dropped on the
//!   controller thread itself)

use std::io;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread::{self, JoinHandle, ThreadId};

use parking_lot::Mutex;
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, error, info, trace, warn};

use crate::controller::{ControllerConfig, Dispatcher};
use crate::error::{BridgeError, TaskError};
use crate::events::{Bus, Event, EventKind};
use crate::executors::{Executor, Job};

type Queued = (u64, Job);

/// Snapshot of controller counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ControllerStats {
    /// Jobs accepted into the queue.
    pub queued: u64,
    /// Jobs that ran to completion.
    pub executed: u64,
    /// Jobs that panicked.
    pub panicked: u64,
}

#[derive(Default)]
struct Counters {
    queued: AtomicU64,
    executed: AtomicU64,
    panicked: AtomicU64,
}

/// Dedicated thread that runs controller work.
pub struct ControllerThread {
    name: Arc<str>,
    tx: Mutex<Option<mpsc::UnboundedSender<Queued>>>,
    thread: ThreadId,
    handle: Mutex<Option<JoinHandle<()>>>,
    counters: Arc<Counters>,
    next_job: AtomicU64,
    bus: Bus,
}

impl ControllerThread {
    /// Spawns the controller thread.
    pub fn start(config: ControllerConfig) -> io::Result<Self> {
        let name: Arc<str> = Arc::from(config.thread_name.as_str());
        let bus = Bus::new(config.bus_capacity_clamped());
        let counters = Arc::new(Counters::default());
        let (tx, rx) = mpsc::unbounded_channel();

        let handle = {
            let name = Arc::clone(&name);
            let bus = bus.clone();
            let counters = Arc::clone(&counters);
            thread::Builder::new()
                .name(config.thread_name.clone())
                .spawn(move || run_loop(name, rx, counters, bus))?
        };

        Ok(Self {
            name,
            tx: Mutex::new(Some(tx)),
            thread: handle.thread().id(),
            handle: Mutex::new(Some(handle)),
            counters,
            next_job: AtomicU64::new(0),
            bus,
        })
    }

    /// Returns the controller thread name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns a snapshot of the job counters.
    pub fn stats(&self) -> ControllerStats {
        ControllerStats {
            queued: self.counters.queued.load(Ordering::Acquire),
            executed: self.counters.executed.load(Ordering::Acquire),
            panicked: self.counters.panicked.load(Ordering::Acquire),
        }
    }

    /// Returns the event bus.
    pub fn bus(&self) -> &Bus {
        &self.bus
    }

    /// Subscribes to controller events published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.bus.subscribe()
    }

    /// Returns `true` while new jobs are accepted.
    pub fn is_running(&self) -> bool {
        self.tx.lock().is_some()
    }

    /// Stops accepting jobs. Already queued jobs still run. Idempotent.
    pub fn stop(&self) {
        let Some(sender) = self.tx.lock().take() else {
            return;
        };
        info!(controller = %self.name, "controller stopping");
        let ev = Event::new(EventKind::ControllerStopping).with_controller(Arc::clone(&self.name));
        self.bus.publish(ev);
        // The loop may only observe the closed channel after `ControllerStopping` is out.
        drop(sender);
    }

    /// Waits for the controller thread to finish. Call [`stop`](Self::stop) first.
    ///
    /// Does nothing when called on the controller thread itself.
    pub fn join(&self) {
        if self.is_dispatch_thread() {
            return;
        }
        let handle = self.handle.lock().take();
        if let Some(handle) = handle {
            if handle.join().is_err() {
                error!(controller = %self.name, "controller thread panicked");
            }
        }
    }

    fn event(&self, kind: EventKind, job: u64) -> Event {
        Event::new(kind)
            .with_controller(Arc::clone(&self.name))
            .with_job(job)
    }
}

impl Executor for ControllerThread {
    fn execute(&self, job: Job) -> Result<(), BridgeError> {
        let sender = self.tx.lock();
        let Some(tx) = sender.as_ref() else {
            debug!(controller = %self.name, "job refused: controller stopped");
            return Err(BridgeError::ControllerStopped);
        };
        let id = self.next_job.fetch_add(1, Ordering::Relaxed);
        // Counted and announced before the controller thread can pick it up.
        self.counters.queued.fetch_add(1, Ordering::AcqRel);
        self.bus.publish(self.event(EventKind::JobQueued, id));
        if tx.send((id, job)).is_err() {
            self.counters.queued.fetch_sub(1, Ordering::AcqRel);
            warn!(controller = %self.name, job = id, "controller thread is gone; job dropped");
            return Err(BridgeError::ControllerStopped);
        }
        trace!(controller = %self.name, job = id, "job queued");
        Ok(())
    }
}

impl Dispatcher for ControllerThread {
    fn is_dispatch_thread(&self) -> bool {
        thread::current().id() == self.thread
    }
}

impl Drop for ControllerThread {
    fn drop(&mut self) {
        self.stop();
        self.join();
    }
}

fn run_loop(
    name: Arc<str>,
    mut rx: mpsc::UnboundedReceiver<Queued>,
    counters: Arc<Counters>,
    bus: Bus,
) {
    info!(controller = %name, "controller started");
    bus.publish(Event::new(EventKind::ControllerStarted).with_controller(Arc::clone(&name)));

    while let Some((id, job)) = rx.blocking_recv() {
        let event = |kind| {
            Event::new(kind)
                .with_controller(Arc::clone(&name))
                .with_job(id)
        };
        bus.publish(event(EventKind::JobStarted));

        match catch_unwind(AssertUnwindSafe(job)) {
            Ok(()) => {
                counters.executed.fetch_add(1, Ordering::AcqRel);
                bus.publish(event(EventKind::JobFinished));
            }
            Err(payload) => {
                counters.panicked.fetch_add(1, Ordering::AcqRel);
                let reason = TaskError::from_panic(payload).as_message();
                error!(controller = %name, job = id, reason = %reason, "controller job panicked");
                bus.publish(event(EventKind::JobPanicked).with_reason(reason));
            }
        }
    }

    info!(controller = %name, "controller stopped");
    bus.publish(Event::new(EventKind::ControllerStopped).with_controller(name));
}
