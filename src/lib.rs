//! # workbridge
//!
//! **workbridge** connects worker threads with a single controller thread.
//!
//! Background work runs on workers whose lifecycle ([`WorkerState`]) is observable.
//! The crate turns that lifecycle into things a thread can act on: a monotone
//! "is done" signal, one-shot completion callbacks, a blocking wait, and blocking
//! calls that run a closure on the controller thread and hand back its result.
//!
//! ## Architecture
//! ```text
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//!     │  Service #1  │   │  Service #2  │   │  Service #3  │
//!     │  (Workload)  │   │  (Workload)  │   │  (Workload)  │
//!     └──────┬───────┘   └──────┬───────┘   └──────┬───────┘
//!            ▼                  ▼                  ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  dispatch(executor, service)                                      │
//! │  - ObservableExecutor::submit (queue + concurrency limit)         │
//! │  - otherwise: attach executor, Service::start                     │
//! └──────┬──────────────────┬──────────────────┬──────────────────────┘
//!        ▼                  ▼                  ▼
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//!     │  Worker<T>   │   │  Worker<T>   │   │  Worker<T>   │
//!     │ Ready ─► ... │   │ Ready ─► ... │   │ Ready ─► ... │
//!     └┬─────────────┘   └┬─────────────┘   └┬─────────────┘
//!      │ state listeners  │                  │
//!      ▼                  ▼                  ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  observe_terminal ─► TerminalSignal (false ─► true, once)         │
//! │      ├─► on_complete / then     (callbacks, Outcome<T>)           │
//! │      └─► wait_for               (mutex + condvar, interruptible)  │
//! └───────────────────────────────────────────────────────────────────┘
//!
//!  any thread ──► ControllerBridge ──► ControllerThread (FIFO, one thread)
//!                     ▲                        │
//!                     └──── wait_terminal ◄────┘   Bus ─► Event stream
//! ```
//!
//! ## Features
//! | Area            | Description                                              | Key types / functions                          |
//! |-----------------|----------------------------------------------------------|------------------------------------------------|
//! | **Workers**     | Observable lifecycle with ordered, synchronous delivery   | [`Worker`], [`WorkerState`], [`Outcome`]       |
//! | **Observation** | Terminal signal, callbacks, blocking wait                | [`observe_terminal`], [`on_complete`], [`wait_for`] |
//! | **Controller**  | Dedicated FIFO thread and blocking bridge onto it        | [`ControllerThread`], [`ControllerBridge`]     |
//! | **Execution**   | Workloads, services, executors and dispatch              | [`Workload`], [`Service`], [`dispatch`]        |
//! | **Events**      | Controller lifecycle broadcast                           | [`Bus`], [`Event`], [`EventKind`]              |
//! | **Errors**      | Typed errors for waits, workloads and transitions        | [`BridgeError`], [`TaskError`]                 |
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use workbridge::{ControllerBridge, ControllerConfig, ControllerThread, Service, Workload, on_complete};
//!
//! let controller = Arc::new(ControllerThread::start(ControllerConfig::default()).unwrap());
//! let bridge = ControllerBridge::new(controller.clone());
//!
//! // Background work on its own thread.
//! let svc = Service::new("fetch", Workload::call(|| Ok::<_, std::io::Error>(vec![1, 2, 3])));
//! let worker = svc.start();
//!
//! // Hand the result to the controller thread once it is there.
//! let ui = bridge.clone();
//! let (tx, rx) = std::sync::mpsc::channel();
//! on_complete(&worker, move |outcome| {
//!     let rows = outcome.success().unwrap_or_default();
//!     let _ = ui.run_later(move || Ok::<_, std::io::Error>(tx.send(rows.len())));
//! });
//!
//! assert_eq!(rx.recv().unwrap(), 3);
//! ```

mod controller;
mod error;
mod events;
mod executors;
mod observe;
mod tasks;
mod worker;

// ---- Public re-exports ----

pub use controller::{
    ControllerBridge, ControllerConfig, ControllerStats, ControllerThread, Dispatcher,
    InlineDispatcher,
};
pub use error::{BridgeError, Cause, TaskError, TransitionError, cause};
pub use events::{Bus, Event, EventKind};
pub use executors::{
    Executor, Job, ObservableConfig, ObservableExecutor, ThreadExecutor, dispatch,
};
pub use observe::{
    SignalSubscription, TerminalSignal, observe_terminal, on_complete, then, wait_for,
    wait_for_interruptibly, wait_until_terminal,
};
pub use tasks::{Service, Task, TaskFn, TaskRef, UnitOutput, Workload};
pub use worker::{Outcome, StateSubscription, WeakWorker, Worker, WorkerState};
