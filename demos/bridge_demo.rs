//! # Example: bridge_demo
//!
//! A controller thread owns "UI state"; background services load data and hand it
//! back through the bridge.
//!
//! Demonstrates how to:
//! - Start a [`ControllerThread`] and wrap it in a [`ControllerBridge`].
//! - Run services through an [`ObservableExecutor`] with [`dispatch`].
//! - Push results onto the controller with [`on_complete`] + `run_later`.
//! - Block on a worker with [`wait_for`] and interrupt a wait.
//!
//! ## Flow
//! ```text
//! main ──► dispatch(pool, service) ──► worker thread: load()
//!                                          └─► on_complete ──► bridge.run_later(render)
//!                                                                   └─► controller thread
//! main ──► bridge.run_callable_and_wait(read state) ──► controller thread ──► value
//! ```
//!
//! ## Run
//! ```bash
//! RUST_LOG=debug cargo run --example bridge_demo
//! ```

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::EnvFilter;
use workbridge::{
    ControllerBridge, ControllerConfig, ControllerThread, Executor, ObservableConfig,
    ObservableExecutor, Outcome, Service, Worker, Workload, dispatch, on_complete, wait_for,
    wait_for_interruptibly,
};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_thread_names(true)
        .init();

    // 1. Controller thread and the state it owns.
    let controller = Arc::new(ControllerThread::start(ControllerConfig {
        thread_name: "ui".into(),
        ..ControllerConfig::default()
    })?);
    let bridge = ControllerBridge::new(controller.clone());
    let rows: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));

    // 2. Background loads, at most two at a time.
    let pool: Arc<dyn Executor> =
        Arc::new(ObservableExecutor::with_threads(ObservableConfig { max_concurrent: 2 }));
    let services: Vec<Service<String>> = (1..=4)
        .map(|i| {
            Service::new(
                format!("load-{i}"),
                Workload::call(move || {
                    thread::sleep(Duration::from_millis(50 * i));
                    Ok::<_, anyhow::Error>(format!("row {i}"))
                }),
            )
        })
        .collect();

    let workers: Vec<Worker<String>> = services
        .iter()
        .map(|svc| {
            let worker = dispatch(Some(&pool), svc);
            let ui = bridge.clone();
            let rows = Arc::clone(&rows);
            on_complete(&worker, move |outcome: Outcome<String>| {
                if let Outcome::Success(row) = outcome {
                    let _ = ui.run_later(move || {
                        info!(%row, "render");
                        rows.lock().push(row);
                        Ok::<_, anyhow::Error>(())
                    });
                }
            });
            worker
        })
        .collect();

    // 3. Wait for every load.
    for worker in &workers {
        let row = wait_for(worker)?;
        info!(worker = worker.name(), %row, "loaded");
    }

    // 4. Read the controller-owned state from here.
    let state = Arc::clone(&rows);
    let rendered = bridge.run_callable_and_wait(move || Ok::<_, anyhow::Error>(state.lock().len()))?;
    info!(rendered, "rows rendered on the controller thread");

    // 5. A wait can be abandoned without touching the work.
    let never: Worker<()> = Worker::new("never");
    let interrupt = CancellationToken::new();
    let canceller = interrupt.clone();
    thread::spawn(move || {
        thread::sleep(Duration::from_millis(20));
        canceller.cancel();
    });
    let err = wait_for_interruptibly(&never, &interrupt).unwrap_err();
    info!(error = err.as_label(), state = never.state().as_label(), "wait interrupted");

    controller.stop();
    controller.join();
    info!(stats = ?controller.stats(), "controller stopped");
    Ok(())
}
