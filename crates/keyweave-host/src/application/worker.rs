//! The worker thread that drains the event queue.
//!
//! Exactly one thread consumes the queue, so events are processed in the order
//! the hook captured them.  Cancellation is cooperative: the loop polls a flag
//! once per dequeue, and the dequeue timeout bounds how long a stop request
//! can go unnoticed.
//!
//! A failure or panic while handling one event is logged and the event is
//! dropped.  The loop keeps running.

use std::fmt::Display;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError};
use keyweave_core::{EventQueue, PipelineEvent};
use parking_lot::Mutex;
use thiserror::Error;
use tracing::{debug, error, info, warn};

/// Thread name, visible in debuggers and panic messages.
pub const WORKER_THREAD_NAME: &str = "keyweave-worker";

/// Processes one dequeued event on the worker thread.
pub trait EventHandler: Send {
    type Error: Display;

    fn handle(&mut self, event: PipelineEvent) -> Result<(), Self::Error>;
}

/// Error type for worker lifecycle operations.
#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("failed to spawn worker thread: {0}")]
    Spawn(#[source] std::io::Error),
}

/// Worker timing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerConfig {
    /// Longest single wait inside the queue; bounds stop latency.
    pub dequeue_timeout: Duration,
    /// How long `stop` waits for the thread before giving up on it.
    pub stop_timeout: Duration,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            dequeue_timeout: Duration::from_millis(1),
            stop_timeout: Duration::from_millis(1000),
        }
    }
}

struct RunningThread {
    handle: JoinHandle<()>,
    /// Disconnects when the thread exits, even by unwinding.
    done_rx: Receiver<()>,
}

/// Owns the worker thread.
pub struct Worker<H: EventHandler + 'static> {
    queue: Arc<EventQueue>,
    handler: Arc<Mutex<H>>,
    config: WorkerConfig,
    running: Arc<AtomicBool>,
    thread: Option<RunningThread>,
}

impl<H: EventHandler + 'static> Worker<H> {
    pub fn new(queue: Arc<EventQueue>, handler: H, config: WorkerConfig) -> Self {
        Self {
            queue,
            handler: Arc::new(Mutex::new(handler)),
            config,
            running: Arc::new(AtomicBool::new(false)),
            thread: None,
        }
    }

    /// Shared access to the handler, e.g. for diagnostics.
    ///
    /// The worker thread holds this lock while it processes an event.
    pub fn handler(&self) -> Arc<Mutex<H>> {
        Arc::clone(&self.handler)
    }

    /// `true` between a successful `start` and the matching `stop`.
    pub fn is_running(&self) -> bool {
        self.thread.is_some()
    }

    /// Spawns the worker thread.  A second call while running does nothing.
    ///
    /// # Errors
    ///
    /// Returns [`WorkerError::Spawn`] if the OS refuses to create the thread.
    pub fn start(&mut self) -> Result<(), WorkerError> {
        if self.thread.is_some() {
            debug!("worker already running");
            return Ok(());
        }

        self.running.store(true, Ordering::Release);
        let (done_tx, done_rx) = bounded::<()>(0);
        let queue = Arc::clone(&self.queue);
        let handler = Arc::clone(&self.handler);
        let running = Arc::clone(&self.running);
        let timeout = self.config.dequeue_timeout;

        let handle = thread::Builder::new()
            .name(WORKER_THREAD_NAME.to_string())
            .spawn(move || {
                let _done = done_tx;
                run_loop(&queue, &handler, &running, timeout);
            })
            .map_err(|e| {
                self.running.store(false, Ordering::Release);
                WorkerError::Spawn(e)
            })?;

        self.thread = Some(RunningThread { handle, done_rx });
        info!("worker started");
        Ok(())
    }

    /// Signals the loop to exit and waits up to `stop_timeout` for it.
    ///
    /// Returns `false` if the thread did not exit in time; it is then
    /// detached and finishes on its own.  Calling `stop` when not running
    /// returns `true`.
    pub fn stop(&mut self) -> bool {
        let Some(thread) = self.thread.take() else {
            return true;
        };
        self.running.store(false, Ordering::Release);

        match thread.done_rx.recv_timeout(self.config.stop_timeout) {
            Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                if thread.handle.join().is_err() {
                    error!("worker thread terminated by panic");
                }
                info!("worker stopped");
                true
            }
            Err(RecvTimeoutError::Timeout) => {
                warn!(
                    timeout_ms = self.config.stop_timeout.as_millis() as u64,
                    "worker thread did not exit in time; detaching"
                );
                false
            }
        }
    }
}

impl<H: EventHandler + 'static> Drop for Worker<H> {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run_loop<H: EventHandler>(
    queue: &EventQueue,
    handler: &Mutex<H>,
    running: &AtomicBool,
    timeout: Duration,
) {
    debug!("worker loop entered");
    while running.load(Ordering::Acquire) {
        let Some(event) = queue.try_dequeue(timeout) else {
            if queue.is_disposed() {
                debug!("queue disposed; worker loop exiting");
                break;
            }
            continue;
        };

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| handler.lock().handle(event)));
        match outcome {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!(error = %e, ?event, "event dropped after processing failure"),
            Err(_) => error!(?event, "event handler panicked; event dropped"),
        }
    }
    debug!("worker loop exited");
}
