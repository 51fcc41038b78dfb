//! Pipeline: owns the queue, the worker and the hook, and sequences them.
//!
//! Start order is worker first, then hook, so the first captured key already
//! has a consumer.  Shutdown runs in this order:
//!
//! 1. stop the worker (no further engine calls or injection),
//! 2. remove the hook (no further enqueues),
//! 3. dispose the queue.
//!
//! Shutdown is idempotent and also runs on drop, so every exit path of the
//! owning scope releases the hook.  A shut-down pipeline cannot be restarted.

use std::sync::Arc;

use crossbeam_channel::{unbounded, Receiver};
use keyweave_core::{EnabledFlag, EventQueue};
use thiserror::Error;
use tracing::{info, warn};

use super::filter_keys::{HookError, HookNotice, KeyFilter, KeyboardHookSource};
use super::worker::{EventHandler, Worker, WorkerConfig, WorkerError};

/// Error type for pipeline lifecycle operations.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Worker(#[from] WorkerError),
    #[error(transparent)]
    Hook(#[from] HookError),
    #[error("pipeline has been shut down")]
    ShutDown,
}

/// Sizing and timing for a [`Pipeline`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineConfig {
    pub queue_capacity: usize,
    pub worker: WorkerConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            queue_capacity: keyweave_core::queue::DEFAULT_CAPACITY,
            worker: WorkerConfig::default(),
        }
    }
}

pub struct Pipeline<H: EventHandler + 'static> {
    queue: Arc<EventQueue>,
    filter: Arc<KeyFilter>,
    notices: Receiver<HookNotice>,
    worker: Worker<H>,
    hook: Box<dyn KeyboardHookSource>,
    shut_down: bool,
}

impl<H: EventHandler + 'static> Pipeline<H> {
    /// Wires a pipeline.  Nothing runs until [`Pipeline::start`].
    ///
    /// `enabled` is the engine's enabled flag, read by the hook on every key.
    pub fn new(
        handler: H,
        enabled: EnabledFlag,
        hook: Box<dyn KeyboardHookSource>,
        config: PipelineConfig,
    ) -> Self {
        let queue = Arc::new(EventQueue::new(config.queue_capacity));
        let (notice_tx, notices) = unbounded();
        let filter = Arc::new(KeyFilter::new(Arc::clone(&queue), enabled, notice_tx));
        let worker = Worker::new(Arc::clone(&queue), handler, config.worker);
        Self { queue, filter, notices, worker, hook, shut_down: false }
    }

    /// The filter the hook consults; used to configure the hotkey.
    pub fn filter(&self) -> Arc<KeyFilter> {
        Arc::clone(&self.filter)
    }

    /// Hotkey notifications raised by the hook thread.
    pub fn notices(&self) -> Receiver<HookNotice> {
        self.notices.clone()
    }

    pub fn queue(&self) -> Arc<EventQueue> {
        Arc::clone(&self.queue)
    }

    pub fn worker(&self) -> &Worker<H> {
        &self.worker
    }

    pub fn is_running(&self) -> bool {
        self.worker.is_running() && self.hook.is_active()
    }

    /// Starts the worker, then installs the hook.
    ///
    /// Calling `start` on a running pipeline does nothing.  If the hook cannot
    /// be installed the worker is stopped again and the error returned; the
    /// pipeline may be started again later.
    ///
    /// # Errors
    ///
    /// [`PipelineError::ShutDown`] after [`Pipeline::shutdown`], otherwise the
    /// worker or hook error.
    pub fn start(&mut self) -> Result<(), PipelineError> {
        if self.shut_down {
            return Err(PipelineError::ShutDown);
        }
        self.worker.start()?;
        if let Err(e) = self.hook.start(Arc::clone(&self.filter)) {
            warn!(error = %e, "hook installation failed; stopping worker");
            self.worker.stop();
            return Err(e.into());
        }
        info!("pipeline started");
        Ok(())
    }

    /// Tears the pipeline down in the documented order.  Idempotent.
    pub fn shutdown(&mut self) {
        if self.shut_down {
            return;
        }
        self.shut_down = true;

        if !self.worker.stop() {
            warn!("worker did not stop in time during shutdown");
        }
        self.hook.stop();
        self.queue.dispose();

        let dropped = self.queue.dropped_count();
        if dropped > 0 {
            warn!(dropped, "events were dropped by a full queue during this session");
        }
        info!("pipeline shut down");
    }
}

impl<H: EventHandler + 'static> Drop for Pipeline<H> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use keyweave_core::engine::mock::ScriptedEngine;
    use keyweave_core::{PipelineEvent, SharedEngine};
    use parking_lot::Mutex;

    use super::*;
    use crate::application::filter_keys::HookVerdict;
    use crate::infrastructure::input_capture::mock::MockKeyboardHook;

    #[derive(Default)]
    struct Collect(Arc<Mutex<Vec<PipelineEvent>>>);

    impl EventHandler for Collect {
        type Error = String;

        fn handle(&mut self, event: PipelineEvent) -> Result<(), String> {
            self.0.lock().push(event);
            Ok(())
        }
    }

    /// A hook whose installation always fails.
    struct BrokenHook;

    impl KeyboardHookSource for BrokenHook {
        fn start(&mut self, _filter: Arc<KeyFilter>) -> Result<(), HookError> {
            Err(HookError::InstallFailed("denied".into()))
        }

        fn stop(&mut self) {}

        fn is_active(&self) -> bool {
            false
        }
    }

    fn enabled() -> EnabledFlag {
        SharedEngine::new(ScriptedEngine::new()).enabled_flag()
    }

    #[test]
    fn test_start_installs_hook_once_and_events_reach_handler() {
        // Arrange
        let seen = Arc::new(Mutex::new(Vec::new()));
        let hook = MockKeyboardHook::new();
        let mut pipeline = Pipeline::new(
            Collect(Arc::clone(&seen)),
            enabled(),
            Box::new(hook.clone()),
            PipelineConfig::default(),
        );

        // Act
        pipeline.start().unwrap();
        pipeline.start().unwrap();
        let verdict = hook.press(0x41);
        let deadline = Instant::now() + Duration::from_secs(2);
        while seen.lock().is_empty() && Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(1));
        }

        // Assert
        assert!(pipeline.is_running());
        assert_eq!(hook.start_count(), 1);
        assert_eq!(verdict, Some(HookVerdict::Consume));
        assert_eq!(seen.lock().len(), 1);
    }

    #[test]
    fn test_shutdown_is_idempotent_and_disposes_queue() {
        // Arrange
        let hook = MockKeyboardHook::new();
        let mut pipeline = Pipeline::new(
            Collect::default(),
            enabled(),
            Box::new(hook.clone()),
            PipelineConfig::default(),
        );
        pipeline.start().unwrap();
        let queue = pipeline.queue();

        // Act
        pipeline.shutdown();
        pipeline.shutdown();

        // Assert
        assert!(!pipeline.is_running());
        assert_eq!(hook.stop_count(), 1);
        assert!(queue.is_disposed());
        assert!(!pipeline.worker().is_running());
    }

    #[test]
    fn test_start_after_shutdown_is_rejected() {
        let mut pipeline = Pipeline::new(
            Collect::default(),
            enabled(),
            Box::new(MockKeyboardHook::new()),
            PipelineConfig::default(),
        );
        pipeline.shutdown();

        assert!(matches!(pipeline.start(), Err(PipelineError::ShutDown)));
    }

    #[test]
    fn test_hook_failure_stops_worker_and_is_reported() {
        // Arrange
        let mut pipeline = Pipeline::new(
            Collect::default(),
            enabled(),
            Box::new(BrokenHook),
            PipelineConfig::default(),
        );

        // Act
        let result = pipeline.start();

        // Assert
        assert!(matches!(result, Err(PipelineError::Hook(HookError::InstallFailed(_)))));
        assert!(!pipeline.worker().is_running());
    }

    #[test]
    fn test_drop_releases_hook() {
        // Arrange
        let hook = MockKeyboardHook::new();
        let mut pipeline = Pipeline::new(
            Collect::default(),
            enabled(),
            Box::new(hook.clone()),
            PipelineConfig::default(),
        );
        pipeline.start().unwrap();

        // Act
        drop(pipeline);

        // Assert
        assert!(!hook.is_active());
        assert_eq!(hook.press(0x41), None);
    }
}
