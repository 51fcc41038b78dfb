//! ProcessKeysUseCase: what the worker does with one dequeued event.
//!
//! For a key: translate it, run it through the engine, and either inject the
//! engine's replacement (strategy chosen by the classifier) or re-type the
//! original key, because the hook already swallowed it.  For a buffer clear:
//! tell the engine to drop its composition.

use keyweave_core::{KeyEvent, KeyTranslator, PipelineEvent, SharedEngine};
use thiserror::Error;
use tracing::trace;

use super::classify_app::{AppClassifier, ForegroundQuery};
use super::inject_text::{InjectionError, Injector};
use super::worker::EventHandler;

/// Error type for per-event processing.
#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("injection failed for VK 0x{vk_code:02X}: {source}")]
    Injection {
        vk_code: u16,
        #[source]
        source: InjectionError,
    },
}

/// Per-event pipeline stage run on the worker thread.
pub struct ProcessKeysUseCase<P: ForegroundQuery> {
    engine: SharedEngine,
    classifier: AppClassifier<P>,
    injector: Injector,
}

impl<P: ForegroundQuery> ProcessKeysUseCase<P> {
    pub fn new(engine: SharedEngine, classifier: AppClassifier<P>, injector: Injector) -> Self {
        Self { engine, classifier, injector }
    }

    pub fn classifier(&self) -> &AppClassifier<P> {
        &self.classifier
    }

    pub fn classifier_mut(&mut self) -> &mut AppClassifier<P> {
        &mut self.classifier
    }

    /// Runs one captured key through the engine and delivers the outcome.
    ///
    /// # Errors
    ///
    /// Returns [`ProcessError::Injection`] when the OS rejects synthetic input.
    /// The event is not retried.
    pub fn process_key(&mut self, event: KeyEvent) -> Result<(), ProcessError> {
        let Some(key) = KeyTranslator::translate(event.vk_code) else {
            trace!(vk = event.vk_code, "unmapped key ignored");
            return Ok(());
        };

        let result = self.engine.process_key(key, event.caps_lock, false, event.shift);

        let outcome = match result {
            Some(result) if result.requires_injection() => {
                let strategy = self.classifier.classify();
                trace!(
                    vk = event.vk_code,
                    action = ?result.action,
                    backspaces = result.backspace_count,
                    ?strategy,
                    latency_us = event.captured_at.elapsed().as_micros() as u64,
                    "engine replacement"
                );
                self.injector.inject(&result.output_chars, result.backspace_count, strategy)
            }
            // No transformation, disabled since capture, or no answer at all.
            _ => self.injector.send_key(event.vk_code, event.shift),
        };
        outcome.map_err(|source| ProcessError::Injection { vk_code: event.vk_code, source })
    }
}

impl<P: ForegroundQuery> EventHandler for ProcessKeysUseCase<P> {
    type Error = ProcessError;

    fn handle(&mut self, event: PipelineEvent) -> Result<(), ProcessError> {
        match event {
            PipelineEvent::Key(key) => self.process_key(key),
            PipelineEvent::ClearBuffer => {
                self.engine.clear();
                Ok(())
            }
        }
    }
}
