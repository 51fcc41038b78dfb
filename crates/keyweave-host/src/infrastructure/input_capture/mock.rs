//! Mock keyboard hook for tests.
//!
//! Stands in for the OS hook: tests call [`MockKeyboardHook::press`] to
//! deliver a key-down to the installed filter and get the verdict the real
//! hook would have returned to the OS.

use std::sync::Arc;

use keyweave_core::ModifierState;
use parking_lot::Mutex;

use super::{HookError, KeyboardHookSource};
use crate::application::filter_keys::{HookVerdict, KeyFilter};

#[derive(Default)]
struct State {
    filter: Option<Arc<KeyFilter>>,
    starts: u32,
    stops: u32,
}

/// A [`KeyboardHookSource`] driven by the test.
///
/// Clones share state, so a test can keep a handle after moving one clone
/// into a pipeline.
#[derive(Clone, Default)]
pub struct MockKeyboardHook {
    state: Arc<Mutex<State>>,
}

impl MockKeyboardHook {
    pub fn new() -> Self {
        Self::default()
    }

    /// A physical key-down with no modifiers held.
    ///
    /// Returns `None` when the hook is not installed; the OS would deliver
    /// the key normally.
    pub fn press(&self, vk_code: u16) -> Option<HookVerdict> {
        self.press_with(vk_code, ModifierState::default())
    }

    pub fn press_with(&self, vk_code: u16, mods: ModifierState) -> Option<HookVerdict> {
        self.deliver(vk_code, 0, false, mods)
    }

    /// A key-down carrying the OS injected flag and the given extra info.
    pub fn press_injected(&self, vk_code: u16, extra_info: usize) -> Option<HookVerdict> {
        self.deliver(vk_code, extra_info, true, ModifierState::default())
    }

    /// Number of successful `start` calls that installed the hook.
    pub fn start_count(&self) -> u32 {
        self.state.lock().starts
    }

    /// Number of `stop` calls that removed an installed hook.
    pub fn stop_count(&self) -> u32 {
        self.state.lock().stops
    }

    fn deliver(
        &self,
        vk_code: u16,
        extra_info: usize,
        injected: bool,
        mods: ModifierState,
    ) -> Option<HookVerdict> {
        // Clone out so the filter runs without the mock's lock held.
        let filter = self.state.lock().filter.clone()?;
        Some(filter.on_key_down(vk_code, extra_info, injected, mods))
    }
}

impl KeyboardHookSource for MockKeyboardHook {
    fn start(&mut self, filter: Arc<KeyFilter>) -> Result<(), HookError> {
        let mut state = self.state.lock();
        if state.filter.is_none() {
            state.filter = Some(filter);
            state.starts += 1;
        }
        Ok(())
    }

    fn stop(&mut self) {
        let mut state = self.state.lock();
        if state.filter.take().is_some() {
            state.stops += 1;
        }
    }

    fn is_active(&self) -> bool {
        self.state.lock().filter.is_some()
    }
}

#[cfg(test)]
mod tests {
    use crossbeam_channel::unbounded;
    use keyweave_core::{EventQueue, PipelineEvent, SharedEngine};
    use keyweave_core::engine::mock::ScriptedEngine;

    use super::*;

    fn filter() -> (Arc<KeyFilter>, Arc<EventQueue>) {
        let queue = Arc::new(EventQueue::new(16));
        let engine = SharedEngine::new(ScriptedEngine::new());
        let (tx, _rx) = unbounded();
        (Arc::new(KeyFilter::new(Arc::clone(&queue), engine.enabled_flag(), tx)), queue)
    }

    #[test]
    fn test_press_before_start_is_not_intercepted() {
        let hook = MockKeyboardHook::new();

        assert_eq!(hook.press(0x41), None);
    }

    #[test]
    fn test_press_after_start_reaches_filter() {
        // Arrange
        let (filter, queue) = filter();
        let mut hook = MockKeyboardHook::new();
        hook.start(filter).unwrap();

        // Act
        let verdict = hook.press(0x41);

        // Assert
        assert_eq!(verdict, Some(HookVerdict::Consume));
        assert!(matches!(
            queue.try_dequeue(std::time::Duration::ZERO),
            Some(PipelineEvent::Key(k)) if k.vk_code == 0x41
        ));
    }

    #[test]
    fn test_start_and_stop_are_idempotent() {
        // Arrange
        let (filter, _queue) = filter();
        let mut hook = MockKeyboardHook::new();

        // Act
        hook.start(Arc::clone(&filter)).unwrap();
        hook.start(filter).unwrap();
        hook.stop();
        hook.stop();

        // Assert
        assert_eq!(hook.start_count(), 1);
        assert_eq!(hook.stop_count(), 1);
        assert!(!hook.is_active());
    }
}
