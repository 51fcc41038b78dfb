//! Deterministic stand-in for the transformation engine.
//!
//! [`ScriptedEngine`] answers `process_key` from a fixed table keyed by neutral
//! keycode, so a test can state "key A produces `Send(0, "a")`" up front.
//! Keys without an entry yield `Some(EngineResult::none())`; keys registered
//! with [`ScriptedEngine::with_null`] yield `None` (no answer at all).
//!
//! Clones share state.  Keep a clone for assertions after moving the original into
//! a [`SharedEngine`](super::SharedEngine).

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use super::{InputMethod, TransformationEngine};
use crate::domain::engine_result::EngineResult;
use crate::keymap::NeutralKey;

/// One recorded `process_key` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessedKey {
    pub key: NeutralKey,
    pub caps: bool,
    pub ctrl: bool,
    pub shift: bool,
}

/// Engine-side configuration as last set through the trait.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineSettings {
    pub initialized: bool,
    pub method: InputMethod,
    pub enabled: bool,
    pub modern_tone: bool,
    pub skip_w_shortcut: bool,
    pub esc_restore: bool,
    pub free_tone: bool,
    pub english_auto_restore: bool,
    pub auto_capitalize: bool,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            initialized: false,
            method: InputMethod::Telex,
            enabled: true,
            modern_tone: false,
            skip_w_shortcut: false,
            esc_restore: false,
            free_tone: false,
            english_auto_restore: false,
            auto_capitalize: false,
        }
    }
}

#[derive(Default)]
struct State {
    script: HashMap<NeutralKey, Option<EngineResult>>,
    processed: Vec<ProcessedKey>,
    clears: usize,
    clear_alls: usize,
    settings: EngineSettings,
    buffer: Vec<char>,
    shortcuts: HashMap<String, String>,
}

/// Scripted, recording engine.  See the module docs.
#[derive(Clone, Default)]
pub struct ScriptedEngine {
    state: Arc<Mutex<State>>,
    busy: Arc<AtomicBool>,
    reentered: Arc<AtomicBool>,
}

impl ScriptedEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answers `key` with `result` every time it is processed.
    pub fn with_response(self, key: NeutralKey, result: EngineResult) -> Self {
        self.state.lock().script.insert(key, Some(result));
        self
    }

    /// Answers `key` with no result at all.
    pub fn with_null(self, key: NeutralKey) -> Self {
        self.state.lock().script.insert(key, None);
        self
    }

    pub fn processed(&self) -> Vec<ProcessedKey> {
        self.state.lock().processed.clone()
    }

    /// Neutral keys processed so far, in call order.
    pub fn processed_keys(&self) -> Vec<NeutralKey> {
        self.state.lock().processed.iter().map(|p| p.key).collect()
    }

    pub fn clear_count(&self) -> usize {
        self.state.lock().clears
    }

    pub fn clear_all_count(&self) -> usize {
        self.state.lock().clear_alls
    }

    pub fn settings(&self) -> EngineSettings {
        self.state.lock().settings.clone()
    }

    pub fn shortcuts(&self) -> HashMap<String, String> {
        self.state.lock().shortcuts.clone()
    }

    /// `true` if two trait calls ever overlapped.
    pub fn saw_reentrant_call(&self) -> bool {
        self.reentered.load(Ordering::SeqCst)
    }

    fn enter(&self) -> CallGuard<'_> {
        if self.busy.swap(true, Ordering::SeqCst) {
            self.reentered.store(true, Ordering::SeqCst);
        }
        CallGuard { busy: &self.busy }
    }
}

struct CallGuard<'a> {
    busy: &'a AtomicBool,
}

impl Drop for CallGuard<'_> {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::SeqCst);
    }
}

impl TransformationEngine for ScriptedEngine {
    fn initialize(&mut self) {
        let _call = self.enter();
        self.state.lock().settings.initialized = true;
    }

    fn clear(&mut self) {
        let _call = self.enter();
        let mut state = self.state.lock();
        state.clears += 1;
        state.buffer.clear();
    }

    fn clear_all(&mut self) {
        let _call = self.enter();
        let mut state = self.state.lock();
        state.clear_alls += 1;
        state.buffer.clear();
    }

    fn set_method(&mut self, method: InputMethod) {
        let _call = self.enter();
        self.state.lock().settings.method = method;
    }

    fn set_enabled(&mut self, enabled: bool) {
        let _call = self.enter();
        self.state.lock().settings.enabled = enabled;
    }

    fn set_modern_tone(&mut self, modern: bool) {
        let _call = self.enter();
        self.state.lock().settings.modern_tone = modern;
    }

    fn set_skip_w_shortcut(&mut self, skip: bool) {
        let _call = self.enter();
        self.state.lock().settings.skip_w_shortcut = skip;
    }

    fn set_esc_restore(&mut self, enabled: bool) {
        let _call = self.enter();
        self.state.lock().settings.esc_restore = enabled;
    }

    fn set_free_tone(&mut self, enabled: bool) {
        let _call = self.enter();
        self.state.lock().settings.free_tone = enabled;
    }

    fn set_english_auto_restore(&mut self, enabled: bool) {
        let _call = self.enter();
        self.state.lock().settings.english_auto_restore = enabled;
    }

    fn set_auto_capitalize(&mut self, enabled: bool) {
        let _call = self.enter();
        self.state.lock().settings.auto_capitalize = enabled;
    }

    fn process_key(
        &mut self,
        key: NeutralKey,
        caps: bool,
        ctrl: bool,
        shift: bool,
    ) -> Option<EngineResult> {
        let _call = self.enter();
        let mut state = self.state.lock();
        state.processed.push(ProcessedKey { key, caps, ctrl, shift });
        let answer = match state.script.get(&key) {
            Some(scripted) => scripted.clone(),
            None => Some(EngineResult::none()),
        };
        if let Some(result) = &answer {
            state.buffer.extend(result.output_chars.iter().copied());
        }
        answer
    }

    fn get_buffer(&mut self, max_len: usize) -> Vec<char> {
        let _call = self.enter();
        self.state.lock().buffer.iter().take(max_len).copied().collect()
    }

    fn restore_word(&mut self, word: &str) {
        let _call = self.enter();
        let mut state = self.state.lock();
        state.buffer = word.chars().collect();
    }

    fn add_shortcut(&mut self, trigger: &str, replacement: &str) {
        let _call = self.enter();
        self.state
            .lock()
            .shortcuts
            .insert(trigger.to_string(), replacement.to_string());
    }

    fn remove_shortcut(&mut self, trigger: &str) {
        let _call = self.enter();
        self.state.lock().shortcuts.remove(trigger);
    }

    fn clear_shortcuts(&mut self) {
        let _call = self.enter();
        self.state.lock().shortcuts.clear();
    }
}
