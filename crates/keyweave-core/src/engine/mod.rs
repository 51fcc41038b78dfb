//! Boundary to the external text-transformation engine.
//!
//! The engine is a black box with mutable internal state (the word being
//! composed, the shortcut table, feature flags).  None of its entry points are
//! safe to call concurrently, and they are reached from two threads: the
//! worker (key processing) and whichever thread applies settings.
//! [`SharedEngine`] is the single lock every call goes through.

pub mod mock;

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::domain::engine_result::EngineResult;
use crate::keymap::NeutralKey;

/// Typing method understood by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum InputMethod {
    #[default]
    Telex = 0,
    Vni = 1,
}

impl fmt::Display for InputMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Telex => f.write_str("Telex"),
            Self::Vni => f.write_str("VNI"),
        }
    }
}

/// Operations the pipeline and the settings collaborator need from the engine.
///
/// Configuration setters are fire-and-forget.  [`process_key`] is the hot path
/// and returns `None` when the engine produced no result at all (unreachable,
/// null answer), which callers treat exactly like [`EngineAction::None`].
///
/// [`process_key`]: TransformationEngine::process_key
/// [`EngineAction::None`]: crate::EngineAction::None
#[cfg_attr(test, mockall::automock)]
pub trait TransformationEngine: Send {
    fn initialize(&mut self);
    /// Discards the word currently being composed.
    fn clear(&mut self);
    /// Discards the current word and the word history used for restore.
    fn clear_all(&mut self);

    fn set_method(&mut self, method: InputMethod);
    fn set_enabled(&mut self, enabled: bool);
    fn set_modern_tone(&mut self, modern: bool);
    fn set_skip_w_shortcut(&mut self, skip: bool);
    fn set_esc_restore(&mut self, enabled: bool);
    fn set_free_tone(&mut self, enabled: bool);
    fn set_english_auto_restore(&mut self, enabled: bool);
    fn set_auto_capitalize(&mut self, enabled: bool);

    fn process_key(
        &mut self,
        key: NeutralKey,
        caps: bool,
        ctrl: bool,
        shift: bool,
    ) -> Option<EngineResult>;

    /// The word being composed, at most `max_len` characters.
    fn get_buffer(&mut self, max_len: usize) -> Vec<char>;
    /// Re-seeds the composition buffer with an existing word.
    fn restore_word(&mut self, word: &str);
    fn add_shortcut(&mut self, trigger: &str, replacement: &str);
    fn remove_shortcut(&mut self, trigger: &str);
    fn clear_shortcuts(&mut self);
}

/// Cloneable handle serialising every call into one engine instance.
///
/// The enabled flag is mirrored outside the lock so the hook thread can read
/// it without ever touching the engine.
#[derive(Clone)]
pub struct SharedEngine {
    inner: Arc<Mutex<Box<dyn TransformationEngine>>>,
    enabled: Arc<AtomicBool>,
}

impl SharedEngine {
    /// Wraps an engine.  The engine starts enabled.
    pub fn new(engine: impl TransformationEngine + 'static) -> Self {
        Self::from_boxed(Box::new(engine))
    }

    pub fn from_boxed(engine: Box<dyn TransformationEngine>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(engine)),
            enabled: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn initialize(&self) {
        self.inner.lock().initialize();
    }

    pub fn clear(&self) {
        self.inner.lock().clear();
    }

    pub fn clear_all(&self) {
        self.inner.lock().clear_all();
    }

    pub fn set_method(&self, method: InputMethod) {
        self.inner.lock().set_method(method);
    }

    /// Enables or disables transformation.
    ///
    /// The flag is stored while the engine lock is held, so a worker that
    /// observes `is_enabled() == true` and then takes the lock cannot run a key
    /// through an engine that has already been told to stop.
    pub fn set_enabled(&self, enabled: bool) {
        let mut engine = self.inner.lock();
        self.enabled.store(enabled, Ordering::Release);
        engine.set_enabled(enabled);
    }

    /// Lock-free read of the enabled flag.
    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }

    /// Read-only view of the enabled flag for code that must never touch the
    /// engine itself (the hook thread).
    pub fn enabled_flag(&self) -> EnabledFlag {
        EnabledFlag(Arc::clone(&self.enabled))
    }

    pub fn set_modern_tone(&self, modern: bool) {
        self.inner.lock().set_modern_tone(modern);
    }

    pub fn set_skip_w_shortcut(&self, skip: bool) {
        self.inner.lock().set_skip_w_shortcut(skip);
    }

    pub fn set_esc_restore(&self, enabled: bool) {
        self.inner.lock().set_esc_restore(enabled);
    }

    pub fn set_free_tone(&self, enabled: bool) {
        self.inner.lock().set_free_tone(enabled);
    }

    pub fn set_english_auto_restore(&self, enabled: bool) {
        self.inner.lock().set_english_auto_restore(enabled);
    }

    pub fn set_auto_capitalize(&self, enabled: bool) {
        self.inner.lock().set_auto_capitalize(enabled);
    }

    /// Runs one key through the engine.
    ///
    /// Returns `None` without calling the engine when transformation is
    /// disabled.  The flag is re-checked under the lock.
    pub fn process_key(
        &self,
        key: NeutralKey,
        caps: bool,
        ctrl: bool,
        shift: bool,
    ) -> Option<EngineResult> {
        let mut engine = self.inner.lock();
        if !self.is_enabled() {
            return None;
        }
        engine.process_key(key, caps, ctrl, shift)
    }

    pub fn get_buffer(&self, max_len: usize) -> String {
        self.inner.lock().get_buffer(max_len).into_iter().collect()
    }

    pub fn restore_word(&self, word: &str) {
        self.inner.lock().restore_word(word);
    }

    pub fn add_shortcut(&self, trigger: &str, replacement: &str) {
        self.inner.lock().add_shortcut(trigger, replacement);
    }

    pub fn remove_shortcut(&self, trigger: &str) {
        self.inner.lock().remove_shortcut(trigger);
    }

    pub fn clear_shortcuts(&self) {
        self.inner.lock().clear_shortcuts();
    }
}

/// See [`SharedEngine::enabled_flag`].
#[derive(Debug, Clone)]
pub struct EnabledFlag(Arc<AtomicBool>);

impl EnabledFlag {
    pub fn get(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

impl fmt::Debug for SharedEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedEngine")
            .field("enabled", &self.is_enabled())
            .finish_non_exhaustive()
    }
}
