//! FilterKeysUseCase: the per-key-down decision made inside the OS hook.
//!
//! This is everything the hook callback does besides talking to the OS.
//! Keeping it here, free of Win32 types, lets the whole decision table run in
//! unit tests.
//!
//! # Decision order
//!
//! 1. Our own synthetic events (marker) and anything flagged as injected by
//!    another program pass through untouched.
//! 2. The toggle hotkey, when set and armed, is consumed and announced.
//! 3. While transformation is disabled every other key passes through.
//! 4. Ctrl/Alt chords pass through.  Ctrl also clears the composition.
//! 5. Tab and Escape clear the composition and pass through.
//! 6. Relevant keys are queued for the worker and consumed.
//! 7. Everything else passes through.
//!
//! The hook thread never calls the engine.  Buffer clears travel through the
//! queue as [`PipelineEvent::ClearBuffer`] and are applied by the worker.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;

use crossbeam_channel::Sender;
use keyweave_core::domain::marker::is_self_injected;
use keyweave_core::{
    EnabledFlag, EventQueue, KeyEvent, KeyTranslator, KeyboardShortcut, ModifierState,
    PipelineEvent,
};
use thiserror::Error;

/// Error type for hook lifecycle operations.
#[derive(Debug, Error)]
pub enum HookError {
    #[error("failed to install keyboard hook: {0}")]
    InstallFailed(String),
    #[error("a keyboard hook is already active in this process")]
    AlreadyActive,
    #[error("keyboard hooks are not supported on this platform")]
    UnsupportedPlatform,
}

/// A source of physical key-downs that reports each one to a [`KeyFilter`]
/// and applies its verdict.
pub trait KeyboardHookSource: Send {
    /// Installs the hook.  Calling `start` on an active source does nothing.
    fn start(&mut self, filter: Arc<KeyFilter>) -> Result<(), HookError>;

    /// Removes the hook and waits for its thread.  Idempotent.
    fn stop(&mut self);

    fn is_active(&self) -> bool;
}

/// What the hook callback should tell the OS about the current key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookVerdict {
    /// Hand the key to the next hook / the focused application.
    PassThrough,
    /// Swallow the key; nothing downstream sees it.
    Consume,
}

/// Out-of-band notifications from the hook thread to the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookNotice {
    HotkeyTriggered,
}

/// The hook's decision logic plus the state it reads on every key-down.
///
/// All fields are lock-free so the hook thread never waits.
pub struct KeyFilter {
    queue: Arc<EventQueue>,
    enabled: EnabledFlag,
    /// `KeyboardShortcut::pack` form; 0 means no hotkey.
    hotkey: AtomicU32,
    hotkey_armed: AtomicBool,
    notices: Sender<HookNotice>,
}

impl KeyFilter {
    pub fn new(queue: Arc<EventQueue>, enabled: EnabledFlag, notices: Sender<HookNotice>) -> Self {
        Self {
            queue,
            enabled,
            hotkey: AtomicU32::new(0),
            hotkey_armed: AtomicBool::new(true),
            notices,
        }
    }

    /// Replaces the toggle hotkey.  `None` removes it.
    pub fn set_hotkey(&self, hotkey: Option<KeyboardShortcut>) {
        let packed = hotkey.map(|h| h.pack()).unwrap_or(0);
        self.hotkey.store(packed, Ordering::Release);
    }

    pub fn hotkey(&self) -> Option<KeyboardShortcut> {
        KeyboardShortcut::unpack(self.hotkey.load(Ordering::Acquire))
    }

    /// Arms or disarms hotkey matching without removing the hotkey.
    ///
    /// The settings UI disarms it while recording a new combination so the
    /// old one does not fire.
    pub fn set_hotkey_enabled(&self, armed: bool) {
        self.hotkey_armed.store(armed, Ordering::Release);
    }

    pub fn hotkey_enabled(&self) -> bool {
        self.hotkey_armed.load(Ordering::Acquire)
    }

    /// Decides what happens to one key-down.
    ///
    /// `extra_info` is the OS per-event auxiliary field; `injected` is the OS
    /// "software generated" flag.  `mods` must be sampled synchronously by the
    /// caller.
    pub fn on_key_down(
        &self,
        vk_code: u16,
        extra_info: usize,
        injected: bool,
        mods: ModifierState,
    ) -> HookVerdict {
        if is_self_injected(extra_info) || injected {
            return HookVerdict::PassThrough;
        }

        if self.hotkey_matches(vk_code, mods) {
            // Unbounded channel; never blocks.
            let _ = self.notices.try_send(HookNotice::HotkeyTriggered);
            return HookVerdict::Consume;
        }

        if !self.enabled.get() {
            return HookVerdict::PassThrough;
        }

        if mods.is_chord() {
            if mods.ctrl {
                self.queue.enqueue(PipelineEvent::ClearBuffer);
            }
            return HookVerdict::PassThrough;
        }

        if KeyTranslator::is_buffer_clearing(vk_code) {
            self.queue.enqueue(PipelineEvent::ClearBuffer);
            return HookVerdict::PassThrough;
        }

        if KeyTranslator::is_relevant(vk_code) {
            let event = PipelineEvent::Key(KeyEvent::from_snapshot(vk_code, mods));
            // A full or disposed queue must not eat the key.
            return if self.queue.enqueue(event) {
                HookVerdict::Consume
            } else {
                HookVerdict::PassThrough
            };
        }

        HookVerdict::PassThrough
    }

    fn hotkey_matches(&self, vk_code: u16, mods: ModifierState) -> bool {
        if !self.hotkey_armed.load(Ordering::Acquire) {
            return false;
        }
        match KeyboardShortcut::unpack(self.hotkey.load(Ordering::Acquire)) {
            Some(hotkey) => hotkey.matches(vk_code, mods.ctrl, mods.alt, mods.shift),
            None => false,
        }
    }
}
