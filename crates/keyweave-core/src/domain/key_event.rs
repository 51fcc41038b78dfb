//! Captured key-down events and the modifier snapshot taken alongside them.

use std::time::Instant;

/// Live modifier and lock-key state, sampled synchronously by the hook
/// thread when a key-down arrives.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ModifierState {
    pub ctrl: bool,
    pub alt: bool,
    pub shift: bool,
    pub caps_lock: bool,
}

impl ModifierState {
    /// `true` when Ctrl or Alt is held, i.e. the key is part of a chord.
    pub fn is_chord(self) -> bool {
        self.ctrl || self.alt
    }
}

/// A single captured key-down destined for the transformation engine.
///
/// Created by the hook, consumed exactly once by the worker, then dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    /// Windows virtual-key code of the physical key.
    pub vk_code: u16,
    /// Shift was held when the key went down.
    pub shift: bool,
    /// Caps Lock was toggled on when the key went down.
    pub caps_lock: bool,
    /// When the hook captured the key.
    pub captured_at: Instant,
}

impl KeyEvent {
    /// Creates an event stamped with the current instant.
    pub fn new(vk_code: u16, shift: bool, caps_lock: bool) -> Self {
        Self {
            vk_code,
            shift,
            caps_lock,
            captured_at: Instant::now(),
        }
    }

    /// Creates an event from the hook's modifier snapshot.
    pub fn from_snapshot(vk_code: u16, mods: ModifierState) -> Self {
        Self::new(vk_code, mods.shift, mods.caps_lock)
    }
}
