//! The global toggle hotkey.
//!
//! A [`KeyboardShortcut`] is a virtual-key code plus an exact set of modifiers.
//! It is read by the hook thread on every key-down, so matching is a handful
//! of integer comparisons.
//!
//! Two textual forms are understood:
//!
//! | Form            | Example        | Used by                     |
//! |-----------------|----------------|-----------------------------|
//! | display string  | `"Ctrl+Space"` | config file, UI             |
//! | legacy numeric  | `"32,1"`       | settings written by older builds |

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::keymap::windows_vk as vk;

/// Error returned when a shortcut string cannot be parsed.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ShortcutParseError {
    #[error("shortcut string is empty")]
    Empty,
    #[error("unknown key name: {0:?}")]
    UnknownKey(String),
    #[error("shortcut {0:?} has no key, only modifiers")]
    MissingKey(String),
    #[error("malformed numeric shortcut: {0:?}")]
    MalformedNumeric(String),
}

/// A key plus an exact modifier set (Ctrl | Alt | Shift).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct KeyboardShortcut {
    pub key_code: u16,
    pub modifiers: u8,
}

impl KeyboardShortcut {
    pub const MOD_CTRL: u8 = 1;
    pub const MOD_ALT: u8 = 2;
    pub const MOD_SHIFT: u8 = 4;

    /// Creates a shortcut from a virtual-key code and modifier bits.
    pub const fn new(key_code: u16, modifiers: u8) -> Self {
        Self { key_code, modifiers }
    }

    /// `true` when `key_code` and the live modifier state match exactly.
    ///
    /// Extra modifiers held by the user make the match fail, so Ctrl+Shift+Space
    /// does not trigger a Ctrl+Space hotkey.
    pub fn matches(&self, key_code: u16, ctrl: bool, alt: bool, shift: bool) -> bool {
        key_code == self.key_code
            && ctrl == self.wants(Self::MOD_CTRL)
            && alt == self.wants(Self::MOD_ALT)
            && shift == self.wants(Self::MOD_SHIFT)
    }

    fn wants(&self, bit: u8) -> bool {
        self.modifiers & bit != 0
    }

    /// Display parts in canonical order, e.g. `["Ctrl", "Space"]`.
    pub fn display_parts(&self) -> Vec<String> {
        let mut parts = Vec::with_capacity(4);
        if self.wants(Self::MOD_CTRL) {
            parts.push("Ctrl".to_string());
        }
        if self.wants(Self::MOD_ALT) {
            parts.push("Alt".to_string());
        }
        if self.wants(Self::MOD_SHIFT) {
            parts.push("Shift".to_string());
        }
        parts.push(key_name(self.key_code));
        parts
    }

    /// Legacy numeric form `"<keycode>,<modifiers>"`.
    pub fn to_numeric_string(&self) -> String {
        format!("{},{}", self.key_code, self.modifiers)
    }

    /// Packs the shortcut into a `u32` for lock-free storage.
    ///
    /// Bit 24 marks the value as present so that `0` can mean "no hotkey".
    pub const fn pack(&self) -> u32 {
        (1 << 24) | ((self.modifiers as u32) << 16) | self.key_code as u32
    }

    /// Reverses [`KeyboardShortcut::pack`].  Returns `None` for `0`.
    pub const fn unpack(packed: u32) -> Option<Self> {
        if packed & (1 << 24) == 0 {
            return None;
        }
        Some(Self {
            key_code: (packed & 0xFFFF) as u16,
            modifiers: ((packed >> 16) & 0xFF) as u8,
        })
    }

    fn parse_numeric(s: &str) -> Result<Self, ShortcutParseError> {
        let malformed = || ShortcutParseError::MalformedNumeric(s.to_string());
        let (key, mods) = s.split_once(',').ok_or_else(malformed)?;
        let key_code = key.trim().parse::<u16>().map_err(|_| malformed())?;
        let modifiers = mods.trim().parse::<u8>().map_err(|_| malformed())?;
        Ok(Self { key_code, modifiers })
    }
}

impl Default for KeyboardShortcut {
    /// Ctrl+Space.
    fn default() -> Self {
        Self::new(vk::VK_SPACE, Self::MOD_CTRL)
    }
}

impl fmt::Display for KeyboardShortcut {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_parts().join("+"))
    }
}

impl FromStr for KeyboardShortcut {
    type Err = ShortcutParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ShortcutParseError::Empty);
        }
        if s.len() > 1 && s.contains(',') && !s.contains('+') {
            return Self::parse_numeric(s);
        }

        let mut modifiers = 0u8;
        let mut key_code = None;
        for part in s.split('+').map(str::trim) {
            match part.to_ascii_lowercase().as_str() {
                "ctrl" | "control" => modifiers |= Self::MOD_CTRL,
                "alt" => modifiers |= Self::MOD_ALT,
                "shift" => modifiers |= Self::MOD_SHIFT,
                _ => {
                    key_code = Some(
                        key_from_name(part)
                            .ok_or_else(|| ShortcutParseError::UnknownKey(part.to_string()))?,
                    )
                }
            }
        }
        let key_code = key_code.ok_or_else(|| ShortcutParseError::MissingKey(s.to_string()))?;
        Ok(Self { key_code, modifiers })
    }
}

impl TryFrom<String> for KeyboardShortcut {
    type Error = ShortcutParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<KeyboardShortcut> for String {
    fn from(value: KeyboardShortcut) -> Self {
        value.to_string()
    }
}

/// Named keys understood in display strings, besides letters and digits.
const NAMED_KEYS: &[(u16, &str)] = &[
    (vk::VK_SPACE, "Space"),
    (vk::VK_RETURN, "Enter"),
    (vk::VK_TAB, "Tab"),
    (vk::VK_ESCAPE, "Esc"),
    (vk::VK_BACK, "Backspace"),
    (vk::VK_OEM_COMMA, ","),
    (vk::VK_OEM_PERIOD, "."),
    (vk::VK_OEM_1, ";"),
    (vk::VK_OEM_2, "/"),
    (vk::VK_OEM_3, "`"),
    (vk::VK_OEM_4, "["),
    (vk::VK_OEM_5, "\\"),
    (vk::VK_OEM_6, "]"),
    (vk::VK_OEM_7, "'"),
    (vk::VK_OEM_PLUS, "="),
    (vk::VK_OEM_MINUS, "-"),
];

fn key_name(key_code: u16) -> String {
    if (vk::VK_A..=vk::VK_Z).contains(&key_code) || (vk::VK_0..=vk::VK_9).contains(&key_code) {
        // ASCII range, guarded above.
        return char::from(key_code as u8).to_string();
    }
    NAMED_KEYS
        .iter()
        .find(|(code, _)| *code == key_code)
        .map(|(_, name)| (*name).to_string())
        .unwrap_or_else(|| format!("Key{key_code:02X}"))
}

fn key_from_name(name: &str) -> Option<u16> {
    if name.len() == 1 {
        let c = name.chars().next()?.to_ascii_uppercase();
        if c.is_ascii_uppercase() || c.is_ascii_digit() {
            return Some(c as u16);
        }
    }
    if name.eq_ignore_ascii_case("escape") {
        return Some(vk::VK_ESCAPE);
    }
    if let Some(hex) = name.strip_prefix("Key") {
        if hex.len() == 2 {
            if let Ok(code) = u16::from_str_radix(hex, 16) {
                return Some(code);
            }
        }
    }
    NAMED_KEYS
        .iter()
        .find(|(_, n)| n.eq_ignore_ascii_case(name))
        .map(|(code, _)| *code)
}
