//! The engine's answer for one processed key.

/// Maximum number of output codepoints the engine can return for one key.
pub const MAX_OUTPUT_CHARS: usize = 64;

/// What the worker should do with an [`EngineResult`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum EngineAction {
    /// No transformation; the original key should reach the application.
    #[default]
    None = 0,
    /// Replace: erase `backspace_count` characters, then type `output_chars`.
    Send = 1,
    /// Restore the raw keystrokes (same mechanics as `Send`).
    Restore = 2,
}

impl EngineAction {
    /// Converts the engine's raw action byte.  Unknown values map to `None`.
    pub fn from_raw(raw: u8) -> Self {
        match raw {
            1 => Self::Send,
            2 => Self::Restore,
            _ => Self::None,
        }
    }
}

/// Result of a single `process_key` call.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EngineResult {
    pub action: EngineAction,
    pub backspace_count: u8,
    /// Replacement codepoints; never longer than [`MAX_OUTPUT_CHARS`].
    pub output_chars: Vec<char>,
}

impl EngineResult {
    /// The "nothing to do" result.
    pub fn none() -> Self {
        Self::default()
    }

    /// Builds a `Send` result from a string.  Output longer than
    /// [`MAX_OUTPUT_CHARS`] is truncated.
    pub fn send(backspace_count: u8, text: &str) -> Self {
        Self {
            action: EngineAction::Send,
            backspace_count,
            output_chars: text.chars().take(MAX_OUTPUT_CHARS).collect(),
        }
    }

    /// Builds a `Restore` result from a string.
    pub fn restore(backspace_count: u8, text: &str) -> Self {
        Self {
            action: EngineAction::Restore,
            ..Self::send(backspace_count, text)
        }
    }

    /// Builds a result from the engine's fixed-size codepoint array.
    ///
    /// Zero codepoints and values that are not valid Unicode scalars are
    /// skipped; `count` is clamped to the array length.
    pub fn from_raw(action: u8, backspace_count: u8, count: u8, chars: &[u32]) -> Self {
        let n = usize::from(count).min(chars.len()).min(MAX_OUTPUT_CHARS);
        Self {
            action: EngineAction::from_raw(action),
            backspace_count,
            output_chars: chars[..n]
                .iter()
                .filter(|&&cp| cp != 0)
                .filter_map(|&cp| char::from_u32(cp))
                .collect(),
        }
    }

    /// Number of output characters.
    pub fn char_count(&self) -> u8 {
        // Bounded by MAX_OUTPUT_CHARS.
        self.output_chars.len() as u8
    }

    /// The replacement text as a `String`.
    pub fn text(&self) -> String {
        self.output_chars.iter().collect()
    }

    /// `true` when the result asks for output to be injected.
    pub fn requires_injection(&self) -> bool {
        matches!(self.action, EngineAction::Send | EngineAction::Restore)
            && (self.backspace_count > 0 || !self.output_chars.is_empty())
    }
}
