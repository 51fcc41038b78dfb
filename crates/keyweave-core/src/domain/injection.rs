//! Foreground-application classification for text injection.

use serde::{Deserialize, Serialize};

/// Opaque handle of a top-level window, as returned by the OS.
///
/// `WindowHandle(0)` is the null window (nothing focused).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct WindowHandle(pub isize);

impl WindowHandle {
    pub const NULL: Self = Self(0);

    pub fn is_null(self) -> bool {
        self.0 == 0
    }
}

/// How synthetic text is delivered to the focused application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InjectionStrategy {
    /// Backspaces and text each submitted as one batch, with a short gap.
    #[default]
    Fast,
    /// Per-character submission with delays; for web-rendering editors,
    /// terminals and browsers.
    Slow,
    /// Text placed on the clipboard and pasted with Ctrl+V.
    Clipboard,
}

/// Cached outcome of classifying one foreground window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InjectionClassification {
    pub window: WindowHandle,
    /// Lower-cased executable stem of the owning process, e.g. `"code"`.
    pub process_identity: String,
    pub strategy: InjectionStrategy,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_strategy_is_fast() {
        assert_eq!(InjectionStrategy::default(), InjectionStrategy::Fast);
    }

    #[test]
    fn test_null_window() {
        assert!(WindowHandle::NULL.is_null());
        assert!(!WindowHandle(0x1234).is_null());
    }
}
