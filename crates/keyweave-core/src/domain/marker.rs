//! The injection marker.
//!
//! Every synthetic keyboard event Keyweave submits carries this value in the
//! event's auxiliary field (`dwExtraInfo` on Windows).  The hook compares the
//! same constant to recognise its own output and let it through untouched, so
//! injected characters are never fed back into the engine.

/// "GNH " in ASCII bytes: 0x47 0x4E 0x48 0x20.
pub const INJECTION_MARKER: usize = 0x474E_4820;

/// Returns `true` when `extra_info` was stamped by this process.
#[inline]
pub fn is_self_injected(extra_info: usize) -> bool {
    extra_info == INJECTION_MARKER
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_marker_matches_itself() {
        assert!(is_self_injected(INJECTION_MARKER));
    }

    #[test]
    fn test_zero_extra_info_is_not_self_injected() {
        assert!(!is_self_injected(0));
    }
}
