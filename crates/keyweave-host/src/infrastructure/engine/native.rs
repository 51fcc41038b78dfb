//! C ABI of the `gonhanh_core` engine library.
//!
//! `ime_key_ext` returns a heap-allocated [`NativeResult`] owned by the
//! library; it must be handed back through `ime_free` exactly once.  A null
//! pointer means the engine had no answer.
//!
//! # Safety
//!
//! `unsafe` is used only for the FFI calls.  The library keeps global state,
//! so every call must be serialized; [`NativeEngine`] is only ever reached
//! through `SharedEngine`, which holds its lock across each call.

use keyweave_core::{EngineResult, MAX_OUTPUT_CHARS};

/// Result record as laid out by the engine library.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct NativeResult {
    pub chars: [u32; MAX_OUTPUT_CHARS],
    pub action: u8,
    pub backspace: u8,
    pub count: u8,
    pub flags: u8,
}

impl NativeResult {
    pub fn to_engine_result(&self) -> EngineResult {
        EngineResult::from_raw(self.action, self.backspace, self.count, &self.chars)
    }
}

#[cfg(feature = "native-engine")]
pub use linked::NativeEngine;

#[cfg(feature = "native-engine")]
mod linked {
    use std::ffi::{c_char, CString};

    use keyweave_core::{EngineResult, InputMethod, NeutralKey, TransformationEngine};
    use tracing::warn;

    use super::NativeResult;

    #[link(name = "gonhanh_core")]
    extern "C" {
        fn ime_init();
        fn ime_clear();
        fn ime_clear_all();
        fn ime_free(result: *mut NativeResult);
        fn ime_method(method: u8);
        fn ime_enabled(enabled: bool);
        fn ime_modern(modern: bool);
        fn ime_skip_w_shortcut(skip: bool);
        fn ime_esc_restore(enabled: bool);
        fn ime_free_tone(enabled: bool);
        fn ime_english_auto_restore(enabled: bool);
        fn ime_auto_capitalize(enabled: bool);
        fn ime_key_ext(key: u16, caps: bool, ctrl: bool, shift: bool) -> *mut NativeResult;
        fn ime_get_buffer(out: *mut u32, max_len: i32) -> i32;
        fn ime_restore_word(word: *const c_char);
        fn ime_add_shortcut(trigger: *const c_char, replacement: *const c_char);
        fn ime_remove_shortcut(trigger: *const c_char);
        fn ime_clear_shortcuts();
    }

    /// [`TransformationEngine`] backed by the linked `gonhanh_core` library.
    #[derive(Debug, Default)]
    pub struct NativeEngine;

    impl NativeEngine {
        pub fn new() -> Self {
            Self
        }
    }

    fn c_string(value: &str) -> Option<CString> {
        match CString::new(value) {
            Ok(s) => Some(s),
            Err(_) => {
                warn!(value, "string contains NUL; not passed to engine");
                None
            }
        }
    }

    impl TransformationEngine for NativeEngine {
        fn initialize(&mut self) {
            // SAFETY: no arguments; library global state.
            unsafe { ime_init() }
        }

        fn clear(&mut self) {
            // SAFETY: as above.
            unsafe { ime_clear() }
        }

        fn clear_all(&mut self) {
            // SAFETY: as above.
            unsafe { ime_clear_all() }
        }

        fn set_method(&mut self, method: InputMethod) {
            // SAFETY: the library accepts 0 (Telex) and 1 (VNI).
            unsafe { ime_method(method as u8) }
        }

        fn set_enabled(&mut self, enabled: bool) {
            // SAFETY: plain value argument.
            unsafe { ime_enabled(enabled) }
        }

        fn set_modern_tone(&mut self, modern: bool) {
            // SAFETY: plain value argument.
            unsafe { ime_modern(modern) }
        }

        fn set_skip_w_shortcut(&mut self, skip: bool) {
            // SAFETY: plain value argument.
            unsafe { ime_skip_w_shortcut(skip) }
        }

        fn set_esc_restore(&mut self, enabled: bool) {
            // SAFETY: plain value argument.
            unsafe { ime_esc_restore(enabled) }
        }

        fn set_free_tone(&mut self, enabled: bool) {
            // SAFETY: plain value argument.
            unsafe { ime_free_tone(enabled) }
        }

        fn set_english_auto_restore(&mut self, enabled: bool) {
            // SAFETY: plain value argument.
            unsafe { ime_english_auto_restore(enabled) }
        }

        fn set_auto_capitalize(&mut self, enabled: bool) {
            // SAFETY: plain value argument.
            unsafe { ime_auto_capitalize(enabled) }
        }

        fn process_key(
            &mut self,
            key: NeutralKey,
            caps: bool,
            ctrl: bool,
            shift: bool,
        ) -> Option<EngineResult> {
            // SAFETY: value arguments; the returned pointer is either null or
            // a library-owned record freed below.
            let raw = unsafe { ime_key_ext(key.0, caps, ctrl, shift) };
            if raw.is_null() {
                return None;
            }
            // SAFETY: non-null pointers from ime_key_ext point to a valid
            // NativeResult until passed to ime_free.
            let result = unsafe { (*raw).to_engine_result() };
            // SAFETY: raw came from ime_key_ext and is freed exactly once.
            unsafe { ime_free(raw) };
            Some(result)
        }

        fn get_buffer(&mut self, max_len: usize) -> Vec<char> {
            let mut out = vec![0u32; max_len];
            let capacity = i32::try_from(max_len).unwrap_or(i32::MAX);
            // SAFETY: out holds max_len u32 slots and the library writes at
            // most `capacity` of them.
            let written = unsafe { ime_get_buffer(out.as_mut_ptr(), capacity) };
            let written = usize::try_from(written).unwrap_or(0).min(max_len);
            out[..written].iter().filter_map(|&cp| char::from_u32(cp)).collect()
        }

        fn restore_word(&mut self, word: &str) {
            if let Some(word) = c_string(word) {
                // SAFETY: word is NUL-terminated and outlives the call.
                unsafe { ime_restore_word(word.as_ptr()) }
            }
        }

        fn add_shortcut(&mut self, trigger: &str, replacement: &str) {
            if let (Some(trigger), Some(replacement)) = (c_string(trigger), c_string(replacement)) {
                // SAFETY: both strings are NUL-terminated and outlive the call.
                unsafe { ime_add_shortcut(trigger.as_ptr(), replacement.as_ptr()) }
            }
        }

        fn remove_shortcut(&mut self, trigger: &str) {
            if let Some(trigger) = c_string(trigger) {
                // SAFETY: trigger is NUL-terminated and outlives the call.
                unsafe { ime_remove_shortcut(trigger.as_ptr()) }
            }
        }

        fn clear_shortcuts(&mut self) {
            // SAFETY: no arguments.
            unsafe { ime_clear_shortcuts() }
        }
    }
}

#[cfg(test)]
mod tests {
    use keyweave_core::EngineAction;

    use super::*;

    fn record(action: u8, backspace: u8, text: &str) -> NativeResult {
        let mut chars = [0u32; MAX_OUTPUT_CHARS];
        for (slot, c) in chars.iter_mut().zip(text.chars()) {
            *slot = c as u32;
        }
        NativeResult {
            chars,
            action,
            backspace,
            count: text.chars().count() as u8,
            flags: 0,
        }
    }

    #[test]
    fn test_native_send_record_converts_to_engine_result() {
        let result = record(1, 1, "ấ").to_engine_result();

        assert_eq!(result.action, EngineAction::Send);
        assert_eq!(result.backspace_count, 1);
        assert_eq!(result.text(), "ấ");
    }

    #[test]
    fn test_native_restore_record_converts_to_engine_result() {
        let result = record(2, 3, "viet ").to_engine_result();

        assert_eq!(result.action, EngineAction::Restore);
        assert_eq!(result.char_count(), 5);
    }

    #[test]
    fn test_native_count_beyond_array_is_clamped() {
        let mut raw = record(1, 0, "a");
        raw.count = 200;

        let result = raw.to_engine_result();

        assert_eq!(result.text(), "a");
    }

    #[test]
    fn test_native_record_layout_matches_library() {
        assert_eq!(std::mem::size_of::<NativeResult>(), MAX_OUTPUT_CHARS * 4 + 4);
    }
}
