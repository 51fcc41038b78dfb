//! Key code translation from the host platform to the engine.
//!
//! The engine speaks its own neutral keycode space ([`NeutralKey`]).  Physical
//! keys captured by the hook are Windows virtual-key codes and are translated
//! at the worker, just before the engine call.

pub mod neutral;
pub mod windows_vk;

pub use neutral::NeutralKey;

/// Stateless VK → neutral translation.
pub struct KeyTranslator;

impl KeyTranslator {
    /// Translates a Windows Virtual Key code.
    ///
    /// Returns `None` when the key has no engine equivalent; the worker treats
    /// that as a no-op.
    pub fn translate(vk: u16) -> Option<NeutralKey> {
        let key = windows_vk::vk_to_neutral(vk);
        key.is_mapped().then_some(key)
    }

    /// `true` for keys the hook should capture and hand to the worker.
    ///
    /// This is every translatable key except Tab and Escape, which clear the
    /// composition and pass through instead.  Keeping the allowlist derived from
    /// the table guarantees a consumed key is always translatable.
    pub fn is_relevant(vk: u16) -> bool {
        vk != windows_vk::VK_TAB
            && vk != windows_vk::VK_ESCAPE
            && windows_vk::vk_to_neutral(vk).is_mapped()
    }

    /// `true` for keys that end the current composition.
    pub fn is_buffer_clearing(vk: u16) -> bool {
        vk == windows_vk::VK_TAB || vk == windows_vk::VK_ESCAPE
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use windows_vk::*;

    #[test]
    fn test_translate_letter() {
        assert_eq!(KeyTranslator::translate(VK_A), Some(NeutralKey::A));
    }

    #[test]
    fn test_translate_unmapped_returns_none() {
        assert_eq!(KeyTranslator::translate(VK_OEM_COMMA), None);
        assert_eq!(KeyTranslator::translate(0x70), None); // F1
    }

    #[test]
    fn test_relevant_keys_cover_letters_digits_and_brackets() {
        for vk in (VK_A..=VK_Z).chain(VK_0..=VK_9) {
            assert!(KeyTranslator::is_relevant(vk), "VK 0x{vk:02X}");
        }
        assert!(KeyTranslator::is_relevant(VK_OEM_4));
        assert!(KeyTranslator::is_relevant(VK_OEM_6));
        assert!(KeyTranslator::is_relevant(VK_SPACE));
        assert!(KeyTranslator::is_relevant(VK_BACK));
        assert!(KeyTranslator::is_relevant(VK_RETURN));
    }

    #[test]
    fn test_tab_and_escape_are_clearing_not_relevant() {
        for vk in [VK_TAB, VK_ESCAPE] {
            assert!(!KeyTranslator::is_relevant(vk));
            assert!(KeyTranslator::is_buffer_clearing(vk));
        }
    }

    #[test]
    fn test_every_relevant_key_is_translatable() {
        for vk in 0u16..=0xFF {
            if KeyTranslator::is_relevant(vk) {
                assert!(KeyTranslator::translate(vk).is_some(), "VK 0x{vk:02X}");
            }
        }
    }
}
