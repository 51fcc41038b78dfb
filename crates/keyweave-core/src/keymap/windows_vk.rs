//! Windows Virtual Key (VK) codes and the VK → neutral keycode table.
//!
//! Reference: Windows Virtual-Key Codes (winuser.h).
//!
//! `VK_TO_NEUTRAL_TABLE` is a compile-time array of 256 [`NeutralKey`] values
//! indexed by VK code.  Position 0x41 holds `NeutralKey::A` because `VK_A` is
//! 0x41.  Every VK without an engine equivalent stores
//! [`NeutralKey::UNMAPPED`].  Lookup is a single index, which matters because
//! every key the worker processes goes through it.

use super::neutral::NeutralKey;

pub const VK_BACK: u16 = 0x08;
pub const VK_TAB: u16 = 0x09;
pub const VK_RETURN: u16 = 0x0D;
pub const VK_SHIFT: u16 = 0x10;
pub const VK_CONTROL: u16 = 0x11;
pub const VK_MENU: u16 = 0x12;
pub const VK_CAPITAL: u16 = 0x14;
pub const VK_ESCAPE: u16 = 0x1B;
pub const VK_SPACE: u16 = 0x20;
pub const VK_0: u16 = 0x30;
pub const VK_9: u16 = 0x39;
pub const VK_A: u16 = 0x41;
pub const VK_V: u16 = 0x56;
pub const VK_Z: u16 = 0x5A;
pub const VK_OEM_1: u16 = 0xBA;
pub const VK_OEM_PLUS: u16 = 0xBB;
pub const VK_OEM_COMMA: u16 = 0xBC;
pub const VK_OEM_MINUS: u16 = 0xBD;
pub const VK_OEM_PERIOD: u16 = 0xBE;
pub const VK_OEM_2: u16 = 0xBF;
pub const VK_OEM_3: u16 = 0xC0;
pub const VK_OEM_4: u16 = 0xDB;
pub const VK_OEM_5: u16 = 0xDC;
pub const VK_OEM_6: u16 = 0xDD;
pub const VK_OEM_7: u16 = 0xDE;

/// Translates a Windows VK code to the engine's neutral keycode.
///
/// Returns [`NeutralKey::UNMAPPED`] for codes outside the table, including
/// every value above 0xFF.
pub fn vk_to_neutral(vk: u16) -> NeutralKey {
    VK_TO_NEUTRAL_TABLE
        .get(usize::from(vk))
        .copied()
        .unwrap_or(NeutralKey::UNMAPPED)
}

/// Complete VK → neutral mapping indexed by VK code (0x00–0xFF).
const VK_TO_NEUTRAL_TABLE: [NeutralKey; 256] = {
    let mut t = [NeutralKey::UNMAPPED; 256];

    // ── Alphabet keys (VK_A=0x41 … VK_Z=0x5A) ────────────────────────────────
    t[0x41] = NeutralKey::A;
    t[0x42] = NeutralKey::B;
    t[0x43] = NeutralKey::C;
    t[0x44] = NeutralKey::D;
    t[0x45] = NeutralKey::E;
    t[0x46] = NeutralKey::F;
    t[0x47] = NeutralKey::G;
    t[0x48] = NeutralKey::H;
    t[0x49] = NeutralKey::I;
    t[0x4A] = NeutralKey::J;
    t[0x4B] = NeutralKey::K;
    t[0x4C] = NeutralKey::L;
    t[0x4D] = NeutralKey::M;
    t[0x4E] = NeutralKey::N;
    t[0x4F] = NeutralKey::O;
    t[0x50] = NeutralKey::P;
    t[0x51] = NeutralKey::Q;
    t[0x52] = NeutralKey::R;
    t[0x53] = NeutralKey::S;
    t[0x54] = NeutralKey::T;
    t[0x55] = NeutralKey::U;
    t[0x56] = NeutralKey::V;
    t[0x57] = NeutralKey::W;
    t[0x58] = NeutralKey::X;
    t[0x59] = NeutralKey::Y;
    t[0x5A] = NeutralKey::Z;

    // ── Digit row (VK_0=0x30 … VK_9=0x39) ───────────────────────────────────
    t[0x30] = NeutralKey::N0;
    t[0x31] = NeutralKey::N1;
    t[0x32] = NeutralKey::N2;
    t[0x33] = NeutralKey::N3;
    t[0x34] = NeutralKey::N4;
    t[0x35] = NeutralKey::N5;
    t[0x36] = NeutralKey::N6;
    t[0x37] = NeutralKey::N7;
    t[0x38] = NeutralKey::N8;
    t[0x39] = NeutralKey::N9;

    // ── Control keys ─────────────────────────────────────────────────────────
    t[0x08] = NeutralKey::DELETE; // VK_BACK
    t[0x09] = NeutralKey::TAB; // VK_TAB
    t[0x0D] = NeutralKey::RETURN; // VK_RETURN
    t[0x1B] = NeutralKey::ESCAPE; // VK_ESCAPE
    t[0x20] = NeutralKey::SPACE; // VK_SPACE

    // ── Brackets (used by the VNI/Telex horn shortcuts) ─────────────────────
    t[0xDB] = NeutralKey::LEFT_BRACKET; // VK_OEM_4 ([ {)
    t[0xDD] = NeutralKey::RIGHT_BRACKET; // VK_OEM_6 (] })

    t
};
