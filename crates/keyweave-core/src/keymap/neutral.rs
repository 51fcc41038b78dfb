//! The engine's neutral keycode space.
//!
//! The transformation engine numbers keys independently of the host platform.
//! Its numbering follows the macOS virtual keycode layout (A = 0x00, S = 0x01,
//! D = 0x02, ...), which is why the values below look scrambled relative to the
//! alphabet: they follow physical ANSI key positions, not letters.
//!
//! [`NeutralKey::UNMAPPED`] (0xFFFF) is the sentinel for "no engine key".

/// A key in the engine's neutral keycode space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NeutralKey(pub u16);

impl NeutralKey {
    pub const A: Self = Self(0x00);
    pub const S: Self = Self(0x01);
    pub const D: Self = Self(0x02);
    pub const F: Self = Self(0x03);
    pub const H: Self = Self(0x04);
    pub const G: Self = Self(0x05);
    pub const Z: Self = Self(0x06);
    pub const X: Self = Self(0x07);
    pub const C: Self = Self(0x08);
    pub const V: Self = Self(0x09);
    pub const B: Self = Self(0x0B);
    pub const Q: Self = Self(0x0C);
    pub const W: Self = Self(0x0D);
    pub const E: Self = Self(0x0E);
    pub const R: Self = Self(0x0F);
    pub const Y: Self = Self(0x10);
    pub const T: Self = Self(0x11);
    pub const N1: Self = Self(0x12);
    pub const N2: Self = Self(0x13);
    pub const N3: Self = Self(0x14);
    pub const N4: Self = Self(0x15);
    pub const N6: Self = Self(0x16);
    pub const N5: Self = Self(0x17);
    pub const N9: Self = Self(0x19);
    pub const N7: Self = Self(0x1A);
    pub const N8: Self = Self(0x1C);
    pub const N0: Self = Self(0x1D);
    pub const RIGHT_BRACKET: Self = Self(0x1E);
    pub const O: Self = Self(0x1F);
    pub const U: Self = Self(0x20);
    pub const LEFT_BRACKET: Self = Self(0x21);
    pub const I: Self = Self(0x22);
    pub const P: Self = Self(0x23);
    pub const RETURN: Self = Self(0x24);
    pub const L: Self = Self(0x25);
    pub const J: Self = Self(0x26);
    pub const K: Self = Self(0x28);
    pub const N: Self = Self(0x2D);
    pub const M: Self = Self(0x2E);
    pub const TAB: Self = Self(0x30);
    pub const SPACE: Self = Self(0x31);
    /// Backspace.  The engine calls it "delete", after the macOS key label.
    pub const DELETE: Self = Self(0x33);
    pub const ESCAPE: Self = Self(0x35);

    pub const UNMAPPED: Self = Self(0xFFFF);

    /// `true` unless this is [`NeutralKey::UNMAPPED`].
    pub fn is_mapped(self) -> bool {
        self != Self::UNMAPPED
    }
}
