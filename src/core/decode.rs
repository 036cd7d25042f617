//! Packed connection words.
//!
//! Each body word of a connection table carries one outgoing connection:
//!
//! ```text
//!  15 14            8 7               0
//! +--+---------------+-----------------+
//! |t8|  weight (i7)  |  target bits 0-7|
//! +--+---------------+-----------------+
//! ```
//!
//! Bit 15 is the ninth target bit, bits 8-14 a two's-complement 7-bit weight.
//! Everything is shift/mask arithmetic on the integer value, so the result does
//! not depend on how the host lays the word out in memory.

/// Dense unit id. Signaling units come first, output units follow.
pub type UnitId = u16;

/// Signed connection weight, sign-extended from the packed 7-bit field.
pub type Weight = i8;

/// Number of ids addressable by the 9-bit target field.
pub const ID_SPACE: u16 = 1 << 9;

pub const WEIGHT_MIN: Weight = -64;
pub const WEIGHT_MAX: Weight = 63;

const TARGET_LOW_MASK: u16 = 0x00FF;
const TARGET_HIGH_BIT: u16 = 0x8000;
const WEIGHT_SHIFT: u16 = 8;
const WEIGHT_MASK: u16 = 0x7F;

/// One decoded outgoing connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Connection {
    pub target: UnitId,
    pub weight: Weight,
}

/// Decode a packed table word. Total: every word yields some connection.
#[inline]
pub fn decode_word(word: u16) -> Connection {
    let target = (word & TARGET_LOW_MASK) | ((word & TARGET_HIGH_BIT) >> 7);

    // Shift the 7-bit field to the top of an i8 and back to replicate bit 6.
    let raw = ((word >> WEIGHT_SHIFT) & WEIGHT_MASK) as u8;
    let weight = ((raw << 1) as i8) >> 1;

    Connection { target, weight }
}

/// Pack a connection into a table word.
///
/// Targets are truncated to 9 bits and weights to 7 bits; callers are expected
/// to range-check first (see [`crate::wiring::TableBuilder`]).
#[inline]
pub fn encode_word(target: UnitId, weight: Weight) -> u16 {
    let low = target & TARGET_LOW_MASK;
    let high = (target & 0x0100) << 7;
    let w = ((weight as u8) as u16 & WEIGHT_MASK) << WEIGHT_SHIFT;
    high | w | low
}
