//! Seven-segment encoding, bit order `G F E D C B A`.
//!
//! ```text
//!    -A-
//!   F   B
//!    -G-
//!   E   C
//!    -D-
//! ```
//!
//! Bit 7 (`H`) is the arrow flag and is OR-ed in by [`encode`].

use super::channel::Segments;

/// Index used for anything outside `0..=15`.
pub const BLANK: u8 = 0x10;

#[rustfmt::skip]
const CONVERSION_TABLE: [u8; 17] = [
    0x3F, 0x06, 0x5B, 0x4F, 0x66, 0x6D, 0x7D, 0x07,
    0x7F, 0x6F, 0x77, 0x7C, 0x39, 0x5E, 0x79, 0x71,
    0x00,
];

/// Segment pattern for numeral `n` (0-9, A-F, anything else blank).
pub fn encode(n: u8, arrow: bool) -> Segments {
    let pattern = Segments::from_bits_retain(CONVERSION_TABLE[n.min(BLANK) as usize]);
    if arrow {
        pattern | Segments::ARROW
    } else {
        pattern
    }
}

/// Printable form of a numeral as the display shows it.
pub fn symbol(n: u8) -> char {
    match n {
        0..=9 => (b'0' + n) as char,
        0x0A => 'A',
        0x0B => 'b',
        0x0C => 'C',
        0x0D => 'd',
        0x0E => 'E',
        0x0F => 'F',
        _ => ' ',
    }
}
