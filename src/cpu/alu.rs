//! 16-bit arithmetic with flag computation.
//!
//! Each helper takes both operands as unsigned words, updates the flags it
//! owns and returns the truncated result.

use crate::cpu::registers::Flags;

/// Parity flag rule: set when the low byte has an even number of ones.
#[inline]
pub fn parity(value: u16) -> bool {
    (value & 0xFF).count_ones() % 2 == 0
}

/// `a + b`, setting CF, PF, AF, ZF, SF and OF.
pub fn add(a: u16, b: u16, flags: &mut Flags) -> u16 {
    let wide = a as u32 + b as u32;
    let result = wide as u16;

    flags.cf = wide > 0xFFFF;
    flags.pf = parity(result);
    flags.af = (a & 0xF) + (b & 0xF) > 0xF;
    flags.zf = result == 0;
    flags.sf = result & 0x8000 != 0;
    flags.of = (a ^ result) & (b ^ result) & 0x8000 != 0;

    result
}

/// `a - b`, setting CF, PF, AF, ZF, SF and OF.
///
/// CF is the unsigned borrow `a < b`, the same rule [`compare`] uses.
pub fn sub(a: u16, b: u16, flags: &mut Flags) -> u16 {
    let result = compare(a, b, flags);
    flags.pf = parity(result);
    flags.af = (a & 0xF) < (b & 0xF);
    result
}

/// `a - b` for comparison: sets ZF, SF, CF and OF only.
///
/// Returns the difference so [`sub`] can store it.
pub fn compare(a: u16, b: u16, flags: &mut Flags) -> u16 {
    let result = a.wrapping_sub(b);

    flags.zf = result == 0;
    flags.sf = result & 0x8000 != 0;
    flags.cf = a < b;
    flags.of = (a ^ b) & (a ^ result) & 0x8000 != 0;

    result
}

/// Unsigned 16x16 multiply, returning `(low, high)`. CF and OF are set iff
/// the high word is non-zero.
pub fn mul(a: u16, b: u16, flags: &mut Flags) -> (u16, u16) {
    let product = a as u32 * b as u32;
    let low = product as u16;
    let high = (product >> 16) as u16;

    flags.cf = high != 0;
    flags.of = high != 0;

    (low, high)
}

/// Unsigned 32/16 divide of `high:low` by `divisor`, returning
/// `(quotient, remainder)` truncated to 16 bits, or `None` for a zero divisor.
pub fn div(high: u16, low: u16, divisor: u16) -> Option<(u16, u16)> {
    if divisor == 0 {
        return None;
    }
    let dividend = (high as u32) << 16 | low as u32;
    let divisor = divisor as u32;
    Some(((dividend / divisor) as u16, (dividend % divisor) as u16))
}
