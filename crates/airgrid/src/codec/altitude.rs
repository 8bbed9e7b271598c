//! The altitude codec (C2): an 11-digit binary encoding of a scalar
//! altitude in `[0, MAX_ELEVATION]`, halving a `[lo, hi]` interval at
//! each digit.
//!
//! Decode mirrors encode digit-for-digit (see the open question decision
//! in `SPEC_FULL.md` §10.2): both sides halve the interval, so
//! `decode_prefix(&encode(h)[..k])` recovers the same `[lo, hi]` band
//! encode passed through to produce digit `k`, and a level-`L` code's
//! altitude band has width `MAX_ELEVATION / 2^K(L)`.

use crate::error::{Error, Result};

pub const MAX_ELEVATION: f64 = 1000.0;
pub const ALTITUDE_DIGITS: usize = 11;

/// Fixed 1-based character positions in a full 33-character code where the
/// eleven altitude digits would land if every level were encoded. Kept for
/// documentation and for callers that need to reason about a code's shape;
/// this crate's own encoder/decoder never indexes by these positions
/// directly; it splices the next altitude digit in immediately after each
/// level's horizontal digits, which lands on exactly these offsets.
pub const INSERTION_POSITIONS: [usize; ALTITUDE_DIGITS] =
    [12, 15, 17, 19, 21, 23, 25, 27, 29, 31, 33];

/// How many of the 11 altitude digits are embedded in a code targeting
/// level `L`. `K(6) = 1`, `K(7) = 2`, `K(8) = 3`, `K(L) = L - 5` for `L >= 6`.
pub fn digit_count(level: u8) -> usize {
    if level < 6 {
        0
    } else {
        (level - 5) as usize
    }
}

/// Encode `h` as 11 binary digits, halving `[0, MAX_ELEVATION]` at each
/// step. An epsilon of `1e-15` keeps the upper endpoint of the parent
/// interval from tipping into a nonexistent third bucket due to
/// floating-point rounding.
pub fn encode(h: f64) -> Result<[u8; ALTITUDE_DIGITS]> {
    if !(0.0..=MAX_ELEVATION).contains(&h) {
        return Err(Error::AltitudeOutOfRange(h));
    }
    let mut digits = [0u8; ALTITUDE_DIGITS];
    let mut lo = 0.0f64;
    let mut hi = MAX_ELEVATION;
    for digit in digits.iter_mut() {
        let sub = (hi - lo) / 2.0;
        let offset = h - lo - 1e-15;
        let idx = (offset / sub).floor().clamp(0.0, 1.0) as u8;
        *digit = idx;
        lo += idx as f64 * sub;
        hi = lo + sub;
    }
    Ok(digits)
}

/// Narrow `[0, MAX_ELEVATION]` through the first `digits.len()` altitude
/// digits, halving the interval at each step, and return the resulting
/// `[lo, hi]` band.
pub fn decode_prefix(digits: &[u8]) -> (f64, f64) {
    let mut lo = 0.0f64;
    let mut hi = MAX_ELEVATION;
    for &digit in digits {
        let sub = (hi - lo) / 2.0;
        lo += digit as f64 * sub;
        hi = lo + sub;
    }
    (lo, hi)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn zero_altitude_is_all_zero_digits() {
        let digits = encode(0.0).unwrap();
        assert_eq!(digits, [0u8; ALTITUDE_DIGITS]);
    }

    #[test]
    fn near_max_altitude_is_all_one_digits() {
        let digits = encode(999.999_999_999).unwrap();
        assert_eq!(digits, [1u8; ALTITUDE_DIGITS]);
    }

    #[test]
    fn out_of_range_altitude_is_rejected() {
        assert!(encode(-1.0).is_err());
        assert!(encode(1000.1).is_err());
    }

    #[test]
    fn round_trips_through_every_prefix_length() {
        let h = 463.27;
        let digits = encode(h).unwrap();
        for k in 1..=ALTITUDE_DIGITS {
            let (lo, hi) = decode_prefix(&digits[..k]);
            assert!(lo <= h && h <= hi, "prefix {k}: {lo}..{hi} should contain {h}");
        }
        let (lo, hi) = decode_prefix(&digits);
        assert_relative_eq!(hi - lo, 1000.0 / 2f64.powi(ALTITUDE_DIGITS as i32), epsilon = 1e-6);
    }

    #[test]
    fn digit_count_matches_level() {
        assert_eq!(digit_count(6), 1);
        assert_eq!(digit_count(7), 2);
        assert_eq!(digit_count(8), 3);
        assert_eq!(digit_count(16), 11);
        assert_eq!(digit_count(5), 0);
    }
}
