//! Deterministic rounding (`SPEC_FULL.md` §10, "Floating-point
//! determinism"). Longitude/latitude arithmetic rounds to 9 decimals and
//! altitude to 2 decimals at every step, using round-half-away-from-zero
//! rather than the IEEE round-half-to-even that `f64::round` composes
//! with on some platforms for intermediate values.

/// Round `x` to `n` decimal places, rounding a trailing `.5` away from
/// zero regardless of whether the preceding digit is even or odd.
pub fn round_half_away_from_zero(x: f64, n: i32) -> f64 {
    let factor = 10f64.powi(n);
    let scaled = x * factor;
    let rounded = if scaled >= 0.0 {
        (scaled + 0.5).floor()
    } else {
        (scaled - 0.5).ceil()
    };
    rounded / factor
}

pub fn round_coord(x: f64) -> f64 {
    round_half_away_from_zero(x, 9)
}

pub fn round_altitude(x: f64) -> f64 {
    round_half_away_from_zero(x, 2)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounds_half_away_from_zero() {
        assert_eq!(round_half_away_from_zero(0.125, 2), 0.13);
        assert_eq!(round_half_away_from_zero(-0.125, 2), -0.13);
        assert_eq!(round_half_away_from_zero(2.5, 0), 3.0);
        assert_eq!(round_half_away_from_zero(-2.5, 0), -3.0);
    }

    #[test]
    fn coordinate_rounding_suppresses_drift() {
        let x = 114.000_000_000_4;
        assert_eq!(round_coord(x), 114.0);
    }
}
