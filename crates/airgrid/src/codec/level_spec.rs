//! The level table that replaces the original's sixteen per-level
//! dispatch functions (`SPEC_FULL.md` §10, "Dynamic dispatch by level").
//!
//! Every level from 2 to 16 divides its parent cell into an `fan_lon x
//! fan_lat` grid. [`DigitMode::ZOrder`] levels write that subdivision as a
//! single digit in mirrored row-major order (`mirrored_row * fan_lon +
//! mirrored_col`); [`DigitMode::Raw`] levels (3, 6, 7) write the mirrored
//! longitude and latitude indices as two separate digits instead of
//! combining them. Mirroring always reflects the natural NE ordering
//! across the axis that makes the four quadrants consistent, per the
//! hemisphere/west flags that hold for the whole call (§4.1).

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DigitMode {
    ZOrder,
    Raw,
}

#[derive(Debug, Clone, Copy)]
pub struct LevelSpec {
    pub level: u8,
    pub fan_lon: u8,
    pub fan_lat: u8,
    pub mode: DigitMode,
    /// Absolute cell width/height in degrees at this level, used by the
    /// cell enumerator (C3) and reported in a `Cell`'s `size` field.
    pub lon_deg: f64,
    pub lat_deg: f64,
    /// Approximate equatorial size in kilometres, reference-only (§4.1).
    pub approx_lon_km: f64,
    pub approx_lat_km: f64,
}

pub const LEVEL1_LON_DEG: f64 = 6.0;
pub const LEVEL1_LAT_DEG: f64 = 4.0;

pub const LEVELS: [LevelSpec; 15] = [
    LevelSpec { level: 2, fan_lon: 2, fan_lat: 2, mode: DigitMode::ZOrder, lon_deg: 3.0, lat_deg: 2.0, approx_lon_km: 384.0, approx_lat_km: 256.0 },
    LevelSpec { level: 3, fan_lon: 6, fan_lat: 4, mode: DigitMode::Raw, lon_deg: 0.5, lat_deg: 0.5, approx_lon_km: 55.66, approx_lat_km: 55.66 },
    LevelSpec { level: 4, fan_lon: 2, fan_lat: 3, mode: DigitMode::ZOrder, lon_deg: 0.25, lat_deg: 1.0 / 6.0, approx_lon_km: 27.83, approx_lat_km: 18.55 },
    LevelSpec { level: 5, fan_lon: 3, fan_lat: 2, mode: DigitMode::ZOrder, lon_deg: 1.0 / 12.0, lat_deg: 1.0 / 12.0, approx_lon_km: 9.27, approx_lat_km: 9.27 },
    LevelSpec { level: 6, fan_lon: 5, fan_lat: 5, mode: DigitMode::Raw, lon_deg: 1.0 / 60.0, lat_deg: 1.0 / 60.0, approx_lon_km: 1.85, approx_lat_km: 1.85 },
    LevelSpec { level: 7, fan_lon: 5, fan_lat: 5, mode: DigitMode::Raw, lon_deg: 1.0 / 300.0, lat_deg: 1.0 / 300.0, approx_lon_km: 0.371_06, approx_lat_km: 0.371_06 },
    LevelSpec { level: 8, fan_lon: 3, fan_lat: 3, mode: DigitMode::ZOrder, lon_deg: 1.0 / 900.0, lat_deg: 1.0 / 900.0, approx_lon_km: 0.123_69, approx_lat_km: 0.123_69 },
    LevelSpec { level: 9, fan_lon: 2, fan_lat: 2, mode: DigitMode::ZOrder, lon_deg: 1.0 / 1800.0, lat_deg: 1.0 / 1800.0, approx_lon_km: 0.061_84, approx_lat_km: 0.061_84 },
    LevelSpec { level: 10, fan_lon: 2, fan_lat: 2, mode: DigitMode::ZOrder, lon_deg: 1.0 / 3600.0, lat_deg: 1.0 / 3600.0, approx_lon_km: 0.030_9, approx_lat_km: 0.030_9 },
    LevelSpec { level: 11, fan_lon: 2, fan_lat: 2, mode: DigitMode::ZOrder, lon_deg: 1.0 / 7200.0, lat_deg: 1.0 / 7200.0, approx_lon_km: 0.015_46, approx_lat_km: 0.015_46 },
    LevelSpec { level: 12, fan_lon: 2, fan_lat: 2, mode: DigitMode::ZOrder, lon_deg: 1.0 / 14400.0, lat_deg: 1.0 / 14400.0, approx_lon_km: 0.007_73, approx_lat_km: 0.007_73 },
    LevelSpec { level: 13, fan_lon: 2, fan_lat: 2, mode: DigitMode::ZOrder, lon_deg: 1.0 / 28800.0, lat_deg: 1.0 / 28800.0, approx_lon_km: 0.003_86, approx_lat_km: 0.003_86 },
    LevelSpec { level: 14, fan_lon: 2, fan_lat: 2, mode: DigitMode::ZOrder, lon_deg: 1.0 / 57600.0, lat_deg: 1.0 / 57600.0, approx_lon_km: 0.001_93, approx_lat_km: 0.001_93 },
    LevelSpec { level: 15, fan_lon: 2, fan_lat: 2, mode: DigitMode::ZOrder, lon_deg: 1.0 / 115200.0, lat_deg: 1.0 / 115200.0, approx_lon_km: 0.000_97, approx_lat_km: 0.000_97 },
    LevelSpec { level: 16, fan_lon: 2, fan_lat: 2, mode: DigitMode::ZOrder, lon_deg: 1.0 / 230400.0, lat_deg: 1.0 / 230400.0, approx_lon_km: 0.000_48, approx_lat_km: 0.000_48 },
];

/// Look up the spec for level `L` (2..=16); level 1 is handled separately
/// by the codec since it writes the hemisphere letter and a 2-digit/
/// 1-letter pair rather than a table-driven digit group.
pub fn level_spec(level: u8) -> Option<&'static LevelSpec> {
    LEVELS.iter().find(|spec| spec.level == level)
}

/// Accepted code lengths, in level order (index 0 is level 1).
pub const ACCEPTED_LENGTHS: [usize; 16] = [
    4, 5, 7, 8, 9, 12, 15, 17, 19, 21, 23, 25, 27, 29, 31, 33,
];

pub fn level_from_length(length: usize) -> Option<u8> {
    ACCEPTED_LENGTHS
        .iter()
        .position(|&l| l == length)
        .map(|idx| (idx + 1) as u8)
}

pub fn length_for_level(level: u8) -> Option<usize> {
    ACCEPTED_LENGTHS.get((level as usize).wrapping_sub(1)).copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_from_length_round_trips_with_length_for_level() {
        for level in 1..=16u8 {
            let len = length_for_level(level).unwrap();
            assert_eq!(level_from_length(len), Some(level));
        }
    }

    #[test]
    fn invalid_length_is_none() {
        assert_eq!(level_from_length(6), None);
        assert_eq!(level_from_length(0), None);
    }
}
