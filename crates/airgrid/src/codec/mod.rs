//! The hierarchical codec (C1): `encode(lon, lat, alt, level) -> code` and
//! `decode(code) -> Decoded`. See `SPEC_FULL.md` §4.1–§4.3.

pub mod altitude;
pub mod level_spec;

use crate::error::{Error, Result};
use crate::rounding::{round_altitude, round_coord};
use level_spec::{level_spec, DigitMode, LEVEL1_LAT_DEG, LEVEL1_LON_DEG};
use tracing::debug;

/// The result of decoding a code: the cell it names, without the `Cell`
/// type's `size`/`cellid` bookkeeping (those are filled in by whoever
/// holds a `Manager`; the bare codec doesn't know about either).
#[derive(Debug, Clone, PartialEq)]
pub struct Decoded {
    pub level: u8,
    pub bbox: [f64; 4],
    pub centre: [f64; 2],
    pub alt_range: (f64, f64),
    pub lon_step: f64,
    pub lat_step: f64,
}

pub fn validate_level(level: u8) -> Result<()> {
    if (1..=16).contains(&level) {
        Ok(())
    } else {
        Err(Error::LevelOutOfRange(level))
    }
}

fn validate_coords(lon: f64, lat: f64, alt: f64) -> Result<()> {
    if !(-180.0..=180.0).contains(&lon) {
        return Err(Error::LongitudeOutOfRange(lon));
    }
    if !(-90.0..=90.0).contains(&lat) {
        return Err(Error::LatitudeOutOfRange(lat));
    }
    if !(0.0..=altitude::MAX_ELEVATION).contains(&alt) {
        return Err(Error::AltitudeOutOfRange(alt));
    }
    Ok(())
}

fn digit_to_char(digit: i64) -> char {
    char::from_digit(digit as u32, 10).expect("digit is always 0..9 by construction")
}

/// Encode a geodetic point to the code of the cell containing it at
/// `level`.
pub fn encode(lon: f64, lat: f64, alt: f64, level: u8) -> Result<String> {
    validate_level(level)?;
    validate_coords(lon, lat, alt)?;

    let mut lon = round_coord(lon);
    let lat = round_coord(lat);
    let alt = round_altitude(alt);
    if lon == 180.0 {
        lon = -180.0;
    }

    let hemisphere = if lat >= 0.0 { 'N' } else { 'S' };
    let lat_idx = if lat.abs() == 90.0 {
        22
    } else {
        (lat.abs() / 4.0).floor() as i64
    };
    let lon_idx = ((lon + 180.0) / 6.0).floor() as i64 + 1;

    let mut code = format!("{hemisphere}{lon_idx:02}{}", (b'A' + lat_idx as u8) as char);
    debug!(lon, lat, alt, level, code, "encoded level-1 cell");
    if level == 1 {
        return Ok(code);
    }

    let alt_digits = if level >= 6 {
        Some(altitude::encode(alt)?)
    } else {
        None
    };
    let mut alt_cursor = 0usize;

    let mirror_lon = lon < 0.0;
    let mirror_lat = lat >= 0.0;
    let mut parent_lon_step = LEVEL1_LON_DEG;
    let mut parent_lat_step = LEVEL1_LAT_DEG;

    for lvl in 2..=level {
        let spec = level_spec(lvl).expect("level_spec covers 2..=16");
        let lon_remain = lon.abs() % parent_lon_step;
        let lat_remain = lat.abs() % parent_lat_step;

        let idx_lon = ((lon_remain / spec.lon_deg).floor() as i64).clamp(0, spec.fan_lon as i64 - 1);
        let idx_lat = ((lat_remain / spec.lat_deg).floor() as i64).clamp(0, spec.fan_lat as i64 - 1);

        let mirrored_col = if mirror_lon { spec.fan_lon as i64 - 1 - idx_lon } else { idx_lon };
        let mirrored_row = if mirror_lat { spec.fan_lat as i64 - 1 - idx_lat } else { idx_lat };

        match spec.mode {
            DigitMode::ZOrder => {
                let digit = mirrored_row * spec.fan_lon as i64 + mirrored_col;
                code.push(digit_to_char(digit));
            }
            DigitMode::Raw => {
                code.push(digit_to_char(mirrored_col));
                code.push(digit_to_char(mirrored_row));
            }
        }

        if lvl >= 6 {
            let digits = alt_digits.as_ref().expect("alt_digits is Some for level >= 6");
            code.push(digit_to_char(digits[alt_cursor] as i64));
            alt_cursor += 1;
        }

        parent_lon_step = spec.lon_deg;
        parent_lat_step = spec.lat_deg;
    }

    debug!(code, level, "encoded cell");
    Ok(code)
}

fn char_digit(c: char, pos: usize) -> Result<i64> {
    c.to_digit(10).map(|d| d as i64).ok_or(Error::InvalidDigit(c, pos))
}

/// Decode a code back to the cell it names.
pub fn decode(code: &str) -> Result<Decoded> {
    if code.is_empty() {
        return Err(Error::EmptyCode);
    }
    let chars: Vec<char> = code.chars().collect();
    let level = level_spec::level_from_length(chars.len()).ok_or(Error::InvalidCodeLength(chars.len()))?;

    let mut cursor = 0usize;
    let hemisphere_char = chars[cursor];
    cursor += 1;
    if hemisphere_char != 'N' && hemisphere_char != 'S' {
        return Err(Error::InvalidHemisphere(hemisphere_char));
    }
    let is_north = hemisphere_char == 'N';

    if cursor + 2 > chars.len() {
        return Err(Error::TruncatedCode(cursor));
    }
    let lon_str: String = chars[cursor..cursor + 2].iter().collect();
    if !lon_str.chars().all(|c| c.is_ascii_digit()) {
        return Err(Error::InvalidLongitudeDigits(lon_str));
    }
    let lon_idx: i64 = lon_str.parse().expect("validated all-digit above");
    cursor += 2;
    if !(1..=60).contains(&lon_idx) {
        return Err(Error::InvalidLongitudeDigits(lon_str));
    }

    let lat_char = chars[cursor];
    cursor += 1;
    if !('A'..='W').contains(&lat_char) {
        return Err(Error::InvalidLatitudeLetter(lat_char));
    }
    let lat_idx = (lat_char as u8 - b'A') as i64;

    let mut lon_min = -180.0 + (lon_idx - 1) as f64 * 6.0;
    let mut lon_max = lon_min + 6.0;
    let mut lat_min;
    let mut lat_max;
    if is_north {
        lat_min = lat_idx as f64 * 4.0;
        lat_max = lat_min + 4.0;
    } else {
        lat_max = -(lat_idx as f64 * 4.0);
        lat_min = lat_max - 4.0;
    }

    let mirror_lon = (lon_min + lon_max) / 2.0 < 0.0;
    let mirror_lat = is_north;

    let mut alt_digits: Vec<u8> = Vec::with_capacity(altitude::ALTITUDE_DIGITS);

    for lvl in 2..=level {
        let spec = level_spec(lvl).expect("level_spec covers 2..=16");
        let fan_lon = spec.fan_lon as i64;
        let fan_lat = spec.fan_lat as i64;

        let (idx_col, idx_row) = match spec.mode {
            DigitMode::ZOrder => {
                if cursor >= chars.len() {
                    return Err(Error::TruncatedCode(cursor));
                }
                let digit = char_digit(chars[cursor], cursor)?;
                cursor += 1;
                let mirrored_row = digit / fan_lon;
                let mirrored_col = digit % fan_lon;
                let idx_row = if mirror_lat { fan_lat - 1 - mirrored_row } else { mirrored_row };
                let idx_col = if mirror_lon { fan_lon - 1 - mirrored_col } else { mirrored_col };
                (idx_col, idx_row)
            }
            DigitMode::Raw => {
                if cursor + 2 > chars.len() {
                    return Err(Error::TruncatedCode(cursor));
                }
                let mirrored_col = char_digit(chars[cursor], cursor)?;
                let mirrored_row = char_digit(chars[cursor + 1], cursor + 1)?;
                cursor += 2;
                let idx_col = if mirror_lon { fan_lon - 1 - mirrored_col } else { mirrored_col };
                let idx_row = if mirror_lat { fan_lat - 1 - mirrored_row } else { mirrored_row };
                (idx_col, idx_row)
            }
        };

        if !(0..fan_lon).contains(&idx_col) || !(0..fan_lat).contains(&idx_row) {
            return Err(Error::InvalidDigit(chars[cursor.saturating_sub(1)], cursor.saturating_sub(1)));
        }

        let lon_span = (lon_max - lon_min) / fan_lon as f64;
        lon_min += idx_col as f64 * lon_span;
        lon_max = lon_min + lon_span;

        let lat_span = (lat_max - lat_min) / fan_lat as f64;
        if is_north {
            lat_min += idx_row as f64 * lat_span;
            lat_max = lat_min + lat_span;
        } else {
            lat_max -= idx_row as f64 * lat_span;
            lat_min = lat_max - lat_span;
        }

        if lvl >= 6 {
            if cursor >= chars.len() {
                return Err(Error::TruncatedCode(cursor));
            }
            let digit = char_digit(chars[cursor], cursor)? as u8;
            cursor += 1;
            alt_digits.push(digit);
        }
    }

    let alt_range = if level >= 6 {
        altitude::decode_prefix(&alt_digits)
    } else {
        (0.0, altitude::MAX_ELEVATION)
    };

    let centre = [(lon_min + lon_max) / 2.0, (lat_min + lat_max) / 2.0];
    Ok(Decoded {
        level,
        bbox: [lon_min, lat_min, lon_max, lat_max],
        centre,
        alt_range,
        lon_step: lon_max - lon_min,
        lat_step: lat_max - lat_min,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn level1_huizhou_cell() {
        let code = encode(114.0, 22.5, 0.0, 1).unwrap();
        assert_eq!(code.len(), 4);
        let decoded = decode(&code).unwrap();
        assert_eq!(decoded.level, 1);
        assert_relative_eq!(decoded.bbox[0], 114.0);
        assert_relative_eq!(decoded.bbox[1], 20.0);
    }

    #[test]
    fn antimeridian_and_pole_wrap() {
        let code = encode(180.0, 90.0, 0.0, 1).unwrap();
        assert_eq!(code, "N60W");
    }

    #[test]
    fn level8_scenario_from_spec() {
        let code = encode(114.1234, 22.5678, 100.0, 8).unwrap();
        assert_eq!(code.len(), 17);
        // N + level-1's 2-digit lon zone + lat letter, per the level-1 formula in §4.1.
        assert!(code.starts_with('N'));
        let decoded = decode(&code).unwrap();
        assert_relative_eq!(decoded.lon_step, 1.0 / 900.0, epsilon = 1e-9);
        assert_relative_eq!(decoded.alt_range.1 - decoded.alt_range.0, 125.0, epsilon = 1e-6);
        assert!(decoded.bbox[0] <= 114.1234 && 114.1234 <= decoded.bbox[2]);
        assert!(decoded.bbox[1] <= 22.5678 && 22.5678 <= decoded.bbox[3]);
        assert!(decoded.alt_range.0 <= 100.0 && 100.0 <= decoded.alt_range.1);
    }

    #[test]
    fn round_trip_every_level_all_quadrants() {
        let points = [
            (114.1234, 22.5678, 431.0),
            (-114.1234, 22.5678, 12.0),
            (114.1234, -22.5678, 987.0),
            (-114.1234, -22.5678, 500.5),
            (0.1, 0.1, 0.0),
            (-0.1, -0.1, 1000.0),
        ];
        for &(lon, lat, alt) in &points {
            for level in 1..=16u8 {
                let code = encode(lon, lat, alt, level).unwrap();
                let decoded = decode(&code).unwrap();
                assert_eq!(decoded.level, level, "level mismatch for {lon},{lat},{alt} @ {level}");
                assert!(
                    decoded.bbox[0] <= lon && lon <= decoded.bbox[2],
                    "lon {lon} not in {:?} at level {level}",
                    decoded.bbox
                );
                assert!(
                    decoded.bbox[1] <= lat && lat <= decoded.bbox[3],
                    "lat {lat} not in {:?} at level {level}",
                    decoded.bbox
                );
                if level >= 6 {
                    assert!(
                        decoded.alt_range.0 <= alt && alt <= decoded.alt_range.1,
                        "alt {alt} not in {:?} at level {level}",
                        decoded.alt_range
                    );
                }
            }
        }
    }

    #[test]
    fn rejects_bad_hemisphere_and_length() {
        assert!(decode("X114A").is_err());
        assert!(decode("N114AAA").is_err());
        assert!(decode("").is_err());
    }

    #[test]
    fn rejects_out_of_range_inputs() {
        assert!(encode(200.0, 0.0, 0.0, 1).is_err());
        assert!(encode(0.0, 0.0, -1.0, 6).is_err());
        assert!(encode(0.0, 0.0, 0.0, 17).is_err());
    }
}
