//! Route-to-cells (C4): snap an ordered list of waypoints to the
//! deduplicated sequence of level-`L` cell codes they traverse.
//! `SPEC_FULL.md` §4.5.
//!
//! Two details are deliberately faithful to the distilled spec's open
//! questions rather than "fixed" — see `SPEC_FULL.md` §10:
//! - altitude is always snapped with the fixed `1000 / 2^6` denominator,
//!   independent of `L` (open question 1);
//! - the operational bounding box is an explicit parameter, defaulting to
//!   a box derived from the waypoints rather than a hardcoded city box
//!   (open question 4).

use crate::cell::{Cell, CellSize};
use crate::codec;
use crate::enumerate::{cell_lon_lat_deg, generate_starts, BBox};
use crate::error::{Error, Result};
use crate::rounding::{round_altitude, round_coord};
use tracing::debug;

/// A single point along a route: a geodetic position with altitude.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Waypoint {
    pub lon: f64,
    pub lat: f64,
    pub alt: f64,
}

/// Fixed altitude snapping step used by the route pass, independent of
/// the target level (open question 1).
const ROUTE_ALT_STEP: f64 = 1000.0 / 64.0; // 1000 / 2^6

fn snap(v: f64, starts: &[f64], step: f64) -> f64 {
    if starts.is_empty() {
        return round_coord(v);
    }
    let s0 = starts[0];
    let mut k = ((v - s0) / step).round() as i64;
    k = k.clamp(0, starts.len() as i64 - 1);
    loop {
        let s_k = starts[k as usize];
        if v < s_k && k > 0 {
            k -= 1;
            continue;
        }
        if v >= s_k + step && (k as usize) < starts.len() - 1 {
            k += 1;
            continue;
        }
        return s_k;
    }
}

fn waypoints_bbox(waypoints: &[Waypoint], lon_step: f64, lat_step: f64) -> BBox {
    let lon_min = waypoints.iter().map(|w| w.lon).fold(f64::INFINITY, f64::min);
    let lon_max = waypoints.iter().map(|w| w.lon).fold(f64::NEG_INFINITY, f64::max);
    let lat_min = waypoints.iter().map(|w| w.lat).fold(f64::INFINITY, f64::min);
    let lat_max = waypoints.iter().map(|w| w.lat).fold(f64::NEG_INFINITY, f64::max);
    BBox::new(lon_min - lon_step, lon_max + lon_step, lat_min - lat_step, lat_max + lat_step)
}

/// Snap `waypoints` to level-`L` cells, returning the ordered,
/// deduplicated code sequence and the last constructed cell.
///
/// `bbox` restricts the start-offset grid the snapping is computed
/// against; when absent, a box derived from the waypoints is used.
pub fn route_to_cells(waypoints: &[Waypoint], level: u8, bbox: Option<BBox>) -> Result<(Vec<String>, Cell)> {
    codec::validate_level(level)?;
    if waypoints.is_empty() {
        return Err(Error::EmptyWaypoints);
    }

    let (lon_step, lat_step) = cell_lon_lat_deg(level);
    let bbox = bbox.unwrap_or_else(|| waypoints_bbox(waypoints, lon_step, lat_step));
    let lon_starts = generate_starts(bbox.lon_min, bbox.lon_max, lon_step);
    let lat_starts = generate_starts(bbox.lat_min, bbox.lat_max, lat_step);
    let alt_starts = generate_starts(0.0, codec::altitude::MAX_ELEVATION, ROUTE_ALT_STEP);

    let mut codes = Vec::new();
    let mut last_cell: Option<Cell> = None;

    for wp in waypoints {
        let snapped_lon = snap(wp.lon, &lon_starts, lon_step);
        let snapped_lat = snap(wp.lat, &lat_starts, lat_step);
        let snapped_alt = snap(wp.alt, &alt_starts, ROUTE_ALT_STEP);

        let centre_lon = round_coord(snapped_lon + lon_step / 2.0);
        let centre_lat = round_coord(snapped_lat + lat_step / 2.0);
        let centre_alt = round_altitude(snapped_alt + ROUTE_ALT_STEP / 2.0);

        let code = codec::encode(centre_lon, centre_lat, centre_alt, level)?;
        let cell = Cell {
            level,
            bbox: [
                round_coord(snapped_lon),
                round_coord(snapped_lat),
                round_coord(snapped_lon + lon_step),
                round_coord(snapped_lat + lat_step),
            ],
            centre: [centre_lon, centre_lat],
            size: CellSize { lon: 0.0, lat: 0.0, unit: "km" },
            code: code.clone(),
            alt_range: (round_altitude(snapped_alt), round_altitude(snapped_alt + ROUTE_ALT_STEP)),
            cellid: 0,
        };

        if codes.last() != Some(&code) {
            codes.push(code);
        }
        last_cell = Some(cell);
    }

    let last_cell = last_cell.expect("waypoints is non-empty, checked above");
    debug!(count = codes.len(), level, "snapped route to cells");
    Ok((codes, last_cell))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_waypoint_round_trips_to_its_own_code() {
        let wp = Waypoint { lon: 114.05, lat: 22.55, alt: 100.0 };
        let (codes, _last) = route_to_cells(&[wp], 8, None).unwrap();
        assert_eq!(codes.len(), 1);
        let expected = codec::encode(114.05, 22.55, 100.0, 8).unwrap();
        // Both go through the same snapping grid; a single-waypoint route's
        // bbox is built around that one point, so its snapped cell centre
        // coincides with its own point-to-cell mapping.
        let decoded_got = codec::decode(&codes[0]).unwrap();
        let decoded_expected = codec::decode(&expected).unwrap();
        assert_eq!(decoded_got.bbox, decoded_expected.bbox);
    }

    #[test]
    fn never_emits_two_equal_consecutive_codes() {
        let waypoints = [
            Waypoint { lon: 114.05, lat: 22.55, alt: 100.0 },
            Waypoint { lon: 114.050001, lat: 22.550001, alt: 100.0 },
            Waypoint { lon: 114.08, lat: 22.58, alt: 150.0 },
        ];
        let (codes, _) = route_to_cells(&waypoints, 8, None).unwrap();
        for w in codes.windows(2) {
            assert_ne!(w[0], w[1]);
        }
        assert!(!codes.is_empty());
    }

    #[test]
    fn empty_waypoints_is_an_error() {
        assert!(route_to_cells(&[], 8, None).is_err());
    }
}
