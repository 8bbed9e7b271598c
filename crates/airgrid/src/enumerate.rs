//! The cell enumerator (C3): fills a bounding volume with cells at a
//! given level. `SPEC_FULL.md` §4.4.

use crate::cell::{Cell, CellSize};
use crate::codec::level_spec::{level_spec, LEVEL1_LAT_DEG, LEVEL1_LON_DEG};
use crate::codec::{self, altitude};
use crate::error::{Error, Result};
use crate::rounding::{round_altitude, round_coord};

/// An axis-aligned region to enumerate, in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BBox {
    pub lon_min: f64,
    pub lon_max: f64,
    pub lat_min: f64,
    pub lat_max: f64,
}

impl BBox {
    pub fn new(lon_min: f64, lon_max: f64, lat_min: f64, lat_max: f64) -> Self {
        BBox { lon_min, lon_max, lat_min, lat_max }
    }
}

pub(crate) fn cell_lon_lat_deg(level: u8) -> (f64, f64) {
    if level == 1 {
        (LEVEL1_LON_DEG, LEVEL1_LAT_DEG)
    } else {
        let spec = level_spec(level).expect("level_spec covers 2..=16");
        (spec.lon_deg, spec.lat_deg)
    }
}

fn cell_approx_km(level: u8) -> (f64, f64) {
    if level == 1 {
        (768.0, 512.0)
    } else {
        let spec = level_spec(level).expect("level_spec covers 2..=16");
        (spec.approx_lon_km, spec.approx_lat_km)
    }
}

/// Step-aligned start offsets covering `[min_val, max_val]` with `step`,
/// per §4.4: floor the lower bound to a multiple of the step, then walk
/// forward including every start whose cell overlaps the requested range.
/// All arithmetic is rounded to 9 decimals to suppress floating drift.
pub fn generate_starts(min_val: f64, max_val: f64, step: f64) -> Vec<f64> {
    if step <= 0.0 {
        return Vec::new();
    }
    let mut starts = Vec::new();
    let mut current = round_coord((min_val / step).floor() * step);
    loop {
        let end = round_coord(current + step);
        if end > min_val && current < max_val {
            starts.push(current);
        }
        current = round_coord(current + step);
        if current > max_val {
            break;
        }
    }
    starts
}

/// Altitude band width at level `L >= 6`: `1000 / 2^(L-5)`. This is the
/// enumerator's own altitude fan-out and is independent of the altitude
/// *digit* codec in `codec::altitude` (see `SPEC_FULL.md` §4.2 vs §4.4).
pub fn altitude_step(level: u8) -> f64 {
    altitude::MAX_ELEVATION / 2f64.powi((level - 5) as i32)
}

/// Enumerate every cell of `level` intersecting `bbox` (and, for `level >=
/// 6`, `[alt_min, alt_max]`). Cells are produced in longitude-major,
/// latitude-secondary, altitude-tertiary order.
pub fn generate(bbox: BBox, level: u8, alt_min: f64, alt_max: f64) -> Result<Vec<Cell>> {
    codec::validate_level(level)?;
    if bbox.lon_min >= bbox.lon_max || bbox.lat_min >= bbox.lat_max {
        return Err(Error::InvalidBBox);
    }
    let (lon_step, lat_step) = cell_lon_lat_deg(level);
    let (approx_lon, approx_lat) = cell_approx_km(level);

    let lon_starts = generate_starts(bbox.lon_min, bbox.lon_max, lon_step);
    let lat_starts = generate_starts(bbox.lat_min, bbox.lat_max, lat_step);

    let mut cells = Vec::new();
    for &lon in &lon_starts {
        for &lat in &lat_starts {
            let cell_bbox = [
                round_coord(lon),
                round_coord(lat),
                round_coord(lon + lon_step),
                round_coord(lat + lat_step),
            ];
            let centre_lon = round_coord(lon + lon_step / 2.0);
            let centre_lat = round_coord(lat + lat_step / 2.0);
            let size = CellSize { lon: approx_lon, lat: approx_lat, unit: "km" };

            if level >= 6 {
                let delta_h = altitude_step(level);
                for alt in generate_starts(alt_min, alt_max, delta_h) {
                    let alt_lo = round_altitude(alt);
                    let alt_hi = round_altitude(alt + delta_h);
                    let centre_alt = round_altitude(alt + delta_h / 2.0);
                    let code = codec::encode(centre_lon, centre_lat, centre_alt, level)?;
                    cells.push(Cell {
                        level,
                        bbox: cell_bbox,
                        centre: [centre_lon, centre_lat],
                        size,
                        code,
                        alt_range: (alt_lo, alt_hi),
                        cellid: 0,
                    });
                }
            } else {
                let code = codec::encode(centre_lon, centre_lat, alt_min, level)?;
                cells.push(Cell {
                    level,
                    bbox: cell_bbox,
                    centre: [centre_lon, centre_lat],
                    size,
                    code,
                    alt_range: (0.0, altitude::MAX_ELEVATION),
                    cellid: 0,
                });
            }
        }
    }
    Ok(cells)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level6_bbox_produces_expected_count() {
        let bbox = BBox::new(116.0, 116.8, 39.5, 40.3);
        let cells = generate(bbox, 6, 0.0, 300.0).unwrap();
        // alt_step(6) = 1000/2^(6-5) = 500, so [0, 300] yields a single
        // altitude start; the fan is lon x lat only here.
        assert_eq!(cells.len(), 48 * 48);
        for cell in &cells {
            assert_relative_eq_bbox(cell);
        }
    }

    fn assert_relative_eq_bbox(cell: &Cell) {
        assert!(cell.bbox[0] < cell.bbox[2]);
        assert!(cell.bbox[1] < cell.bbox[3]);
        assert!(cell.alt_range.0 < cell.alt_range.1);
    }

    #[test]
    fn start_offsets_are_monotone_and_step_aligned() {
        let starts = generate_starts(116.0, 116.8, 1.0 / 900.0);
        for w in starts.windows(2) {
            assert!(w[1] > w[0]);
        }
    }

    #[test]
    fn empty_step_yields_no_starts() {
        assert!(generate_starts(0.0, 1.0, 0.0).is_empty());
        assert!(generate_starts(0.0, 1.0, -1.0).is_empty());
    }
}
