//! The `Cell` value type (`SPEC_FULL.md` §3).

use serde::{Deserialize, Serialize};

/// Approximate equatorial size of a cell, in kilometres.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CellSize {
    pub lon: f64,
    pub lat: f64,
    pub unit: &'static str,
}

/// A single immutable tile of the grid at a given level.
///
/// Invariants: `bbox[0] < bbox[2]`, `bbox[1] < bbox[3]`,
/// `0.0 <= alt_range.0 < alt_range.1 <= MAX_ELEVATION`, `centre` is the
/// midpoint of `bbox`, and `code` is the code of `centre` at `level`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    pub level: u8,
    /// `[lon_min, lat_min, lon_max, lat_max]`.
    pub bbox: [f64; 4],
    /// `[lon_centre, lat_centre]`.
    pub centre: [f64; 2],
    pub size: CellSize,
    pub code: String,
    /// `(alt_min, alt_max)` in metres.
    pub alt_range: (f64, f64),
    /// Opaque sequence number assigned by the manager on `generate`;
    /// `0` for cells not yet inserted into a manager's store.
    pub cellid: u64,
}

impl Cell {
    pub fn lon_min(&self) -> f64 {
        self.bbox[0]
    }
    pub fn lat_min(&self) -> f64 {
        self.bbox[1]
    }
    pub fn lon_max(&self) -> f64 {
        self.bbox[2]
    }
    pub fn lat_max(&self) -> f64 {
        self.bbox[3]
    }

    pub fn contains(&self, lon: f64, lat: f64) -> bool {
        lon >= self.lon_min() && lon < self.lon_max() && lat >= self.lat_min() && lat < self.lat_max()
    }

    pub fn contains_altitude(&self, alt: f64) -> bool {
        alt >= self.alt_range.0 && alt <= self.alt_range.1
    }
}
