//! The manager façade (C7): composes the codec, enumerator, route pass,
//! conflict detector and attribute store behind an in-memory `code ->
//! Cell` store. `SPEC_FULL.md` §4.8.

use std::collections::HashMap;

use chrono::Utc;
use tracing::info;

use crate::attributes::{AttributeRecord, AttributeStore, Category, Clock};
use crate::cell::Cell;
use crate::codec;
use crate::enumerate::{self, BBox};
use crate::error::{Error, Result};
use crate::route::{self, Waypoint};

/// Aggregate counts returned by [`Manager::stats`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Stats {
    pub total: usize,
    pub per_level: HashMap<u8, usize>,
}

struct SystemClock;
impl Clock for SystemClock {
    fn now_iso8601(&self) -> String {
        Utc::now().to_rfc3339()
    }
}

/// The façade a caller (the HTTP surface, or a direct library consumer)
/// holds: an in-memory `code -> Cell` map built up by [`Manager::generate`]
/// calls, plus the attribute store (C6). Mutations require exclusive
/// access; §5 "Shared resources" places a single mutex around a whole
/// `Manager` at the HTTP boundary rather than splitting reads and writes.
#[derive(Default)]
pub struct Manager {
    cells: HashMap<String, Cell>,
    attributes: AttributeStore,
    next_cellid: u64,
}

impl Manager {
    pub fn new() -> Self {
        Manager::default()
    }

    /// Enumerate every cell of `level` in `bbox` between `alt_min` and
    /// `alt_max`, upserting each into the in-memory store and returning
    /// the produced cells in the enumerator's longitude-major order.
    pub fn generate(&mut self, bbox: BBox, level: u8, alt_min: f64, alt_max: f64) -> Result<Vec<Cell>> {
        let mut cells = enumerate::generate(bbox, level, alt_min, alt_max)?;
        for cell in &mut cells {
            self.next_cellid += 1;
            cell.cellid = self.next_cellid;
            self.cells.insert(cell.code.clone(), cell.clone());
        }
        info!(count = cells.len(), level, "generated and stored cells");
        Ok(cells)
    }

    /// Look up a previously-generated cell by its code. Returns
    /// `UnknownCode` if the code has never been produced by `generate`,
    /// even if it would decode validly.
    pub fn get_by_code(&self, code: &str) -> Result<&Cell> {
        self.cells.get(code).ok_or_else(|| Error::UnknownCode(code.to_string()))
    }

    /// Every stored cell whose centre falls inside `bbox`.
    pub fn get_by_area(&self, bbox: BBox) -> Vec<&Cell> {
        self.cells
            .values()
            .filter(|cell| {
                let [lon, lat] = cell.centre;
                lon >= bbox.lon_min && lon <= bbox.lon_max && lat >= bbox.lat_min && lat <= bbox.lat_max
            })
            .collect()
    }

    pub fn encode_coords(&self, lon: f64, lat: f64, alt: f64, level: u8) -> Result<String> {
        codec::encode(lon, lat, alt, level)
    }

    pub fn decode_code(&self, code: &str) -> Result<codec::Decoded> {
        codec::decode(code)
    }

    pub fn route(&self, waypoints: &[Waypoint], level: u8, bbox: Option<BBox>) -> Result<(Vec<String>, Cell)> {
        route::route_to_cells(waypoints, level, bbox)
    }

    pub fn put_attribute(&mut self, code: &str, category: Category, key: &str, value: &str) {
        self.attributes.put(code, category, key, value, &SystemClock);
    }

    pub fn get_attributes(&self, code: &str) -> Option<&AttributeRecord> {
        self.attributes.get(code)
    }

    pub fn search(&self, category: Category, key: &str, value: &str) -> Vec<&Cell> {
        self.attributes
            .search(category, key, value)
            .into_iter()
            .filter_map(|code| self.cells.get(&code))
            .collect()
    }

    pub fn stats(&self) -> Stats {
        let mut per_level = HashMap::new();
        for cell in self.cells.values() {
            *per_level.entry(cell.level).or_insert(0) += 1;
        }
        Stats { total: self.cells.len(), per_level }
    }

    pub fn cells(&self) -> &HashMap<String, Cell> {
        &self.cells
    }

    pub fn attribute_store(&self) -> &AttributeStore {
        &self.attributes
    }

    /// Replace the manager's entire in-memory state, used by
    /// `import_json` (C8).
    pub fn replace_state(&mut self, cells: HashMap<String, Cell>, attributes: AttributeStore) {
        self.next_cellid = cells.values().map(|c| c.cellid).max().unwrap_or(0);
        self.cells = cells;
        self.attributes = attributes;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generate_upserts_into_store_and_stats_reflect_it() {
        let mut manager = Manager::new();
        let bbox = BBox::new(114.0, 114.1, 22.0, 22.1);
        let cells = manager.generate(bbox, 4, 0.0, 1000.0).unwrap();
        assert!(!cells.is_empty());
        assert_eq!(manager.stats().total, cells.len());
        assert_eq!(manager.stats().per_level.get(&4), Some(&cells.len()));
    }

    #[test]
    fn get_by_code_only_finds_previously_generated_cells() {
        let mut manager = Manager::new();
        let bbox = BBox::new(114.0, 114.1, 22.0, 22.1);
        let cells = manager.generate(bbox, 4, 0.0, 1000.0).unwrap();
        let code = &cells[0].code;
        assert!(manager.get_by_code(code).is_ok());
        assert!(manager.get_by_code("N50A").is_err());
    }

    #[test]
    fn attribute_put_then_search_finds_the_cell() {
        let mut manager = Manager::new();
        let bbox = BBox::new(114.0, 114.1, 22.0, 22.1);
        let cells = manager.generate(bbox, 4, 0.0, 1000.0).unwrap();
        let code = cells[0].code.clone();
        manager.put_attribute(&code, Category::FlightRules, "class", "A");
        let found = manager.search(Category::FlightRules, "class", "A");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].code, code);
    }

    #[test]
    fn cellid_assigned_monotonically_across_generate_calls() {
        let mut manager = Manager::new();
        let bbox = BBox::new(114.0, 114.1, 22.0, 22.1);
        let first = manager.generate(bbox, 4, 0.0, 1000.0).unwrap();
        let second = manager.generate(bbox, 4, 0.0, 1000.0).unwrap();
        assert!(second[0].cellid > first[0].cellid);
    }

    /// End-to-end: generate -> encode -> route -> export -> import,
    /// exercising the full façade surface in one pass (`SPEC_FULL.md` §9
    /// "Test tooling").
    #[test]
    fn generate_encode_route_export_import_round_trip() {
        use crate::json::{export_json, import_json};
        use crate::route::Waypoint;
        use std::fs;

        let mut manager = Manager::new();
        let bbox = BBox::new(114.0, 114.2, 22.4, 22.6);
        let generated = manager.generate(bbox, 8, 0.0, 1000.0).unwrap();
        assert!(!generated.is_empty());

        let code = manager.encode_coords(114.05, 22.45, 50.0, 8).unwrap();
        assert!(manager.get_by_code(&code).is_ok());
        manager.put_attribute(&code, Category::FlightRules, "class", "controlled");

        let waypoints = [
            Waypoint { lon: 114.05, lat: 22.45, alt: 50.0 },
            Waypoint { lon: 114.15, lat: 22.55, alt: 200.0 },
        ];
        let (route_codes, _last_cell) = manager.route(&waypoints, 8, None).unwrap();
        assert!(!route_codes.is_empty());

        let dir = std::env::temp_dir().join(format!("airgrid-facade-test-{:?}", std::thread::current().id()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("state.json");

        export_json(&manager, &path).unwrap();
        let mut restored = Manager::new();
        import_json(&mut restored, &path).unwrap();

        assert_eq!(restored.stats(), manager.stats());
        assert_eq!(restored.get_by_code(&code).unwrap(), manager.get_by_code(&code).unwrap());
        assert_eq!(
            restored.get_attributes(&code).unwrap().flight_rules.get("class"),
            Some(&"controlled".to_string())
        );

        fs::remove_file(&path).ok();
        fs::remove_dir(&dir).ok();
    }
}
