//! JSON persistence (C8): export/import the manager's full `code -> Cell`
//! map and attribute store against the schema in `SPEC_FULL.md` §6.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::attributes::{AttributeRecord, AttributeStore};
use crate::cell::Cell;
use crate::error::Result;
use crate::manager::Manager;

/// An attribute record as it appears on disk: the six category maps and
/// timestamps from `AttributeRecord`, plus the grid identity fields
/// (`grid_code`, `level`, `bbox`, `centre`, `alt_range`) duplicated in
/// from the matching `Cell` so the JSON document is self-describing
/// without cross-referencing `grids` (§6).
#[derive(Debug, Serialize, Deserialize)]
struct JsonAttributeEntry {
    grid_code: String,
    level: u8,
    bbox: [f64; 4],
    centre: [f64; 2],
    alt_range: (f64, f64),
    flight_rules: HashMap<String, String>,
    airspace_status: HashMap<String, String>,
    weather_conditions: HashMap<String, String>,
    risk_assessment: HashMap<String, String>,
    control_authority: HashMap<String, String>,
    dynamic_updates: HashMap<String, String>,
    created_time: String,
    last_updated: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct JsonDocument {
    grids: HashMap<String, Cell>,
    attributes: HashMap<String, JsonAttributeEntry>,
}

/// Serialize `manager`'s in-memory state to `path`, writing to a temp
/// file in the same directory first and renaming it into place so a
/// crash mid-write cannot leave a truncated file (§4.9).
pub fn export_json(manager: &Manager, path: &Path) -> Result<()> {
    let grids = manager.cells().clone();

    let mut attributes = HashMap::new();
    for (code, record) in manager.attribute_store().iter() {
        let (level, bbox, centre, alt_range) = match manager.cells().get(code) {
            Some(cell) => (cell.level, cell.bbox, cell.centre, cell.alt_range),
            None => {
                warn!(code, "exporting attribute record with no matching grid cell");
                (0, [0.0; 4], [0.0; 2], (0.0, 0.0))
            }
        };
        attributes.insert(
            code.clone(),
            JsonAttributeEntry {
                grid_code: code.clone(),
                level,
                bbox,
                centre,
                alt_range,
                flight_rules: record.flight_rules.clone(),
                airspace_status: record.airspace_status.clone(),
                weather_conditions: record.weather_conditions.clone(),
                risk_assessment: record.risk_assessment.clone(),
                control_authority: record.control_authority.clone(),
                dynamic_updates: record.dynamic_updates.clone(),
                created_time: record.created_time.clone(),
                last_updated: record.last_updated.clone(),
            },
        );
    }

    let document = JsonDocument { grids, attributes };
    let body = serde_json::to_vec_pretty(&document)?;

    let tmp_path = path.with_extension("json.tmp");
    fs::write(&tmp_path, body)?;
    fs::rename(&tmp_path, path)?;

    info!(path = %path.display(), grids = document.grids.len(), attributes = document.attributes.len(), "exported grid manager state");
    Ok(())
}

/// Read `path` back and replace `manager`'s in-memory state with it. An
/// `attributes` entry whose `grid_code` has no corresponding `grids` entry
/// is accepted as-is — attributes may outlive the grid that produced them
/// — but no `Cell` is fabricated for it (§4.9).
pub fn import_json(manager: &mut Manager, path: &Path) -> Result<()> {
    let body = fs::read(path)?;
    let document: JsonDocument = serde_json::from_slice(&body)?;

    for (code, entry) in &document.attributes {
        if !document.grids.contains_key(&entry.grid_code) {
            warn!(code, grid_code = entry.grid_code, "importing attribute record with no matching grid cell");
        }
    }

    let mut attributes = AttributeStore::new();
    for (code, entry) in document.attributes {
        attributes.insert_raw(
            code,
            AttributeRecord {
                flight_rules: entry.flight_rules,
                airspace_status: entry.airspace_status,
                weather_conditions: entry.weather_conditions,
                risk_assessment: entry.risk_assessment,
                control_authority: entry.control_authority,
                dynamic_updates: entry.dynamic_updates,
                created_time: entry.created_time,
                last_updated: entry.last_updated,
            },
        );
    }

    info!(path = %path.display(), grids = document.grids.len(), "imported grid manager state");
    manager.replace_state(document.grids, attributes);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attributes::Category;
    use crate::enumerate::BBox;

    #[test]
    fn export_then_import_round_trips_cells_and_attributes() {
        let dir = std::env::temp_dir().join(format!("airgrid-json-test-{:?}", std::thread::current().id()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("state.json");

        let mut manager = Manager::new();
        let bbox = BBox::new(114.0, 114.1, 22.0, 22.1);
        let cells = manager.generate(bbox, 4, 0.0, 1000.0).unwrap();
        let code = cells[0].code.clone();
        manager.put_attribute(&code, Category::FlightRules, "class", "A");

        export_json(&manager, &path).unwrap();

        let mut restored = Manager::new();
        import_json(&mut restored, &path).unwrap();

        assert_eq!(restored.stats().total, manager.stats().total);
        let record = restored.get_attributes(&code).unwrap();
        assert_eq!(record.flight_rules.get("class"), Some(&"A".to_string()));

        fs::remove_file(&path).ok();
        fs::remove_dir(&dir).ok();
    }

    #[test]
    fn import_accepts_attribute_with_no_matching_grid_but_fabricates_no_cell() {
        let dir = std::env::temp_dir().join(format!("airgrid-json-test-orphan-{:?}", std::thread::current().id()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("orphan.json");

        let document = JsonDocument {
            grids: HashMap::new(),
            attributes: HashMap::from([(
                "N50A".to_string(),
                JsonAttributeEntry {
                    grid_code: "N50A".to_string(),
                    level: 1,
                    bbox: [0.0; 4],
                    centre: [0.0; 2],
                    alt_range: (0.0, 0.0),
                    flight_rules: HashMap::new(),
                    airspace_status: HashMap::new(),
                    weather_conditions: HashMap::new(),
                    risk_assessment: HashMap::new(),
                    control_authority: HashMap::new(),
                    dynamic_updates: HashMap::new(),
                    created_time: "2026-01-01T00:00:00Z".to_string(),
                    last_updated: "2026-01-01T00:00:00Z".to_string(),
                },
            )]),
        };
        fs::write(&path, serde_json::to_vec(&document).unwrap()).unwrap();

        let mut manager = Manager::new();
        import_json(&mut manager, &path).unwrap();
        assert!(manager.get_attributes("N50A").is_some());
        assert!(manager.get_by_code("N50A").is_err());

        fs::remove_file(&path).ok();
        fs::remove_dir(&dir).ok();
    }
}
