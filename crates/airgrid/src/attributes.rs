//! The attribute store (C6): a `code -> six fixed categories` mapping,
//! stamped with creation/update timestamps. `SPEC_FULL.md` §3, §4.7.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// The six category names fixed by the spec; used as the argument to
/// `AttributeStore::put`/`search` and as the keys of `AttributeRecord`'s
/// JSON representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    FlightRules,
    AirspaceStatus,
    WeatherConditions,
    RiskAssessment,
    ControlAuthority,
    DynamicUpdates,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::FlightRules,
        Category::AirspaceStatus,
        Category::WeatherConditions,
        Category::RiskAssessment,
        Category::ControlAuthority,
        Category::DynamicUpdates,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::FlightRules => "flight_rules",
            Category::AirspaceStatus => "airspace_status",
            Category::WeatherConditions => "weather_conditions",
            Category::RiskAssessment => "risk_assessment",
            Category::ControlAuthority => "control_authority",
            Category::DynamicUpdates => "dynamic_updates",
        }
    }

    pub fn parse(s: &str) -> Result<Category> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| Error::UnknownCategory(s.to_string()))
    }
}

type CategoryMap = HashMap<String, String>;

/// The per-code attribute record: six named tag maps plus timestamps the
/// store itself stamps (never the caller).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AttributeRecord {
    pub flight_rules: CategoryMap,
    pub airspace_status: CategoryMap,
    pub weather_conditions: CategoryMap,
    pub risk_assessment: CategoryMap,
    pub control_authority: CategoryMap,
    pub dynamic_updates: CategoryMap,
    pub created_time: String,
    pub last_updated: String,
}

impl AttributeRecord {
    fn category_mut(&mut self, category: Category) -> &mut CategoryMap {
        match category {
            Category::FlightRules => &mut self.flight_rules,
            Category::AirspaceStatus => &mut self.airspace_status,
            Category::WeatherConditions => &mut self.weather_conditions,
            Category::RiskAssessment => &mut self.risk_assessment,
            Category::ControlAuthority => &mut self.control_authority,
            Category::DynamicUpdates => &mut self.dynamic_updates,
        }
    }

    pub fn category(&self, category: Category) -> &CategoryMap {
        match category {
            Category::FlightRules => &self.flight_rules,
            Category::AirspaceStatus => &self.airspace_status,
            Category::WeatherConditions => &self.weather_conditions,
            Category::RiskAssessment => &self.risk_assessment,
            Category::ControlAuthority => &self.control_authority,
            Category::DynamicUpdates => &self.dynamic_updates,
        }
    }
}

/// A clock abstraction so the store's timestamp stamping is testable
/// without depending on wall-clock time; the manager wires this to a
/// real `chrono::Utc::now` ISO-8601 stamp in production use.
pub trait Clock: Send + Sync {
    fn now_iso8601(&self) -> String;
}

/// `code -> AttributeRecord`, a plain in-memory map. Not indexed: `search`
/// is a linear scan, sized for an operator's working set of grid cells
/// rather than a production-scale spatial index (§4.7).
#[derive(Debug, Default)]
pub struct AttributeStore {
    records: HashMap<String, AttributeRecord>,
}

impl AttributeStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&mut self, code: &str, category: Category, key: &str, value: &str, clock: &dyn Clock) {
        let now = clock.now_iso8601();
        let record = self.records.entry(code.to_string()).or_insert_with(|| AttributeRecord {
            created_time: now.clone(),
            last_updated: now.clone(),
            ..Default::default()
        });
        record.category_mut(category).insert(key.to_string(), value.to_string());
        record.last_updated = now;
    }

    pub fn get(&self, code: &str) -> Option<&AttributeRecord> {
        self.records.get(code)
    }

    pub fn get_category(&self, code: &str, category: Category) -> Option<&CategoryMap> {
        self.records.get(code).map(|r| r.category(category))
    }

    /// Every code whose record has `category[key] == value`.
    pub fn search(&self, category: Category, key: &str, value: &str) -> Vec<String> {
        self.records
            .iter()
            .filter(|(_, record)| record.category(category).get(key).map(|v| v.as_str()) == Some(value))
            .map(|(code, _)| code.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &AttributeRecord)> {
        self.records.iter()
    }

    pub fn insert_raw(&mut self, code: String, record: AttributeRecord) {
        self.records.insert(code, record);
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedClock(&'static str);
    impl Clock for FixedClock {
        fn now_iso8601(&self) -> String {
            self.0.to_string()
        }
    }

    #[test]
    fn put_creates_record_with_matching_timestamps() {
        let mut store = AttributeStore::new();
        let clock = FixedClock("2026-01-01T00:00:00Z");
        store.put("N50F", Category::FlightRules, "class", "A", &clock);
        let record = store.get("N50F").unwrap();
        assert_eq!(record.created_time, record.last_updated);
        assert_eq!(record.flight_rules.get("class"), Some(&"A".to_string()));
    }

    #[test]
    fn second_put_preserves_created_time_and_advances_last_updated() {
        let mut store = AttributeStore::new();
        let first = FixedClock("2026-01-01T00:00:00Z");
        let second = FixedClock("2026-01-02T00:00:00Z");
        store.put("N50F", Category::FlightRules, "class", "A", &first);
        store.put("N50F", Category::WeatherConditions, "wind", "calm", &second);
        let record = store.get("N50F").unwrap();
        assert_eq!(record.created_time, "2026-01-01T00:00:00Z");
        assert_eq!(record.last_updated, "2026-01-02T00:00:00Z");
    }

    #[test]
    fn search_finds_exact_matches_only() {
        let mut store = AttributeStore::new();
        let clock = FixedClock("2026-01-01T00:00:00Z");
        store.put("A", Category::RiskAssessment, "level", "high", &clock);
        store.put("B", Category::RiskAssessment, "level", "low", &clock);
        let found = store.search(Category::RiskAssessment, "level", "high");
        assert_eq!(found, vec!["A".to_string()]);
    }

    #[test]
    fn category_parse_round_trips() {
        for category in Category::ALL {
            assert_eq!(Category::parse(category.as_str()).unwrap(), category);
        }
        assert!(Category::parse("not_a_category").is_err());
    }
}
