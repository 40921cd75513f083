//! Feature schema: the ordered column names the model was trained on.
//!
//! The schema is loaded once at startup and never mutated. Building it
//! resolves the calendar columns and the one-hot city columns into direct
//! vector indices so request handling never concatenates or re-parses
//! column names.

use crate::errors::{AqiError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

/// Calendar inputs carried by every request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CalendarField {
    Month,
    Day,
    Year,
}

impl CalendarField {
    pub const ALL: [CalendarField; 3] = [CalendarField::Month, CalendarField::Day, CalendarField::Year];

    /// Request field name
    pub fn as_str(&self) -> &'static str {
        match self {
            CalendarField::Month => "month",
            CalendarField::Day => "day",
            CalendarField::Year => "year",
        }
    }
}

/// Column names used to locate request fields in the schema
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureKeys {
    pub month_key: String,
    pub day_key: String,
    pub year_key: String,
    /// Prefix of the one-hot city columns
    pub city_prefix: String,
}

impl Default for FeatureKeys {
    fn default() -> Self {
        Self {
            month_key: "Month".to_string(),
            day_key: "Date_".to_string(),
            year_key: "Year".to_string(),
            city_prefix: "City_".to_string(),
        }
    }
}

impl FeatureKeys {
    pub fn calendar_key(&self, field: CalendarField) -> &str {
        match field {
            CalendarField::Month => &self.month_key,
            CalendarField::Day => &self.day_key,
            CalendarField::Year => &self.year_key,
        }
    }
}

/// City name to one-hot vector index
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CityIndex {
    by_name: BTreeMap<String, usize>,
}

impl CityIndex {
    fn from_columns(names: &[String], prefix: &str) -> Self {
        let by_name = names
            .iter()
            .enumerate()
            .filter_map(|(idx, name)| name.strip_prefix(prefix).map(|city| (city.to_string(), idx)))
            .collect();
        Self { by_name }
    }

    pub fn get(&self, city: &str) -> Option<usize> {
        self.by_name.get(city).copied()
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }

    /// Supported city names in sorted order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.by_name.keys().map(String::as_str)
    }

    /// Vector indices of every city column
    pub fn indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.by_name.values().copied()
    }
}

/// Ordered feature names plus the lookups derived from them
#[derive(Debug, Clone)]
pub struct FeatureSchema {
    names: Vec<String>,
    positions: HashMap<String, usize>,
    keys: FeatureKeys,
    calendar: [Option<usize>; 3],
    cities: CityIndex,
}

impl FeatureSchema {
    /// Build a schema from column names.
    ///
    /// Fails on an empty list, duplicate names, or an empty city prefix.
    /// Calendar keys missing from the schema are reported once here and
    /// skipped during encoding.
    pub fn new(names: Vec<String>, keys: FeatureKeys) -> Result<Self> {
        if names.is_empty() {
            return Err(AqiError::Initialization(
                "feature schema is empty".to_string(),
            ));
        }
        if keys.city_prefix.is_empty() {
            return Err(AqiError::Initialization(
                "city column prefix must not be empty".to_string(),
            ));
        }

        let mut positions = HashMap::with_capacity(names.len());
        for (idx, name) in names.iter().enumerate() {
            if let Some(previous) = positions.insert(name.clone(), idx) {
                return Err(AqiError::Initialization(format!(
                    "duplicate feature column '{name}' at positions {previous} and {idx}"
                )));
            }
        }

        let calendar = CalendarField::ALL.map(|field| positions.get(keys.calendar_key(field)).copied());
        for (field, slot) in CalendarField::ALL.iter().zip(calendar.iter()) {
            if slot.is_none() {
                warn!(
                    "Schema has no '{}' column; request field '{}' will be ignored",
                    keys.calendar_key(*field),
                    field.as_str()
                );
            }
        }

        let cities = CityIndex::from_columns(&names, &keys.city_prefix);
        if cities.is_empty() {
            warn!(
                "Schema has no '{}*' columns; every city will be rejected",
                keys.city_prefix
            );
        }

        debug!(
            features = names.len(),
            cities = cities.len(),
            "Feature schema built"
        );

        Ok(Self {
            names,
            positions,
            keys,
            calendar,
            cities,
        })
    }

    /// Build a schema using the default column names
    pub fn with_default_keys<I, S>(names: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(names.into_iter().map(Into::into).collect(), FeatureKeys::default())
    }

    /// Load a schema from a JSON array of column names
    pub fn load_json<P: AsRef<Path>>(path: P, keys: FeatureKeys) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|e| {
            AqiError::Initialization(format!("failed to read schema {}: {e}", path.display()))
        })?;
        let names: Vec<String> = serde_json::from_str(&raw).map_err(|e| {
            AqiError::Initialization(format!("failed to parse schema {}: {e}", path.display()))
        })?;
        Self::new(names, keys)
    }

    /// Vector length `N`
    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.positions.get(name).copied()
    }

    pub fn keys(&self) -> &FeatureKeys {
        &self.keys
    }

    pub fn calendar_slot(&self, field: CalendarField) -> Option<usize> {
        match field {
            CalendarField::Month => self.calendar[0],
            CalendarField::Day => self.calendar[1],
            CalendarField::Year => self.calendar[2],
        }
    }

    /// Calendar fields that have no column in this schema
    pub fn missing_calendar_fields(&self) -> Vec<CalendarField> {
        CalendarField::ALL
            .into_iter()
            .filter(|field| self.calendar_slot(*field).is_none())
            .collect()
    }

    pub fn cities(&self) -> &CityIndex {
        &self.cities
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> FeatureSchema {
        FeatureSchema::with_default_keys(["Month", "Date_", "Year", "City_Delhi", "City_Mumbai"])
            .unwrap()
    }

    #[test]
    fn resolves_calendar_and_city_columns() {
        let schema = sample();
        assert_eq!(schema.len(), 5);
        assert_eq!(schema.calendar_slot(CalendarField::Month), Some(0));
        assert_eq!(schema.calendar_slot(CalendarField::Day), Some(1));
        assert_eq!(schema.calendar_slot(CalendarField::Year), Some(2));
        assert_eq!(schema.cities().get("Delhi"), Some(3));
        assert_eq!(schema.cities().get("Mumbai"), Some(4));
        assert_eq!(schema.cities().get("Chennai"), None);
        assert_eq!(schema.cities().names().collect::<Vec<_>>(), vec!["Delhi", "Mumbai"]);
        assert!(schema.missing_calendar_fields().is_empty());
    }

    #[test]
    fn city_lookup_is_case_sensitive() {
        let schema = sample();
        assert_eq!(schema.cities().get("delhi"), None);
    }

    #[test]
    fn rejects_empty_schema() {
        let err = FeatureSchema::with_default_keys(Vec::<String>::new()).unwrap_err();
        assert!(matches!(err, AqiError::Initialization(_)));
    }

    #[test]
    fn rejects_duplicate_columns() {
        let err = FeatureSchema::with_default_keys(["Month", "City_Delhi", "Month"]).unwrap_err();
        assert!(err.to_string().contains("duplicate feature column 'Month'"));
    }

    #[test]
    fn missing_calendar_columns_are_tolerated() {
        let schema = FeatureSchema::with_default_keys(["Month", "Day", "City_Pune"]).unwrap();
        assert_eq!(
            schema.missing_calendar_fields(),
            vec![CalendarField::Day, CalendarField::Year]
        );
    }

    #[test]
    fn custom_keys_are_honoured() {
        let keys = FeatureKeys {
            day_key: "Day".to_string(),
            city_prefix: "city=".to_string(),
            ..FeatureKeys::default()
        };
        let schema = FeatureSchema::new(
            vec!["Day".into(), "city=Kochi".into(), "City_Delhi".into()],
            keys,
        )
        .unwrap();
        assert_eq!(schema.calendar_slot(CalendarField::Day), Some(0));
        assert_eq!(schema.cities().get("Kochi"), Some(1));
        assert_eq!(schema.cities().get("Delhi"), None);
    }

    #[test]
    fn loads_from_json_file() {
        use std::io::Write;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"["Month","Date_","Year","City_Delhi"]"#).unwrap();

        let schema = FeatureSchema::load_json(file.path(), FeatureKeys::default()).unwrap();
        assert_eq!(schema.names()[3], "City_Delhi");
        assert_eq!(schema.position("Year"), Some(2));
    }

    #[test]
    fn malformed_json_is_an_initialization_error() {
        use std::io::Write;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"Month": 0}}"#).unwrap();

        let err = FeatureSchema::load_json(file.path(), FeatureKeys::default()).unwrap_err();
        assert!(matches!(err, AqiError::Initialization(_)));
    }
}
