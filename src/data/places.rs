//! Loader for the yearly place index (`places_by_year.json`).
//!
//! On disk every year holds four parallel columns, `name`, `x`, `y` and
//! `count`, joined by a per-record key:
//!
//! ```json
//! {"1850": {"name": {"0": "Berlin"}, "x": {"0": 13.4}, "y": {"0": 52.5}, "count": {"0": 5}}}
//! ```
//!
//! Plain arrays are accepted too and are keyed by position.

use crate::error::LoadError;
use crate::geo::is_valid_lonlat;
use crate::places::{PlaceRecord, YearlyPlaceIndex};
use rayon::prelude::*;
use serde::Deserialize;
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;

#[derive(Deserialize)]
#[serde(untagged)]
enum Column<T> {
    Keyed(HashMap<String, T>),
    Positional(Vec<T>),
}

impl<T> Column<T> {
    fn len(&self) -> usize {
        match self {
            Column::Keyed(map) => map.len(),
            Column::Positional(values) => values.len(),
        }
    }

    /// Entries in record order
    fn into_entries(self) -> Vec<(String, T)> {
        match self {
            Column::Keyed(map) => {
                let mut entries: Vec<_> = map.into_iter().collect();
                entries.sort_by(|(a, _), (b, _)| record_key_order(a, b));
                entries
            }
            Column::Positional(values) => values.into_iter().enumerate().map(|(i, v)| (i.to_string(), v)).collect(),
        }
    }

    fn into_lookup(self) -> HashMap<String, T> {
        match self {
            Column::Keyed(map) => map,
            Column::Positional(values) => values.into_iter().enumerate().map(|(i, v)| (i.to_string(), v)).collect(),
        }
    }
}

/// Integer keys sort numerically ahead of any non-numeric key
fn record_key_order(a: &str, b: &str) -> Ordering {
    match (a.parse::<u64>(), b.parse::<u64>()) {
        (Ok(a), Ok(b)) => a.cmp(&b),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(b),
    }
}

#[derive(Deserialize)]
struct RawYear {
    name: Column<String>,
    x: Column<f64>,
    y: Column<f64>,
    count: Column<u64>,
}

/// Read and validate the place index at `path`
pub fn load_place_index(path: &Path) -> Result<YearlyPlaceIndex, LoadError> {
    let mut bytes = fs::read(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let index = parse_place_index(&mut bytes)?;

    tracing::info!(
        path = %path.display(),
        years = index.len(),
        records = index.total_records(),
        first = ?index.first_year(),
        last = ?index.last_year(),
        "loaded place index"
    );

    Ok(index)
}

/// Parse a place index from JSON bytes. The buffer is used as scratch space.
pub fn parse_place_index(bytes: &mut [u8]) -> Result<YearlyPlaceIndex, LoadError> {
    let raw: BTreeMap<String, RawYear> = simd_json::serde::from_slice(bytes)?;
    if raw.is_empty() {
        return Err(LoadError::Empty);
    }

    let years = raw
        .into_par_iter()
        .map(|(key, raw_year)| {
            let year = key.trim().parse::<i32>().map_err(|_| LoadError::InvalidYear(key.clone()))?;
            Ok((year, build_year(year, raw_year)?))
        })
        .collect::<Result<BTreeMap<i32, Vec<PlaceRecord>>, LoadError>>()?;

    Ok(YearlyPlaceIndex::from_years(years))
}

/// Join the four columns of one year into records
fn build_year(year: i32, raw: RawYear) -> Result<Vec<PlaceRecord>, LoadError> {
    let expected = raw.name.len();
    for (column, found) in [("x", raw.x.len()), ("y", raw.y.len()), ("count", raw.count.len())] {
        if found != expected {
            return Err(LoadError::LengthMismatch {
                year,
                column,
                expected,
                found,
            });
        }
    }

    let mut xs = raw.x.into_lookup();
    let mut ys = raw.y.into_lookup();
    let mut counts = raw.count.into_lookup();

    let mut records = Vec::with_capacity(expected);
    for (key, name) in raw.name.into_entries() {
        let missing = |column| LoadError::MissingEntry {
            year,
            column,
            key: key.clone(),
        };
        let x = xs.remove(&key).ok_or_else(|| missing("x"))?;
        let y = ys.remove(&key).ok_or_else(|| missing("y"))?;
        let count = counts.remove(&key).ok_or_else(|| missing("count"))?;

        if name.trim().is_empty() {
            return Err(LoadError::EmptyName { year, key });
        }
        if !is_valid_lonlat(x, y) {
            return Err(LoadError::InvalidCoordinate { year, name, x, y });
        }

        records.push(PlaceRecord { name, x, y, count });
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> Result<YearlyPlaceIndex, LoadError> {
        let mut bytes = json.as_bytes().to_vec();
        parse_place_index(&mut bytes)
    }

    #[test]
    fn test_keyed_columns() {
        let index = parse(
            r#"{
                "1850": {"name": {"0": "Berlin"}, "x": {"0": 13.4}, "y": {"0": 52.5}, "count": {"0": 5}},
                "1860": {
                    "name": {"10": "Paris", "2": "Riga"},
                    "x": {"2": 24.1, "10": 2.35},
                    "y": {"2": 56.95, "10": 48.85},
                    "count": {"2": 10, "10": 2}
                }
            }"#,
        )
        .unwrap();

        assert_eq!(index.years().collect::<Vec<_>>(), vec![1850, 1860]);
        assert_eq!(index.records(1850).unwrap(), &[PlaceRecord::new("Berlin", 13.4, 52.5, 5)]);
        // Record keys order numerically, not as strings
        let names: Vec<&str> = index.records(1860).unwrap().iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Riga", "Paris"]);
    }

    #[test]
    fn test_positional_columns() {
        let index = parse(
            r#"{"1802": {"name": ["Riga", "London"], "x": [24.1, -0.13], "y": [56.95, 51.5], "count": [3, 1]}}"#,
        )
        .unwrap();
        let records = index.records(1802).unwrap();
        assert_eq!(records[1], PlaceRecord::new("London", -0.13, 51.5, 1));
    }

    #[test]
    fn test_integer_coordinates() {
        let index = parse(r#"{"1802": {"name": ["Rom"], "x": [12], "y": [42], "count": [1]}}"#).unwrap();
        assert_eq!(index.records(1802).unwrap()[0].x, 12.0);
    }

    #[test]
    fn test_empty_year() {
        let index = parse(r#"{"1803": {"name": {}, "x": {}, "y": {}, "count": {}}}"#).unwrap();
        assert_eq!(index.records(1803), Some(&[][..]));
    }

    #[test]
    fn test_bad_year_key() {
        let err = parse(r#"{"eighteen": {"name": [], "x": [], "y": [], "count": []}}"#).unwrap_err();
        assert!(matches!(err, LoadError::InvalidYear(key) if key == "eighteen"));
    }

    #[test]
    fn test_length_mismatch() {
        let err = parse(r#"{"1802": {"name": ["Riga"], "x": [24.1, 1.0], "y": [56.95], "count": [3]}}"#).unwrap_err();
        assert!(matches!(
            err,
            LoadError::LengthMismatch { year: 1802, column: "x", expected: 1, found: 2 }
        ));
    }

    #[test]
    fn test_missing_entry() {
        let err = parse(
            r#"{"1802": {"name": {"0": "Riga"}, "x": {"0": 24.1}, "y": {"1": 56.95}, "count": {"0": 3}}}"#,
        )
        .unwrap_err();
        assert!(matches!(err, LoadError::MissingEntry { year: 1802, column: "y", .. }));
    }

    #[test]
    fn test_invalid_coordinate() {
        let err = parse(r#"{"1802": {"name": ["Nowhere"], "x": [200.0], "y": [0.0], "count": [1]}}"#).unwrap_err();
        assert!(matches!(err, LoadError::InvalidCoordinate { year: 1802, .. }));
    }

    #[test]
    fn test_negative_count_rejected() {
        assert!(parse(r#"{"1802": {"name": ["Riga"], "x": [24.1], "y": [56.95], "count": [-1]}}"#).is_err());
    }

    #[test]
    fn test_empty_document() {
        assert!(matches!(parse("{}").unwrap_err(), LoadError::Empty));
        assert!(matches!(parse("[1, 2").unwrap_err(), LoadError::Json(_)));
    }

    #[test]
    fn test_record_key_order() {
        let mut keys = vec!["10", "b", "2", "a", "0"];
        keys.sort_by(|a, b| record_key_order(a, b));
        assert_eq!(keys, vec!["0", "2", "10", "a", "b"]);
    }
}
