//! Yearly place index: toponyms detected in article headings, grouped by year.
//!
//! The index is built once at startup (see [`crate::data::places`]) and then
//! shared read-only for the lifetime of the process.

use serde::Serialize;
use std::collections::BTreeMap;

/// One toponym mentioned in the headings of a single year
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlaceRecord {
    pub name: String,
    /// Longitude in degrees
    pub x: f64,
    /// Latitude in degrees
    pub y: f64,
    pub count: u64,
}

impl PlaceRecord {
    pub fn new(name: impl Into<String>, x: f64, y: f64, count: u64) -> Self {
        Self {
            name: name.into(),
            x,
            y,
            count,
        }
    }
}

/// Place records keyed by year, each year keeping its source record order
#[derive(Debug, Clone, Default)]
pub struct YearlyPlaceIndex {
    years: BTreeMap<i32, Vec<PlaceRecord>>,
}

impl YearlyPlaceIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an index from (year, records) pairs. A repeated year replaces the earlier one.
    pub fn from_years(years: impl IntoIterator<Item = (i32, Vec<PlaceRecord>)>) -> Self {
        Self {
            years: years.into_iter().collect(),
        }
    }

    /// Records for a year, or `None` if the year is absent from the index
    pub fn records(&self, year: i32) -> Option<&[PlaceRecord]> {
        self.years.get(&year).map(Vec::as_slice)
    }

    pub fn contains_year(&self, year: i32) -> bool {
        self.years.contains_key(&year)
    }

    /// All indexed years in ascending order
    pub fn years(&self) -> impl Iterator<Item = i32> + '_ {
        self.years.keys().copied()
    }

    pub fn first_year(&self) -> Option<i32> {
        self.years.keys().next().copied()
    }

    pub fn last_year(&self) -> Option<i32> {
        self.years.keys().next_back().copied()
    }

    /// Number of indexed years
    pub fn len(&self) -> usize {
        self.years.len()
    }

    pub fn is_empty(&self) -> bool {
        self.years.is_empty()
    }

    pub fn total_records(&self) -> usize {
        self.years.values().map(Vec::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_year_bounds() {
        let index = YearlyPlaceIndex::from_years([
            (1851, vec![PlaceRecord::new("Berlin", 13.4, 52.5, 3)]),
            (1850, vec![PlaceRecord::new("Berlin", 13.4, 52.5, 5)]),
            (1860, vec![]),
        ]);

        assert_eq!(index.first_year(), Some(1850));
        assert_eq!(index.last_year(), Some(1860));
        assert_eq!(index.years().collect::<Vec<_>>(), vec![1850, 1851, 1860]);
        assert_eq!(index.len(), 3);
        assert_eq!(index.total_records(), 2);
        assert!(index.contains_year(1860));
        assert!(index.records(1855).is_none());
        assert_eq!(index.records(1860), Some(&[][..]));
    }

    #[test]
    fn test_empty_index() {
        let index = YearlyPlaceIndex::new();
        assert!(index.is_empty());
        assert_eq!(index.first_year(), None);
        assert_eq!(index.last_year(), None);
    }
}
