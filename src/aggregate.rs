//! Range aggregation: merge per-year place mentions into one weighted set.
//!
//! A pass walks a half-open year range in ascending order and folds every
//! [`PlaceRecord`] into a per-name tally. The first sighting of a name fixes
//! its coordinate; later sightings only add to the count.

use crate::error::AggregateError;
use crate::places::{PlaceRecord, YearlyPlaceIndex};
use serde::{Deserialize, Serialize};
use std::collections::btree_map::{BTreeMap, Entry};
use std::ops::Range;

/// Half-open range of years `[start, end)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct YearRange {
    start: i32,
    end: i32,
}

impl YearRange {
    pub fn new(start: i32, end: i32) -> Result<Self, AggregateError> {
        if start > end {
            return Err(AggregateError::InvalidRange { start, end });
        }
        Ok(Self { start, end })
    }

    /// Convert an inclusive UI selection `[lo, hi]` into a range under `policy`
    pub fn from_selection(lo: i32, hi: i32, policy: RangePolicy) -> Result<Self, AggregateError> {
        match policy {
            RangePolicy::Inclusive => {
                if lo > hi {
                    return Err(AggregateError::InvalidRange { start: lo, end: hi });
                }
                Self::new(lo, hi.saturating_add(1))
            }
            RangePolicy::Exclusive => Self::new(lo, hi),
        }
    }

    pub fn start(&self) -> i32 {
        self.start
    }

    pub fn end(&self) -> i32 {
        self.end
    }

    /// Number of years the range iterates over
    pub fn span(&self) -> u32 {
        self.end.abs_diff(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn years(&self) -> Range<i32> {
        self.start..self.end
    }
}

/// How the inclusive `[lo, hi]` selection of the range control maps to the
/// iterated range.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum RangePolicy {
    /// Both handles are included: `[lo, hi + 1)`
    #[default]
    Inclusive,
    /// The upper handle is excluded: `[lo, hi)`
    Exclusive,
}

/// What to do with a year in range that the index does not cover
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MissingYears {
    /// Contributes no records
    #[default]
    Skip,
    /// Fails the pass with [`AggregateError::YearNotFound`]
    Strict,
}

impl MissingYears {
    pub fn from_strict(strict: bool) -> Self {
        if strict {
            MissingYears::Strict
        } else {
            MissingYears::Skip
        }
    }
}

/// Running total for one place name within a pass
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregatedPlace {
    pub name: String,
    pub x: f64,
    pub y: f64,
    pub count: u64,
}

/// Outcome of one aggregation pass
#[derive(Debug, Clone, PartialEq)]
pub struct AggregationResult {
    range: YearRange,
    places: BTreeMap<String, AggregatedPlace>,
    max_count: u64,
}

impl AggregationResult {
    fn empty(range: YearRange) -> Self {
        Self {
            range,
            places: BTreeMap::new(),
            max_count: 0,
        }
    }

    /// Fold one record into the tally and keep the running maximum current
    fn add(&mut self, record: &PlaceRecord) {
        let count = match self.places.entry(record.name.clone()) {
            Entry::Vacant(slot) => {
                slot.insert(AggregatedPlace {
                    name: record.name.clone(),
                    x: record.x,
                    y: record.y,
                    count: record.count,
                })
                .count
            }
            Entry::Occupied(mut slot) => {
                let place = slot.get_mut();
                place.count = place.count.saturating_add(record.count);
                place.count
            }
        };
        if count > self.max_count {
            self.max_count = count;
        }
    }

    pub fn range(&self) -> YearRange {
        self.range
    }

    /// Number of years covered; the normalizer for marker sizing
    pub fn span(&self) -> u32 {
        self.range.span()
    }

    pub fn max_count(&self) -> u64 {
        self.max_count
    }

    pub fn get(&self, name: &str) -> Option<&AggregatedPlace> {
        self.places.get(name)
    }

    /// Places in name order
    pub fn places(&self) -> impl Iterator<Item = &AggregatedPlace> {
        self.places.values()
    }

    pub fn total_count(&self) -> u64 {
        self.places.values().map(|p| p.count).sum()
    }

    pub fn len(&self) -> usize {
        self.places.len()
    }

    pub fn is_empty(&self) -> bool {
        self.places.is_empty()
    }
}

/// Aggregate every year in `[start_year, end_year)`.
pub fn aggregate(
    index: &YearlyPlaceIndex,
    start_year: i32,
    end_year: i32,
    missing: MissingYears,
) -> Result<AggregationResult, AggregateError> {
    aggregate_range(index, YearRange::new(start_year, end_year)?, missing)
}

/// Aggregate every year of an already validated range.
pub fn aggregate_range(
    index: &YearlyPlaceIndex,
    range: YearRange,
    missing: MissingYears,
) -> Result<AggregationResult, AggregateError> {
    let mut result = AggregationResult::empty(range);

    for year in range.years() {
        let Some(records) = index.records(year) else {
            if missing == MissingYears::Strict {
                return Err(AggregateError::YearNotFound(year));
            }
            continue;
        };

        for record in records {
            result.add(record);
        }
    }

    tracing::debug!(
        start = range.start(),
        end = range.end(),
        places = result.len(),
        max_count = result.max_count(),
        "aggregated place mentions"
    );

    Ok(result)
}
