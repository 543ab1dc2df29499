use std::path::PathBuf;
use thiserror::Error;

/// Failures of a single aggregation pass or marker sizing.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AggregateError {
    #[error("invalid year range: start {start} is after end {end}")]
    InvalidRange { start: i32, end: i32 },
    #[error("year {0} is not present in the place index")]
    YearNotFound(i32),
    #[error("year span must be at least one year")]
    InvalidSpan,
}

/// Failures while reading the yearly place index from disk.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("failed to read {path:?}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed place index JSON")]
    Json(#[from] simd_json::Error),
    #[error("year key {0:?} is not an integer")]
    InvalidYear(String),
    #[error("year {year}: record {key:?} has no entry in column {column:?}")]
    MissingEntry {
        year: i32,
        column: &'static str,
        key: String,
    },
    #[error("year {year}: column {column:?} has {found} entries, expected {expected}")]
    LengthMismatch {
        year: i32,
        column: &'static str,
        expected: usize,
        found: usize,
    },
    #[error("year {year}: place {name:?} has invalid coordinate ({x}, {y})")]
    InvalidCoordinate { year: i32, name: String, x: f64, y: f64 },
    #[error("year {year}: record {key:?} has an empty name")]
    EmptyName { year: i32, key: String },
    #[error("place index contains no years")]
    Empty,
}
