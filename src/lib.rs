//! Aggregation of newspaper-heading place mentions over year ranges,
//! proportional marker sizing, and a braille terminal map to browse them.

pub mod aggregate;
pub mod app;
pub mod braille;
pub mod config;
pub mod data;
pub mod error;
pub mod geo;
pub mod map;
pub mod markers;
pub mod places;
pub mod scale;
pub mod ui;
