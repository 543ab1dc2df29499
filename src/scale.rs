use crate::error::AggregateError;

/// Radius floor in meters, keeps single-mention places visible on the map
pub const DEFAULT_BASE_OFFSET_M: f64 = 10_000.0;

/// Maps an aggregated mention count to a circle radius in meters.
///
/// `radius = count * (max_count / year_span) + base_offset`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarkerScaler {
    base_offset: f64,
}

impl MarkerScaler {
    pub fn new(base_offset: f64) -> Self {
        Self { base_offset }
    }

    pub fn base_offset(&self) -> f64 {
        self.base_offset
    }

    pub fn radius(&self, count: u64, max_count: u64, year_span: u32) -> Result<f64, AggregateError> {
        if year_span == 0 {
            return Err(AggregateError::InvalidSpan);
        }
        let per_year = max_count as f64 / year_span as f64;
        Ok(count as f64 * per_year + self.base_offset)
    }
}

impl Default for MarkerScaler {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_OFFSET_M)
    }
}
