use std::collections::HashMap;

/// Spatial hash grid over lon/lat positions.
/// Divides the world into square cells for fast neighbourhood lookups.
pub struct SpatialGrid<T> {
    /// Item indices per (cell_x, cell_y)
    cells: HashMap<(i32, i32), Vec<usize>>,
    items: Vec<T>,
    /// Cell size in degrees
    cell_size: f64,
}

impl<T> SpatialGrid<T> {
    pub fn new(cell_size: f64) -> Self {
        Self {
            cells: HashMap::new(),
            items: Vec::new(),
            cell_size,
        }
    }

    #[inline(always)]
    fn to_cell(&self, lon: f64, lat: f64) -> (i32, i32) {
        let x = (lon / self.cell_size).floor() as i32;
        let y = (lat / self.cell_size).floor() as i32;
        (x, y)
    }

    /// Insert an item at a geographic position
    pub fn insert(&mut self, lon: f64, lat: f64, item: T) {
        let idx = self.items.len();
        self.items.push(item);

        let cell = self.to_cell(lon, lat);
        self.cells.entry(cell).or_default().push(idx);
    }

    /// Indices of items in cells overlapping the window
    /// `lon ± lon_radius, lat ± lat_radius` (degrees).
    /// May include items slightly outside; callers filter by exact distance.
    pub fn query_window(&self, lon: f64, lat: f64, lon_radius: f64, lat_radius: f64) -> Vec<usize> {
        let (min_x, min_y) = self.to_cell(lon - lon_radius, lat - lat_radius);
        let (max_x, max_y) = self.to_cell(lon + lon_radius, lat + lat_radius);

        let mut results = Vec::new();
        for y in min_y..=max_y {
            for x in min_x..=max_x {
                if let Some(indices) = self.cells.get(&(x, y)) {
                    results.extend_from_slice(indices);
                }
            }
        }
        results
    }

    #[inline(always)]
    pub fn get(&self, idx: usize) -> Option<&T> {
        self.items.get(idx)
    }

    #[inline(always)]
    pub fn items(&self) -> &[T] {
        &self.items
    }

    #[inline(always)]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_window() {
        let mut grid = SpatialGrid::new(1.0);
        grid.insert(24.1, 56.95, "Riga");
        grid.insert(24.7, 59.4, "Reval");
        grid.insert(-0.1, 51.5, "London");

        let mut hits: Vec<&str> = grid
            .query_window(24.0, 57.0, 0.5, 0.5)
            .into_iter()
            .filter_map(|i| grid.get(i).copied())
            .collect();
        hits.sort();
        assert_eq!(hits, vec!["Riga"]);

        let wide = grid.query_window(24.0, 58.0, 1.0, 2.0);
        assert_eq!(wide.len(), 2);
        assert_eq!(grid.len(), 3);
    }

    #[test]
    fn test_negative_coordinates() {
        let mut grid = SpatialGrid::new(2.0);
        grid.insert(-3.7, 40.4, "Madrid");
        assert_eq!(grid.query_window(-3.0, 41.0, 0.1, 0.1), vec![0]);
        assert!(grid.query_window(3.0, 41.0, 0.1, 0.1).is_empty());
    }
}
