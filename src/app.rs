use crate::aggregate::{aggregate_range, MissingYears, RangePolicy, YearRange};
use crate::config::{AtlasConfig, ViewConfig};
use crate::error::AggregateError;
use crate::geo::{meters_to_lat_degrees, meters_to_lon_degrees};
use crate::map::{Lod, MapRenderer, SpatialGrid, Viewport};
use crate::markers::{build_markers, Marker};
use crate::places::YearlyPlaceIndex;
use crate::scale::MarkerScaler;
use std::sync::Arc;

/// Extra pixels around a marker that still count as hovering it
const HOVER_TOLERANCE_PX: i32 = 3;

/// Marker grid cell size in degrees
const MARKER_CELL_DEG: f64 = 1.0;

/// Rows taken by the map border and the two status lines
const CHROME_ROWS: usize = 4;

/// Which handle of the year-range control is being moved
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Handle {
    Start,
    End,
}

/// Aggregation settings the view holds for its lifetime
#[derive(Clone, Debug)]
pub struct AtlasOptions {
    pub min_year: i32,
    pub max_year: i32,
    pub policy: RangePolicy,
    pub missing: MissingYears,
    pub scaler: MarkerScaler,
}

impl AtlasOptions {
    pub fn from_config(config: &AtlasConfig) -> Self {
        Self {
            min_year: config.range.min_year,
            max_year: config.range.max_year,
            policy: config.range.policy,
            missing: MissingYears::from_strict(config.range.strict),
            scaler: config.markers.scaler(),
        }
    }
}

/// Figures describing the last successful aggregation pass
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PassSummary {
    pub range: YearRange,
    pub places: usize,
    pub max_count: u64,
}

/// Application state
pub struct App {
    pub viewport: Viewport,
    pub map_renderer: MapRenderer,
    pub should_quit: bool,
    /// Last mouse position for drag tracking
    pub last_mouse: Option<(u16, u16)>,
    /// Current mouse position for hover popups
    pub mouse_pos: Option<(u16, u16)>,
    /// Inclusive year selection of the range control
    pub selection: (i32, i32),
    pub active_handle: Handle,
    index: Arc<YearlyPlaceIndex>,
    options: AtlasOptions,
    home: ViewConfig,
    markers: SpatialGrid<Marker>,
    max_radius_m: f64,
    summary: Option<PassSummary>,
    error: Option<AggregateError>,
}

impl App {
    pub fn new(width: usize, height: usize, index: Arc<YearlyPlaceIndex>, options: AtlasOptions, home: ViewConfig) -> Self {
        let (pixel_width, pixel_height) = Self::map_pixels(width, height);

        let mut app = Self {
            viewport: Viewport::new(home.center_lon, home.center_lat, home.zoom, pixel_width, pixel_height),
            map_renderer: MapRenderer::new(),
            should_quit: false,
            last_mouse: None,
            mouse_pos: None,
            selection: (options.min_year, options.max_year),
            active_handle: Handle::Start,
            index,
            options,
            home,
            markers: SpatialGrid::new(MARKER_CELL_DEG),
            max_radius_m: 0.0,
            summary: None,
            error: None,
        };
        app.refresh();
        app
    }

    /// Braille pixel size of the map area for a terminal of `width x height` cells
    fn map_pixels(width: usize, height: usize) -> (usize, usize) {
        let inner_width = width.saturating_sub(2);
        let inner_height = height.saturating_sub(CHROME_ROWS);
        (inner_width * 2, inner_height * 4)
    }

    /// Update viewport size when terminal resizes
    pub fn resize(&mut self, width: usize, height: usize) {
        let (pixel_width, pixel_height) = Self::map_pixels(width, height);
        self.viewport.width = pixel_width;
        self.viewport.height = pixel_height;
    }

    /// Rerun aggregation for the current selection and rebuild markers
    pub fn refresh(&mut self) {
        let (lo, hi) = self.selection;
        let outcome = YearRange::from_selection(lo, hi, self.options.policy).and_then(|range| {
            let result = aggregate_range(&self.index, range, self.options.missing)?;
            let markers = build_markers(&result, &self.options.scaler)?;
            Ok((range, result.max_count(), markers))
        });

        let mut grid = SpatialGrid::new(MARKER_CELL_DEG);
        match outcome {
            Ok((range, max_count, markers)) => {
                self.max_radius_m = markers.iter().map(|m| m.radius_m).fold(0.0, f64::max);
                self.summary = Some(PassSummary {
                    range,
                    places: markers.len(),
                    max_count,
                });
                self.error = None;
                for marker in markers {
                    grid.insert(marker.lon, marker.lat, marker);
                }
            }
            Err(e) => {
                tracing::warn!(lo, hi, error = %e, "aggregation failed");
                self.max_radius_m = 0.0;
                self.summary = None;
                self.error = Some(e);
            }
        }
        self.markers = grid;
    }

    /// Markers of the current pass, largest count first
    pub fn markers(&self) -> &[Marker] {
        self.markers.items()
    }

    pub fn summary(&self) -> Option<PassSummary> {
        self.summary
    }

    pub fn error(&self) -> Option<&AggregateError> {
        self.error.as_ref()
    }

    pub fn policy(&self) -> RangePolicy {
        self.options.policy
    }

    pub fn year_bounds(&self) -> (i32, i32) {
        (self.options.min_year, self.options.max_year)
    }

    pub fn toggle_handle(&mut self) {
        self.active_handle = match self.active_handle {
            Handle::Start => Handle::End,
            Handle::End => Handle::Start,
        };
    }

    /// Move the active handle by `delta` years. Handles never cross.
    /// Returns true if the selection changed.
    pub fn nudge(&mut self, delta: i32) -> bool {
        let (lo, hi) = self.selection;
        let next = match self.active_handle {
            Handle::Start => (lo.saturating_add(delta).clamp(self.options.min_year, hi), hi),
            Handle::End => (lo, hi.saturating_add(delta).clamp(lo, self.options.max_year)),
        };
        if next == self.selection {
            return false;
        }
        self.selection = next;
        self.refresh();
        true
    }

    /// Set both handles at once, clamped to the control bounds
    pub fn select(&mut self, lo: i32, hi: i32) {
        let lo = lo.clamp(self.options.min_year, self.options.max_year);
        let hi = hi.clamp(lo, self.options.max_year);
        self.selection = (lo, hi);
        self.refresh();
    }

    /// Restore the full year span
    pub fn reset_range(&mut self) {
        self.selection = (self.options.min_year, self.options.max_year);
        self.refresh();
    }

    /// Restore the initial map position
    pub fn reset_view(&mut self) {
        self.viewport = Viewport::new(
            self.home.center_lon,
            self.home.center_lat,
            self.home.zoom,
            self.viewport.width,
            self.viewport.height,
        );
    }

    pub fn pan(&mut self, dx: i32, dy: i32) {
        self.viewport.pan(dx, dy);
    }

    pub fn zoom_in(&mut self) {
        self.viewport.zoom_in();
    }

    pub fn zoom_out(&mut self) {
        self.viewport.zoom_out();
    }

    /// Zoom in towards a screen position (terminal column/row)
    pub fn zoom_in_at(&mut self, col: u16, row: u16) {
        let (px, py) = cell_to_pixel(col, row);
        self.viewport.zoom_in_at(px, py);
    }

    /// Zoom out from a screen position (terminal column/row)
    pub fn zoom_out_at(&mut self, col: u16, row: u16) {
        let (px, py) = cell_to_pixel(col, row);
        self.viewport.zoom_out_at(px, py);
    }

    pub fn quit(&mut self) {
        self.should_quit = true;
    }

    pub fn zoom_level(&self) -> String {
        format!("{:.1}x", self.viewport.zoom)
    }

    pub fn center_coords(&self) -> String {
        format!(
            "{:.1}°{}, {:.1}°{}",
            self.viewport.center_lat.abs(),
            if self.viewport.center_lat >= 0.0 { "N" } else { "S" },
            self.viewport.center_lon.abs(),
            if self.viewport.center_lon >= 0.0 { "E" } else { "W" }
        )
    }

    pub fn lod_level(&self) -> &'static str {
        Lod::from_zoom(self.viewport.zoom).name()
    }

    /// Pan by the drag distance since the last mouse event
    pub fn handle_drag(&mut self, x: u16, y: u16) {
        if let Some((last_x, last_y)) = self.last_mouse {
            let dx = last_x as i32 - x as i32;
            let dy = last_y as i32 - y as i32;
            // Braille cells are 2 pixels wide and 4 tall
            self.pan(dx * 2, dy * 4);
        }
        self.last_mouse = Some((x, y));
    }

    pub fn end_drag(&mut self) {
        self.last_mouse = None;
    }

    pub fn set_mouse_pos(&mut self, col: u16, row: u16) {
        self.mouse_pos = Some((col, row));
    }

    /// Mouse position in braille pixels, if it is over the map
    pub fn mouse_pixel_pos(&self) -> Option<(i32, i32)> {
        let (col, row) = self.mouse_pos?;
        if col == 0 || row == 0 {
            return None;
        }
        let (px, py) = cell_to_pixel(col, row);
        (px < self.viewport.width as i32 && py < self.viewport.height as i32).then_some((px, py))
    }

    /// Marker under the mouse; the smallest circle wins where circles overlap
    pub fn hovered_marker(&self) -> Option<&Marker> {
        let (px, py) = self.mouse_pixel_pos()?;
        let (lon, lat) = self.viewport.unproject(px, py);

        let degrees_per_pixel = 360.0 / (self.viewport.zoom * self.viewport.width.max(1) as f64);
        let slack = degrees_per_pixel * HOVER_TOLERANCE_PX as f64;
        let lat_radius = meters_to_lat_degrees(self.max_radius_m) + slack;
        let lon_radius = meters_to_lon_degrees(self.max_radius_m, lat) + slack;

        self.markers
            .query_window(lon, lat, lon_radius, lat_radius)
            .into_iter()
            .filter_map(|idx| self.markers.get(idx))
            .filter(|marker| {
                let (mx, my) = self.viewport.project(marker.lon, marker.lat);
                let reach = self.viewport.meters_to_pixels(marker.lon, marker.lat, marker.radius_m).max(1)
                    + HOVER_TOLERANCE_PX;
                let (dx, dy) = ((mx - px) as i64, (my - py) as i64);
                dx * dx + dy * dy <= (reach as i64) * (reach as i64)
            })
            .min_by(|a, b| a.radius_m.total_cmp(&b.radius_m))
    }
}

/// Convert a terminal cell inside the bordered map to braille pixels
fn cell_to_pixel(col: u16, row: u16) -> (i32, i32) {
    let px = (col.saturating_sub(1) as i32) * 2;
    let py = (row.saturating_sub(1) as i32) * 4;
    (px, py)
}
