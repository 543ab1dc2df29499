use crate::braille::BrailleCanvas;
use crate::map::geometry::{draw_circle, draw_line, draw_ring};
use crate::map::projection::Viewport;
use crate::markers::Marker;

/// A geographic line (sequence of lon/lat coordinates)
pub type LineString = Vec<(f64, f64)>;

/// Upper bound on drawn circle radius, relative to the canvas width
const MAX_RING_SCREENS: i32 = 4;

/// Level of detail for basemap data
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Lod {
    Low,    // 110m - world view
    Medium, // 50m - continental
    High,   // 10m - regional
}

impl Lod {
    /// Select LOD based on zoom level
    pub fn from_zoom(zoom: f64) -> Self {
        if zoom < 2.0 {
            Lod::Low
        } else if zoom < 8.0 {
            Lod::Medium
        } else {
            Lod::High
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Lod::Low => "110m",
            Lod::Medium => "50m",
            Lod::High => "10m",
        }
    }
}

/// Display settings for map layers
#[derive(Clone, Debug)]
pub struct DisplaySettings {
    pub show_coastlines: bool,
    pub show_borders: bool,
    pub show_markers: bool,
    pub show_labels: bool,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            show_coastlines: true,
            show_borders: true,
            show_markers: true,
            show_labels: true,
        }
    }
}

/// One frame worth of rendered layers, drawn back to front
pub struct MapLayers {
    pub coastlines: BrailleCanvas,
    pub borders: BrailleCanvas,
    pub markers: BrailleCanvas,
    /// Text overlays as (column, row, text) in character cells
    pub labels: Vec<(u16, u16, String)>,
}

/// Basemap storage plus marker drawing
pub struct MapRenderer {
    coastlines_low: Vec<LineString>,
    coastlines_medium: Vec<LineString>,
    coastlines_high: Vec<LineString>,
    borders_medium: Vec<LineString>,
    borders_high: Vec<LineString>,
    pub settings: DisplaySettings,
}

impl MapRenderer {
    pub fn new() -> Self {
        Self {
            coastlines_low: Vec::new(),
            coastlines_medium: Vec::new(),
            coastlines_high: Vec::new(),
            borders_medium: Vec::new(),
            borders_high: Vec::new(),
            settings: DisplaySettings::default(),
        }
    }

    /// Coastlines for the given LOD, falling back to coarser data
    fn coastlines(&self, lod: Lod) -> &[LineString] {
        let candidates = match lod {
            Lod::High => [&self.coastlines_high, &self.coastlines_medium, &self.coastlines_low],
            Lod::Medium => [&self.coastlines_medium, &self.coastlines_low, &self.coastlines_high],
            Lod::Low => [&self.coastlines_low, &self.coastlines_medium, &self.coastlines_high],
        };
        candidates
            .into_iter()
            .find(|lines| !lines.is_empty())
            .map(|lines| lines.as_slice())
            .unwrap_or(&[])
    }

    fn borders(&self, lod: Lod) -> &[LineString] {
        match lod {
            Lod::High if !self.borders_high.is_empty() => &self.borders_high,
            _ => &self.borders_medium,
        }
    }

    /// How many of the largest markers get a text label at this zoom
    fn label_budget(zoom: f64) -> usize {
        if zoom > 12.0 {
            usize::MAX
        } else if zoom > 6.0 {
            40
        } else if zoom > 3.0 {
            15
        } else {
            6
        }
    }

    /// Render basemap and markers into per-layer canvases of
    /// `width x height` characters. `markers` must be sorted largest first.
    pub fn render(&self, width: usize, height: usize, viewport: &Viewport, markers: &[Marker]) -> MapLayers {
        let lod = Lod::from_zoom(viewport.zoom);
        let mut layers = MapLayers {
            coastlines: BrailleCanvas::new(width, height),
            borders: BrailleCanvas::new(width, height),
            markers: BrailleCanvas::new(width, height),
            labels: Vec::new(),
        };

        if self.settings.show_coastlines {
            for line in self.coastlines(lod) {
                draw_linestring(&mut layers.coastlines, line, viewport);
            }
        }

        if self.settings.show_borders && lod != Lod::Low {
            for line in self.borders(lod) {
                draw_linestring(&mut layers.borders, line, viewport);
            }
        }

        if self.settings.show_markers {
            let budget = if self.settings.show_labels { Self::label_budget(viewport.zoom) } else { 0 };
            draw_markers(&mut layers, markers, viewport, budget);
        }

        layers
    }

    /// Add coastline data at a specific LOD
    pub fn add_coastline(&mut self, line: LineString, lod: Lod) {
        match lod {
            Lod::Low => self.coastlines_low.push(line),
            Lod::Medium => self.coastlines_medium.push(line),
            Lod::High => self.coastlines_high.push(line),
        }
    }

    /// Add border data at a specific LOD
    pub fn add_border(&mut self, line: LineString, lod: Lod) {
        match lod {
            Lod::High => self.borders_high.push(line),
            Lod::Low | Lod::Medium => self.borders_medium.push(line),
        }
    }

    /// Check if any coastline data is loaded
    pub fn has_data(&self) -> bool {
        !self.coastlines_low.is_empty() || !self.coastlines_medium.is_empty() || !self.coastlines_high.is_empty()
    }

    pub fn toggle_borders(&mut self) {
        self.settings.show_borders = !self.settings.show_borders;
    }

    pub fn toggle_markers(&mut self) {
        self.settings.show_markers = !self.settings.show_markers;
    }

    pub fn toggle_labels(&mut self) {
        self.settings.show_labels = !self.settings.show_labels;
    }
}

impl Default for MapRenderer {
    fn default() -> Self {
        Self::new()
    }
}

/// Draw a linestring with viewport culling
fn draw_linestring(canvas: &mut BrailleCanvas, line: &LineString, viewport: &Viewport) {
    if line.len() < 2 {
        return;
    }

    let mut prev: Option<(i32, i32)> = None;

    for &(lon, lat) in line {
        let (px, py) = viewport.project(lon, lat);

        if let Some((prev_x, prev_y)) = prev {
            // Segments longer than the screen are antimeridian jumps
            let dist = ((px - prev_x).abs() + (py - prev_y).abs()) as usize;
            if dist < viewport.width && viewport.line_might_be_visible((prev_x, prev_y), (px, py)) {
                draw_line(canvas, prev_x, prev_y, px, py);
            }
        }

        prev = Some((px, py));
    }
}

/// Draw one circle per marker and label the first `label_budget` visible ones
fn draw_markers(layers: &mut MapLayers, markers: &[Marker], viewport: &Viewport, label_budget: usize) {
    let max_ring = viewport.width as i32 * MAX_RING_SCREENS;
    let mut labelled = 0;

    for marker in markers {
        let (px, py) = viewport.project(marker.lon, marker.lat);
        let radius = viewport.meters_to_pixels(marker.lon, marker.lat, marker.radius_m).clamp(1, max_ring.max(1));

        if !viewport.circle_might_be_visible(px, py, radius) {
            continue;
        }

        if radius < 2 {
            draw_circle(&mut layers.markers, px, py, radius);
        } else {
            draw_ring(&mut layers.markers, px, py, radius);
            layers.markers.set_pixel_signed(px, py);
        }

        if labelled < label_budget && viewport.is_visible(px, py) && px >= 0 && py >= 0 {
            let char_x = (px / 2) as u16;
            let char_y = (py / 4) as u16;
            if let Some(label_x) = char_x.checked_add(1) {
                layers.labels.push((label_x, char_y, marker.label.clone()));
                labelled += 1;
            }
        }
    }
}
