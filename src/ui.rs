use crate::app::{App, Handle};
use crate::braille::BrailleCanvas;
use crate::map::MapLayers;
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Widget},
    Frame,
};

/// Marker circle colour
const MARKER_COLOR: Color = Color::Rgb(0x31, 0x86, 0xcc);

/// Render the UI
pub fn render(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(3),    // Map
            Constraint::Length(1), // Year range
            Constraint::Length(1), // Status bar
        ])
        .split(frame.area());

    render_map(frame, app, chunks[0]);
    render_range_bar(frame, app, chunks[1]);
    render_status_bar(frame, app, chunks[2]);
}

fn render_map(frame: &mut Frame, app: &App, area: Rect) {
    let (lo, hi) = app.selection;
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(Span::styled(
            format!(" Rigasche Zeitung: places in headings {lo}-{hi} "),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let mut viewport = app.viewport.clone();
    // Braille gives 2x4 resolution per character
    viewport.width = inner.width as usize * 2;
    viewport.height = inner.height as usize * 4;

    let layers = app
        .map_renderer
        .render(inner.width as usize, inner.height as usize, &viewport, app.markers());

    frame.render_widget(MapWidget { layers }, inner);

    if let Some(marker) = app.hovered_marker() {
        if let Some((col, row)) = app.mouse_pos {
            render_popup(frame, inner, col, row, &marker.label);
        }
    }
}

/// Braille map layers with text labels overlaid
struct MapWidget {
    layers: MapLayers,
}

impl MapWidget {
    /// Copy a braille layer into the buffer, leaving blank cells untouched
    fn render_layer(canvas: &BrailleCanvas, color: Color, area: Rect, buf: &mut Buffer) {
        for (row_idx, row_str) in canvas.rows().enumerate().take(area.height as usize) {
            let y = area.y + row_idx as u16;
            for (col_idx, ch) in row_str.chars().enumerate().take(area.width as usize) {
                if ch == '\u{2800}' {
                    continue;
                }
                buf[(area.x + col_idx as u16, y)].set_char(ch).set_fg(color);
            }
        }
    }
}

impl Widget for MapWidget {
    fn render(self, area: Rect, buf: &mut Buffer) {
        Self::render_layer(&self.layers.coastlines, Color::Cyan, area, buf);
        Self::render_layer(&self.layers.borders, Color::DarkGray, area, buf);
        Self::render_layer(&self.layers.markers, MARKER_COLOR, area, buf);

        let label_style = Style::default().fg(Color::White);
        for (lx, ly, text) in &self.layers.labels {
            if *ly >= area.height || *lx >= area.width {
                continue;
            }
            let max_len = (area.width - *lx) as usize;
            for (i, ch) in text.chars().take(max_len.min(28)).enumerate() {
                buf[(area.x + *lx + i as u16, area.y + *ly)].set_char(ch).set_style(label_style);
            }
        }
    }
}

/// Boxed label next to the mouse cursor, kept inside `bounds`
fn render_popup(frame: &mut Frame, bounds: Rect, col: u16, row: u16, label: &str) {
    let width = (label.chars().count() as u16 + 2).min(bounds.width);
    let height = 3.min(bounds.height);
    if width == 0 || height == 0 {
        return;
    }

    let x = (col + 2).min(bounds.x + bounds.width - width);
    let y = if row > bounds.y + height { row - height } else { (row + 1).min(bounds.y + bounds.height - height) };
    let area = Rect::new(x, y, width, height);

    frame.render_widget(Clear, area);
    frame.render_widget(
        Paragraph::new(label.to_string()).style(Style::default().fg(Color::White)).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(MARKER_COLOR)),
        ),
        area,
    );
}

/// Text track for the two-handle year control, e.g. `──●━━━━●──`
pub fn slider_track(width: usize, bounds: (i32, i32), selection: (i32, i32)) -> String {
    if width == 0 {
        return String::new();
    }
    let (min, max) = bounds;
    let extent = (max - min).max(1) as f64;
    let last = (width - 1) as f64;
    let position = |year: i32| (((year - min) as f64 / extent) * last).round().clamp(0.0, last) as usize;

    let (lo, hi) = (position(selection.0), position(selection.1));
    (0..width)
        .map(|i| {
            if i == lo || i == hi {
                '●'
            } else if i > lo && i < hi {
                '━'
            } else {
                '─'
            }
        })
        .collect()
}

fn render_range_bar(frame: &mut Frame, app: &App, area: Rect) {
    let (min, max) = app.year_bounds();
    let (lo, hi) = app.selection;
    let handle_style = |handle: Handle| {
        if app.active_handle == handle {
            Style::default().fg(Color::Black).bg(Color::Yellow)
        } else {
            Style::default().fg(Color::Yellow)
        }
    };

    let lead = format!(" {min} ");
    let tail = format!(" {max} ");
    let fixed = lead.len() + tail.len() + 14;
    let track_width = (area.width as usize).saturating_sub(fixed);

    let line = Line::from(vec![
        Span::styled(" from ", Style::default().fg(Color::DarkGray)),
        Span::styled(lo.to_string(), handle_style(Handle::Start)),
        Span::styled(lead, Style::default().fg(Color::DarkGray)),
        Span::styled(slider_track(track_width, (min, max), (lo, hi)), Style::default().fg(MARKER_COLOR)),
        Span::styled(tail, Style::default().fg(Color::DarkGray)),
        Span::styled(hi.to_string(), handle_style(Handle::End)),
        Span::styled(" to", Style::default().fg(Color::DarkGray)),
    ]);

    frame.render_widget(Paragraph::new(line), area);
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let settings = &app.map_renderer.settings;
    let dim = Style::default().fg(Color::DarkGray);
    let toggle = |on: bool, on_text: &'static str, off_text: &'static str| {
        Span::styled(
            if on { on_text } else { off_text },
            Style::default().fg(if on { Color::Green } else { Color::DarkGray }),
        )
    };

    let mut spans = vec![
        Span::styled(" Zoom: ", dim),
        Span::styled(app.zoom_level(), Style::default().fg(Color::Yellow)),
        Span::styled(" (", dim),
        Span::styled(app.lod_level(), Style::default().fg(Color::Magenta)),
        Span::styled(") ", dim),
    ];

    match (app.summary(), app.error()) {
        (_, Some(error)) => spans.push(Span::styled(format!("{error} "), Style::default().fg(Color::Red))),
        (Some(summary), None) => spans.push(Span::styled(
            format!(
                "{}y {} places max {} ",
                summary.range.span(),
                summary.places,
                summary.max_count
            ),
            Style::default().fg(Color::White),
        )),
        (None, None) => {}
    }

    spans.extend([
        Span::styled(format!("[{:?}] ", app.policy()).to_lowercase(), dim),
        toggle(settings.show_markers, "[M]arkers ", "[m]arkers "),
        toggle(settings.show_labels, "[L]abels ", "[l]abels "),
        toggle(settings.show_borders, "[B]order ", "[b]order "),
        Span::styled("| ", dim),
        Span::styled(app.center_coords(), Style::default().fg(Color::Cyan)),
        Span::styled(" | tab:handle ,/.:year pgup/pgdn:10y a:all hjkl:pan +/-:zoom r:reset q:quit", dim),
    ]);

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slider_full_span() {
        let track = slider_track(10, (1802, 1888), (1802, 1888));
        assert_eq!(track, "●━━━━━━━━●");
    }

    #[test]
    fn test_slider_partial() {
        let track = slider_track(11, (1800, 1900), (1850, 1870));
        assert_eq!(track, "─────●━●───");
    }

    #[test]
    fn test_slider_single_year() {
        let track = slider_track(5, (1802, 1888), (1888, 1888));
        assert_eq!(track, "────●");
        assert_eq!(slider_track(0, (1802, 1888), (1802, 1888)), "");
    }
}
