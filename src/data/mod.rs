pub mod places;

use crate::map::{Lod, MapRenderer};
use anyhow::{Context, Result};
use geojson::{GeoJson, Geometry, Value};
use std::fs;
use std::path::Path;

/// Natural Earth coastline files, coarsest first
const COASTLINE_FILES: [(&str, Lod); 3] = [
    ("ne_110m_coastline.json", Lod::Low),
    ("ne_50m_coastline.json", Lod::Medium),
    ("ne_10m_coastline.json", Lod::High),
];

/// Natural Earth land-border files
const BORDER_FILES: [(&str, Lod); 2] = [
    ("ne_50m_admin_0_boundary_lines_land.json", Lod::Medium),
    ("ne_10m_admin_0_boundary_lines_land.json", Lod::High),
];

/// Load whatever basemap GeoJSON is present in `data_dir`.
/// Files that fail to parse are logged and skipped.
pub fn load_basemap(renderer: &mut MapRenderer, data_dir: &Path) {
    for (filename, lod) in COASTLINE_FILES {
        let path = data_dir.join(filename);
        if !path.exists() {
            continue;
        }
        match read_lines(&path) {
            Ok(lines) => {
                tracing::debug!(file = filename, lines = lines.len(), "loaded coastlines");
                lines.into_iter().for_each(|line| renderer.add_coastline(line, lod));
            }
            Err(e) => tracing::warn!(file = filename, error = %format!("{e:#}"), "skipping coastline file"),
        }
    }

    for (filename, lod) in BORDER_FILES {
        let path = data_dir.join(filename);
        if !path.exists() {
            continue;
        }
        match read_lines(&path) {
            Ok(lines) => {
                tracing::debug!(file = filename, lines = lines.len(), "loaded borders");
                lines.into_iter().for_each(|line| renderer.add_border(line, lod));
            }
            Err(e) => tracing::warn!(file = filename, error = %format!("{e:#}"), "skipping border file"),
        }
    }
}

/// Read a GeoJSON file and flatten it into lon/lat polylines
fn read_lines(path: &Path) -> Result<Vec<Vec<(f64, f64)>>> {
    let content = fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    let geojson: GeoJson = content
        .parse()
        .with_context(|| format!("failed to parse GeoJSON in {}", path.display()))?;

    let mut lines = Vec::new();
    collect_geojson_lines(&geojson, &mut |line| lines.push(line));
    Ok(lines)
}

/// Walk GeoJSON and emit every line feature, polygon exteriors included
fn collect_geojson_lines<F>(geojson: &GeoJson, add_line: &mut F)
where
    F: FnMut(Vec<(f64, f64)>),
{
    match geojson {
        GeoJson::FeatureCollection(fc) => {
            for feature in &fc.features {
                if let Some(ref geometry) = feature.geometry {
                    collect_geometry_lines(geometry, add_line);
                }
            }
        }
        GeoJson::Feature(f) => {
            if let Some(ref geometry) = f.geometry {
                collect_geometry_lines(geometry, add_line);
            }
        }
        GeoJson::Geometry(geometry) => collect_geometry_lines(geometry, add_line),
    }
}

fn collect_geometry_lines<F>(geometry: &Geometry, add_line: &mut F)
where
    F: FnMut(Vec<(f64, f64)>),
{
    let to_line = |coords: &Vec<Vec<f64>>| -> Vec<(f64, f64)> { coords.iter().map(|c| (c[0], c[1])).collect() };

    match &geometry.value {
        Value::LineString(coords) => add_line(to_line(coords)),
        Value::MultiLineString(lines) => lines.iter().for_each(|coords| add_line(to_line(coords))),
        Value::Polygon(rings) => {
            if let Some(exterior) = rings.first() {
                add_line(to_line(exterior));
            }
        }
        Value::MultiPolygon(polygons) => {
            for rings in polygons {
                if let Some(exterior) = rings.first() {
                    add_line(to_line(exterior));
                }
            }
        }
        Value::GeometryCollection(geometries) => {
            for g in geometries {
                collect_geometry_lines(g, add_line);
            }
        }
        _ => {}
    }
}

/// Coarse outline of Europe and the Mediterranean rim, used when no
/// Natural Earth data is available
pub fn generate_fallback_outline(renderer: &mut MapRenderer) {
    // Iberia, France, Low Countries, Denmark, Baltic coast, Gulf of Finland
    renderer.add_coastline(
        vec![
            (-9.0, 37.0), (-6.3, 36.8), (-5.6, 36.0), (-2.0, 36.7), (0.0, 38.7),
            (0.8, 41.0), (3.2, 42.0), (3.2, 43.3), (6.5, 43.1), (8.8, 44.4),
            (10.5, 43.5), (12.3, 41.7), (15.6, 40.0), (16.0, 38.0), (17.0, 39.0),
            (18.5, 40.1), (16.0, 41.5), (13.5, 43.6), (12.3, 45.3), (13.7, 45.7),
            (15.0, 44.5), (17.5, 43.0), (19.5, 41.8), (19.4, 40.3), (21.0, 38.3),
            (22.5, 36.4), (23.2, 38.0), (24.0, 40.3), (26.2, 40.6), (28.9, 41.0),
            (28.0, 42.0), (28.6, 44.0), (29.7, 45.3), (30.7, 46.5), (33.5, 46.0),
            (32.5, 45.4), (33.5, 44.5), (36.5, 45.3), (35.0, 45.8), (38.0, 47.1),
            (39.5, 47.2), (38.5, 46.0), (37.5, 44.6), (41.6, 41.6),
        ],
        Lod::Low,
    );

    renderer.add_coastline(
        vec![
            (-9.0, 37.0), (-9.5, 39.5), (-8.8, 42.0), (-9.2, 43.2), (-7.5, 43.8),
            (-2.0, 43.4), (-1.4, 44.5), (-1.2, 46.2), (-2.3, 47.1), (-4.5, 47.9),
            (-4.6, 48.6), (-1.6, 48.7), (-1.2, 49.7), (0.2, 49.5), (1.6, 50.9),
            (3.3, 51.4), (4.3, 52.2), (4.8, 53.0), (7.0, 53.5), (8.6, 53.9),
            (8.6, 55.5), (8.2, 56.8), (10.6, 57.7), (10.3, 56.2), (10.9, 54.4),
            (12.3, 54.2), (14.2, 53.9), (16.5, 54.5), (18.5, 54.8), (19.6, 54.4),
            (21.2, 55.2), (21.0, 56.5), (21.6, 57.5), (22.6, 57.7), (23.3, 57.0),
            (24.1, 57.0), (24.4, 58.3), (23.5, 58.6), (23.5, 59.2), (25.0, 59.5),
            (28.0, 59.5), (30.2, 59.9), (29.0, 60.2), (26.5, 60.4), (22.9, 59.9),
            (21.4, 60.8), (21.5, 62.5), (25.0, 65.0), (24.2, 65.8), (22.0, 65.6),
            (21.2, 64.0), (19.0, 63.2), (17.5, 62.0), (17.2, 60.7), (18.9, 59.8),
            (16.6, 57.0), (14.4, 55.6), (12.9, 55.6), (12.6, 56.2), (11.3, 58.5),
            (10.6, 59.8), (8.3, 58.1), (5.6, 58.7), (5.0, 61.0), (7.0, 62.8),
            (10.0, 64.0), (14.0, 67.0), (16.0, 68.5), (19.0, 70.0), (25.0, 71.0),
            (30.0, 70.0), (33.0, 69.3), (41.0, 67.5), (40.3, 64.6),
        ],
        Lod::Low,
    );

    // Great Britain
    renderer.add_coastline(
        vec![
            (-5.7, 50.1), (-3.5, 50.6), (1.3, 51.1), (1.7, 52.6), (0.3, 53.5),
            (-1.6, 55.6), (-2.0, 57.6), (-3.3, 58.6), (-5.0, 58.6), (-6.2, 56.7),
            (-4.9, 55.0), (-3.0, 54.0), (-4.6, 53.3), (-4.1, 52.0), (-5.3, 51.7),
            (-3.0, 51.2), (-5.7, 50.1),
        ],
        Lod::Low,
    );

    // Ireland
    renderer.add_coastline(
        vec![
            (-6.0, 52.2), (-6.2, 53.9), (-5.9, 55.2), (-7.7, 55.2), (-10.0, 54.2),
            (-9.8, 53.3), (-10.4, 51.9), (-8.3, 51.6), (-6.0, 52.2),
        ],
        Lod::Low,
    );

    // North African and Levantine shore
    renderer.add_coastline(
        vec![
            (-9.6, 30.4), (-6.8, 34.0), (-5.9, 35.8), (-2.0, 35.1), (3.0, 36.8),
            (10.2, 37.2), (11.0, 35.6), (10.2, 34.2), (11.5, 33.1), (15.2, 32.3),
            (19.0, 30.3), (20.0, 32.0), (23.0, 32.6), (25.2, 31.6), (29.9, 31.2),
            (32.3, 31.3), (34.5, 31.6), (35.0, 33.1), (35.9, 35.4), (36.2, 36.6),
            (32.5, 36.1), (29.5, 36.3), (27.3, 37.0), (26.3, 38.3), (26.2, 40.0),
        ],
        Lod::Low,
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collect_polygon_exteriors() {
        let geojson: GeoJson = r#"{
            "type": "FeatureCollection",
            "features": [
                {"type": "Feature", "properties": {},
                 "geometry": {"type": "Polygon", "coordinates": [[[0,0],[1,0],[1,1],[0,0]], [[0.2,0.2],[0.3,0.2],[0.2,0.3],[0.2,0.2]]]}},
                {"type": "Feature", "properties": {},
                 "geometry": {"type": "MultiLineString", "coordinates": [[[5,5],[6,6]], [[7,7],[8,8]]]}},
                {"type": "Feature", "properties": {},
                 "geometry": {"type": "Point", "coordinates": [9,9]}}
            ]
        }"#
        .parse()
        .unwrap();

        let mut lines = Vec::new();
        collect_geojson_lines(&geojson, &mut |line| lines.push(line));

        // One polygon exterior (holes dropped) plus two lines; points ignored
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0].len(), 4);
        assert_eq!(lines[2], vec![(7.0, 7.0), (8.0, 8.0)]);
    }

    #[test]
    fn test_fallback_outline_has_data() {
        let mut renderer = MapRenderer::new();
        assert!(!renderer.has_data());
        generate_fallback_outline(&mut renderer);
        assert!(renderer.has_data());
    }
}
