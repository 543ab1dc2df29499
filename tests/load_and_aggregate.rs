use geojson::{GeoJson, Value};
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;
use zeitung_atlas::aggregate::{aggregate_range, MissingYears, RangePolicy, YearRange};
use zeitung_atlas::config::AtlasConfig;
use zeitung_atlas::data::places::load_place_index;
use zeitung_atlas::error::LoadError;
use zeitung_atlas::markers::{build_markers, to_feature_collection};
use zeitung_atlas::scale::MarkerScaler;

const FIXTURE: &str = r#"{
    "1850": {"name": {"0": "Berlin", "1": "Riga"}, "x": {"0": 13.4, "1": 24.1}, "y": {"0": 52.5, "1": 56.95}, "count": {"0": 5, "1": 1}},
    "1851": {"name": {"0": "Berlin"}, "x": {"0": 13.4}, "y": {"0": 52.5}, "count": {"0": 3}},
    "1860": {"name": ["Riga", "Paris"], "x": [24.1, 2.35], "y": [56.95, 48.85], "count": [10, 2]}
}"#;

fn write_fixture(dir: &TempDir) -> PathBuf {
    let path = dir.path().join("places_by_year.json");
    fs::write(&path, FIXTURE).unwrap();
    path
}

#[test]
fn test_berlin_two_years() {
    let dir = TempDir::new().unwrap();
    let index = load_place_index(&write_fixture(&dir)).unwrap();
    assert_eq!(index.len(), 3);

    let range = YearRange::from_selection(1850, 1851, RangePolicy::Inclusive).unwrap();
    let result = aggregate_range(&index, range, MissingYears::Skip).unwrap();

    let berlin = result.get("Berlin").unwrap();
    assert_eq!(berlin.count, 8);
    assert_eq!((berlin.x, berlin.y), (13.4, 52.5));
    assert_eq!(result.max_count(), 8);

    let markers = build_markers(&result, &MarkerScaler::default()).unwrap();
    assert_eq!(markers[0].label, "Berlin: 8");
    // 8 * (8 / 2) + 10000
    assert_eq!(markers[0].radius_m, 10_032.0);
    assert_eq!(markers[1].label, "Riga: 1");
}

#[test]
fn test_exclusive_policy_matches_half_open_range() {
    let dir = TempDir::new().unwrap();
    let index = load_place_index(&write_fixture(&dir)).unwrap();

    let range = YearRange::from_selection(1850, 1851, RangePolicy::Exclusive).unwrap();
    assert_eq!(range, YearRange::new(1850, 1851).unwrap());
    let result = aggregate_range(&index, range, MissingYears::Skip).unwrap();
    assert_eq!(result.get("Berlin").unwrap().count, 5);

    // Strict mode trips over the gap between 1851 and 1860
    let wide = YearRange::from_selection(1850, 1860, RangePolicy::Inclusive).unwrap();
    assert!(aggregate_range(&index, wide, MissingYears::Strict).is_err());
    assert_eq!(aggregate_range(&index, wide, MissingYears::Skip).unwrap().max_count(), 11);
}

#[test]
fn test_geojson_export() {
    let dir = TempDir::new().unwrap();
    let index = load_place_index(&write_fixture(&dir)).unwrap();

    let range = YearRange::from_selection(1860, 1860, RangePolicy::Inclusive).unwrap();
    let result = aggregate_range(&index, range, MissingYears::Skip).unwrap();
    assert_eq!(result.max_count(), 10);

    let markers = build_markers(&result, &MarkerScaler::default()).unwrap();
    let text = GeoJson::from(to_feature_collection(&markers)).to_string();

    let GeoJson::FeatureCollection(collection) = text.parse::<GeoJson>().unwrap() else {
        panic!("expected a feature collection");
    };
    assert_eq!(collection.features.len(), 2);

    let riga = &collection.features[0];
    assert_eq!(riga.property("name").and_then(|v| v.as_str()), Some("Riga"));
    assert_eq!(riga.property("count").and_then(|v| v.as_u64()), Some(10));
    assert_eq!(riga.property("radius_m").and_then(|v| v.as_f64()), Some(10_100.0));
    match riga.geometry.as_ref().map(|g| &g.value) {
        Some(Value::Point(coords)) => assert_eq!(coords, &vec![24.1, 56.95]),
        other => panic!("unexpected geometry: {other:?}"),
    }
}

#[test]
fn test_config_points_at_fixture() {
    let dir = TempDir::new().unwrap();
    let places = write_fixture(&dir);
    let config_path = dir.path().join("zeitung-atlas.toml");
    fs::write(
        &config_path,
        format!(
            "[input]\nplaces = {:?}\n\n[range]\nmin_year = 1850\nmax_year = 1860\npolicy = \"exclusive\"\n",
            places.display().to_string()
        ),
    )
    .unwrap();

    let config = AtlasConfig::load(Some(&config_path)).unwrap();
    assert_eq!(config.range.policy, RangePolicy::Exclusive);
    let index = load_place_index(&config.input.places).unwrap();
    assert_eq!(index.first_year(), Some(1850));
    assert_eq!(index.last_year(), Some(1860));
}

#[test]
fn test_missing_files() {
    let dir = TempDir::new().unwrap();
    let err = load_place_index(&dir.path().join("absent.json")).unwrap_err();
    assert!(matches!(err, LoadError::Io { .. }));
    assert!(AtlasConfig::load(Some(&dir.path().join("absent.toml"))).is_err());
}
