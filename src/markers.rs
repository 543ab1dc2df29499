//! Per-marker contract handed to a map renderer: position, radius, label.

use crate::aggregate::AggregationResult;
use crate::error::AggregateError;
use crate::scale::MarkerScaler;
use geojson::{Feature, FeatureCollection, Geometry, JsonObject, Value};
use serde::Serialize;

/// One circle on the map
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Marker {
    pub name: String,
    pub lon: f64,
    pub lat: f64,
    pub count: u64,
    /// Circle radius in meters
    pub radius_m: f64,
    /// Popup text, `"<name>: <count>"`
    pub label: String,
}

/// Scale every aggregated place into a marker, largest count first
pub fn build_markers(result: &AggregationResult, scaler: &MarkerScaler) -> Result<Vec<Marker>, AggregateError> {
    if result.is_empty() {
        return Ok(Vec::new());
    }

    let mut markers = result
        .places()
        .map(|place| {
            Ok(Marker {
                name: place.name.clone(),
                lon: place.x,
                lat: place.y,
                count: place.count,
                radius_m: scaler.radius(place.count, result.max_count(), result.span())?,
                label: format!("{}: {}", place.name, place.count),
            })
        })
        .collect::<Result<Vec<_>, AggregateError>>()?;

    markers.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.name.cmp(&b.name)));
    Ok(markers)
}

/// Export markers as Point features for external renderers
pub fn to_feature_collection(markers: &[Marker]) -> FeatureCollection {
    let features = markers
        .iter()
        .map(|marker| {
            let mut properties = JsonObject::new();
            properties.insert("name".into(), marker.name.clone().into());
            properties.insert("count".into(), marker.count.into());
            properties.insert("radius_m".into(), marker.radius_m.into());
            properties.insert("label".into(), marker.label.clone().into());

            Feature {
                bbox: None,
                geometry: Some(Geometry::new(Value::Point(vec![marker.lon, marker.lat]))),
                id: None,
                properties: Some(properties),
                foreign_members: None,
            }
        })
        .collect();

    FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::{aggregate, MissingYears};
    use crate::places::{PlaceRecord, YearlyPlaceIndex};

    fn sample() -> AggregationResult {
        let index = YearlyPlaceIndex::from_years([
            (
                1860,
                vec![
                    PlaceRecord::new("Paris", 2.35, 48.85, 2),
                    PlaceRecord::new("Riga", 24.1, 56.95, 10),
                    PlaceRecord::new("Wien", 16.37, 48.2, 2),
                ],
            ),
            (1861, vec![PlaceRecord::new("Riga", 24.1, 56.95, 6)]),
        ]);
        aggregate(&index, 1860, 1862, MissingYears::Skip).unwrap()
    }

    #[test]
    fn test_labels_and_order() {
        let markers = build_markers(&sample(), &MarkerScaler::default()).unwrap();

        let labels: Vec<&str> = markers.iter().map(|m| m.label.as_str()).collect();
        assert_eq!(labels, vec!["Riga: 16", "Paris: 2", "Wien: 2"]);
        assert_eq!((markers[0].lon, markers[0].lat), (24.1, 56.95));
    }

    #[test]
    fn test_radius_uses_final_max() {
        let markers = build_markers(&sample(), &MarkerScaler::default()).unwrap();
        // max 16 over 2 years
        assert_eq!(markers[0].radius_m, 16.0 * 8.0 + 10_000.0);
        assert_eq!(markers[1].radius_m, 2.0 * 8.0 + 10_000.0);
    }

    #[test]
    fn test_empty_result_draws_nothing() {
        let index = YearlyPlaceIndex::new();
        let result = aggregate(&index, 1850, 1850, MissingYears::Skip).unwrap();
        assert!(build_markers(&result, &MarkerScaler::default()).unwrap().is_empty());
    }

    #[test]
    fn test_feature_collection() {
        let markers = build_markers(&sample(), &MarkerScaler::default()).unwrap();
        let fc = to_feature_collection(&markers);

        assert_eq!(fc.features.len(), 3);
        let riga = &fc.features[0];
        assert_eq!(riga.property("label").and_then(|v| v.as_str()), Some("Riga: 16"));
        assert_eq!(riga.property("count").and_then(|v| v.as_u64()), Some(16));
        match riga.geometry.as_ref().map(|g| &g.value) {
            Some(Value::Point(coords)) => assert_eq!(coords, &vec![24.1, 56.95]),
            other => panic!("unexpected geometry {other:?}"),
        }
    }
}
