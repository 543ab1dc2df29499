/// Ground distance covered by one degree of latitude
pub const METERS_PER_DEGREE_LAT: f64 = 111_320.0;

/// Convert a ground distance in meters to degrees of latitude
#[inline(always)]
pub fn meters_to_lat_degrees(meters: f64) -> f64 {
    meters / METERS_PER_DEGREE_LAT
}

/// Convert a ground distance in meters to degrees of longitude at `lat`
#[inline(always)]
pub fn meters_to_lon_degrees(meters: f64, lat: f64) -> f64 {
    // Clamp cosine so polar markers don't blow up the search window
    meters / (METERS_PER_DEGREE_LAT * lat.to_radians().cos().max(0.1))
}

/// True for a finite WGS84 longitude/latitude pair
#[inline(always)]
pub fn is_valid_lonlat(lon: f64, lat: f64) -> bool {
    lon.is_finite() && lat.is_finite() && (-180.0..=180.0).contains(&lon) && (-90.0..=90.0).contains(&lat)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_meters_to_degrees() {
        assert!((meters_to_lat_degrees(METERS_PER_DEGREE_LAT) - 1.0).abs() < 1e-12);
        // Longitude degrees shrink towards the poles, so the same distance spans more of them
        assert!(meters_to_lon_degrees(10_000.0, 60.0) > meters_to_lon_degrees(10_000.0, 0.0));
    }

    #[test]
    fn test_valid_lonlat() {
        assert!(is_valid_lonlat(24.1, 56.9));
        assert!(is_valid_lonlat(-180.0, -90.0));
        assert!(!is_valid_lonlat(181.0, 0.0));
        assert!(!is_valid_lonlat(0.0, f64::NAN));
    }
}
