// Great-circle distance between a user location and a hotel

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Mean earth radius used for every distance computation
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// A validated WGS84 coordinate pair
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    /// Returns `None` for non-finite or out-of-range coordinates
    pub fn new(latitude: f64, longitude: f64) -> Option<Self> {
        let valid = latitude.is_finite()
            && longitude.is_finite()
            && (-90.0..=90.0).contains(&latitude)
            && (-180.0..=180.0).contains(&longitude);

        valid.then_some(Self { latitude, longitude })
    }
}

/// Spherical law of cosines distance in kilometres
///
/// The acos argument is clamped to [-1, 1] so identical and antipodal points
/// never produce NaN.
pub fn distance_km(a: GeoPoint, b: GeoPoint) -> f64 {
    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();
    let delta_lng = (b.longitude - a.longitude).to_radians();

    let cosine = lat1.cos() * lat2.cos() * delta_lng.cos() + lat1.sin() * lat2.sin();
    EARTH_RADIUS_KM * cosine.clamp(-1.0, 1.0).acos()
}

/// The same formula as an SQL expression over `h.latitude` / `h.longitude`
///
/// `lat_ref` and `lng_ref` are placeholders such as `$3`.
pub fn distance_sql(lat_ref: &str, lng_ref: &str) -> String {
    format!(
        "({radius} * acos(LEAST(1.0, GREATEST(-1.0, \
         cos(radians({lat})) * cos(radians(h.latitude)) * cos(radians(h.longitude) - radians({lng})) \
         + sin(radians({lat})) * sin(radians(h.latitude))))))",
        radius = EARTH_RADIUS_KM,
        lat = lat_ref,
        lng = lng_ref,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const TOLERANCE_KM: f64 = 1e-3;

    fn point(lat: f64, lng: f64) -> GeoPoint {
        GeoPoint::new(lat, lng).unwrap()
    }

    #[test]
    fn test_rejects_invalid_coordinates() {
        assert!(GeoPoint::new(91.0, 0.0).is_none());
        assert!(GeoPoint::new(0.0, -180.5).is_none());
        assert!(GeoPoint::new(f64::NAN, 0.0).is_none());
        assert!(GeoPoint::new(0.0, f64::INFINITY).is_none());
        assert!(GeoPoint::new(31.23, 121.47).is_some());
    }

    #[test]
    fn test_known_distance_shanghai_to_beijing() {
        let shanghai = point(31.23, 121.47);
        let beijing = point(39.90, 116.40);
        let d = distance_km(shanghai, beijing);

        assert!((d - 1067.0).abs() < 10.0, "unexpected distance {}", d);
    }

    #[test]
    fn test_antipodal_points_do_not_produce_nan() {
        let d = distance_km(point(0.0, 0.0), point(0.0, 180.0));
        assert!(d.is_finite());
        assert!((d - std::f64::consts::PI * EARTH_RADIUS_KM).abs() < 1.0);
    }

    #[test]
    fn test_distance_sql_uses_clamped_acos() {
        let sql = distance_sql("$1", "$2");
        assert!(sql.contains("LEAST(1.0, GREATEST(-1.0"));
        assert!(sql.contains("radians($1)"));
        assert!(sql.contains("radians($2)"));
        assert!(sql.contains("6371"));
    }

    fn coordinate() -> impl Strategy<Value = GeoPoint> {
        (-90.0f64..=90.0, -180.0f64..=180.0).prop_map(|(lat, lng)| point(lat, lng))
    }

    proptest! {
        #[test]
        fn prop_distance_is_symmetric(a in coordinate(), b in coordinate()) {
            let ab = distance_km(a, b);
            let ba = distance_km(b, a);
            prop_assert!((ab - ba).abs() < TOLERANCE_KM);
        }

        #[test]
        fn prop_distance_to_self_is_zero(a in coordinate()) {
            let d = distance_km(a, a);
            prop_assert!(!d.is_nan());
            prop_assert!(d.abs() < TOLERANCE_KM);
        }

        #[test]
        fn prop_distance_is_bounded(a in coordinate(), b in coordinate()) {
            let d = distance_km(a, b);
            prop_assert!(d.is_finite());
            prop_assert!(d >= 0.0);
            prop_assert!(d <= std::f64::consts::PI * EARTH_RADIUS_KM + TOLERANCE_KM);
        }
    }
}
