use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Mean Earth radius (IUGG), meters.
pub const EARTH_RADIUS_M: f64 = 6_371_008.8;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeoError {
    #[error("latitude {0} is outside [-90, 90]")]
    Latitude(f64),
    #[error("longitude {0} is outside [-180, 180]")]
    Longitude(f64),
}

/// A point on the globe. Serialized as a `[latitude, longitude]` pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "[f64; 2]", into = "[f64; 2]")]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, GeoError> {
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(GeoError::Latitude(latitude));
        }
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(GeoError::Longitude(longitude));
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    /// Great-circle distance in meters (haversine).
    pub fn distance_m(&self, other: &GeoPoint) -> f64 {
        let lat1 = self.latitude.to_radians();
        let lat2 = other.latitude.to_radians();
        let d_lat = (other.latitude - self.latitude).to_radians();
        let d_lng = (other.longitude - self.longitude).to_radians();

        let a = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lng / 2.0).sin().powi(2);
        2.0 * EARTH_RADIUS_M * a.sqrt().min(1.0).asin()
    }
}

impl TryFrom<[f64; 2]> for GeoPoint {
    type Error = GeoError;

    fn try_from([latitude, longitude]: [f64; 2]) -> Result<Self, Self::Error> {
        GeoPoint::new(latitude, longitude)
    }
}

impl From<GeoPoint> for [f64; 2] {
    fn from(point: GeoPoint) -> Self {
        [point.latitude, point.longitude]
    }
}

/// Latitude/longitude rectangle that contains every point within a radius of a center.
/// Used as an index-friendly prefilter; exact distances are computed afterwards.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lng: f64,
    pub max_lng: f64,
}

impl BoundingBox {
    pub fn around(center: GeoPoint, radius_m: f64) -> Self {
        let angular = radius_m.max(0.0) / EARTH_RADIUS_M;
        let d_lat = angular.to_degrees();
        let min_lat = center.latitude - d_lat;
        let max_lat = center.latitude + d_lat;

        // Widest longitude offset on the circle is asin(sin δ / cos φ). When that ratio
        // reaches 1, or the box crosses a pole or the antimeridian, take every longitude.
        let ratio = angular.sin() / center.latitude.to_radians().cos();
        let (min_lng, max_lng) = if min_lat <= -90.0
            || max_lat >= 90.0
            || !ratio.is_finite()
            || ratio >= 1.0
        {
            (-180.0, 180.0)
        } else {
            let d_lng = ratio.asin().to_degrees();
            let min_lng = center.longitude - d_lng;
            let max_lng = center.longitude + d_lng;
            if min_lng < -180.0 || max_lng > 180.0 {
                (-180.0, 180.0)
            } else {
                (min_lng, max_lng)
            }
        };

        Self {
            min_lat: min_lat.max(-90.0),
            max_lat: max_lat.min(90.0),
            min_lng,
            max_lng,
        }
    }

    #[cfg(test)]
    pub fn contains(&self, point: &GeoPoint) -> bool {
        (self.min_lat..=self.max_lat).contains(&point.latitude)
            && (self.min_lng..=self.max_lng).contains(&point.longitude)
    }
}
