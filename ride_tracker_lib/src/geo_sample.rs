use chrono::{DateTime, Utc};
use geo::{Distance, Haversine};
use geo_types::Point;
use serde::Serialize;

use crate::SampleError;

/// One position fix captured while recording. Immutable once built.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GeoSample {
    #[serde(rename = "lat")]
    latitude: f64,
    #[serde(rename = "lng")]
    longitude: f64,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    timestamp: DateTime<Utc>,
}

impl GeoSample {
    pub fn new(latitude: f64, longitude: f64, timestamp: DateTime<Utc>) -> Result<Self, SampleError> {
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(SampleError::LatitudeOutOfRange(latitude));
        }
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(SampleError::LongitudeOutOfRange(longitude));
        }

        Ok(Self {
            latitude,
            longitude,
            timestamp,
        })
    }

    pub fn from_millis(latitude: f64, longitude: f64, timestamp_ms: i64) -> Result<Self, SampleError> {
        let timestamp = DateTime::from_timestamp_millis(timestamp_ms)
            .ok_or(SampleError::InvalidTimestamp(timestamp_ms))?;
        Self::new(latitude, longitude, timestamp)
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn timestamp_millis(&self) -> i64 {
        self.timestamp.timestamp_millis()
    }

    /// x is longitude, y is latitude.
    pub fn point(&self) -> Point {
        Point::new(self.longitude, self.latitude)
    }

    /// Great-circle distance on the mean earth sphere.
    pub fn distance_km(&self, other: &GeoSample) -> f64 {
        Haversine.distance(self.point(), other.point()) / 1000.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_out_of_range_coordinates() {
        assert_eq!(GeoSample::from_millis(91.0, 0.0, 0), Err(SampleError::LatitudeOutOfRange(91.0)));
        assert_eq!(GeoSample::from_millis(0.0, -180.5, 0), Err(SampleError::LongitudeOutOfRange(-180.5)));
        assert!(GeoSample::from_millis(f64::NAN, 0.0, 0).is_err());
        assert!(GeoSample::from_millis(-90.0, 180.0, 0).is_ok());
    }

    #[test]
    fn keeps_millisecond_timestamp() {
        let sample = GeoSample::from_millis(-16.76, -49.28, 1_700_000_000_123).unwrap();
        assert_eq!(sample.timestamp_millis(), 1_700_000_000_123);

        let json = serde_json::to_value(sample).unwrap();
        assert_eq!(json["lat"], -16.76);
        assert_eq!(json["lng"], -49.28);
        assert_eq!(json["timestamp"], 1_700_000_000_123i64);
    }

    #[test]
    fn point_is_lon_lat() {
        let sample = GeoSample::from_millis(56.17, 10.19, 0).unwrap();
        assert_eq!(sample.point().x(), 10.19);
        assert_eq!(sample.point().y(), 56.17);
    }

    #[test]
    fn one_degree_of_latitude() {
        let a = GeoSample::from_millis(0.0, 0.0, 0).unwrap();
        let b = GeoSample::from_millis(1.0, 0.0, 0).unwrap();
        let d = a.distance_km(&b);
        assert!((d - 111.19).abs() < 0.05, "got {d}");
        assert_eq!(a.distance_km(&a), 0.0);
    }
}
