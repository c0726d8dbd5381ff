//! Geographic coordinates.

use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};
use crate::value_object::ValueObject;

const EARTH_RADIUS_KM: f64 = 6371.0;

/// A validated WGS84 point.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl ValueObject for Coordinates {}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> DomainResult<Self> {
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(DomainError::validation(format!(
                "latitude must be between -90 and 90 (got {latitude})"
            )));
        }
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(DomainError::validation(format!(
                "longitude must be between -180 and 180 (got {longitude})"
            )));
        }
        Ok(Self { latitude, longitude })
    }

    /// Optional coordinates: both halves or neither.
    pub fn from_optional(
        latitude: Option<f64>,
        longitude: Option<f64>,
    ) -> DomainResult<Option<Self>> {
        match (latitude, longitude) {
            (Some(lat), Some(lon)) => Self::new(lat, lon).map(Some),
            (None, None) => Ok(None),
            _ => Err(DomainError::validation(
                "latitude and longitude must be provided together",
            )),
        }
    }

    /// Great-circle distance (haversine).
    pub fn distance_km(&self, other: &Coordinates) -> f64 {
        let (lat1, lat2) = (self.latitude.to_radians(), other.latitude.to_radians());
        let dlat = lat2 - lat1;
        let dlon = (other.longitude - self.longitude).to_radians();
        let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
        2.0 * EARTH_RADIUS_KM * a.sqrt().asin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_out_of_range_points() {
        assert!(Coordinates::new(91.0, 0.0).is_err());
        assert!(Coordinates::new(0.0, -180.5).is_err());
        assert!(Coordinates::new(f64::NAN, 0.0).is_err());
        assert!(Coordinates::new(-90.0, 180.0).is_ok());
    }

    #[test]
    fn half_a_pair_is_rejected() {
        assert!(Coordinates::from_optional(Some(1.0), None).is_err());
        assert_eq!(Coordinates::from_optional(None, None).unwrap(), None);
    }

    #[test]
    fn paris_to_london_is_about_344_km() {
        let paris = Coordinates::new(48.8566, 2.3522).unwrap();
        let london = Coordinates::new(51.5074, -0.1278).unwrap();
        let km = paris.distance_km(&london);
        assert!((km - 343.5).abs() < 2.0, "got {km}");
    }
}
