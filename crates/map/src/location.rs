use serde::{Deserialize, Serialize};

use dreambook_core::{Coordinates, DomainError, DomainResult, LocationId, impl_entity};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub id: LocationId,
    pub name: String,
    /// Free-form place description (city, district, ...).
    pub location: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl_entity!(Location, LocationId);

impl core::fmt::Display for Location {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{} ({})", self.name, self.location)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewLocation {
    pub name: String,
    pub location: String,
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LocationPatch {
    pub name: Option<String>,
    pub location: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

fn text(field: &str, value: &str) -> DomainResult<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(DomainError::validation(format!("{field} cannot be empty")));
    }
    if value.chars().count() > 100 {
        return Err(DomainError::validation(format!("{field} cannot exceed 100 characters")));
    }
    Ok(value.to_string())
}

impl Location {
    pub fn create(cmd: NewLocation) -> DomainResult<Self> {
        let point = Coordinates::new(cmd.latitude, cmd.longitude)?;
        Ok(Self {
            id: LocationId::new(),
            name: text("name", &cmd.name)?,
            location: text("location", &cmd.location)?,
            latitude: point.latitude,
            longitude: point.longitude,
        })
    }

    pub fn coordinates(&self) -> Coordinates {
        Coordinates {
            latitude: self.latitude,
            longitude: self.longitude,
        }
    }

    pub fn apply(&mut self, patch: LocationPatch) -> DomainResult<()> {
        if let Some(name) = patch.name {
            self.name = text("name", &name)?;
        }
        if let Some(location) = patch.location {
            self.location = text("location", &location)?;
        }
        let point = Coordinates::new(
            patch.latitude.unwrap_or(self.latitude),
            patch.longitude.unwrap_or(self.longitude),
        )?;
        self.latitude = point.latitude;
        self.longitude = point.longitude;
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NearbyQuery {
    pub lat: f64,
    pub lon: f64,
    #[serde(default = "default_radius_km")]
    pub radius_km: f64,
}

fn default_radius_km() -> f64 {
    10.0
}

/// Locations within `radius_km` of the query point, closest first, with
/// their distance.
pub fn nearby(locations: Vec<Location>, query: &NearbyQuery) -> DomainResult<Vec<(Location, f64)>> {
    let origin = Coordinates::new(query.lat, query.lon)?;
    if !query.radius_km.is_finite() || query.radius_km < 0.0 {
        return Err(DomainError::validation("radius_km must be a non-negative number"));
    }

    let mut hits: Vec<(Location, f64)> = locations
        .into_iter()
        .map(|l| {
            let km = origin.distance_km(&l.coordinates());
            (l, km)
        })
        .filter(|(_, km)| *km <= query.radius_km)
        .collect();
    hits.sort_by(|a, b| a.1.total_cmp(&b.1));
    Ok(hits)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loc(name: &str, lat: f64, lon: f64) -> Location {
        Location::create(NewLocation {
            name: name.to_string(),
            location: "Poland".to_string(),
            latitude: lat,
            longitude: lon,
        })
        .unwrap()
    }

    #[test]
    fn out_of_range_coordinates_are_rejected() {
        let err = Location::create(NewLocation {
            name: "Nowhere".into(),
            location: "Sea".into(),
            latitude: 123.0,
            longitude: 0.0,
        })
        .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn nearby_orders_by_distance_and_cuts_at_radius() {
        let zakopane = loc("Willa Tatry", 49.29, 19.95);
        let krakow = loc("Rynek", 50.0617, 19.9373);
        let gdansk = loc("Długi Targ", 54.3489, 18.6532);
        let query = NearbyQuery { lat: 50.0, lon: 19.9, radius_km: 120.0 };
        let hits = nearby(vec![gdansk, zakopane, krakow], &query).unwrap();
        let names: Vec<&str> = hits.iter().map(|(l, _)| l.name.as_str()).collect();
        assert_eq!(names, vec!["Rynek", "Willa Tatry"]);
        assert!(hits[0].1 < hits[1].1);
    }

    #[test]
    fn patching_one_coordinate_keeps_the_other() {
        let mut l = loc("Willa Tatry", 49.29, 19.95);
        l.apply(LocationPatch { latitude: Some(49.3), ..Default::default() }).unwrap();
        assert_eq!(l.latitude, 49.3);
        assert_eq!(l.longitude, 19.95);
        assert!(l.apply(LocationPatch { longitude: Some(200.0), ..Default::default() }).is_err());
    }
}
