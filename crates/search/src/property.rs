use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use dreambook_core::{DomainError, DomainResult, PropertyId, impl_entity};

pub const DEFAULT_PROPERTY_TYPE: &str = "apartment";

/// A denormalized, search-optimized view of a rentable property.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchProperty {
    pub id: PropertyId,
    pub title: String,
    pub location: String,
    pub price_per_night: u64,
    pub max_guests: u32,
    pub available_from: NaiveDate,
    pub available_to: NaiveDate,
    pub rating: f64,
    pub amenities: Vec<String>,
    /// Kilometres.
    pub distance_to_center: f64,
    pub property_type: String,
    pub review_count: u32,
}

impl_entity!(SearchProperty, PropertyId);

fn default_property_type() -> String {
    DEFAULT_PROPERTY_TYPE.to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewSearchProperty {
    pub title: String,
    pub location: String,
    pub price_per_night: u64,
    pub max_guests: u32,
    pub available_from: NaiveDate,
    pub available_to: NaiveDate,
    #[serde(default)]
    pub rating: f64,
    #[serde(default)]
    pub amenities: Vec<String>,
    #[serde(default)]
    pub distance_to_center: f64,
    #[serde(default = "default_property_type")]
    pub property_type: String,
    #[serde(default)]
    pub review_count: u32,
}

impl SearchProperty {
    pub fn create(id: PropertyId, cmd: NewSearchProperty) -> DomainResult<Self> {
        let title = cmd.title.trim();
        if title.is_empty() || title.chars().count() > 255 {
            return Err(DomainError::validation("title must be 1 to 255 characters"));
        }
        let location = cmd.location.trim();
        if location.is_empty() || location.chars().count() > 255 {
            return Err(DomainError::validation("location must be 1 to 255 characters"));
        }
        if cmd.max_guests == 0 {
            return Err(DomainError::validation("max_guests must be positive"));
        }
        if cmd.available_to < cmd.available_from {
            return Err(DomainError::validation(
                "available_to cannot be before available_from",
            ));
        }
        if !cmd.rating.is_finite() || !(0.0..=5.0).contains(&cmd.rating) {
            return Err(DomainError::out_of_range("rating", 0, 5));
        }
        if !cmd.distance_to_center.is_finite() || cmd.distance_to_center < 0.0 {
            return Err(DomainError::validation("distance_to_center cannot be negative"));
        }
        let property_type = match cmd.property_type.trim() {
            "" => DEFAULT_PROPERTY_TYPE.to_string(),
            t if t.chars().count() > 100 => {
                return Err(DomainError::validation(
                    "property_type cannot exceed 100 characters",
                ));
            }
            t => t.to_string(),
        };

        let mut amenities: Vec<String> = Vec::with_capacity(cmd.amenities.len());
        for amenity in cmd.amenities {
            let amenity = amenity.trim().to_string();
            if !amenity.is_empty() && !amenities.contains(&amenity) {
                amenities.push(amenity);
            }
        }

        Ok(Self {
            id,
            title: title.to_string(),
            location: location.to_string(),
            price_per_night: cmd.price_per_night,
            max_guests: cmd.max_guests,
            available_from: cmd.available_from,
            available_to: cmd.available_to,
            rating: cmd.rating,
            amenities,
            distance_to_center: cmd.distance_to_center,
            property_type,
            review_count: cmd.review_count,
        })
    }

    pub fn has_amenities(&self, wanted: &[String]) -> bool {
        wanted.iter().all(|a| self.amenities.contains(a))
    }
}
