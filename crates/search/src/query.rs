use crate::property::SearchProperty;

/// Predicates pushed down to a [`PropertySource`]. Every set field narrows
/// the result; unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropertyQuery {
    pub price: Option<(u64, u64)>,
    pub location: Option<String>,
    pub rating: Option<(f64, f64)>,
    pub amenities: Vec<String>,
    pub max_distance: Option<f64>,
    pub property_types: Vec<String>,
    pub min_reviews: Option<u32>,
}

impl PropertyQuery {
    pub fn matches(&self, p: &SearchProperty) -> bool {
        self.price
            .is_none_or(|(min, max)| min <= p.price_per_night && p.price_per_night <= max)
            && self.location.as_deref().is_none_or(|needle| {
                p.location.to_lowercase().contains(&needle.to_lowercase())
            })
            && self
                .rating
                .is_none_or(|(min, max)| min <= p.rating && p.rating <= max)
            && p.has_amenities(&self.amenities)
            && self.max_distance.is_none_or(|d| p.distance_to_center <= d)
            && (self.property_types.is_empty() || self.property_types.contains(&p.property_type))
            && self.min_reviews.is_none_or(|n| p.review_count >= n)
    }
}

/// Where candidate properties come from.
pub trait PropertySource {
    /// Whether the source can evaluate amenity containment itself.
    fn supports_containment(&self) -> bool;

    fn execute(&self, query: &PropertyQuery) -> Vec<SearchProperty>;
}

/// A source backed by a loaded snapshot of properties.
#[derive(Debug, Clone)]
pub struct MemorySource {
    properties: Vec<SearchProperty>,
    containment: bool,
}

impl MemorySource {
    pub fn new(properties: Vec<SearchProperty>) -> Self {
        Self {
            properties,
            containment: true,
        }
    }

    /// A source that cannot evaluate amenity containment, forcing amenity
    /// filters to materialize.
    pub fn without_containment(properties: Vec<SearchProperty>) -> Self {
        Self {
            properties,
            containment: false,
        }
    }
}

impl PropertySource for MemorySource {
    fn supports_containment(&self) -> bool {
        self.containment
    }

    fn execute(&self, query: &PropertyQuery) -> Vec<SearchProperty> {
        let mut query = query.clone();
        if !self.containment {
            // Amenities are never pushed down to such a source.
            query.amenities.clear();
        }
        self.properties
            .iter()
            .filter(|p| query.matches(p))
            .cloned()
            .collect()
    }
}
