use tracing::debug;

use crate::property::SearchProperty;
use crate::query::{PropertyQuery, PropertySource};

/// Candidates flowing through a filter chain.
#[derive(Debug, Clone, PartialEq)]
pub enum CandidateSet {
    /// Not yet evaluated; filters add predicates to the query.
    Query(PropertyQuery),
    /// Materialized; filters retain matching entries.
    List(Vec<SearchProperty>),
}

impl Default for CandidateSet {
    fn default() -> Self {
        Self::Query(PropertyQuery::default())
    }
}

impl CandidateSet {
    pub fn is_materialized(&self) -> bool {
        matches!(self, Self::List(_))
    }

    pub fn materialize(self, source: &dyn PropertySource) -> Vec<SearchProperty> {
        match self {
            Self::Query(q) => source.execute(&q),
            Self::List(list) => list,
        }
    }

    fn narrow(
        self,
        push_down: impl FnOnce(&mut PropertyQuery),
        keep: impl Fn(&SearchProperty) -> bool,
    ) -> Self {
        match self {
            Self::Query(mut q) => {
                push_down(&mut q);
                Self::Query(q)
            }
            Self::List(mut list) => {
                list.retain(|p| keep(p));
                Self::List(list)
            }
        }
    }
}

/// One step of a search.
pub trait PropertyFilter: Send + Sync + core::fmt::Debug {
    fn apply(&self, set: CandidateSet, source: &dyn PropertySource) -> CandidateSet;
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceFilter {
    pub min: u64,
    pub max: u64,
}

impl PropertyFilter for PriceFilter {
    fn apply(&self, set: CandidateSet, _source: &dyn PropertySource) -> CandidateSet {
        let (min, max) = (self.min, self.max);
        set.narrow(
            |q| q.price = Some((min, max)),
            |p| min <= p.price_per_night && p.price_per_night <= max,
        )
    }
}

/// Case-insensitive substring match on the location text.
#[derive(Debug, Clone, PartialEq)]
pub struct LocationFilter {
    pub needle: String,
}

impl PropertyFilter for LocationFilter {
    fn apply(&self, set: CandidateSet, _source: &dyn PropertySource) -> CandidateSet {
        let needle = self.needle.to_lowercase();
        set.narrow(
            |q| q.location = Some(self.needle.clone()),
            |p| p.location.to_lowercase().contains(&needle),
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RatingFilter {
    pub min: f64,
    pub max: f64,
}

impl PropertyFilter for RatingFilter {
    fn apply(&self, set: CandidateSet, _source: &dyn PropertySource) -> CandidateSet {
        let (min, max) = (self.min, self.max);
        set.narrow(
            |q| q.rating = Some((min, max)),
            |p| min <= p.rating && p.rating <= max,
        )
    }
}

/// Properties offering every listed amenity.
///
/// Pushes down only when the source supports containment; otherwise the set
/// is materialized here.
#[derive(Debug, Clone, PartialEq)]
pub struct AmenityFilter {
    pub amenities: Vec<String>,
}

impl PropertyFilter for AmenityFilter {
    fn apply(&self, set: CandidateSet, source: &dyn PropertySource) -> CandidateSet {
        match set {
            CandidateSet::Query(mut q) if source.supports_containment() => {
                for amenity in &self.amenities {
                    if !q.amenities.contains(amenity) {
                        q.amenities.push(amenity.clone());
                    }
                }
                CandidateSet::Query(q)
            }
            set => {
                if !set.is_materialized() {
                    debug!("amenity filter materializing candidate set");
                }
                let mut list = set.materialize(source);
                list.retain(|p| p.has_amenities(&self.amenities));
                CandidateSet::List(list)
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DistanceFilter {
    pub max_km: f64,
}

impl PropertyFilter for DistanceFilter {
    fn apply(&self, set: CandidateSet, _source: &dyn PropertySource) -> CandidateSet {
        let max = self.max_km;
        set.narrow(
            |q| q.max_distance = Some(max),
            |p| p.distance_to_center <= max,
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PropertyTypeFilter {
    pub types: Vec<String>,
}

impl PropertyFilter for PropertyTypeFilter {
    fn apply(&self, set: CandidateSet, _source: &dyn PropertySource) -> CandidateSet {
        set.narrow(
            |q| q.property_types = self.types.clone(),
            |p| self.types.contains(&p.property_type),
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReviewCountFilter {
    pub min_reviews: u32,
}

impl PropertyFilter for ReviewCountFilter {
    fn apply(&self, set: CandidateSet, _source: &dyn PropertySource) -> CandidateSet {
        let min = self.min_reviews;
        set.narrow(|q| q.min_reviews = Some(min), |p| p.review_count >= min)
    }
}

/// Run `filters` in order and return the surviving properties.
pub fn run_filters(
    filters: &[Box<dyn PropertyFilter>],
    source: &dyn PropertySource,
) -> Vec<SearchProperty> {
    filters
        .iter()
        .fold(CandidateSet::default(), |set, f| f.apply(set, source))
        .materialize(source)
}
