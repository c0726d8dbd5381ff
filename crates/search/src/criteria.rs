use core::str::FromStr;

use dreambook_core::{DomainError, DomainResult};

use crate::filters::{
    AmenityFilter, DistanceFilter, LocationFilter, PriceFilter, PropertyFilter,
    PropertyTypeFilter, RatingFilter, ReviewCountFilter, run_filters,
};
use crate::property::SearchProperty;
use crate::query::PropertySource;
use crate::sort::PropertySort;

/// Search parameters as received from a query string.
///
/// Range criteria only take effect when both bounds are given.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchCriteria {
    pub price_min: Option<u64>,
    pub price_max: Option<u64>,
    pub location: Option<String>,
    pub min_rating: Option<f64>,
    pub max_rating: Option<f64>,
    pub amenities: Vec<String>,
    pub max_distance: Option<f64>,
    pub property_types: Vec<String>,
    pub min_reviews: Option<u32>,
    pub sort: Option<PropertySort>,
}

fn parse<T: FromStr>(key: &str, value: &str) -> DomainResult<T> {
    value
        .trim()
        .parse()
        .map_err(|_| DomainError::validation(format!("invalid value for {key}: '{value}'")))
}

impl SearchCriteria {
    /// Build criteria from raw `key=value` pairs. Repeated `amenities` and
    /// `property_types` keys accumulate; empty values are ignored; unknown keys
    /// are ignored.
    pub fn from_pairs<I, K, V>(pairs: I) -> DomainResult<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut c = Self::default();
        for (key, value) in pairs {
            let (key, value) = (key.as_ref(), value.as_ref());
            if value.trim().is_empty() {
                continue;
            }
            match key {
                "price_min" => c.price_min = Some(parse(key, value)?),
                "price_max" => c.price_max = Some(parse(key, value)?),
                "location" => c.location = Some(value.trim().to_string()),
                "min_rating" => c.min_rating = Some(parse(key, value)?),
                "max_rating" => c.max_rating = Some(parse(key, value)?),
                "amenities" => c.amenities.push(value.trim().to_string()),
                "max_distance" => c.max_distance = Some(parse(key, value)?),
                "property_types" => c.property_types.push(value.trim().to_string()),
                "min_reviews" => c.min_reviews = Some(parse(key, value)?),
                "sort" => c.sort = Some(value.trim().parse()?),
                _ => {}
            }
        }
        Ok(c)
    }

    /// The filters implied by these criteria, in a fixed order.
    pub fn filters(&self) -> Vec<Box<dyn PropertyFilter>> {
        let mut filters: Vec<Box<dyn PropertyFilter>> = Vec::new();
        if let (Some(min), Some(max)) = (self.price_min, self.price_max) {
            filters.push(Box::new(PriceFilter { min, max }));
        }
        if let Some(needle) = &self.location {
            filters.push(Box::new(LocationFilter {
                needle: needle.clone(),
            }));
        }
        if let (Some(min), Some(max)) = (self.min_rating, self.max_rating) {
            filters.push(Box::new(RatingFilter { min, max }));
        }
        if !self.amenities.is_empty() {
            filters.push(Box::new(AmenityFilter {
                amenities: self.amenities.clone(),
            }));
        }
        if let Some(max_km) = self.max_distance {
            filters.push(Box::new(DistanceFilter { max_km }));
        }
        if !self.property_types.is_empty() {
            filters.push(Box::new(PropertyTypeFilter {
                types: self.property_types.clone(),
            }));
        }
        if let Some(min_reviews) = self.min_reviews {
            filters.push(Box::new(ReviewCountFilter { min_reviews }));
        }
        filters
    }

    /// Filter then sort.
    pub fn search(&self, source: &dyn PropertySource) -> Vec<SearchProperty> {
        let mut results = run_filters(&self.filters(), source);
        if let Some(sort) = self.sort {
            sort.apply(&mut results);
        }
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::MemorySource;
    use chrono::NaiveDate;
    use dreambook_core::PropertyId;

    fn property(title: &str, price: u64, rating: f64, distance: f64) -> SearchProperty {
        SearchProperty {
            id: PropertyId::new(),
            title: title.into(),
            location: "Warszawa".into(),
            price_per_night: price,
            max_guests: 2,
            available_from: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            available_to: NaiveDate::from_ymd_opt(2025, 12, 31).unwrap(),
            rating,
            amenities: vec!["wifi".into()],
            distance_to_center: distance,
            property_type: "apartment".into(),
            review_count: 5,
        }
    }

    #[test]
    fn half_specified_range_is_ignored() {
        let c = SearchCriteria::from_pairs([("price_min", "100")]).unwrap();
        assert!(c.filters().is_empty());
    }

    #[test]
    fn repeated_keys_accumulate() {
        let c = SearchCriteria::from_pairs([
            ("amenities", "wifi"),
            ("amenities", "pool"),
            ("property_types", "house"),
            ("property_types", "villa"),
        ])
        .unwrap();
        assert_eq!(c.amenities, vec!["wifi", "pool"]);
        assert_eq!(c.property_types, vec!["house", "villa"]);
        assert_eq!(c.filters().len(), 2);
    }

    #[test]
    fn bad_numbers_and_sorts_are_rejected() {
        assert!(SearchCriteria::from_pairs([("min_reviews", "many")]).is_err());
        assert!(SearchCriteria::from_pairs([("sort", "cheapest")]).is_err());
    }

    #[test]
    fn filters_then_sorts() {
        let source = MemorySource::new(vec![
            property("a", 9_000, 4.0, 3.0),
            property("b", 20_000, 4.9, 0.5),
            property("c", 14_000, 4.5, 1.2),
            property("d", 50_000, 5.0, 0.1),
        ]);
        let c = SearchCriteria::from_pairs([
            ("price_min", "5000"),
            ("price_max", "25000"),
            ("sort", "rating_desc"),
        ])
        .unwrap();
        let titles: Vec<_> = c.search(&source).into_iter().map(|p| p.title).collect();
        assert_eq!(titles, vec!["b", "c", "a"]);

        let c = SearchCriteria::from_pairs([("max_distance", "2"), ("sort", "distance_asc")]).unwrap();
        let titles: Vec<_> = c.search(&source).into_iter().map(|p| p.title).collect();
        assert_eq!(titles, vec!["d", "b", "c"]);
    }
}
