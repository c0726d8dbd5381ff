//! `dreambook-search` — attribute filtering and sorting of search properties.
//!
//! A search runs a chain of [`PropertyFilter`]s over a [`CandidateSet`]. While
//! the set is still a [`PropertyQuery`] every filter is pushed down to the
//! [`PropertySource`]; a filter the source cannot evaluate materializes the set
//! and every later filter runs on the in-memory list.

pub mod criteria;
pub mod filters;
pub mod property;
pub mod query;
pub mod sort;

pub use criteria::SearchCriteria;
pub use filters::{
    AmenityFilter, CandidateSet, DistanceFilter, LocationFilter, PriceFilter, PropertyFilter,
    PropertyTypeFilter, RatingFilter, ReviewCountFilter, run_filters,
};
pub use property::{DEFAULT_PROPERTY_TYPE, NewSearchProperty, SearchProperty};
pub use query::{MemorySource, PropertyQuery, PropertySource};
pub use sort::PropertySort;
