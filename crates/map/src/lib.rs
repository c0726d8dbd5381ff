//! `dreambook-map` — named map locations and what users pin to them.

pub mod items;
pub mod location;

pub use items::{MapAnnotation, MapBookmark, MapItem, MapMarker, MarkerType, Poi};
pub use location::{Location, LocationPatch, NearbyQuery, NewLocation, nearby};
