//! `dreambook-core` — domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns)
//! shared by every marketplace module: typed identifiers, the domain error
//! model, stay date ranges, coordinates and money helpers.

pub mod aggregate;
pub mod dates;
pub mod entity;
pub mod error;
pub mod event;
pub mod geo;
pub mod id;
pub mod money;
pub mod value_object;

pub use aggregate::{Aggregate, AggregateRoot, ExpectedVersion};
pub use dates::StayDates;
pub use entity::Entity;
pub use error::{DomainError, DomainResult};
pub use event::Event;
pub use geo::Coordinates;
pub use id::*;
pub use money::percent_of;
pub use value_object::ValueObject;
