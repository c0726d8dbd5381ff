//! Things attached to a [`crate::Location`]: markers, points of interest,
//! annotations and user bookmarks.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use dreambook_core::{DomainError, DomainResult, Entity, LocationId, MapItemId, UserId, impl_entity};

/// Shared shape of location-bound records.
pub trait MapItem:
    Entity<Id = MapItemId> + Serialize + DeserializeOwned + Clone + Send + Sync + 'static
{
    type New: DeserializeOwned + Send + 'static;

    const COLLECTION: &'static str;

    fn build(id: MapItemId, new: Self::New, now: DateTime<Utc>) -> DomainResult<Self>;

    /// The location this item is pinned to; it must exist.
    fn location(&self) -> LocationId;
}

fn bounded(field: &str, value: String, max: usize) -> DomainResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(DomainError::validation(format!("{field} cannot be empty")));
    }
    if trimmed.chars().count() > max {
        return Err(DomainError::validation(format!("{field} cannot exceed {max} characters")));
    }
    Ok(trimmed.to_string())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarkerType {
    Property,
    Poi,
    #[default]
    Custom,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapMarker {
    pub id: MapItemId,
    pub location: LocationId,
    pub marker_type: MarkerType,
    pub label: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewMapMarker {
    pub location: LocationId,
    #[serde(default)]
    pub marker_type: MarkerType,
    pub label: String,
}

impl MapItem for MapMarker {
    type New = NewMapMarker;
    const COLLECTION: &'static str = "map-markers";

    fn build(id: MapItemId, new: Self::New, _now: DateTime<Utc>) -> DomainResult<Self> {
        Ok(Self {
            id,
            location: new.location,
            marker_type: new.marker_type,
            label: bounded("label", new.label, 100)?,
        })
    }

    fn location(&self) -> LocationId {
        self.location
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Poi {
    pub id: MapItemId,
    pub name: String,
    pub description: String,
    pub location: LocationId,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewPoi {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub location: LocationId,
}

impl MapItem for Poi {
    type New = NewPoi;
    const COLLECTION: &'static str = "pois";

    fn build(id: MapItemId, new: Self::New, _now: DateTime<Utc>) -> DomainResult<Self> {
        Ok(Self {
            id,
            name: bounded("name", new.name, 100)?,
            description: new.description,
            location: new.location,
        })
    }

    fn location(&self) -> LocationId {
        self.location
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapAnnotation {
    pub id: MapItemId,
    pub location: LocationId,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewMapAnnotation {
    pub location: LocationId,
    pub text: String,
}

impl MapItem for MapAnnotation {
    type New = NewMapAnnotation;
    const COLLECTION: &'static str = "map-annotations";

    fn build(id: MapItemId, new: Self::New, now: DateTime<Utc>) -> DomainResult<Self> {
        Ok(Self {
            id,
            location: new.location,
            text: bounded("text", new.text, 2_000)?,
            created_at: now,
        })
    }

    fn location(&self) -> LocationId {
        self.location
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapBookmark {
    pub id: MapItemId,
    pub user_id: UserId,
    pub location: LocationId,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewMapBookmark {
    pub user_id: UserId,
    pub location: LocationId,
}

impl MapItem for MapBookmark {
    type New = NewMapBookmark;
    const COLLECTION: &'static str = "map-bookmarks";

    fn build(id: MapItemId, new: Self::New, now: DateTime<Utc>) -> DomainResult<Self> {
        Ok(Self {
            id,
            user_id: new.user_id,
            location: new.location,
            created_at: now,
        })
    }

    fn location(&self) -> LocationId {
        self.location
    }
}

impl_entity!(MapMarker, MapItemId);
impl_entity!(Poi, MapItemId);
impl_entity!(MapAnnotation, MapItemId);
impl_entity!(MapBookmark, MapItemId);
