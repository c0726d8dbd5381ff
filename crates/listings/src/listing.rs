use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use dreambook_core::{Coordinates, DomainError, DomainResult, ListingId, UserId, impl_entity};

pub const MAX_TITLE_LENGTH: usize = 200;
pub const MAX_LOCATION_LENGTH: usize = 255;

/// Legacy listing: a single bookable unit owned by a landlord.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Listing {
    pub id: ListingId,
    pub title: String,
    pub description: String,
    /// Minor currency units.
    pub price_per_night: u64,
    pub location: String,
    pub coordinates: Option<Coordinates>,
    pub image_url: Option<String>,
    pub owner: UserId,
    pub created_at: DateTime<Utc>,
}

impl_entity!(Listing, ListingId);

#[derive(Debug, Clone, Deserialize)]
pub struct NewListing {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub price_per_night: u64,
    pub location: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub image_url: Option<String>,
}

/// Partial update; absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListingPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub price_per_night: Option<u64>,
    pub location: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub image_url: Option<String>,
}

pub(crate) fn validate_title(title: &str) -> DomainResult<String> {
    let title = title.trim();
    if title.is_empty() {
        return Err(DomainError::validation("title cannot be empty"));
    }
    if title.chars().count() > MAX_TITLE_LENGTH {
        return Err(DomainError::validation(format!(
            "title cannot exceed {MAX_TITLE_LENGTH} characters"
        )));
    }
    Ok(title.to_string())
}

pub(crate) fn validate_location(location: &str) -> DomainResult<String> {
    let location = location.trim();
    if location.is_empty() {
        return Err(DomainError::validation("location cannot be empty"));
    }
    if location.chars().count() > MAX_LOCATION_LENGTH {
        return Err(DomainError::validation(format!(
            "location cannot exceed {MAX_LOCATION_LENGTH} characters"
        )));
    }
    Ok(location.to_string())
}

impl Listing {
    pub fn create(cmd: NewListing, owner: UserId, now: DateTime<Utc>) -> DomainResult<Self> {
        Ok(Self {
            id: ListingId::new(),
            title: validate_title(&cmd.title)?,
            description: cmd.description,
            price_per_night: cmd.price_per_night,
            location: validate_location(&cmd.location)?,
            coordinates: Coordinates::from_optional(cmd.latitude, cmd.longitude)?,
            image_url: cmd.image_url.filter(|u| !u.trim().is_empty()),
            owner,
            created_at: now,
        })
    }

    /// Only the owner (or an administrator) may change a listing.
    pub fn ensure_owner(&self, actor: UserId, actor_is_admin: bool) -> DomainResult<()> {
        if actor_is_admin || self.owner == actor {
            Ok(())
        } else {
            Err(DomainError::forbidden("only the listing owner may modify it"))
        }
    }

    pub fn apply(&mut self, patch: ListingPatch) -> DomainResult<()> {
        if let Some(title) = patch.title {
            self.title = validate_title(&title)?;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        if let Some(price) = patch.price_per_night {
            self.price_per_night = price;
        }
        if let Some(location) = patch.location {
            self.location = validate_location(&location)?;
        }
        if patch.latitude.is_some() || patch.longitude.is_some() {
            self.coordinates = Coordinates::from_optional(patch.latitude, patch.longitude)?;
        }
        if let Some(url) = patch.image_url {
            self.image_url = (!url.trim().is_empty()).then_some(url);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListingSort {
    PriceAsc,
    PriceDesc,
    Oldest,
    #[default]
    Newest,
}

impl FromStr for ListingSort {
    type Err = DomainError;

    /// Unknown values fall back to `newest`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "price_asc" => ListingSort::PriceAsc,
            "price_desc" => ListingSort::PriceDesc,
            "oldest" => ListingSort::Oldest,
            _ => ListingSort::Newest,
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListingQuery {
    pub sort: Option<String>,
    /// Case-insensitive substring of `location`.
    pub location: Option<String>,
    pub owner: Option<UserId>,
}

impl ListingQuery {
    pub fn sort(&self) -> ListingSort {
        self.sort
            .as_deref()
            .and_then(|s| s.parse().ok())
            .unwrap_or_default()
    }

    pub fn matches(&self, listing: &Listing) -> bool {
        let location_ok = match self.location.as_deref().map(str::trim) {
            Some(needle) if !needle.is_empty() => listing
                .location
                .to_lowercase()
                .contains(&needle.to_lowercase()),
            _ => true,
        };
        let owner_ok = self.owner.is_none_or(|owner| listing.owner == owner);
        location_ok && owner_ok
    }

    /// Filter and order `listings` in place.
    pub fn apply(&self, listings: &mut Vec<Listing>) {
        listings.retain(|l| self.matches(l));
        match self.sort() {
            ListingSort::PriceAsc => listings.sort_by_key(|l| (l.price_per_night, l.created_at)),
            ListingSort::PriceDesc => listings.sort_by(|a, b| {
                b.price_per_night
                    .cmp(&a.price_per_night)
                    .then(b.created_at.cmp(&a.created_at))
            }),
            ListingSort::Oldest => listings.sort_by_key(|l| l.created_at),
            ListingSort::Newest => listings.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn new_listing(title: &str, price: u64, location: &str) -> NewListing {
        NewListing {
            title: title.to_string(),
            description: String::new(),
            price_per_night: price,
            location: location.to_string(),
            latitude: None,
            longitude: None,
            image_url: None,
        }
    }

    fn sample() -> Vec<Listing> {
        let owner = UserId::new();
        let t0 = Utc::now();
        vec![
            Listing::create(new_listing("Loft", 19_500, "Boston, MA"), owner, t0).unwrap(),
            Listing::create(new_listing("Cabin", 22_000, "Aspen, CO"), owner, t0 + Duration::hours(1)).unwrap(),
            Listing::create(new_listing("Flat", 18_000, "New York, NY"), owner, t0 + Duration::hours(2)).unwrap(),
        ]
    }

    fn titles(listings: &[Listing]) -> Vec<&str> {
        listings.iter().map(|l| l.title.as_str()).collect()
    }

    #[test]
    fn default_order_is_newest_first() {
        let mut listings = sample();
        ListingQuery::default().apply(&mut listings);
        assert_eq!(titles(&listings), vec!["Flat", "Cabin", "Loft"]);
    }

    #[test]
    fn price_sorts() {
        let mut listings = sample();
        ListingQuery { sort: Some("price_asc".into()), ..Default::default() }.apply(&mut listings);
        assert_eq!(titles(&listings), vec!["Flat", "Loft", "Cabin"]);
        ListingQuery { sort: Some("price_desc".into()), ..Default::default() }.apply(&mut listings);
        assert_eq!(titles(&listings), vec!["Cabin", "Loft", "Flat"]);
    }

    #[test]
    fn unknown_sort_means_newest() {
        let mut listings = sample();
        ListingQuery { sort: Some("bogus".into()), ..Default::default() }.apply(&mut listings);
        assert_eq!(titles(&listings), vec!["Flat", "Cabin", "Loft"]);
    }

    #[test]
    fn location_filter_is_case_insensitive() {
        let mut listings = sample();
        ListingQuery { location: Some("new york".into()), ..Default::default() }.apply(&mut listings);
        assert_eq!(titles(&listings), vec!["Flat"]);
    }

    #[test]
    fn long_title_is_rejected() {
        let cmd = new_listing(&"x".repeat(201), 100, "Paris");
        assert!(Listing::create(cmd, UserId::new(), Utc::now()).is_err());
    }

    #[test]
    fn only_owner_or_admin_may_edit() {
        let listing = &sample()[0];
        assert!(listing.ensure_owner(listing.owner, false).is_ok());
        assert!(matches!(
            listing.ensure_owner(UserId::new(), false),
            Err(DomainError::Forbidden(_))
        ));
        assert!(listing.ensure_owner(UserId::new(), true).is_ok());
    }

    #[test]
    fn patch_requires_coordinate_pairs() {
        let mut listing = sample().remove(0);
        let err = listing
            .apply(ListingPatch { latitude: Some(40.0), ..Default::default() })
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }
}
