use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use dreambook_core::{DomainError, DomainResult, ListingId, OfferId, impl_entity};

/// A time-boxed discount on one listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecialOffer {
    pub id: OfferId,
    pub listing: ListingId,
    pub name: String,
    /// Whole percent, 0..=100.
    pub discount_percent: u32,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

impl_entity!(SpecialOffer, OfferId);

#[derive(Debug, Clone, Deserialize)]
pub struct NewSpecialOffer {
    pub listing: ListingId,
    pub name: String,
    pub discount_percent: u32,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl SpecialOffer {
    pub fn build(id: OfferId, cmd: NewSpecialOffer, now: DateTime<Utc>) -> DomainResult<Self> {
        let name = cmd.name.trim();
        if name.is_empty() || name.chars().count() > 100 {
            return Err(DomainError::validation("name must be 1 to 100 characters"));
        }
        if cmd.discount_percent > 100 {
            return Err(DomainError::out_of_range("discount_percent", 0, 100));
        }
        if cmd.end_date < cmd.start_date {
            return Err(DomainError::validation("end_date cannot be before start_date"));
        }
        Ok(Self {
            id,
            listing: cmd.listing,
            name: name.to_string(),
            discount_percent: cmd.discount_percent,
            start_date: cmd.start_date,
            end_date: cmd.end_date,
            created_at: now,
        })
    }

    /// An offer applies when the check-in day falls inside its window
    /// (both ends inclusive).
    pub fn applies_to(&self, listing: ListingId, check_in: NaiveDate) -> bool {
        self.listing == listing && self.start_date <= check_in && check_in <= self.end_date
    }
}

/// The largest applicable discount, if any.
pub fn best_offer<'a>(
    offers: &'a [SpecialOffer],
    listing: ListingId,
    check_in: NaiveDate,
) -> Option<&'a SpecialOffer> {
    offers
        .iter()
        .filter(|o| o.applies_to(listing, check_in))
        .max_by_key(|o| o.discount_percent)
}
