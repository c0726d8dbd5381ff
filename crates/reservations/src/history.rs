use serde::Deserialize;

use dreambook_core::{DomainError, DomainResult, ListingId, UserId};

use crate::reservation::Reservation;

/// Reservation history for a guest or a listing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HistoryQuery {
    pub user_id: Option<UserId>,
    pub listing_id: Option<ListingId>,
}

impl HistoryQuery {
    pub fn ensure_scoped(&self) -> DomainResult<()> {
        if self.user_id.is_none() && self.listing_id.is_none() {
            return Err(DomainError::validation(
                "please provide either user_id or listing_id",
            ));
        }
        Ok(())
    }

    pub fn matches(&self, reservation: &Reservation) -> bool {
        self.user_id.is_none_or(|u| reservation.user() == Some(u))
            && self.listing_id.is_none_or(|l| reservation.listing() == Some(l))
    }

    /// Matching reservations, newest first.
    pub fn apply(&self, reservations: Vec<Reservation>) -> DomainResult<Vec<Reservation>> {
        self.ensure_scoped()?;
        let mut matching: Vec<_> = reservations.into_iter().filter(|r| self.matches(r)).collect();
        matching.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
        Ok(matching)
    }
}
