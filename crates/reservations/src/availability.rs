use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use dreambook_core::{BlockId, DomainError, DomainResult, ListingId, ReservationId, StayDates, impl_entity};

/// A date range during which a listing cannot be booked.
///
/// Blocks come from reservations or are placed manually by the listing owner.
/// Releasing a block keeps the record and clears `is_blocked`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityBlock {
    pub id: BlockId,
    pub listing: ListingId,
    pub dates: StayDates,
    pub reservation: Option<ReservationId>,
    pub is_blocked: bool,
    pub block_reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl_entity!(AvailabilityBlock, BlockId);

#[derive(Debug, Clone, Deserialize)]
pub struct NewManualBlock {
    pub listing: ListingId,
    pub start_date: chrono::NaiveDate,
    pub end_date: chrono::NaiveDate,
    #[serde(default)]
    pub block_reason: Option<String>,
}

impl AvailabilityBlock {
    pub fn for_reservation(
        listing: ListingId,
        dates: StayDates,
        reservation: ReservationId,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: BlockId::new(),
            listing,
            dates,
            reservation: Some(reservation),
            is_blocked: true,
            block_reason: None,
            created_at: now,
        }
    }

    pub fn manual(cmd: NewManualBlock, now: DateTime<Utc>) -> DomainResult<Self> {
        let dates = StayDates::new(cmd.start_date, cmd.end_date)?;
        let reason = cmd.block_reason.map(|r| r.trim().to_string()).filter(|r| !r.is_empty());
        if reason.as_ref().is_some_and(|r| r.chars().count() > 200) {
            return Err(DomainError::validation("block_reason cannot exceed 200 characters"));
        }
        Ok(Self {
            id: BlockId::new(),
            listing: cmd.listing,
            dates,
            reservation: None,
            is_blocked: true,
            block_reason: reason,
            created_at: now,
        })
    }

    pub fn release(&mut self, reason: impl Into<String>) {
        self.is_blocked = false;
        self.block_reason = Some(reason.into());
    }

    /// Whether this block prevents booking `stay` on `listing`.
    pub fn conflicts_with(&self, listing: ListingId, stay: &StayDates) -> bool {
        self.is_blocked && self.listing == listing && self.dates.overlaps(stay)
    }
}

pub fn find_conflict<'a>(
    blocks: &'a [AvailabilityBlock],
    listing: ListingId,
    stay: &StayDates,
) -> Option<&'a AvailabilityBlock> {
    blocks.iter().find(|b| b.conflicts_with(listing, stay))
}

pub fn is_available(blocks: &[AvailabilityBlock], listing: ListingId, stay: &StayDates) -> bool {
    find_conflict(blocks, listing, stay).is_none()
}

/// Fail with a conflict if `stay` overlaps an active block.
pub fn ensure_available(
    blocks: &[AvailabilityBlock],
    listing: ListingId,
    stay: &StayDates,
) -> DomainResult<()> {
    match find_conflict(blocks, listing, stay) {
        None => Ok(()),
        Some(block) => Err(DomainError::conflict(format!(
            "listing {listing} is not available for {stay} (blocked {})",
            block.dates
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use proptest::prelude::*;

    fn stay(start: &str, end: &str) -> StayDates {
        StayDates::new(start.parse().unwrap(), end.parse().unwrap()).unwrap()
    }

    #[test]
    fn overlapping_stay_is_unavailable() {
        let listing = ListingId::new();
        let blocks = vec![AvailabilityBlock::for_reservation(
            listing,
            stay("2025-06-01", "2025-06-05"),
            ReservationId::new(),
            Utc::now(),
        )];
        assert!(!is_available(&blocks, listing, &stay("2025-06-04", "2025-06-06")));
        assert!(is_available(&blocks, listing, &stay("2025-06-05", "2025-06-06")));
        assert!(is_available(&blocks, ListingId::new(), &stay("2025-06-02", "2025-06-03")));
    }

    #[test]
    fn released_block_frees_dates() {
        let listing = ListingId::new();
        let mut block = AvailabilityBlock::for_reservation(
            listing,
            stay("2025-06-01", "2025-06-05"),
            ReservationId::new(),
            Utc::now(),
        );
        block.release("reservation cancelled");
        assert!(is_available(&[block], listing, &stay("2025-06-02", "2025-06-03")));
    }

    #[test]
    fn manual_block_needs_forward_range() {
        let cmd = NewManualBlock {
            listing: ListingId::new(),
            start_date: NaiveDate::from_ymd_opt(2025, 6, 5).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2025, 6, 5).unwrap(),
            block_reason: Some("maintenance".into()),
        };
        assert!(AvailabilityBlock::manual(cmd, Utc::now()).is_err());
    }

    #[test]
    fn conflict_error_is_a_conflict() {
        let listing = ListingId::new();
        let blocks = vec![AvailabilityBlock::for_reservation(
            listing,
            stay("2025-06-01", "2025-06-05"),
            ReservationId::new(),
            Utc::now(),
        )];
        assert!(matches!(
            ensure_available(&blocks, listing, &stay("2025-06-03", "2025-06-10")),
            Err(DomainError::Conflict(_))
        ));
    }

    proptest! {
        // Accepting every stay that passes the check never yields two
        // overlapping active blocks.
        #[test]
        fn accepted_blocks_never_overlap(requests in proptest::collection::vec((0i64..90, 1i64..10), 1..40)) {
            let listing = ListingId::new();
            let base = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
            let mut blocks: Vec<AvailabilityBlock> = Vec::new();
            for (offset, len) in requests {
                let s = StayDates::new(
                    base + chrono::Duration::days(offset),
                    base + chrono::Duration::days(offset + len),
                ).unwrap();
                if is_available(&blocks, listing, &s) {
                    blocks.push(AvailabilityBlock::for_reservation(listing, s, ReservationId::new(), Utc::now()));
                }
            }
            for (i, a) in blocks.iter().enumerate() {
                for b in &blocks[i + 1..] {
                    prop_assert!(!a.dates.overlaps(&b.dates));
                }
            }
        }
    }
}
