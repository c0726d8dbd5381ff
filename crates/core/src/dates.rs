//! Stay date ranges.
//!
//! A stay is the half-open range `[start, end)`: guests arrive on `start` and
//! leave on `end`, so the night of `end` is free for the next booking.

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};
use crate::value_object::ValueObject;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawStayDates")]
pub struct StayDates {
    start: NaiveDate,
    end: NaiveDate,
}

#[derive(Deserialize)]
struct RawStayDates {
    start: NaiveDate,
    end: NaiveDate,
}

impl TryFrom<RawStayDates> for StayDates {
    type Error = DomainError;

    fn try_from(raw: RawStayDates) -> Result<Self, Self::Error> {
        StayDates::new(raw.start, raw.end)
    }
}

impl ValueObject for StayDates {}

impl StayDates {
    /// Build a stay; the end date must be strictly after the start date.
    pub fn new(start: NaiveDate, end: NaiveDate) -> DomainResult<Self> {
        if end <= start {
            return Err(DomainError::validation(
                "check-out date must be after check-in date",
            ));
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// Number of nights in the stay (always >= 1).
    pub fn nights(&self) -> u32 {
        (self.end - self.start).num_days() as u32
    }

    /// Two stays overlap iff each starts before the other ends.
    pub fn overlaps(&self, other: &StayDates) -> bool {
        self.start < other.end && self.end > other.start
    }

    /// Whether the night starting on `date` belongs to this stay.
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date < self.end
    }

    /// Every night of the stay, in order.
    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + use<> {
        let start = self.start;
        (0..u64::from(self.nights())).filter_map(move |offset| start.checked_add_days(Days::new(offset)))
    }
}

impl core::fmt::Display for StayDates {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn d(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn rejects_zero_and_negative_length_stays() {
        assert!(StayDates::new(d("2025-06-01"), d("2025-06-01")).is_err());
        assert!(StayDates::new(d("2025-06-05"), d("2025-06-01")).is_err());
    }

    #[test]
    fn back_to_back_stays_do_not_overlap() {
        let first = StayDates::new(d("2025-06-01"), d("2025-06-05")).unwrap();
        let second = StayDates::new(d("2025-06-05"), d("2025-06-08")).unwrap();
        assert!(!first.overlaps(&second));
        assert!(!second.overlaps(&first));
    }

    #[test]
    fn nested_stay_overlaps() {
        let outer = StayDates::new(d("2025-06-01"), d("2025-06-10")).unwrap();
        let inner = StayDates::new(d("2025-06-03"), d("2025-06-04")).unwrap();
        assert!(outer.overlaps(&inner));
        assert!(inner.overlaps(&outer));
    }

    #[test]
    fn dates_lists_each_night() {
        let stay = StayDates::new(d("2025-12-30"), d("2026-01-02")).unwrap();
        let nights: Vec<_> = stay.dates().collect();
        assert_eq!(nights, vec![d("2025-12-30"), d("2025-12-31"), d("2026-01-01")]);
        assert_eq!(stay.nights(), 3);
    }

    #[test]
    fn deserializing_an_inverted_range_fails() {
        let raw = serde_json::json!({"start": "2025-06-05", "end": "2025-06-01"});
        assert!(serde_json::from_value::<StayDates>(raw).is_err());
    }

    proptest! {
        #[test]
        fn overlap_is_symmetric_and_matches_shared_nights(
            a in 0i64..60, alen in 1i64..15, b in 0i64..60, blen in 1i64..15
        ) {
            let base = d("2025-01-01");
            let mk = |s: i64, len: i64| {
                StayDates::new(
                    base + chrono::Duration::days(s),
                    base + chrono::Duration::days(s + len),
                ).unwrap()
            };
            let x = mk(a, alen);
            let y = mk(b, blen);
            prop_assert_eq!(x.overlaps(&y), y.overlaps(&x));
            let shares_night = x.dates().any(|night| y.contains(night));
            prop_assert_eq!(x.overlaps(&y), shares_night);
            prop_assert_eq!(x.dates().count() as u32, x.nights());
        }
    }
}
