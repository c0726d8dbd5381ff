use serde::Serialize;

use dreambook_core::ListingId;

use crate::review::Review;

/// Aggregate rating for one listing. `average` is `None` with no reviews.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReviewSummary {
    pub listing: ListingId,
    pub count: usize,
    pub average: Option<f64>,
}

impl ReviewSummary {
    pub fn for_listing<'a>(listing: ListingId, reviews: impl IntoIterator<Item = &'a Review>) -> Self {
        let (count, total) = reviews
            .into_iter()
            .filter(|r| r.listing == listing)
            .fold((0usize, 0u64), |(n, sum), r| (n + 1, sum + u64::from(r.rating)));
        let average = (count > 0).then(|| {
            let avg = total as f64 / count as f64;
            (avg * 100.0).round() / 100.0
        });
        Self { listing, count, average }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::review::tests::confirmed_reservation;
    use crate::review::{NewReview, Review};
    use chrono::Utc;
    use dreambook_core::UserId;

    #[test]
    fn averages_to_two_decimals() {
        let guest = UserId::new();
        let r = confirmed_reservation(guest);
        let listing = r.listing().unwrap();
        let reviews: Vec<Review> = [5u8, 4, 4]
            .into_iter()
            .map(|rating| {
                Review::write(
                    NewReview {
                        reservation: r.id_typed(),
                        rating,
                        text: "ok".into(),
                    },
                    guest,
                    &r,
                    Utc::now(),
                )
                .unwrap()
            })
            .collect();
        let summary = ReviewSummary::for_listing(listing, &reviews);
        assert_eq!(summary.count, 3);
        assert_eq!(summary.average, Some(4.33));
    }

    #[test]
    fn empty_listing_has_no_average() {
        let summary = ReviewSummary::for_listing(ListingId::new(), &Vec::<Review>::new());
        assert_eq!(summary.count, 0);
        assert_eq!(summary.average, None);
    }
}
