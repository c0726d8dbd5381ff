use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use dreambook_core::{
    DomainError, DomainResult, ListingId, ReservationId, ReviewId, UserId, impl_entity,
};
use dreambook_reservations::{Reservation, ReservationStatus};

pub const MAX_TEXT_LENGTH: usize = 5_000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    pub id: ReviewId,
    pub reservation: ReservationId,
    /// Copied from the reservation so listing summaries need no join.
    pub listing: ListingId,
    pub user: UserId,
    pub rating: u8,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

impl_entity!(Review, ReviewId);

#[derive(Debug, Clone, Deserialize)]
pub struct NewReview {
    pub reservation: ReservationId,
    pub rating: u8,
    pub text: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReviewPatch {
    pub rating: Option<u8>,
    pub text: Option<String>,
}

fn validate_rating(rating: u8) -> DomainResult<u8> {
    if !(1..=5).contains(&rating) {
        return Err(DomainError::out_of_range("rating", 1, 5));
    }
    Ok(rating)
}

fn validate_text(text: &str) -> DomainResult<String> {
    let text = text.trim();
    if text.is_empty() {
        return Err(DomainError::validation("review text cannot be empty"));
    }
    if text.chars().count() > MAX_TEXT_LENGTH {
        return Err(DomainError::validation(format!(
            "review text cannot exceed {MAX_TEXT_LENGTH} characters"
        )));
    }
    Ok(text.to_string())
}

impl Review {
    /// Write a review for `reservation`.
    ///
    /// Only the guest who booked may review, and only once the booking is
    /// confirmed or completed. Uniqueness per reservation is checked by the
    /// caller against stored reviews.
    pub fn write(
        cmd: NewReview,
        author: UserId,
        reservation: &Reservation,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        if reservation.id_typed() != cmd.reservation {
            return Err(DomainError::invariant("reservation mismatch"));
        }
        if reservation.user() != Some(author) {
            return Err(DomainError::forbidden(
                "only the guest of a reservation can review it",
            ));
        }
        if !matches!(
            reservation.status(),
            ReservationStatus::Confirmed | ReservationStatus::Completed
        ) {
            return Err(DomainError::invariant(format!(
                "cannot review a {} reservation",
                reservation.status()
            )));
        }
        let listing = reservation
            .listing()
            .ok_or_else(|| DomainError::not_found("reservation"))?;

        Ok(Self {
            id: ReviewId::new(),
            reservation: cmd.reservation,
            listing,
            user: author,
            rating: validate_rating(cmd.rating)?,
            text: validate_text(&cmd.text)?,
            created_at: now,
        })
    }

    pub fn ensure_author(&self, actor: UserId, is_admin: bool) -> DomainResult<()> {
        if self.user == actor || is_admin {
            Ok(())
        } else {
            Err(DomainError::forbidden("only the author can change this review"))
        }
    }

    pub fn apply(&mut self, patch: ReviewPatch) -> DomainResult<()> {
        let rating = patch.rating.map(validate_rating).transpose()?;
        let text = patch.text.as_deref().map(validate_text).transpose()?;
        if let Some(rating) = rating {
            self.rating = rating;
        }
        if let Some(text) = text {
            self.text = text;
        }
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use dreambook_core::{Aggregate, StayDates};
    use dreambook_reservations::{
        ConfirmReservation, CreateReservation, GuestDetails, ReservationCommand,
        generate_confirmation_number, quote,
    };

    pub(crate) fn confirmed_reservation(guest: UserId) -> Reservation {
        let id = ReservationId::new();
        let listing = ListingId::new();
        let stay = StayDates::new("2025-03-01".parse().unwrap(), "2025-03-03".parse().unwrap())
            .unwrap();
        let mut r = Reservation::empty(id);
        r.execute(&ReservationCommand::Create(Box::new(CreateReservation {
            reservation_id: id,
            confirmation_number: generate_confirmation_number(&mut rand::thread_rng()),
            user: guest,
            listing,
            stay,
            guests_adults: 1,
            guests_children: 0,
            guest: GuestDetails {
                first_name: "Jan".into(),
                last_name: "Kowalski".into(),
                email: "jan@example.com".into(),
                phone: String::new(),
            },
            special_requests: String::new(),
            quote: quote(listing, &stay, 9_900, &[]),
            occurred_at: Utc::now(),
        })))
        .unwrap();
        r.execute(&ReservationCommand::Confirm(ConfirmReservation {
            actor: guest,
            allow_unpaid: true,
            occurred_at: Utc::now(),
        }))
        .unwrap();
        r
    }

    fn new_review(reservation: &Reservation, rating: u8) -> NewReview {
        NewReview {
            reservation: reservation.id_typed(),
            rating,
            text: "Great location, spotless flat.".into(),
        }
    }

    #[test]
    fn guest_can_review_confirmed_stay() {
        let guest = UserId::new();
        let r = confirmed_reservation(guest);
        let review = Review::write(new_review(&r, 5), guest, &r, Utc::now()).unwrap();
        assert_eq!(review.listing, r.listing().unwrap());
        assert_eq!(review.rating, 5);
    }

    #[test]
    fn strangers_cannot_review() {
        let r = confirmed_reservation(UserId::new());
        let err = Review::write(new_review(&r, 4), UserId::new(), &r, Utc::now()).unwrap_err();
        assert!(matches!(err, DomainError::Forbidden(_)));
    }

    #[test]
    fn rating_must_be_one_to_five() {
        let guest = UserId::new();
        let r = confirmed_reservation(guest);
        for bad in [0, 6] {
            let err = Review::write(new_review(&r, bad), guest, &r, Utc::now()).unwrap_err();
            assert!(matches!(err, DomainError::Validation(_)));
        }
    }

    #[test]
    fn patch_is_all_or_nothing() {
        let guest = UserId::new();
        let r = confirmed_reservation(guest);
        let mut review = Review::write(new_review(&r, 3), guest, &r, Utc::now()).unwrap();
        let err = review.apply(ReviewPatch {
            rating: Some(4),
            text: Some("   ".into()),
        });
        assert!(err.is_err());
        assert_eq!(review.rating, 3);
    }
}
