use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::{Value, json};

use dreambook_auth::UserAccount;
use dreambook_listings::Listing;
use dreambook_reservations::{GuestDetails, PaymentMethod, Reservation};
use dreambook_reviews::{Review, ReviewLike, ReviewResponse};

// -------------------------
// Request DTOs
// -------------------------

/// Fields are optional so a missing one is a 400 with a readable message
/// rather than an extractor rejection.
#[derive(Debug, Default, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ChangeRoleRequest {
    pub role: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct UserListQuery {
    pub search: Option<String>,
    pub role: Option<String>,
    pub page: Option<usize>,
    pub page_size: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct CreateDirectoryEntryRequest {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AssignRoleRequest {
    pub user_id: String,
    pub role_id: String,
}

#[derive(Debug, Deserialize)]
pub struct AssignPermissionRequest {
    pub role_id: String,
    pub permission_id: String,
}

#[derive(Debug, Deserialize)]
pub struct CheckAccessRequest {
    pub user_id: String,
    pub permission_name: String,
}

#[derive(Debug, Deserialize)]
pub struct ExplainQuery {
    pub permission: String,
    pub user_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AddImageRequest {
    pub image_url: String,
    #[serde(default)]
    pub alt_text: String,
    #[serde(default)]
    pub is_primary: bool,
}

#[derive(Debug, Deserialize)]
pub struct StayQuery {
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
}

#[derive(Debug, Deserialize)]
pub struct AvailabilityQuery {
    pub listing_id: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

#[derive(Debug, Deserialize)]
pub struct QuoteRequest {
    pub listing_id: String,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
}

#[derive(Debug, Deserialize)]
pub struct CreateReservationRequest {
    pub listing_id: String,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    #[serde(default = "one")]
    pub guests_adults: u32,
    #[serde(default)]
    pub guests_children: u32,
    pub guest: GuestDetails,
    #[serde(default)]
    pub special_requests: String,
}

fn one() -> u32 {
    1
}

#[derive(Debug, Deserialize)]
pub struct PaymentRequest {
    #[serde(default)]
    pub method: PaymentMethod,
    pub amount: u64,
    pub card_brand: Option<String>,
    pub card_last_four: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CancelRequest {
    #[serde(default)]
    pub reason: String,
}

#[derive(Debug, Deserialize)]
pub struct NoteRequest {
    pub note: String,
    #[serde(default)]
    pub is_internal: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListingScope {
    pub listing_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct VoteRequest {
    pub is_like: bool,
}

// -------------------------
// Response mapping
// -------------------------

pub fn user_to_json(user: &UserAccount) -> Value {
    json!({
        "id": user.id.to_string(),
        "username": user.username,
        "email": user.email,
        "phone_number": user.phone_number,
        "first_name": user.first_name,
        "last_name": user.last_name,
        "role": user.role.as_str(),
        "name": user.display_name(),
        "isActive": user.is_active,
        "isStaff": user.is_staff,
        "joinedAt": user.date_joined,
        "lastLogin": user.last_login,
    })
}

pub fn listing_to_json(listing: &Listing) -> Value {
    json!({
        "id": listing.id.to_string(),
        "title": listing.title,
        "description": listing.description,
        "price_per_night": listing.price_per_night,
        "location": listing.location,
        "latitude": listing.coordinates.map(|c| c.latitude),
        "longitude": listing.coordinates.map(|c| c.longitude),
        "image_url": listing.image_url,
        "owner": listing.owner.to_string(),
        "created_at": listing.created_at,
    })
}

/// Internal notes are only included for the host side of a reservation.
pub fn reservation_to_json(reservation: &Reservation, include_internal_notes: bool) -> Value {
    let notes: Vec<Value> = reservation
        .notes()
        .iter()
        .filter(|n| include_internal_notes || !n.is_internal)
        .map(|n| {
            json!({
                "author": n.author.to_string(),
                "note": n.note,
                "is_internal": n.is_internal,
                "created_at": n.created_at,
            })
        })
        .collect();

    json!({
        "id": reservation.id_typed().to_string(),
        "confirmation_number": reservation.confirmation_number().map(|c| c.as_str()),
        "user": reservation.user().map(|u| u.to_string()),
        "listing": reservation.listing().map(|l| l.to_string()),
        "check_in": reservation.stay().map(|s| s.start()),
        "check_out": reservation.stay().map(|s| s.end()),
        "guests_adults": reservation.guests_adults(),
        "guests_children": reservation.guests_children(),
        "guest": reservation.guest(),
        "special_requests": reservation.special_requests(),
        "pricing": reservation.pricing(),
        "total_amount": reservation.total_amount(),
        "status": reservation.status().as_str(),
        "payment_status": reservation.payment_status(),
        "payment": reservation.payment(),
        "status_history": reservation.status_history(),
        "notes": notes,
        "created_at": reservation.created_at(),
        "updated_at": reservation.updated_at(),
    })
}

pub fn review_to_json(review: &Review, responses: &[ReviewResponse], votes: &[ReviewLike]) -> Value {
    let likes = votes.iter().filter(|v| v.is_like).count();
    json!({
        "id": review.id.to_string(),
        "reservation": review.reservation.to_string(),
        "listing": review.listing.to_string(),
        "user": review.user.to_string(),
        "rating": review.rating,
        "text": review.text,
        "created_at": review.created_at,
        "responses": responses,
        "likes": likes,
        "dislikes": votes.len() - likes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use dreambook_auth::RegisterUser;

    #[test]
    fn user_json_hides_the_password_hash() {
        let cmd: RegisterUser = serde_json::from_value(json!({
            "username": "ada",
            "email": "Ada@Example.com",
            "password": "correct-horse",
            "password2": "correct-horse",
            "first_name": "Ada",
            "last_name": "Lovelace",
        }))
        .unwrap();
        let user = UserAccount::register(&cmd, "hash".into(), false, Utc::now()).unwrap();

        let body = user_to_json(&user);
        assert_eq!(body["email"], "ada@example.com");
        assert_eq!(body["name"], "Ada Lovelace");
        assert_eq!(body["role"], "guest");
        assert_eq!(body["isActive"], true);
        assert!(body.get("password_hash").is_none());
    }

    #[test]
    fn reservation_requests_default_to_one_adult() {
        let req: CreateReservationRequest = serde_json::from_value(json!({
            "listing_id": "0190a5d8-0000-7000-8000-000000000000",
            "check_in": "2030-01-01",
            "check_out": "2030-01-03",
            "guest": {"first_name": "A", "last_name": "B", "email": "a@b.c"},
        }))
        .unwrap();
        assert_eq!(req.guests_adults, 1);
        assert_eq!(req.guests_children, 0);
        assert!(req.special_requests.is_empty());
    }
}
