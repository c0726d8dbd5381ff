//! Advertisements: the generalized listing covering private rentals and hotels.

use chrono::{DateTime, Datelike, NaiveDate, Utc, Weekday};
use serde::{Deserialize, Serialize};

use dreambook_core::{
    AdvertisementId, CategoryId, Coordinates, DomainError, DomainResult, ImageId, UserId,
    impl_entity, money::DEFAULT_CURRENCY, percent_of,
};

use crate::details::{HotelDetails, HotelRoom, NewHotelDetails, NewHotelRoom, RentalDetails};
use crate::listing::{validate_location, validate_title};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdvertisementType {
    Private,
    Hotel,
}

impl AdvertisementType {
    pub fn display_name(&self) -> &'static str {
        match self {
            AdvertisementType::Private => "Private Listing",
            AdvertisementType::Hotel => "Hotel",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdvertisementStatus {
    #[default]
    Draft,
    Pending,
    Active,
    Inactive,
    Expired,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyImage {
    pub id: ImageId,
    pub image_url: String,
    pub alt_text: String,
    pub is_primary: bool,
    pub upload_date: DateTime<Utc>,
}

fn default_currency() -> String {
    DEFAULT_CURRENCY.to_string()
}

fn default_multiplier() -> u32 {
    100
}

/// Price sheet of an advertisement. Amounts are in minor currency units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdvertisementPricing {
    pub base_price: u64,
    #[serde(default = "default_currency")]
    pub currency: String,
    /// Percentage applied on Friday and Saturday nights (100 = no change).
    #[serde(default = "default_multiplier")]
    pub weekend_multiplier_pct: u32,
    #[serde(default)]
    pub cleaning_fee: u64,
    #[serde(default)]
    pub service_fee: u64,
    /// Basis points (1200 = 12%).
    #[serde(default)]
    pub tax_rate_bps: u32,
}

impl AdvertisementPricing {
    pub fn validate(&self) -> DomainResult<()> {
        if self.currency.len() != 3 || !self.currency.chars().all(|c| c.is_ascii_uppercase()) {
            return Err(DomainError::validation("currency must be a 3-letter ISO code"));
        }
        if self.weekend_multiplier_pct == 0 {
            return Err(DomainError::validation("weekend multiplier must be positive"));
        }
        Ok(())
    }

    pub fn nightly_rate(&self, night: NaiveDate) -> u64 {
        match night.weekday() {
            Weekday::Fri | Weekday::Sat => percent_of(self.base_price, self.weekend_multiplier_pct * 100),
            _ => self.base_price,
        }
    }

    /// Nights plus fees plus tax for the given nights.
    pub fn estimate(&self, nights: impl IntoIterator<Item = NaiveDate>) -> u64 {
        let lodging: u64 = nights.into_iter().map(|n| self.nightly_rate(n)).sum();
        let before_tax = lodging + self.cleaning_fee + self.service_fee;
        before_tax + percent_of(before_tax, self.tax_rate_bps)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdvertisementStatistics {
    pub view_count: u64,
    pub click_count: u64,
    pub share_count: u64,
    pub favorite_count: u64,
    pub inquiry_count: u64,
    pub booking_count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Advertisement {
    pub id: AdvertisementId,
    pub title: String,
    pub description: String,
    pub advertisement_type: AdvertisementType,
    pub category: Option<CategoryId>,
    /// Anonymous advertisements have no owner and stay drafts.
    pub user: Option<UserId>,
    pub location: String,
    pub coordinates: Option<Coordinates>,
    pub status: AdvertisementStatus,
    pub max_guests: u32,
    pub bedrooms: u32,
    pub bathrooms: u32,
    pub tags: Vec<String>,
    pub images: Vec<PropertyImage>,
    pub pricing: Option<AdvertisementPricing>,
    pub statistics: AdvertisementStatistics,
    pub rental_details: Option<RentalDetails>,
    pub hotel_details: Option<HotelDetails>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl_entity!(Advertisement, AdvertisementId);

impl core::fmt::Display for Advertisement {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{} ({})", self.title, self.advertisement_type.display_name())
    }
}

fn one() -> u32 {
    1
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewAdvertisement {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub advertisement_type: AdvertisementType,
    #[serde(default)]
    pub category: Option<CategoryId>,
    pub location: String,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub status: Option<AdvertisementStatus>,
    #[serde(default = "one")]
    pub max_guests: u32,
    #[serde(default = "one")]
    pub bedrooms: u32,
    #[serde(default = "one")]
    pub bathrooms: u32,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub pricing: Option<AdvertisementPricing>,
    #[serde(default)]
    pub rental_data: Option<RentalDetails>,
    #[serde(default)]
    pub hotel_data: Option<NewHotelDetails>,
}

/// Partial update; absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AdvertisementPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<CategoryId>,
    pub location: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub status: Option<AdvertisementStatus>,
    pub max_guests: Option<u32>,
    pub bedrooms: Option<u32>,
    pub bathrooms: Option<u32>,
    pub tags: Option<Vec<String>>,
    pub pricing: Option<AdvertisementPricing>,
    pub rental_data: Option<RentalDetails>,
    pub hotel_data: Option<NewHotelDetails>,
}

fn normalize_tags(tags: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for tag in tags {
        let tag = tag.trim().to_lowercase();
        if !tag.is_empty() && !out.contains(&tag) {
            out.push(tag);
        }
    }
    out
}

impl Advertisement {
    /// Create an advertisement. Type-specific data is only kept when it
    /// matches `advertisement_type`; the other kind is ignored.
    pub fn create(cmd: NewAdvertisement, user: Option<UserId>, now: DateTime<Utc>) -> DomainResult<Self> {
        if cmd.max_guests == 0 {
            return Err(DomainError::validation("max_guests must be at least 1"));
        }
        if let Some(pricing) = &cmd.pricing {
            pricing.validate()?;
        }

        let (rental_details, hotel_details) = match cmd.advertisement_type {
            AdvertisementType::Private => {
                if let Some(rental) = &cmd.rental_data {
                    rental.validate()?;
                }
                (cmd.rental_data, None)
            }
            AdvertisementType::Hotel => {
                let hotel = cmd.hotel_data.map(NewHotelDetails::into_details).transpose()?;
                (None, hotel)
            }
        };

        let status = match user {
            Some(_) => cmd.status.unwrap_or_default(),
            None => AdvertisementStatus::Draft,
        };

        Ok(Self {
            id: AdvertisementId::new(),
            title: validate_title(&cmd.title)?,
            description: cmd.description,
            advertisement_type: cmd.advertisement_type,
            category: cmd.category,
            user,
            location: validate_location(&cmd.location)?,
            coordinates: Coordinates::from_optional(cmd.latitude, cmd.longitude)?,
            status,
            max_guests: cmd.max_guests,
            bedrooms: cmd.bedrooms,
            bathrooms: cmd.bathrooms,
            tags: normalize_tags(cmd.tags),
            images: Vec::new(),
            pricing: cmd.pricing,
            statistics: AdvertisementStatistics::default(),
            rental_details,
            hotel_details,
            created_at: now,
            updated_at: now,
        })
    }

    /// Only the owner (or an administrator) may change an advertisement.
    /// Anonymous advertisements are editable by administrators only.
    pub fn ensure_owner(&self, actor: UserId, actor_is_admin: bool) -> DomainResult<()> {
        if actor_is_admin || self.user == Some(actor) {
            Ok(())
        } else {
            Err(DomainError::forbidden("only the advertisement owner may modify it"))
        }
    }

    pub fn apply(&mut self, patch: AdvertisementPatch, now: DateTime<Utc>) -> DomainResult<()> {
        if let Some(title) = patch.title {
            self.title = validate_title(&title)?;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        if patch.category.is_some() {
            self.category = patch.category;
        }
        if let Some(location) = patch.location {
            self.location = validate_location(&location)?;
        }
        if patch.latitude.is_some() || patch.longitude.is_some() {
            self.coordinates = Coordinates::from_optional(patch.latitude, patch.longitude)?;
        }
        if let Some(status) = patch.status {
            if self.user.is_none() && status != AdvertisementStatus::Draft {
                return Err(DomainError::invariant(
                    "anonymous advertisements cannot leave draft",
                ));
            }
            self.status = status;
        }
        if let Some(max_guests) = patch.max_guests {
            if max_guests == 0 {
                return Err(DomainError::validation("max_guests must be at least 1"));
            }
            self.max_guests = max_guests;
        }
        if let Some(bedrooms) = patch.bedrooms {
            self.bedrooms = bedrooms;
        }
        if let Some(bathrooms) = patch.bathrooms {
            self.bathrooms = bathrooms;
        }
        if let Some(tags) = patch.tags {
            self.tags = normalize_tags(tags);
        }
        if let Some(pricing) = patch.pricing {
            pricing.validate()?;
            self.pricing = Some(pricing);
        }
        match self.advertisement_type {
            AdvertisementType::Private => {
                if let Some(rental) = patch.rental_data {
                    rental.validate()?;
                    self.rental_details = Some(rental);
                }
            }
            AdvertisementType::Hotel => {
                if let Some(hotel) = patch.hotel_data {
                    let mut details = hotel.into_details()?;
                    if details.rooms.is_empty() {
                        if let Some(existing) = self.hotel_details.take() {
                            details.rooms = existing.rooms;
                        }
                    }
                    self.hotel_details = Some(details);
                }
            }
        }
        self.updated_at = now;
        Ok(())
    }

    pub fn add_image(
        &mut self,
        image_url: String,
        alt_text: String,
        is_primary: bool,
        now: DateTime<Utc>,
    ) -> DomainResult<&PropertyImage> {
        if image_url.trim().is_empty() {
            return Err(DomainError::validation("image_url cannot be empty"));
        }
        // First image is primary; a new primary demotes the old one.
        let is_primary = is_primary || self.images.is_empty();
        if is_primary {
            for image in &mut self.images {
                image.is_primary = false;
            }
        }
        self.images.push(PropertyImage {
            id: ImageId::new(),
            image_url: image_url.trim().to_string(),
            alt_text,
            is_primary,
            upload_date: now,
        });
        self.updated_at = now;
        let last = self.images.len() - 1;
        Ok(&self.images[last])
    }

    pub fn primary_image(&self) -> Option<&PropertyImage> {
        self.images.iter().find(|i| i.is_primary)
    }

    pub fn add_room(&mut self, cmd: NewHotelRoom, now: DateTime<Utc>) -> DomainResult<HotelRoom> {
        let Some(hotel) = self.hotel_details.as_mut() else {
            return Err(DomainError::invariant(
                "rooms can only be added to hotels with hotel details",
            ));
        };
        let room = HotelRoom::create(cmd)?;
        hotel.rooms.push(room.clone());
        self.updated_at = now;
        Ok(room)
    }

    pub fn record_view(&mut self) {
        self.statistics.view_count += 1;
    }

    /// Headline nightly price: rental rate, cheapest hotel room, or base price.
    pub fn nightly_price(&self) -> Option<u64> {
        self.rental_details
            .as_ref()
            .map(|r| r.price_per_night)
            .or_else(|| self.hotel_details.as_ref().and_then(HotelDetails::starting_price))
            .or_else(|| self.pricing.as_ref().map(|p| p.base_price))
    }
}

/// List filters for advertisements.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AdvertisementFilter {
    pub location: Option<String>,
    pub advertisement_type: Option<AdvertisementType>,
    pub category: Option<CategoryId>,
    pub min_guests: Option<u32>,
    pub status: Option<AdvertisementStatus>,
    pub user: Option<UserId>,
}

impl AdvertisementFilter {
    pub fn matches(&self, ad: &Advertisement) -> bool {
        let location_ok = self.location.as_deref().is_none_or(|needle| {
            ad.location.to_lowercase().contains(&needle.trim().to_lowercase())
        });
        location_ok
            && self.advertisement_type.is_none_or(|t| ad.advertisement_type == t)
            && self.category.is_none_or(|c| ad.category == Some(c))
            && self.min_guests.is_none_or(|g| ad.max_guests >= g)
            && self.status.is_none_or(|s| ad.status == s)
            && self.user.is_none_or(|u| ad.user == Some(u))
    }

    /// Filter, newest first.
    pub fn apply(&self, ads: &mut Vec<Advertisement>) {
        ads.retain(|a| self.matches(a));
        ads.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn new_ad(value: serde_json::Value) -> NewAdvertisement {
        serde_json::from_value(value).unwrap()
    }

    fn private_ad(user: Option<UserId>) -> Advertisement {
        let cmd = new_ad(json!({
            "title": "Test Listing",
            "description": "A test listing",
            "advertisement_type": "private",
            "location": "Test City",
            "latitude": 40.7128,
            "longitude": -74.006,
            "rental_data": {"price_per_night": 10_000, "minimum_stay": 2, "instant_booking": true}
        }));
        Advertisement::create(cmd, user, Utc::now()).unwrap()
    }

    #[test]
    fn defaults_to_draft_and_displays_type() {
        let ad = private_ad(Some(UserId::new()));
        assert_eq!(ad.status, AdvertisementStatus::Draft);
        assert_eq!(ad.to_string(), "Test Listing (Private Listing)");
        assert_eq!(ad.rental_details.as_ref().unwrap().minimum_stay, 2);
        assert_eq!(ad.nightly_price(), Some(10_000));
    }

    #[test]
    fn anonymous_ads_are_forced_to_draft() {
        let cmd = new_ad(json!({
            "title": "Nobody's",
            "advertisement_type": "private",
            "location": "Somewhere",
            "status": "active"
        }));
        let mut ad = Advertisement::create(cmd, None, Utc::now()).unwrap();
        assert_eq!(ad.status, AdvertisementStatus::Draft);
        assert!(ad.user.is_none());

        let err = ad
            .apply(AdvertisementPatch { status: Some(AdvertisementStatus::Active), ..Default::default() }, Utc::now())
            .unwrap_err();
        assert!(matches!(err, DomainError::InvariantViolation(_)));
    }

    #[test]
    fn mismatched_type_data_is_ignored() {
        let cmd = new_ad(json!({
            "title": "Hotel with rental data",
            "advertisement_type": "hotel",
            "location": "Chicago, IL",
            "rental_data": {"price_per_night": 10_000},
            "hotel_data": {"hotel_name": "Grand", "star_rating": 5}
        }));
        let ad = Advertisement::create(cmd, Some(UserId::new()), Utc::now()).unwrap();
        assert!(ad.rental_details.is_none());
        assert_eq!(ad.hotel_details.as_ref().unwrap().hotel_name, "Grand");
    }

    #[test]
    fn invalid_star_rating_fails_creation() {
        let cmd = new_ad(json!({
            "title": "Seven stars",
            "advertisement_type": "hotel",
            "location": "Dubai",
            "hotel_data": {"hotel_name": "Sky", "star_rating": 7}
        }));
        assert!(Advertisement::create(cmd, Some(UserId::new()), Utc::now()).is_err());
    }

    #[test]
    fn rooms_only_on_hotels() {
        let mut ad = private_ad(Some(UserId::new()));
        let room: NewHotelRoom = serde_json::from_value(json!({
            "room_type": "standard", "room_name": "Standard Room",
            "price_per_night": 12_000, "max_occupancy": 2
        }))
        .unwrap();
        assert!(ad.add_room(room, Utc::now()).is_err());
    }

    #[test]
    fn new_primary_image_demotes_old_one() {
        let mut ad = private_ad(Some(UserId::new()));
        ad.add_image("https://img/1.jpg".into(), String::new(), false, Utc::now()).unwrap();
        assert!(ad.images[0].is_primary);
        ad.add_image("https://img/2.jpg".into(), String::new(), true, Utc::now()).unwrap();
        assert!(!ad.images[0].is_primary);
        assert_eq!(ad.primary_image().unwrap().image_url, "https://img/2.jpg");
    }

    #[test]
    fn weekend_nights_use_multiplier() {
        let pricing: AdvertisementPricing = serde_json::from_value(json!({
            "base_price": 10_000, "weekend_multiplier_pct": 150,
            "cleaning_fee": 2_500, "tax_rate_bps": 1_000
        }))
        .unwrap();
        let friday = NaiveDate::from_ymd_opt(2025, 6, 6).unwrap();
        let sunday = NaiveDate::from_ymd_opt(2025, 6, 8).unwrap();
        assert_eq!(pricing.nightly_rate(friday), 15_000);
        assert_eq!(pricing.nightly_rate(sunday), 10_000);
        // Thu + Fri nights: 10_000 + 15_000 + 2_500 cleaning, then 10% tax.
        let thursday = NaiveDate::from_ymd_opt(2025, 6, 5).unwrap();
        assert_eq!(pricing.estimate([thursday, friday]), 30_250);
    }

    #[test]
    fn filter_by_type_and_guests() {
        let owner = UserId::new();
        let mut small = private_ad(Some(owner));
        small.max_guests = 2;
        let mut big = private_ad(Some(owner));
        big.max_guests = 6;
        let mut ads = vec![small, big];
        AdvertisementFilter {
            advertisement_type: Some(AdvertisementType::Private),
            min_guests: Some(4),
            ..Default::default()
        }
        .apply(&mut ads);
        assert_eq!(ads.len(), 1);
        assert_eq!(ads[0].max_guests, 6);
    }

    proptest::proptest! {
        #[test]
        fn flat_pricing_is_base_times_nights(
            base in 0u64..1_000_000, nights in 0i64..30, start in 0i64..365
        ) {
            let pricing = AdvertisementPricing {
                base_price: base,
                currency: DEFAULT_CURRENCY.to_string(),
                weekend_multiplier_pct: 100,
                cleaning_fee: 0,
                service_fee: 0,
                tax_rate_bps: 0,
            };
            let first = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap() + chrono::Duration::days(start);
            let stay = (0..nights).map(|i| first + chrono::Duration::days(i));
            proptest::prop_assert_eq!(pricing.estimate(stay), base * nights as u64);
        }
    }
}
