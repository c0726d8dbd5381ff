//! Type-specific advertisement details: private rentals and hotels.

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use dreambook_core::{DomainError, DomainResult, RoomId};

fn default_minimum_stay() -> u32 {
    1
}

fn default_check_in() -> NaiveTime {
    NaiveTime::from_hms_opt(15, 0, 0).unwrap_or(NaiveTime::MIN)
}

fn default_check_out() -> NaiveTime {
    NaiveTime::from_hms_opt(11, 0, 0).unwrap_or(NaiveTime::MIN)
}

/// Details of a `private` advertisement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RentalDetails {
    /// Minor currency units.
    pub price_per_night: u64,
    #[serde(default = "default_minimum_stay")]
    pub minimum_stay: u32,
    #[serde(default)]
    pub maximum_stay: Option<u32>,
    #[serde(default)]
    pub instant_booking: bool,
    #[serde(default = "default_check_in")]
    pub check_in_time: NaiveTime,
    #[serde(default = "default_check_out")]
    pub check_out_time: NaiveTime,
    #[serde(default)]
    pub house_rules: String,
}

impl RentalDetails {
    pub fn validate(&self) -> DomainResult<()> {
        if self.minimum_stay == 0 {
            return Err(DomainError::validation("minimum_stay must be at least 1 night"));
        }
        if let Some(max) = self.maximum_stay {
            if max < self.minimum_stay {
                return Err(DomainError::validation(
                    "maximum_stay cannot be shorter than minimum_stay",
                ));
            }
        }
        Ok(())
    }

    /// Whether a stay of `nights` respects the min/max stay rules.
    pub fn allows_stay(&self, nights: u32) -> bool {
        nights >= self.minimum_stay && self.maximum_stay.is_none_or(|max| nights <= max)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HotelRoom {
    pub id: RoomId,
    /// e.g. standard, deluxe, suite.
    pub room_type: String,
    pub room_name: String,
    pub price_per_night: u64,
    pub max_occupancy: u32,
    pub total_rooms: u32,
    pub room_size_sqm: Option<u32>,
    pub has_balcony: bool,
    pub has_sea_view: bool,
    pub has_city_view: bool,
    pub has_kitchenette: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewHotelRoom {
    pub room_type: String,
    pub room_name: String,
    pub price_per_night: u64,
    pub max_occupancy: u32,
    #[serde(default = "default_total_rooms")]
    pub total_rooms: u32,
    #[serde(default)]
    pub room_size_sqm: Option<u32>,
    #[serde(default)]
    pub has_balcony: bool,
    #[serde(default)]
    pub has_sea_view: bool,
    #[serde(default)]
    pub has_city_view: bool,
    #[serde(default)]
    pub has_kitchenette: bool,
}

fn default_total_rooms() -> u32 {
    1
}

impl HotelRoom {
    pub fn create(cmd: NewHotelRoom) -> DomainResult<Self> {
        if cmd.room_name.trim().is_empty() || cmd.room_type.trim().is_empty() {
            return Err(DomainError::validation("room_type and room_name are required"));
        }
        if cmd.max_occupancy == 0 {
            return Err(DomainError::validation("max_occupancy must be at least 1"));
        }
        if cmd.total_rooms == 0 {
            return Err(DomainError::validation("total_rooms must be at least 1"));
        }
        Ok(Self {
            id: RoomId::new(),
            room_type: cmd.room_type.trim().to_lowercase(),
            room_name: cmd.room_name.trim().to_string(),
            price_per_night: cmd.price_per_night,
            max_occupancy: cmd.max_occupancy,
            total_rooms: cmd.total_rooms,
            room_size_sqm: cmd.room_size_sqm,
            has_balcony: cmd.has_balcony,
            has_sea_view: cmd.has_sea_view,
            has_city_view: cmd.has_city_view,
            has_kitchenette: cmd.has_kitchenette,
        })
    }
}

/// Details of a `hotel` advertisement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HotelDetails {
    pub hotel_name: String,
    #[serde(default)]
    pub hotel_chain: Option<String>,
    pub star_rating: u8,
    #[serde(default)]
    pub has_restaurant: bool,
    #[serde(default)]
    pub has_spa: bool,
    #[serde(default)]
    pub has_gym: bool,
    #[serde(default)]
    pub has_pool: bool,
    #[serde(default)]
    pub has_business_center: bool,
    #[serde(default)]
    pub rooms: Vec<HotelRoom>,
}

/// Hotel details as submitted on creation; rooms get their ids here.
#[derive(Debug, Clone, Deserialize)]
pub struct NewHotelDetails {
    pub hotel_name: String,
    #[serde(default)]
    pub hotel_chain: Option<String>,
    pub star_rating: u8,
    #[serde(default)]
    pub has_restaurant: bool,
    #[serde(default)]
    pub has_spa: bool,
    #[serde(default)]
    pub has_gym: bool,
    #[serde(default)]
    pub has_pool: bool,
    #[serde(default)]
    pub has_business_center: bool,
    #[serde(default)]
    pub rooms: Vec<NewHotelRoom>,
}

impl NewHotelDetails {
    pub fn into_details(self) -> DomainResult<HotelDetails> {
        let rooms = self
            .rooms
            .into_iter()
            .map(HotelRoom::create)
            .collect::<DomainResult<Vec<_>>>()?;
        let details = HotelDetails {
            hotel_name: self.hotel_name.trim().to_string(),
            hotel_chain: self.hotel_chain.filter(|c| !c.trim().is_empty()),
            star_rating: self.star_rating,
            has_restaurant: self.has_restaurant,
            has_spa: self.has_spa,
            has_gym: self.has_gym,
            has_pool: self.has_pool,
            has_business_center: self.has_business_center,
            rooms,
        };
        details.validate()?;
        Ok(details)
    }
}

impl HotelDetails {
    pub fn validate(&self) -> DomainResult<()> {
        if self.hotel_name.trim().is_empty() {
            return Err(DomainError::validation("hotel_name cannot be empty"));
        }
        if !(1..=5).contains(&self.star_rating) {
            return Err(DomainError::out_of_range("star_rating", 1, 5));
        }
        Ok(())
    }

    /// Cheapest room rate, if any rooms are listed.
    pub fn starting_price(&self) -> Option<u64> {
        self.rooms.iter().map(|r| r.price_per_night).min()
    }

    /// Guests the whole hotel can host at once.
    pub fn capacity(&self) -> u32 {
        self.rooms.iter().map(|r| r.max_occupancy * r.total_rooms).sum()
    }
}
