//! `dreambook-listings` — bookable inventory.
//!
//! Two generations live side by side: the legacy [`Listing`] (still the unit
//! reservations are made against) and the [`Advertisement`], which covers
//! both private rentals and hotels with type-specific details.

pub mod advertisement;
pub mod category;
pub mod details;
pub mod listing;

pub use advertisement::{
    Advertisement, AdvertisementFilter, AdvertisementPatch, AdvertisementPricing,
    AdvertisementStatistics, AdvertisementStatus, AdvertisementType, NewAdvertisement,
    PropertyImage,
};
pub use category::{AdvertisementCategory, NewCategory};
pub use details::{HotelDetails, HotelRoom, NewHotelDetails, NewHotelRoom, RentalDetails};
pub use listing::{Listing, ListingPatch, ListingQuery, ListingSort, NewListing};
