use serde::{Deserialize, Serialize};

use dreambook_core::{ListingId, OfferId, StayDates, percent_of};

use crate::offer::{SpecialOffer, best_offer};

/// Taxes and fees charged on top of the (discounted) subtotal: 15%.
pub const TAX_RATE_BPS: u32 = 1_500;

/// Price breakdown for a stay. Amounts are in minor currency units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceQuote {
    pub total_nights: u32,
    pub price_per_night: u64,
    /// `price_per_night * total_nights`
    pub subtotal: u64,
    pub discount: u64,
    pub applied_offer: Option<OfferId>,
    pub taxes_and_fees: u64,
    pub total_amount: u64,
}

/// Price a stay, applying the best special offer for the check-in day.
pub fn quote(
    listing: ListingId,
    stay: &StayDates,
    price_per_night: u64,
    offers: &[SpecialOffer],
) -> PriceQuote {
    let total_nights = stay.nights();
    let subtotal = price_per_night.saturating_mul(u64::from(total_nights));

    let offer = best_offer(offers, listing, stay.start());
    let discount = offer
        .map(|o| percent_of(subtotal, o.discount_percent * 100))
        .unwrap_or(0);
    let discounted = subtotal - discount;
    let taxes_and_fees = percent_of(discounted, TAX_RATE_BPS);

    PriceQuote {
        total_nights,
        price_per_night,
        subtotal,
        discount,
        applied_offer: offer.map(|o| o.id),
        taxes_and_fees,
        total_amount: discounted + taxes_and_fees,
    }
}
