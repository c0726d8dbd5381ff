use core::cmp::Ordering;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

use dreambook_core::DomainError;

use crate::property::SearchProperty;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertySort {
    PriceAsc,
    PriceDesc,
    RatingDesc,
    DistanceAsc,
}

impl FromStr for PropertySort {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "price_asc" => Ok(Self::PriceAsc),
            "price_desc" => Ok(Self::PriceDesc),
            "rating_desc" => Ok(Self::RatingDesc),
            "distance_asc" => Ok(Self::DistanceAsc),
            other => Err(DomainError::validation(format!(
                "unknown sort '{other}' (expected price_asc, price_desc, rating_desc or distance_asc)"
            ))),
        }
    }
}

impl PropertySort {
    /// Stable sort; ties keep their incoming order.
    pub fn apply(self, properties: &mut [SearchProperty]) {
        match self {
            Self::PriceAsc => properties.sort_by_key(|p| p.price_per_night),
            Self::PriceDesc => properties.sort_by(|a, b| b.price_per_night.cmp(&a.price_per_night)),
            Self::RatingDesc => properties.sort_by(|a, b| {
                b.rating.partial_cmp(&a.rating).unwrap_or(Ordering::Equal)
            }),
            Self::DistanceAsc => properties.sort_by(|a, b| {
                a.distance_to_center
                    .partial_cmp(&b.distance_to_center)
                    .unwrap_or(Ordering::Equal)
            }),
        }
    }
}
