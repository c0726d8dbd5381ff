use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use dreambook_core::{DomainError, DomainResult, PaymentId, money::DEFAULT_CURRENCY};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Paid,
    Refunded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    #[default]
    Card,
    Paypal,
}

/// A captured payment for one reservation.
///
/// No processor is called; the record mirrors what a processor would return.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    pub id: PaymentId,
    pub method: PaymentMethod,
    pub provider: String,
    pub amount_paid: u64,
    pub currency: String,
    pub card_brand: Option<String>,
    pub card_last_four: Option<String>,
    pub paid_at: DateTime<Utc>,
    pub refunded_at: Option<DateTime<Utc>>,
}

impl Payment {
    pub fn capture(
        id: PaymentId,
        method: PaymentMethod,
        amount_paid: u64,
        card_brand: Option<String>,
        card_last_four: Option<String>,
        paid_at: DateTime<Utc>,
    ) -> DomainResult<Self> {
        if let Some(last_four) = &card_last_four
            && (last_four.len() != 4 || !last_four.bytes().all(|b| b.is_ascii_digit()))
        {
            return Err(DomainError::validation("card_last_four must be four digits"));
        }
        let (card_brand, card_last_four) = match method {
            PaymentMethod::Card => (card_brand, card_last_four),
            PaymentMethod::Paypal => (None, None),
        };
        Ok(Self {
            id,
            method,
            provider: "stripe".to_string(),
            amount_paid,
            currency: DEFAULT_CURRENCY.to_string(),
            card_brand,
            card_last_four,
            paid_at,
            refunded_at: None,
        })
    }
}
