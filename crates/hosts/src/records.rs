//! Records attached to a host: availability windows, bookings, messages,
//! promotions, earnings, policy, notifications and support tickets.
//!
//! They share one shape (an id, an owning host, a creation payload), captured
//! by [`HostRecord`] so storage and routing can treat them uniformly.

use chrono::{DateTime, NaiveDate, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use dreambook_core::{
    DomainError, DomainResult, Entity, HostId, HostRecordId, ReservationId, StayDates, UserId,
    impl_entity,
};

pub trait HostRecord:
    Entity<Id = HostRecordId> + Serialize + DeserializeOwned + Clone + Send + Sync + 'static
{
    /// Creation (and full replacement) payload.
    type New: DeserializeOwned + Send + 'static;

    /// Storage collection / route segment name.
    const COLLECTION: &'static str;

    /// At most one record of this kind per host.
    const ONE_PER_HOST: bool = false;

    /// Build a record with the given id; updates reuse the existing id.
    fn build(id: HostRecordId, new: Self::New, now: DateTime<Utc>) -> DomainResult<Self>;

    fn host(&self) -> HostId;
}

fn non_empty(field: &str, value: String) -> DomainResult<String> {
    if value.trim().is_empty() {
        return Err(DomainError::validation(format!("{field} cannot be empty")));
    }
    Ok(value)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostAvailability {
    pub id: HostRecordId,
    pub host: HostId,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewHostAvailability {
    pub host: HostId,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl HostAvailability {
    pub fn window(&self) -> DomainResult<StayDates> {
        StayDates::new(self.start_date, self.end_date)
    }
}

impl HostRecord for HostAvailability {
    type New = NewHostAvailability;
    const COLLECTION: &'static str = "host-availability";

    fn build(id: HostRecordId, new: Self::New, _now: DateTime<Utc>) -> DomainResult<Self> {
        StayDates::new(new.start_date, new.end_date)?;
        Ok(Self {
            id,
            host: new.host,
            start_date: new.start_date,
            end_date: new.end_date,
        })
    }

    fn host(&self) -> HostId {
        self.host
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostBooking {
    pub id: HostRecordId,
    pub host: HostId,
    pub reservation_id: ReservationId,
    pub booking_date: NaiveDate,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewHostBooking {
    pub host: HostId,
    pub reservation_id: ReservationId,
    pub booking_date: NaiveDate,
}

impl HostRecord for HostBooking {
    type New = NewHostBooking;
    const COLLECTION: &'static str = "host-bookings";

    fn build(id: HostRecordId, new: Self::New, _now: DateTime<Utc>) -> DomainResult<Self> {
        Ok(Self {
            id,
            host: new.host,
            reservation_id: new.reservation_id,
            booking_date: new.booking_date,
        })
    }

    fn host(&self) -> HostId {
        self.host
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostMessage {
    pub id: HostRecordId,
    pub host: HostId,
    pub user_id: UserId,
    pub message_text: String,
    pub sent_date: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewHostMessage {
    pub host: HostId,
    pub user_id: UserId,
    pub message_text: String,
}

impl HostRecord for HostMessage {
    type New = NewHostMessage;
    const COLLECTION: &'static str = "host-messages";

    fn build(id: HostRecordId, new: Self::New, now: DateTime<Utc>) -> DomainResult<Self> {
        Ok(Self {
            id,
            host: new.host,
            user_id: new.user_id,
            message_text: non_empty("message_text", new.message_text)?,
            sent_date: now,
        })
    }

    fn host(&self) -> HostId {
        self.host
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostPromotion {
    pub id: HostRecordId,
    pub host: HostId,
    pub promotion_details: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewHostPromotion {
    pub host: HostId,
    pub promotion_details: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl HostPromotion {
    /// Inclusive of both ends.
    pub fn is_running(&self, today: NaiveDate) -> bool {
        self.start_date <= today && today <= self.end_date
    }
}

impl HostRecord for HostPromotion {
    type New = NewHostPromotion;
    const COLLECTION: &'static str = "host-promotions";

    fn build(id: HostRecordId, new: Self::New, _now: DateTime<Utc>) -> DomainResult<Self> {
        if new.end_date < new.start_date {
            return Err(DomainError::validation("end_date cannot be before start_date"));
        }
        Ok(Self {
            id,
            host: new.host,
            promotion_details: non_empty("promotion_details", new.promotion_details)?,
            start_date: new.start_date,
            end_date: new.end_date,
        })
    }

    fn host(&self) -> HostId {
        self.host
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostEarnings {
    pub id: HostRecordId,
    pub host: HostId,
    /// Minor currency units.
    pub earnings_amount: u64,
    pub earnings_date: NaiveDate,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewHostEarnings {
    pub host: HostId,
    pub earnings_amount: u64,
    pub earnings_date: NaiveDate,
}

impl HostRecord for HostEarnings {
    type New = NewHostEarnings;
    const COLLECTION: &'static str = "host-earnings";

    fn build(id: HostRecordId, new: Self::New, _now: DateTime<Utc>) -> DomainResult<Self> {
        Ok(Self {
            id,
            host: new.host,
            earnings_amount: new.earnings_amount,
            earnings_date: new.earnings_date,
        })
    }

    fn host(&self) -> HostId {
        self.host
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostReservationPolicy {
    pub id: HostRecordId,
    pub host: HostId,
    pub cancellation_policy: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewHostReservationPolicy {
    pub host: HostId,
    pub cancellation_policy: String,
}

impl HostRecord for HostReservationPolicy {
    type New = NewHostReservationPolicy;
    const COLLECTION: &'static str = "host-reservation-policy";
    const ONE_PER_HOST: bool = true;

    fn build(id: HostRecordId, new: Self::New, _now: DateTime<Utc>) -> DomainResult<Self> {
        Ok(Self {
            id,
            host: new.host,
            cancellation_policy: non_empty("cancellation_policy", new.cancellation_policy)?,
        })
    }

    fn host(&self) -> HostId {
        self.host
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostNotification {
    pub id: HostRecordId,
    pub host: HostId,
    pub notification_type: String,
    pub notification_date: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewHostNotification {
    pub host: HostId,
    pub notification_type: String,
}

impl HostRecord for HostNotification {
    type New = NewHostNotification;
    const COLLECTION: &'static str = "host-notifications";

    fn build(id: HostRecordId, new: Self::New, now: DateTime<Utc>) -> DomainResult<Self> {
        let kind = non_empty("notification_type", new.notification_type)?;
        if kind.chars().count() > 100 {
            return Err(DomainError::validation(
                "notification_type cannot exceed 100 characters",
            ));
        }
        Ok(Self {
            id,
            host: new.host,
            notification_type: kind,
            notification_date: now,
        })
    }

    fn host(&self) -> HostId {
        self.host
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SupportStatus {
    #[default]
    New,
    InProgress,
    Closed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostSupportTicket {
    pub id: HostRecordId,
    pub host: HostId,
    pub issue_description: String,
    pub status: SupportStatus,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewHostSupportTicket {
    pub host: HostId,
    pub issue_description: String,
    #[serde(default)]
    pub status: SupportStatus,
}

impl HostRecord for HostSupportTicket {
    type New = NewHostSupportTicket;
    const COLLECTION: &'static str = "host-support";

    fn build(id: HostRecordId, new: Self::New, _now: DateTime<Utc>) -> DomainResult<Self> {
        Ok(Self {
            id,
            host: new.host,
            issue_description: non_empty("issue_description", new.issue_description)?,
            status: new.status,
        })
    }

    fn host(&self) -> HostId {
        self.host
    }
}

impl_entity!(HostAvailability, HostRecordId);
impl_entity!(HostBooking, HostRecordId);
impl_entity!(HostMessage, HostRecordId);
impl_entity!(HostPromotion, HostRecordId);
impl_entity!(HostEarnings, HostRecordId);
impl_entity!(HostReservationPolicy, HostRecordId);
impl_entity!(HostNotification, HostRecordId);
impl_entity!(HostSupportTicket, HostRecordId);

/// Derived per-host totals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HostStatistics {
    pub host: HostId,
    pub total_reservations: u64,
    pub total_earnings: u64,
}

impl HostStatistics {
    pub fn compute(host: HostId, bookings: &[HostBooking], earnings: &[HostEarnings]) -> Self {
        Self {
            host,
            total_reservations: bookings.iter().filter(|b| b.host == host).count() as u64,
            total_earnings: earnings
                .iter()
                .filter(|e| e.host == host)
                .map(|e| e.earnings_amount)
                .sum(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn availability_window_must_move_forward() {
        let new = NewHostAvailability {
            host: HostId::new(),
            start_date: d("2025-07-10"),
            end_date: d("2025-07-01"),
        };
        assert!(HostAvailability::build(HostRecordId::new(), new, Utc::now()).is_err());
    }

    #[test]
    fn support_tickets_start_new() {
        let ticket: NewHostSupportTicket = serde_json::from_value(serde_json::json!({
            "host": HostId::new(),
            "issue_description": "Calendar sync broken"
        }))
        .unwrap();
        let ticket = HostSupportTicket::build(HostRecordId::new(), ticket, Utc::now()).unwrap();
        assert_eq!(ticket.status, SupportStatus::New);
        assert_eq!(
            serde_json::to_value(SupportStatus::InProgress).unwrap(),
            serde_json::json!("in_progress")
        );
    }

    #[test]
    fn statistics_only_count_the_host() {
        let host = HostId::new();
        let other = HostId::new();
        let booking = |h| HostBooking {
            id: HostRecordId::new(),
            host: h,
            reservation_id: ReservationId::new(),
            booking_date: d("2025-01-01"),
        };
        let earning = |h, amount| HostEarnings {
            id: HostRecordId::new(),
            host: h,
            earnings_amount: amount,
            earnings_date: d("2025-01-01"),
        };
        let stats = HostStatistics::compute(
            host,
            &[booking(host), booking(host), booking(other)],
            &[earning(host, 10_000), earning(other, 99_999), earning(host, 2_550)],
        );
        assert_eq!(stats.total_reservations, 2);
        assert_eq!(stats.total_earnings, 12_550);
    }

    #[test]
    fn promotion_running_is_inclusive() {
        let promo = HostPromotion::build(
            HostRecordId::new(),
            NewHostPromotion {
                host: HostId::new(),
                promotion_details: "10% off".into(),
                start_date: d("2025-07-01"),
                end_date: d("2025-07-31"),
            },
            Utc::now(),
        )
        .unwrap();
        assert!(promo.is_running(d("2025-07-31")));
        assert!(!promo.is_running(d("2025-08-01")));
    }
}
