//! `dreambook-hosts` — host profiles and the records hosts manage.

pub mod host;
pub mod records;

pub use host::{Host, HostPatch, HostQuery, NewHost};
pub use records::{
    HostAvailability, HostBooking, HostEarnings, HostMessage, HostNotification, HostPromotion,
    HostRecord, HostReservationPolicy, HostStatistics, HostSupportTicket, SupportStatus,
};
