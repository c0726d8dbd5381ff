//! `dreambook-reservations` — the booking flow.
//!
//! The flow is: check availability, quote, create a pending reservation (which
//! blocks its dates), record payment, confirm. Cancelling releases the dates
//! and refunds a paid reservation.
//!
//! Everything here is pure. Reading blocks and offers, drawing confirmation
//! numbers and serializing the check-then-insert is the caller's job.

pub mod availability;
pub mod confirmation;
pub mod history;
pub mod offer;
pub mod payment;
pub mod quote;
pub mod reservation;

pub use availability::{AvailabilityBlock, NewManualBlock, ensure_available, find_conflict, is_available};
pub use confirmation::{ConfirmationNumber, generate_confirmation_number, unique_confirmation_number};
pub use history::HistoryQuery;
pub use offer::{NewSpecialOffer, SpecialOffer, best_offer};
pub use payment::{Payment, PaymentMethod, PaymentStatus};
pub use quote::{PriceQuote, TAX_RATE_BPS, quote};
pub use reservation::{
    AddNote, CancelReservation, CompleteReservation, ConfirmReservation, CreateReservation,
    GuestDetails, RecordPayment, Reservation, ReservationCommand, ReservationEvent, ReservationNote,
    ReservationStatus, StatusChange,
};
