use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use dreambook_core::{
    Aggregate, AggregateRoot, DomainError, Event, ListingId, PaymentId, ReservationId, StayDates,
    UserId,
};

use crate::confirmation::ConfirmationNumber;
use crate::payment::{Payment, PaymentMethod, PaymentStatus};
use crate::quote::PriceQuote;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReservationStatus {
    #[default]
    Pending,
    Confirmed,
    Cancelled,
    Completed,
}

impl ReservationStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Cancelled => "cancelled",
            Self::Completed => "completed",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Cancelled | Self::Completed)
    }
}

impl core::fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Contact details of the person staying.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuestDetails {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(default)]
    pub phone: String,
}

impl GuestDetails {
    fn validate(&self) -> Result<(), DomainError> {
        if self.first_name.trim().is_empty() || self.last_name.trim().is_empty() {
            return Err(DomainError::validation("guest first and last name are required"));
        }
        let email = self.email.trim();
        if email.is_empty() || !email.contains('@') {
            return Err(DomainError::validation("guest email is not valid"));
        }
        Ok(())
    }
}

/// One recorded status transition. The creation entry has no `old_status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusChange {
    pub old_status: Option<ReservationStatus>,
    pub new_status: ReservationStatus,
    pub changed_by: UserId,
    pub reason: String,
    pub changed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReservationNote {
    pub author: UserId,
    pub note: String,
    pub is_internal: bool,
    pub created_at: DateTime<Utc>,
}

/// Aggregate root: Reservation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reservation {
    id: ReservationId,
    confirmation_number: Option<ConfirmationNumber>,
    user: Option<UserId>,
    listing: Option<ListingId>,
    stay: Option<StayDates>,
    guests_adults: u32,
    guests_children: u32,
    guest: Option<GuestDetails>,
    special_requests: String,
    pricing: Option<PriceQuote>,
    status: ReservationStatus,
    payment_status: PaymentStatus,
    payment: Option<Payment>,
    status_history: Vec<StatusChange>,
    notes: Vec<ReservationNote>,
    created_at: Option<DateTime<Utc>>,
    updated_at: Option<DateTime<Utc>>,
    version: u64,
    created: bool,
}

impl Reservation {
    /// Create an empty, not-yet-created aggregate instance.
    pub fn empty(id: ReservationId) -> Self {
        Self {
            id,
            confirmation_number: None,
            user: None,
            listing: None,
            stay: None,
            guests_adults: 0,
            guests_children: 0,
            guest: None,
            special_requests: String::new(),
            pricing: None,
            status: ReservationStatus::Pending,
            payment_status: PaymentStatus::Pending,
            payment: None,
            status_history: Vec::new(),
            notes: Vec::new(),
            created_at: None,
            updated_at: None,
            version: 0,
            created: false,
        }
    }

    pub fn id_typed(&self) -> ReservationId {
        self.id
    }

    pub fn is_created(&self) -> bool {
        self.created
    }

    pub fn confirmation_number(&self) -> Option<&ConfirmationNumber> {
        self.confirmation_number.as_ref()
    }

    pub fn user(&self) -> Option<UserId> {
        self.user
    }

    pub fn listing(&self) -> Option<ListingId> {
        self.listing
    }

    pub fn stay(&self) -> Option<&StayDates> {
        self.stay.as_ref()
    }

    pub fn check_in(&self) -> Option<NaiveDate> {
        self.stay.as_ref().map(StayDates::start)
    }

    pub fn guests_adults(&self) -> u32 {
        self.guests_adults
    }

    pub fn guests_children(&self) -> u32 {
        self.guests_children
    }

    pub fn special_requests(&self) -> &str {
        &self.special_requests
    }

    pub fn guest(&self) -> Option<&GuestDetails> {
        self.guest.as_ref()
    }

    pub fn pricing(&self) -> Option<&PriceQuote> {
        self.pricing.as_ref()
    }

    pub fn total_amount(&self) -> u64 {
        self.pricing.as_ref().map(|p| p.total_amount).unwrap_or(0)
    }

    pub fn status(&self) -> ReservationStatus {
        self.status
    }

    pub fn payment_status(&self) -> PaymentStatus {
        self.payment_status
    }

    pub fn payment(&self) -> Option<&Payment> {
        self.payment.as_ref()
    }

    pub fn status_history(&self) -> &[StatusChange] {
        &self.status_history
    }

    pub fn notes(&self) -> &[ReservationNote] {
        &self.notes
    }

    /// Notes visible to the guest (everything not marked internal).
    pub fn public_notes(&self) -> impl Iterator<Item = &ReservationNote> {
        self.notes.iter().filter(|n| !n.is_internal)
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }

    pub fn is_cancellable(&self) -> bool {
        matches!(
            self.status,
            ReservationStatus::Pending | ReservationStatus::Confirmed
        )
    }
}

impl AggregateRoot for Reservation {
    type Id = ReservationId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Command: CreateReservation.
///
/// Availability, pricing and the confirmation number are resolved by the
/// caller before the command is issued.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateReservation {
    pub reservation_id: ReservationId,
    pub confirmation_number: ConfirmationNumber,
    pub user: UserId,
    pub listing: ListingId,
    pub stay: StayDates,
    pub guests_adults: u32,
    pub guests_children: u32,
    pub guest: GuestDetails,
    pub special_requests: String,
    pub quote: PriceQuote,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordPayment {
    pub payment_id: PaymentId,
    pub method: PaymentMethod,
    pub amount: u64,
    pub card_brand: Option<String>,
    pub card_last_four: Option<String>,
    pub actor: UserId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmReservation {
    pub actor: UserId,
    /// Hosts and admins may confirm before payment arrives.
    pub allow_unpaid: bool,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CancelReservation {
    pub actor: UserId,
    pub reason: String,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompleteReservation {
    pub actor: UserId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddNote {
    pub author: UserId,
    pub note: String,
    pub is_internal: bool,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReservationCommand {
    Create(Box<CreateReservation>),
    RecordPayment(RecordPayment),
    Confirm(ConfirmReservation),
    Cancel(CancelReservation),
    Complete(CompleteReservation),
    AddNote(AddNote),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReservationCreated {
    pub reservation_id: ReservationId,
    pub confirmation_number: ConfirmationNumber,
    pub user: UserId,
    pub listing: ListingId,
    pub stay: StayDates,
    pub guests_adults: u32,
    pub guests_children: u32,
    pub guest: GuestDetails,
    pub special_requests: String,
    pub quote: PriceQuote,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentRecorded {
    pub reservation_id: ReservationId,
    pub payment: Payment,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentRefunded {
    pub reservation_id: ReservationId,
    pub amount: u64,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusChanged {
    pub reservation_id: ReservationId,
    pub change: StatusChange,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteAdded {
    pub reservation_id: ReservationId,
    pub note: ReservationNote,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReservationEvent {
    Created(Box<ReservationCreated>),
    PaymentRecorded(PaymentRecorded),
    PaymentRefunded(PaymentRefunded),
    StatusChanged(StatusChanged),
    NoteAdded(NoteAdded),
}

impl Event for ReservationEvent {
    fn event_type(&self) -> &'static str {
        match self {
            ReservationEvent::Created(_) => "reservations.reservation.created",
            ReservationEvent::PaymentRecorded(_) => "reservations.reservation.payment_recorded",
            ReservationEvent::PaymentRefunded(_) => "reservations.reservation.payment_refunded",
            ReservationEvent::StatusChanged(_) => "reservations.reservation.status_changed",
            ReservationEvent::NoteAdded(_) => "reservations.reservation.note_added",
        }
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            ReservationEvent::Created(e) => e.occurred_at,
            ReservationEvent::PaymentRecorded(e) => e.payment.paid_at,
            ReservationEvent::PaymentRefunded(e) => e.occurred_at,
            ReservationEvent::StatusChanged(e) => e.change.changed_at,
            ReservationEvent::NoteAdded(e) => e.note.created_at,
        }
    }
}

impl Aggregate for Reservation {
    type Command = ReservationCommand;
    type Event = ReservationEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            ReservationEvent::Created(e) => {
                self.id = e.reservation_id;
                self.confirmation_number = Some(e.confirmation_number.clone());
                self.user = Some(e.user);
                self.listing = Some(e.listing);
                self.stay = Some(e.stay);
                self.guests_adults = e.guests_adults;
                self.guests_children = e.guests_children;
                self.guest = Some(e.guest.clone());
                self.special_requests = e.special_requests.clone();
                self.pricing = Some(e.quote.clone());
                self.status = ReservationStatus::Pending;
                self.payment_status = PaymentStatus::Pending;
                self.status_history = vec![StatusChange {
                    old_status: None,
                    new_status: ReservationStatus::Pending,
                    changed_by: e.user,
                    reason: "reservation created".to_string(),
                    changed_at: e.occurred_at,
                }];
                self.created_at = Some(e.occurred_at);
                self.updated_at = Some(e.occurred_at);
                self.created = true;
            }
            ReservationEvent::PaymentRecorded(e) => {
                self.payment = Some(e.payment.clone());
                self.payment_status = PaymentStatus::Paid;
                self.updated_at = Some(e.payment.paid_at);
            }
            ReservationEvent::PaymentRefunded(e) => {
                if let Some(payment) = self.payment.as_mut() {
                    payment.refunded_at = Some(e.occurred_at);
                }
                self.payment_status = PaymentStatus::Refunded;
                self.updated_at = Some(e.occurred_at);
            }
            ReservationEvent::StatusChanged(e) => {
                self.status = e.change.new_status;
                self.status_history.push(e.change.clone());
                self.updated_at = Some(e.change.changed_at);
            }
            ReservationEvent::NoteAdded(e) => {
                self.notes.push(e.note.clone());
            }
        }

        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            ReservationCommand::Create(cmd) => self.handle_create(cmd),
            ReservationCommand::RecordPayment(cmd) => self.handle_payment(cmd),
            ReservationCommand::Confirm(cmd) => self.handle_confirm(cmd),
            ReservationCommand::Cancel(cmd) => self.handle_cancel(cmd),
            ReservationCommand::Complete(cmd) => self.handle_complete(cmd),
            ReservationCommand::AddNote(cmd) => self.handle_note(cmd),
        }
    }
}

impl Reservation {
    fn ensure_created(&self) -> Result<(), DomainError> {
        if !self.created {
            return Err(DomainError::not_found("reservation"));
        }
        Ok(())
    }

    fn transition(
        &self,
        new_status: ReservationStatus,
        changed_by: UserId,
        reason: impl Into<String>,
        changed_at: DateTime<Utc>,
    ) -> ReservationEvent {
        ReservationEvent::StatusChanged(StatusChanged {
            reservation_id: self.id,
            change: StatusChange {
                old_status: Some(self.status),
                new_status,
                changed_by,
                reason: reason.into(),
                changed_at,
            },
        })
    }

    fn handle_create(&self, cmd: &CreateReservation) -> Result<Vec<ReservationEvent>, DomainError> {
        if self.created {
            return Err(DomainError::conflict("reservation already exists"));
        }
        if cmd.reservation_id != self.id {
            return Err(DomainError::invariant("reservation_id mismatch"));
        }
        if cmd.guests_adults == 0 {
            return Err(DomainError::validation("at least one adult guest is required"));
        }
        cmd.guest.validate()?;
        if cmd.special_requests.chars().count() > 1_000 {
            return Err(DomainError::validation(
                "special_requests cannot exceed 1000 characters",
            ));
        }
        if cmd.quote.total_nights != cmd.stay.nights() {
            return Err(DomainError::invariant("quote does not match the requested stay"));
        }

        Ok(vec![ReservationEvent::Created(Box::new(ReservationCreated {
            reservation_id: cmd.reservation_id,
            confirmation_number: cmd.confirmation_number.clone(),
            user: cmd.user,
            listing: cmd.listing,
            stay: cmd.stay,
            guests_adults: cmd.guests_adults,
            guests_children: cmd.guests_children,
            guest: GuestDetails {
                first_name: cmd.guest.first_name.trim().to_string(),
                last_name: cmd.guest.last_name.trim().to_string(),
                email: cmd.guest.email.trim().to_lowercase(),
                phone: cmd.guest.phone.trim().to_string(),
            },
            special_requests: cmd.special_requests.trim().to_string(),
            quote: cmd.quote.clone(),
            occurred_at: cmd.occurred_at,
        }))])
    }

    fn handle_payment(&self, cmd: &RecordPayment) -> Result<Vec<ReservationEvent>, DomainError> {
        self.ensure_created()?;
        if self.status != ReservationStatus::Pending && self.status != ReservationStatus::Confirmed {
            return Err(DomainError::invariant(format!(
                "cannot pay for a {} reservation",
                self.status
            )));
        }
        if self.payment_status != PaymentStatus::Pending {
            return Err(DomainError::conflict("reservation has already been paid"));
        }
        if cmd.amount != self.total_amount() {
            return Err(DomainError::validation(format!(
                "payment amount {} does not match the reservation total {}",
                cmd.amount,
                self.total_amount()
            )));
        }

        let payment = Payment::capture(
            cmd.payment_id,
            cmd.method,
            cmd.amount,
            cmd.card_brand.clone(),
            cmd.card_last_four.clone(),
            cmd.occurred_at,
        )?;

        Ok(vec![ReservationEvent::PaymentRecorded(PaymentRecorded {
            reservation_id: self.id,
            payment,
        })])
    }

    fn handle_confirm(&self, cmd: &ConfirmReservation) -> Result<Vec<ReservationEvent>, DomainError> {
        self.ensure_created()?;
        if self.status != ReservationStatus::Pending {
            return Err(DomainError::invariant(format!(
                "only pending reservations can be confirmed (status: {})",
                self.status
            )));
        }
        if self.payment_status != PaymentStatus::Paid && !cmd.allow_unpaid {
            return Err(DomainError::invariant(
                "reservation must be paid before it is confirmed",
            ));
        }

        Ok(vec![self.transition(
            ReservationStatus::Confirmed,
            cmd.actor,
            "reservation confirmed",
            cmd.occurred_at,
        )])
    }

    fn handle_cancel(&self, cmd: &CancelReservation) -> Result<Vec<ReservationEvent>, DomainError> {
        self.ensure_created()?;
        if !self.is_cancellable() {
            return Err(DomainError::invariant(format!(
                "cannot cancel a {} reservation",
                self.status
            )));
        }

        let reason = match cmd.reason.trim() {
            "" => "cancelled by request",
            r => r,
        };
        let mut events = vec![self.transition(
            ReservationStatus::Cancelled,
            cmd.actor,
            reason,
            cmd.occurred_at,
        )];
        if self.payment_status == PaymentStatus::Paid {
            events.push(ReservationEvent::PaymentRefunded(PaymentRefunded {
                reservation_id: self.id,
                amount: self.payment.as_ref().map(|p| p.amount_paid).unwrap_or(0),
                occurred_at: cmd.occurred_at,
            }));
        }
        Ok(events)
    }

    fn handle_complete(&self, cmd: &CompleteReservation) -> Result<Vec<ReservationEvent>, DomainError> {
        self.ensure_created()?;
        if self.status != ReservationStatus::Confirmed {
            return Err(DomainError::invariant(
                "only confirmed reservations can be completed",
            ));
        }

        Ok(vec![self.transition(
            ReservationStatus::Completed,
            cmd.actor,
            "stay completed",
            cmd.occurred_at,
        )])
    }

    fn handle_note(&self, cmd: &AddNote) -> Result<Vec<ReservationEvent>, DomainError> {
        self.ensure_created()?;
        let note = cmd.note.trim();
        if note.is_empty() {
            return Err(DomainError::validation("note cannot be empty"));
        }

        Ok(vec![ReservationEvent::NoteAdded(NoteAdded {
            reservation_id: self.id,
            note: ReservationNote {
                author: cmd.author,
                note: note.to_string(),
                is_internal: cmd.is_internal,
                created_at: cmd.occurred_at,
            },
        })])
    }
}
