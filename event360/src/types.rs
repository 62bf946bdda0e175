//! Shared domain types for the event360 application.
//!
//! Server-issued identifiers (contacts, events, sessions, bookings) are
//! opaque string newtypes: their format belongs to the backend and we never
//! parse them. Client-generated identifiers (submission attempts) are UUID
//! newtypes. Money is integer cents.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier for one submission attempt of the registration chain.
///
/// Generated client-side when Submit is accepted and carried by every
/// feedback action of that chain. Stale feedback from an abandoned attempt
/// is dropped by comparing against the attempt stored in the current phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AttemptId(Uuid);

impl AttemptId {
    /// Generate a new attempt ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create from an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for AttemptId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for AttemptId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

macro_rules! server_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(String);

        impl $name {
            /// Wrap a server-issued identifier.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// The identifier as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

server_id! {
    /// Contact/registration record id returned by the backend when a
    /// registration is saved. Correlates the QR fetch and the email send.
    ContactId
}

server_id! {
    /// Backend id of a marketing event.
    EventId
}

server_id! {
    /// Backend id of a session belonging to an event.
    SessionId
}

server_id! {
    /// Booking reference printed on the ticket and embedded in the QR code.
    BookingId
}

/// One selectable session of an event, as served by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionOption {
    /// Backend session id.
    pub id: SessionId,

    /// Label shown in the session picker.
    pub label: String,

    /// Scheduled start, when the backend provides one.
    pub starts_at: Option<DateTime<Utc>>,

    /// Planned duration in whole hours, when the backend provides one.
    pub duration_hours: Option<u32>,
}

/// Snapshot of a completed registration form, ready to be saved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistrationRequest {
    /// Attendee first name.
    pub first_name: String,

    /// Attendee last name.
    pub last_name: String,

    /// Attendee email address.
    pub email: String,

    /// Attendee phone number (free-form, may be empty).
    pub phone: String,

    /// Self-reported skills or interests (free-form, may be empty).
    pub skills: String,

    /// Attendee company (required by the form).
    pub company: String,

    /// Chosen session, if the event offers sessions.
    pub session_id: Option<SessionId>,

    /// Number of seats requested, always at least one.
    pub quantity: u32,

    /// Event being registered for.
    pub event_id: EventId,
}

/// One row of the public event listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventSummary {
    /// Backend event id.
    pub id: EventId,

    /// Display name.
    pub name: String,

    /// Scheduled start, when known.
    pub starts_at: Option<DateTime<Utc>>,

    /// Total duration in minutes.
    pub duration_minutes: u32,

    /// Venue or city shown on the listing card.
    pub location: String,

    /// Ticket price in cents. Zero means a free event.
    pub price_cents: u64,

    /// Banner image, when the backend provides one.
    pub image_url: Option<String>,
}

impl EventSummary {
    /// Price rendered for display: `Free` for zero, otherwise dollars with
    /// cents only when they are non-zero (`$25`, `$25.50`).
    #[must_use]
    pub fn display_price(&self) -> String {
        display_price(self.price_cents)
    }
}

/// Render a cent amount for display.
#[must_use]
pub fn display_price(price_cents: u64) -> String {
    if price_cents == 0 {
        return "Free".to_string();
    }
    let dollars = price_cents / 100;
    let cents = price_cents % 100;
    if cents == 0 {
        format!("${dollars}")
    } else {
        format!("${dollars}.{cents:02}")
    }
}

/// Price facet of the event listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PriceFilter {
    /// No price restriction.
    #[default]
    All,

    /// Free events only.
    Free,

    /// Paid events only.
    Paid,
}

impl std::fmt::Display for PriceFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::All => "All",
            Self::Free => "Free",
            Self::Paid => "Paid",
        };
        write!(f, "{label}")
    }
}

/// Publication status of a composed event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EventStatus {
    /// Not yet visible on the public listing.
    #[default]
    Draft,

    /// Published and open for registration.
    Active,
}

/// One editable session row of the event composer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionDraft {
    /// Session name.
    pub name: String,

    /// Scheduled start, once the organizer has picked one.
    pub starts_at: Option<DateTime<Utc>>,

    /// Duration in whole hours. Valid drafts keep this within 1..=8.
    pub duration_hours: u32,

    /// Session price in cents.
    pub price_cents: u64,
}

impl Default for SessionDraft {
    fn default() -> Self {
        Self {
            name: String::new(),
            starts_at: None,
            duration_hours: 1,
            price_cents: 0,
        }
    }
}

/// Editable state of the event composer.
///
/// Always holds at least one session row. Totals are denormalized onto the
/// draft and recomputed whenever a session row changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventDraft {
    /// Event name shown on the listing.
    pub subject: String,

    /// Event category (conference, workshop, meetup, ...).
    pub kind: String,

    /// City or region.
    pub location: String,

    /// Venue name.
    pub venue: String,

    /// Long-form description.
    pub description: String,

    /// Hosting account or organization.
    pub account: String,

    /// Whether the event spans whole days rather than timed sessions.
    pub all_day: bool,

    /// Draft or Active.
    pub status: EventStatus,

    /// First event day. Must be at least tomorrow when submitted.
    pub starts_on: Option<chrono::NaiveDate>,

    /// Session rows, never empty.
    pub sessions: Vec<SessionDraft>,

    /// Sum of session durations, in minutes.
    pub total_duration_minutes: u32,

    /// Sum of session prices, in cents.
    pub total_price_cents: u64,
}

impl Default for EventDraft {
    fn default() -> Self {
        Self {
            subject: String::new(),
            kind: String::new(),
            location: String::new(),
            venue: String::new(),
            description: String::new(),
            account: String::new(),
            all_day: false,
            status: EventStatus::Draft,
            starts_on: None,
            sessions: vec![SessionDraft::default()],
            total_duration_minutes: 60,
            total_price_cents: 0,
        }
    }
}

impl EventDraft {
    /// Recompute the denormalized totals from the session rows.
    pub fn recompute_totals(&mut self) {
        self.total_duration_minutes = self
            .sessions
            .iter()
            .map(|session| session.duration_hours.saturating_mul(60))
            .fold(0, u32::saturating_add);
        self.total_price_cents = self
            .sessions
            .iter()
            .map(|session| session.price_cents)
            .fold(0, u64::saturating_add);
    }
}

/// Payload of a community (newsletter) registration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommunityRegistrationRequest {
    /// First name.
    pub first_name: String,

    /// Last name.
    pub last_name: String,

    /// Email address, checked for prior registration before saving.
    pub email: String,

    /// Event the community signup is associated with.
    pub event_id: EventId,
}

/// Raw value decoded from a ticket QR code at the door.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScannedTicket(String);

impl ScannedTicket {
    /// Wrap a decoded scan value.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The decoded value as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ScannedTicket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
