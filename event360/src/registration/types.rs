//! State types for the registration feature.

use super::form::RegistrationForm;
use crate::error::FieldError;
use crate::types::{AttemptId, BookingId, ContactId, EventId, SessionOption};
use serde::{Deserialize, Serialize};

/// What the completed registration hands back to the attendee.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Receipt {
    /// Booking reference printed on the ticket.
    pub booking_id: BookingId,

    /// Event name as the backend knows it.
    pub event_name: String,

    /// QR image URL, when one could be extracted from the ticket markup.
    pub qr_url: Option<String>,
}

/// Phase of the submission chain.
///
/// Exactly one phase is active at a time and each feedback action advances
/// at most one phase. In-flight phases remember their [`AttemptId`] so
/// feedback from an abandoned attempt can be dropped.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub enum SubmissionPhase {
    /// Nothing submitted yet (or the form was reset).
    #[default]
    Idle,

    /// The registration is being saved.
    Saving {
        /// The running attempt.
        attempt: AttemptId,
    },

    /// The registration saved; the ticket QR is being fetched.
    AwaitingQr {
        /// The running attempt.
        attempt: AttemptId,
        /// Contact returned by the save, keys the QR fetch.
        contact_id: ContactId,
    },

    /// The QR arrived; the confirmation email is being sent.
    SendingEmail {
        /// The running attempt.
        attempt: AttemptId,
        /// Contact the email is addressed to.
        contact_id: ContactId,
        /// Receipt promoted to `Done` once the email is out.
        receipt: Receipt,
    },

    /// The whole chain completed.
    Done {
        /// The attendee's receipt.
        receipt: Receipt,
    },

    /// A step failed; Submit may be pressed again.
    Failed {
        /// Normalized failure message.
        message: String,
    },
}

impl SubmissionPhase {
    /// Whether a chain is currently running.
    #[must_use]
    pub const fn is_in_flight(&self) -> bool {
        matches!(
            self,
            Self::Saving { .. } | Self::AwaitingQr { .. } | Self::SendingEmail { .. }
        )
    }

    /// The attempt owning the current in-flight phase, if any.
    #[must_use]
    pub const fn attempt(&self) -> Option<AttemptId> {
        match self {
            Self::Saving { attempt }
            | Self::AwaitingQr { attempt, .. }
            | Self::SendingEmail { attempt, .. } => Some(*attempt),
            Self::Idle | Self::Done { .. } | Self::Failed { .. } => None,
        }
    }
}

/// View-facing QR block, derived from a completed chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QrPresentation {
    /// Extracted QR image URL, when the markup was well-formed.
    pub image_url: Option<String>,

    /// Event name shown next to the QR.
    pub event_name: String,

    /// Booking reference shown next to the QR.
    pub booking_id: BookingId,

    /// Whether the QR image itself should be shown.
    pub show: bool,
}

/// Complete state of the registration feature for one event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistrationState {
    /// Event this form registers for.
    pub event_id: EventId,

    /// The attendee form.
    pub form: RegistrationForm,

    /// Selectable sessions served by the backend.
    pub catalog: Vec<SessionOption>,

    /// Notice shown when the catalog could not be loaded.
    pub catalog_notice: Option<String>,

    /// Current phase of the submission chain.
    pub phase: SubmissionPhase,

    /// Validation errors from the last rejected Submit.
    pub field_errors: Vec<FieldError>,

    /// Notice shown when a submission step failed.
    pub notice: Option<String>,
}

impl RegistrationState {
    /// Fresh state for one event.
    #[must_use]
    pub fn new(event_id: EventId) -> Self {
        Self {
            event_id,
            form: RegistrationForm::default(),
            catalog: Vec::new(),
            catalog_notice: None,
            phase: SubmissionPhase::Idle,
            field_errors: Vec::new(),
            notice: None,
        }
    }

    /// Whether the submit button should show a spinner and reject clicks.
    #[must_use]
    pub const fn is_submitting(&self) -> bool {
        self.phase.is_in_flight()
    }

    /// The QR block to render, present only once the chain is [`SubmissionPhase::Done`].
    #[must_use]
    pub fn presentation(&self) -> Option<QrPresentation> {
        match &self.phase {
            SubmissionPhase::Done { receipt } => Some(QrPresentation {
                image_url: receipt.qr_url.clone(),
                event_name: receipt.event_name.clone(),
                booking_id: receipt.booking_id.clone(),
                show: receipt.qr_url.is_some(),
            }),
            _ => None,
        }
    }

    /// Clear the form and every submission artifact. The loaded catalog is
    /// kept; it belongs to the event, not to the attempt.
    pub fn reset(&mut self) {
        self.form.reset();
        self.phase = SubmissionPhase::Idle;
        self.field_errors.clear();
        self.notice = None;
    }
}
