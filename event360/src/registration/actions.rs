//! Actions handled by the registration reducer.

use crate::gateway::QrPayload;
use crate::types::{AttemptId, ContactId, SessionOption};

/// Everything that can happen to the registration feature.
///
/// User-originated actions come from the form; the `Saved`/`QrReceived`/
/// `EmailSent`/`StepFailed` quartet is feedback from the submission chain's
/// own effects and always carries the attempt it belongs to.
#[derive(Debug, Clone, PartialEq)]
pub enum RegistrationAction {
    /// Load the session catalog for the event.
    LoadCatalog,

    /// The catalog arrived.
    CatalogLoaded {
        /// Sessions to offer in the picker.
        options: Vec<SessionOption>,
    },

    /// The catalog could not be loaded.
    CatalogFailed {
        /// Normalized failure message.
        message: String,
    },

    /// First name input changed.
    FirstNameChanged {
        /// New value.
        value: String,
    },

    /// Last name input changed.
    LastNameChanged {
        /// New value.
        value: String,
    },

    /// Email input changed.
    EmailChanged {
        /// New value.
        value: String,
    },

    /// Phone input changed.
    PhoneChanged {
        /// New value.
        value: String,
    },

    /// Skills input changed.
    SkillsChanged {
        /// New value.
        value: String,
    },

    /// Company input changed.
    CompanyChanged {
        /// New value.
        value: String,
    },

    /// Seat quantity input changed.
    QuantityChanged {
        /// Raw input, normalized by the form.
        raw: String,
    },

    /// The session picker was opened or closed.
    TogglePicker,

    /// A session was picked from the catalog.
    SessionPicked {
        /// The chosen option.
        option: SessionOption,
    },

    /// The submit button was pressed.
    Submit,

    /// The registration saved.
    Saved {
        /// Attempt this feedback belongs to.
        attempt: AttemptId,
        /// Contact id keying the QR fetch and the email.
        contact_id: ContactId,
    },

    /// The ticket QR payload arrived.
    QrReceived {
        /// Attempt this feedback belongs to.
        attempt: AttemptId,
        /// Markup, event name and booking reference.
        payload: QrPayload,
    },

    /// The confirmation email was sent.
    EmailSent {
        /// Attempt this feedback belongs to.
        attempt: AttemptId,
    },

    /// A chain step failed.
    StepFailed {
        /// Attempt this feedback belongs to.
        attempt: AttemptId,
        /// Normalized failure message.
        message: String,
    },

    /// Clear the form and start over.
    Reset,
}
