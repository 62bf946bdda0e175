//! Event registration: session catalog, attendee form and the submission
//! chain that turns a completed form into a ticket.
//!
//! # Flow
//!
//! ```text
//! Submit
//!   ↓  validation gate (field errors stop here)
//! Saving ──save_registration──→ Saved { contact_id }
//!   ↓
//! AwaitingQr ──qr_for_registration──→ QrReceived { payload }
//!   ↓  QR URL extracted from markup (malformed markup → no URL, chain continues)
//! SendingEmail ──send_registration_email──→ EmailSent
//!   ↓
//! Done { receipt }          any step failure → Failed { message }
//! ```
//!
//! Each submission attempt carries an [`AttemptId`](crate::types::AttemptId);
//! feedback from an abandoned attempt is ignored. While a chain is in
//! flight, further Submits are rejected. After a failure the form stays
//! filled and Submit starts a fresh attempt.

pub mod actions;
pub mod environment;
pub mod form;
pub mod observer;
pub mod reducer;
pub mod types;
pub mod validate;

pub use actions::RegistrationAction;
pub use environment::RegistrationEnvironment;
pub use form::RegistrationForm;
pub use observer::{LoggingObserver, RecordingObserver, RegistrationCompleted, RegistrationObserver};
pub use reducer::RegistrationReducer;
pub use types::{QrPresentation, Receipt, RegistrationState, SubmissionPhase};
