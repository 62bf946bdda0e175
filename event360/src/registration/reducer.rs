//! The registration reducer: catalog loading, form edits and the
//! submission chain.

use super::actions::RegistrationAction;
use super::environment::RegistrationEnvironment;
use super::observer::RegistrationCompleted;
use super::types::{Receipt, RegistrationState, SubmissionPhase};
use super::validate;
use crate::error::normalize_remote_error;
use crate::gateway::QrPayload;
use crate::qr::extract_qr_url;
use crate::types::{AttemptId, ContactId};
use event360_core::{SmallVec, effect::Effect, reducer::Reducer, smallvec};
use tracing::{debug, info, warn};

type Effects = SmallVec<[Effect<RegistrationAction>; 4]>;

/// Reducer driving [`RegistrationState`].
///
/// Chain feedback is handled by one transition function per phase
/// ([`on_saved`](Self::on_saved) and friends); each checks that the
/// feedback belongs to the attempt currently in flight and ignores it
/// otherwise, so an abandoned chain can never corrupt a newer one.
#[derive(Clone, Debug, Default)]
pub struct RegistrationReducer;

impl RegistrationReducer {
    /// Creates a new registration reducer.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn load_catalog(state: &RegistrationState, env: &RegistrationEnvironment) -> Effects {
        let gateway = env.gateway.clone();
        let event_id = state.event_id.clone();
        debug!(%event_id, "Loading session catalog");

        smallvec![Effect::future(async move {
            match gateway.sessions_for_event(event_id).await {
                Ok(options) => Some(RegistrationAction::CatalogLoaded { options }),
                Err(error) => Some(RegistrationAction::CatalogFailed {
                    message: normalize_remote_error(&error),
                }),
            }
        })]
    }

    fn submit(state: &mut RegistrationState, env: &RegistrationEnvironment) -> Effects {
        if state.phase.is_in_flight() {
            debug!("Submit ignored, a submission is already in flight");
            return smallvec![Effect::None];
        }

        let errors = validate::validate(&state.form);
        if !errors.is_empty() {
            debug!(count = errors.len(), "Submit rejected by the validation gate");
            state.field_errors = errors;
            return smallvec![Effect::None];
        }

        let attempt = AttemptId::new();
        state.field_errors.clear();
        state.notice = None;
        state.phase = SubmissionPhase::Saving { attempt };
        info!(%attempt, event_id = %state.event_id, "Submission chain started");
        crate::metrics::record_registration_started();

        let gateway = env.gateway.clone();
        let request = state.form.to_request(state.event_id.clone());
        smallvec![Effect::future(async move {
            match gateway.save_registration(request).await {
                Ok(contact_id) => Some(RegistrationAction::Saved {
                    attempt,
                    contact_id,
                }),
                Err(error) => Some(RegistrationAction::StepFailed {
                    attempt,
                    message: normalize_remote_error(&error),
                }),
            }
        })]
    }

    fn on_saved(
        state: &mut RegistrationState,
        attempt: AttemptId,
        contact_id: ContactId,
        env: &RegistrationEnvironment,
    ) -> Effects {
        match &state.phase {
            SubmissionPhase::Saving { attempt: current } if *current == attempt => {}
            _ => {
                debug!(%attempt, "Ignoring save confirmation for an abandoned attempt");
                return smallvec![Effect::None];
            }
        }

        debug!(%attempt, %contact_id, "Registration saved, fetching ticket QR");
        state.phase = SubmissionPhase::AwaitingQr {
            attempt,
            contact_id: contact_id.clone(),
        };

        let gateway = env.gateway.clone();
        smallvec![Effect::future(async move {
            match gateway.qr_for_registration(contact_id).await {
                Ok(payload) => Some(RegistrationAction::QrReceived { attempt, payload }),
                Err(error) => Some(RegistrationAction::StepFailed {
                    attempt,
                    message: normalize_remote_error(&error),
                }),
            }
        })]
    }

    fn on_qr_received(
        state: &mut RegistrationState,
        attempt: AttemptId,
        payload: QrPayload,
        env: &RegistrationEnvironment,
    ) -> Effects {
        let contact_id = match &state.phase {
            SubmissionPhase::AwaitingQr {
                attempt: current,
                contact_id,
            } if *current == attempt => contact_id.clone(),
            _ => {
                debug!(%attempt, "Ignoring QR payload for an abandoned attempt");
                return smallvec![Effect::None];
            }
        };

        // A malformed ticket is not a chain failure: the email still goes
        // out and the receipt renders without the QR image.
        let qr_url = extract_qr_url(&payload.ticket_markup);
        if qr_url.is_none() {
            warn!(
                %attempt,
                booking_id = %payload.booking_id,
                "Ticket markup carried no usable QR URL"
            );
        }

        debug!(%attempt, %contact_id, has_qr = qr_url.is_some(), "Ticket QR processed, sending email");
        state.phase = SubmissionPhase::SendingEmail {
            attempt,
            contact_id: contact_id.clone(),
            receipt: Receipt {
                booking_id: payload.booking_id,
                event_name: payload.event_name,
                qr_url: qr_url.clone(),
            },
        };

        let gateway = env.gateway.clone();
        smallvec![Effect::future(async move {
            match gateway.send_registration_email(contact_id, qr_url).await {
                Ok(()) => Some(RegistrationAction::EmailSent { attempt }),
                Err(error) => Some(RegistrationAction::StepFailed {
                    attempt,
                    message: normalize_remote_error(&error),
                }),
            }
        })]
    }

    fn on_email_sent(
        state: &mut RegistrationState,
        attempt: AttemptId,
        env: &RegistrationEnvironment,
    ) -> Effects {
        let receipt = match &state.phase {
            SubmissionPhase::SendingEmail {
                attempt: current,
                receipt,
                ..
            } if *current == attempt => receipt.clone(),
            _ => {
                debug!(%attempt, "Ignoring email confirmation for an abandoned attempt");
                return smallvec![Effect::None];
            }
        };

        info!(%attempt, booking_id = %receipt.booking_id, "Submission chain completed");
        crate::metrics::record_registration_completed(receipt.qr_url.is_some());

        let completed = RegistrationCompleted {
            booking_id: receipt.booking_id.clone(),
            qr_url: receipt.qr_url.clone(),
        };
        state.phase = SubmissionPhase::Done { receipt };

        let observer = env.observer.clone();
        smallvec![Effect::future(async move {
            observer.registration_completed(completed).await;
            None
        })]
    }

    fn on_step_failed(
        state: &mut RegistrationState,
        attempt: AttemptId,
        message: String,
    ) -> Effects {
        if state.phase.attempt() != Some(attempt) {
            debug!(%attempt, "Ignoring step failure for an abandoned attempt");
            return smallvec![Effect::None];
        }

        let step = match &state.phase {
            SubmissionPhase::Saving { .. } => "save",
            SubmissionPhase::AwaitingQr { .. } => "qr",
            SubmissionPhase::SendingEmail { .. } => "email",
            _ => "unknown",
        };
        warn!(%attempt, step, %message, "Submission chain failed");
        crate::metrics::record_registration_failed(step);

        state.notice = Some(message.clone());
        state.phase = SubmissionPhase::Failed { message };
        smallvec![Effect::None]
    }
}

impl Reducer for RegistrationReducer {
    type State = RegistrationState;
    type Action = RegistrationAction;
    type Environment = RegistrationEnvironment;

    fn reduce(
        &self,
        state: &mut RegistrationState,
        action: RegistrationAction,
        env: &RegistrationEnvironment,
    ) -> SmallVec<[Effect<RegistrationAction>; 4]> {
        match action {
            RegistrationAction::LoadCatalog => Self::load_catalog(state, env),
            RegistrationAction::CatalogLoaded { options } => {
                debug!(count = options.len(), "Session catalog loaded");
                state.catalog = options;
                state.catalog_notice = None;
                smallvec![Effect::None]
            }
            RegistrationAction::CatalogFailed { message } => {
                warn!(%message, "Session catalog failed to load");
                state.catalog.clear();
                state.catalog_notice = Some(message);
                smallvec![Effect::None]
            }
            RegistrationAction::FirstNameChanged { value } => {
                state.form.set_first_name(value);
                smallvec![Effect::None]
            }
            RegistrationAction::LastNameChanged { value } => {
                state.form.set_last_name(value);
                smallvec![Effect::None]
            }
            RegistrationAction::EmailChanged { value } => {
                state.form.set_email(value);
                smallvec![Effect::None]
            }
            RegistrationAction::PhoneChanged { value } => {
                state.form.set_phone(value);
                smallvec![Effect::None]
            }
            RegistrationAction::SkillsChanged { value } => {
                state.form.set_skills(value);
                smallvec![Effect::None]
            }
            RegistrationAction::CompanyChanged { value } => {
                state.form.set_company(value);
                smallvec![Effect::None]
            }
            RegistrationAction::QuantityChanged { raw } => {
                state.form.set_quantity(&raw);
                smallvec![Effect::None]
            }
            RegistrationAction::TogglePicker => {
                state.form.toggle_picker();
                smallvec![Effect::None]
            }
            RegistrationAction::SessionPicked { option } => {
                state.form.select_session(&option);
                smallvec![Effect::None]
            }
            RegistrationAction::Submit => Self::submit(state, env),
            RegistrationAction::Saved {
                attempt,
                contact_id,
            } => Self::on_saved(state, attempt, contact_id, env),
            RegistrationAction::QrReceived { attempt, payload } => {
                Self::on_qr_received(state, attempt, payload, env)
            }
            RegistrationAction::EmailSent { attempt } => Self::on_email_sent(state, attempt, env),
            RegistrationAction::StepFailed { attempt, message } => {
                Self::on_step_failed(state, attempt, message)
            }
            RegistrationAction::Reset => {
                debug!("Registration state reset");
                state.reset();
                smallvec![Effect::None]
            }
        }
    }
}
