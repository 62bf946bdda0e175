//! Community sign-up: the lightweight registration variant for open
//! community events.
//!
//! Unlike the ticketed chain there is no QR or email step. A submission
//! first asks the backend whether the email address is already registered;
//! a used address short-circuits to a field-level failure without saving
//! anything. Otherwise the sign-up is saved and listeners are told how it
//! went through [`CommunityRegistrationCompleted`], success or not.

use crate::error::{FieldError, normalize_remote_error};
use crate::gateway::EventGateway;
use crate::types::{CommunityRegistrationRequest, ContactId};
use event360_core::event::Event;
use event360_core::{SmallVec, effect::Effect, reducer::Reducer, smallvec};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, warn};

type Effects = SmallVec<[Effect<CommunityAction>; 4]>;

/// Message attached to the email field when the address is already known.
const EMAIL_IN_USE: &str = "This email address is already registered";

/// State of the community sign-up form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CommunityState {
    /// Whether a sign-up is in flight (pre-check or save).
    pub submitting: bool,

    /// Field-level failures, currently only the email-in-use rejection.
    pub field_errors: Vec<FieldError>,

    /// Contact id of the saved sign-up, once one succeeded.
    pub completed: Option<ContactId>,

    /// Notice shown when the backend failed outright.
    pub notice: Option<String>,
}

/// Actions handled by the community reducer.
#[derive(Debug, Clone, PartialEq)]
pub enum CommunityAction {
    /// Submit a sign-up.
    Submit {
        /// The filled-in sign-up.
        request: CommunityRegistrationRequest,
    },

    /// The email pre-check answered.
    EmailChecked {
        /// The sign-up being processed.
        request: CommunityRegistrationRequest,
        /// Whether the address is already registered.
        registered: bool,
    },

    /// The sign-up was saved.
    Saved {
        /// Contact id of the new sign-up.
        contact_id: ContactId,
    },

    /// The pre-check or the save failed.
    Failed {
        /// Normalized failure message.
        message: String,
    },
}

/// Emitted once per finished sign-up attempt that reached the backend.
///
/// `success` is false when the save (or the pre-check) failed; the
/// email-in-use rejection is a field-level failure and emits nothing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommunityRegistrationCompleted {
    /// Whether the sign-up was saved.
    pub success: bool,

    /// Contact id of the saved sign-up, absent on failure.
    pub contact_id: Option<ContactId>,
}

impl Event for CommunityRegistrationCompleted {
    fn event_type(&self) -> &'static str {
        "CommunityRegistrationCompleted.v1"
    }
}

/// Listener for finished community sign-ups.
pub trait CommunityObserver: Send + Sync {
    /// Called once per terminal outcome, success and failure alike.
    fn community_registration_completed(
        &self,
        event: CommunityRegistrationCompleted,
    ) -> Pin<Box<dyn Future<Output = ()> + Send>>;
}

/// Observer that logs sign-up outcomes.
#[derive(Clone, Debug, Default)]
pub struct LoggingCommunityObserver;

impl LoggingCommunityObserver {
    /// Creates a new logging observer.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl CommunityObserver for LoggingCommunityObserver {
    fn community_registration_completed(
        &self,
        event: CommunityRegistrationCompleted,
    ) -> Pin<Box<dyn Future<Output = ()> + Send>> {
        Box::pin(async move {
            if event.success {
                tracing::info!(contact_id = ?event.contact_id, "Community sign-up completed");
            } else {
                tracing::warn!("Community sign-up failed");
            }
        })
    }
}

/// Observer that stores every notification, for tests.
#[derive(Debug, Default)]
pub struct RecordingCommunityObserver {
    events: Mutex<Vec<CommunityRegistrationCompleted>>,
}

impl RecordingCommunityObserver {
    /// Creates an empty recording observer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Every notification received so far, in order.
    #[must_use]
    pub fn events(&self) -> Vec<CommunityRegistrationCompleted> {
        self.lock().clone()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<CommunityRegistrationCompleted>> {
        self.events.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl CommunityObserver for RecordingCommunityObserver {
    fn community_registration_completed(
        &self,
        event: CommunityRegistrationCompleted,
    ) -> Pin<Box<dyn Future<Output = ()> + Send>> {
        self.lock().push(event);
        Box::pin(async {})
    }
}

/// Environment for the community feature.
#[derive(Clone)]
pub struct CommunityEnvironment {
    /// Backend gateway for the email check and the save.
    pub gateway: Arc<dyn EventGateway>,

    /// Listener notified of terminal outcomes.
    pub observer: Arc<dyn CommunityObserver>,
}

impl CommunityEnvironment {
    /// Creates a new `CommunityEnvironment`.
    #[must_use]
    pub fn new(gateway: Arc<dyn EventGateway>, observer: Arc<dyn CommunityObserver>) -> Self {
        Self { gateway, observer }
    }
}

/// Reducer driving [`CommunityState`].
#[derive(Clone, Debug, Default)]
pub struct CommunityReducer;

impl CommunityReducer {
    /// Creates a new community reducer.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn submit(
        state: &mut CommunityState,
        request: CommunityRegistrationRequest,
        env: &CommunityEnvironment,
    ) -> Effects {
        if state.submitting {
            debug!("Submit ignored, a sign-up is already in flight");
            return smallvec![Effect::None];
        }

        state.submitting = true;
        state.field_errors.clear();
        state.notice = None;
        state.completed = None;
        debug!(email = %request.email, "Checking email before community sign-up");

        let gateway = env.gateway.clone();
        smallvec![Effect::future(async move {
            match gateway.is_email_registered(request.email.clone()).await {
                Ok(registered) => Some(CommunityAction::EmailChecked {
                    request,
                    registered,
                }),
                Err(error) => Some(CommunityAction::Failed {
                    message: normalize_remote_error(&error),
                }),
            }
        })]
    }

    fn on_email_checked(
        state: &mut CommunityState,
        request: CommunityRegistrationRequest,
        registered: bool,
        env: &CommunityEnvironment,
    ) -> Effects {
        if !state.submitting {
            debug!("Ignoring email check for a sign-up that is no longer in flight");
            return smallvec![Effect::None];
        }

        if registered {
            debug!(email = %request.email, "Community sign-up rejected, email already in use");
            crate::metrics::record_community_registration("email_in_use");
            state.submitting = false;
            state.field_errors = vec![FieldError::new("email", EMAIL_IN_USE)];
            return smallvec![Effect::None];
        }

        debug!(email = %request.email, "Email is free, saving community sign-up");
        let gateway = env.gateway.clone();
        smallvec![Effect::future(async move {
            match gateway.save_community_registration(request).await {
                Ok(contact_id) => Some(CommunityAction::Saved { contact_id }),
                Err(error) => Some(CommunityAction::Failed {
                    message: normalize_remote_error(&error),
                }),
            }
        })]
    }

    fn on_saved(
        state: &mut CommunityState,
        contact_id: ContactId,
        env: &CommunityEnvironment,
    ) -> Effects {
        if !state.submitting {
            debug!(%contact_id, "Ignoring save confirmation for a sign-up that is no longer in flight");
            return smallvec![Effect::None];
        }

        info!(%contact_id, "Community sign-up completed");
        crate::metrics::record_community_registration("completed");
        state.submitting = false;
        state.completed = Some(contact_id.clone());

        let observer = env.observer.clone();
        smallvec![Effect::future(async move {
            observer
                .community_registration_completed(CommunityRegistrationCompleted {
                    success: true,
                    contact_id: Some(contact_id),
                })
                .await;
            None
        })]
    }

    fn on_failed(state: &mut CommunityState, message: String, env: &CommunityEnvironment) -> Effects {
        if !state.submitting {
            debug!(%message, "Ignoring failure for a sign-up that is no longer in flight");
            return smallvec![Effect::None];
        }

        warn!(%message, "Community sign-up failed");
        crate::metrics::record_community_registration("failed");
        state.submitting = false;
        state.notice = Some(message);

        let observer = env.observer.clone();
        smallvec![Effect::future(async move {
            observer
                .community_registration_completed(CommunityRegistrationCompleted {
                    success: false,
                    contact_id: None,
                })
                .await;
            None
        })]
    }
}

impl Reducer for CommunityReducer {
    type State = CommunityState;
    type Action = CommunityAction;
    type Environment = CommunityEnvironment;

    fn reduce(
        &self,
        state: &mut CommunityState,
        action: CommunityAction,
        env: &CommunityEnvironment,
    ) -> SmallVec<[Effect<CommunityAction>; 4]> {
        match action {
            CommunityAction::Submit { request } => Self::submit(state, request, env),
            CommunityAction::EmailChecked {
                request,
                registered,
            } => Self::on_email_checked(state, request, registered, env),
            CommunityAction::Saved { contact_id } => Self::on_saved(state, contact_id, env),
            CommunityAction::Failed { message } => Self::on_failed(state, message, env),
        }
    }
}
