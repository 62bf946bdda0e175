//! Event composer: the organizer-facing draft editor.
//!
//! The draft always keeps at least one session row. Row edits recompute
//! the denormalized totals immediately; full validation (names, start
//! date, durations) runs when a row is added and when the draft is
//! submitted. The start-date floor is "tomorrow" as seen by the injected
//! clock, never the wall clock directly.

use crate::error::{FieldError, normalize_remote_error};
use crate::gateway::EventGateway;
use crate::types::{EventDraft, EventId, EventStatus, SessionDraft};
use chrono::NaiveDate;
use event360_core::environment::Clock;
use event360_core::{SmallVec, effect::Effect, reducer::Reducer, smallvec};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Sessions may last between one and eight hours.
pub const SESSION_HOURS: std::ops::RangeInclusive<u32> = 1..=8;

type Effects = SmallVec<[Effect<ComposerAction>; 4]>;

/// State of the event composer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComposerState {
    /// The draft under edit.
    pub draft: EventDraft,

    /// Validation errors from the last rejected add-session or submit.
    pub errors: Vec<FieldError>,

    /// Whether the draft is being saved.
    pub submitting: bool,

    /// Id of the created event, once the backend accepted the draft.
    pub created: Option<EventId>,

    /// Notice shown when the backend rejected the draft.
    pub notice: Option<String>,
}

/// Actions handled by the composer reducer.
#[derive(Debug, Clone, PartialEq)]
pub enum ComposerAction {
    /// Subject input changed.
    SubjectChanged {
        /// New value.
        value: String,
    },

    /// Event category input changed.
    KindChanged {
        /// New value.
        value: String,
    },

    /// Location input changed.
    LocationChanged {
        /// New value.
        value: String,
    },

    /// Venue input changed.
    VenueChanged {
        /// New value.
        value: String,
    },

    /// Description input changed.
    DescriptionChanged {
        /// New value.
        value: String,
    },

    /// Hosting account input changed.
    AccountChanged {
        /// New value.
        value: String,
    },

    /// The all-day checkbox was toggled.
    AllDayToggled,

    /// The Draft/Active choice changed.
    StatusChanged {
        /// New status.
        status: EventStatus,
    },

    /// The start date input changed.
    StartDateChanged {
        /// Raw `YYYY-MM-DD` input; anything else clears the date.
        value: String,
    },

    /// A session row's name changed.
    SessionNameChanged {
        /// Row index.
        index: usize,
        /// New value.
        value: String,
    },

    /// A session row's start changed.
    SessionStartChanged {
        /// Row index.
        index: usize,
        /// Raw `YYYY-MM-DDTHH:MM` input; anything else clears the start.
        value: String,
    },

    /// A session row's duration changed.
    SessionDurationChanged {
        /// Row index.
        index: usize,
        /// Raw hour input; non-numeric input becomes zero and fails
        /// validation.
        raw: String,
    },

    /// A session row's price changed.
    SessionPriceChanged {
        /// Row index.
        index: usize,
        /// Raw dollar input (`25`, `25.50`, `$25`).
        raw: String,
    },

    /// Append a session row after the current last row.
    AddSession,

    /// Remove a session row.
    RemoveSession {
        /// Row index.
        index: usize,
    },

    /// Submit the draft.
    Submit,

    /// The backend accepted the draft.
    Created {
        /// Id of the new event.
        event_id: EventId,
    },

    /// The backend rejected the draft.
    SubmitFailed {
        /// Normalized failure message.
        message: String,
    },
}

/// Environment for the composer feature.
#[derive(Clone)]
pub struct ComposerEnvironment {
    /// Backend gateway accepting created events.
    pub gateway: Arc<dyn EventGateway>,

    /// Clock anchoring the start-date floor.
    pub clock: Arc<dyn Clock>,
}

impl ComposerEnvironment {
    /// Creates a new `ComposerEnvironment`.
    #[must_use]
    pub fn new(gateway: Arc<dyn EventGateway>, clock: Arc<dyn Clock>) -> Self {
        Self { gateway, clock }
    }
}

/// Validate one session row. `index` only shapes the field names.
fn session_row_errors(index: usize, session: &SessionDraft) -> Vec<FieldError> {
    let mut errors = Vec::new();
    if session.name.trim().is_empty() {
        errors.push(FieldError::new(
            format!("session_{index}_name"),
            "Session name is required",
        ));
    }
    if !SESSION_HOURS.contains(&session.duration_hours) {
        errors.push(FieldError::new(
            format!("session_{index}_duration"),
            "Session duration must be between 1 and 8 hours",
        ));
    }
    errors
}

/// Validate the whole draft against the given "today".
#[must_use]
pub fn validate_draft(draft: &EventDraft, today: NaiveDate) -> Vec<FieldError> {
    let mut errors = Vec::new();

    if draft.subject.trim().is_empty() {
        errors.push(FieldError::new("subject", "Event name is required"));
    }

    let tomorrow = today.succ_opt().unwrap_or(NaiveDate::MAX);
    match draft.starts_on {
        None => errors.push(FieldError::new("starts_on", "Pick a start date")),
        Some(date) if date < tomorrow => errors.push(FieldError::new(
            "starts_on",
            "Start date must be tomorrow or later",
        )),
        Some(_) => {}
    }

    for (index, session) in draft.sessions.iter().enumerate() {
        errors.extend(session_row_errors(index, session));
    }

    errors
}

fn parse_start_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").ok()
}

fn parse_session_start(value: &str) -> Option<chrono::DateTime<chrono::Utc>> {
    chrono::NaiveDateTime::parse_from_str(value.trim(), "%Y-%m-%dT%H:%M")
        .ok()
        .map(|naive| naive.and_utc())
}

/// Parse a dollar amount (`25`, `25.5`, `$25.50`) into cents.
/// Unparseable input becomes zero.
fn parse_price_cents(raw: &str) -> u64 {
    let cleaned = raw.trim().trim_start_matches('$');
    match cleaned.split_once('.') {
        None => cleaned
            .parse::<u64>()
            .map_or(0, |dollars| dollars.saturating_mul(100)),
        Some((dollars, fraction)) => {
            let Ok(dollars) = dollars.parse::<u64>() else {
                return 0;
            };
            let mut digits = fraction.chars().filter(char::is_ascii_digit);
            let tens = digits.next().and_then(|c| c.to_digit(10)).unwrap_or(0);
            let ones = digits.next().and_then(|c| c.to_digit(10)).unwrap_or(0);
            dollars
                .saturating_mul(100)
                .saturating_add(u64::from(tens * 10 + ones))
        }
    }
}

/// Reducer driving [`ComposerState`].
#[derive(Clone, Debug, Default)]
pub struct ComposerReducer;

impl ComposerReducer {
    /// Creates a new composer reducer.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn edit_session(
        state: &mut ComposerState,
        index: usize,
        edit: impl FnOnce(&mut SessionDraft),
    ) -> Effects {
        if let Some(session) = state.draft.sessions.get_mut(index) {
            edit(session);
            state.draft.recompute_totals();
        } else {
            debug!(index, "Ignoring edit for a session row that no longer exists");
        }
        smallvec![Effect::None]
    }

    fn add_session(state: &mut ComposerState) -> Effects {
        // The last row must be complete before a new one opens.
        let last_index = state.draft.sessions.len() - 1;
        let errors = state
            .draft
            .sessions
            .last()
            .map(|session| session_row_errors(last_index, session))
            .unwrap_or_default();
        if !errors.is_empty() {
            debug!(count = errors.len(), "Add-session rejected, last row incomplete");
            state.errors = errors;
            return smallvec![Effect::None];
        }

        state.errors.clear();
        state.draft.sessions.push(SessionDraft::default());
        state.draft.recompute_totals();
        smallvec![Effect::None]
    }

    fn remove_session(state: &mut ComposerState, index: usize) -> Effects {
        if state.draft.sessions.len() <= 1 {
            debug!("Remove-session ignored, the draft keeps at least one row");
            return smallvec![Effect::None];
        }
        if index >= state.draft.sessions.len() {
            debug!(index, "Remove-session ignored, no such row");
            return smallvec![Effect::None];
        }
        state.draft.sessions.remove(index);
        state.draft.recompute_totals();
        smallvec![Effect::None]
    }

    fn submit(state: &mut ComposerState, env: &ComposerEnvironment) -> Effects {
        if state.submitting {
            debug!("Submit ignored, the draft is already being saved");
            return smallvec![Effect::None];
        }

        let today = env.clock.now().date_naive();
        let errors = validate_draft(&state.draft, today);
        if !errors.is_empty() {
            debug!(count = errors.len(), "Submit rejected by draft validation");
            state.errors = errors;
            return smallvec![Effect::None];
        }

        state.errors.clear();
        state.notice = None;
        state.submitting = true;
        info!(subject = %state.draft.subject, sessions = state.draft.sessions.len(), "Submitting event draft");

        let gateway = env.gateway.clone();
        let draft = state.draft.clone();
        smallvec![Effect::future(async move {
            match gateway.create_event(draft).await {
                Ok(event_id) => Some(ComposerAction::Created { event_id }),
                Err(error) => Some(ComposerAction::SubmitFailed {
                    message: normalize_remote_error(&error),
                }),
            }
        })]
    }
}

impl Reducer for ComposerReducer {
    type State = ComposerState;
    type Action = ComposerAction;
    type Environment = ComposerEnvironment;

    fn reduce(
        &self,
        state: &mut ComposerState,
        action: ComposerAction,
        env: &ComposerEnvironment,
    ) -> SmallVec<[Effect<ComposerAction>; 4]> {
        match action {
            ComposerAction::SubjectChanged { value } => {
                state.draft.subject = value;
                smallvec![Effect::None]
            }
            ComposerAction::KindChanged { value } => {
                state.draft.kind = value;
                smallvec![Effect::None]
            }
            ComposerAction::LocationChanged { value } => {
                state.draft.location = value;
                smallvec![Effect::None]
            }
            ComposerAction::VenueChanged { value } => {
                state.draft.venue = value;
                smallvec![Effect::None]
            }
            ComposerAction::DescriptionChanged { value } => {
                state.draft.description = value;
                smallvec![Effect::None]
            }
            ComposerAction::AccountChanged { value } => {
                state.draft.account = value;
                smallvec![Effect::None]
            }
            ComposerAction::AllDayToggled => {
                state.draft.all_day = !state.draft.all_day;
                smallvec![Effect::None]
            }
            ComposerAction::StatusChanged { status } => {
                state.draft.status = status;
                smallvec![Effect::None]
            }
            ComposerAction::StartDateChanged { value } => {
                state.draft.starts_on = parse_start_date(&value);
                smallvec![Effect::None]
            }
            ComposerAction::SessionNameChanged { index, value } => {
                Self::edit_session(state, index, |session| session.name = value)
            }
            ComposerAction::SessionStartChanged { index, value } => {
                Self::edit_session(state, index, |session| {
                    session.starts_at = parse_session_start(&value);
                })
            }
            ComposerAction::SessionDurationChanged { index, raw } => {
                Self::edit_session(state, index, |session| {
                    session.duration_hours = raw.trim().parse().unwrap_or(0);
                })
            }
            ComposerAction::SessionPriceChanged { index, raw } => {
                Self::edit_session(state, index, |session| {
                    session.price_cents = parse_price_cents(&raw);
                })
            }
            ComposerAction::AddSession => Self::add_session(state),
            ComposerAction::RemoveSession { index } => Self::remove_session(state, index),
            ComposerAction::Submit => Self::submit(state, env),
            ComposerAction::Created { event_id } => {
                info!(%event_id, "Event created");
                crate::metrics::record_event_created();
                state.submitting = false;
                state.created = Some(event_id);
                smallvec![Effect::None]
            }
            ComposerAction::SubmitFailed { message } => {
                warn!(%message, "Event draft was rejected");
                state.submitting = false;
                state.notice = Some(message);
                smallvec![Effect::None]
            }
        }
    }
}
