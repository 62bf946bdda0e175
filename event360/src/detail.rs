//! Event detail: one event's display record plus its session schedule.
//!
//! The record and the sessions live behind different backend calls, so
//! `Load` fans both out in parallel and the state counts outstanding
//! answers instead of holding a single loading flag.

use crate::error::normalize_remote_error;
use crate::gateway::EventGateway;
use crate::types::{EventId, EventSummary, SessionOption};
use event360_core::{SmallVec, effect::Effect, reducer::Reducer, smallvec};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

type Effects = SmallVec<[Effect<DetailAction>; 4]>;

/// State of the event detail page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetailState {
    /// Event being shown.
    pub event_id: EventId,

    /// The display record, once it arrived.
    pub event: Option<EventSummary>,

    /// The event's sessions, once they arrived.
    pub sessions: Vec<SessionOption>,

    /// Outstanding answers of the current load (two right after `Load`).
    pub pending: u8,

    /// Notice shown when a part of the page could not be loaded.
    pub notice: Option<String>,
}

impl DetailState {
    /// Fresh state for one event.
    #[must_use]
    pub fn new(event_id: EventId) -> Self {
        Self {
            event_id,
            event: None,
            sessions: Vec::new(),
            pending: 0,
            notice: None,
        }
    }

    /// Whether any part of the page is still loading.
    #[must_use]
    pub const fn loading(&self) -> bool {
        self.pending > 0
    }
}

/// Actions handled by the detail reducer.
#[derive(Debug, Clone, PartialEq)]
pub enum DetailAction {
    /// Load the record and the sessions.
    Load,

    /// The display record arrived.
    EventLoaded {
        /// The record.
        event: EventSummary,
    },

    /// The sessions arrived.
    SessionsLoaded {
        /// The schedule.
        options: Vec<SessionOption>,
    },

    /// One of the two requests failed.
    LoadFailed {
        /// Normalized failure message.
        message: String,
    },
}

/// Environment for the detail feature.
#[derive(Clone)]
pub struct DetailEnvironment {
    /// Backend gateway serving the record and the sessions.
    pub gateway: Arc<dyn EventGateway>,
}

impl DetailEnvironment {
    /// Creates a new `DetailEnvironment`.
    #[must_use]
    pub fn new(gateway: Arc<dyn EventGateway>) -> Self {
        Self { gateway }
    }
}

/// Reducer driving [`DetailState`].
#[derive(Clone, Debug, Default)]
pub struct DetailReducer;

impl DetailReducer {
    /// Creates a new detail reducer.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Reducer for DetailReducer {
    type State = DetailState;
    type Action = DetailAction;
    type Environment = DetailEnvironment;

    fn reduce(
        &self,
        state: &mut DetailState,
        action: DetailAction,
        env: &DetailEnvironment,
    ) -> SmallVec<[Effect<DetailAction>; 4]> {
        match action {
            DetailAction::Load => {
                let event_id = state.event_id.clone();
                debug!(%event_id, "Loading event detail");
                state.pending = 2;
                state.notice = None;

                let record_gateway = env.gateway.clone();
                let record_id = event_id.clone();
                let record = Effect::future(async move {
                    match record_gateway.event_by_id(record_id).await {
                        Ok(event) => Some(DetailAction::EventLoaded { event }),
                        Err(error) => Some(DetailAction::LoadFailed {
                            message: normalize_remote_error(&error),
                        }),
                    }
                });

                let sessions_gateway = env.gateway.clone();
                let sessions = Effect::future(async move {
                    match sessions_gateway.sessions_for_event(event_id).await {
                        Ok(options) => Some(DetailAction::SessionsLoaded { options }),
                        Err(error) => Some(DetailAction::LoadFailed {
                            message: normalize_remote_error(&error),
                        }),
                    }
                });

                smallvec![Effect::merge(vec![record, sessions])]
            }
            DetailAction::EventLoaded { event } => {
                debug!(event_id = %event.id, "Event record loaded");
                state.pending = state.pending.saturating_sub(1);
                state.event = Some(event);
                smallvec![Effect::None]
            }
            DetailAction::SessionsLoaded { options } => {
                debug!(count = options.len(), "Event sessions loaded");
                state.pending = state.pending.saturating_sub(1);
                state.sessions = options;
                smallvec![Effect::None]
            }
            DetailAction::LoadFailed { message } => {
                warn!(%message, "Event detail failed to load");
                state.pending = state.pending.saturating_sub(1);
                state.notice = Some(message);
                smallvec![Effect::None]
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)] // Test code
mod tests {
    use super::*;
    use crate::error::GatewayError;
    use crate::gateway::{GatewayCall, MockGateway};
    use crate::types::SessionId;
    use event360_testing::{ReducerTest, reducer_test::assertions};

    fn summary() -> EventSummary {
        EventSummary {
            id: EventId::new("EV-1"),
            name: "Rust Forward Conference".to_string(),
            starts_at: None,
            duration_minutes: 240,
            location: "Berlin".to_string(),
            price_cents: 2500,
            image_url: None,
        }
    }

    fn sessions() -> Vec<SessionOption> {
        vec![SessionOption {
            id: SessionId::new("S-1"),
            label: "Opening Keynote".to_string(),
            starts_at: None,
            duration_hours: Some(1),
        }]
    }

    fn env_with(gateway: MockGateway) -> (DetailEnvironment, std::sync::Arc<MockGateway>) {
        let gateway = std::sync::Arc::new(gateway);
        (DetailEnvironment::new(gateway.clone()), gateway)
    }

    /// Await every future effect, flattening one level of parallel fan-out.
    async fn drive_all(effects: Effects) -> Vec<DetailAction> {
        let mut actions = Vec::new();
        for effect in effects {
            match effect {
                Effect::Future(future) => {
                    if let Some(action) = future.await {
                        actions.push(action);
                    }
                }
                Effect::Parallel(children) | Effect::Sequential(children) => {
                    for child in children {
                        if let Effect::Future(future) = child {
                            if let Some(action) = future.await {
                                actions.push(action);
                            }
                        }
                    }
                }
                _ => {}
            }
        }
        actions
    }

    #[test]
    fn load_fans_out_record_and_sessions_in_parallel() {
        let (env, _) = env_with(
            MockGateway::new()
                .with_event(Ok(summary()))
                .with_sessions(Ok(sessions())),
        );

        ReducerTest::new(DetailReducer::new())
            .with_env(env)
            .given_state(DetailState::new(EventId::new("EV-1")))
            .when_action(DetailAction::Load)
            .then_state(|state| {
                assert_eq!(state.pending, 2);
                assert!(state.loading());
            })
            .then_effects(|effects| assertions::assert_has_parallel_effect(effects))
            .run();
    }

    #[tokio::test]
    async fn both_answers_fill_the_page() {
        let (env, gateway) = env_with(
            MockGateway::new()
                .with_event(Ok(summary()))
                .with_sessions(Ok(sessions())),
        );
        let reducer = DetailReducer::new();
        let mut state = DetailState::new(EventId::new("EV-1"));

        let effects = reducer.reduce(&mut state, DetailAction::Load, &env);
        for feedback in drive_all(effects).await {
            reducer.reduce(&mut state, feedback, &env);
        }

        assert_eq!(state.event.as_ref().map(|event| event.display_price()), Some("$25".to_string()));
        assert_eq!(state.sessions.len(), 1);
        assert!(!state.loading());
        assert_eq!(state.notice, None);

        let calls = gateway.calls();
        assert!(calls.contains(&GatewayCall::EventById {
            event_id: EventId::new("EV-1")
        }));
        assert!(calls.contains(&GatewayCall::SessionsForEvent {
            event_id: EventId::new("EV-1")
        }));
    }

    #[tokio::test]
    async fn a_missing_record_leaves_a_notice_but_keeps_the_sessions() {
        let (env, _) = env_with(
            MockGateway::new()
                .with_event(Err(GatewayError::message("No such event")))
                .with_sessions(Ok(sessions())),
        );
        let reducer = DetailReducer::new();
        let mut state = DetailState::new(EventId::new("EV-404"));

        let effects = reducer.reduce(&mut state, DetailAction::Load, &env);
        for feedback in drive_all(effects).await {
            reducer.reduce(&mut state, feedback, &env);
        }

        assert_eq!(state.event, None);
        assert_eq!(state.notice.as_deref(), Some("No such event"));
        assert_eq!(state.sessions.len(), 1);
        assert!(!state.loading());
    }
}
