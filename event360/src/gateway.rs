//! Backend gateway for event marketing operations.
//!
//! Every feature reaches the backend through [`EventGateway`], an
//! abstraction over the remote API that serves events, sessions,
//! registrations and ticket QR codes. Two implementations live here:
//! [`DemoGateway`], an always-succeeding in-process backend used by the
//! demo binary, and [`MockGateway`], a scripted gateway for tests that
//! records every call it receives.

use crate::error::{GatewayError, GatewayResult};
use crate::types::{
    BookingId, CommunityRegistrationRequest, ContactId, EventDraft, EventId, EventSummary,
    PriceFilter, RegistrationRequest, SessionId, SessionOption,
};
use chrono::{Duration as ChronoDuration, Utc};
use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// Boxed future returned by gateway calls.
pub type GatewayFuture<T> = Pin<Box<dyn Future<Output = GatewayResult<T>> + Send>>;

/// Ticket QR payload returned after a registration is saved.
#[derive(Debug, Clone, PartialEq)]
pub struct QrPayload {
    /// Raw markup (or bare URL) carrying the QR image location.
    pub ticket_markup: String,

    /// Event name printed on the receipt.
    pub event_name: String,

    /// Booking reference printed on the receipt.
    pub booking_id: BookingId,
}

/// Remote API serving events, sessions and registrations.
///
/// Implementations must be cheap to clone behind an `Arc`; reducers move a
/// clone of the gateway into each effect future they build.
pub trait EventGateway: Send + Sync {
    /// Fetch the selectable sessions of an event.
    ///
    /// # Errors
    ///
    /// Returns an error when the backend rejects the request or is
    /// unreachable.
    fn sessions_for_event(&self, event_id: EventId) -> GatewayFuture<Vec<SessionOption>>;

    /// Save a registration and return the contact id that keys the rest of
    /// the submission chain.
    ///
    /// # Errors
    ///
    /// Returns an error when the registration cannot be saved.
    fn save_registration(&self, request: RegistrationRequest) -> GatewayFuture<ContactId>;

    /// Fetch the ticket QR payload for a saved registration.
    ///
    /// # Errors
    ///
    /// Returns an error when no ticket exists for the contact or the
    /// backend is unreachable.
    fn qr_for_registration(&self, contact_id: ContactId) -> GatewayFuture<QrPayload>;

    /// Send the confirmation email, attaching the QR image when one was
    /// extracted.
    ///
    /// # Errors
    ///
    /// Returns an error when the email cannot be queued.
    fn send_registration_email(
        &self,
        contact_id: ContactId,
        qr_url: Option<String>,
    ) -> GatewayFuture<()>;

    /// Fetch one page of the public event listing.
    ///
    /// # Errors
    ///
    /// Returns an error when the listing cannot be served.
    fn events_page(
        &self,
        offset: usize,
        limit: usize,
        filter: PriceFilter,
    ) -> GatewayFuture<Vec<EventSummary>>;

    /// Fetch a single event by id.
    ///
    /// # Errors
    ///
    /// Returns an error when the event does not exist or the backend is
    /// unreachable.
    fn event_by_id(&self, event_id: EventId) -> GatewayFuture<EventSummary>;

    /// Create an event from a validated composer draft.
    ///
    /// # Errors
    ///
    /// Returns an error when the backend rejects the draft.
    fn create_event(&self, draft: EventDraft) -> GatewayFuture<EventId>;

    /// Check whether an email address already has a community registration.
    ///
    /// # Errors
    ///
    /// Returns an error when the lookup fails.
    fn is_email_registered(&self, email: String) -> GatewayFuture<bool>;

    /// Save a community (newsletter) registration.
    ///
    /// # Errors
    ///
    /// Returns an error when the registration cannot be saved.
    fn save_community_registration(
        &self,
        request: CommunityRegistrationRequest,
    ) -> GatewayFuture<ContactId>;
}

/// In-process backend that always succeeds, for development and demos.
///
/// Serves a small canned catalog and fabricates ids, with a short delay on
/// every call so effect execution stays observable in logs.
#[derive(Clone, Debug)]
pub struct DemoGateway;

impl DemoGateway {
    /// Simulated network latency applied to every call.
    const LATENCY: Duration = Duration::from_millis(50);

    /// Creates a new demo gateway.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Creates an Arc-wrapped instance for sharing.
    #[must_use]
    pub fn shared() -> Arc<dyn EventGateway> {
        Arc::new(Self::new())
    }

    fn canned_events() -> Vec<EventSummary> {
        let base = Utc::now() + ChronoDuration::days(7);
        let names = [
            ("Rust Forward Conference", 2500_u64, "Berlin"),
            ("Community Hack Night", 0, "Leipzig"),
            ("Systems Programming Workshop", 4000, "Munich"),
            ("Open Source Social", 0, "Hamburg"),
            ("Embedded Deep Dive", 5550, "Dresden"),
            ("Web Services Summit", 3000, "Cologne"),
            ("Compiler Internals Meetup", 0, "Berlin"),
            ("Async Runtime Clinic", 1500, "Stuttgart"),
            ("Observability Day", 2000, "Frankfurt"),
        ];
        (0_i64..)
            .zip(names)
            .map(|(index, (name, price_cents, location))| EventSummary {
                id: EventId::new(format!("EV-{:03}", index + 1)),
                name: name.to_string(),
                starts_at: Some(base + ChronoDuration::days(index)),
                duration_minutes: 120,
                location: location.to_string(),
                price_cents,
                image_url: Some(format!(
                    "https://images.event360.example/banners/{:03}.png",
                    index + 1
                )),
            })
            .collect()
    }

    fn matches_filter(event: &EventSummary, filter: PriceFilter) -> bool {
        match filter {
            PriceFilter::All => true,
            PriceFilter::Free => event.price_cents == 0,
            PriceFilter::Paid => event.price_cents > 0,
        }
    }
}

impl Default for DemoGateway {
    fn default() -> Self {
        Self::new()
    }
}

impl EventGateway for DemoGateway {
    fn sessions_for_event(&self, event_id: EventId) -> GatewayFuture<Vec<SessionOption>> {
        Box::pin(async move {
            tokio::time::sleep(Self::LATENCY).await;

            let base = Utc::now() + ChronoDuration::days(7);
            let sessions = vec![
                SessionOption {
                    id: SessionId::new(format!("{event_id}-S1")),
                    label: "Opening Keynote".to_string(),
                    starts_at: Some(base),
                    duration_hours: Some(1),
                },
                SessionOption {
                    id: SessionId::new(format!("{event_id}-S2")),
                    label: "Hands-on Workshop".to_string(),
                    starts_at: Some(base + ChronoDuration::hours(2)),
                    duration_hours: Some(3),
                },
                SessionOption {
                    id: SessionId::new(format!("{event_id}-S3")),
                    label: "Community Social".to_string(),
                    starts_at: Some(base + ChronoDuration::hours(6)),
                    duration_hours: Some(2),
                },
            ];

            tracing::info!(%event_id, count = sessions.len(), "Demo gateway served sessions");
            Ok(sessions)
        })
    }

    fn save_registration(&self, request: RegistrationRequest) -> GatewayFuture<ContactId> {
        Box::pin(async move {
            tokio::time::sleep(Self::LATENCY).await;

            let contact_id = ContactId::new(format!("contact_{}", uuid::Uuid::new_v4()));
            tracing::info!(
                email = %request.email,
                quantity = request.quantity,
                contact_id = %contact_id,
                "Demo gateway saved registration"
            );
            Ok(contact_id)
        })
    }

    fn qr_for_registration(&self, contact_id: ContactId) -> GatewayFuture<QrPayload> {
        Box::pin(async move {
            tokio::time::sleep(Self::LATENCY).await;

            let booking_id = BookingId::new(format!(
                "BK-{}",
                uuid::Uuid::new_v4().simple().to_string()[..8].to_uppercase()
            ));
            let ticket_markup = format!(
                r#"<img src="https://tickets.event360.example/qr?c={contact_id}&amp;size=m" alt="ticket">"#
            );

            tracing::info!(%contact_id, %booking_id, "Demo gateway rendered ticket QR");
            Ok(QrPayload {
                ticket_markup,
                event_name: "Event360 Developer Days".to_string(),
                booking_id,
            })
        })
    }

    fn send_registration_email(
        &self,
        contact_id: ContactId,
        qr_url: Option<String>,
    ) -> GatewayFuture<()> {
        Box::pin(async move {
            tokio::time::sleep(Self::LATENCY).await;

            tracing::info!(
                %contact_id,
                has_qr = qr_url.is_some(),
                "Demo gateway queued confirmation email"
            );
            Ok(())
        })
    }

    fn events_page(
        &self,
        offset: usize,
        limit: usize,
        filter: PriceFilter,
    ) -> GatewayFuture<Vec<EventSummary>> {
        Box::pin(async move {
            tokio::time::sleep(Self::LATENCY).await;

            let page: Vec<EventSummary> = Self::canned_events()
                .into_iter()
                .filter(|event| Self::matches_filter(event, filter))
                .skip(offset)
                .take(limit)
                .collect();

            tracing::info!(offset, limit, %filter, rows = page.len(), "Demo gateway served listing page");
            Ok(page)
        })
    }

    fn event_by_id(&self, event_id: EventId) -> GatewayFuture<EventSummary> {
        Box::pin(async move {
            tokio::time::sleep(Self::LATENCY).await;

            let found = Self::canned_events()
                .into_iter()
                .find(|event| event.id == event_id);
            match found {
                Some(event) => Ok(event),
                None => Err(GatewayError::message(format!(
                    "No event found for id {event_id}"
                ))),
            }
        })
    }

    fn create_event(&self, draft: EventDraft) -> GatewayFuture<EventId> {
        Box::pin(async move {
            tokio::time::sleep(Self::LATENCY).await;

            let event_id = EventId::new(format!(
                "EV-{}",
                uuid::Uuid::new_v4().simple().to_string()[..8].to_uppercase()
            ));
            tracing::info!(
                subject = %draft.subject,
                sessions = draft.sessions.len(),
                %event_id,
                "Demo gateway created event"
            );
            Ok(event_id)
        })
    }

    fn is_email_registered(&self, email: String) -> GatewayFuture<bool> {
        Box::pin(async move {
            tokio::time::sleep(Self::LATENCY).await;

            // Deterministic hook so demos can exercise the duplicate path.
            let registered = email.ends_with("@taken.example");
            tracing::info!(%email, registered, "Demo gateway checked community email");
            Ok(registered)
        })
    }

    fn save_community_registration(
        &self,
        request: CommunityRegistrationRequest,
    ) -> GatewayFuture<ContactId> {
        Box::pin(async move {
            tokio::time::sleep(Self::LATENCY).await;

            let contact_id = ContactId::new(format!("community_{}", uuid::Uuid::new_v4()));
            tracing::info!(
                email = %request.email,
                contact_id = %contact_id,
                "Demo gateway saved community registration"
            );
            Ok(contact_id)
        })
    }
}

/// One recorded invocation of the [`MockGateway`].
#[derive(Debug, Clone, PartialEq)]
pub enum GatewayCall {
    /// `sessions_for_event` was called.
    SessionsForEvent {
        /// Requested event.
        event_id: EventId,
    },

    /// `save_registration` was called.
    SaveRegistration {
        /// The submitted form snapshot.
        request: RegistrationRequest,
    },

    /// `qr_for_registration` was called.
    QrForRegistration {
        /// Contact the QR was requested for.
        contact_id: ContactId,
    },

    /// `send_registration_email` was called.
    SendRegistrationEmail {
        /// Contact the email was addressed to.
        contact_id: ContactId,
        /// QR image URL attached to the email, if any.
        qr_url: Option<String>,
    },

    /// `events_page` was called.
    EventsPage {
        /// Requested offset.
        offset: usize,
        /// Requested page size.
        limit: usize,
        /// Requested price facet.
        filter: PriceFilter,
    },

    /// `event_by_id` was called.
    EventById {
        /// Requested event.
        event_id: EventId,
    },

    /// `create_event` was called.
    CreateEvent {
        /// The submitted draft.
        draft: EventDraft,
    },

    /// `is_email_registered` was called.
    IsEmailRegistered {
        /// Checked address.
        email: String,
    },

    /// `save_community_registration` was called.
    SaveCommunityRegistration {
        /// The submitted community signup.
        request: CommunityRegistrationRequest,
    },
}

#[derive(Debug, Default)]
struct MockGatewayState {
    sessions: VecDeque<GatewayResult<Vec<SessionOption>>>,
    registrations: VecDeque<GatewayResult<ContactId>>,
    qr_codes: VecDeque<GatewayResult<QrPayload>>,
    emails: VecDeque<GatewayResult<()>>,
    pages: VecDeque<GatewayResult<Vec<EventSummary>>>,
    events: VecDeque<GatewayResult<EventSummary>>,
    created: VecDeque<GatewayResult<EventId>>,
    email_checks: VecDeque<GatewayResult<bool>>,
    community: VecDeque<GatewayResult<ContactId>>,
    calls: Vec<GatewayCall>,
}

/// Scripted gateway for tests.
///
/// Results are queued per operation with the `with_*` builders and handed
/// out in FIFO order; a call with no scripted result resolves to a
/// transport error so the leak is visible in the test. Every invocation is
/// recorded and can be inspected through [`MockGateway::calls`].
#[derive(Debug, Default)]
pub struct MockGateway {
    state: Mutex<MockGatewayState>,
    latency: Option<Duration>,
}

impl MockGateway {
    /// Creates an empty mock with no scripted results.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every call by `latency` before resolving. Lets tests hold a
    /// chain in flight long enough to observe intermediate phases.
    #[must_use]
    pub const fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Queue a result for `sessions_for_event`.
    #[must_use]
    pub fn with_sessions(self, result: GatewayResult<Vec<SessionOption>>) -> Self {
        self.lock().sessions.push_back(result);
        self
    }

    /// Queue a result for `save_registration`.
    #[must_use]
    pub fn with_registration(self, result: GatewayResult<ContactId>) -> Self {
        self.lock().registrations.push_back(result);
        self
    }

    /// Queue a result for `qr_for_registration`.
    #[must_use]
    pub fn with_qr(self, result: GatewayResult<QrPayload>) -> Self {
        self.lock().qr_codes.push_back(result);
        self
    }

    /// Queue a result for `send_registration_email`.
    #[must_use]
    pub fn with_email(self, result: GatewayResult<()>) -> Self {
        self.lock().emails.push_back(result);
        self
    }

    /// Queue a result for `events_page`.
    #[must_use]
    pub fn with_page(self, result: GatewayResult<Vec<EventSummary>>) -> Self {
        self.lock().pages.push_back(result);
        self
    }

    /// Queue a result for `event_by_id`.
    #[must_use]
    pub fn with_event(self, result: GatewayResult<EventSummary>) -> Self {
        self.lock().events.push_back(result);
        self
    }

    /// Queue a result for `create_event`.
    #[must_use]
    pub fn with_created(self, result: GatewayResult<EventId>) -> Self {
        self.lock().created.push_back(result);
        self
    }

    /// Queue a result for `is_email_registered`.
    #[must_use]
    pub fn with_email_check(self, result: GatewayResult<bool>) -> Self {
        self.lock().email_checks.push_back(result);
        self
    }

    /// Queue a result for `save_community_registration`.
    #[must_use]
    pub fn with_community(self, result: GatewayResult<ContactId>) -> Self {
        self.lock().community.push_back(result);
        self
    }

    /// Every call received so far, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<GatewayCall> {
        self.lock().calls.clone()
    }

    /// Number of `save_registration` calls received so far.
    #[must_use]
    pub fn registration_calls(&self) -> usize {
        self.lock()
            .calls
            .iter()
            .filter(|call| matches!(call, GatewayCall::SaveRegistration { .. }))
            .count()
    }

    fn lock(&self) -> MutexGuard<'_, MockGatewayState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn deliver<T>(&self, result: GatewayResult<T>) -> GatewayFuture<T>
    where
        T: Send + 'static,
    {
        let latency = self.latency;
        Box::pin(async move {
            if let Some(delay) = latency {
                tokio::time::sleep(delay).await;
            }
            result
        })
    }
}

fn unscripted<T>(operation: &str) -> GatewayResult<T> {
    Err(GatewayError::Transport(format!(
        "no scripted {operation} result"
    )))
}

impl EventGateway for MockGateway {
    fn sessions_for_event(&self, event_id: EventId) -> GatewayFuture<Vec<SessionOption>> {
        let result = {
            let mut state = self.lock();
            state.calls.push(GatewayCall::SessionsForEvent { event_id });
            state.sessions.pop_front()
        }
        .unwrap_or_else(|| unscripted("sessions_for_event"));
        self.deliver(result)
    }

    fn save_registration(&self, request: RegistrationRequest) -> GatewayFuture<ContactId> {
        let result = {
            let mut state = self.lock();
            state.calls.push(GatewayCall::SaveRegistration { request });
            state.registrations.pop_front()
        }
        .unwrap_or_else(|| unscripted("save_registration"));
        self.deliver(result)
    }

    fn qr_for_registration(&self, contact_id: ContactId) -> GatewayFuture<QrPayload> {
        let result = {
            let mut state = self.lock();
            state.calls.push(GatewayCall::QrForRegistration { contact_id });
            state.qr_codes.pop_front()
        }
        .unwrap_or_else(|| unscripted("qr_for_registration"));
        self.deliver(result)
    }

    fn send_registration_email(
        &self,
        contact_id: ContactId,
        qr_url: Option<String>,
    ) -> GatewayFuture<()> {
        let result = {
            let mut state = self.lock();
            state
                .calls
                .push(GatewayCall::SendRegistrationEmail { contact_id, qr_url });
            state.emails.pop_front()
        }
        .unwrap_or_else(|| unscripted("send_registration_email"));
        self.deliver(result)
    }

    fn events_page(
        &self,
        offset: usize,
        limit: usize,
        filter: PriceFilter,
    ) -> GatewayFuture<Vec<EventSummary>> {
        let result = {
            let mut state = self.lock();
            state.calls.push(GatewayCall::EventsPage {
                offset,
                limit,
                filter,
            });
            state.pages.pop_front()
        }
        .unwrap_or_else(|| unscripted("events_page"));
        self.deliver(result)
    }

    fn event_by_id(&self, event_id: EventId) -> GatewayFuture<EventSummary> {
        let result = {
            let mut state = self.lock();
            state.calls.push(GatewayCall::EventById { event_id });
            state.events.pop_front()
        }
        .unwrap_or_else(|| unscripted("event_by_id"));
        self.deliver(result)
    }

    fn create_event(&self, draft: EventDraft) -> GatewayFuture<EventId> {
        let result = {
            let mut state = self.lock();
            state.calls.push(GatewayCall::CreateEvent { draft });
            state.created.pop_front()
        }
        .unwrap_or_else(|| unscripted("create_event"));
        self.deliver(result)
    }

    fn is_email_registered(&self, email: String) -> GatewayFuture<bool> {
        let result = {
            let mut state = self.lock();
            state.calls.push(GatewayCall::IsEmailRegistered { email });
            state.email_checks.pop_front()
        }
        .unwrap_or_else(|| unscripted("is_email_registered"));
        self.deliver(result)
    }

    fn save_community_registration(
        &self,
        request: CommunityRegistrationRequest,
    ) -> GatewayFuture<ContactId> {
        let result = {
            let mut state = self.lock();
            state
                .calls
                .push(GatewayCall::SaveCommunityRegistration { request });
            state.community.pop_front()
        }
        .unwrap_or_else(|| unscripted("save_community_registration"));
        self.deliver(result)
    }
}
