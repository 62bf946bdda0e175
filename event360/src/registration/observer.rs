//! Completion notifications for parties outside the registration store.
//!
//! The host page embedding the form (and anything else listening) learns
//! about completed registrations through [`RegistrationObserver`] instead
//! of polling store state. The notification itself is an
//! [`Event`](event360_core::event::Event) so it can be serialized and
//! forwarded across a process boundary by whoever hosts the observer.

use crate::types::BookingId;
use event360_core::event::{Event, SerializedEvent};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Emitted once per completed submission chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistrationCompleted {
    /// Booking reference of the new registration.
    pub booking_id: BookingId,

    /// Extracted QR image URL, absent when the ticket markup was malformed.
    pub qr_url: Option<String>,
}

impl Event for RegistrationCompleted {
    fn event_type(&self) -> &'static str {
        "RegistrationCompleted.v1"
    }
}

/// Listener for completed registrations.
pub trait RegistrationObserver: Send + Sync {
    /// Called after the chain reaches `Done`, once per completion.
    fn registration_completed(
        &self,
        event: RegistrationCompleted,
    ) -> Pin<Box<dyn Future<Output = ()> + Send>>;
}

/// Observer that logs completions and records the business metrics.
#[derive(Clone, Debug, Default)]
pub struct LoggingObserver;

impl LoggingObserver {
    /// Creates a new logging observer.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl RegistrationObserver for LoggingObserver {
    fn registration_completed(
        &self,
        event: RegistrationCompleted,
    ) -> Pin<Box<dyn Future<Output = ()> + Send>> {
        Box::pin(async move {
            match SerializedEvent::from_event(&event, None) {
                Ok(serialized) => tracing::info!(
                    booking_id = %event.booking_id,
                    has_qr = event.qr_url.is_some(),
                    payload_bytes = serialized.data.len(),
                    "Registration completed"
                ),
                Err(error) => tracing::warn!(
                    booking_id = %event.booking_id,
                    %error,
                    "Registration completed but the notification could not be serialized"
                ),
            }
        })
    }
}

/// Observer that stores every notification, for tests.
#[derive(Debug, Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<RegistrationCompleted>>,
}

impl RecordingObserver {
    /// Creates an empty recording observer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Every notification received so far, in order.
    #[must_use]
    pub fn events(&self) -> Vec<RegistrationCompleted> {
        self.lock().clone()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<RegistrationCompleted>> {
        self.events.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl RegistrationObserver for RecordingObserver {
    fn registration_completed(
        &self,
        event: RegistrationCompleted,
    ) -> Pin<Box<dyn Future<Output = ()> + Send>> {
        self.lock().push(event);
        Box::pin(async {})
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn recording_observer_keeps_notifications_in_order() {
        let observer = RecordingObserver::new();
        observer
            .registration_completed(RegistrationCompleted {
                booking_id: BookingId::new("BK-1"),
                qr_url: Some("https://qr.example/t/1".to_string()),
            })
            .await;
        observer
            .registration_completed(RegistrationCompleted {
                booking_id: BookingId::new("BK-2"),
                qr_url: None,
            })
            .await;

        let events = observer.events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].booking_id, BookingId::new("BK-1"));
        assert_eq!(events[1].qr_url, None);
    }

    #[test]
    #[allow(clippy::expect_used)] // Panics: Test will fail if serialization fails
    fn completion_event_serializes_round_trip() {
        let event = RegistrationCompleted {
            booking_id: BookingId::new("BK-9"),
            qr_url: Some("https://qr.example/t/9?a=1&b=2".to_string()),
        };

        assert_eq!(event.event_type(), "RegistrationCompleted.v1");
        let bytes = event.to_bytes().expect("serialization should succeed");
        let restored =
            RegistrationCompleted::from_bytes(&bytes).expect("deserialization should succeed");
        assert_eq!(event, restored);
    }
}
