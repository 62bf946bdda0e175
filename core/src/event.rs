//! Event trait and related types for workflow notifications.
//!
//! Events represent facts about things that have happened (a registration
//! completed, a ticket was issued) and are immutable. Observers receive them
//! through explicit callback interfaces; the serialized form exists so a
//! notification can cross a process boundary without the observer knowing
//! the concrete Rust type.
//!
//! Events are serialized with `bincode`: compact, fast, and sufficient since
//! every producer and consumer in this workspace is Rust.
//!
//! # Example
//!
//! ```
//! use event360_core::event::Event;
//! use serde::{Serialize, Deserialize};
//!
//! #[derive(Clone, Debug, Serialize, Deserialize)]
//! enum RegistrationEvent {
//!     Completed { booking_id: String, qr_url: Option<String> },
//!     EmailSent { contact_id: String },
//! }
//!
//! impl Event for RegistrationEvent {
//!     fn event_type(&self) -> &'static str {
//!         match self {
//!             RegistrationEvent::Completed { .. } => "RegistrationCompleted.v1",
//!             RegistrationEvent::EmailSent { .. } => "RegistrationEmailSent.v1",
//!         }
//!     }
//! }
//! ```

use serde::{Serialize, de::DeserializeOwned};
use std::fmt;
use thiserror::Error;

/// Error types for event operations.
#[derive(Error, Debug)]
pub enum EventError {
    /// Failed to serialize event to bytes.
    #[error("Failed to serialize event: {0}")]
    SerializationError(String),

    /// Failed to deserialize event from bytes.
    #[error("Failed to deserialize event: {0}")]
    DeserializationError(String),

    /// Unknown event type encountered during deserialization.
    #[error("Unknown event type: {0}")]
    UnknownEventType(String),
}

/// An immutable fact emitted by a workflow.
///
/// # Event Naming Convention
///
/// `event_type()` returns a stable string identifier that includes a version
/// suffix, allowing schema evolution over time:
///
/// - `"RegistrationCompleted.v1"`
/// - `"CommunityRegistrationSubmitted.v1"`
///
/// # Thread Safety
///
/// Events must be `Send + Sync + 'static` to be safely passed between tasks
/// in the async runtime.
pub trait Event: Send + Sync + 'static {
    /// Returns the stable type identifier for this event.
    fn event_type(&self) -> &'static str;

    /// Serialize this event to bincode bytes.
    ///
    /// # Errors
    ///
    /// Returns `EventError::SerializationError` if the event cannot be
    /// serialized. Rare with bincode, but possible for unsupported types.
    fn to_bytes(&self) -> Result<Vec<u8>, EventError>
    where
        Self: Serialize,
    {
        bincode::serialize(self).map_err(|e| EventError::SerializationError(e.to_string()))
    }

    /// Deserialize an event from bincode bytes.
    ///
    /// # Errors
    ///
    /// Returns `EventError::DeserializationError` if the bytes are corrupted,
    /// belong to a different event type, or the schema changed incompatibly.
    fn from_bytes(bytes: &[u8]) -> Result<Self, EventError>
    where
        Self: DeserializeOwned + Sized,
    {
        bincode::deserialize(bytes).map_err(|e| EventError::DeserializationError(e.to_string()))
    }
}

/// A serialized event ready to cross a process boundary.
///
/// Contains the event type name and the serialized bytes, along with
/// optional metadata.
#[derive(Clone, Debug)]
pub struct SerializedEvent {
    /// The event type identifier (e.g., `"RegistrationCompleted.v1"`).
    pub event_type: String,

    /// The bincode-serialized event data.
    pub data: Vec<u8>,

    /// Optional metadata.
    ///
    /// Common fields:
    /// - `correlation_id`: links related notifications
    /// - `timestamp`: when the event was created (ISO 8601)
    pub metadata: Option<serde_json::Value>,
}

impl SerializedEvent {
    /// Create a new serialized event.
    #[must_use]
    pub const fn new(
        event_type: String,
        data: Vec<u8>,
        metadata: Option<serde_json::Value>,
    ) -> Self {
        Self {
            event_type,
            data,
            metadata,
        }
    }

    /// Create a serialized event from an [`Event`] value.
    ///
    /// # Errors
    ///
    /// Returns `EventError::SerializationError` if the event cannot be
    /// serialized.
    ///
    /// # Examples
    ///
    /// ```
    /// use event360_core::event::{Event, SerializedEvent};
    /// # use serde::{Serialize, Deserialize};
    /// # #[derive(Clone, Debug, Serialize, Deserialize)]
    /// # enum RegistrationEvent {
    /// #     Completed { booking_id: String },
    /// # }
    /// # impl Event for RegistrationEvent {
    /// #     fn event_type(&self) -> &'static str { "RegistrationCompleted.v1" }
    /// # }
    ///
    /// let event = RegistrationEvent::Completed {
    ///     booking_id: "B-1042".to_string(),
    /// };
    ///
    /// let serialized = SerializedEvent::from_event(&event, None).unwrap();
    /// assert_eq!(serialized.event_type, "RegistrationCompleted.v1");
    /// ```
    pub fn from_event<E: Event + Serialize>(
        event: &E,
        metadata: Option<serde_json::Value>,
    ) -> Result<Self, EventError> {
        Ok(Self {
            event_type: event.event_type().to_string(),
            data: event.to_bytes()?,
            metadata,
        })
    }
}

impl fmt::Display for SerializedEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SerializedEvent {{ type: {}, size: {} bytes }}",
            self.event_type,
            self.data.len()
        )
    }
}
