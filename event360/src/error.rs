//! Error types shared across the event360 features.
//!
//! Backend failures arrive in several shapes (a list of record-level
//! messages, a single body message, or a bare top-level message). Every
//! feature funnels them through [`normalize_remote_error`] so the notice
//! shown to the user is one flat string regardless of shape.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Fallback shown when a failure carries no usable message at all.
const UNKNOWN_ERROR: &str = "Unknown error";

/// One record-level message inside a structured error body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteErrorRecord {
    /// Human-readable message for this record.
    pub message: String,
}

/// The `body` field of a structured backend error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RemoteErrorDetail {
    /// Several failed records, each with its own message.
    Records(Vec<RemoteErrorRecord>),

    /// A single message object.
    Single {
        /// The message text.
        message: String,
    },
}

/// Structured error payload returned by the backend.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RemoteErrorBody {
    /// Structured detail, when the backend provides one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<RemoteErrorDetail>,

    /// Top-level message, when the backend provides one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl std::fmt::Display for RemoteErrorBody {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", normalize_body(self))
    }
}

/// Failure of a backend call.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GatewayError {
    /// The backend answered with a structured error payload.
    #[error("remote error: {0}")]
    Remote(RemoteErrorBody),

    /// The call never produced a response (connectivity, timeout, ...).
    #[error("transport failure: {0}")]
    Transport(String),
}

impl GatewayError {
    /// Build a remote error carrying a single top-level message.
    #[must_use]
    pub fn message(message: impl Into<String>) -> Self {
        Self::Remote(RemoteErrorBody {
            body: None,
            message: Some(message.into()),
        })
    }

    /// Build a remote error carrying record-level messages.
    #[must_use]
    pub fn records<I, S>(messages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let records = messages
            .into_iter()
            .map(|message| RemoteErrorRecord {
                message: message.into(),
            })
            .collect();
        Self::Remote(RemoteErrorBody {
            body: Some(RemoteErrorDetail::Records(records)),
            message: None,
        })
    }
}

/// Result of a backend call.
pub type GatewayResult<T> = Result<T, GatewayError>;

/// One failed validation rule, addressed to a specific form field.
///
/// Produced by the client-side validation gates (registration form, event
/// composer); never by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    /// Field the error belongs to.
    pub field: String,

    /// Message shown next to the field.
    pub message: String,
}

impl FieldError {
    /// Creates a new field error.
    #[must_use]
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Failure of the check-in ticket scanner.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScanError {
    /// The device has no scanner, or probing never ran.
    #[error("no scanner is available on this device")]
    Unavailable,

    /// The scanner started but the capture failed or was dismissed.
    #[error("scan failed: {0}")]
    Failed(String),
}

/// Flatten a gateway failure into the single string shown to the user.
///
/// Resolution order: record-level messages joined with `", "`, then the
/// single body message, then the top-level message. Blank messages are
/// dropped at every stage. A payload with no usable message falls back to
/// its JSON rendering so the raw shape is at least visible.
#[must_use]
pub fn normalize_remote_error(error: &GatewayError) -> String {
    match error {
        GatewayError::Remote(body) => normalize_body(body),
        GatewayError::Transport(message) => {
            if message.trim().is_empty() {
                UNKNOWN_ERROR.to_string()
            } else {
                message.clone()
            }
        }
    }
}

fn normalize_body(body: &RemoteErrorBody) -> String {
    match &body.body {
        Some(RemoteErrorDetail::Records(records)) => {
            let joined = records
                .iter()
                .map(|record| record.message.as_str())
                .filter(|message| !message.trim().is_empty())
                .collect::<Vec<_>>()
                .join(", ");
            if !joined.is_empty() {
                return joined;
            }
        }
        Some(RemoteErrorDetail::Single { message }) => {
            if !message.trim().is_empty() {
                return message.clone();
            }
        }
        None => {}
    }

    if let Some(message) = &body.message {
        if !message.trim().is_empty() {
            return message.clone();
        }
    }

    serde_json::to_string(body).unwrap_or_else(|_| UNKNOWN_ERROR.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joins_record_messages_with_comma() {
        let error = GatewayError::records(["First problem", "Second problem"]);
        assert_eq!(
            normalize_remote_error(&error),
            "First problem, Second problem"
        );
    }

    #[test]
    fn drops_blank_record_messages() {
        let error = GatewayError::records(["", "Only real message", "   "]);
        assert_eq!(normalize_remote_error(&error), "Only real message");
    }

    #[test]
    fn uses_single_body_message() {
        let error = GatewayError::Remote(RemoteErrorBody {
            body: Some(RemoteErrorDetail::Single {
                message: "Session is full".to_string(),
            }),
            message: None,
        });
        assert_eq!(normalize_remote_error(&error), "Session is full");
    }

    #[test]
    fn falls_back_to_top_level_message() {
        let error = GatewayError::message("Service unavailable");
        assert_eq!(normalize_remote_error(&error), "Service unavailable");
    }

    #[test]
    fn all_blank_messages_render_the_raw_payload() {
        let error = GatewayError::Remote(RemoteErrorBody {
            body: Some(RemoteErrorDetail::Records(vec![RemoteErrorRecord {
                message: String::new(),
            }])),
            message: Some("  ".to_string()),
        });
        let normalized = normalize_remote_error(&error);
        assert!(normalized.contains("message"), "got: {normalized}");
    }

    #[test]
    fn transport_errors_pass_their_message_through() {
        let error = GatewayError::Transport("connection refused".to_string());
        assert_eq!(normalize_remote_error(&error), "connection refused");
    }

    #[test]
    fn blank_transport_errors_fall_back() {
        let error = GatewayError::Transport(String::new());
        assert_eq!(normalize_remote_error(&error), "Unknown error");
    }

    #[test]
    #[allow(clippy::unwrap_used)] // Test code
    fn remote_error_body_deserializes_record_shape() {
        let body: RemoteErrorBody = serde_json::from_str(
            r#"{"body": [{"message": "Duplicate email"}, {"message": "Invalid phone"}]}"#,
        )
        .unwrap();
        assert_eq!(
            normalize_body(&body),
            "Duplicate email, Invalid phone"
        );
    }
}
