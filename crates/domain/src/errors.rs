//! Error types used throughout the client

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::ListId;

/// Logical step of a multi-call operation, attached to remote and network
/// failures so callers can decide on cleanup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "step", rename_all = "kebab-case")]
pub enum RequestStep {
    /// Creating the list that will own the search results
    ListCreate,
    /// Creating the search job; `list_id` is the list created just before
    JobCreate { list_id: ListId },
    /// Fetching a search job snapshot
    JobFetch,
    /// Cancelling a search job
    JobCancel,
}

impl RequestStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ListCreate => "list-create",
            Self::JobCreate { .. } => "job-create",
            Self::JobFetch => "job-fetch",
            Self::JobCancel => "job-cancel",
        }
    }
}

impl fmt::Display for RequestStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Main error type for the Risma client
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "details")]
pub enum ClientError {
    /// Input rejected locally before any network call. Never transmitted.
    #[error("Invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    /// The remote service answered with a non-2xx status.
    #[error("Remote error{}: status {status}{}", step_suffix(.step), body_suffix(.body))]
    Remote { status: u16, body: String, step: Option<RequestStep> },

    /// The session could not be restored; the credential has been cleared.
    #[error("Authentication expired")]
    AuthExpired,

    /// A search job status outside the known set.
    #[error("Unknown search job status: {0}")]
    UnknownStatus(String),

    /// Transport-level failure (timeout, connection reset, DNS).
    #[error("Network error{}: {message}", step_suffix(.step))]
    Network { message: String, step: Option<RequestStep> },

    /// The remote service reported an impossible state sequence.
    #[error("Protocol violation: {0}")]
    ProtocolViolation(String),

    /// A response body did not match the expected schema.
    #[error("Failed to decode response: {0}")]
    Decode(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Credential storage error: {0}")]
    Storage(String),
}

fn step_suffix(step: &Option<RequestStep>) -> String {
    step.map(|s| format!(" during {s}")).unwrap_or_default()
}

fn body_suffix(body: &str) -> String {
    if body.is_empty() {
        String::new()
    } else {
        format!(": {body}")
    }
}

/// Coarse classification used by callers to pick a user-facing message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Caller-correctable input, detected locally
    Validation,
    /// Session gone; the caller should send the user to login
    Authentication,
    /// 4xx from the remote service
    Client,
    /// 5xx from the remote service
    Server,
    /// Transport failures
    Network,
    /// Version or protocol mismatch with the remote service
    Protocol,
    /// Local configuration or storage problems
    Config,
}

impl ClientError {
    /// Build a validation error for `field`.
    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Validation { field: field.into(), reason: reason.into() }
    }

    /// Build a remote error without step information.
    pub fn remote(status: u16, body: impl Into<String>) -> Self {
        Self::Remote { status, body: body.into(), step: None }
    }

    /// Build a network error without step information.
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network { message: message.into(), step: None }
    }

    /// Annotate remote and network failures with the step that produced them.
    ///
    /// Other variants are returned unchanged. An existing step is kept.
    #[must_use]
    pub fn at_step(self, at: RequestStep) -> Self {
        match self {
            Self::Remote { status, body, step } => {
                Self::Remote { status, body, step: step.or(Some(at)) }
            }
            Self::Network { message, step } => Self::Network { message, step: step.or(Some(at)) },
            other => other,
        }
    }

    /// Step annotation carried by remote and network failures.
    pub fn step(&self) -> Option<RequestStep> {
        match self {
            Self::Remote { step, .. } | Self::Network { step, .. } => *step,
            _ => None,
        }
    }

    /// HTTP status for remote failures.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Remote { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Validation { .. } => ErrorCategory::Validation,
            Self::AuthExpired => ErrorCategory::Authentication,
            Self::Remote { status, .. } if *status >= 500 => ErrorCategory::Server,
            Self::Remote { .. } => ErrorCategory::Client,
            Self::Network { .. } => ErrorCategory::Network,
            Self::UnknownStatus(_) | Self::ProtocolViolation(_) | Self::Decode(_) => {
                ErrorCategory::Protocol
            }
            Self::Config(_) | Self::Storage(_) => ErrorCategory::Config,
        }
    }

    /// Whether the presentation layer must force a logout/redirect to login.
    pub fn requires_login(&self) -> bool {
        matches!(self, Self::AuthExpired)
    }
}

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, ClientError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_categories() {
        assert_eq!(ClientError::validation("keywords", "empty").category(), ErrorCategory::Validation);
        assert_eq!(ClientError::remote(404, "").category(), ErrorCategory::Client);
        assert_eq!(ClientError::remote(503, "").category(), ErrorCategory::Server);
        assert_eq!(ClientError::network("reset").category(), ErrorCategory::Network);
        assert_eq!(ClientError::AuthExpired.category(), ErrorCategory::Authentication);
        assert_eq!(
            ClientError::UnknownStatus("queued".into()).category(),
            ErrorCategory::Protocol
        );
    }

    #[test]
    fn test_at_step_only_tags_transport_errors() {
        let err = ClientError::remote(500, "boom").at_step(RequestStep::ListCreate);
        assert_eq!(err.step(), Some(RequestStep::ListCreate));

        let err = ClientError::network("timeout").at_step(RequestStep::JobFetch);
        assert_eq!(err.step(), Some(RequestStep::JobFetch));

        let err = ClientError::AuthExpired.at_step(RequestStep::ListCreate);
        assert_eq!(err, ClientError::AuthExpired);
    }

    #[test]
    fn test_at_step_keeps_existing_step() {
        let err = ClientError::remote(500, "")
            .at_step(RequestStep::JobFetch)
            .at_step(RequestStep::JobCancel);
        assert_eq!(err.step(), Some(RequestStep::JobFetch));
    }

    #[test]
    fn test_display_includes_step_and_body() {
        let err = ClientError::remote(422, "bad keywords")
            .at_step(RequestStep::JobCreate { list_id: ListId(7) });
        assert_eq!(err.to_string(), "Remote error during job-create: status 422: bad keywords");

        let err = ClientError::remote(500, "");
        assert_eq!(err.to_string(), "Remote error: status 500");
    }

    #[test]
    fn test_only_auth_expired_requires_login() {
        assert!(ClientError::AuthExpired.requires_login());
        assert!(!ClientError::remote(401, "").requires_login());
        assert!(!ClientError::network("reset").requires_login());
    }

    #[test]
    fn test_serializes_with_type_tag() {
        let json = serde_json::to_value(ClientError::validation("max_results", "too large"))
            .unwrap();
        assert_eq!(json["type"], "Validation");
        assert_eq!(json["details"]["field"], "max_results");
    }
}
