//! Error taxonomy for API calls, token persistence, and session transitions.
//!
//! DESIGN
//! ======
//! Non-success responses are decoded in two explicit steps: try the structured
//! `{error, message, details?}` body, otherwise fall back to a generic error
//! built from the HTTP status line. Callers match on variants; nothing relies
//! on a parse failure unwinding through the stack.

use std::collections::BTreeMap;

use serde::Deserialize;

/// Error kind used when the server gives no structured body.
pub const GENERIC_ERROR_KIND: &str = "Error";

// =============================================================================
// API ERROR
// =============================================================================

/// Errors produced by [`crate::api::ApiClient`] requests.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    /// The request never produced an HTTP response (DNS, connect, timeout).
    #[error("network failure: {0}")]
    Network(String),

    /// The server rejected the request with a non-success status.
    #[error("{message}")]
    Api {
        status: u16,
        error: String,
        message: String,
        details: Option<BTreeMap<String, String>>,
    },

    /// A success status carried a body that could not be decoded.
    #[error("unexpected response (status {status}): {detail}")]
    UnexpectedResponse { status: u16, detail: String },

    /// The underlying HTTP client could not be constructed.
    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),
}

impl ApiError {
    /// HTTP status, when a response was received.
    #[must_use]
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } | Self::UnexpectedResponse { status, .. } => Some(*status),
            Self::Network(_) | Self::HttpClientBuild(_) => None,
        }
    }

    /// Short machine-readable kind (the server's `error` field for rejections).
    #[must_use]
    pub fn error_kind(&self) -> &str {
        match self {
            Self::Network(_) => "network_failure",
            Self::Api { error, .. } => error,
            Self::UnexpectedResponse { .. } => "unexpected_response",
            Self::HttpClientBuild(_) => "http_client_build",
        }
    }

    /// The text a form shows for this error.
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::Api { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }

    /// Per-field messages attached to a validation rejection.
    #[must_use]
    pub fn field_details(&self) -> Option<&BTreeMap<String, String>> {
        match self {
            Self::Api { details, .. } => details.as_ref(),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Api { status: 401, .. })
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        Self::Network(e.to_string())
    }
}

// =============================================================================
// ERROR BODY DECODE
// =============================================================================

/// Structured rejection body sent by the service.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: String,
    #[serde(default)]
    message: String,
    #[serde(default)]
    details: Option<BTreeMap<String, String>>,
}

/// Outcome of the first decode step.
#[derive(Debug)]
enum DecodedBody {
    Structured(ErrorBody),
    Unparseable,
}

fn decode_structured(body: &[u8]) -> DecodedBody {
    if body.is_empty() {
        return DecodedBody::Unparseable;
    }
    match serde_json::from_slice::<ErrorBody>(body) {
        Ok(parsed) => DecodedBody::Structured(parsed),
        Err(_) => DecodedBody::Unparseable,
    }
}

/// Build an [`ApiError::Api`] for a non-success response.
///
/// `reason` is the status line text (e.g. `"Unauthorized"`). Empty structured
/// fields fall back to the generic kind and the reason respectively.
#[must_use]
pub fn decode_error_body(status: u16, reason: &str, body: &[u8]) -> ApiError {
    match decode_structured(body) {
        DecodedBody::Structured(parsed) => ApiError::Api {
            status,
            error: if parsed.error.is_empty() { GENERIC_ERROR_KIND.to_owned() } else { parsed.error },
            message: if parsed.message.is_empty() { reason.to_owned() } else { parsed.message },
            details: parsed.details,
        },
        DecodedBody::Unparseable => ApiError::Api {
            status,
            error: GENERIC_ERROR_KIND.to_owned(),
            message: reason.to_owned(),
            details: None,
        },
    }
}

// =============================================================================
// TOKEN STORE ERROR
// =============================================================================

/// Errors produced by durable token stores.
#[derive(Debug, thiserror::Error)]
pub enum TokenStoreError {
    #[error("token store io failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("token store encode failed: {0}")]
    Encode(serde_json::Error),

    #[error("token store decode failed: {0}")]
    Decode(serde_json::Error),
}

// =============================================================================
// SESSION ERROR
// =============================================================================

/// Errors surfaced by [`crate::session::SessionManager`] operations.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Store(#[from] TokenStoreError),

    /// Another login or register submission is still in flight.
    #[error("another sign-in request is already in progress")]
    InFlight,

    /// The operation needs an authenticated session.
    #[error("not signed in")]
    NotAuthenticated,
}

impl SessionError {
    /// The text a form shows for this error.
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::Api(e) => e.message(),
            other => other.to_string(),
        }
    }

    #[must_use]
    pub fn api(&self) -> Option<&ApiError> {
        match self {
            Self::Api(e) => Some(e),
            _ => None,
        }
    }
}

#[cfg(test)]
#[path = "error_test.rs"]
mod tests;
