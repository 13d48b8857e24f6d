//! Dispatch error taxonomy.

use serde::Serialize;
use thiserror::Error;

use crate::transport::TransportError;

/// Result type for API calls.
pub type Result<T> = std::result::Result<T, ApiError>;

/// Outcome of a failed API call.
///
/// Every failure of the dispatcher is returned as one of these variants, never raised.
/// The enum serializes with a `kind` tag so callers (and the CLI) can emit it as a
/// structured error payload.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ApiError {
    /// No usable credential could be obtained.
    #[error("no usable credential - login required")]
    NoCredential,

    /// The response body could not be parsed into the expected shape.
    #[error("malformed response: {message}")]
    MalformedResponse { message: String },

    /// A parameter could not be serialized into the request.
    #[error("invalid argument: {message}")]
    InvalidArgument { message: String },

    /// The network call failed or the broker answered with a non-2xx status.
    #[error("transport failure{}: {message}", status_suffix(.status))]
    TransportFailure {
        #[serde(skip_serializing_if = "Option::is_none")]
        status: Option<u16>,
        message: String,
    },
}

impl ApiError {
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedResponse {
            message: message.into(),
        }
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    pub fn status(status: u16, message: impl Into<String>) -> Self {
        Self::TransportFailure {
            status: Some(status),
            message: message.into(),
        }
    }

    /// HTTP status attached to a transport failure, if the broker answered at all.
    pub fn http_status(&self) -> Option<u16> {
        match self {
            Self::TransportFailure { status, .. } => *status,
            _ => None,
        }
    }

    /// Whether the broker rejected the access token.
    #[inline]
    pub fn is_unauthorized(&self) -> bool {
        self.http_status() == Some(401)
    }

    /// Short machine-readable name of the variant.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NoCredential => "no_credential",
            Self::MalformedResponse { .. } => "malformed_response",
            Self::InvalidArgument { .. } => "invalid_argument",
            Self::TransportFailure { .. } => "transport_failure",
        }
    }
}

fn status_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(" (HTTP {s})")).unwrap_or_default()
}

impl From<TransportError> for ApiError {
    fn from(err: TransportError) -> Self {
        Self::TransportFailure {
            status: None,
            message: err.to_string(),
        }
    }
}
