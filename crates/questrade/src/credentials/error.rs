//! Credential error types.

use thiserror::Error;

use crate::transport::TransportError;

/// Errors that can occur during credential operations.
///
/// None of these reach API callers directly: the manager resolves them by falling back
/// to a full login and only reports "no credential" when every path is exhausted.
#[derive(Debug, Error)]
pub enum CredentialError {
    /// Stored credential has no refresh token - re-login required.
    #[error("Missing refresh token - re-login required")]
    MissingRefreshToken,

    /// The token endpoint rejected the refresh token (already used or revoked).
    #[error("Invalid refresh token - re-login required")]
    InvalidRefreshToken,

    /// A minted credential lacks required fields.
    #[error("Invalid credentials: {0}")]
    InvalidCredentials(String),

    /// Refresh exchange failed for another reason.
    #[error("Refresh failed: {0}")]
    RefreshFailed(String),

    #[error("Network error: {0}")]
    Network(#[from] TransportError),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CredentialError {
    /// Check if this error requires manual re-login.
    pub fn requires_relogin(&self) -> bool {
        matches!(
            self,
            Self::MissingRefreshToken | Self::InvalidRefreshToken | Self::InvalidCredentials(_)
        )
    }

    /// Check if this error is transient and may be retried.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Network(e) => e.is_transient(),
            _ => false,
        }
    }
}
