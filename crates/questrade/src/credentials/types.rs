//! Core credential types.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Token payload returned by the broker's OAuth2 endpoint.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    /// Seconds until the access token expires, counted from issuance.
    pub expires_in: i64,
    pub refresh_token: String,
    pub api_server: String,
}

impl fmt::Debug for TokenResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenResponse")
            .field("access_token", &redact(&self.access_token))
            .field("token_type", &self.token_type)
            .field("expires_in", &self.expires_in)
            .field("refresh_token", &redact(&self.refresh_token))
            .field("api_server", &self.api_server)
            .finish()
    }
}

/// Bearer credential.
///
/// Never edited in place: each refresh or login yields a new record that supersedes
/// the previous one. `expires_at` is fixed when the credential is minted.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    #[serde(default)]
    pub access_token: String,
    #[serde(default)]
    pub token_type: String,
    #[serde(default)]
    pub refresh_token: String,
    /// Base URL for API calls, e.g. `https://api01.iq.questrade.com/`.
    #[serde(default)]
    pub api_server: String,
    #[serde(default)]
    pub expires_in: i64,
    #[serde(default)]
    pub issued_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

/// Validity of a held credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialStatus {
    /// Nothing is persisted.
    Absent,
    /// Usable without a network round-trip.
    Fresh,
    /// Expired or unusable; must be refreshed or reacquired.
    Stale,
}

impl CredentialStatus {
    pub fn of(credential: Option<&Credential>, now: DateTime<Utc>) -> Self {
        match credential {
            None => Self::Absent,
            Some(c) if c.is_fresh_at(now) => Self::Fresh,
            Some(_) => Self::Stale,
        }
    }

    #[inline]
    pub fn is_fresh(&self) -> bool {
        matches!(self, Self::Fresh)
    }
}

impl Credential {
    /// Build a credential from a token payload received at `issued_at`.
    ///
    /// A lifetime that does not fit the calendar leaves `expires_at` unset, which makes
    /// the credential incomplete.
    pub fn mint(token: TokenResponse, issued_at: DateTime<Utc>) -> Self {
        let expires_at = Duration::try_seconds(token.expires_in.max(0))
            .and_then(|ttl| issued_at.checked_add_signed(ttl));
        Self {
            access_token: token.access_token,
            token_type: token.token_type,
            refresh_token: token.refresh_token,
            api_server: token.api_server,
            expires_in: token.expires_in,
            issued_at: Some(issued_at),
            expires_at,
        }
    }

    /// Fresh means a non-empty access token and `now < expires_at`.
    pub fn is_fresh_at(&self, now: DateTime<Utc>) -> bool {
        if self.access_token.is_empty() {
            return false;
        }
        self.expires_at.is_some_and(|expires_at| now < expires_at)
    }

    #[inline]
    pub fn is_fresh(&self) -> bool {
        self.is_fresh_at(Utc::now())
    }

    /// Whether every field needed to authorize and route a call is present.
    pub fn is_complete(&self) -> bool {
        self.missing_fields().is_empty()
    }

    /// Names of required fields that are empty.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.access_token.is_empty() {
            missing.push("access_token");
        }
        if self.token_type.is_empty() {
            missing.push("token_type");
        }
        if self.refresh_token.is_empty() {
            missing.push("refresh_token");
        }
        if self.api_server.is_empty() {
            missing.push("api_server");
        }
        if self.expires_at.is_none() {
            missing.push("expires_at");
        }
        missing
    }

    #[inline]
    pub fn has_refresh_token(&self) -> bool {
        !self.refresh_token.is_empty()
    }

    /// Value of the `Authorization` header.
    pub fn authorization(&self) -> String {
        format!("{} {}", self.token_type, self.access_token)
    }

    /// `api_server` joined with the API version prefix.
    pub fn base_uri(&self, api_version: &str) -> String {
        match (self.api_server.ends_with('/'), api_version.starts_with('/')) {
            (true, true) => format!("{}{}", self.api_server, &api_version[1..]),
            (false, false) => format!("{}/{}", self.api_server, api_version),
            _ => format!("{}{}", self.api_server, api_version),
        }
    }

    /// Copy of this credential that is stale as of `now`.
    pub fn expired_at(&self, now: DateTime<Utc>) -> Self {
        Self {
            expires_at: Some(now),
            ..self.clone()
        }
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("access_token", &redact(&self.access_token))
            .field("token_type", &self.token_type)
            .field("refresh_token", &redact(&self.refresh_token))
            .field("api_server", &self.api_server)
            .field("issued_at", &self.issued_at)
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

pub(crate) fn redact(secret: &str) -> &'static str {
    if secret.is_empty() { "<empty>" } else { "***" }
}
