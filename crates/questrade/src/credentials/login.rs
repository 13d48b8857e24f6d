//! Login providers.
//!
//! A login provider mints a brand-new credential when no refresh path exists. The
//! interactive browser flow lives outside this crate; what ships here is the
//! absent provider and the API-hub manual token flow.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use tracing::{info, instrument};

use super::error::CredentialError;
use super::exchange::TokenExchange;
use super::types::Credential;

#[async_trait]
pub trait LoginProvider: Send + Sync {
    /// Produce a new credential, `None` if the user cannot be logged in.
    ///
    /// May be slow (user interaction) or fail.
    async fn acquire_new(&self) -> Result<Option<Credential>, CredentialError>;
}

/// Provider that never yields a credential.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoLogin;

#[async_trait]
impl LoginProvider for NoLogin {
    async fn acquire_new(&self) -> Result<Option<Credential>, CredentialError> {
        Ok(None)
    }
}

/// Login with a manually generated refresh token.
///
/// The broker's API hub issues one-time refresh tokens for personal apps. The token
/// is consumed on the first exchange attempt, successful or not, because the token
/// endpoint invalidates it either way.
pub struct ManualTokenLogin {
    exchange: Arc<dyn TokenExchange>,
    token: Mutex<Option<String>>,
}

impl ManualTokenLogin {
    pub fn new(exchange: Arc<dyn TokenExchange>, refresh_token: impl Into<String>) -> Self {
        let token = refresh_token.into();
        Self {
            exchange,
            token: Mutex::new((!token.is_empty()).then_some(token)),
        }
    }

    /// Whether the manual token is still unused.
    pub fn is_pending(&self) -> bool {
        self.token.lock().is_some()
    }
}

#[async_trait]
impl LoginProvider for ManualTokenLogin {
    #[instrument(skip(self))]
    async fn acquire_new(&self) -> Result<Option<Credential>, CredentialError> {
        let pending = self.token.lock().take();
        let Some(token) = pending else {
            return Ok(None);
        };

        let payload = self.exchange.refresh(&token).await?;
        let credential = Credential::mint(payload, Utc::now());

        if !credential.is_complete() {
            return Err(CredentialError::InvalidCredentials(format!(
                "token payload missing {}",
                credential.missing_fields().join(", ")
            )));
        }

        info!(api_server = %credential.api_server, "Logged in with manual refresh token");
        Ok(Some(credential))
    }
}
