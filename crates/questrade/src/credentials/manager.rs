//! Credential lifecycle.
//!
//! Decides whether the held credential is usable, refreshes it when stale and falls back
//! to a full login when the refresh path is exhausted.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use parking_lot::RwLock;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use super::error::CredentialError;
use super::exchange::TokenExchange;
use super::login::LoginProvider;
use super::store::CredentialStore;
use super::types::{Credential, CredentialStatus};

/// Owns the bearer credential for the duration of a call.
///
/// Refresh and reacquisition are single-flight: callers that find the credential stale
/// queue on one lock and re-check after acquiring it, so a refresh token is never
/// spent twice. Callers queued behind a failed attempt share its outcome instead of
/// retrying.
pub struct CredentialManager {
    store: Arc<dyn CredentialStore>,
    exchange: Arc<dyn TokenExchange>,
    login: Arc<dyn LoginProvider>,
    /// Last credential loaded or minted by this manager.
    held: RwLock<Option<Credential>>,
    /// Guards refresh and reacquisition. Holds whether the last attempt came up empty.
    refresh_lock: Mutex<bool>,
    /// Completed refresh or reacquire attempts.
    attempts: AtomicU64,
}

impl CredentialManager {
    pub fn new(
        store: Arc<dyn CredentialStore>,
        exchange: Arc<dyn TokenExchange>,
        login: Arc<dyn LoginProvider>,
    ) -> Self {
        Self {
            store,
            exchange,
            login,
            held: RwLock::new(None),
            refresh_lock: Mutex::new(false),
            attempts: AtomicU64::new(0),
        }
    }

    /// Return a currently-valid credential, refreshing or reacquiring it if needed.
    ///
    /// `None` means no path produced a credential; callers treat it as "cannot
    /// authenticate".
    #[instrument(skip(self))]
    pub async fn valid_credential(&self) -> Option<Credential> {
        let seen = self.attempts.load(Ordering::Acquire);
        if let Some(credential) = self.fresh_held() {
            return Some(credential);
        }

        let stored = self.load_stored().await;
        if let Some(credential) = stored.filter(Credential::is_fresh) {
            self.hold(credential.clone());
            return Some(credential);
        }

        let mut last_failed = self.refresh_lock.lock().await;

        // Double-check after acquiring lock (another task may have refreshed)
        if let Some(credential) = self.fresh_held() {
            debug!("Credential refreshed by a concurrent caller");
            return Some(credential);
        }
        if *last_failed && self.attempts.load(Ordering::Acquire) != seen {
            debug!("Concurrent refresh attempt failed; not retrying");
            return None;
        }

        let current = match self.load_stored().await {
            Some(credential) => Some(credential),
            None => self.held.read().clone(),
        };

        let next = match current {
            Some(credential) if credential.is_fresh() => {
                self.hold(credential.clone());
                return Some(credential);
            }
            Some(stale) => self.refresh_or_reacquire(&stale).await,
            None => {
                info!("No stored credential; requesting login");
                self.reacquire().await
            }
        };
        *last_failed = next.is_none();
        self.attempts.fetch_add(1, Ordering::Release);

        match next {
            Some(credential) => {
                self.persist(&credential).await;
                self.hold(credential.clone());
                Some(credential)
            }
            None => {
                warn!("No credential available - login required");
                None
            }
        }
    }

    /// Status of the held or stored credential, without any network call.
    pub async fn status(&self) -> CredentialStatus {
        let now = Utc::now();
        if let Some(credential) = self.fresh_held() {
            return CredentialStatus::of(Some(&credential), now);
        }
        let stored = self.load_stored().await;
        CredentialStatus::of(stored.as_ref(), now)
    }

    /// Mark `rejected` stale so the next call refreshes instead of reusing it.
    ///
    /// Ignored when the held credential has already moved on to another token.
    #[instrument(skip_all)]
    pub async fn invalidate(&self, rejected: &Credential) {
        let _guard = self.refresh_lock.lock().await;

        let current = match self.load_stored().await {
            Some(credential) => Some(credential),
            None => self.held.read().clone(),
        };
        let Some(current) = current else {
            return;
        };
        if current.access_token != rejected.access_token {
            debug!("Rejected credential already superseded");
            return;
        }

        info!("Access token rejected by the API; forcing refresh on next call");
        let expired = current.expired_at(Utc::now());
        self.persist(&expired).await;
        self.hold(expired);
    }

    async fn refresh_or_reacquire(&self, stale: &Credential) -> Option<Credential> {
        match self.refresh(stale).await {
            Ok(credential) => Some(credential),
            Err(e) => {
                warn!(
                    error = %e,
                    requires_relogin = e.requires_relogin(),
                    "Credential refresh failed; falling back to login"
                );
                self.reacquire().await
            }
        }
    }

    #[instrument(skip_all)]
    async fn refresh(&self, stale: &Credential) -> Result<Credential, CredentialError> {
        if !stale.has_refresh_token() {
            return Err(CredentialError::MissingRefreshToken);
        }

        info!("Refreshing stale credential");
        let payload = self.exchange.refresh(&stale.refresh_token).await?;
        let credential = Credential::mint(payload, Utc::now());

        if !credential.is_complete() {
            return Err(CredentialError::InvalidCredentials(format!(
                "refreshed credential missing {}",
                credential.missing_fields().join(", ")
            )));
        }

        info!(expires_at = ?credential.expires_at, "Credential refresh successful");
        Ok(credential)
    }

    async fn reacquire(&self) -> Option<Credential> {
        match self.login.acquire_new().await {
            Ok(Some(credential)) if credential.is_complete() => {
                info!(expires_at = ?credential.expires_at, "Obtained new credential from login");
                Some(credential)
            }
            Ok(Some(credential)) => {
                warn!(
                    missing = ?credential.missing_fields(),
                    "Login returned an incomplete credential"
                );
                None
            }
            Ok(None) => None,
            Err(e) => {
                warn!(error = %e, "Login failed");
                None
            }
        }
    }

    async fn load_stored(&self) -> Option<Credential> {
        match self.store.load().await {
            Ok(credential) => credential,
            Err(e) => {
                warn!(error = %e, "Failed to load stored credential; treating as absent");
                None
            }
        }
    }

    async fn persist(&self, credential: &Credential) {
        if let Err(e) = self.store.save(credential).await {
            warn!(error = %e, "Failed to persist credential (non-fatal)");
        }
    }

    fn fresh_held(&self) -> Option<Credential> {
        self.held
            .read()
            .as_ref()
            .filter(|credential| credential.is_fresh())
            .cloned()
    }

    fn hold(&self, credential: Credential) {
        *self.held.write() = Some(credential);
    }
}
