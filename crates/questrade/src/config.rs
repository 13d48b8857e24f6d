//! Client configuration.
//!
//! A single [`ClientConfig`] is built at startup and handed to the credential manager,
//! the dispatcher and the account API. Every field has a default so a partial TOML/JSON
//! document deserializes cleanly.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::account::{OrderAction, OrderType, TimeInForce};
use crate::credentials::redact;

/// Default REST API version prefix appended to the credential's API server.
pub const DEFAULT_API_VERSION: &str = "v1/";

/// Default OAuth2 token endpoint used for the refresh exchange.
pub const DEFAULT_REFRESH_URL: &str = "https://login.questrade.com/oauth2/token";

/// Default request timeout.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Top-level client configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// API version prefix, e.g. `v1/`.
    pub api_version: String,
    /// Token endpoint for `grant_type=refresh_token` exchanges.
    pub refresh_url: String,
    /// Emit request/response diagnostics at `info` level.
    pub log_requests: bool,
    /// Per-request timeout in seconds. `0` disables the client-side timeout.
    pub request_timeout_secs: u64,
    /// Optional `User-Agent` override.
    pub user_agent: Option<String>,
    pub proxy: ProxyConfig,
    /// Shape applied to orders placed through [`crate::AccountApi::place_order`].
    pub order_defaults: OrderDefaults,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_version: DEFAULT_API_VERSION.to_string(),
            refresh_url: DEFAULT_REFRESH_URL.to_string(),
            log_requests: false,
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
            user_agent: None,
            proxy: ProxyConfig::default(),
            order_defaults: OrderDefaults::default(),
        }
    }
}

impl ClientConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Builder-style toggle for request diagnostics.
    pub fn with_request_logging(mut self, enabled: bool) -> Self {
        self.log_requests = enabled;
        self
    }
}

/// Proxy settings for the HTTP client.
///
/// - `enabled = false` disables all proxies, including env/system ones.
/// - `enabled = true` with `url` uses that proxy (optionally with basic auth).
/// - `enabled = true` without `url` falls back to system proxies when `use_system_proxy`.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProxyConfig {
    pub enabled: bool,
    pub url: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub use_system_proxy: bool,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            url: None,
            username: None,
            password: None,
            use_system_proxy: true,
        }
    }
}

impl fmt::Debug for ProxyConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProxyConfig")
            .field("enabled", &self.enabled)
            .field("url", &self.url)
            .field("username", &self.username)
            .field("password", &self.password.as_deref().map(redact))
            .field("use_system_proxy", &self.use_system_proxy)
            .finish()
    }
}

/// Fields of an order request that are not supplied per call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct OrderDefaults {
    pub order_type: OrderType,
    pub time_in_force: TimeInForce,
    pub action: OrderAction,
    pub primary_route: String,
    pub secondary_route: String,
    pub is_all_or_none: bool,
    pub is_anonymous: bool,
}

impl Default for OrderDefaults {
    fn default() -> Self {
        Self {
            order_type: OrderType::Limit,
            time_in_force: TimeInForce::Day,
            action: OrderAction::Buy,
            primary_route: "AUTO".to_string(),
            secondary_route: "AUTO".to_string(),
            is_all_or_none: false,
            is_anonymous: false,
        }
    }
}
