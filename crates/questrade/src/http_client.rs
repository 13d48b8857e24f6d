//! `reqwest::Client` construction shared by API calls and the refresh exchange.

use std::sync::OnceLock;

use tracing::{debug, warn};

use crate::config::{ClientConfig, ProxyConfig};

const DEFAULT_USER_AGENT: &str = concat!("questrade-api/", env!("CARGO_PKG_VERSION"));

/// How requests to the login and API servers leave the host.
#[derive(Clone, Copy, PartialEq, Eq)]
pub enum ProxyRoute<'a> {
    /// Connect directly, ignoring env and system proxies.
    Direct,
    /// Use whatever the environment configures.
    System,
    /// Go through `url`, with basic auth when both halves are configured.
    Explicit {
        url: &'a str,
        auth: Option<(&'a str, &'a str)>,
    },
}

impl<'a> ProxyRoute<'a> {
    /// A blank `url` counts as unset.
    pub fn from_config(proxy: &'a ProxyConfig) -> Self {
        if !proxy.enabled {
            return Self::Direct;
        }
        match proxy.url.as_deref().map(str::trim) {
            Some(url) if !url.is_empty() => Self::Explicit {
                url,
                auth: proxy.username.as_deref().zip(proxy.password.as_deref()),
            },
            _ if proxy.use_system_proxy => Self::System,
            _ => Self::Direct,
        }
    }

    fn label(&self) -> &'static str {
        match self {
            Self::Direct => "direct",
            Self::System => "system",
            Self::Explicit { .. } => "explicit",
        }
    }

    fn apply(self, builder: reqwest::ClientBuilder) -> reqwest::ClientBuilder {
        match self {
            Self::Direct => builder.no_proxy(),
            Self::System => builder,
            Self::Explicit { url, auth } => match reqwest::Proxy::all(url) {
                Ok(proxy) => match auth {
                    Some((username, password)) => {
                        builder.proxy(proxy.basic_auth(username, password))
                    }
                    None => builder.proxy(proxy),
                },
                Err(e) => {
                    warn!(proxy_url = %url, error = %e, "Invalid proxy URL; connecting directly");
                    builder.no_proxy()
                }
            },
        }
    }
}

/// Build the client used for both API calls and the refresh exchange.
///
/// Construction never fails: a rejected configuration falls back to reqwest defaults.
pub fn build_client(config: &ClientConfig) -> reqwest::Client {
    ensure_crypto_provider();

    let user_agent = config.user_agent.as_deref().unwrap_or(DEFAULT_USER_AGENT);
    let mut builder = reqwest::Client::builder().user_agent(user_agent);

    let timeout = config.request_timeout();
    if !timeout.is_zero() {
        builder = builder.timeout(timeout);
    }

    let route = ProxyRoute::from_config(&config.proxy);
    debug!(
        proxy = route.label(),
        timeout_secs = config.request_timeout_secs,
        "Building HTTP client"
    );
    builder = route.apply(builder);

    builder.build().unwrap_or_else(|e| {
        warn!(error = %e, "HTTP client configuration rejected; using reqwest defaults");
        reqwest::Client::new()
    })
}

/// reqwest is built without a bundled rustls provider, so one is installed per process.
fn ensure_crypto_provider() {
    static INSTALLED: OnceLock<()> = OnceLock::new();
    INSTALLED.get_or_init(|| {
        if rustls::crypto::aws_lc_rs::default_provider()
            .install_default()
            .is_err()
        {
            debug!("rustls crypto provider already installed");
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn proxy(enabled: bool, url: Option<&str>, use_system_proxy: bool) -> ProxyConfig {
        ProxyConfig {
            enabled,
            url: url.map(str::to_string),
            use_system_proxy,
            ..Default::default()
        }
    }

    #[rstest]
    #[case(proxy(false, Some("http://proxy.local:3128"), true), "direct")]
    #[case(proxy(true, None, true), "system")]
    #[case(proxy(true, None, false), "direct")]
    #[case(proxy(true, Some("  "), true), "system")]
    #[case(proxy(true, Some("http://proxy.local:3128"), false), "explicit")]
    fn test_route_from_config(#[case] config: ProxyConfig, #[case] expected: &str) {
        assert_eq!(ProxyRoute::from_config(&config).label(), expected);
    }

    #[test]
    fn test_explicit_route_needs_both_auth_halves() {
        let mut config = proxy(true, Some("http://proxy.local:3128"), true);
        config.username = Some("trader".to_string());
        assert!(matches!(
            ProxyRoute::from_config(&config),
            ProxyRoute::Explicit { auth: None, .. }
        ));

        config.password = Some("secret".to_string());
        assert!(matches!(
            ProxyRoute::from_config(&config),
            ProxyRoute::Explicit {
                url: "http://proxy.local:3128",
                auth: Some(("trader", "secret")),
            }
        ));
    }

    #[test]
    fn test_build_client_with_invalid_proxy_url() {
        let mut config = ClientConfig::default();
        config.proxy.url = Some("not a url".to_string());
        let _client = build_client(&config);
    }

    #[test]
    fn test_build_client_without_timeout() {
        let config = ClientConfig {
            request_timeout_secs: 0,
            proxy: proxy(false, None, false),
            ..Default::default()
        };
        let _client = build_client(&config);
    }
}
