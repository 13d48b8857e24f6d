//! OAuth2 refresh exchange.
//!
//! `GET <refresh_url>?grant_type=refresh_token&refresh_token=<token>` trades a refresh
//! token for a new token payload. Refresh tokens are single use: the payload always
//! carries the next refresh token.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, instrument};

use super::error::CredentialError;
use super::types::TokenResponse;
use crate::transport::{HttpRequest, Transport};

/// Longest slice of an error body kept in error messages.
const ERROR_BODY_PREVIEW: usize = 200;

#[async_trait]
pub trait TokenExchange: Send + Sync {
    /// Trade `refresh_token` for a new token payload.
    async fn refresh(&self, refresh_token: &str) -> Result<TokenResponse, CredentialError>;
}

/// Refresh exchange against the broker's token endpoint.
pub struct HttpTokenExchange {
    transport: Arc<dyn Transport>,
    refresh_url: String,
}

impl HttpTokenExchange {
    pub fn new(transport: Arc<dyn Transport>, refresh_url: impl Into<String>) -> Self {
        Self {
            transport,
            refresh_url: refresh_url.into(),
        }
    }
}

#[async_trait]
impl TokenExchange for HttpTokenExchange {
    #[instrument(skip_all, fields(url = %self.refresh_url))]
    async fn refresh(&self, refresh_token: &str) -> Result<TokenResponse, CredentialError> {
        if refresh_token.is_empty() {
            return Err(CredentialError::MissingRefreshToken);
        }

        let request = HttpRequest::get(&self.refresh_url)
            .with_query("grant_type", "refresh_token")
            .with_query("refresh_token", refresh_token);

        let response = self.transport.send(request).await?;

        match response.status {
            200..=299 => {
                let token: TokenResponse = serde_json::from_str(&response.body)?;
                debug!(
                    expires_in = token.expires_in,
                    api_server = %token.api_server,
                    "Obtained new access token"
                );
                Ok(token)
            }
            400 | 401 => Err(CredentialError::InvalidRefreshToken),
            status => Err(CredentialError::RefreshFailed(format!(
                "HTTP {}: {}",
                status,
                response
                    .body
                    .chars()
                    .take(ERROR_BODY_PREVIEW)
                    .collect::<String>()
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::{HttpResponse, TransportError};
    use parking_lot::Mutex;

    struct MockTransport {
        response: Result<HttpResponse, TransportError>,
        requests: Mutex<Vec<HttpRequest>>,
    }

    impl MockTransport {
        fn new(response: Result<HttpResponse, TransportError>) -> Self {
            Self {
                response,
                requests: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl Transport for MockTransport {
        async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
            self.requests.lock().push(request);
            self.response.clone()
        }
    }

    const URL: &str = "https://login.questrade.com/oauth2/token";

    #[tokio::test]
    async fn test_refresh_sends_grant_and_parses_payload() {
        let transport = Arc::new(MockTransport::new(Ok(HttpResponse::ok_json(
            r#"{"access_token":"new-access","token_type":"Bearer","expires_in":1800,
                "refresh_token":"new-refresh","api_server":"https://api03.iq.questrade.com/"}"#,
        ))));
        let exchange = HttpTokenExchange::new(transport.clone(), URL);

        let token = exchange.refresh("old-refresh").await.unwrap();

        assert_eq!(token.access_token, "new-access");
        assert_eq!(token.refresh_token, "new-refresh");
        assert_eq!(token.expires_in, 1800);

        let requests = transport.requests.lock();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].url, URL);
        assert_eq!(requests[0].query_value("grant_type"), Some("refresh_token"));
        assert_eq!(requests[0].query_value("refresh_token"), Some("old-refresh"));
    }

    #[tokio::test]
    async fn test_rejected_refresh_token_requires_relogin() {
        let transport = Arc::new(MockTransport::new(Ok(HttpResponse::new(400, "Bad Request"))));
        let exchange = HttpTokenExchange::new(transport, URL);

        let err = exchange.refresh("used-token").await.unwrap_err();
        assert!(err.requires_relogin());
    }

    #[tokio::test]
    async fn test_server_error_is_refresh_failure() {
        let transport = Arc::new(MockTransport::new(Ok(HttpResponse::new(503, "unavailable"))));
        let exchange = HttpTokenExchange::new(transport, URL);

        let err = exchange.refresh("token").await.unwrap_err();
        assert!(matches!(err, CredentialError::RefreshFailed(msg) if msg.starts_with("HTTP 503")));
    }

    #[tokio::test]
    async fn test_empty_refresh_token_skips_network() {
        let transport = Arc::new(MockTransport::new(Err(TransportError::Connect(
            "unreachable".into(),
        ))));
        let exchange = HttpTokenExchange::new(transport.clone(), URL);

        let err = exchange.refresh("").await.unwrap_err();
        assert!(matches!(err, CredentialError::MissingRefreshToken));
        assert!(transport.requests.lock().is_empty());
    }
}
