//! Request dispatch.
//!
//! [`Dispatcher::execute`] obtains a valid credential, assembles the request for
//! `<api_server><api_version><endpoint>`, sends it and classifies the outcome. It
//! never panics and never propagates a raw transport or decoding error: every failure
//! is an [`ApiError`].

mod descriptor;
mod log;

use std::sync::Arc;

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, instrument};

use crate::config::ClientConfig;
use crate::credentials::{Credential, CredentialManager};
use crate::error::{ApiError, Result};
use crate::transport::{HttpMethod, HttpRequest, HttpResponse, Transport};

pub use descriptor::RequestDescriptor;
use log::ExchangeLog;

/// Longest slice of an unparseable body kept in error messages.
const ERROR_BODY_PREVIEW: usize = 200;

/// Error body returned by the API on non-2xx responses.
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    code: Option<i64>,
    #[serde(default)]
    message: Option<String>,
}

pub struct Dispatcher {
    config: Arc<ClientConfig>,
    credentials: Arc<CredentialManager>,
    transport: Arc<dyn Transport>,
}

impl Dispatcher {
    pub fn new(
        config: Arc<ClientConfig>,
        credentials: Arc<CredentialManager>,
        transport: Arc<dyn Transport>,
    ) -> Self {
        Self {
            config,
            credentials,
            transport,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn credentials(&self) -> &Arc<CredentialManager> {
        &self.credentials
    }

    /// Execute a call and return the parsed JSON body.
    #[instrument(skip_all, fields(verb = %descriptor.verb, endpoint = %descriptor.endpoint))]
    pub async fn execute(&self, descriptor: &RequestDescriptor) -> Result<Value> {
        let mut log = ExchangeLog::open(
            self.config.log_requests,
            descriptor.verb,
            &descriptor.endpoint,
        );
        let result = self.dispatch(descriptor, &mut log).await;
        log.finish(&result);
        result
    }

    /// Execute a call and decode the body into `T`.
    pub async fn call<T: DeserializeOwned>(&self, descriptor: &RequestDescriptor) -> Result<T> {
        let value = self.execute(descriptor).await?;
        serde_json::from_value(value).map_err(|e| {
            ApiError::malformed(format!("unexpected `{}` payload: {}", descriptor.endpoint, e))
        })
    }

    async fn dispatch(
        &self,
        descriptor: &RequestDescriptor,
        log: &mut ExchangeLog<'_>,
    ) -> Result<Value> {
        let Some(credential) = self.credentials.valid_credential().await else {
            return Err(ApiError::NoCredential);
        };

        let request = self.build_request(&credential, descriptor)?;
        log.sending(&request, &descriptor.params);

        let response = self.transport.send(request).await?;
        log.received(&response);

        if !response.is_success() {
            let error = status_error(&response);
            if error.is_unauthorized() {
                self.credentials.invalidate(&credential).await;
            }
            return Err(error);
        }

        debug!(status = response.status, bytes = response.body.len(), "Response received");
        serde_json::from_str(&response.body)
            .map_err(|e| ApiError::malformed(format!("{e}: {}", preview(&response.body))))
    }

    fn build_request(
        &self,
        credential: &Credential,
        descriptor: &RequestDescriptor,
    ) -> Result<HttpRequest> {
        let url = format!(
            "{}{}",
            credential.base_uri(&self.config.api_version),
            descriptor.render_path()?
        );

        let mut request = HttpRequest::new(descriptor.verb, url)
            .with_header("authorization", credential.authorization())
            .with_header("accept", "application/json");

        match descriptor.verb {
            HttpMethod::Get => {
                for (name, value) in descriptor.query_pairs()? {
                    request = request.with_query(name, value);
                }
            }
            HttpMethod::Post => {
                request = request.with_json_body(descriptor.json_body()?);
            }
        }

        Ok(request)
    }
}

fn status_error(response: &HttpResponse) -> ApiError {
    let message = match serde_json::from_str::<ApiErrorBody>(&response.body) {
        Ok(ApiErrorBody {
            code: Some(code),
            message: Some(message),
        }) => format!("{message} (code {code})"),
        Ok(ApiErrorBody {
            message: Some(message),
            ..
        }) => message,
        _ if response.body.trim().is_empty() => format!("HTTP {}", response.status),
        _ => preview(&response.body),
    };
    ApiError::status(response.status, message)
}

fn preview(body: &str) -> String {
    body.chars().take(ERROR_BODY_PREVIEW).collect()
}
