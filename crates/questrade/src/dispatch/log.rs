//! Request/response diagnostics.
//!
//! [`ExchangeLog`] is opened before a call is dispatched and emits the "received" record
//! from `Drop`, so it is logged on every exit path: success, classified error, early
//! return, or a cancelled future.

use std::collections::BTreeMap;

use tracing::info;

use crate::credentials::redact;
use crate::transport::{HttpMethod, HttpRequest, HttpResponse};

/// Longest response body written to the log.
const MAX_LOGGED_BODY: usize = 4096;

#[cfg(test)]
thread_local! {
    pub(crate) static RECEIVED_RECORDS: std::cell::Cell<usize> = const { std::cell::Cell::new(0) };
}

pub(crate) struct ExchangeLog<'a> {
    enabled: bool,
    verb: HttpMethod,
    endpoint: &'a str,
    status: Option<u16>,
    headers: Option<BTreeMap<String, String>>,
    body: Option<String>,
    outcome: Option<String>,
}

impl<'a> ExchangeLog<'a> {
    pub(crate) fn open(enabled: bool, verb: HttpMethod, endpoint: &'a str) -> Self {
        Self {
            enabled,
            verb,
            endpoint,
            status: None,
            headers: None,
            body: None,
            outcome: None,
        }
    }

    pub(crate) fn sending(
        &self,
        request: &HttpRequest,
        params: &serde_json::Map<String, serde_json::Value>,
    ) {
        if !self.enabled {
            return;
        }
        let headers = redacted_headers(&request.headers);
        let params = serde_json::to_string(params).unwrap_or_default();
        info!(
            direction = "sending",
            verb = %request.method,
            url = %request.url,
            headers = ?headers,
            params = %params,
            "Calling {} {}",
            request.method,
            request.url
        );
    }

    pub(crate) fn received(&mut self, response: &HttpResponse) {
        if !self.enabled {
            return;
        }
        self.status = Some(response.status);
        self.headers = Some(response.headers.clone());
        self.body = Some(truncate(&response.body));
    }

    pub(crate) fn finish<T, E: std::fmt::Display>(&mut self, result: &Result<T, E>) {
        if !self.enabled {
            return;
        }
        self.outcome = Some(match result {
            Ok(_) => "ok".to_string(),
            Err(e) => e.to_string(),
        });
    }
}

impl Drop for ExchangeLog<'_> {
    fn drop(&mut self) {
        if !self.enabled {
            return;
        }
        #[cfg(test)]
        RECEIVED_RECORDS.with(|count| count.set(count.get() + 1));

        info!(
            direction = "receiving",
            verb = %self.verb,
            endpoint = %self.endpoint,
            status = ?self.status,
            headers = ?self.headers,
            body = self.body.as_deref().unwrap_or("<no response>"),
            outcome = self.outcome.as_deref().unwrap_or("aborted"),
            "Received {} {}",
            self.verb,
            self.endpoint
        );
    }
}

fn redacted_headers(headers: &BTreeMap<String, String>) -> BTreeMap<String, String> {
    headers
        .iter()
        .map(|(name, value)| {
            let value = if name == "authorization" {
                match value.split_once(' ') {
                    Some((scheme, token)) => format!("{} {}", scheme, redact(token)),
                    None => redact(value).to_string(),
                }
            } else {
                value.clone()
            };
            (name.clone(), value)
        })
        .collect()
}

fn truncate(body: &str) -> String {
    if body.len() <= MAX_LOGGED_BODY {
        return body.to_string();
    }
    let mut end = MAX_LOGGED_BODY;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}… ({} bytes)", &body[..end], body.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn received_count() -> usize {
        RECEIVED_RECORDS.with(|count| count.get())
    }

    #[test]
    fn test_authorization_is_redacted() {
        let mut headers = BTreeMap::new();
        headers.insert("authorization".to_string(), "Bearer secret-token".to_string());
        headers.insert("accept".to_string(), "application/json".to_string());

        let redacted = redacted_headers(&headers);
        assert_eq!(redacted["authorization"], "Bearer ***");
        assert_eq!(redacted["accept"], "application/json");
    }

    #[test]
    fn test_received_emitted_on_drop_without_response() {
        let before = received_count();
        {
            let _log = ExchangeLog::open(true, HttpMethod::Get, "time");
        }
        assert_eq!(received_count(), before + 1);
    }

    #[test]
    fn test_disabled_log_emits_nothing() {
        let before = received_count();
        {
            let mut log = ExchangeLog::open(false, HttpMethod::Post, "accounts/{0}/orders");
            log.received(&HttpResponse::ok_json("{}"));
            log.finish::<(), String>(&Ok(()));
        }
        assert_eq!(received_count(), before);
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        let body = "é".repeat(MAX_LOGGED_BODY);
        let truncated = truncate(&body);
        assert!(truncated.ends_with(&format!("({} bytes)", body.len())));
        assert!(truncate("short") == "short");
    }
}
