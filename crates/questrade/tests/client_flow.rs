use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use parking_lot::Mutex;
use questrade_api::account::OrdersQuery;
use questrade_api::credentials::TokenResponse;
use questrade_api::{
    ApiError, ClientConfig, Credential, CredentialStatus, CredentialStore, FileCredentialStore,
    HttpMethod, HttpRequest, HttpResponse, MemoryCredentialStore, NOT_FOUND_SYMBOL_ID,
    OrderRequest, QuestradeClient, SymbolCache, SymbolRef, Transport, TransportError,
};
use serde_json::{Value, json};
use tempfile::TempDir;

const API_SERVER: &str = "https://api05.iq.questrade.com/";
const REFRESH_URL: &str = "https://login.questrade.com/oauth2/token";

type Scripted = Result<HttpResponse, TransportError>;

/// Transport that answers from per-path scripts and records every request.
#[derive(Default)]
struct FakeBroker {
    routes: Mutex<Vec<(String, VecDeque<Scripted>)>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl FakeBroker {
    fn route(self, url_prefix: &str, responses: Vec<Scripted>) -> Self {
        self.routes
            .lock()
            .push((url_prefix.to_string(), responses.into()));
        self
    }

    fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().clone()
    }

    fn requests_to(&self, url_prefix: &str) -> Vec<HttpRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.url.starts_with(url_prefix))
            .collect()
    }
}

#[async_trait]
impl Transport for FakeBroker {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        self.requests.lock().push(request.clone());
        let mut routes = self.routes.lock();
        let script = routes
            .iter_mut()
            .find(|(prefix, _)| request.url.starts_with(prefix.as_str()))
            .map(|(_, script)| script);
        match script.and_then(|s| s.pop_front()) {
            Some(response) => response,
            None => Ok(HttpResponse::new(404, r#"{"code": 1001, "message": "Not found"}"#)),
        }
    }
}

fn token(access: &str, refresh: &str) -> TokenResponse {
    TokenResponse {
        access_token: access.to_string(),
        token_type: "Bearer".to_string(),
        expires_in: 1800,
        refresh_token: refresh.to_string(),
        api_server: API_SERVER.to_string(),
    }
}

fn fresh() -> Credential {
    Credential::mint(token("access-fresh", "refresh-1"), Utc::now())
}

fn stale() -> Credential {
    Credential::mint(
        token("access-old", "refresh-1"),
        Utc::now() - Duration::hours(2),
    )
}

fn api(path: &str) -> String {
    format!("{API_SERVER}v1/{path}")
}

fn client(store: MemoryCredentialStore, broker: Arc<FakeBroker>) -> QuestradeClient {
    QuestradeClient::builder(ClientConfig::default(), Arc::new(store))
        .transport(broker)
        .build()
}

fn body(request: &HttpRequest) -> Value {
    serde_json::from_str(request.body.as_deref().unwrap_or("null")).unwrap()
}

#[tokio::test]
async fn fresh_credential_is_used_without_refresh() {
    let broker = Arc::new(FakeBroker::default().route(
        &api("time"),
        vec![Ok(HttpResponse::ok_json(
            r#"{"time": "2026-10-16T10:15:00.000000-04:00"}"#,
        ))],
    ));
    let client = client(MemoryCredentialStore::with_credential(fresh()), broker.clone());

    let time = client.account().time().await.unwrap();

    assert_eq!(time.time, "2026-10-16T10:15:00.000000-04:00");
    let requests = broker.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(
        requests[0].header("authorization"),
        Some("Bearer access-fresh")
    );
}

#[tokio::test]
async fn stale_credential_is_refreshed_persisted_and_used() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("token.json");
    let store = Arc::new(FileCredentialStore::new(&path));
    store.save(&stale()).await.unwrap();

    let refreshed = serde_json::to_string(&json!({
        "access_token": "access-new",
        "token_type": "Bearer",
        "expires_in": 1800,
        "refresh_token": "refresh-2",
        "api_server": API_SERVER,
    }))
    .unwrap();
    let broker = Arc::new(
        FakeBroker::default()
            .route(REFRESH_URL, vec![Ok(HttpResponse::ok_json(refreshed))])
            .route(
                &api("accounts"),
                vec![Ok(HttpResponse::ok_json(
                    r#"{"accounts": [{"type": "TFSA", "number": "51234567"}], "userId": 7}"#,
                ))],
            ),
    );
    let client = QuestradeClient::builder(ClientConfig::default(), store.clone())
        .transport(broker.clone())
        .build();

    let accounts = client.account().accounts().await.unwrap();
    assert_eq!(accounts.accounts[0].number, "51234567");

    let exchanges = broker.requests_to(REFRESH_URL);
    assert_eq!(exchanges.len(), 1);
    assert_eq!(exchanges[0].query_value("grant_type"), Some("refresh_token"));
    assert_eq!(exchanges[0].query_value("refresh_token"), Some("refresh-1"));

    let call = &broker.requests_to(&api("accounts"))[0];
    assert_eq!(call.header("authorization"), Some("Bearer access-new"));

    let persisted = store.load().await.unwrap().unwrap();
    assert_eq!(persisted.access_token, "access-new");
    assert_eq!(persisted.refresh_token, "refresh-2");
    assert!(persisted.is_fresh());
}

#[tokio::test]
async fn missing_credential_fails_without_network() {
    let broker = Arc::new(FakeBroker::default());
    let client = client(MemoryCredentialStore::new(), broker.clone());

    let err = client.account().positions("26598145").await.unwrap_err();

    assert_eq!(err, ApiError::NoCredential);
    assert!(broker.requests().is_empty());
}

#[tokio::test]
async fn orders_default_to_today_and_all_states() {
    let broker = Arc::new(FakeBroker::default().route(
        &api("accounts/26598145/orders"),
        vec![Ok(HttpResponse::ok_json(r#"{"orders": []}"#))],
    ));
    let client = client(MemoryCredentialStore::with_credential(fresh()), broker.clone());

    let orders = client
        .account()
        .orders("26598145", &OrdersQuery::default())
        .await
        .unwrap();
    assert!(orders.orders.is_empty());

    let request = &broker.requests()[0];
    assert_eq!(request.method, HttpMethod::Get);
    let start = request.query_value("startTime").unwrap();
    let end = request.query_value("endTime").unwrap();
    assert_eq!(start[..10], end[..10]);
    assert_eq!(&start[10..19], "T00:00:00");
    assert_eq!(&end[10..19], "T23:59:59");
    assert_eq!(request.query_value("stateFilter"), Some("All"));
    assert_eq!(request.query_value("orderId"), None);
}

#[tokio::test]
async fn resolve_is_cached_and_numeric_input_skips_search() {
    let broker = Arc::new(FakeBroker::default().route(
        &api("symbols/search"),
        vec![Ok(HttpResponse::ok_json(
            r#"{"symbols": [{"symbol": "BMO.TO", "symbolId": 9292, "description": "BANK OF MONTREAL"}]}"#,
        ))],
    ));
    let client = client(MemoryCredentialStore::with_credential(fresh()), broker.clone());
    let symbols = client.symbols();

    assert_eq!(symbols.resolve("BMO.TO").await.unwrap(), 9292);
    assert_eq!(symbols.resolve("BMO.TO").await.unwrap(), 9292);
    assert_eq!(symbols.resolve(42_i64).await.unwrap(), 42);

    let searches = broker.requests();
    assert_eq!(searches.len(), 1);
    assert_eq!(searches[0].query_value("prefix"), Some("BMO.TO"));
    assert_eq!(searches[0].query_value("offset"), Some("0"));
}

#[tokio::test]
async fn empty_search_returns_sentinel_and_caches_nothing() {
    let broker = Arc::new(FakeBroker::default().route(
        &api("symbols/search"),
        vec![
            Ok(HttpResponse::ok_json(r#"{"symbols": []}"#)),
            Ok(HttpResponse::ok_json(r#"{"symbols": []}"#)),
        ],
    ));
    let cache = Arc::new(SymbolCache::new());
    let client = QuestradeClient::builder(
        ClientConfig::default(),
        Arc::new(MemoryCredentialStore::with_credential(fresh())),
    )
    .transport(broker.clone())
    .symbol_cache(cache.clone())
    .build();

    assert_eq!(
        client.symbols().resolve("ZZZZ").await.unwrap(),
        NOT_FOUND_SYMBOL_ID
    );
    assert!(cache.is_empty());
    assert_eq!(client.symbols().lookup("ZZZZ").await.unwrap(), None);
    assert_eq!(broker.requests().len(), 2);
}

#[tokio::test]
async fn transport_failure_is_classified_and_next_call_recovers() {
    let broker = Arc::new(FakeBroker::default().route(
        &api("accounts/26598145/balances"),
        vec![
            Err(TransportError::Connect("connection refused".into())),
            Ok(HttpResponse::ok_json(
                r#"{"perCurrencyBalances": [{"currency": "CAD", "cash": 1000.5}], "combinedBalances": []}"#,
            )),
        ],
    ));
    let client = client(MemoryCredentialStore::with_credential(fresh()), broker.clone());

    let err = client.account().balances("26598145").await.unwrap_err();
    assert!(matches!(err, ApiError::TransportFailure { status: None, .. }));
    assert_eq!(client.credentials().status().await, CredentialStatus::Fresh);

    let balances = client.account().balances("26598145").await.unwrap();
    assert_eq!(balances.per_currency_balances[0].cash, Some(1000.5));
}

#[tokio::test]
async fn place_order_resolves_symbol_and_posts_body() {
    let broker = Arc::new(
        FakeBroker::default()
            .route(
                &api("symbols/search"),
                vec![Ok(HttpResponse::ok_json(
                    r#"{"symbols": [{"symbol": "AAPL", "symbolId": 8049}]}"#,
                ))],
            )
            .route(
                &api("accounts/26598145/orders"),
                vec![Ok(HttpResponse::ok_json(
                    r#"{"orderId": 177106005, "orders": [{"id": 177106005, "state": "Pending"}]}"#,
                ))],
            ),
    );
    let client = client(MemoryCredentialStore::with_credential(fresh()), broker.clone());

    let response = client
        .account()
        .place_order(&OrderRequest::new(
            "26598145",
            SymbolRef::ticker("AAPL"),
            5,
            Some(180.25),
        ))
        .await
        .unwrap();
    assert_eq!(response.order_id, Some(177106005));

    let post = &broker.requests_to(&api("accounts/26598145/orders"))[0];
    assert_eq!(post.method, HttpMethod::Post);
    assert!(post.query.is_empty());
    let body = body(post);
    assert_eq!(body["symbolId"], 8049);
    assert_eq!(body["quantity"], 5);
    assert_eq!(body["limitPrice"], 180.25);
    assert_eq!(body["orderType"], "Limit");
    assert_eq!(body["primaryRoute"], "AUTO");
}

#[tokio::test]
async fn place_order_with_unknown_symbol_sends_nothing() {
    let broker = Arc::new(FakeBroker::default().route(
        &api("symbols/search"),
        vec![Ok(HttpResponse::ok_json(r#"{"symbols": []}"#))],
    ));
    let client = client(MemoryCredentialStore::with_credential(fresh()), broker.clone());

    let err = client
        .account()
        .place_order(&OrderRequest::new("26598145", "NOPE", 1, Some(1.0)))
        .await
        .unwrap_err();

    assert!(matches!(err, ApiError::InvalidArgument { .. }));
    assert!(broker.requests_to(&api("accounts")).is_empty());
}

#[tokio::test]
async fn rejected_token_is_refreshed_on_next_call() {
    let broker = Arc::new(
        FakeBroker::default()
            .route(
                REFRESH_URL,
                vec![Ok(HttpResponse::ok_json(
                    serde_json::to_string(&json!({
                        "access_token": "access-new",
                        "token_type": "Bearer",
                        "expires_in": 1800,
                        "refresh_token": "refresh-2",
                        "api_server": API_SERVER,
                    }))
                    .unwrap(),
                ))],
            )
            .route(
                &api("time"),
                vec![
                    Ok(HttpResponse::new(
                        401,
                        r#"{"code": 1017, "message": "Access token is invalid"}"#,
                    )),
                    Ok(HttpResponse::ok_json(r#"{"time": "2026-10-16T11:00:00.000000-04:00"}"#)),
                ],
            ),
    );
    let client = client(MemoryCredentialStore::with_credential(fresh()), broker.clone());

    let err = client.account().time().await.unwrap_err();
    assert_eq!(err.http_status(), Some(401));

    client.account().time().await.unwrap();
    let calls = broker.requests_to(&api("time"));
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[1].header("authorization"), Some("Bearer access-new"));
}
