use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{Local, NaiveDate};
use questrade_api::account::{OrderStateFilter, OrdersQuery};
use questrade_api::credentials::{HttpTokenExchange, LoginProvider};
use questrade_api::http_client::build_client;
use questrade_api::transport::ReqwestTransport;
use questrade_api::{
    CredentialStatus, FileCredentialStore, ManualTokenLogin, NoLogin, OrderRequest,
    QuestradeClient, SymbolCache, SymbolRef, TimeRange, Transport,
};
use serde::Serialize;
use serde_json::json;
use tracing::{debug, warn};

use crate::cli::DayArg;
use crate::config::AppConfig;
use crate::error::Result;

pub struct CommandExecutor {
    client: QuestradeClient,
    symbol_cache: Arc<SymbolCache>,
    symbol_cache_path: Option<PathBuf>,
    cached_symbols: usize,
    compact: bool,
}

impl CommandExecutor {
    pub fn new(config: AppConfig, refresh_token: Option<String>, compact: bool) -> Result<Self> {
        let store = match &config.token_path {
            Some(path) => FileCredentialStore::new(path),
            None => FileCredentialStore::in_home_dir()?,
        };
        debug!(path = %store.path().display(), "Using credential file");
        let symbol_cache_path = config.symbol_cache_path();
        let symbol_cache = Arc::new(load_symbol_cache(symbol_cache_path.as_deref()));
        let cached_symbols = symbol_cache.len();

        let client_config = config.client;
        let transport: Arc<dyn Transport> =
            Arc::new(ReqwestTransport::new(build_client(&client_config)));
        let exchange = Arc::new(HttpTokenExchange::new(
            transport.clone(),
            client_config.refresh_url.clone(),
        ));
        let login: Arc<dyn LoginProvider> = match refresh_token {
            Some(token) if !token.is_empty() => {
                debug!("Using manual refresh token for login");
                Arc::new(ManualTokenLogin::new(exchange.clone(), token))
            }
            _ => Arc::new(NoLogin),
        };

        let client = QuestradeClient::builder(client_config, Arc::new(store))
            .transport(transport)
            .token_exchange(exchange)
            .login(login)
            .symbol_cache(symbol_cache.clone())
            .build();

        Ok(Self {
            client,
            symbol_cache,
            symbol_cache_path,
            cached_symbols,
            compact,
        })
    }

    pub async fn time(&self) -> Result<()> {
        self.print(&self.client.account().time().await?)
    }

    pub async fn accounts(&self) -> Result<()> {
        self.print(&self.client.account().accounts().await?)
    }

    pub async fn positions(&self, account: &str) -> Result<()> {
        self.print(&self.client.account().positions(account).await?)
    }

    pub async fn balances(&self, account: &str) -> Result<()> {
        self.print(&self.client.account().balances(account).await?)
    }

    pub async fn executions(&self, account: &str, day: DayArg) -> Result<()> {
        let executions = self
            .client
            .account()
            .executions(account, day_range(day.date))
            .await?;
        self.print(&executions)
    }

    pub async fn orders(
        &self,
        account: &str,
        day: DayArg,
        state: OrderStateFilter,
        order_id: Option<i64>,
    ) -> Result<()> {
        let query = OrdersQuery {
            range: day_range(day.date),
            state_filter: state,
            order_id,
        };
        self.print(&self.client.account().orders(account, &query).await?)
    }

    pub async fn activities(&self, account: &str, day: DayArg) -> Result<()> {
        let activities = self
            .client
            .account()
            .activities(account, day_range(day.date))
            .await?;
        self.print(&activities)
    }

    pub async fn search(&self, prefix: &str, offset: u32) -> Result<()> {
        self.print(&self.client.account().search_symbols(prefix, offset).await?)
    }

    /// Prints `{symbol: id}`; failures are reported per symbol.
    pub async fn resolve(&self, symbols: Vec<String>) -> Result<()> {
        let results = self
            .client
            .symbols()
            .resolve_many(symbols.iter().map(String::as_str))
            .await;

        let mut resolved = serde_json::Map::new();
        for (symbol, result) in symbols.iter().zip(results) {
            let value = match result {
                Ok(id) => json!(id),
                Err(e) => json!({ "error": &e, "message": e.to_string() }),
            };
            resolved.insert(symbol.clone(), value);
        }
        self.print(&resolved)
    }

    pub async fn place_order(
        &self,
        account: &str,
        symbol: &str,
        quantity: u64,
        price: Option<f64>,
    ) -> Result<()> {
        let request = OrderRequest::new(account, SymbolRef::from(symbol), quantity, price);
        self.print(&self.client.account().place_order(&request).await?)
    }

    pub async fn token(&self) -> Result<()> {
        let status = match self.client.credentials().status().await {
            CredentialStatus::Absent => "absent",
            CredentialStatus::Fresh => "fresh",
            CredentialStatus::Stale => "stale",
        };
        self.print(&json!({ "credential": status }))
    }

    /// Persist newly resolved symbols. Failures only warn.
    pub fn save_symbol_cache(&self) {
        let Some(path) = self.symbol_cache_path.as_deref() else {
            return;
        };
        if self.symbol_cache.len() == self.cached_symbols {
            return;
        }
        if let Err(e) = write_symbol_cache(path, &self.symbol_cache.snapshot()) {
            warn!(path = %path.display(), error = %e, "Failed to save symbol cache");
        }
    }

    fn print<T: Serialize>(&self, value: &T) -> Result<()> {
        let rendered = if self.compact {
            serde_json::to_string(value)?
        } else {
            serde_json::to_string_pretty(value)?
        };
        println!("{rendered}");
        Ok(())
    }
}

fn day_range(date: Option<NaiveDate>) -> Option<TimeRange> {
    date.map(|date| TimeRange::day_of(date, &Local))
}

fn load_symbol_cache(path: Option<&Path>) -> SymbolCache {
    let Some(path) = path else {
        return SymbolCache::new();
    };
    let entries = match std::fs::read_to_string(path) {
        Ok(content) => serde_json::from_str::<BTreeMap<String, i64>>(&content).unwrap_or_else(|e| {
            warn!(path = %path.display(), error = %e, "Ignoring unreadable symbol cache");
            BTreeMap::new()
        }),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Failed to read symbol cache");
            BTreeMap::new()
        }
    };
    debug!(path = %path.display(), entries = entries.len(), "Symbol cache loaded");
    SymbolCache::from_entries(entries)
}

fn write_symbol_cache(path: &Path, entries: &BTreeMap<String, i64>) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, serde_json::to_string_pretty(entries)?)?;
    Ok(())
}
