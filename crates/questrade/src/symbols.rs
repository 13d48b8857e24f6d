//! Ticker to symbol-id resolution.
//!
//! [`SymbolResolver`] answers from its [`SymbolCache`] first and falls back to the
//! `symbols/search` endpoint on a miss. Only successful lookups are cached.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use tracing::{debug, warn};

use crate::account::SymbolSearchResponse;
use crate::dispatch::{Dispatcher, RequestDescriptor};
use crate::error::{ApiError, Result};

/// Returned by [`SymbolResolver::resolve`] when the broker knows no such ticker.
pub const NOT_FOUND_SYMBOL_ID: i64 = -1;

/// Endpoint for prefix searches.
pub const SYMBOL_SEARCH_ENDPOINT: &str = "symbols/search";

/// A symbol as supplied by a caller: already an id, or a ticker to look up.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SymbolRef {
    Id(i64),
    Ticker(String),
}

impl SymbolRef {
    pub fn ticker(ticker: impl Into<String>) -> Self {
        Self::Ticker(ticker.into())
    }
}

impl FromStr for SymbolRef {
    type Err = std::convert::Infallible;

    /// All-digit input is an id; anything else is a ticker, kept as supplied.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self::from(s))
    }
}

impl From<&str> for SymbolRef {
    fn from(s: &str) -> Self {
        match s.parse::<i64>() {
            Ok(id) if !s.starts_with('+') => Self::Id(id),
            _ => Self::Ticker(s.to_string()),
        }
    }
}

impl From<String> for SymbolRef {
    fn from(s: String) -> Self {
        Self::from(s.as_str())
    }
}

impl From<i64> for SymbolRef {
    fn from(id: i64) -> Self {
        Self::Id(id)
    }
}

impl fmt::Display for SymbolRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id(id) => write!(f, "{id}"),
            Self::Ticker(ticker) => f.write_str(ticker),
        }
    }
}

/// Process-wide ticker → id map. Tickers are case-sensitive; the last write wins.
#[derive(Debug, Default)]
pub struct SymbolCache {
    entries: DashMap<String, i64>,
}

impl SymbolCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a cache, e.g. from a snapshot saved by a previous run.
    pub fn from_entries(entries: impl IntoIterator<Item = (String, i64)>) -> Self {
        Self {
            entries: entries.into_iter().collect(),
        }
    }

    pub fn get(&self, ticker: &str) -> Option<i64> {
        self.entries.get(ticker).map(|entry| *entry.value())
    }

    pub fn insert(&self, ticker: impl Into<String>, id: i64) {
        self.entries.insert(ticker.into(), id);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Ordered copy of the current entries.
    pub fn snapshot(&self) -> BTreeMap<String, i64> {
        self.entries
            .iter()
            .map(|entry| (entry.key().clone(), *entry.value()))
            .collect()
    }
}

/// Remote prefix search used on a cache miss.
#[async_trait]
pub trait SymbolSearch: Send + Sync {
    async fn search_symbols(&self, prefix: &str, offset: u32) -> Result<SymbolSearchResponse>;
}

/// Descriptor for `symbols/search`.
pub fn search_descriptor(prefix: &str, offset: u32) -> RequestDescriptor {
    RequestDescriptor::get(SYMBOL_SEARCH_ENDPOINT)
        .param("prefix", prefix)
        .param("offset", offset)
}

#[async_trait]
impl SymbolSearch for Dispatcher {
    async fn search_symbols(&self, prefix: &str, offset: u32) -> Result<SymbolSearchResponse> {
        self.call(&search_descriptor(prefix, offset)).await
    }
}

pub struct SymbolResolver {
    cache: Arc<SymbolCache>,
    search: Arc<dyn SymbolSearch>,
}

impl SymbolResolver {
    pub fn new(cache: Arc<SymbolCache>, search: Arc<dyn SymbolSearch>) -> Self {
        Self { cache, search }
    }

    pub fn cache(&self) -> &Arc<SymbolCache> {
        &self.cache
    }

    /// Resolve to an id, or `None` when the broker returned no usable match.
    pub async fn lookup(&self, symbol: impl Into<SymbolRef>) -> Result<Option<i64>> {
        let ticker = match symbol.into() {
            SymbolRef::Id(id) => return Ok(Some(id)),
            SymbolRef::Ticker(ticker) => ticker,
        };
        if ticker.is_empty() {
            return Err(ApiError::invalid_argument("symbol ticker is empty"));
        }

        if let Some(id) = self.cache.get(&ticker) {
            debug!(ticker = %ticker, id, "Symbol cache hit");
            return Ok(Some(id));
        }

        let response = self.search.search_symbols(&ticker, 0).await?;
        let Some(id) = response.symbols.first().and_then(|s| s.symbol_id) else {
            warn!(ticker = %ticker, "Symbol not found");
            return Ok(None);
        };

        debug!(ticker = %ticker, id, "Symbol resolved");
        self.cache.insert(ticker, id);
        Ok(Some(id))
    }

    /// Resolve to an id, or [`NOT_FOUND_SYMBOL_ID`] when there is no match.
    pub async fn resolve(&self, symbol: impl Into<SymbolRef>) -> Result<i64> {
        Ok(self.lookup(symbol).await?.unwrap_or(NOT_FOUND_SYMBOL_ID))
    }

    /// Resolve each input in order. A failure only affects its own slot.
    pub async fn resolve_many<I>(&self, symbols: I) -> Vec<Result<i64>>
    where
        I: IntoIterator,
        I::Item: Into<SymbolRef>,
    {
        let mut resolved = Vec::new();
        for symbol in symbols {
            resolved.push(self.resolve(symbol).await);
        }
        resolved
    }
}
