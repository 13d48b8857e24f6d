//! Client assembly.

use std::sync::Arc;

use crate::account::AccountApi;
use crate::config::ClientConfig;
use crate::credentials::{
    CredentialManager, CredentialStore, HttpTokenExchange, LoginProvider, NoLogin, TokenExchange,
};
use crate::dispatch::Dispatcher;
use crate::http_client::build_client;
use crate::symbols::{SymbolCache, SymbolResolver};
use crate::transport::{ReqwestTransport, Transport};

/// Builder for [`QuestradeClient`].
///
/// Only the credential store is required. Everything else defaults to the reqwest
/// transport, the HTTP refresh exchange, no login provider and an empty symbol cache.
pub struct ClientBuilder {
    config: ClientConfig,
    store: Arc<dyn CredentialStore>,
    login: Option<Arc<dyn LoginProvider>>,
    transport: Option<Arc<dyn Transport>>,
    exchange: Option<Arc<dyn TokenExchange>>,
    symbol_cache: Option<Arc<SymbolCache>>,
}

impl ClientBuilder {
    pub fn new(config: ClientConfig, store: Arc<dyn CredentialStore>) -> Self {
        Self {
            config,
            store,
            login: None,
            transport: None,
            exchange: None,
            symbol_cache: None,
        }
    }

    pub fn login(mut self, login: Arc<dyn LoginProvider>) -> Self {
        self.login = Some(login);
        self
    }

    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn token_exchange(mut self, exchange: Arc<dyn TokenExchange>) -> Self {
        self.exchange = Some(exchange);
        self
    }

    pub fn symbol_cache(mut self, cache: Arc<SymbolCache>) -> Self {
        self.symbol_cache = Some(cache);
        self
    }

    pub fn build(self) -> QuestradeClient {
        let config = Arc::new(self.config);
        let transport = self.transport.unwrap_or_else(|| {
            Arc::new(ReqwestTransport::new(build_client(&config))) as Arc<dyn Transport>
        });
        let exchange = self.exchange.unwrap_or_else(|| {
            Arc::new(HttpTokenExchange::new(
                transport.clone(),
                config.refresh_url.clone(),
            ))
        });
        let login = self.login.unwrap_or_else(|| Arc::new(NoLogin));

        let credentials = Arc::new(CredentialManager::new(self.store, exchange, login));
        let dispatcher = Arc::new(Dispatcher::new(config, credentials.clone(), transport));
        let cache = self.symbol_cache.unwrap_or_default();
        let symbols = Arc::new(SymbolResolver::new(cache, dispatcher.clone()));
        let account = AccountApi::new(dispatcher.clone(), symbols.clone());

        QuestradeClient {
            credentials,
            dispatcher,
            symbols,
            account,
        }
    }
}

/// Fully wired client: credentials, dispatcher, symbol resolver and account calls share
/// one configuration.
pub struct QuestradeClient {
    credentials: Arc<CredentialManager>,
    dispatcher: Arc<Dispatcher>,
    symbols: Arc<SymbolResolver>,
    account: AccountApi,
}

impl QuestradeClient {
    pub fn builder(config: ClientConfig, store: Arc<dyn CredentialStore>) -> ClientBuilder {
        ClientBuilder::new(config, store)
    }

    pub fn credentials(&self) -> &Arc<CredentialManager> {
        &self.credentials
    }

    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.dispatcher
    }

    pub fn symbols(&self) -> &Arc<SymbolResolver> {
        &self.symbols
    }

    pub fn account(&self) -> &AccountApi {
        &self.account
    }
}
