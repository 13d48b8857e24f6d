//! Questrade: client for the Questrade REST API.
//!
//! ## Credentials
//!
//! - [`CredentialManager`] - Hands out a valid bearer credential, refreshing or re-acquiring it
//! - [`CredentialStore`] - Persistence seam ([`FileCredentialStore`], [`MemoryCredentialStore`])
//! - [`LoginProvider`] - Mints a brand-new credential ([`NoLogin`], [`ManualTokenLogin`])
//!
//! ## Dispatch
//!
//! - [`Dispatcher`] - Builds, sends and classifies authenticated calls
//! - [`RequestDescriptor`] - Endpoint template, path arguments, parameters and verb
//! - [`ApiError`] - Failure taxonomy of every call
//!
//! ## Calls
//!
//! - [`AccountApi`] - Time, accounts, positions, balances, executions, orders, activities
//! - [`SymbolResolver`] - Ticker to symbol id, cached
//!
//! [`QuestradeClient`] wires all of the above from one [`ClientConfig`].

pub mod account;
pub mod client;
pub mod config;
pub mod credentials;
pub mod dispatch;
pub mod error;
pub mod http_client;
pub mod symbols;
pub mod transport;

pub use account::{AccountApi, OrderRequest, OrdersQuery, TimeRange};
pub use client::{ClientBuilder, QuestradeClient};
pub use config::{ClientConfig, OrderDefaults, ProxyConfig};
pub use credentials::{
    Credential, CredentialError, CredentialManager, CredentialStatus, CredentialStore,
    FileCredentialStore, LoginProvider, ManualTokenLogin, MemoryCredentialStore, NoLogin,
};
pub use dispatch::{Dispatcher, RequestDescriptor};
pub use error::{ApiError, Result};
pub use symbols::{NOT_FOUND_SYMBOL_ID, SymbolCache, SymbolRef, SymbolResolver};
pub use transport::{HttpMethod, HttpRequest, HttpResponse, Transport, TransportError};
