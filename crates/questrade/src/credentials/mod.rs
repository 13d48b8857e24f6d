//! Credential management module.
//!
//! # Architecture
//!
//! - [`Credential`]: the bearer token record with its fixed expiry
//! - [`CredentialStore`]: persistence of the current credential
//! - [`TokenExchange`]: the refresh-token grant
//! - [`LoginProvider`]: mints a new credential when refresh is not possible
//! - [`CredentialManager`]: orchestrates load, refresh and reacquisition

mod error;
mod exchange;
mod login;
mod manager;
mod store;
mod types;

pub use error::CredentialError;
pub use exchange::{HttpTokenExchange, TokenExchange};
pub use login::{LoginProvider, ManualTokenLogin, NoLogin};
pub use manager::CredentialManager;
pub use store::{CredentialStore, FileCredentialStore, MemoryCredentialStore, TOKEN_FILE_NAME};
pub use types::{Credential, CredentialStatus, TokenResponse};

pub(crate) use types::redact;
