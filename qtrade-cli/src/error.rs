use questrade_api::{ApiError, CredentialError};
use serde_json::{Value, json};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("Credential error: {0}")]
    Credential(#[from] CredentialError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid config file: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Structured payload printed when a command fails.
    pub fn to_json(&self) -> Value {
        match self {
            Self::Api(api) => json!({
                "status": "error",
                "error": api,
                "message": api.to_string(),
            }),
            other => json!({
                "status": "error",
                "message": other.to_string(),
            }),
        }
    }
}
