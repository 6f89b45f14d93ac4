//! Registry client error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("Invalid registry URL: {0}")]
    InvalidUrl(String),

    #[error("TLS setup failed: {0}")]
    Tls(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Registry did not answer within {0:?}")]
    Timeout(std::time::Duration),

    #[error("Registry returned status {0}")]
    Status(u16),

    #[error("Invalid response: {0}")]
    InvalidResponse(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(String),
}
