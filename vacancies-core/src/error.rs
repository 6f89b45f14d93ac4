//! Error types for the vacancies service

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid tenant id: {0}")]
    InvalidTenantId(String),

    #[error("Unknown operation: {0}")]
    UnknownOperation(String),

    #[error("Invalid signing key: {0}")]
    InvalidKey(String),
}
