//! Client for the Registry service, the authority that issues per-project
//! API tokens

pub mod client;
pub mod error;

pub use client::{RegistryClient, RegistryRecord, RegistryResponse, DEFAULT_TIMEOUT};
pub use error::RegistryError;

pub type Result<T> = std::result::Result<T, RegistryError>;
