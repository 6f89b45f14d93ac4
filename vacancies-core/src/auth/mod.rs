//! Request authenticity verification for the vacancies service
//!
//! This module implements the signing scheme shared with every caller:
//! - Canonical message construction from request fields
//! - HMAC-SHA256 signing with constant-time verification
//! - Per-tenant API token resolution backed by the Registry service
//! - The authority gate that enforces the replay window

pub mod canonical;
pub mod gate;
pub mod signer;
pub mod timing;
pub mod token;

pub use canonical::*;
pub use gate::*;
pub use signer::*;
pub use timing::*;
pub use token::*;
