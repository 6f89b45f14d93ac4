//! API token resolution
//!
//! Every tenant signs with its own API token, issued by the Registry service.
//! [`TokenResolver`] looks tokens up in an injected [`TokenCache`] first and
//! only falls back to the remote [`TokenSource`] on a miss.
//!
//! ```text
//! resolve(tenant) → cache hit?  → token
//!                 → no source?  → NotFound(NoAuthority)
//!                 → fetch       → Some(token) → cache, token
//!                               → None        → NotFound(UnknownTenant)
//!                               → Err         → NotFound(AuthorityUnavailable)
//! ```
//!
//! Failures are never cached, so the next request asks the Registry again.
//! Concurrent first lookups of the same tenant may both hit the Registry;
//! the last insert wins and the values are expected to be identical.

use async_trait::async_trait;
use parking_lot::RwLock;
use rand::RngCore;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::TenantId;

/// Shared secret used as the HMAC key for one tenant
#[derive(Clone, PartialEq, Eq)]
pub struct ApiToken(String);

impl ApiToken {
    pub fn new(token: impl Into<String>) -> Self {
        ApiToken(token.into())
    }

    /// Generate a fresh random token (128 bits, lowercase hex)
    pub fn generate() -> Self {
        let mut bytes = [0u8; 16];
        rand::thread_rng().fill_bytes(&mut bytes);
        ApiToken(hex::encode(bytes))
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Debug for ApiToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ApiToken(<redacted>)")
    }
}

/// Process-lifetime tenant → token map
///
/// Entries never expire; only [`TokenCache::clear`] drops them.
#[derive(Debug, Default)]
pub struct TokenCache {
    tokens: RwLock<HashMap<TenantId, ApiToken>>,
}

impl TokenCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a cache pre-seeded with static tokens
    pub fn with_entries(entries: impl IntoIterator<Item = (TenantId, ApiToken)>) -> Self {
        TokenCache {
            tokens: RwLock::new(entries.into_iter().collect()),
        }
    }

    pub fn get(&self, tenant_id: &TenantId) -> Option<ApiToken> {
        self.tokens.read().get(tenant_id).cloned()
    }

    pub fn insert(&self, tenant_id: TenantId, token: ApiToken) {
        self.tokens.write().insert(tenant_id, token);
    }

    pub fn len(&self) -> usize {
        self.tokens.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.read().is_empty()
    }

    pub fn clear(&self) {
        self.tokens.write().clear();
    }
}

/// Error reported by a [`TokenSource`] that could not answer
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("token lookup failed: {0}")]
pub struct LookupError(pub String);

/// Remote authority that issues API tokens
#[async_trait]
pub trait TokenSource: Send + Sync {
    /// Look up the token for `tenant_id`.
    ///
    /// `Ok(None)` means the authority answered and knows no such tenant.
    async fn fetch(&self, tenant_id: &TenantId) -> Result<Option<ApiToken>, LookupError>;
}

/// Why a tenant's token could not be resolved
///
/// All reasons map to the same external outcome; the distinction exists for logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotFoundReason {
    /// No Registry endpoint is configured
    NoAuthority,
    /// The Registry answered without a usable record
    UnknownTenant,
    /// The Registry could not be reached or answered with an error
    AuthorityUnavailable,
}

impl NotFoundReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotFoundReason::NoAuthority => "no_authority",
            NotFoundReason::UnknownTenant => "unknown_tenant",
            NotFoundReason::AuthorityUnavailable => "authority_unavailable",
        }
    }
}

impl std::fmt::Display for NotFoundReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Cache-first token resolver
#[derive(Clone)]
pub struct TokenResolver {
    cache: Arc<TokenCache>,
    source: Option<Arc<dyn TokenSource>>,
}

impl TokenResolver {
    pub fn new(cache: Arc<TokenCache>, source: Option<Arc<dyn TokenSource>>) -> Self {
        TokenResolver { cache, source }
    }

    /// Resolver that only knows the tokens already in `cache`
    pub fn cache_only(cache: Arc<TokenCache>) -> Self {
        TokenResolver::new(cache, None)
    }

    pub async fn resolve(&self, tenant_id: &TenantId) -> Result<ApiToken, NotFoundReason> {
        if let Some(token) = self.cache.get(tenant_id) {
            return Ok(token);
        }

        let Some(source) = self.source.as_ref() else {
            debug!(
                tenant_id = %tenant_id,
                reason = NotFoundReason::NoAuthority.as_str(),
                "no token authority configured"
            );
            return Err(NotFoundReason::NoAuthority);
        };

        match source.fetch(tenant_id).await {
            Ok(Some(token)) if !token.is_empty() => {
                self.cache.insert(*tenant_id, token.clone());
                debug!(tenant_id = %tenant_id, "cached API token from authority");
                Ok(token)
            }
            Ok(_) => {
                debug!(
                    tenant_id = %tenant_id,
                    reason = NotFoundReason::UnknownTenant.as_str(),
                    "tenant not known to authority"
                );
                Err(NotFoundReason::UnknownTenant)
            }
            Err(e) => {
                warn!(
                    tenant_id = %tenant_id,
                    reason = NotFoundReason::AuthorityUnavailable.as_str(),
                    error = %e,
                    "token authority unavailable"
                );
                Err(NotFoundReason::AuthorityUnavailable)
            }
        }
    }
}
