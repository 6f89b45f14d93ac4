//! Test doubles for token resolution and time

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::auth::{ApiToken, Clock, LookupError, TokenSource};
use crate::TenantId;

/// Deterministic tenant id for tests
pub fn tenant(n: u128) -> TenantId {
    TenantId::from(uuid::Uuid::from_u128(n))
}

/// Clock frozen at a fixed epoch second
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub f64);

impl Clock for FixedClock {
    fn now(&self) -> f64 {
        self.0
    }
}

/// Authority backed by a fixed table
#[derive(Debug, Default)]
pub struct StaticSource {
    tokens: HashMap<TenantId, ApiToken>,
}

impl StaticSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(mut self, tenant_id: TenantId, token: &str) -> Self {
        self.tokens.insert(tenant_id, ApiToken::new(token));
        self
    }
}

#[async_trait]
impl TokenSource for StaticSource {
    async fn fetch(&self, tenant_id: &TenantId) -> Result<Option<ApiToken>, LookupError> {
        Ok(self.tokens.get(tenant_id).cloned())
    }
}

/// Authority that is always unreachable
#[derive(Debug, Default, Clone, Copy)]
pub struct FailingSource;

#[async_trait]
impl TokenSource for FailingSource {
    async fn fetch(&self, _tenant_id: &TenantId) -> Result<Option<ApiToken>, LookupError> {
        Err(LookupError("connection refused".to_string()))
    }
}

/// Wraps a source and counts how often it is asked
#[derive(Debug)]
pub struct CountingSource<S> {
    inner: S,
    calls: AtomicUsize,
}

impl<S> CountingSource<S> {
    pub fn new(inner: S) -> Self {
        CountingSource {
            inner,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl<S: TokenSource> TokenSource for CountingSource<S> {
    async fn fetch(&self, tenant_id: &TenantId) -> Result<Option<ApiToken>, LookupError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.fetch(tenant_id).await
    }
}
