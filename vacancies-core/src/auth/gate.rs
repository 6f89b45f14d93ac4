//! Authority gate: the per-request signature check
//!
//! [`AuthorityGate::check`] runs, in order:
//! 1. replay window check on the optional client timestamp
//! 2. API token resolution for the tenant
//! 3. canonical message construction
//! 4. signature verification
//!
//! The gate keeps no state between calls apart from the shared token cache.
//! Future-dated timestamps are accepted; only timestamps older than the
//! replay window are rejected.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::debug;

use super::canonical::SigningFields;
use super::signer;
use super::token::{NotFoundReason, TokenResolver};
use crate::TenantId;

/// Maximum age of a client timestamp
pub const REPLAY_WINDOW: Duration = Duration::from_secs(180);

/// Source of the current time in epoch seconds
pub trait Clock: Send + Sync {
    fn now(&self) -> f64;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> f64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs_f64())
            .unwrap_or_default()
    }
}

/// Gate settings injected by the service configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateConfig {
    /// Appended as the last canonical segment when set and non-empty
    #[serde(default)]
    pub secret_salt: Option<String>,

    #[serde(default = "default_replay_window_secs")]
    pub replay_window_secs: u64,

    /// Echo signing inputs on mismatch. Only honoured when built with the
    /// `signature-debug` feature; never enable in production.
    #[serde(default)]
    pub debug: bool,
}

fn default_replay_window_secs() -> u64 {
    REPLAY_WINDOW.as_secs()
}

impl Default for GateConfig {
    fn default() -> Self {
        GateConfig {
            secret_salt: None,
            replay_window_secs: default_replay_window_secs(),
            debug: false,
        }
    }
}

impl GateConfig {
    pub fn replay_window(&self) -> Duration {
        Duration::from_secs(self.replay_window_secs)
    }

    pub fn salt(&self) -> Option<&str> {
        self.secret_salt.as_deref().filter(|salt| !salt.is_empty())
    }
}

/// Fields a caller supplies for one signed request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthorityRequest<'a> {
    pub tenant_id: TenantId,
    pub signature: &'a str,
    pub operation: &'a str,
    pub path_id: &'a str,
    pub timestamp: &'a str,
}

impl<'a> AuthorityRequest<'a> {
    pub fn new(tenant_id: TenantId, signature: &'a str, operation: &'a str) -> Self {
        AuthorityRequest {
            tenant_id,
            signature,
            operation,
            path_id: "",
            timestamp: "",
        }
    }

    pub fn with_path_id(mut self, path_id: &'a str) -> Self {
        self.path_id = path_id;
        self
    }

    pub fn with_timestamp(mut self, timestamp: &'a str) -> Self {
        self.timestamp = timestamp;
        self
    }
}

/// Signing inputs echoed back on mismatch in debug builds
///
/// Contains neither the API token nor the expected signature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignatureDiagnostics {
    pub tenant_id: String,
    pub operation: String,
    pub path_id: String,
    pub timestamp: String,
    pub now: f64,
    pub canonical_message: String,
}

/// Result of an authority check
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Authorized,
    /// Client timestamp is older than the replay window
    Stale { age_seconds: f64 },
    /// No API token could be resolved for the tenant
    UnknownTenant { reason: NotFoundReason },
    /// Client timestamp is not a finite number
    InvalidTimestamp { raw: String },
    /// Signature does not match
    Unauthorized {
        diagnostics: Option<SignatureDiagnostics>,
    },
}

impl Outcome {
    /// Short label for logs
    pub fn kind(&self) -> &'static str {
        match self {
            Outcome::Authorized => "authorized",
            Outcome::Stale { .. } => "stale",
            Outcome::UnknownTenant { .. } => "unknown_tenant",
            Outcome::InvalidTimestamp { .. } => "invalid_timestamp",
            Outcome::Unauthorized { .. } => "unauthorized",
        }
    }
}

/// Verifies signed requests on behalf of the vacancy endpoints
#[derive(Clone)]
pub struct AuthorityGate {
    resolver: TokenResolver,
    config: GateConfig,
    clock: Arc<dyn Clock>,
}

impl AuthorityGate {
    pub fn new(resolver: TokenResolver, config: GateConfig) -> Self {
        AuthorityGate {
            resolver,
            config,
            clock: Arc::new(SystemClock),
        }
    }

    /// Replace the clock (for testing)
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn config(&self) -> &GateConfig {
        &self.config
    }

    pub fn now(&self) -> f64 {
        self.clock.now()
    }

    pub async fn check(&self, request: &AuthorityRequest<'_>) -> Outcome {
        let outcome = self.evaluate(request).await;
        debug!(
            tenant_id = %request.tenant_id,
            operation = request.operation,
            outcome = outcome.kind(),
            "authority check"
        );
        outcome
    }

    async fn evaluate(&self, request: &AuthorityRequest<'_>) -> Outcome {
        let now = self.clock.now();

        if !request.timestamp.is_empty() {
            let timestamp = match request.timestamp.trim().parse::<f64>() {
                Ok(value) if value.is_finite() => value,
                _ => {
                    return Outcome::InvalidTimestamp {
                        raw: request.timestamp.to_string(),
                    }
                }
            };

            let age_seconds = now - timestamp;
            if age_seconds > self.config.replay_window().as_secs_f64() {
                return Outcome::Stale { age_seconds };
            }
        }

        let token = match self.resolver.resolve(&request.tenant_id).await {
            Ok(token) => token,
            Err(reason) => return Outcome::UnknownTenant { reason },
        };

        let tenant_id = request.tenant_id.to_string();
        let fields = SigningFields::new(&tenant_id, request.operation)
            .with_path_id(request.path_id)
            .with_timestamp(request.timestamp);
        let message = fields.canonical_message(self.config.salt());

        if signer::verify(token.expose(), &message, request.signature) {
            Outcome::Authorized
        } else {
            Outcome::Unauthorized {
                diagnostics: self.diagnostics(request, &tenant_id, message, now),
            }
        }
    }

    #[cfg(feature = "signature-debug")]
    fn diagnostics(
        &self,
        request: &AuthorityRequest<'_>,
        tenant_id: &str,
        canonical_message: String,
        now: f64,
    ) -> Option<SignatureDiagnostics> {
        self.config.debug.then(|| SignatureDiagnostics {
            tenant_id: tenant_id.to_string(),
            operation: request.operation.to_string(),
            path_id: request.path_id.to_string(),
            timestamp: request.timestamp.to_string(),
            now,
            canonical_message,
        })
    }

    #[cfg(not(feature = "signature-debug"))]
    fn diagnostics(
        &self,
        _request: &AuthorityRequest<'_>,
        _tenant_id: &str,
        _canonical_message: String,
        _now: f64,
    ) -> Option<SignatureDiagnostics> {
        None
    }
}
