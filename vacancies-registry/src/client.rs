//! Registry service HTTP client
//!
//! The Registry answers `GET <base_url><project_id>` with
//! `{"results": [{"object_code": "<api token>", ...}, ...]}`. The first record
//! carries the project's API token; an empty `results` list means the project
//! is unknown.

use async_trait::async_trait;
use bytes::Bytes;
use http_body_util::{BodyExt, Empty};
use hyper::header::CONTENT_TYPE;
use hyper::{Method, Request, StatusCode, Uri};
use hyper_rustls::{HttpsConnector, HttpsConnectorBuilder};
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;
use vacancies_core::auth::{ApiToken, LookupError, TokenSource};
use vacancies_core::TenantId;

use crate::{RegistryError, Result};

/// Upper bound on a single Registry round trip
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Body of a Registry lookup
#[derive(Clone, Deserialize)]
pub struct RegistryResponse {
    pub results: Vec<RegistryRecord>,
}

/// One Registry record; fields other than the token are ignored
#[derive(Clone, Deserialize)]
pub struct RegistryRecord {
    #[serde(default)]
    pub object_code: Option<String>,
}

impl RegistryResponse {
    /// Token from the first record, if it carries a non-empty one
    pub fn into_token(self) -> Option<ApiToken> {
        self.results
            .into_iter()
            .next()
            .and_then(|record| record.object_code)
            .filter(|code| !code.is_empty())
            .map(ApiToken::new)
    }
}

/// Registry client
#[derive(Clone)]
pub struct RegistryClient {
    base_url: String,
    timeout: Duration,
    http: Client<HttpsConnector<HttpConnector>, Empty<Bytes>>,
}

impl RegistryClient {
    /// Create new client; the tenant id is appended verbatim to `base_url`
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let base_url = base_url.into();
        let parsed = url::Url::parse(&base_url)
            .map_err(|e| RegistryError::InvalidUrl(format!("{}: {}", base_url, e)))?;

        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(RegistryError::InvalidUrl(format!(
                "unsupported scheme '{}' in {}",
                parsed.scheme(),
                base_url
            )));
        }

        let https = HttpsConnectorBuilder::new()
            .with_provider_and_webpki_roots(rustls::crypto::ring::default_provider())
            .map_err(|e| RegistryError::Tls(e.to_string()))?
            .https_or_http()
            .enable_http1()
            .build();
        let http = Client::builder(TokioExecutor::new()).build(https);

        Ok(RegistryClient {
            base_url,
            timeout,
            http,
        })
    }

    fn lookup_uri(&self, tenant_id: &TenantId) -> Result<Uri> {
        let raw = format!("{}{}", self.base_url, tenant_id);
        raw.parse::<Uri>()
            .map_err(|e| RegistryError::InvalidUrl(format!("{}: {}", raw, e)))
    }

    /// Fetch the API token of `tenant_id`
    ///
    /// `Ok(None)` when the Registry answers 200 without a usable record. Any
    /// other status, a transport failure, or a timeout is an error.
    pub async fn lookup(&self, tenant_id: &TenantId) -> Result<Option<ApiToken>> {
        let request = Request::builder()
            .method(Method::GET)
            .uri(self.lookup_uri(tenant_id)?)
            .header(CONTENT_TYPE, "application/json")
            .body(Empty::<Bytes>::new())
            .map_err(|e| RegistryError::Http(e.to_string()))?;

        let (status, body) = tokio::time::timeout(self.timeout, self.send(request))
            .await
            .map_err(|_| RegistryError::Timeout(self.timeout))??;

        debug!(tenant_id = %tenant_id, status = status.as_u16(), "registry lookup");

        if status != StatusCode::OK {
            return Err(RegistryError::Status(status.as_u16()));
        }

        let response: RegistryResponse = serde_json::from_slice(&body)?;
        Ok(response.into_token())
    }

    async fn send(&self, request: Request<Empty<Bytes>>) -> Result<(StatusCode, Bytes)> {
        let response = self
            .http
            .request(request)
            .await
            .map_err(|e| RegistryError::Connection(e.to_string()))?;

        let status = response.status();
        let body = response
            .into_body()
            .collect()
            .await
            .map_err(|e| RegistryError::Http(e.to_string()))?
            .to_bytes();

        Ok((status, body))
    }
}

#[async_trait]
impl TokenSource for RegistryClient {
    async fn fetch(
        &self,
        tenant_id: &TenantId,
    ) -> std::result::Result<Option<ApiToken>, LookupError> {
        self.lookup(tenant_id)
            .await
            .map_err(|e| LookupError(e.to_string()))
    }
}
