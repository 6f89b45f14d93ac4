//! HTTP request handlers

use bytes::Bytes;
use http_body_util::Full;
use hyper::header::{HeaderValue, CONTENT_TYPE, SERVER};
use hyper::{Method, Request, Response, StatusCode};
use serde::Serialize;
use serde_json::json;
use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};
use vacancies_core::auth::{AuthorityGate, AuthorityRequest, Outcome};
use vacancies_core::{ServiceOperation, TenantId};

use crate::messages::Message;

type BoxBody = Full<Bytes>;

const SERVER_HEADER: &str = concat!("vacancies/", env!("CARGO_PKG_VERSION"));

/// Non-standard status telling the caller to re-sign with a fresh timestamp
pub fn signature_timeout_status() -> StatusCode {
    StatusCode::from_u16(419).unwrap_or(StatusCode::UNAUTHORIZED)
}

/// Shared per-process handler state
pub struct AppState {
    pub gate: AuthorityGate,
    /// Echo diagnostics in rejection bodies
    pub debug: bool,
}

impl AppState {
    pub fn new(gate: AuthorityGate) -> Self {
        let debug = cfg!(feature = "signature-debug") && gate.config().debug;
        AppState { gate, debug }
    }
}

/// Malformed signing parameters, rejected before the gate runs
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ParamError {
    #[error("query parameter '{0}' is required")]
    Missing(&'static str),

    #[error("query parameter '{name}' is invalid: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// Signing parameters as the vacancy endpoints receive them
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorityParams {
    pub project_id: TenantId,
    pub service: ServiceOperation,
    pub items_id: String,
    pub time: String,
    pub signature: String,
}

impl AuthorityParams {
    pub fn from_query(query: &str) -> Result<Self, ParamError> {
        let mut params: HashMap<String, String> = url::form_urlencoded::parse(query.as_bytes())
            .into_owned()
            .collect();

        let project_id = params
            .remove("project_id")
            .ok_or(ParamError::Missing("project_id"))?;
        let project_id = TenantId::parse(&project_id).map_err(|e| ParamError::Invalid {
            name: "project_id",
            reason: e.to_string(),
        })?;

        let service = params
            .remove("service")
            .ok_or(ParamError::Missing("service"))?;
        let service = service
            .parse::<ServiceOperation>()
            .map_err(|e| ParamError::Invalid {
                name: "service",
                reason: e.to_string(),
            })?;

        Ok(AuthorityParams {
            project_id,
            service,
            items_id: params.remove("items_id").unwrap_or_default(),
            time: params.remove("time").unwrap_or_default(),
            signature: params.remove("signature").unwrap_or_default(),
        })
    }

    pub fn as_request(&self) -> AuthorityRequest<'_> {
        AuthorityRequest::new(self.project_id, &self.signature, self.service.as_str())
            .with_path_id(&self.items_id)
            .with_timestamp(&self.time)
    }
}

/// Main request handler
pub async fn handle_request<B>(
    req: Request<B>,
    state: Arc<AppState>,
) -> Result<Response<BoxBody>, Infallible> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    debug!("Handling {} {}", method, path);

    let response = match (&method, path.as_str()) {
        (&Method::GET, "/health") => handle_health(),
        (&Method::GET, "/v1/authority") => {
            handle_authority(req.uri().query().unwrap_or(""), &state).await
        }
        _ => json_response(StatusCode::NOT_FOUND, &Message::not_found()),
    };

    info!("{} {} -> {}", method, path, response.status());
    Ok(response)
}

fn handle_health() -> Response<BoxBody> {
    json_response(
        StatusCode::OK,
        &json!({
            "status": "healthy",
            "version": env!("CARGO_PKG_VERSION"),
            "service": "vacancies"
        }),
    )
}

async fn handle_authority(query: &str, state: &AppState) -> Response<BoxBody> {
    let params = match AuthorityParams::from_query(query) {
        Ok(params) => params,
        Err(e) => {
            return json_response(
                StatusCode::UNPROCESSABLE_ENTITY,
                &Message::validation_error(e.to_string()),
            )
        }
    };

    let outcome = state.gate.check(&params.as_request()).await;
    outcome_response(outcome, &params.project_id, state)
}

/// Map a gate outcome onto status and body
pub fn outcome_response(
    outcome: Outcome,
    project_id: &TenantId,
    state: &AppState,
) -> Response<BoxBody> {
    match outcome {
        Outcome::Authorized => json_response(StatusCode::OK, &Message::authorized()),
        Outcome::Stale { age_seconds } => {
            debug!(project_id = %project_id, age_seconds, "stale signature");
            let now = state.debug.then(|| state.gate.now());
            json_response(signature_timeout_status(), &Message::timeout_signature(now))
        }
        Outcome::UnknownTenant { reason } => {
            debug!(project_id = %project_id, reason = %reason, "project token unavailable");
            json_response(
                StatusCode::NOT_FOUND,
                &Message::project_not_found_or_registry_unavailable(project_id),
            )
        }
        Outcome::InvalidTimestamp { raw } => {
            json_response(StatusCode::UNAUTHORIZED, &Message::invalid_timestamp(&raw))
        }
        Outcome::Unauthorized { diagnostics } => {
            let diagnostics = diagnostics.filter(|_| state.debug);
            json_response(
                StatusCode::UNAUTHORIZED,
                &Message::invalid_signature().with_diagnostics(diagnostics),
            )
        }
    }
}

/// JSON response with the service headers
pub fn json_response(status: StatusCode, body: &impl Serialize) -> Response<BoxBody> {
    let body = serde_json::to_vec(body).unwrap_or_else(|_| b"{}".to_vec());
    let mut response = Response::new(Full::new(Bytes::from(body)));
    *response.status_mut() = status;
    let headers = response.headers_mut();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(SERVER, HeaderValue::from_static(SERVER_HEADER));
    response
}
