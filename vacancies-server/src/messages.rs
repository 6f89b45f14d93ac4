//! Response bodies shared with the vacancy endpoints
//!
//! Every rejection is `{"detail": [{"msg": ..., "type": ...}]}`.

use serde::{Deserialize, Serialize};
use vacancies_core::auth::SignatureDiagnostics;
use vacancies_core::TenantId;

pub const TYPE_AUTHORIZED: &str = "authorized";
pub const TYPE_NOT_FOUND: &str = "not_found";
pub const TYPE_INVALID_SIGNATURE: &str = "invalid_signature";
pub const TYPE_AUTHENTICATION_ERROR: &str = "authentication_error";
pub const TYPE_VALIDATION_ERROR: &str = "validation_error";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detail {
    pub msg: String,
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub detail: Vec<Detail>,
    /// Present only on signature mismatch in debug builds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diagnostics: Option<SignatureDiagnostics>,
}

impl Message {
    pub fn new(msg: impl Into<String>, kind: &str) -> Self {
        Message {
            detail: vec![Detail {
                msg: msg.into(),
                kind: kind.to_string(),
            }],
            diagnostics: None,
        }
    }

    pub fn with_diagnostics(mut self, diagnostics: Option<SignatureDiagnostics>) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    pub fn authorized() -> Self {
        Message::new("Signature is valid", TYPE_AUTHORIZED)
    }

    pub fn invalid_signature() -> Self {
        Message::new("Invalid signature", TYPE_INVALID_SIGNATURE)
    }

    pub fn invalid_timestamp(raw: &str) -> Self {
        Message::new(format!("Invalid timestamp {}", raw), TYPE_INVALID_SIGNATURE)
    }

    /// Body for a timestamp outside the replay window
    pub fn timeout_signature(debug_now: Option<f64>) -> Self {
        let info = match debug_now {
            Some(now) => format!("Now timestamp is {}", now),
            None => "You need a new signature".to_string(),
        };
        Message::new(
            format!("Timeout signature {}", info),
            TYPE_AUTHENTICATION_ERROR,
        )
    }

    pub fn project_not_found_or_registry_unavailable(tenant_id: &TenantId) -> Self {
        Message::new(
            format!(
                "ID project group of companies  {} is not found or Registry service is not available",
                tenant_id
            ),
            TYPE_NOT_FOUND,
        )
    }

    pub fn validation_error(msg: impl Into<String>) -> Self {
        Message::new(msg, TYPE_VALIDATION_ERROR)
    }

    pub fn not_found() -> Self {
        Message::new("Not found", TYPE_NOT_FOUND)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detail_shape() {
        let body = serde_json::to_value(Message::invalid_signature()).unwrap();
        assert_eq!(
            body,
            serde_json::json!({"detail": [{"msg": "Invalid signature", "type": "invalid_signature"}]})
        );
    }

    #[test]
    fn test_timeout_message() {
        assert_eq!(
            Message::timeout_signature(None).detail[0].msg,
            "Timeout signature You need a new signature"
        );
        assert_eq!(
            Message::timeout_signature(Some(1700000000.5)).detail[0].msg,
            "Timeout signature Now timestamp is 1700000000.5"
        );
    }
}
