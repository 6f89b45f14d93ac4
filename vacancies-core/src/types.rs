//! Core data types for the vacancies service

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

/// Project on whose behalf a signed request is made
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TenantId(Uuid);

impl TenantId {
    /// Parse a tenant id from its textual UUID form
    pub fn parse(raw: &str) -> crate::Result<Self> {
        Uuid::parse_str(raw)
            .map(TenantId)
            .map_err(|e| crate::Error::InvalidTenantId(format!("'{}': {}", raw, e)))
    }
}

impl From<Uuid> for TenantId {
    fn from(uuid: Uuid) -> Self {
        TenantId(uuid)
    }
}

impl FromStr for TenantId {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        TenantId::parse(s)
    }
}

/// Lowercase hyphenated form; this is what gets signed.
impl std::fmt::Display for TenantId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

/// Operation categories the vacancy endpoints sign for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ServiceOperation {
    #[serde(rename = "vacancies")]
    Vacancies,
    #[serde(rename = "responses by user")]
    ResponsesByUser,
    #[serde(rename = "responses by vacancy")]
    ResponsesByVacancy,
    #[serde(rename = "update vacancies")]
    UpdateVacancies,
    #[serde(rename = "add vacancies")]
    AddVacancies,
}

impl ServiceOperation {
    pub const ALL: [ServiceOperation; 5] = [
        ServiceOperation::Vacancies,
        ServiceOperation::ResponsesByUser,
        ServiceOperation::ResponsesByVacancy,
        ServiceOperation::UpdateVacancies,
        ServiceOperation::AddVacancies,
    ];

    /// Wire label used in the canonical message
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceOperation::Vacancies => "vacancies",
            ServiceOperation::ResponsesByUser => "responses by user",
            ServiceOperation::ResponsesByVacancy => "responses by vacancy",
            ServiceOperation::UpdateVacancies => "update vacancies",
            ServiceOperation::AddVacancies => "add vacancies",
        }
    }
}

impl FromStr for ServiceOperation {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        ServiceOperation::ALL
            .iter()
            .copied()
            .find(|op| op.as_str() == s)
            .ok_or_else(|| crate::Error::UnknownOperation(s.to_string()))
    }
}

impl std::fmt::Display for ServiceOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
