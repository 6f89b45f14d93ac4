//! Core types and request authenticity verification for the vacancies service

pub mod auth;
pub mod error;
pub mod types;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use error::*;
pub use types::*;

/// Result type alias for vacancies operations
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tenant_id_parsing() {
        let tenant = TenantId::parse("3fa85f64-5717-4562-b3fc-2c963f66afa6").unwrap();
        assert_eq!(tenant.to_string(), "3fa85f64-5717-4562-b3fc-2c963f66afa6");
    }

    #[test]
    fn test_tenant_id_validation() {
        assert!(TenantId::parse("").is_err());
        assert!(TenantId::parse("not-a-uuid").is_err());
        assert!(TenantId::parse("3fa85f64-5717-4562-b3fc").is_err());
    }

    #[test]
    fn test_service_operation_labels() {
        assert_eq!(ServiceOperation::Vacancies.as_str(), "vacancies");
        assert_eq!(
            "responses by user".parse::<ServiceOperation>().unwrap(),
            ServiceOperation::ResponsesByUser
        );
        assert!("Vacancies".parse::<ServiceOperation>().is_err());
    }
}
