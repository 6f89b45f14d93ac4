//! Property-based tests for request signing

use proptest::prelude::*;
use std::sync::Arc;
use vacancies_core::auth::*;
use vacancies_core::test_utils::{tenant, FixedClock};

fn segment() -> impl Strategy<Value = String> {
    "[a-z0-9 .-]{0,12}"
}

proptest! {
    #[test]
    fn props_sign_then_verify_accepts(secret in ".{0,40}", message in ".{0,200}") {
        let signature = sign(&secret, &message).unwrap();
        prop_assert_eq!(signature.len(), 64);
        prop_assert!(verify(&secret, &message, &signature));
    }

    #[test]
    fn props_corrupted_signature_is_rejected(
        secret in ".{0,40}",
        message in ".{0,200}",
        position in 0usize..64,
    ) {
        let signature = sign(&secret, &message).unwrap();
        let mut corrupted: Vec<char> = signature.chars().collect();
        corrupted[position] = if corrupted[position] == '0' { '1' } else { '0' };
        let corrupted: String = corrupted.into_iter().collect();

        prop_assert!(!verify(&secret, &message, &corrupted));
        prop_assert!(!verify(&secret, &message, &signature[..position]));
    }

    #[test]
    fn props_canonical_message_drops_empty_fields(
        operation in segment(),
        path_id in segment(),
        timestamp in segment(),
        salt in segment(),
    ) {
        let tenant_id = tenant(1).to_string();
        let fields = SigningFields::new(&tenant_id, &operation)
            .with_path_id(&path_id)
            .with_timestamp(&timestamp);

        let expected: Vec<&str> = [
            tenant_id.as_str(),
            operation.as_str(),
            path_id.as_str(),
            timestamp.as_str(),
            salt.as_str(),
        ]
        .into_iter()
        .filter(|s| !s.is_empty())
        .collect();

        let message = fields.canonical_message(Some(&salt));
        prop_assert_eq!(&message, &expected.join(":"));
        prop_assert!(!message.contains("::"));
        prop_assert!(!message.ends_with(':'));
    }

    #[test]
    fn props_check_is_deterministic(signature in "[0-9a-f]{0,64}", age in 0u32..400) {
        let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
        rt.block_on(async {
            let t = tenant(9);
            let cache = Arc::new(TokenCache::with_entries([(t, ApiToken::new("s3cr3t"))]));
            let gate = AuthorityGate::new(TokenResolver::cache_only(cache), GateConfig::default())
                .with_clock(Arc::new(FixedClock(1_700_000_000.0)));

            let timestamp = (1_700_000_000u64 - u64::from(age)).to_string();
            let request = AuthorityRequest::new(t, &signature, "vacancies")
                .with_timestamp(&timestamp);

            let first = gate.check(&request).await;
            let second = gate.check(&request).await;
            assert_eq!(&first, &second);
            assert_eq!(matches!(first, Outcome::Stale { .. }), age > 180);
        });
    }
}

#[cfg(test)]
mod scenario_tests {
    use super::*;

    #[test]
    fn test_end_to_end_vector() {
        let tenant_id = "3fa85f64-5717-4562-b3fc-2c963f66afa6";
        let message = SigningFields::new(tenant_id, "vacancies").canonical_message(Some(""));
        assert_eq!(message, format!("{}:vacancies", tenant_id));
        assert_eq!(
            sign("s3cr3t", &message).unwrap(),
            "95332182c6d697894fa1276fb428416118ad5dedaa811cfd8ede35c82791523f"
        );
    }
}
