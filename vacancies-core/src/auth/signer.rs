//! HMAC-SHA256 signing and verification

use hmac::{Hmac, Mac};
use sha2::Sha256;

use super::timing::constant_time_str_compare;
use crate::{Error, Result};

type HmacSha256 = Hmac<Sha256>;

/// Sign `message` under `secret`, returning the lowercase hex digest (64 chars).
pub fn sign(secret: &str, message: &str) -> Result<String> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| Error::InvalidKey(e.to_string()))?;
    mac.update(message.as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Recompute the signature of `message` and compare it with `supplied`.
///
/// Never fails: a malformed or wrong-length `supplied` simply yields `false`,
/// and so does a key the MAC refuses. The comparison is over the hex text, so
/// an uppercase rendering of the correct digest is rejected, as existing
/// signers emit lowercase.
pub fn verify(secret: &str, message: &str, supplied: &str) -> bool {
    match sign(secret, message) {
        Ok(expected) => constant_time_str_compare(&expected, supplied),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rfc4231_case_2() {
        assert_eq!(
            sign("Jefe", "what do ya want for nothing?").unwrap(),
            "5bdcc146bf60754e6a042426089575c75a003f089d2739839dec58b964ec3843"
        );
    }

    #[test]
    fn test_signature_shape() {
        let signature = sign("API_TOKEN", "test_message").unwrap();
        assert_eq!(signature.len(), 64);
        assert!(signature
            .chars()
            .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
    }

    #[test]
    fn test_verify_accepts_own_signature() {
        let message = "3fa85f64-5717-4562-b3fc-2c963f66afa6:test_data_fields:test_items_id:test_time";
        let signature = sign("test_key", message).unwrap();
        assert_eq!(
            signature,
            "7b0a65b3016814b23eced145f5ba5aa45bcd96297915f75e221e0b6c1ae1d518"
        );
        assert!(verify("test_key", message, &signature));
    }

    #[test]
    fn test_verify_rejects_mismatch() {
        let message = "3fa85f64-5717-4562-b3fc-2c963f66afa6:vacancies";
        assert!(!verify("s3cr3t", message, "0000000000000000000000000"));
        assert!(!verify("s3cr3t", message, ""));
        assert!(!verify("other", message, &sign("s3cr3t", message).unwrap()));
        assert!(!verify("s3cr3t", message, &sign("s3cr3t", message).unwrap().to_uppercase()));
    }

    #[test]
    fn test_empty_key_signs() {
        let signature = sign("", "3fa85f64-5717-4562-b3fc-2c963f66afa6:vacancies").unwrap();
        assert_eq!(signature.len(), 64);
        assert!(verify("", "3fa85f64-5717-4562-b3fc-2c963f66afa6:vacancies", &signature));
    }
}
