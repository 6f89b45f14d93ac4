//! Constant-time comparison operations
//!
//! Signature checks go through these helpers so that the time taken does not
//! depend on the position of the first mismatching byte.

use subtle::ConstantTimeEq;

/// Constant-time byte comparison
pub fn constant_time_bytes_compare(lhs: &[u8], rhs: &[u8]) -> bool {
    if lhs.len() != rhs.len() {
        return false;
    }

    lhs.ct_eq(rhs).into()
}

/// Constant-time string comparison (for signatures, tokens)
pub fn constant_time_str_compare(lhs: &str, rhs: &str) -> bool {
    constant_time_bytes_compare(lhs.as_bytes(), rhs.as_bytes())
}
