//! Canonical message construction
//!
//! The signed message is the `:`-joined list of the non-empty request fields,
//! always in the order tenant id, operation label, path id, timestamp, followed
//! by the server-side salt when one is configured. Empty fields are dropped
//! rather than kept as empty segments, so `("", "X")` and `("X", "")` for
//! operation and path id produce the same message. Existing signers depend on
//! this exact layout; do not reorder or pad.

/// Delimiter between canonical message segments
pub const CANONICAL_DELIMITER: &str = ":";

/// Request fields covered by the signature
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SigningFields<'a> {
    pub tenant_id: &'a str,
    pub operation: &'a str,
    pub path_id: &'a str,
    pub timestamp: &'a str,
}

impl<'a> SigningFields<'a> {
    pub fn new(tenant_id: &'a str, operation: &'a str) -> Self {
        SigningFields {
            tenant_id,
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

    /// Segments in signing order, empty ones omitted
    pub fn segments<'s>(&self, salt: Option<&'s str>) -> Vec<&'s str>
    where
        'a: 's,
    {
        [self.tenant_id, self.operation, self.path_id, self.timestamp]
            .into_iter()
            .chain(salt)
            .filter(|segment| !segment.is_empty())
            .collect()
    }

    /// Build the canonical string for signing
    pub fn canonical_message(&self, salt: Option<&str>) -> String {
        self.segments(salt).join(CANONICAL_DELIMITER)
    }
}
