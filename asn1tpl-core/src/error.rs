use crate::oid::OidCategory;
use thiserror::Error;

/// Errors produced by the ASN.1 template engines
///
/// Every required-path failure is fatal: the cursor position is undefined
/// after an error and callers must not continue with sibling fields.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Asn1Error {
    #[error("Truncated input: {0}")]
    TruncatedInput(String),

    #[error("Unexpected tag 0x{tag:02X} at offset {offset} (schema index {index})")]
    UnexpectedTag { index: usize, offset: usize, tag: u8 },

    #[error("Expected OBJECT IDENTIFIER at offset {offset} (schema index {index})")]
    ExpectedOid { index: usize, offset: usize },

    #[error("Expected BIT STRING at offset {offset} (schema index {index})")]
    ExpectedBitString { index: usize, offset: usize },

    #[error("Invalid encoding: {0}")]
    InvalidEncoding(String),

    #[error("Unknown OID (sum {sum}) for category {category}")]
    UnknownOid { category: OidCategory, sum: u32 },

    #[error("Trailing data: expected end at {expected}, cursor at {actual}")]
    TrailingData { expected: usize, actual: usize },

    #[error("No member of choice group {group} matched")]
    MissingChoice { group: u8 },

    #[error("Resource exhausted: {0}")]
    ResourceExhausted(String),

    #[error("Buffer too small: need {need}, got {got}")]
    BufferTooSmall { need: usize, got: usize },

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl Asn1Error {
    /// True for every flavour of tag mismatch on a required item
    pub fn is_unexpected_tag(&self) -> bool {
        matches!(
            self,
            Asn1Error::UnexpectedTag { .. }
                | Asn1Error::ExpectedOid { .. }
                | Asn1Error::ExpectedBitString { .. }
        )
    }
}

/// Result type alias for ASN.1 operations
pub type Asn1Result<T> = Result<T, Asn1Error>;

/// Error returned by the decode engine and the BER-to-DER canonicalizer
pub type DecodeError = Asn1Error;

/// Error returned by the encode engine
pub type EncodeError = Asn1Error;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unexpected_tag_family() {
        assert!(Asn1Error::UnexpectedTag { index: 0, offset: 0, tag: 0x30 }.is_unexpected_tag());
        assert!(Asn1Error::ExpectedOid { index: 1, offset: 2 }.is_unexpected_tag());
        assert!(Asn1Error::ExpectedBitString { index: 1, offset: 2 }.is_unexpected_tag());
        assert!(!Asn1Error::MissingChoice { group: 2 }.is_unexpected_tag());
    }

    #[test]
    fn test_display_carries_context() {
        let err = Asn1Error::UnexpectedTag { index: 3, offset: 17, tag: 0xA0 };
        let msg = err.to_string();
        assert!(msg.contains("0xA0"));
        assert!(msg.contains("17"));
    }
}
