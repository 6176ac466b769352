//! BER to DER canonicalization
//!
//! Rewrites indefinite-length items with definite lengths, merges
//! constructed string fragments into a single primitive item and
//! shortens non-minimal length forms. Items already in DER are copied
//! verbatim.

pub mod canonicalize;
pub mod indefinite;

pub use canonicalize::{ber_to_der, ber_to_der_vec};
pub use indefinite::{IndefItem, IndefItems, MAX_INDEF_DEPTH, MAX_INDEF_ITEMS, MAX_NESTING};
