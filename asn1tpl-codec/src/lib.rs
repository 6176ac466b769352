//! Schema-driven ASN.1 DER codec
//!
//! This crate provides:
//! - the primitive TLV codec (tags, lengths, INTEGER/BIT STRING content rules)
//! - the template engines driven by a flat schema
//! - BER to DER canonicalization

pub mod ber;
pub mod template;
pub mod tlv;

pub use ber::{ber_to_der, ber_to_der_vec};
pub use template::{
    DecodeSlot, DecodeValue, EncodeSlot, EncodeValue, Optionality, SchemaDisplay, SchemaEntry,
    decode_items, decode_items_with, encode_items_to_bytes, encode_items_to_vec, size_items,
    validate_schema, write_items,
};
