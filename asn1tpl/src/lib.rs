//! asn1tpl - template-driven ASN.1 BER/DER codec
//!
//! Decoders and encoders for X.509-style structures are written as a flat
//! schema: one entry per expected item, with a nesting depth. The engines
//! walk the schema against the input (or the caller's values) so each
//! structure needs no hand-written parser.
//!
//! # Architecture
//!
//! - `asn1tpl-core`: error type, tag constants, known OID tables, options
//! - `asn1tpl-codec`: TLV primitives, template engines, BER to DER
//!
//! # Usage
//!
//! ```
//! use asn1tpl::{DecodeSlot, SchemaEntry, decode_items, tags};
//!
//! const SCHEMA: [SchemaEntry; 2] = [
//!     SchemaEntry::sequence(0),
//!     SchemaEntry::leaf(1, tags::INTEGER),
//! ];
//!
//! let input = [0x30, 0x03, 0x02, 0x01, 0x05];
//! let mut slots = vec![DecodeSlot::none(), DecodeSlot::uint8()];
//! let mut cursor = 0;
//! decode_items(&SCHEMA, &mut slots, &input, &mut cursor, true, input.len()).unwrap();
//! assert_eq!(slots[1].as_u32(), Some(5));
//! ```

// Re-export core types
pub use asn1tpl_core::{
    Asn1Error, Asn1Result, DecodeError, DecodeOptions, EncodeError, IntegerPolicy, KnownOid,
    OidCategory,
};
pub use asn1tpl_core::{oid, tags};

// Re-export engines
pub use asn1tpl_codec::template::schema::{MAX_CHOICE_GROUPS, MAX_DEPTH};
pub use asn1tpl_codec::{
    DecodeSlot, DecodeValue, EncodeSlot, EncodeValue, Optionality, SchemaDisplay, SchemaEntry,
    ber_to_der, ber_to_der_vec, decode_items, decode_items_with, encode_items_to_bytes,
    encode_items_to_vec, size_items, validate_schema, write_items,
};

// Re-export BER limits
pub use asn1tpl_codec::ber::{MAX_INDEF_DEPTH, MAX_INDEF_ITEMS, MAX_NESTING};

// Re-export primitive TLV codec
pub mod tlv {
    pub use asn1tpl_codec::tlv::*;
}
