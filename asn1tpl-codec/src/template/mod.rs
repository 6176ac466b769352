//! Schema-driven template engines
//!
//! A schema describes the expected DER layout as a flat list of entries.
//! [`decode_items`] fills one [`DecodeSlot`] per entry from the input;
//! [`size_items`] and [`write_items`] produce DER from one [`EncodeSlot`]
//! per entry.

pub mod decode;
pub mod encode;
pub mod schema;

pub use decode::{DecodeSlot, DecodeValue, decode_items, decode_items_with};
pub use encode::{
    EncodeSlot, EncodeValue, encode_items_to_bytes, encode_items_to_vec, size_items, write_items,
};
pub use schema::{
    MAX_CHOICE_GROUPS, MAX_DEPTH, Optionality, SchemaDisplay, SchemaEntry, validate_schema,
};
