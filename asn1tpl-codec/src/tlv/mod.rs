//! Primitive TLV codec
//!
//! Single-item building blocks shared by the template engines and the
//! BER-to-DER canonicalizer:
//!
//! - identifier octet reading (`tag`)
//! - short/long/indefinite length forms (`length`)
//! - first-octet rules of INTEGER and BIT STRING content (`content`)
//!
//! ```text
//! [Tag] [Length] [Value]
//! ```

pub mod content;
pub mod length;
pub mod tag;

pub use content::{check_bit_string, check_integer, is_integer_tag};
pub use length::{Length, length_size, read_ber_length, read_length, write_length};
pub use tag::{identifier_len, read_tag};
