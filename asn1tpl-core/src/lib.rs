//! Core types for the template-driven ASN.1 codec
//!
//! This crate provides the error taxonomy, tag constants, known object
//! identifier tables and decode options shared by the codec engines and
//! by the certificate/OCSP/CRL decoders built on top of them.

pub mod error;
pub mod oid;
pub mod options;
pub mod tags;

pub use error::{Asn1Error, Asn1Result, DecodeError, EncodeError};
pub use oid::{KnownOid, OidCategory};
pub use options::{DecodeOptions, IntegerPolicy};
