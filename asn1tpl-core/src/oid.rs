//! Object identifier tables and helpers
//!
//! Decoders identify an OID by the *sum* of its content octets. The sum is
//! cheap to compute while scanning and is unique inside each category
//! table, so the higher-level decoders can `match` on it. A sum alone is
//! not proof of identity, so lookups also compare the DER content.

use crate::error::{Asn1Error, Asn1Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Dotted-decimal form: at least two arcs, no leading zeros
static DOTTED_OID: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[0-2](\.(0|[1-9][0-9]*))+$").expect("static OID pattern is valid")
});

/// Category an OID entry is declared with in a schema
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OidCategory {
    /// No table: the sum is computed but never verified
    Ignore,
    Hash,
    Sig,
    Key,
    Curve,
    CertExt,
    ExtKeyUsage,
    AuthInfo,
    Ocsp,
    Name,
}

impl OidCategory {
    /// The known-OID table for this category (empty for `Ignore`)
    pub fn table(self) -> &'static [KnownOid] {
        match self {
            OidCategory::Ignore => &[],
            OidCategory::Hash => HASH_OIDS,
            OidCategory::Sig => SIG_OIDS,
            OidCategory::Key => KEY_OIDS,
            OidCategory::Curve => CURVE_OIDS,
            OidCategory::CertExt => CERT_EXT_OIDS,
            OidCategory::ExtKeyUsage => EXT_KEY_USAGE_OIDS,
            OidCategory::AuthInfo => AUTH_INFO_OIDS,
            OidCategory::Ocsp => OCSP_OIDS,
            OidCategory::Name => NAME_OIDS,
        }
    }
}

impl fmt::Display for OidCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            OidCategory::Ignore => "ignore",
            OidCategory::Hash => "hash",
            OidCategory::Sig => "signature",
            OidCategory::Key => "key",
            OidCategory::Curve => "curve",
            OidCategory::CertExt => "certificate extension",
            OidCategory::ExtKeyUsage => "extended key usage",
            OidCategory::AuthInfo => "authority info access",
            OidCategory::Ocsp => "ocsp",
            OidCategory::Name => "name attribute",
        };
        f.write_str(s)
    }
}

/// One entry of a known-OID table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KnownOid {
    /// Dotted-decimal form
    pub dotted: &'static str,
    /// Sum of the content octets
    pub sum: u32,
    /// DER content octets (no tag/length)
    pub der: &'static [u8],
}

impl KnownOid {
    pub const fn new(dotted: &'static str, sum: u32, der: &'static [u8]) -> Self {
        Self { dotted, sum, der }
    }
}

/// Sum of the content octets of an encoded OID
pub fn oid_sum(content: &[u8]) -> u32 {
    content.iter().map(|&b| b as u32).sum()
}

/// Find the table entry whose sum *and* content match
pub fn lookup(category: OidCategory, sum: u32, content: &[u8]) -> Option<&'static KnownOid> {
    category
        .table()
        .iter()
        .find(|known| known.sum == sum && known.der == content)
}

/// Find the table entry for a sum, used when encoding an OID by its sum
pub fn find_by_sum(category: OidCategory, sum: u32) -> Option<&'static KnownOid> {
    category.table().iter().find(|known| known.sum == sum)
}

/// Verify an OID against its category table
///
/// `Ignore` always succeeds.
pub fn verify(category: OidCategory, sum: u32, content: &[u8]) -> Asn1Result<()> {
    if category == OidCategory::Ignore || lookup(category, sum, content).is_some() {
        Ok(())
    } else {
        Err(Asn1Error::UnknownOid { category, sum })
    }
}

/// Check base-128 well-formedness of OID content octets
pub fn validate_oid_content(content: &[u8]) -> Asn1Result<()> {
    if content.is_empty() {
        return Err(Asn1Error::InvalidEncoding("empty OBJECT IDENTIFIER".to_string()));
    }
    let mut sub_start = true;
    for &byte in content {
        if sub_start && byte == 0x80 {
            return Err(Asn1Error::InvalidEncoding(
                "OBJECT IDENTIFIER sub-identifier has a leading 0x80".to_string(),
            ));
        }
        sub_start = byte & 0x80 == 0;
    }
    if !sub_start {
        return Err(Asn1Error::InvalidEncoding(
            "OBJECT IDENTIFIER ends inside a sub-identifier".to_string(),
        ));
    }
    Ok(())
}

/// Encode a dotted-decimal OID (e.g. "1.2.840.113549.1.1.1") to content octets
pub fn encode_dotted(dotted: &str) -> Asn1Result<Vec<u8>> {
    if !DOTTED_OID.is_match(dotted) {
        return Err(Asn1Error::InvalidEncoding(format!("Invalid OID format: {}", dotted)));
    }
    let arcs = dotted
        .split('.')
        .map(|part| {
            part.parse::<u64>()
                .map_err(|_| Asn1Error::InvalidEncoding(format!("OID arc too large: {}", part)))
        })
        .collect::<Asn1Result<Vec<u64>>>()?;

    if arcs[0] < 2 && arcs[1] >= 40 {
        return Err(Asn1Error::InvalidEncoding(format!(
            "Second OID arc must be below 40: {}",
            dotted
        )));
    }
    let first = arcs[0]
        .checked_mul(40)
        .and_then(|v| v.checked_add(arcs[1]))
        .ok_or_else(|| Asn1Error::InvalidEncoding(format!("OID arc too large: {}", dotted)))?;

    let mut out = Vec::with_capacity(arcs.len() + 4);
    push_base128(&mut out, first);
    for &arc in &arcs[2..] {
        push_base128(&mut out, arc);
    }
    Ok(out)
}

/// Render OID content octets as dotted decimal
pub fn to_dotted(content: &[u8]) -> Asn1Result<String> {
    validate_oid_content(content)?;
    let mut parts: Vec<String> = Vec::new();
    let mut value: u64 = 0;
    for &byte in content {
        value = value
            .checked_mul(128)
            .map(|v| v | (byte & 0x7F) as u64)
            .ok_or_else(|| Asn1Error::InvalidEncoding("OID sub-identifier overflow".to_string()))?;
        if byte & 0x80 != 0 {
            continue;
        }
        if parts.is_empty() {
            let (first, second) = match value {
                0..=39 => (0, value),
                40..=79 => (1, value - 40),
                _ => (2, value - 80),
            };
            parts.push(first.to_string());
            parts.push(second.to_string());
        } else {
            parts.push(value.to_string());
        }
        value = 0;
    }
    Ok(parts.join("."))
}

fn push_base128(out: &mut Vec<u8>, mut value: u64) {
    let mut tmp = [0u8; 10];
    let mut n = 0;
    loop {
        tmp[n] = (value & 0x7F) as u8;
        n += 1;
        value >>= 7;
        if value == 0 {
            break;
        }
    }
    for i in (0..n).rev() {
        let cont = if i == 0 { 0 } else { 0x80 };
        out.push(tmp[i] | cont);
    }
}

static HASH_OIDS: &[KnownOid] = &[
    KnownOid::new("1.2.840.113549.2.5", 649, &[0x2A, 0x86, 0x48, 0x86, 0xF7, 0x0D, 0x02, 0x05]),
    KnownOid::new("1.3.14.3.2.26", 88, &[0x2B, 0x0E, 0x03, 0x02, 0x1A]),
    KnownOid::new(
        "2.16.840.1.101.3.4.2.4",
        417,
        &[0x60, 0x86, 0x48, 0x01, 0x65, 0x03, 0x04, 0x02, 0x04],
    ),
    KnownOid::new(
        "2.16.840.1.101.3.4.2.1",
        414,
        &[0x60, 0x86, 0x48, 0x01, 0x65, 0x03, 0x04, 0x02, 0x01],
    ),
    KnownOid::new(
        "2.16.840.1.101.3.4.2.2",
        415,
        &[0x60, 0x86, 0x48, 0x01, 0x65, 0x03, 0x04, 0x02, 0x02],
    ),
    KnownOid::new(
        "2.16.840.1.101.3.4.2.3",
        416,
        &[0x60, 0x86, 0x48, 0x01, 0x65, 0x03, 0x04, 0x02, 0x03],
    ),
    KnownOid::new(
        "2.16.840.1.101.3.4.2.8",
        421,
        &[0x60, 0x86, 0x48, 0x01, 0x65, 0x03, 0x04, 0x02, 0x08],
    ),
    KnownOid::new(
        "2.16.840.1.101.3.4.2.9",
        422,
        &[0x60, 0x86, 0x48, 0x01, 0x65, 0x03, 0x04, 0x02, 0x09],
    ),
    KnownOid::new(
        "2.16.840.1.101.3.4.2.10",
        423,
        &[0x60, 0x86, 0x48, 0x01, 0x65, 0x03, 0x04, 0x02, 0x0A],
    ),
];

static SIG_OIDS: &[KnownOid] = &[
    KnownOid::new(
        "1.2.840.113549.1.1.5",
        649,
        &[0x2A, 0x86, 0x48, 0x86, 0xF7, 0x0D, 0x01, 0x01, 0x05],
    ),
    KnownOid::new(
        "1.2.840.113549.1.1.11",
        655,
        &[0x2A, 0x86, 0x48, 0x86, 0xF7, 0x0D, 0x01, 0x01, 0x0B],
    ),
    KnownOid::new(
        "1.2.840.113549.1.1.12",
        656,
        &[0x2A, 0x86, 0x48, 0x86, 0xF7, 0x0D, 0x01, 0x01, 0x0C],
    ),
    KnownOid::new(
        "1.2.840.113549.1.1.13",
        657,
        &[0x2A, 0x86, 0x48, 0x86, 0xF7, 0x0D, 0x01, 0x01, 0x0D],
    ),
    KnownOid::new(
        "1.2.840.113549.1.1.10",
        654,
        &[0x2A, 0x86, 0x48, 0x86, 0xF7, 0x0D, 0x01, 0x01, 0x0A],
    ),
    KnownOid::new("1.2.840.10045.4.1", 520, &[0x2A, 0x86, 0x48, 0xCE, 0x3D, 0x04, 0x01]),
    KnownOid::new("1.2.840.10045.4.3.2", 524, &[0x2A, 0x86, 0x48, 0xCE, 0x3D, 0x04, 0x03, 0x02]),
    KnownOid::new("1.2.840.10045.4.3.3", 525, &[0x2A, 0x86, 0x48, 0xCE, 0x3D, 0x04, 0x03, 0x03]),
    KnownOid::new("1.2.840.10045.4.3.4", 526, &[0x2A, 0x86, 0x48, 0xCE, 0x3D, 0x04, 0x03, 0x04]),
    KnownOid::new("1.3.101.112", 256, &[0x2B, 0x65, 0x70]),
    KnownOid::new("1.3.101.113", 257, &[0x2B, 0x65, 0x71]),
];

static KEY_OIDS: &[KnownOid] = &[
    KnownOid::new(
        "1.2.840.113549.1.1.1",
        645,
        &[0x2A, 0x86, 0x48, 0x86, 0xF7, 0x0D, 0x01, 0x01, 0x01],
    ),
    KnownOid::new("1.2.840.10040.4.1", 515, &[0x2A, 0x86, 0x48, 0xCE, 0x38, 0x04, 0x01]),
    KnownOid::new("1.2.840.10045.2.1", 518, &[0x2A, 0x86, 0x48, 0xCE, 0x3D, 0x02, 0x01]),
    KnownOid::new("1.3.101.110", 254, &[0x2B, 0x65, 0x6E]),
    KnownOid::new("1.3.101.111", 255, &[0x2B, 0x65, 0x6F]),
    KnownOid::new("1.3.101.112", 256, &[0x2B, 0x65, 0x70]),
    KnownOid::new("1.3.101.113", 257, &[0x2B, 0x65, 0x71]),
];

static CURVE_OIDS: &[KnownOid] = &[
    KnownOid::new("1.3.132.0.33", 209, &[0x2B, 0x81, 0x04, 0x00, 0x21]),
    KnownOid::new("1.2.840.10045.3.1.7", 526, &[0x2A, 0x86, 0x48, 0xCE, 0x3D, 0x03, 0x01, 0x07]),
    KnownOid::new("1.3.132.0.34", 210, &[0x2B, 0x81, 0x04, 0x00, 0x22]),
    KnownOid::new("1.3.132.0.35", 211, &[0x2B, 0x81, 0x04, 0x00, 0x23]),
    KnownOid::new("1.3.132.0.10", 186, &[0x2B, 0x81, 0x04, 0x00, 0x0A]),
];

static CERT_EXT_OIDS: &[KnownOid] = &[
    KnownOid::new("2.5.29.19", 133, &[0x55, 0x1D, 0x13]),
    KnownOid::new("2.5.29.15", 129, &[0x55, 0x1D, 0x0F]),
    KnownOid::new("2.5.29.37", 151, &[0x55, 0x1D, 0x25]),
    KnownOid::new("2.5.29.17", 131, &[0x55, 0x1D, 0x11]),
    KnownOid::new("2.5.29.18", 132, &[0x55, 0x1D, 0x12]),
    KnownOid::new("2.5.29.14", 128, &[0x55, 0x1D, 0x0E]),
    KnownOid::new("2.5.29.35", 149, &[0x55, 0x1D, 0x23]),
    KnownOid::new("2.5.29.31", 145, &[0x55, 0x1D, 0x1F]),
    KnownOid::new("2.5.29.32", 146, &[0x55, 0x1D, 0x20]),
    KnownOid::new("2.5.29.30", 144, &[0x55, 0x1D, 0x1E]),
    KnownOid::new("2.5.29.36", 150, &[0x55, 0x1D, 0x24]),
    KnownOid::new("2.5.29.54", 168, &[0x55, 0x1D, 0x36]),
    KnownOid::new("2.5.29.20", 134, &[0x55, 0x1D, 0x14]),
    KnownOid::new("1.3.6.1.5.5.7.1.1", 69, &[0x2B, 0x06, 0x01, 0x05, 0x05, 0x07, 0x01, 0x01]),
    KnownOid::new(
        "1.3.6.1.5.5.7.48.1.2",
        118,
        &[0x2B, 0x06, 0x01, 0x05, 0x05, 0x07, 0x30, 0x01, 0x02],
    ),
];

static EXT_KEY_USAGE_OIDS: &[KnownOid] = &[
    KnownOid::new("2.5.29.37.0", 151, &[0x55, 0x1D, 0x25, 0x00]),
    KnownOid::new("1.3.6.1.5.5.7.3.1", 71, &[0x2B, 0x06, 0x01, 0x05, 0x05, 0x07, 0x03, 0x01]),
    KnownOid::new("1.3.6.1.5.5.7.3.2", 72, &[0x2B, 0x06, 0x01, 0x05, 0x05, 0x07, 0x03, 0x02]),
    KnownOid::new("1.3.6.1.5.5.7.3.3", 73, &[0x2B, 0x06, 0x01, 0x05, 0x05, 0x07, 0x03, 0x03]),
    KnownOid::new("1.3.6.1.5.5.7.3.4", 74, &[0x2B, 0x06, 0x01, 0x05, 0x05, 0x07, 0x03, 0x04]),
    KnownOid::new("1.3.6.1.5.5.7.3.8", 78, &[0x2B, 0x06, 0x01, 0x05, 0x05, 0x07, 0x03, 0x08]),
    KnownOid::new("1.3.6.1.5.5.7.3.9", 79, &[0x2B, 0x06, 0x01, 0x05, 0x05, 0x07, 0x03, 0x09]),
];

static AUTH_INFO_OIDS: &[KnownOid] = &[
    KnownOid::new("1.3.6.1.5.5.7.48.1", 116, &[0x2B, 0x06, 0x01, 0x05, 0x05, 0x07, 0x30, 0x01]),
    KnownOid::new("1.3.6.1.5.5.7.48.2", 117, &[0x2B, 0x06, 0x01, 0x05, 0x05, 0x07, 0x30, 0x02]),
];

static OCSP_OIDS: &[KnownOid] = &[
    KnownOid::new(
        "1.3.6.1.5.5.7.48.1.1",
        117,
        &[0x2B, 0x06, 0x01, 0x05, 0x05, 0x07, 0x30, 0x01, 0x01],
    ),
    KnownOid::new(
        "1.3.6.1.5.5.7.48.1.2",
        118,
        &[0x2B, 0x06, 0x01, 0x05, 0x05, 0x07, 0x30, 0x01, 0x02],
    ),
];

static NAME_OIDS: &[KnownOid] = &[
    KnownOid::new("2.5.4.3", 92, &[0x55, 0x04, 0x03]),
    KnownOid::new("2.5.4.4", 93, &[0x55, 0x04, 0x04]),
    KnownOid::new("2.5.4.5", 94, &[0x55, 0x04, 0x05]),
    KnownOid::new("2.5.4.6", 95, &[0x55, 0x04, 0x06]),
    KnownOid::new("2.5.4.7", 96, &[0x55, 0x04, 0x07]),
    KnownOid::new("2.5.4.8", 97, &[0x55, 0x04, 0x08]),
    KnownOid::new("2.5.4.9", 98, &[0x55, 0x04, 0x09]),
    KnownOid::new("2.5.4.10", 99, &[0x55, 0x04, 0x0A]),
    KnownOid::new("2.5.4.11", 100, &[0x55, 0x04, 0x0B]),
    KnownOid::new("2.5.4.12", 101, &[0x55, 0x04, 0x0C]),
    KnownOid::new(
        "1.2.840.113549.1.9.1",
        653,
        &[0x2A, 0x86, 0x48, 0x86, 0xF7, 0x0D, 0x01, 0x09, 0x01],
    ),
    KnownOid::new(
        "0.9.2342.19200300.100.1.25",
        889,
        &[0x09, 0x92, 0x26, 0x89, 0x93, 0xF2, 0x2C, 0x64, 0x01, 0x19],
    ),
];

/// OID sums for the entries of the known-OID tables
pub mod sums {
    pub mod hash {
        pub const MD5: u32 = 649;
        pub const SHA1: u32 = 88;
        pub const SHA224: u32 = 417;
        pub const SHA256: u32 = 414;
        pub const SHA384: u32 = 415;
        pub const SHA512: u32 = 416;
        pub const SHA3_256: u32 = 421;
        pub const SHA3_384: u32 = 422;
        pub const SHA3_512: u32 = 423;
    }
    pub mod sig {
        pub const SHA1_WITH_RSA: u32 = 649;
        pub const SHA256_WITH_RSA: u32 = 655;
        pub const SHA384_WITH_RSA: u32 = 656;
        pub const SHA512_WITH_RSA: u32 = 657;
        pub const RSASSA_PSS: u32 = 654;
        pub const SHA1_WITH_ECDSA: u32 = 520;
        pub const SHA256_WITH_ECDSA: u32 = 524;
        pub const SHA384_WITH_ECDSA: u32 = 525;
        pub const SHA512_WITH_ECDSA: u32 = 526;
        pub const ED25519: u32 = 256;
        pub const ED448: u32 = 257;
    }
    pub mod key {
        pub const RSA: u32 = 645;
        pub const DSA: u32 = 515;
        pub const EC_PUBLIC_KEY: u32 = 518;
        pub const X25519: u32 = 254;
        pub const X448: u32 = 255;
        pub const ED25519: u32 = 256;
        pub const ED448: u32 = 257;
    }
    pub mod curve {
        pub const SECP224R1: u32 = 209;
        pub const SECP256R1: u32 = 526;
        pub const SECP384R1: u32 = 210;
        pub const SECP521R1: u32 = 211;
        pub const SECP256K1: u32 = 186;
    }
    pub mod cert_ext {
        pub const BASIC_CONSTRAINTS: u32 = 133;
        pub const KEY_USAGE: u32 = 129;
        pub const EXT_KEY_USAGE: u32 = 151;
        pub const SUBJECT_ALT_NAME: u32 = 131;
        pub const ISSUER_ALT_NAME: u32 = 132;
        pub const SUBJECT_KEY_ID: u32 = 128;
        pub const AUTH_KEY_ID: u32 = 149;
        pub const CRL_DIST_POINTS: u32 = 145;
        pub const CERT_POLICIES: u32 = 146;
        pub const NAME_CONSTRAINTS: u32 = 144;
        pub const POLICY_CONSTRAINTS: u32 = 150;
        pub const INHIBIT_ANY_POLICY: u32 = 168;
        pub const CRL_NUMBER: u32 = 134;
        pub const AUTH_INFO_ACCESS: u32 = 69;
        pub const OCSP_NONCE: u32 = 118;
    }
    pub mod ext_key_usage {
        pub const ANY: u32 = 151;
        pub const SERVER_AUTH: u32 = 71;
        pub const CLIENT_AUTH: u32 = 72;
        pub const CODE_SIGNING: u32 = 73;
        pub const EMAIL_PROTECTION: u32 = 74;
        pub const TIME_STAMPING: u32 = 78;
        pub const OCSP_SIGNING: u32 = 79;
    }
    pub mod auth_info {
        pub const OCSP: u32 = 116;
        pub const CA_ISSUERS: u32 = 117;
    }
    pub mod ocsp {
        pub const BASIC: u32 = 117;
        pub const NONCE: u32 = 118;
    }
    pub mod name {
        pub const COMMON_NAME: u32 = 92;
        pub const SURNAME: u32 = 93;
        pub const SERIAL_NUMBER: u32 = 94;
        pub const COUNTRY: u32 = 95;
        pub const LOCALITY: u32 = 96;
        pub const STATE: u32 = 97;
        pub const STREET: u32 = 98;
        pub const ORGANIZATION: u32 = 99;
        pub const ORG_UNIT: u32 = 100;
        pub const TITLE: u32 = 101;
        pub const EMAIL_ADDRESS: u32 = 653;
        pub const DOMAIN_COMPONENT: u32 = 889;
    }
}
