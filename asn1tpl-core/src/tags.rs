//! ASN.1 identifier octet constants
//!
//! Schema entries carry the tag byte *without* the constructed bit; the
//! constructed flag is a separate schema field. `SEQUENCE` is therefore
//! `0x10` here and appears on the wire as `0x30`.
//!
//! ```text
//! Bits: 8 7 6 5 4 3 2 1
//!       C C P T T T T T
//! ```

/// End-of-Content (also the tag of the EOC marker `00 00`)
pub const EOC: u8 = 0x00;
pub const BOOLEAN: u8 = 0x01;
pub const INTEGER: u8 = 0x02;
pub const BIT_STRING: u8 = 0x03;
pub const OCTET_STRING: u8 = 0x04;
pub const NULL: u8 = 0x05;
pub const OBJECT_ID: u8 = 0x06;
pub const ENUMERATED: u8 = 0x0A;
pub const UTF8_STRING: u8 = 0x0C;
pub const SEQUENCE: u8 = 0x10;
pub const SET: u8 = 0x11;
pub const PRINTABLE_STRING: u8 = 0x13;
pub const T61_STRING: u8 = 0x14;
pub const IA5_STRING: u8 = 0x16;
pub const UTC_TIME: u8 = 0x17;
pub const GENERALIZED_TIME: u8 = 0x18;
pub const BMP_STRING: u8 = 0x1E;

/// Constructed bit of the identifier octet
pub const CONSTRUCTED: u8 = 0x20;
pub const APPLICATION: u8 = 0x40;
pub const CONTEXT_SPECIFIC: u8 = 0x80;
pub const PRIVATE: u8 = 0xC0;

pub const CLASS_MASK: u8 = 0xC0;
pub const NUMBER_MASK: u8 = 0x1F;
/// Low five bits all set: tag number continues in following octets
pub const HIGH_TAG_NUMBER: u8 = 0x1F;

/// Length octet announcing the indefinite form
pub const INDEFINITE_LENGTH: u8 = 0x80;
/// Bit marking the long length form
pub const LONG_LENGTH: u8 = 0x80;

/// Tag class (bits 8-7 of the identifier octet)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TagClass {
    /// Universal class (00)
    Universal = 0,
    /// Application class (01)
    Application = 1,
    /// Context-specific class (10)
    ContextSpecific = 2,
    /// Private class (11)
    Private = 3,
}

impl TagClass {
    /// Get tag class from the identifier octet
    pub fn from_tag(tag: u8) -> Self {
        match (tag >> 6) & 0x03 {
            0 => TagClass::Universal,
            1 => TagClass::Application,
            2 => TagClass::ContextSpecific,
            _ => TagClass::Private,
        }
    }

    /// Class bits positioned for an identifier octet
    pub fn to_bits(self) -> u8 {
        (self as u8) << 6
    }
}

/// Context-specific tag `[n]` (primitive form; OR with `CONSTRUCTED` as needed)
pub const fn context(number: u8) -> u8 {
    CONTEXT_SPECIFIC | (number & NUMBER_MASK)
}

/// Whether the identifier octet has the constructed bit set
pub const fn is_constructed(tag: u8) -> bool {
    tag & CONSTRUCTED != 0
}

/// Identifier octet with the constructed bit cleared
pub const fn strip_constructed(tag: u8) -> u8 {
    tag & !CONSTRUCTED
}

/// Whether a constructed universal tag is a string type that BER may
/// fragment (everything universal except SEQUENCE and SET)
pub const fn is_fragmentable(tag: u8) -> bool {
    let base = strip_constructed(tag);
    base & CLASS_MASK == 0 && base != SEQUENCE && base != SET && base != EOC
}

/// Short human readable name of a universal tag, for logs
pub fn name(tag: u8) -> &'static str {
    if tag & CLASS_MASK != 0 {
        return match TagClass::from_tag(tag) {
            TagClass::Application => "APPLICATION",
            TagClass::ContextSpecific => "CONTEXT",
            _ => "PRIVATE",
        };
    }
    match strip_constructed(tag) {
        EOC => "EOC",
        BOOLEAN => "BOOLEAN",
        INTEGER => "INTEGER",
        BIT_STRING => "BIT STRING",
        OCTET_STRING => "OCTET STRING",
        NULL => "NULL",
        OBJECT_ID => "OBJECT IDENTIFIER",
        ENUMERATED => "ENUMERATED",
        UTF8_STRING => "UTF8String",
        SEQUENCE => "SEQUENCE",
        SET => "SET",
        PRINTABLE_STRING => "PrintableString",
        T61_STRING => "T61String",
        IA5_STRING => "IA5String",
        UTC_TIME => "UTCTime",
        GENERALIZED_TIME => "GeneralizedTime",
        BMP_STRING => "BMPString",
        _ => "UNIVERSAL",
    }
}
