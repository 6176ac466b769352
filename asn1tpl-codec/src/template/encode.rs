//! Template encoder
//!
//! Encoding is two passes over the schema:
//!
//! 1. [`size_items`] walks the entries in reverse, computing each item's
//!    length and its offset measured from the *end* of the encoding. A
//!    header-only item's length is the sum of its already-sized children.
//! 2. [`write_items`] walks forward and writes every item at
//!    `total - offset`.

use std::ops::Range;

use asn1tpl_core::tags::{BIT_STRING, BOOLEAN, CONSTRUCTED};
use asn1tpl_core::{Asn1Error, Asn1Result, OidCategory, oid};
use bytes::{Bytes, BytesMut};
use log::{debug, trace};
use num_bigint::BigInt;

use super::schema::{
    SchemaDisplay, SchemaEntry, ancestors, starts_choice_run, subtree_end, validate_schema,
};
use crate::tlv::content::{mpi_content_len, uint_content_len, uint_min_len, unused_mask, write_uint};
use crate::tlv::{is_integer_tag, length_size, write_length};

/// Source of an encoded item's content
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EncodeValue<'a> {
    /// No payload: children for header-only entries, empty content otherwise
    None,
    /// Small unsigned values: INTEGER and ENUMERATED get a sign pad when
    /// the top bit is set, other tags take the minimal big-endian bytes
    U8(u8),
    U16(u16),
    U32(u32),
    /// Signed multi-precision integer in minimal two's complement
    Mpi(&'a BigInt),
    /// Raw content; BIT STRING gets a zero unused-bits byte and INTEGER a
    /// zero pad when the first byte has its top bit set
    Bytes(&'a [u8]),
    /// BIT STRING content with an explicit unused-bit count
    Bits { data: &'a [u8], unused: u8 },
    /// Known OID written from its category table
    Oid { category: OidCategory, sum: u32 },
    /// Pre-encoded TLV copied verbatim in place of the whole item
    Replace(&'a [u8]),
    /// Content of this many bytes reserved for the caller to fill
    Placeholder(usize),
}

/// Per-entry encode source and sizing result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodeSlot<'a> {
    pub value: EncodeValue<'a>,
    /// Suppress this item and its subtree
    pub no_output: bool,
    /// Full tag byte overriding the schema tag
    pub tag: Option<u8>,
    /// Bytes this item writes, children included
    pub length: usize,
    /// Length declared in the item's header
    pub content_length: usize,
    /// Distance from the item's first byte to the end of the encoding
    pub offset: usize,
    sized: bool,
    placeholder_at: Option<usize>,
}

impl<'a> EncodeSlot<'a> {
    pub fn new(value: EncodeValue<'a>) -> Self {
        Self {
            value,
            no_output: false,
            tag: None,
            length: 0,
            content_length: 0,
            offset: 0,
            sized: false,
            placeholder_at: None,
        }
    }

    pub fn none() -> Self {
        Self::new(EncodeValue::None)
    }

    pub fn uint8(v: u8) -> Self {
        Self::new(EncodeValue::U8(v))
    }

    pub fn uint16(v: u16) -> Self {
        Self::new(EncodeValue::U16(v))
    }

    pub fn uint32(v: u32) -> Self {
        Self::new(EncodeValue::U32(v))
    }

    pub fn mpi(v: &'a BigInt) -> Self {
        Self::new(EncodeValue::Mpi(v))
    }

    pub fn bytes(data: &'a [u8]) -> Self {
        Self::new(EncodeValue::Bytes(data))
    }

    pub fn bits(data: &'a [u8], unused: u8) -> Self {
        Self::new(EncodeValue::Bits { data, unused })
    }

    pub fn oid(category: OidCategory, sum: u32) -> Self {
        Self::new(EncodeValue::Oid { category, sum })
    }

    pub fn replace(encoded: &'a [u8]) -> Self {
        Self::new(EncodeValue::Replace(encoded))
    }

    pub fn placeholder(len: usize) -> Self {
        Self::new(EncodeValue::Placeholder(len))
    }

    /// One empty slot per schema entry
    pub fn for_schema(schema: &[SchemaEntry]) -> Vec<Self> {
        vec![Self::none(); schema.len()]
    }

    /// Same slot, suppressed together with its subtree
    pub fn suppressed(mut self) -> Self {
        self.no_output = true;
        self
    }

    /// Same slot, written with `tag` instead of the schema tag
    pub fn with_tag(mut self, tag: u8) -> Self {
        self.tag = Some(tag);
        self
    }

    /// Output range reserved by a placeholder, known after [`write_items`]
    pub fn placeholder_range(&self) -> Option<Range<usize>> {
        match self.value {
            EncodeValue::Placeholder(len) => self.placeholder_at.map(|at| at..at + len),
            _ => None,
        }
    }
}

/// How an item's content is laid out
struct Content {
    /// Unused-bits byte or INTEGER zero pad
    prefix: Option<u8>,
    /// Bytes after the prefix
    payload: usize,
}

impl Content {
    fn len(&self) -> usize {
        usize::from(self.prefix.is_some()) + self.payload
    }
}

fn content_layout(
    entry: &SchemaEntry,
    tag: u8,
    value: &EncodeValue<'_>,
    index: usize,
) -> Asn1Result<Content> {
    let bit_string = !entry.constructed && tag == BIT_STRING;
    let integer = !entry.constructed && is_integer_tag(tag);
    let zero_bits = if bit_string { Some(0) } else { None };
    let layout = match value {
        EncodeValue::None => Content { prefix: zero_bits, payload: 0 },
        EncodeValue::U8(_) | EncodeValue::U16(_) | EncodeValue::U32(_) if tag == BOOLEAN => {
            let v = small_value(value);
            if v > 0xFF {
                return Err(Asn1Error::InternalError(format!(
                    "entry {} BOOLEAN value {} out of range",
                    index, v
                )));
            }
            Content { prefix: None, payload: 1 }
        }
        EncodeValue::U8(_) | EncodeValue::U16(_) | EncodeValue::U32(_) => {
            let v = small_value(value);
            Content {
                prefix: zero_bits,
                payload: if integer { uint_content_len(v) } else { uint_min_len(v) },
            }
        }
        EncodeValue::Mpi(n) => Content {
            prefix: zero_bits,
            payload: mpi_content_len(n),
        },
        EncodeValue::Bytes(data) => {
            let pad = integer && data.first().is_none_or(|b| b & 0x80 != 0);
            Content {
                prefix: if pad { Some(0) } else { zero_bits },
                payload: data.len(),
            }
        }
        EncodeValue::Bits { data, unused } => {
            if *unused > 7 || (data.is_empty() && *unused != 0) {
                return Err(Asn1Error::InvalidEncoding(format!(
                    "entry {} has {} unused bits over {} bytes",
                    index,
                    unused,
                    data.len()
                )));
            }
            Content {
                prefix: Some(*unused),
                payload: data.len(),
            }
        }
        EncodeValue::Oid { category, sum } => {
            let known = oid::find_by_sum(*category, *sum).ok_or(Asn1Error::UnknownOid {
                category: *category,
                sum: *sum,
            })?;
            Content {
                prefix: None,
                payload: known.der.len(),
            }
        }
        EncodeValue::Placeholder(len) => Content {
            prefix: zero_bits,
            payload: *len,
        },
        EncodeValue::Replace(encoded) => Content {
            prefix: None,
            payload: encoded.len(),
        },
    };
    Ok(layout)
}

fn small_value(value: &EncodeValue<'_>) -> u32 {
    match value {
        EncodeValue::U8(v) => *v as u32,
        EncodeValue::U16(v) => *v as u32,
        EncodeValue::U32(v) => *v,
        _ => 0,
    }
}

/// Tag byte written for entry `i`
fn wire_tag(entry: &SchemaEntry, slot: &EncodeSlot<'_>) -> u8 {
    match slot.tag {
        Some(tag) => tag,
        None if entry.constructed => entry.tag | CONSTRUCTED,
        None => entry.tag,
    }
}

/// Whether entry `i` or one of its ancestors is suppressed
fn excluded(schema: &[SchemaEntry], slots: &[EncodeSlot<'_>], i: usize) -> bool {
    slots[i].no_output || ancestors(schema, i).any(|a| slots[a].no_output)
}

/// Compute lengths and end-relative offsets; returns the total size
///
/// # Arguments
/// * `schema` - Flat schema, one entry per item in pre-order
/// * `slots` - One value per schema entry; sizing results are stored back
///   into each slot
///
/// # Returns
/// Total encoded size in bytes. Suppressed items and their subtrees get
/// length and offset zero.
///
/// # Error Handling
/// Returns error if:
/// - The schema is malformed, the slot count differs, more than one member
///   of a choice run is written, or a header-only entry is replaced or has
///   both a payload and children (`InternalError`)
/// - A BIT STRING value has more than 7 unused bits (`InvalidEncoding`)
/// - An OID value is not in its category table (`UnknownOid`)
pub fn size_items(schema: &[SchemaEntry], slots: &mut [EncodeSlot<'_>]) -> Asn1Result<usize> {
    validate_schema(schema)?;
    if slots.len() != schema.len() {
        return Err(Asn1Error::InternalError(format!(
            "{} slots for {} schema entries",
            slots.len(),
            schema.len()
        )));
    }
    check_choices(schema, slots)?;
    trace!("sizing schema:\n{}", SchemaDisplay(schema));

    let mut total = 0usize;
    for i in (0..schema.len()).rev() {
        if excluded(schema, slots, i) {
            let slot = &mut slots[i];
            slot.length = 0;
            slot.content_length = 0;
            slot.offset = 0;
            slot.sized = true;
            continue;
        }
        let entry = &schema[i];
        let tag = wire_tag(entry, &slots[i]) & !CONSTRUCTED;
        let children = if entry.header_only { child_lengths(schema, slots, i) } else { 0 };

        // (declared content length, bytes added here, bytes spanned)
        let (content_length, own, length) = match &slots[i].value {
            EncodeValue::Replace(encoded) => {
                if entry.header_only {
                    return Err(Asn1Error::InternalError(format!(
                        "header-only entry {} cannot be replaced",
                        i
                    )));
                }
                (encoded.len(), encoded.len(), encoded.len())
            }
            EncodeValue::None if entry.header_only => {
                let prefix = usize::from(!entry.constructed && tag == BIT_STRING);
                let content = children + prefix;
                let header = 1 + length_size(content);
                (content, header + prefix, header + content)
            }
            value => {
                if children > 0 {
                    return Err(Asn1Error::InternalError(format!(
                        "header-only entry {} has both a payload and children",
                        i
                    )));
                }
                let layout = content_layout(entry, tag, value, i)?;
                let content = layout.len();
                let header = 1 + length_size(content);
                let own = if entry.header_only {
                    // Header and prefix only; the caller streams the payload
                    header + usize::from(layout.prefix.is_some())
                } else {
                    header + content
                };
                (content, own, own)
            }
        };

        total = total
            .checked_add(own)
            .ok_or_else(|| Asn1Error::ResourceExhausted("encoded size overflows".to_string()))?;
        let slot = &mut slots[i];
        slot.content_length = content_length;
        slot.length = length;
        slot.offset = total;
        slot.sized = true;
        trace!("entry {} sized: length {} offset {}", i, slot.length, slot.offset);
    }
    debug!("encoding of {} entries sized at {} bytes", schema.len(), total);
    Ok(total)
}

/// Sum of the lengths of the direct children of entry `i`
fn child_lengths(schema: &[SchemaEntry], slots: &[EncodeSlot<'_>], i: usize) -> usize {
    let depth = schema[i].depth + 1;
    (i + 1..subtree_end(schema, i))
        .filter(|&j| schema[j].depth == depth)
        .map(|j| slots[j].length)
        .sum()
}

/// At most one member of each run of choice siblings may be written
fn check_choices(schema: &[SchemaEntry], slots: &[EncodeSlot<'_>]) -> Asn1Result<()> {
    let mut written = 0;
    for (i, entry) in schema.iter().enumerate() {
        let Some(group) = entry.choice_group() else {
            continue;
        };
        if starts_choice_run(schema, i) {
            written = 0;
        }
        if !excluded(schema, slots, i) {
            written += 1;
            if written > 1 {
                return Err(Asn1Error::InternalError(format!(
                    "more than one member of choice group {} is written",
                    group
                )));
            }
        }
    }
    Ok(())
}

/// Write the sized items into `output`; returns the bytes written
///
/// # Arguments
/// * `schema` - The schema passed to [`size_items`]
/// * `slots` - The slots sized by [`size_items`]; placeholder positions
///   are recorded back into them
/// * `output` - Destination, at least the sized total long
///
/// # Returns
/// The number of bytes written, equal to the total from [`size_items`].
///
/// # Error Handling
/// Returns error if:
/// - The slots were not sized, or a value changed size between the two
///   passes (`InternalError`)
/// - `output` is shorter than the sized total (`BufferTooSmall`)
pub fn write_items(
    schema: &[SchemaEntry],
    slots: &mut [EncodeSlot<'_>],
    output: &mut [u8],
) -> Asn1Result<usize> {
    if slots.len() != schema.len() || slots.iter().any(|s| !s.sized) {
        return Err(Asn1Error::InternalError(
            "write_items called before size_items".to_string(),
        ));
    }
    let total = slots.iter().map(|s| s.offset).max().unwrap_or(0);
    if output.len() < total {
        return Err(Asn1Error::BufferTooSmall {
            need: total,
            got: output.len(),
        });
    }

    let mut i = 0;
    while i < schema.len() {
        let entry = &schema[i];
        let slot = &slots[i];
        if slot.no_output {
            i = subtree_end(schema, i);
            continue;
        }
        let start = total - slot.offset;
        let end = write_item(entry, slot, &mut output[start..total], i)? + start;
        trace!("entry {} written at {}..{}", i, start, end);

        if let EncodeValue::Placeholder(len) = slot.value {
            slots[i].placeholder_at = Some(if entry.header_only { end } else { end - len });
        }
        i += 1;
    }
    Ok(total)
}

/// Write one item at the start of `out`; returns bytes written
fn write_item(
    entry: &SchemaEntry,
    slot: &EncodeSlot<'_>,
    out: &mut [u8],
    index: usize,
) -> Asn1Result<usize> {
    if let EncodeValue::Replace(encoded) = slot.value {
        if encoded.len() != slot.length {
            return Err(Asn1Error::InternalError(format!(
                "entry {} replacement changed size between passes",
                index
            )));
        }
        out[..encoded.len()].copy_from_slice(encoded);
        return Ok(encoded.len());
    }

    let full_tag = wire_tag(entry, slot);
    let tag = full_tag & !CONSTRUCTED;
    out[0] = full_tag;
    let mut pos = 1 + write_length(slot.content_length, &mut out[1..]);

    if entry.header_only && slot.value == EncodeValue::None {
        if !entry.constructed && tag == BIT_STRING {
            out[pos] = 0;
            pos += 1;
        }
        return Ok(pos);
    }

    let layout = content_layout(entry, tag, &slot.value, index)?;
    if layout.len() != slot.content_length {
        return Err(Asn1Error::InternalError(format!(
            "entry {} changed size between passes",
            index
        )));
    }
    if let Some(prefix) = layout.prefix {
        out[pos] = prefix;
        pos += 1;
    }
    if entry.header_only {
        return Ok(pos);
    }

    let payload = &mut out[pos..pos + layout.payload];
    match &slot.value {
        EncodeValue::None | EncodeValue::Replace(_) => {}
        EncodeValue::U8(_) | EncodeValue::U16(_) | EncodeValue::U32(_) => {
            let v = small_value(&slot.value);
            if tag == BOOLEAN {
                payload[0] = v as u8;
            } else {
                write_uint(v, payload);
            }
        }
        EncodeValue::Mpi(n) => {
            let bytes = n.to_signed_bytes_be();
            if bytes.len() != payload.len() {
                return Err(Asn1Error::InternalError(format!(
                    "entry {} integer changed size between passes",
                    index
                )));
            }
            payload.copy_from_slice(&bytes);
        }
        EncodeValue::Bytes(data) => payload.copy_from_slice(data),
        EncodeValue::Bits { data, unused } => {
            payload.copy_from_slice(data);
            if let Some(last) = payload.last_mut() {
                *last &= !unused_mask(*unused);
            }
        }
        EncodeValue::Oid { category, sum } => {
            let known = oid::find_by_sum(*category, *sum).ok_or(Asn1Error::UnknownOid {
                category: *category,
                sum: *sum,
            })?;
            payload.copy_from_slice(known.der);
        }
        EncodeValue::Placeholder(_) => {}
    }
    Ok(pos + layout.payload)
}

/// Size and write into a new vector
pub fn encode_items_to_vec(
    schema: &[SchemaEntry],
    slots: &mut [EncodeSlot<'_>],
) -> Asn1Result<Vec<u8>> {
    let total = size_items(schema, slots)?;
    let mut out = vec![0u8; total];
    write_items(schema, slots, &mut out)?;
    Ok(out)
}

/// Size and write into an immutable [`Bytes`] buffer
pub fn encode_items_to_bytes(
    schema: &[SchemaEntry],
    slots: &mut [EncodeSlot<'_>],
) -> Asn1Result<Bytes> {
    let total = size_items(schema, slots)?;
    let mut buf = BytesMut::zeroed(total);
    write_items(schema, slots, &mut buf)?;
    Ok(buf.freeze())
}

#[cfg(test)]
mod tests {
    use super::*;
    use asn1tpl_core::oid::sums;
    use asn1tpl_core::tags::*;

    fn encode(schema: &[SchemaEntry], slots: &mut [EncodeSlot<'_>]) -> Vec<u8> {
        encode_items_to_vec(schema, slots).unwrap()
    }

    #[test]
    fn test_encode_zero() {
        let schema = [SchemaEntry::leaf(0, INTEGER)];
        assert_eq!(encode(&schema, &mut [EncodeSlot::uint8(0)]), vec![0x02, 0x01, 0x00]);
        let zero = BigInt::from(0);
        assert_eq!(encode(&schema, &mut [EncodeSlot::mpi(&zero)]), vec![0x02, 0x01, 0x00]);
        assert_eq!(encode(&schema, &mut [EncodeSlot::bytes(&[])]), vec![0x02, 0x01, 0x00]);
    }

    #[test]
    fn test_encode_integers() {
        let schema = [SchemaEntry::leaf(0, INTEGER)];
        assert_eq!(
            encode(&schema, &mut [EncodeSlot::uint16(0x80)]),
            vec![0x02, 0x02, 0x00, 0x80]
        );
        assert_eq!(
            encode(&schema, &mut [EncodeSlot::uint32(65537)]),
            vec![0x02, 0x03, 0x01, 0x00, 0x01]
        );
        let negative = BigInt::from(-129);
        assert_eq!(
            encode(&schema, &mut [EncodeSlot::mpi(&negative)]),
            vec![0x02, 0x02, 0xFF, 0x7F]
        );
        assert_eq!(
            encode(&schema, &mut [EncodeSlot::bytes(&[0x80, 0x01])]),
            vec![0x02, 0x03, 0x00, 0x80, 0x01]
        );

        let schema = [SchemaEntry::leaf(0, BOOLEAN)];
        assert_eq!(encode(&schema, &mut [EncodeSlot::uint8(0xFF)]), vec![0x01, 0x01, 0xFF]);
        assert!(encode_items_to_vec(&schema, &mut [EncodeSlot::uint16(0x100)]).is_err());

        let schema = [SchemaEntry::leaf(0, ENUMERATED)];
        assert_eq!(encode(&schema, &mut [EncodeSlot::uint8(3)]), vec![0x0A, 0x01, 0x03]);
        assert_eq!(
            encode(&schema, &mut [EncodeSlot::uint8(0x80)]),
            vec![0x0A, 0x02, 0x00, 0x80]
        );
    }

    #[test]
    fn test_small_unsigned_under_other_tags() {
        // Only INTEGER and ENUMERATED carry a sign pad
        let schema = [SchemaEntry::leaf(0, OCTET_STRING)];
        assert_eq!(encode(&schema, &mut [EncodeSlot::uint8(0x80)]), vec![0x04, 0x01, 0x80]);
        assert_eq!(
            encode(&schema, &mut [EncodeSlot::uint32(0x0001_0000)]),
            vec![0x04, 0x03, 0x01, 0x00, 0x00]
        );

        let schema = [SchemaEntry::leaf(0, BIT_STRING)];
        assert_eq!(
            encode(&schema, &mut [EncodeSlot::uint16(0x8000)]),
            vec![0x03, 0x03, 0x00, 0x80, 0x00]
        );
    }

    #[test]
    fn test_encode_bit_strings() {
        let schema = [SchemaEntry::leaf(0, BIT_STRING)];
        // Nine significant bits: trailing bits of the last byte are cleared
        assert_eq!(
            encode(&schema, &mut [EncodeSlot::bits(&[0xAB, 0xFF], 7)]),
            vec![0x03, 0x03, 0x07, 0xAB, 0x80]
        );
        assert_eq!(
            encode(&schema, &mut [EncodeSlot::bytes(&[0xAA, 0xBB])]),
            vec![0x03, 0x03, 0x00, 0xAA, 0xBB]
        );
        assert_eq!(encode(&schema, &mut [EncodeSlot::none()]), vec![0x03, 0x01, 0x00]);
        assert!(matches!(
            encode_items_to_vec(&schema, &mut [EncodeSlot::bits(&[0x00], 8)]),
            Err(Asn1Error::InvalidEncoding(_))
        ));
    }

    #[test]
    fn test_encode_sequence_with_suppressed_member() {
        let schema = [
            SchemaEntry::sequence(0),
            SchemaEntry::leaf(1, INTEGER),
            SchemaEntry::leaf(1, NULL).optional(),
        ];
        let mut slots = vec![
            EncodeSlot::none(),
            EncodeSlot::uint8(5),
            EncodeSlot::none().suppressed(),
        ];
        assert_eq!(encode(&schema, &mut slots), vec![0x30, 0x03, 0x02, 0x01, 0x05]);
        assert_eq!(slots[2].length, 0);
        assert_eq!(slots[0].length, 5);
        assert_eq!(slots[0].offset, 5);
        assert_eq!(slots[1].offset, 3);

        let mut slots = vec![EncodeSlot::none(), EncodeSlot::uint8(5), EncodeSlot::none()];
        assert_eq!(
            encode(&schema, &mut slots),
            vec![0x30, 0x05, 0x02, 0x01, 0x05, 0x05, 0x00]
        );
    }

    #[test]
    fn test_suppressed_subtree() {
        let schema = [
            SchemaEntry::sequence(0),
            SchemaEntry::explicit(1, 0).optional(),
            SchemaEntry::leaf(2, INTEGER),
            SchemaEntry::leaf(1, NULL),
        ];
        let mut slots = vec![
            EncodeSlot::none(),
            EncodeSlot::none().suppressed(),
            EncodeSlot::uint8(2),
            EncodeSlot::none(),
        ];
        assert_eq!(encode(&schema, &mut slots), vec![0x30, 0x02, 0x05, 0x00]);
        assert_eq!(slots[2].length, 0);
    }

    #[test]
    fn test_encode_oid() {
        let schema = [SchemaEntry::leaf(0, OBJECT_ID)];
        assert_eq!(
            encode(&schema, &mut [EncodeSlot::oid(OidCategory::Hash, sums::hash::SHA256)]),
            vec![0x06, 0x09, 0x60, 0x86, 0x48, 0x01, 0x65, 0x03, 0x04, 0x02, 0x01]
        );
        assert_eq!(
            encode_items_to_vec(&schema, &mut [EncodeSlot::oid(OidCategory::Hash, 1)]),
            Err(Asn1Error::UnknownOid {
                category: OidCategory::Hash,
                sum: 1
            })
        );
    }

    #[test]
    fn test_replace() {
        let schema = [
            SchemaEntry::sequence(0),
            SchemaEntry::leaf(1, NULL),
            SchemaEntry::leaf(1, INTEGER),
        ];
        let mut slots = vec![
            EncodeSlot::none(),
            EncodeSlot::replace(&[0x05, 0x00]),
            EncodeSlot::uint8(1),
        ];
        assert_eq!(
            encode(&schema, &mut slots),
            vec![0x30, 0x05, 0x05, 0x00, 0x02, 0x01, 0x01]
        );
    }

    #[test]
    fn test_replacement_changed_between_passes() {
        let schema = [SchemaEntry::sequence(0), SchemaEntry::leaf(1, NULL)];
        let mut slots = vec![EncodeSlot::none(), EncodeSlot::replace(&[0x05, 0x00])];
        assert_eq!(size_items(&schema, &mut slots).unwrap(), 4);
        slots[1].value = EncodeValue::Replace(&[0x04, 0x02, 0x01, 0x02]);
        let mut out = [0u8; 16];
        assert!(matches!(
            write_items(&schema, &mut slots, &mut out),
            Err(Asn1Error::InternalError(_))
        ));
    }

    #[test]
    fn test_header_only_bit_string_wrapper() {
        let schema = [
            SchemaEntry::leaf(0, BIT_STRING).header(),
            SchemaEntry::sequence(1),
            SchemaEntry::leaf(2, INTEGER),
        ];
        let mut slots = vec![EncodeSlot::none(), EncodeSlot::none(), EncodeSlot::uint8(5)];
        assert_eq!(
            encode(&schema, &mut slots),
            vec![0x03, 0x06, 0x00, 0x30, 0x03, 0x02, 0x01, 0x05]
        );
    }

    #[test]
    fn test_streaming_header() {
        let payload = [0u8; 300];
        let schema = [SchemaEntry::leaf(0, OCTET_STRING).header()];
        let mut slots = vec![EncodeSlot::bytes(&payload)];
        assert_eq!(encode(&schema, &mut slots), vec![0x04, 0x82, 0x01, 0x2C]);
        assert_eq!(slots[0].content_length, 300);

        let schema = [SchemaEntry::leaf(0, BIT_STRING).header()];
        let mut slots = vec![EncodeSlot::bits(&payload[..10], 0)];
        assert_eq!(encode(&schema, &mut slots), vec![0x03, 0x0B, 0x00]);
    }

    #[test]
    fn test_placeholder() {
        let schema = [
            SchemaEntry::sequence(0),
            SchemaEntry::leaf(1, INTEGER),
            SchemaEntry::leaf(1, OCTET_STRING),
        ];
        let mut slots = vec![
            EncodeSlot::none(),
            EncodeSlot::uint8(1),
            EncodeSlot::placeholder(4),
        ];
        let mut out = encode(&schema, &mut slots);
        let range = slots[2].placeholder_range().unwrap();
        assert_eq!(range, 7..11);
        out[range].copy_from_slice(b"abcd");
        assert_eq!(out, b"\x30\x09\x02\x01\x01\x04\x04abcd".to_vec());
        assert!(slots[1].placeholder_range().is_none());
    }

    #[test]
    fn test_long_length() {
        let data = [0x5Au8; 200];
        let schema = [SchemaEntry::leaf(0, OCTET_STRING)];
        let out = encode(&schema, &mut [EncodeSlot::bytes(&data)]);
        assert_eq!(&out[..3], &[0x04, 0x81, 0xC8]);
        assert_eq!(out.len(), 203);
    }

    #[test]
    fn test_tag_override() {
        let schema = [SchemaEntry::implicit(0, 0)];
        let mut slots = vec![EncodeSlot::bytes(b"x").with_tag(0x86)];
        assert_eq!(encode(&schema, &mut slots), vec![0x86, 0x01, b'x']);
    }

    #[test]
    fn test_write_errors() {
        let schema = [SchemaEntry::leaf(0, NULL)];
        let mut slots = vec![EncodeSlot::none()];
        let mut out = [0u8; 1];
        assert!(matches!(
            write_items(&schema, &mut slots, &mut out),
            Err(Asn1Error::InternalError(_))
        ));
        assert_eq!(size_items(&schema, &mut slots).unwrap(), 2);
        assert_eq!(
            write_items(&schema, &mut slots, &mut out),
            Err(Asn1Error::BufferTooSmall { need: 2, got: 1 })
        );
        let mut out = [0xEEu8; 4];
        assert_eq!(write_items(&schema, &mut slots, &mut out).unwrap(), 2);
        assert_eq!(out, [0x05, 0x00, 0xEE, 0xEE]);
    }

    #[test]
    fn test_value_changed_between_passes() {
        let schema = [SchemaEntry::leaf(0, OCTET_STRING)];
        let mut slots = vec![EncodeSlot::bytes(&[1, 2])];
        size_items(&schema, &mut slots).unwrap();
        slots[0].value = EncodeValue::Bytes(&[1, 2, 3]);
        let mut out = [0u8; 8];
        assert!(matches!(
            write_items(&schema, &mut slots, &mut out),
            Err(Asn1Error::InternalError(_))
        ));
    }

    #[test]
    fn test_choice_members_written() {
        let schema = [
            SchemaEntry::sequence(0),
            SchemaEntry::leaf(1, INTEGER).choice(1),
            SchemaEntry::leaf(1, NULL).choice(1),
        ];
        let mut slots = vec![EncodeSlot::none(), EncodeSlot::uint8(1), EncodeSlot::none()];
        assert!(matches!(
            size_items(&schema, &mut slots),
            Err(Asn1Error::InternalError(_))
        ));
        slots[1].no_output = true;
        assert_eq!(encode(&schema, &mut slots), vec![0x30, 0x02, 0x05, 0x00]);
    }

    #[test]
    fn test_to_bytes() {
        let schema = [SchemaEntry::leaf(0, NULL)];
        let out = encode_items_to_bytes(&schema, &mut [EncodeSlot::none()]).unwrap();
        assert_eq!(&out[..], &[0x05, 0x00]);
    }
}
