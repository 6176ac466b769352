//! Template decoder
//!
//! Walks a flat schema against DER input, filling one [`DecodeSlot`] per
//! schema entry. Structure is tracked with an `end_of` table holding the
//! content end of each open constructed level.

use asn1tpl_core::tags::{self, BIT_STRING, BOOLEAN, OBJECT_ID};
use asn1tpl_core::{Asn1Error, Asn1Result, DecodeOptions, OidCategory, oid};
use log::{debug, trace};
use num_bigint::{BigInt, Sign};

use super::schema::{
    MAX_CHOICE_GROUPS, MAX_DEPTH, Optionality, SchemaDisplay, SchemaEntry, ends_choice_run,
    starts_choice_run, subtree_end, validate_schema,
};
use crate::tlv::content::read_uint;
use crate::tlv::{check_bit_string, check_integer, is_integer_tag, read_length};

/// Destination of a decoded item's content
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeValue<'a> {
    /// Only position and length are recorded
    None,
    /// Borrowed content
    Ref(&'a [u8]),
    U8(u8),
    U16(u16),
    U32(u32),
    /// Multi-precision integer; unsigned values must not be negative
    Mpi { signed: bool, value: Option<BigInt> },
    /// Object identifier verified against a category table
    Oid { category: OidCategory, sum: u32, content: &'a [u8] },
    /// Any of the listed full tag bytes matches
    Choice { tags: &'a [u8], content: &'a [u8] },
    /// Content must equal these bytes
    Expect(&'a [u8]),
    /// Content of at most `max` bytes; longer content is `TruncatedInput`
    Bounded { max: usize, content: &'a [u8] },
}

impl DecodeValue<'_> {
    /// Reset outputs, keeping the configuration part of the variant
    fn clear(&mut self) {
        match self {
            DecodeValue::None | DecodeValue::Expect(_) => {}
            DecodeValue::Ref(content) => *content = &[],
            DecodeValue::U8(v) => *v = 0,
            DecodeValue::U16(v) => *v = 0,
            DecodeValue::U32(v) => *v = 0,
            DecodeValue::Mpi { value, .. } => *value = None,
            DecodeValue::Oid { sum, content, .. } => {
                *sum = 0;
                *content = &[];
            }
            DecodeValue::Choice { content, .. } | DecodeValue::Bounded { content, .. } => {
                *content = &[]
            }
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            DecodeValue::None => "none",
            DecodeValue::Ref(_) => "reference",
            DecodeValue::U8(_) => "u8",
            DecodeValue::U16(_) => "u16",
            DecodeValue::U32(_) => "u32",
            DecodeValue::Mpi { .. } => "mpi",
            DecodeValue::Oid { .. } => "oid",
            DecodeValue::Choice { .. } => "choice",
            DecodeValue::Expect(_) => "expect",
            DecodeValue::Bounded { .. } => "bounded",
        }
    }
}

/// Per-entry decode destination and result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeSlot<'a> {
    pub value: DecodeValue<'a>,
    /// Whether the item was found in the input
    pub present: bool,
    /// Tag byte as read
    pub tag: u8,
    /// Offset of the item's first header byte
    pub offset: usize,
    /// Offset of the content, after any stripped prefix byte
    pub content_offset: usize,
    /// Content length, after any stripped prefix byte
    pub length: usize,
    /// Unused bits of a BIT STRING
    pub unused_bits: u8,
    /// An INTEGER zero pad was stripped
    pub zero_padded: bool,
}

impl<'a> DecodeSlot<'a> {
    pub fn new(value: DecodeValue<'a>) -> Self {
        Self {
            value,
            present: false,
            tag: 0,
            offset: 0,
            content_offset: 0,
            length: 0,
            unused_bits: 0,
            zero_padded: false,
        }
    }

    pub fn none() -> Self {
        Self::new(DecodeValue::None)
    }

    pub fn reference() -> Self {
        Self::new(DecodeValue::Ref(&[]))
    }

    pub fn uint8() -> Self {
        Self::new(DecodeValue::U8(0))
    }

    pub fn uint16() -> Self {
        Self::new(DecodeValue::U16(0))
    }

    pub fn uint32() -> Self {
        Self::new(DecodeValue::U32(0))
    }

    pub fn mpi(signed: bool) -> Self {
        Self::new(DecodeValue::Mpi { signed, value: None })
    }

    pub fn oid(category: OidCategory) -> Self {
        Self::new(DecodeValue::Oid {
            category,
            sum: 0,
            content: &[],
        })
    }

    pub fn choice(tags: &'a [u8]) -> Self {
        Self::new(DecodeValue::Choice { tags, content: &[] })
    }

    pub fn expect(bytes: &'a [u8]) -> Self {
        Self::new(DecodeValue::Expect(bytes))
    }

    pub fn bounded(max: usize) -> Self {
        Self::new(DecodeValue::Bounded { max, content: &[] })
    }

    /// One slot per schema entry, all recording position only
    pub fn for_schema(schema: &[SchemaEntry]) -> Vec<Self> {
        vec![Self::none(); schema.len()]
    }

    /// Borrowed content, when the value kind keeps one
    pub fn content(&self) -> Option<&'a [u8]> {
        match self.value {
            DecodeValue::Ref(c)
            | DecodeValue::Expect(c)
            | DecodeValue::Oid { content: c, .. }
            | DecodeValue::Choice { content: c, .. }
            | DecodeValue::Bounded { content: c, .. } => Some(c),
            _ => None,
        }
    }

    pub fn as_u32(&self) -> Option<u32> {
        match self.value {
            DecodeValue::U8(v) => Some(v as u32),
            DecodeValue::U16(v) => Some(v as u32),
            DecodeValue::U32(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_mpi(&self) -> Option<&BigInt> {
        match &self.value {
            DecodeValue::Mpi { value, .. } => value.as_ref(),
            _ => None,
        }
    }

    pub fn oid_sum(&self) -> Option<u32> {
        match self.value {
            DecodeValue::Oid { sum, .. } if self.present => Some(sum),
            _ => None,
        }
    }

    fn clear(&mut self) {
        self.value.clear();
        self.present = false;
        self.tag = 0;
        self.offset = 0;
        self.content_offset = 0;
        self.length = 0;
        self.unused_bits = 0;
        self.zero_padded = false;
    }

    fn mark_absent(&mut self, idx: usize) {
        self.present = false;
        self.offset = idx;
        self.content_offset = idx;
        self.length = 0;
    }
}

/// Decode `input[*cursor..max_index]` against `schema` with default options
///
/// # Arguments
/// * `schema` - Flat schema, one entry per expected item in pre-order
/// * `slots` - One destination per schema entry; cleared before decoding
/// * `input` - Buffer holding the DER encoding
/// * `cursor` - Offset of the first item; advanced on success only
/// * `complete` - Require every open level and the input up to `max_index`
///   to be fully consumed
/// * `max_index` - End of the region to decode, clamped to `input.len()`
///
/// # Returns
/// `Ok(())` with the slots filled. Absent optional entries and the subtrees
/// under them are marked not present, positioned at the offset where they
/// were looked for.
///
/// # Error Handling
/// Returns error if:
/// - A required item is missing (`TruncatedInput` at the end of its
///   parent, `UnexpectedTag` or its OID / BIT STRING forms otherwise)
/// - A tag number matches with the wrong constructed bit
/// - A length runs past its parent or the first-byte rules fail
/// - A value does not fit its destination or an OID is unknown
/// - No member of a choice group is present
/// - A level closes early or late (`TrailingData`)
pub fn decode_items<'a>(
    schema: &[SchemaEntry],
    slots: &mut [DecodeSlot<'a>],
    input: &'a [u8],
    cursor: &mut usize,
    complete: bool,
    max_index: usize,
) -> Asn1Result<()> {
    decode_items_with(
        &DecodeOptions::default(),
        schema,
        slots,
        input,
        cursor,
        complete,
        max_index,
    )
}

/// [`decode_items`] with explicit options
///
/// # Arguments
/// * `options` - INTEGER leading-byte policy and whether OIDs are checked
///   against their category tables
///
/// The remaining arguments are those of [`decode_items`].
///
/// # Error Handling
/// As [`decode_items`]. Under [`IntegerPolicy::LeadingZeroAny`] redundant
/// INTEGER lead bytes are accepted, and with `verify_oids` off an unknown
/// OID is returned by its sum instead of failing.
///
/// [`IntegerPolicy::LeadingZeroAny`]: asn1tpl_core::IntegerPolicy::LeadingZeroAny
pub fn decode_items_with<'a>(
    options: &DecodeOptions,
    schema: &[SchemaEntry],
    slots: &mut [DecodeSlot<'a>],
    input: &'a [u8],
    cursor: &mut usize,
    complete: bool,
    max_index: usize,
) -> Asn1Result<()> {
    validate_schema(schema)?;
    if slots.len() != schema.len() {
        return Err(Asn1Error::InternalError(format!(
            "{} slots for {} schema entries",
            slots.len(),
            schema.len()
        )));
    }
    let max_index = max_index.min(input.len());
    if *cursor > max_index {
        return Err(Asn1Error::TruncatedInput(format!(
            "cursor {} past end {}",
            *cursor, max_index
        )));
    }
    slots.iter_mut().for_each(DecodeSlot::clear);
    trace!(
        "decoding from offset {} to {} with schema:\n{}",
        *cursor,
        max_index,
        SchemaDisplay(schema)
    );

    let mut end_of = [max_index; MAX_DEPTH + 1];
    let mut choice_met = [false; MAX_CHOICE_GROUPS + 1];
    let mut idx = *cursor;
    let mut level = 0usize;
    let mut i = 0;

    while i < schema.len() {
        let item = &schema[i];
        let depth = item.depth as usize;
        if depth < level {
            close_levels(&end_of, depth, level, idx)?;
            level = depth;
        }

        let group = item.choice_group().map(usize::from);
        if let Some(g) = group {
            if starts_choice_run(schema, i) {
                choice_met[g] = false;
            }
        }

        let end = end_of[depth];
        let tag = (idx < end).then(|| input[idx]);
        let matched = tag.is_some_and(|t| tag_matches(item, &slots[i].value, t));
        let taken = group.is_some_and(|g| choice_met[g]);

        if let Some(t) = tag {
            if !matched && !taken && form_mismatch(item, &slots[i].value, t) {
                debug!("entry {} has the right tag number but wrong form {:#04x}", i, t);
                return Err(Asn1Error::UnexpectedTag {
                    index: i,
                    offset: idx,
                    tag: t,
                });
            }
        }

        if !matched || taken {
            if group.is_none() && item.optional == Optionality::Required {
                let err = missing_item(item, &slots[i].value, i, idx, tag);
                debug!("decode failed at entry {}: {}", i, err);
                return Err(err);
            }
            let next = subtree_end(schema, i);
            trace!("entry {} absent at offset {}", i, idx);
            slots[i..next].iter_mut().for_each(|s| s.mark_absent(idx));
            if let Some(g) = group {
                if ends_choice_run(schema, i, next) && !choice_met[g] {
                    debug!("no member of choice group {} matched at offset {}", g, idx);
                    return Err(Asn1Error::MissingChoice { group: g as u8 });
                }
            }
            i = next;
            continue;
        }

        let tag = input[idx];
        let start = idx;
        idx += 1;
        let len = read_length(input, &mut idx, end, true)?;
        let content_end = idx + len;
        let raw = &input[idx..content_end];

        let slot = &mut slots[i];
        slot.present = true;
        slot.tag = tag;
        slot.offset = start;

        let mut content_start = idx;
        if !tags::is_constructed(tag) {
            if is_integer_tag(tag) {
                if check_integer(raw, options.integer_policy)? {
                    slot.zero_padded = true;
                    content_start += 1;
                }
            } else if tag == BIT_STRING {
                slot.unused_bits = check_bit_string(raw)?;
                content_start += 1;
            }
        }
        slot.content_offset = content_start;
        slot.length = content_end - content_start;
        let content = &input[content_start..content_end];
        trace!(
            "entry {} {} at offset {} length {}",
            i,
            tags::name(tag),
            start,
            slot.length
        );

        let next = if item.header_only {
            store_header(slot, content, i)?;
            end_of[depth + 1] = content_end;
            idx = content_start;
            level = depth + 1;
            i + 1
        } else {
            store_value(options, slot, tag, raw, content, i, start).inspect_err(|e| {
                debug!("decode failed at entry {}: {}", i, e);
            })?;
            idx = content_end;
            level = depth;
            i + 1
        };

        if let Some(g) = group {
            choice_met[g] = true;
        }
        i = next;
    }

    if complete {
        close_levels(&end_of, 0, level, idx)?;
        if idx != max_index {
            return Err(Asn1Error::TrailingData {
                expected: max_index,
                actual: idx,
            });
        }
    }
    *cursor = idx;
    Ok(())
}

/// Every level deeper than `depth` up to `level` must be fully consumed
fn close_levels(end_of: &[usize], depth: usize, level: usize, idx: usize) -> Asn1Result<()> {
    for d in (depth + 1..=level).rev() {
        if idx != end_of[d] {
            debug!("level {} ends at {} but decoding stopped at {}", d, end_of[d], idx);
            return Err(Asn1Error::TrailingData {
                expected: end_of[d],
                actual: idx,
            });
        }
    }
    Ok(())
}

fn tag_matches(item: &SchemaEntry, value: &DecodeValue<'_>, tag: u8) -> bool {
    match value {
        DecodeValue::Choice { tags, .. } => tags.contains(&tag),
        _ => tag == item.wire_tag(),
    }
}

/// Tag number matches the schema but the constructed bit does not
fn form_mismatch(item: &SchemaEntry, value: &DecodeValue<'_>, tag: u8) -> bool {
    !matches!(value, DecodeValue::Choice { .. })
        && tags::strip_constructed(tag) == item.tag
        && tag != item.wire_tag()
}

fn missing_item(
    item: &SchemaEntry,
    value: &DecodeValue<'_>,
    index: usize,
    offset: usize,
    tag: Option<u8>,
) -> Asn1Error {
    let Some(tag) = tag else {
        return Asn1Error::TruncatedInput(format!(
            "required entry {} missing at offset {}",
            index, offset
        ));
    };
    if matches!(value, DecodeValue::Oid { .. }) || item.wire_tag() == OBJECT_ID {
        Asn1Error::ExpectedOid { index, offset }
    } else if item.wire_tag() == BIT_STRING {
        Asn1Error::ExpectedBitString { index, offset }
    } else {
        Asn1Error::UnexpectedTag { index, offset, tag }
    }
}

fn store_header<'a>(slot: &mut DecodeSlot<'a>, content: &'a [u8], index: usize) -> Asn1Result<()> {
    match &mut slot.value {
        DecodeValue::None => Ok(()),
        DecodeValue::Ref(r) => {
            *r = content;
            Ok(())
        }
        other => Err(Asn1Error::InternalError(format!(
            "header-only entry {} cannot decode into {}",
            index,
            other.kind()
        ))),
    }
}

/// Decode a whole item's content into its slot
///
/// `raw` is the full content, `content` is what remains after stripping
/// an INTEGER pad or the BIT STRING unused-bits byte.
fn store_value<'a>(
    options: &DecodeOptions,
    slot: &mut DecodeSlot<'a>,
    tag: u8,
    raw: &'a [u8],
    content: &'a [u8],
    index: usize,
    offset: usize,
) -> Asn1Result<()> {
    let padded = slot.zero_padded;
    let small = |width| small_uint(tag, content, padded, width, index, offset);
    match &mut slot.value {
        DecodeValue::None => {}
        DecodeValue::Ref(r) => *r = content,
        DecodeValue::U8(v) => *v = small(1)? as u8,
        DecodeValue::U16(v) => *v = small(2)? as u16,
        DecodeValue::U32(v) => *v = small(4)?,
        DecodeValue::Mpi { signed, value } => {
            let integer = is_integer_tag(tag);
            let n = if *signed {
                BigInt::from_signed_bytes_be(raw)
            } else {
                if integer && !padded && content.first().is_some_and(|b| b & 0x80 != 0) {
                    return Err(Asn1Error::InvalidEncoding(format!(
                        "entry {} is a negative INTEGER",
                        index
                    )));
                }
                BigInt::from_bytes_be(Sign::Plus, content)
            };
            *value = Some(n);
        }
        DecodeValue::Oid { category, sum, content: out } => {
            if tag == OBJECT_ID {
                oid::validate_oid_content(content)?;
            }
            let s = oid::oid_sum(content);
            if options.verify_oids {
                oid::verify(*category, s, content)?;
            }
            *sum = s;
            *out = content;
        }
        DecodeValue::Choice { content: out, .. } => *out = content,
        DecodeValue::Expect(expected) => {
            if *expected != content {
                return Err(Asn1Error::InvalidEncoding(format!(
                    "entry {} does not hold the expected value",
                    index
                )));
            }
        }
        DecodeValue::Bounded { max, content: out } => {
            if content.len() > *max {
                return Err(Asn1Error::TruncatedInput(format!(
                    "entry {} holds {} bytes, destination takes {}",
                    index,
                    content.len(),
                    max
                )));
            }
            *out = content;
        }
    }
    Ok(())
}

/// Read a small unsigned value of at most `width` bytes
///
/// Content wider than the destination, or a BOOLEAN that is not exactly
/// one byte, is reported as an unexpected item at `offset`.
fn small_uint(
    tag: u8,
    content: &[u8],
    padded: bool,
    width: usize,
    index: usize,
    offset: usize,
) -> Asn1Result<u32> {
    let width = if tag == BOOLEAN { 1 } else { width };
    let exact = tag != BOOLEAN || content.len() == 1;
    if content.len() > width || !exact {
        debug!(
            "entry {} holds {} content bytes for a {} byte destination",
            index,
            content.len(),
            width
        );
        return Err(Asn1Error::UnexpectedTag { index, offset, tag });
    }
    if is_integer_tag(tag) && !padded && content.first().is_some_and(|b| b & 0x80 != 0) {
        return Err(Asn1Error::InvalidEncoding(
            "negative INTEGER for unsigned destination".to_string(),
        ));
    }
    read_uint(content, width)
}
