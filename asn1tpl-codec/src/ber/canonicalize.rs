//! Two-pass BER to DER rewrite
//!
//! The first pass walks every constructed item and records those whose
//! DER form differs from the input, along with their definite content
//! length. The second pass emits the DER form, looking the records up by
//! position.

use asn1tpl_core::tags::{self, BIT_STRING, EOC};
use asn1tpl_core::{Asn1Error, Asn1Result};
use log::{debug, trace};

use super::indefinite::IndefItems;
use crate::tlv::{
    Length, check_bit_string, identifier_len, length_size, read_ber_length, write_length,
};

/// Convert BER `input` to DER
///
/// Indefinite lengths become definite, constructed strings are merged
/// into one primitive item and every length takes its minimal form.
/// Items already in DER are copied unchanged.
///
/// # Arguments
/// * `input` - One or more complete BER items
/// * `output` - Destination for the DER form, or `None` to only size it
///
/// # Returns
/// The DER size. When `output` is given the DER form is written to its
/// start.
///
/// # Error Handling
/// Returns error if:
/// - An item is truncated or runs past its parent (`TruncatedInput`)
/// - An End-of-Content is missing, malformed or misplaced, a primitive
///   item is indefinite, or a string fragment is malformed
///   (`InvalidEncoding`)
/// - Nesting or the number of rewritten items exceeds the fixed bounds
///   (`ResourceExhausted`)
/// - `output` is shorter than the DER size (`BufferTooSmall`)
pub fn ber_to_der(input: &[u8], output: Option<&mut [u8]>) -> Asn1Result<usize> {
    let mut items = IndefItems::new();
    scan(input, &mut items).inspect_err(|e| debug!("BER scan failed: {}", e))?;
    trace!("{} rewritten items", items.len());

    let need = emit(input, &items, &mut Sink::counting())?;
    if let Some(out) = output {
        if out.len() < need {
            return Err(Asn1Error::BufferTooSmall {
                need,
                got: out.len(),
            });
        }
        emit(input, &items, &mut Sink::writing(out))?;
    }
    Ok(need)
}

/// Convert BER `input` to a new DER vector
pub fn ber_to_der_vec(input: &[u8]) -> Asn1Result<Vec<u8>> {
    let need = ber_to_der(input, None)?;
    let mut out = vec![0u8; need];
    ber_to_der(input, Some(&mut out[..]))?;
    Ok(out)
}

/// End-of-Content at `idx`: `00 00` before `limit`
fn is_eoc(input: &[u8], idx: usize, limit: usize) -> Asn1Result<bool> {
    if input[idx] != EOC {
        return Ok(false);
    }
    if idx + 1 < limit && input[idx + 1] == 0x00 {
        return Ok(true);
    }
    Err(Asn1Error::InvalidEncoding(format!(
        "malformed End-of-Content at offset {}",
        idx
    )))
}

/// Read a length whose content must end by `limit`
fn definite_content(
    input: &[u8],
    idx: &mut usize,
    limit: usize,
    start: usize,
) -> Asn1Result<Option<usize>> {
    match read_ber_length(input, idx, limit)? {
        Length::Indefinite => Ok(None),
        Length::Definite(len) => {
            if len > limit - *idx {
                return Err(Asn1Error::TruncatedInput(format!(
                    "item at offset {} needs {} bytes",
                    start, len
                )));
            }
            Ok(Some(len))
        }
    }
}

fn scan(input: &[u8], items: &mut IndefItems) -> Asn1Result<()> {
    let mut idx = 0;
    loop {
        items.close_definite(idx)?;
        let bound = items.bound(input.len());
        if idx >= bound {
            if items.has_open() {
                return Err(Asn1Error::InvalidEncoding(format!(
                    "missing End-of-Content before offset {}",
                    idx
                )));
            }
            break;
        }
        if is_eoc(input, idx, bound)? {
            if !items.top_is_indefinite() {
                return Err(Asn1Error::InvalidEncoding(format!(
                    "End-of-Content at offset {} closes no indefinite-length item",
                    idx
                )));
            }
            items.pop()?;
            idx += 2;
            continue;
        }
        let start = idx;
        let tag = input[idx];
        let tag_len = identifier_len(input, idx, bound)?;
        idx += tag_len;
        let len = definite_content(input, &mut idx, bound, start)?;

        if !tags::is_constructed(tag) {
            let Some(len) = len else {
                return Err(Asn1Error::InvalidEncoding(format!(
                    "indefinite length on primitive item at offset {}",
                    start
                )));
            };
            let header = tag_len + length_size(len);
            items.add_data(header + len, header != idx - start)?;
            idx += len;
            continue;
        }

        let end = len.map(|len| idx + len);
        match end {
            Some(end) => items.push_definite(start, tag_len, idx - start, end)?,
            None => items.push(start, tag_len, bound)?,
        }
        trace!(
            "{} {} at offset {}",
            if end.is_some() { "definite" } else { "indefinite" },
            tags::name(tag),
            start
        );
        if tags::is_fragmentable(tag) {
            idx = scan_fragments(input, idx, tag, end, bound, items)?;
            items.pop()?;
        }
    }
    items.finish();
    Ok(())
}

/// Sum the fragments of a constructed string
///
/// The string ends at `end` for the definite form, or at its
/// End-of-Content before `bound` otherwise. Only primitive fragments with
/// the string's own tag are accepted.
fn scan_fragments(
    input: &[u8],
    mut idx: usize,
    tag: u8,
    end: Option<usize>,
    bound: usize,
    items: &mut IndefItems,
) -> Asn1Result<usize> {
    let fragment_tag = tags::strip_constructed(tag);
    let bit_string = fragment_tag == BIT_STRING;
    let limit = end.unwrap_or(bound);
    let mut unused = 0u8;
    loop {
        if end == Some(idx) {
            break;
        }
        if idx >= limit {
            return Err(Asn1Error::InvalidEncoding(
                "constructed string missing End-of-Content".to_string(),
            ));
        }
        if end.is_none() && is_eoc(input, idx, limit)? {
            idx += 2;
            break;
        }
        let start = idx;
        if input[idx] != fragment_tag {
            return Err(Asn1Error::InvalidEncoding(format!(
                "fragment tag 0x{:02X} at offset {} in {}",
                input[idx],
                idx,
                tags::name(tag)
            )));
        }
        idx += 1;
        let Some(len) = definite_content(input, &mut idx, limit, start)? else {
            return Err(Asn1Error::InvalidEncoding(format!(
                "indefinite fragment at offset {}",
                start
            )));
        };
        if bit_string {
            if unused != 0 {
                return Err(Asn1Error::InvalidEncoding(format!(
                    "BIT STRING fragment at offset {} follows a partial byte",
                    start
                )));
            }
            unused = check_bit_string(&input[idx..idx + len])
                .inspect_err(|e| debug!("BIT STRING fragment at offset {}: {}", start, e))?;
            items.add_data(len - 1, true)?;
        } else {
            items.add_data(len, true)?;
        }
        idx += len;
    }
    if bit_string {
        items.add_data(1, true)?;
    }
    items.set_merged(unused);
    Ok(idx)
}

/// Output target that either writes or only counts
struct Sink<'o> {
    out: Option<&'o mut [u8]>,
    pos: usize,
}

impl<'o> Sink<'o> {
    fn counting() -> Self {
        Self { out: None, pos: 0 }
    }

    fn writing(out: &'o mut [u8]) -> Self {
        Self { out: Some(out), pos: 0 }
    }

    fn put(&mut self, bytes: &[u8]) -> Asn1Result<()> {
        let end = self.pos + bytes.len();
        if let Some(out) = self.out.as_deref_mut() {
            let got = out.len();
            out.get_mut(self.pos..end)
                .ok_or(Asn1Error::BufferTooSmall { need: end, got })?
                .copy_from_slice(bytes);
        }
        self.pos = end;
        Ok(())
    }

    fn put_length(&mut self, len: usize) -> Asn1Result<()> {
        let mut buf = [0u8; 1 + core::mem::size_of::<usize>()];
        let n = write_length(len, &mut buf);
        self.put(&buf[..n])
    }
}

fn emit(input: &[u8], items: &IndefItems, sink: &mut Sink<'_>) -> Asn1Result<usize> {
    let mut idx = 0;
    while idx < input.len() {
        if input[idx] == EOC {
            idx += 2;
            continue;
        }
        let start = idx;
        let tag = input[idx];
        let tag_len = identifier_len(input, idx, input.len())?;
        let mut pos = idx + tag_len;
        let length = read_ber_length(input, &mut pos, input.len())?;

        if !tags::is_constructed(tag) {
            let Length::Definite(len) = length else {
                return Err(Asn1Error::InternalError(format!(
                    "indefinite primitive at offset {} passed scan",
                    start
                )));
            };
            sink.put(&input[start..start + tag_len])?;
            sink.put_length(len)?;
            sink.put(&input[pos..pos + len])?;
            idx = pos + len;
            continue;
        }

        let Some(item) = items.find(start) else {
            // Nothing inside was rewritten
            let Length::Definite(len) = length else {
                return Err(Asn1Error::InternalError(format!(
                    "no record for item at offset {}",
                    start
                )));
            };
            sink.put(&input[start..pos + len])?;
            idx = pos + len;
            continue;
        };
        if tags::is_fragmentable(tag) {
            sink.put(&[tags::strip_constructed(tag)])?;
            sink.put(&input[start + 1..start + tag_len])?;
            sink.put_length(item.content_len)?;
            if tags::strip_constructed(tag) == BIT_STRING {
                sink.put(&[item.unused_bits])?;
            }
            let end = match length {
                Length::Definite(len) => Some(pos + len),
                Length::Indefinite => None,
            };
            idx = emit_fragments(input, pos, tag, end, sink)?;
        } else {
            sink.put(&input[start..start + tag_len])?;
            sink.put_length(item.content_len)?;
            idx = pos;
        }
    }
    Ok(sink.pos)
}

/// Copy fragment contents of a scanned constructed string
fn emit_fragments(
    input: &[u8],
    mut idx: usize,
    tag: u8,
    end: Option<usize>,
    sink: &mut Sink<'_>,
) -> Asn1Result<usize> {
    let skip = usize::from(tags::strip_constructed(tag) == BIT_STRING);
    loop {
        match end {
            Some(end) if idx == end => return Ok(idx),
            None if input[idx] == EOC => return Ok(idx + 2),
            _ => {}
        }
        let mut pos = idx + 1;
        let len = match read_ber_length(input, &mut pos, input.len())? {
            Length::Definite(len) => len,
            Length::Indefinite => {
                return Err(Asn1Error::InternalError(format!(
                    "indefinite fragment at offset {} passed scan",
                    idx
                )));
            }
        };
        sink.put(&input[pos + skip..pos + len])?;
        idx = pos + len;
    }
}
