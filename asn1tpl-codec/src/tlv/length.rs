//! Length octets
//!
//! Short form (lengths 0-127):
//! ```text
//! Byte: 0 L L L L L L L
//! ```
//!
//! Long form:
//! ```text
//! First byte:      1 N N N N N N N  (N = number of length bytes)
//! Following bytes: L L L L L L L L  (big-endian length value)
//! ```
//!
//! `0x80` alone is the BER indefinite form. DER output is always the
//! minimal definite form.

use asn1tpl_core::tags::{INDEFINITE_LENGTH, LONG_LENGTH};
use asn1tpl_core::{Asn1Error, Asn1Result};

/// Length read from a BER header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Length {
    /// Definite length (short or long form)
    Definite(usize),
    /// Indefinite length (`0x80`), content terminated by End-of-Content
    Indefinite,
}

/// Read a BER length at `*idx`, advancing the index past the length octets
///
/// Does not check the content against the buffer; see [`read_length`].
pub fn read_ber_length(input: &[u8], idx: &mut usize, max_index: usize) -> Asn1Result<Length> {
    let max_index = max_index.min(input.len());
    if *idx >= max_index {
        return Err(Asn1Error::TruncatedInput(format!(
            "no length byte at offset {}",
            *idx
        )));
    }
    let first = input[*idx];
    *idx += 1;

    if first & LONG_LENGTH == 0 {
        return Ok(Length::Definite(first as usize));
    }
    if first == INDEFINITE_LENGTH {
        return Ok(Length::Indefinite);
    }

    let count = (first & 0x7F) as usize;
    if count > core::mem::size_of::<usize>() {
        return Err(Asn1Error::InvalidEncoding(format!(
            "length field of {} bytes at offset {}",
            count,
            *idx - 1
        )));
    }
    if *idx + count > max_index {
        return Err(Asn1Error::TruncatedInput(format!(
            "length field truncated at offset {}",
            *idx
        )));
    }
    let mut value: usize = 0;
    for &byte in &input[*idx..*idx + count] {
        value = (value << 8) | byte as usize;
    }
    *idx += count;

    // Reject values that would be negative as a signed machine word
    if value > isize::MAX as usize {
        return Err(Asn1Error::InvalidEncoding(format!(
            "length {} overflows at offset {}",
            value,
            *idx - count - 1
        )));
    }
    Ok(Length::Definite(value))
}

/// Read a definite length at `*idx`
///
/// # Arguments
/// * `input` - Buffer holding the header
/// * `idx` - Offset of the first length octet; advanced past the length
///   octets on success
/// * `max_index` - End of the readable region, clamped to `input.len()`
/// * `check` - Also require the content to end by `max_index`
///
/// # Returns
/// The content length in bytes.
///
/// # Error Handling
/// Returns error if:
/// - The length octets run past `max_index` (`TruncatedInput`)
/// - The length is indefinite or does not fit a machine word
///   (`InvalidEncoding`); BER input with indefinite lengths must go
///   through the canonicalizer first
/// - `check` is set and the content runs past `max_index` (`TruncatedInput`)
pub fn read_length(
    input: &[u8],
    idx: &mut usize,
    max_index: usize,
    check: bool,
) -> Asn1Result<usize> {
    let start = *idx;
    match read_ber_length(input, idx, max_index)? {
        Length::Indefinite => Err(Asn1Error::InvalidEncoding(format!(
            "indefinite length at offset {}",
            start
        ))),
        Length::Definite(len) => {
            if check {
                let bound = max_index.min(input.len());
                let fits = idx.checked_add(len).is_some_and(|end| end <= bound);
                if !fits {
                    return Err(Asn1Error::TruncatedInput(format!(
                        "length {} at offset {} exceeds bound {}",
                        len, start, bound
                    )));
                }
            }
            Ok(len)
        }
    }
}

/// Number of octets the minimal DER length encoding of `len` takes
pub fn length_size(len: usize) -> usize {
    if len < 0x80 {
        1
    } else {
        1 + value_bytes(len)
    }
}

/// Write the minimal DER length encoding of `len`
///
/// `out` must hold at least [`length_size`] bytes. Returns bytes written.
pub fn write_length(len: usize, out: &mut [u8]) -> usize {
    if len < 0x80 {
        out[0] = len as u8;
        return 1;
    }
    let count = value_bytes(len);
    out[0] = LONG_LENGTH | count as u8;
    for i in 0..count {
        out[1 + i] = (len >> (8 * (count - 1 - i))) as u8;
    }
    1 + count
}

fn value_bytes(len: usize) -> usize {
    let bits = usize::BITS - len.leading_zeros();
    bits.div_ceil(8).max(1) as usize
}
