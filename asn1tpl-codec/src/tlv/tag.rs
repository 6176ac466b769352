//! Identifier octets

use asn1tpl_core::tags;
use asn1tpl_core::{Asn1Error, Asn1Result};

/// Longest high-tag-number continuation accepted (tag numbers up to 2^35)
const MAX_TAG_CONTINUATION: usize = 5;

/// Read one tag byte at `*idx`, advancing the index
///
/// Fails with `TruncatedInput` when `*idx` is at or past `max_index`.
pub fn read_tag(input: &[u8], idx: &mut usize, max_index: usize) -> Asn1Result<u8> {
    let max_index = max_index.min(input.len());
    if *idx >= max_index {
        return Err(Asn1Error::TruncatedInput(format!(
            "no tag byte at offset {}",
            *idx
        )));
    }
    let tag = input[*idx];
    *idx += 1;
    Ok(tag)
}

/// Number of identifier octets starting at `idx`
///
/// Low-tag-number identifiers are one byte; high-tag-number identifiers
/// (low five bits all set) continue while bit 8 is set.
pub fn identifier_len(input: &[u8], idx: usize, max_index: usize) -> Asn1Result<usize> {
    let max_index = max_index.min(input.len());
    if idx >= max_index {
        return Err(Asn1Error::TruncatedInput(format!("no tag byte at offset {}", idx)));
    }
    if input[idx] & tags::NUMBER_MASK != tags::HIGH_TAG_NUMBER {
        return Ok(1);
    }
    let mut len = 1;
    loop {
        let pos = idx + len;
        if pos >= max_index {
            return Err(Asn1Error::TruncatedInput(format!(
                "high tag number truncated at offset {}",
                pos
            )));
        }
        len += 1;
        if input[pos] & 0x80 == 0 {
            return Ok(len);
        }
        if len > MAX_TAG_CONTINUATION {
            return Err(Asn1Error::InvalidEncoding(format!(
                "tag number too long at offset {}",
                idx
            )));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_tag() {
        let data = [0x30, 0x00];
        let mut idx = 0;
        assert_eq!(read_tag(&data, &mut idx, data.len()).unwrap(), 0x30);
        assert_eq!(idx, 1);
    }

    #[test]
    fn test_read_tag_exhausted() {
        let data = [0x30];
        let mut idx = 1;
        assert!(matches!(
            read_tag(&data, &mut idx, data.len()),
            Err(Asn1Error::TruncatedInput(_))
        ));
        // max_index bounds the read even when the slice is longer
        let mut idx = 0;
        assert!(read_tag(&data, &mut idx, 0).is_err());
    }

    #[test]
    fn test_identifier_len() {
        assert_eq!(identifier_len(&[0x02, 0x01], 0, 2).unwrap(), 1);
        assert_eq!(identifier_len(&[0x9F, 0x22, 0x00], 0, 3).unwrap(), 2);
        assert_eq!(identifier_len(&[0xBF, 0x81, 0x01, 0x00], 0, 4).unwrap(), 3);
        assert!(matches!(
            identifier_len(&[0x1F, 0x81], 0, 2),
            Err(Asn1Error::TruncatedInput(_))
        ));
        assert!(matches!(
            identifier_len(&[0x1F, 0x81, 0x81, 0x81, 0x81, 0x81, 0x01], 0, 7),
            Err(Asn1Error::InvalidEncoding(_))
        ));
    }
}
