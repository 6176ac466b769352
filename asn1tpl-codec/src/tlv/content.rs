//! Content rules for INTEGER and BIT STRING
//!
//! INTEGER content is two's complement and must be minimal in DER: a
//! leading `00` is only allowed when the next byte has its top bit set.
//! BIT STRING content starts with the count of unused bits in the final
//! byte.

use asn1tpl_core::tags;
use asn1tpl_core::{Asn1Error, Asn1Result, IntegerPolicy};
use num_bigint::{BigInt, Sign};

/// INTEGER and ENUMERATED share the two's complement content encoding
pub fn is_integer_tag(tag: u8) -> bool {
    tag == tags::INTEGER || tag == tags::ENUMERATED
}

/// Check INTEGER content against the leading-byte rule
///
/// Returns `true` when the first byte is a zero pad that the caller
/// should strip to get the unsigned magnitude. A lone `00` is the value
/// zero and is not a pad.
pub fn check_integer(content: &[u8], policy: IntegerPolicy) -> Asn1Result<bool> {
    match content {
        [] => Err(Asn1Error::InvalidEncoding("empty INTEGER".to_string())),
        [_] => Ok(false),
        [0x00, next, ..] => {
            if next & 0x80 == 0 && policy == IntegerPolicy::Strict {
                return Err(Asn1Error::InvalidEncoding(
                    "INTEGER has redundant leading zero".to_string(),
                ));
            }
            Ok(true)
        }
        [0xFF, next, ..] if next & 0x80 != 0 && policy == IntegerPolicy::Strict => Err(
            Asn1Error::InvalidEncoding("INTEGER has redundant leading 0xFF".to_string()),
        ),
        _ => Ok(false),
    }
}

/// Check BIT STRING content and return its unused-bit count
pub fn check_bit_string(content: &[u8]) -> Asn1Result<u8> {
    let Some((&unused, bits)) = content.split_first() else {
        return Err(Asn1Error::InvalidEncoding(
            "BIT STRING without unused-bits byte".to_string(),
        ));
    };
    if unused > 7 {
        return Err(Asn1Error::InvalidEncoding(format!(
            "BIT STRING unused bits {} out of range",
            unused
        )));
    }
    match bits.last() {
        None if unused != 0 => Err(Asn1Error::InvalidEncoding(
            "empty BIT STRING with unused bits".to_string(),
        )),
        Some(&last) if last & unused_mask(unused) != 0 => Err(Asn1Error::InvalidEncoding(
            "BIT STRING unused bits are not zero".to_string(),
        )),
        _ => Ok(unused),
    }
}

/// Mask of the low `unused` bits of a byte
pub fn unused_mask(unused: u8) -> u8 {
    ((1u16 << unused) - 1) as u8
}

/// Minimal big-endian byte count of an unsigned value, at least one
pub fn uint_min_len(value: u32) -> usize {
    ((u32::BITS - value.leading_zeros()).div_ceil(8) as usize).max(1)
}

/// Content length of an unsigned value as a DER INTEGER
///
/// One byte longer than [`uint_min_len`] when the top bit is set, so the
/// value does not read back as negative.
pub fn uint_content_len(value: u32) -> usize {
    let bytes = uint_min_len(value);
    let top = (value >> (8 * (bytes - 1))) as u8;
    bytes + usize::from(top & 0x80 != 0)
}

/// Write `value` big-endian across the whole of `out`
///
/// High bytes beyond the value's width are zero, which gives the INTEGER
/// sign pad when `out` is [`uint_content_len`] long. Bytes of the value
/// that do not fit are dropped.
pub fn write_uint(value: u32, out: &mut [u8]) {
    let be = value.to_be_bytes();
    let take = out.len().min(4);
    let (pad, tail) = out.split_at_mut(out.len() - take);
    pad.fill(0);
    tail.copy_from_slice(&be[4 - take..]);
}

/// Content length of a signed multi-precision value as a DER INTEGER
pub fn mpi_content_len(value: &BigInt) -> usize {
    let bits = match value.sign() {
        Sign::Minus => (value.magnitude() - 1u32).bits(),
        _ => value.magnitude().bits(),
    };
    (bits / 8 + 1) as usize
}

/// Read up to `width` bytes as a big-endian unsigned value
pub fn read_uint(content: &[u8], width: usize) -> Asn1Result<u32> {
    if content.is_empty() {
        return Err(Asn1Error::InvalidEncoding("empty numeric content".to_string()));
    }
    if content.len() > width {
        return Err(Asn1Error::InvalidEncoding(format!(
            "{} byte value does not fit in {} bytes",
            content.len(),
            width
        )));
    }
    Ok(content.iter().fold(0u32, |acc, &b| (acc << 8) | b as u32))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer_leading_byte_rule() {
        assert!(check_integer(&[], IntegerPolicy::Strict).is_err());
        assert_eq!(check_integer(&[0x00], IntegerPolicy::Strict).unwrap(), false);
        assert_eq!(check_integer(&[0x00, 0x80], IntegerPolicy::Strict).unwrap(), true);
        assert_eq!(check_integer(&[0x7F, 0x00], IntegerPolicy::Strict).unwrap(), false);
        assert!(check_integer(&[0x00, 0x7F], IntegerPolicy::Strict).is_err());
        assert!(check_integer(&[0xFF, 0x80], IntegerPolicy::Strict).is_err());
        assert_eq!(check_integer(&[0xFF, 0x7F], IntegerPolicy::Strict).unwrap(), false);
    }

    #[test]
    fn test_integer_lenient_policy() {
        assert_eq!(
            check_integer(&[0x00, 0x7F], IntegerPolicy::LeadingZeroAny).unwrap(),
            true
        );
        assert_eq!(
            check_integer(&[0xFF, 0x80], IntegerPolicy::LeadingZeroAny).unwrap(),
            false
        );
    }

    #[test]
    fn test_bit_string_rules() {
        assert_eq!(check_bit_string(&[0x00]).unwrap(), 0);
        assert!(check_bit_string(&[]).is_err());
        assert!(check_bit_string(&[0x01]).is_err());
        assert!(check_bit_string(&[0x08, 0x00]).is_err());
        assert_eq!(check_bit_string(&[0x07, 0x80]).unwrap(), 7);
        assert!(check_bit_string(&[0x07, 0x81]).is_err());
        assert_eq!(check_bit_string(&[0x04, 0xAB, 0xF0]).unwrap(), 4);
    }

    #[test]
    fn test_uint_content() {
        assert_eq!(uint_min_len(0), 1);
        assert_eq!(uint_min_len(0x80), 1);
        assert_eq!(uint_min_len(0x8000), 2);
        assert_eq!(uint_content_len(0x7F), 1);
        assert_eq!(uint_content_len(0x80), 2);
        assert_eq!(uint_content_len(0xFFFF_FFFF), 5);

        let mut buf = [0xEEu8; 5];
        write_uint(0x80, &mut buf[..2]);
        assert_eq!(&buf[..2], &[0x00, 0x80]);
        write_uint(0x80, &mut buf[..1]);
        assert_eq!(buf[0], 0x80);
        write_uint(0x0102, &mut buf[..2]);
        assert_eq!(&buf[..2], &[0x01, 0x02]);
        write_uint(0xFFFF_FFFF, &mut buf);
        assert_eq!(buf, [0x00, 0xFF, 0xFF, 0xFF, 0xFF]);
    }

    #[test]
    fn test_mpi_content_len_matches_twos_complement() {
        let values = [
            0i64, 1, 127, 128, 255, 256, 32767, 32768, -1, -128, -129, -256, -32768, -32769,
        ];
        for v in values {
            let n = BigInt::from(v);
            assert_eq!(mpi_content_len(&n), n.to_signed_bytes_be().len(), "value {}", v);
        }
    }

    #[test]
    fn test_read_uint() {
        assert_eq!(read_uint(&[0x01, 0x00], 2).unwrap(), 256);
        assert!(read_uint(&[0x01, 0x00, 0x00], 2).is_err());
        assert!(read_uint(&[], 4).is_err());
    }
}
