use asn1tpl::oid::sums;
use asn1tpl::tags::*;
use asn1tpl::{
    Asn1Error, DecodeOptions, DecodeSlot, EncodeSlot, OidCategory, SchemaEntry, ber_to_der_vec,
    decode_items, decode_items_with, encode_items_to_vec,
};
use num_bigint::BigInt;

/// SubjectPublicKeyInfo holding an RSA key
const RSA_SPKI: [SchemaEntry; 8] = [
    SchemaEntry::sequence(0),
    SchemaEntry::sequence(1),
    SchemaEntry::leaf(2, OBJECT_ID),
    SchemaEntry::leaf(2, NULL).optional(),
    SchemaEntry::leaf(1, BIT_STRING).header(),
    SchemaEntry::sequence(2),
    SchemaEntry::leaf(3, INTEGER),
    SchemaEntry::leaf(3, INTEGER),
];

const RSA_SPKI_DER: [u8; 31] = [
    0x30, 0x1D, // SubjectPublicKeyInfo
    0x30, 0x0D, // AlgorithmIdentifier
    0x06, 0x09, 0x2A, 0x86, 0x48, 0x86, 0xF7, 0x0D, 0x01, 0x01, 0x01, // rsaEncryption
    0x05, 0x00, // NULL
    0x03, 0x0C, 0x00, // BIT STRING
    0x30, 0x09, // RSAPublicKey
    0x02, 0x02, 0x00, 0xC5, // modulus
    0x02, 0x03, 0x01, 0x00, 0x01, // exponent
];

fn decode<'a>(
    schema: &[SchemaEntry],
    slots: &mut [DecodeSlot<'a>],
    input: &'a [u8],
) -> Result<(), Asn1Error> {
    let mut cursor = 0;
    decode_items(schema, slots, input, &mut cursor, true, input.len())
}

#[test]
fn test_encode_integer_zero() {
    let schema = [SchemaEntry::leaf(0, INTEGER)];
    assert_eq!(
        encode_items_to_vec(&schema, &mut [EncodeSlot::uint8(0)]).unwrap(),
        vec![0x02, 0x01, 0x00]
    );
    let zero = BigInt::from(0u8);
    assert_eq!(
        encode_items_to_vec(&schema, &mut [EncodeSlot::mpi(&zero)]).unwrap(),
        vec![0x02, 0x01, 0x00]
    );
}

#[test]
fn test_bit_string_nine_bits() {
    let schema = [SchemaEntry::leaf(0, BIT_STRING)];
    let der = encode_items_to_vec(&schema, &mut [EncodeSlot::bits(&[0xA5, 0x80], 7)]).unwrap();
    assert_eq!(der, vec![0x03, 0x03, 0x07, 0xA5, 0x80]);

    let mut slots = vec![DecodeSlot::reference()];
    decode(&schema, &mut slots, &der).unwrap();
    assert_eq!(slots[0].unused_bits, 7);
    assert_eq!(slots[0].content(), Some(&[0xA5, 0x80][..]));

    let dirty = [0x03, 0x03, 0x07, 0xA5, 0x81];
    assert!(matches!(
        decode(&schema, &mut slots, &dirty),
        Err(Asn1Error::InvalidEncoding(_))
    ));
}

#[test]
fn test_indefinite_then_decode() {
    let der = ber_to_der_vec(&[0x30, 0x80, 0x02, 0x01, 0x05, 0x00, 0x00]).unwrap();
    assert_eq!(der, vec![0x30, 0x03, 0x02, 0x01, 0x05]);

    let schema = [SchemaEntry::sequence(0), SchemaEntry::leaf(1, INTEGER)];
    let mut slots = vec![DecodeSlot::none(), DecodeSlot::uint8()];
    decode(&schema, &mut slots, &der).unwrap();
    assert_eq!(slots[1].as_u32(), Some(5));
}

#[test]
fn test_choice_group_without_match() {
    let schema = [
        SchemaEntry::sequence(0),
        SchemaEntry::leaf(1, INTEGER).choice(2),
        SchemaEntry::leaf(1, UTF8_STRING).choice(2),
    ];
    let mut slots = DecodeSlot::for_schema(&schema);
    assert_eq!(
        decode(&schema, &mut slots, &[0x30, 0x02, 0x05, 0x00]),
        Err(Asn1Error::MissingChoice { group: 2 })
    );
    decode(&schema, &mut slots, &[0x30, 0x03, 0x0C, 0x01, b'a']).unwrap();
    assert!(!slots[1].present);
    assert_eq!(slots[1].length, 0);
    assert!(slots[2].present);
}

#[test]
fn test_unknown_hash_oid() {
    // SEQUENCE { OID 1.2.840.113549.2.99 }
    let input = [0x30, 0x0A, 0x06, 0x08, 0x2A, 0x86, 0x48, 0x86, 0xF7, 0x0D, 0x02, 0x63];
    let schema = [SchemaEntry::sequence(0), SchemaEntry::leaf(1, OBJECT_ID)];
    let mut slots = vec![DecodeSlot::none(), DecodeSlot::oid(OidCategory::Hash)];
    assert!(matches!(
        decode(&schema, &mut slots, &input),
        Err(Asn1Error::UnknownOid {
            category: OidCategory::Hash,
            ..
        })
    ));

    let mut cursor = 0;
    decode_items_with(
        &DecodeOptions::lenient(),
        &schema,
        &mut slots,
        &input,
        &mut cursor,
        true,
        input.len(),
    )
    .unwrap();
    assert!(slots[1].present);
    assert_eq!(cursor, input.len());
}

#[test]
fn test_subject_public_key_info_round_trip() {
    let mut slots = vec![
        DecodeSlot::none(),
        DecodeSlot::none(),
        DecodeSlot::oid(OidCategory::Key),
        DecodeSlot::none(),
        DecodeSlot::none(),
        DecodeSlot::none(),
        DecodeSlot::mpi(false),
        DecodeSlot::uint32(),
    ];
    decode(&RSA_SPKI, &mut slots, &RSA_SPKI_DER).unwrap();
    assert_eq!(slots[2].oid_sum(), Some(sums::key::RSA));
    assert!(slots[3].present);
    assert_eq!(slots[4].unused_bits, 0);
    let modulus = slots[6].as_mpi().cloned().unwrap();
    assert_eq!(modulus, BigInt::from(0xC5));
    assert!(slots[6].zero_padded);
    let exponent = slots[7].as_u32().unwrap();
    assert_eq!(exponent, 65537);

    let mut out = vec![
        EncodeSlot::none(),
        EncodeSlot::none(),
        EncodeSlot::oid(OidCategory::Key, sums::key::RSA),
        EncodeSlot::none(),
        EncodeSlot::none(),
        EncodeSlot::none(),
        EncodeSlot::mpi(&modulus),
        EncodeSlot::uint32(exponent),
    ];
    assert_eq!(encode_items_to_vec(&RSA_SPKI, &mut out).unwrap(), RSA_SPKI_DER.to_vec());
}

#[test]
fn test_spki_without_parameters() {
    let mut der = RSA_SPKI_DER.to_vec();
    // Drop the NULL and fix up the enclosing lengths
    der.drain(15..17);
    der[1] = 0x1B;
    der[3] = 0x0B;
    let mut slots = DecodeSlot::for_schema(&RSA_SPKI);
    decode(&RSA_SPKI, &mut slots, &der).unwrap();
    assert!(!slots[3].present);
    assert!(slots[7].present);
}

#[test]
fn test_spki_with_trailing_bytes_in_key() {
    let mut der = RSA_SPKI_DER.to_vec();
    der.extend_from_slice(&[0x05, 0x00]);
    der[1] += 2;
    der[18] += 2;
    let mut slots = DecodeSlot::for_schema(&RSA_SPKI);
    assert_eq!(
        decode(&RSA_SPKI, &mut slots, &der),
        Err(Asn1Error::TrailingData {
            expected: 33,
            actual: 31
        })
    );
}
