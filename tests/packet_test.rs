use chrono::{SubsecRound, TimeZone, Utc};
use pretty_assertions::assert_eq;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use smallvec::smallvec;

use pgpkit::crypto::eddsa;
use pgpkit::crypto::hash::HashAlgorithm;
use pgpkit::crypto::public_key::PublicKeyAlgorithm;
use pgpkit::crypto::sym::SymmetricKeyAlgorithm;
use pgpkit::packet::{
    parse_packets, write_packet, KeyFlags, LiteralData, OnePassSignature, Packet, PublicKey,
    SignatureConfig, SignatureType, Subpacket, SubpacketData, Trust, UserAttribute,
    UserAttributeSubpacket, UserId,
};
use pgpkit::ser::Serialize;
use pgpkit::types::{KeyId, KeyTrait, KeyVersion, Mpi, PublicParams};

fn roundtrip(packet: Packet) {
    let mut buf = Vec::new();
    packet.to_writer(&mut buf).unwrap();

    let (packets, errors) = parse_packets(&buf, false).unwrap();
    assert!(errors.is_empty());
    assert_eq!(packets.len(), 1);
    assert_eq!(packets[0], packet);
}

#[test]
fn literal_packet_roundtrip() {
    roundtrip(Packet::LiteralData(LiteralData::from_str(
        "file.txt",
        "some text content",
    )));
    roundtrip(Packet::LiteralData(LiteralData::from_bytes(
        "",
        &[0u8, 1, 2, 255],
    )));
}

#[test]
fn user_packets_roundtrip() {
    roundtrip(Packet::UserId(UserId::from_str(
        "Packet Tester <packets@example.org>",
    )));
    roundtrip(Packet::UserAttribute(UserAttribute {
        subpackets: vec![UserAttributeSubpacket::Image {
            data: vec![0x10, 0x00, 0x01, 0x01, 0xFF, 0xD8],
        }],
    }));
    roundtrip(Packet::Trust(Trust {
        data: vec![1, 2, 3],
    }));
}

#[test]
fn one_pass_signature_roundtrip() {
    roundtrip(Packet::OnePassSignature(OnePassSignature::new(
        SignatureType::Binary,
        HashAlgorithm::Sha256,
        PublicKeyAlgorithm::EdDsa,
        KeyId::from_slice(&[8, 7, 6, 5, 4, 3, 2, 1]).unwrap(),
    )));
}

#[test]
fn signature_packet_roundtrip() {
    let mut rng = ChaCha8Rng::seed_from_u64(0);

    let (public_params, plain) = eddsa::generate_key(&mut rng);
    let public = PublicKey::new(
        KeyVersion::V4,
        PublicKeyAlgorithm::EdDsa,
        Utc::now().trunc_subsecs(0),
        None,
        public_params,
    )
    .unwrap();
    let secret = pgpkit::packet::SecretKey::new(public.clone(), plain);

    let mut config = SignatureConfig::v4(
        SignatureType::Binary,
        PublicKeyAlgorithm::EdDsa,
        HashAlgorithm::Sha256,
        secret.key_id(),
    );
    config.hashed_subpackets.extend([
        Subpacket::regular(SubpacketData::KeyFlags(KeyFlags::from_slice(&[0x03]))),
        Subpacket::critical(SubpacketData::SignatureExpirationTime(3600)),
        Subpacket::regular(SubpacketData::PreferredSymmetricAlgorithms(smallvec![
            SymmetricKeyAlgorithm::AES256,
        ])),
    ]);

    let signature = config.sign(&secret, b"signed bytes").unwrap();

    // the hashed subpacket area is part of what was signed; it must
    // survive reserialization exactly
    let mut buf = Vec::new();
    write_packet(&mut buf, &signature).unwrap();
    let (packets, _) = parse_packets(&buf, false).unwrap();

    let parsed = match &packets[0] {
        Packet::Signature(sig) => sig,
        p => panic!("unexpected packet: {:?}", p.tag()),
    };
    assert_eq!(parsed, &signature);
    assert_eq!(
        parsed.config.hashed_subpackets,
        signature.config.hashed_subpackets
    );

    // and it still verifies
    parsed.verify(&public, b"signed bytes").unwrap();
    assert!(parsed.verify(&public, b"other bytes").is_err());
}

#[test]
fn text_signature_normalizes_line_endings() {
    let mut rng = ChaCha8Rng::seed_from_u64(1);

    let (public_params, plain) = eddsa::generate_key(&mut rng);
    let public = PublicKey::new(
        KeyVersion::V4,
        PublicKeyAlgorithm::EdDsa,
        Utc::now().trunc_subsecs(0),
        None,
        public_params,
    )
    .unwrap();
    let secret = pgpkit::packet::SecretKey::new(public.clone(), plain);

    let config = SignatureConfig::v4(
        SignatureType::Text,
        PublicKeyAlgorithm::EdDsa,
        HashAlgorithm::Sha256,
        secret.key_id(),
    );
    let signature = config.sign(&secret, b"line one\nline two\n").unwrap();

    // the same text with different line endings still verifies
    signature
        .verify(&public, b"line one\r\nline two\r\n")
        .unwrap();
    signature.verify(&public, b"line one\rline two\r").unwrap();
    assert!(signature.verify(&public, b"line one line two").is_err());
}

#[test]
fn v3_key_fingerprint_shape() {
    // an RSA v3 key: the fingerprint is the 16 byte MD5 over the
    // material, the key id the low 64 bits of the modulus
    let n = Mpi::from_slice(&[
        0xC0, 0x11, 0x22, 0x33, 0x44, 0x55, 0x66, 0x77, 0x88, 0x99, 0xAA, 0xBB, 0xCC, 0xDD, 0xEE,
        0xFF, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08,
    ]);
    let e = Mpi::from_slice(&[0x01, 0x00, 0x01]);

    let key = PublicKey::new(
        KeyVersion::V3,
        PublicKeyAlgorithm::RSA,
        Utc.timestamp_opt(915_148_800, 0).unwrap(),
        Some(365),
        PublicParams::Rsa {
            n: n.clone(),
            e,
        },
    )
    .unwrap();

    let fingerprint = key.fingerprint();
    assert_eq!(fingerprint.len(), 16);

    let key_id = key.key_id();
    assert_eq!(
        key_id.as_ref(),
        &n.as_bytes()[n.len() - 8..],
        "key id must be the low 64 bits of n"
    );

    // v3 keys carry their expiration in the packet itself
    assert_eq!(key.expiration(), Some(365));

    // serialization roundtrip keeps the version specific fields
    let bytes = key.to_bytes().unwrap();
    let back = PublicKey::from_slice(&bytes).unwrap();
    assert_eq!(key, back);
}

#[test]
fn key_packet_roundtrip() {
    let mut rng = ChaCha8Rng::seed_from_u64(2);

    let (public_params, _plain) = eddsa::generate_key(&mut rng);
    let key = PublicKey::new(
        KeyVersion::V4,
        PublicKeyAlgorithm::EdDsa,
        Utc::now().trunc_subsecs(0),
        None,
        public_params,
    )
    .unwrap();

    roundtrip(Packet::PublicKey(key));
}
