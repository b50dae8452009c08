use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use pgpkit::composed::{CleartextSignedMessage, Key, KeyParamsBuilder, KeyType};
use pgpkit::config::Config;
use pgpkit::crypto::hash::HashAlgorithm;
use pgpkit::errors::Error;

fn generate_test_key(rng: &mut ChaCha8Rng, user_id: &str) -> Key {
    KeyParamsBuilder::default()
        .key_type(KeyType::Curve25519)
        .user_ids(vec![user_id.to_string()])
        .build()
        .unwrap()
        .generate(rng, &Config::default())
        .unwrap()
}

fn signed_fixture(rng: &mut ChaCha8Rng, text: &str) -> (Key, String) {
    let config = Config::default();
    let key = generate_test_key(rng, "Clear <clear@example.org>");

    let msg =
        CleartextSignedMessage::sign(&config, text, &[&key], HashAlgorithm::Sha256).unwrap();
    let armored = msg.to_armored_string(&config).unwrap();

    (key, armored)
}

#[test]
fn sign_and_verify_roundtrip() {
    let mut rng = ChaCha8Rng::seed_from_u64(0);
    let config = Config::default();

    let (key, armored) = signed_fixture(&mut rng, "hello cleartext\nsecond line");
    assert!(armored.starts_with("-----BEGIN PGP SIGNED MESSAGE-----"));
    assert!(armored.contains("Hash: SHA256"));

    let (parsed, _headers) = CleartextSignedMessage::from_string(&armored, &config).unwrap();
    assert_eq!(parsed.text(), "hello cleartext\nsecond line");

    let verifications = parsed.verify(&[&key]);
    assert_eq!(verifications.len(), 1);
    assert_eq!(verifications[0].valid, Some(true));
}

#[test]
fn tampered_text_fails_verification() {
    let mut rng = ChaCha8Rng::seed_from_u64(1);
    let config = Config::default();

    let (key, armored) = signed_fixture(&mut rng, "original statement");
    let tampered = armored.replace("original statement", "modified statement");

    let (parsed, _) = CleartextSignedMessage::from_string(&tampered, &config).unwrap();
    let verifications = parsed.verify(&[&key]);
    assert_eq!(verifications[0].valid, Some(false));
}

#[test]
fn trailing_whitespace_does_not_matter() {
    let mut rng = ChaCha8Rng::seed_from_u64(2);
    let config = Config::default();

    let (key, armored) = signed_fixture(&mut rng, "padded line\nanother");

    // signature is over the canonical form: added trailing blanks on the
    // text lines are ignored
    let padded = armored.replace("padded line\n", "padded line  \t\n");
    let (parsed, _) = CleartextSignedMessage::from_string(&padded, &config).unwrap();
    assert_eq!(parsed.verify(&[&key])[0].valid, Some(true));
}

#[test]
fn hash_header_must_match_signature() {
    let mut rng = ChaCha8Rng::seed_from_u64(3);
    let config = Config::default();

    let (_key, armored) = signed_fixture(&mut rng, "check my headers");

    // declared SHA1, signed with SHA256
    let mismatched = armored.replace("Hash: SHA256", "Hash: SHA1");
    assert!(matches!(
        CleartextSignedMessage::from_string(&mismatched, &config),
        Err(Error::HashAlgorithmMismatch { .. })
    ));

    // a list that includes the real algorithm is fine
    let listed = armored.replace("Hash: SHA256", "Hash: SHA1, SHA256");
    assert!(CleartextSignedMessage::from_string(&listed, &config).is_ok());

    // lower case names are accepted
    let lower = armored.replace("Hash: SHA256", "Hash: sha256");
    assert!(CleartextSignedMessage::from_string(&lower, &config).is_ok());
}

#[test]
fn missing_hash_header_implies_md5() {
    let mut rng = ChaCha8Rng::seed_from_u64(4);
    let config = Config::default();

    let (_key, armored) = signed_fixture(&mut rng, "no header for me");
    let without = armored.replace("Hash: SHA256\n", "");

    assert!(matches!(
        CleartextSignedMessage::from_string(&without, &config),
        Err(Error::MissingHashHeader { .. })
    ));
}

#[test]
fn only_hash_headers_are_allowed() {
    let mut rng = ChaCha8Rng::seed_from_u64(5);
    let config = Config::default();

    let (_key, armored) = signed_fixture(&mut rng, "strict headers");

    let with_comment = armored.replace("Hash: SHA256", "Comment: sneaky");
    assert!(matches!(
        CleartextSignedMessage::from_string(&with_comment, &config),
        Err(Error::UnexpectedArmorHeader { .. })
    ));

    let unknown_algo = armored.replace("Hash: SHA256", "Hash: WHIRLPOOL512");
    assert!(matches!(
        CleartextSignedMessage::from_string(&unknown_algo, &config),
        Err(Error::UnknownHashAlgorithm { .. })
    ));

    let malformed = armored.replace("Hash: SHA256", "Hash : SHA256");
    assert!(matches!(
        CleartextSignedMessage::from_string(&malformed, &config),
        Err(Error::InvalidArmorHeader { .. })
    ));
}

#[test]
fn dash_escaped_content_roundtrip() {
    let mut rng = ChaCha8Rng::seed_from_u64(6);
    let config = Config::default();

    let text = "normal line\n----- looks like a marker\n- already dashed";
    let (key, armored) = signed_fixture(&mut rng, text);

    // the escaped form never contains a bare marker-like line
    for line in armored.lines() {
        assert!(
            !line.starts_with("-----")
                || line.contains("BEGIN PGP")
                || line.contains("END PGP"),
            "unescaped line: {line}"
        );
    }

    let (parsed, _) = CleartextSignedMessage::from_string(&armored, &config).unwrap();
    assert_eq!(parsed.text(), text);
    assert_eq!(parsed.verify(&[&key])[0].valid, Some(true));
}

#[test]
fn blank_lines_after_separator_are_content() {
    let mut rng = ChaCha8Rng::seed_from_u64(7);
    let config = Config::default();

    // message text beginning with an empty line
    let text = "\nstarts after a blank line";
    let (key, armored) = signed_fixture(&mut rng, text);

    let (parsed, _) = CleartextSignedMessage::from_string(&armored, &config).unwrap();
    assert_eq!(parsed.text(), text);
    assert_eq!(parsed.verify(&[&key])[0].valid, Some(true));
}
