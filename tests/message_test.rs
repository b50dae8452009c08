use pretty_assertions::assert_eq;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use pgpkit::api;
use pgpkit::composed::{Deserializable, Key, KeyParamsBuilder, KeyType, Message, SessionKey};
use pgpkit::config::Config;
use pgpkit::crypto::aead::AeadAlgorithm;
use pgpkit::crypto::sym::SymmetricKeyAlgorithm;
use pgpkit::errors::Error;
use pgpkit::types::CompressionAlgorithm;

fn generate_test_key(rng: &mut ChaCha8Rng, user_id: &str) -> Key {
    KeyParamsBuilder::default()
        .key_type(KeyType::Curve25519)
        .user_ids(vec![user_id.to_string()])
        .build()
        .unwrap()
        .generate(rng, &Config::default())
        .unwrap()
}

fn roundtrip(config: &Config, rng: &mut ChaCha8Rng, key: &Key, plaintext: &str) {
    let message = Message::new_literal("", plaintext);
    let encrypted = message
        .encrypt(rng, config, &[key], &[], None)
        .unwrap();

    // nothing readable before decryption
    assert_eq!(encrypted.get_content(config).unwrap(), None);

    let decrypted = encrypted.decrypt(config, &[key], &[]).unwrap();
    assert_eq!(
        decrypted.get_content(config).unwrap().unwrap(),
        plaintext.as_bytes()
    );
}

#[test]
fn encrypt_decrypt_with_public_key() {
    let mut rng = ChaCha8Rng::seed_from_u64(0);
    let config = Config::default();
    let key = generate_test_key(&mut rng, "A <a@example.org>");

    for plaintext in ["hello world", "", "ユニコード text ✓", "line\nbreaks\r\n"] {
        roundtrip(&config, &mut rng, &key, plaintext);
    }
}

#[test]
fn encrypt_decrypt_aead() {
    let mut rng = ChaCha8Rng::seed_from_u64(1);
    let key = generate_test_key(&mut rng, "B <b@example.org>");

    for aead_mode in [AeadAlgorithm::Eax, AeadAlgorithm::Ocb, AeadAlgorithm::Gcm] {
        let config = Config {
            aead_protect: true,
            aead_mode,
            ..Config::default()
        };

        for plaintext in ["hello aead", "", "ユニコード ✓"] {
            roundtrip(&config, &mut rng, &key, plaintext);
        }
    }
}

#[test]
fn encrypt_decrypt_with_password() {
    let mut rng = ChaCha8Rng::seed_from_u64(2);
    let config = Config::default();

    let message = Message::new_literal("notes.txt", "password protected");
    let encrypted = message
        .encrypt(&mut rng, &config, &[], &["correct horse"], None)
        .unwrap();

    let decrypted = encrypted.decrypt(&config, &[], &["correct horse"]).unwrap();
    assert_eq!(
        decrypted.get_content(&config).unwrap().unwrap(),
        b"password protected"
    );

    // a wrong password does not find a usable session key
    assert!(matches!(
        encrypted.decrypt(&config, &[], &["incorrect zebra"]),
        Err(_)
    ));
}

#[test]
fn mixed_recipients() {
    let mut rng = ChaCha8Rng::seed_from_u64(3);
    let config = Config::default();
    let key = generate_test_key(&mut rng, "C <c@example.org>");

    let message = Message::new_literal("", "for key and password");
    let encrypted = message
        .encrypt(&mut rng, &config, &[&key], &["swordfish"], None)
        .unwrap();

    assert_eq!(encrypted.recipients().len(), 1);

    let via_key = encrypted.decrypt(&config, &[&key], &[]).unwrap();
    let via_password = encrypted.decrypt(&config, &[], &["swordfish"]).unwrap();
    assert_eq!(
        via_key.get_content(&config).unwrap(),
        via_password.get_content(&config).unwrap()
    );
}

#[test]
fn no_recipients_fails() {
    let mut rng = ChaCha8Rng::seed_from_u64(4);
    let config = Config::default();

    let message = Message::new_literal("", "nobody to read this");
    assert!(matches!(
        message.encrypt(&mut rng, &config, &[], &[], None),
        Err(Error::NoRecipients)
    ));
}

#[test]
fn legacy_mode_allows_small_block_ciphers_only() {
    let mut rng = ChaCha8Rng::seed_from_u64(5);

    // CAST5 has a 64 bit block: legacy packets stay readable
    let legacy_config = Config {
        integrity_protect: false,
        encryption_cipher: SymmetricKeyAlgorithm::CAST5,
        ..Config::default()
    };
    let message = Message::new_literal("", "legacy but acceptable");
    let encrypted = message
        .encrypt(&mut rng, &legacy_config, &[], &["pw"], None)
        .unwrap();
    let decrypted = encrypted.decrypt(&legacy_config, &[], &["pw"]).unwrap();
    assert_eq!(
        decrypted.get_content(&legacy_config).unwrap().unwrap(),
        b"legacy but acceptable"
    );

    // a modern cipher without integrity protection must never decrypt
    let downgraded_config = Config {
        integrity_protect: false,
        encryption_cipher: SymmetricKeyAlgorithm::AES256,
        ..Config::default()
    };
    let encrypted = Message::new_literal("", "downgrade")
        .encrypt(&mut rng, &downgraded_config, &[], &["pw"], None)
        .unwrap();
    assert!(matches!(
        encrypted.decrypt(&downgraded_config, &[], &["pw"]),
        Err(Error::MissingMdc { .. })
    ));
}

#[test]
fn compressed_roundtrip() {
    let mut rng = ChaCha8Rng::seed_from_u64(6);
    let key = generate_test_key(&mut rng, "D <d@example.org>");

    for compression in [CompressionAlgorithm::ZLIB, CompressionAlgorithm::ZIP] {
        let config = Config {
            compression,
            ..Config::default()
        };

        let encrypted = api::encrypt(
            &mut rng,
            &config,
            api::EncryptOptions {
                data: b"compressed content, compressed content",
                public_keys: &[&key],
                armor: false,
                ..Default::default()
            },
        )
        .unwrap();

        let api::EncryptedMessage::Binary(bytes) = encrypted.message else {
            panic!("expected binary output");
        };

        let message = Message::from_bytes(&bytes, &config).unwrap();
        let result = api::decrypt(&config, &message, &[&key], &[], None, &[]).unwrap();
        assert_eq!(result.data, b"compressed content, compressed content");
    }
}

#[test]
fn signed_and_encrypted() {
    let mut rng = ChaCha8Rng::seed_from_u64(7);
    let config = Config::default();

    let signer = generate_test_key(&mut rng, "E <e@example.org>");
    let recipient = generate_test_key(&mut rng, "F <f@example.org>");
    let stranger = generate_test_key(&mut rng, "G <g@example.org>");

    let encrypted = api::encrypt(
        &mut rng,
        &config,
        api::EncryptOptions {
            data: b"signed and sealed",
            filename: "letter.txt",
            public_keys: &[&recipient],
            signing_keys: &[&signer],
            ..Default::default()
        },
    )
    .unwrap();

    let api::EncryptedMessage::Armored(armored) = encrypted.message else {
        panic!("expected armored output");
    };

    let message = api::read_armored_message(&armored, &config).unwrap();

    // with the signer's public key: valid
    let result = api::decrypt(
        &config,
        &message,
        &[&recipient],
        &[],
        None,
        &[&signer.public_key()],
    )
    .unwrap();
    assert_eq!(result.data, b"signed and sealed");
    assert_eq!(result.filename, "letter.txt");
    assert_eq!(result.signatures.len(), 1);
    assert_eq!(result.signatures[0].valid, Some(true));

    // with an unrelated key: unknown issuer
    let result = api::decrypt(&config, &message, &[&recipient], &[], None, &[&stranger]).unwrap();
    assert_eq!(result.signatures[0].valid, None);
}

#[test]
fn inline_sign_verify() {
    let mut rng = ChaCha8Rng::seed_from_u64(8);
    let config = Config::default();
    let signer = generate_test_key(&mut rng, "H <h@example.org>");

    let message = api::sign(&config, b"inline signed", "", &[&signer]).unwrap();
    let verifications = api::verify(&config, &message, &[&signer]).unwrap();
    assert_eq!(verifications.len(), 1);
    assert_eq!(verifications[0].valid, Some(true));
    assert_eq!(
        verifications[0].key_id,
        Some(pgpkit::types::KeyTrait::key_id(&signer))
    );

    // serialized roundtrip keeps the signature verifiable
    let armored = message.to_armored_string(None, &config).unwrap();
    let (parsed, _) = Message::from_armor_single(&armored, &config).unwrap();
    let verifications = api::verify(&config, &parsed, &[&signer]).unwrap();
    assert_eq!(verifications[0].valid, Some(true));
}

#[test]
fn session_key_operations() {
    let mut rng = ChaCha8Rng::seed_from_u64(9);
    let config = Config::default();
    let key = generate_test_key(&mut rng, "I <i@example.org>");

    let message = Message::new_literal("", "session key dance");
    let encrypted = message.encrypt(&mut rng, &config, &[&key], &[], None).unwrap();

    // extract the session key, then decrypt with it alone
    let session_key = api::decrypt_session_key(&config, &encrypted, &[&key], &[]).unwrap();
    assert_eq!(session_key.algorithm, config.encryption_cipher);

    let result = api::decrypt(&config, &encrypted, &[], &[], Some(&session_key), &[]).unwrap();
    assert_eq!(result.data, b"session key dance");

    // encrypt under a caller supplied session key
    let fixed = SessionKey {
        algorithm: SymmetricKeyAlgorithm::AES256,
        key: vec![7u8; 32],
    };
    let encrypted = Message::new_literal("", "fixed key")
        .encrypt(&mut rng, &config, &[&key], &[], Some(&fixed))
        .unwrap();
    let recovered = api::decrypt_session_key(&config, &encrypted, &[&key], &[]).unwrap();
    assert_eq!(recovered, fixed);
}

#[test]
fn rsa_roundtrip() {
    let mut rng = ChaCha8Rng::seed_from_u64(10);
    let config = Config::default();

    let key = KeyParamsBuilder::default()
        .key_type(KeyType::Rsa(2048))
        .user_ids(vec!["Rsa User <rsa@example.org>".to_string()])
        .build()
        .unwrap()
        .generate(&mut rng, &config)
        .unwrap();

    key.verify(&config).unwrap();

    let encrypted = api::encrypt(
        &mut rng,
        &config,
        api::EncryptOptions {
            data: b"rsa still works",
            public_keys: &[&key],
            signing_keys: &[&key],
            ..Default::default()
        },
    )
    .unwrap();

    let api::EncryptedMessage::Armored(armored) = encrypted.message else {
        panic!("expected armored output");
    };

    let message = api::read_armored_message(&armored, &config).unwrap();
    let result = api::decrypt(&config, &message, &[&key], &[], None, &[&key]).unwrap();
    assert_eq!(result.data, b"rsa still works");
    assert_eq!(result.signatures[0].valid, Some(true));
}
