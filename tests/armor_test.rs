use pgpkit::armor::{self, BlockType};
use pgpkit::config::Config;
use pgpkit::errors::Error;

fn armored_fixture() -> String {
    let data: Vec<u8> = (0u8..200).collect();
    let mut out = Vec::new();
    armor::write_bytes(
        &data,
        BlockType::PrivateKey,
        &mut out,
        None,
        &Config::default(),
    )
    .unwrap();
    String::from_utf8(out).unwrap()
}

#[test]
fn roundtrip_with_checksum() {
    let text = armored_fixture();

    for checksum_required in [false, true] {
        let config = Config {
            checksum_required,
            ..Config::default()
        };

        let block = armor::parse(&text, &config).unwrap();
        assert_eq!(block.typ, BlockType::PrivateKey);
        assert!(block.has_checksum);
        assert_eq!(block.data, (0u8..200).collect::<Vec<u8>>());
    }
}

#[test]
fn mutated_checksum_fails_under_both_settings() {
    let text = armored_fixture();

    // find the checksum line and flip its last character
    let idx = text.rfind("\n=").unwrap();
    let mut chars: Vec<char> = text.chars().collect();
    let check_end = idx + 5;
    chars[check_end] = if chars[check_end] == 'A' { 'B' } else { 'A' };
    let mutated: String = chars.into_iter().collect();

    for checksum_required in [false, true] {
        let config = Config {
            checksum_required,
            ..Config::default()
        };
        assert!(matches!(
            armor::parse(&mutated, &config),
            Err(Error::InvalidChecksum)
        ));
    }
}

#[test]
fn missing_checksum_only_accepted_when_not_required() {
    let text = armored_fixture();

    // drop the checksum line entirely
    let without: String = text
        .lines()
        .filter(|line| !line.starts_with('='))
        .collect::<Vec<_>>()
        .join("\n");

    let lenient = Config::default();
    assert!(armor::parse(&without, &lenient).is_ok());

    let strict = Config {
        checksum_required: true,
        ..Config::default()
    };
    assert!(matches!(
        armor::parse(&without, &strict),
        Err(Error::InvalidChecksum)
    ));
}

#[test]
fn mismatched_begin_end_pair() {
    let text = armored_fixture().replace("-----END PGP PRIVATE KEY BLOCK-----", "-----END PGP MESSAGE-----");
    assert!(matches!(
        armor::parse(&text, &Config::default()),
        Err(Error::InvalidArmorWrappers)
    ));
}

#[test]
fn unknown_armor_type() {
    let input = "-----BEGIN PGP TREASURE-----\n\nAAAA\n-----END PGP TREASURE-----\n";
    assert!(matches!(
        armor::parse(input, &Config::default()),
        Err(Error::UnknownArmorType { .. })
    ));
}

#[test]
fn bad_header_syntax() {
    let data = b"1234";
    let mut out = Vec::new();
    armor::write_bytes(data, BlockType::Message, &mut out, None, &Config::default()).unwrap();
    let text = String::from_utf8(out).unwrap();

    // inject a malformed header line after the BEGIN line
    let bad = text.replace(
        "-----BEGIN PGP MESSAGE-----\n",
        "-----BEGIN PGP MESSAGE-----\nBroken Header\n",
    );

    assert!(matches!(
        armor::parse(&bad, &Config::default()),
        Err(Error::InvalidArmorHeader { .. })
    ));
}

#[test]
fn tolerates_leading_text_and_marker_whitespace() {
    let text = armored_fixture();
    let wrapped = format!("Some covering letter.\n\n  {}", text);
    assert!(armor::parse(&wrapped, &Config::default()).is_ok());
}
