use std::io::Write;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

use crate::armor::{BlockType, Headers};
use crate::config::Config;
use crate::errors::Result;
use crate::ser::Serialize;

const LINE_LENGTH: usize = 64;

/// Write `source` as an armored block.
pub fn write(
    source: &impl Serialize,
    typ: BlockType,
    writer: &mut impl Write,
    headers: Option<&Headers>,
    config: &Config,
) -> Result<()> {
    let body = source.to_bytes()?;
    write_bytes(&body, typ, writer, headers, config)
}

/// Write raw bytes as an armored block.
pub fn write_bytes(
    body: &[u8],
    typ: BlockType,
    writer: &mut impl Write,
    headers: Option<&Headers>,
    config: &Config,
) -> Result<()> {
    writer.write_all(b"-----BEGIN ")?;
    writer.write_all(typ.to_string().as_bytes())?;
    writer.write_all(b"-----\n")?;

    if config.show_version {
        writer.write_all(format!("Version: {}\n", config.version_string()).as_bytes())?;
    }
    if let Some(comment) = &config.comment {
        writer.write_all(format!("Comment: {}\n", comment).as_bytes())?;
    }
    if let Some(headers) = headers {
        for (key, value) in headers {
            writer.write_all(format!("{}: {}\n", key, value).as_bytes())?;
        }
    }
    writer.write_all(b"\n")?;

    let encoded = STANDARD.encode(body);
    for chunk in encoded.as_bytes().chunks(LINE_LENGTH) {
        writer.write_all(chunk)?;
        writer.write_all(b"\n")?;
    }

    // CRC-24 of the binary body
    let crc = crc24::hash_raw(body);
    let crc_bytes = [(crc >> 16) as u8, (crc >> 8) as u8, crc as u8];
    writer.write_all(b"=")?;
    writer.write_all(STANDARD.encode(crc_bytes).as_bytes())?;
    writer.write_all(b"\n")?;

    writer.write_all(b"-----END ")?;
    writer.write_all(typ.to_string().as_bytes())?;
    writer.write_all(b"-----\n")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::armor;
    use crate::config::Config;

    #[test]
    fn roundtrip() {
        let data: Vec<u8> = (0..255).collect();
        let config = Config::default();

        let mut out = Vec::new();
        write_bytes(&data, BlockType::Message, &mut out, None, &config).unwrap();
        let text = String::from_utf8(out).unwrap();

        let block = armor::parse(&text, &config).unwrap();
        assert_eq!(block.typ, BlockType::Message);
        assert!(block.has_checksum);
        assert_eq!(block.data, data);

        // the emitted checksum survives a checksum_required read
        let strict = Config {
            checksum_required: true,
            ..Config::default()
        };
        assert!(armor::parse(&text, &strict).is_ok());
    }

    #[test]
    fn corrupted_checksum_detected() {
        let config = Config::default();
        let mut out = Vec::new();
        write_bytes(b"hello armor", BlockType::Signature, &mut out, None, &config).unwrap();
        let text = String::from_utf8(out).unwrap();

        // flip one character of the checksum line
        let mutated = {
            let idx = text.rfind("\n=").unwrap() + 2;
            let mut chars: Vec<char> = text.chars().collect();
            chars[idx] = if chars[idx] == 'A' { 'B' } else { 'A' };
            chars.into_iter().collect::<String>()
        };

        assert!(matches!(
            armor::parse(&mutated, &config),
            Err(crate::errors::Error::InvalidChecksum)
        ));
    }

    #[test]
    fn version_and_comment_headers() {
        let config = Config {
            show_version: true,
            comment: Some("hi there".to_string()),
            ..Config::default()
        };

        let mut out = Vec::new();
        write_bytes(b"data", BlockType::Message, &mut out, None, &config).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Version: pgpkit"));
        assert!(text.contains("Comment: hi there"));

        let block = armor::parse(&text, &Config::default()).unwrap();
        assert_eq!(block.headers.get("Comment").unwrap(), "hi there");
    }
}
