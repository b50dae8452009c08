use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use log::debug;

use crate::armor::{BlockType, Headers};
use crate::config::Config;
use crate::errors::{bail, Error, Result};

/// A single dearmored block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub typ: BlockType,
    pub headers: Headers,
    pub data: Vec<u8>,
    pub has_checksum: bool,
}

/// Validate and split a `Key: Value` armor header line.
///
/// The key must not be preceded by whitespace, must not contain
/// whitespace or colons itself, and the colon must be followed by a
/// space and a value.
pub fn parse_header_line(line: &str) -> Result<(String, String)> {
    let invalid = || Error::InvalidArmorHeader {
        line: line.to_string(),
    };

    if line.starts_with(char::is_whitespace) {
        return Err(invalid());
    }

    let colon = line.find(':').ok_or_else(invalid)?;
    let key = &line[..colon];
    if key.is_empty() || key.chars().any(char::is_whitespace) {
        return Err(invalid());
    }

    let value = line[colon + 1..].strip_prefix(' ').ok_or_else(invalid)?;
    if value.trim().is_empty() {
        return Err(invalid());
    }

    Ok((key.to_string(), value.trim_end().to_string()))
}

fn begin_marker(line: &str) -> Option<Result<BlockType>> {
    let trimmed = line.trim();
    let rest = trimmed.strip_prefix("-----BEGIN ")?;
    let marker = rest.strip_suffix("-----")?;
    Some(BlockType::from_marker(marker))
}

fn end_marker(line: &str) -> Option<Result<BlockType>> {
    let trimmed = line.trim();
    let rest = trimmed.strip_prefix("-----END ")?;
    let marker = rest.strip_suffix("-----")?;
    Some(BlockType::from_marker(marker))
}

/// Decode the `=XXXX` checksum line into the 24 bit CRC value.
fn read_checksum(encoded: &str) -> Result<u32> {
    let raw = STANDARD.decode(encoded)?;
    if raw.len() != 3 {
        return Err(Error::InvalidChecksum);
    }

    Ok(u32::from_be_bytes([0, raw[0], raw[1], raw[2]]))
}

/// Parse a single armored block.
pub fn parse(input: &str, config: &Config) -> Result<Block> {
    let mut lines = input.lines();

    // find the BEGIN line, everything before it is free text
    let typ = loop {
        let line = lines
            .next()
            .ok_or_else(|| crate::errors::format_err!("no armor found"))?;
        if let Some(typ) = begin_marker(line) {
            break typ?;
        }
    };

    if typ == BlockType::CleartextMessage {
        bail!("cleartext signed messages must be read as CleartextSignedMessage");
    }

    // headers, terminated by an empty line
    let mut headers = Headers::new();
    let mut line = loop {
        let line = lines
            .next()
            .ok_or_else(|| crate::errors::format_err!("truncated armor block"))?;
        if line.trim().is_empty() {
            break lines
                .next()
                .ok_or_else(|| crate::errors::format_err!("truncated armor block"))?;
        }

        let (key, value) = parse_header_line(line)?;
        headers.insert(key, value);
    };

    // base64 body, optional checksum line, footer
    let mut body = String::new();
    let mut checksum = None;
    let footer = loop {
        let trimmed = line.trim();

        if let Some(footer) = end_marker(trimmed) {
            break footer?;
        } else if let Some(check) = trimmed.strip_prefix('=') {
            if checksum.is_some() {
                return Err(Error::InvalidChecksum);
            }
            checksum = Some(read_checksum(check)?);
        } else if !trimmed.is_empty() {
            body.push_str(trimmed);
        }

        line = lines
            .next()
            .ok_or(Error::InvalidArmorWrappers)?;
    };

    if footer != typ {
        return Err(Error::InvalidArmorWrappers);
    }

    let data = STANDARD.decode(&body)?;

    match checksum {
        Some(expected) => {
            let actual = crc24::hash_raw(&data);
            if actual != expected {
                debug!("crc24 mismatch: {:x} != {:x}", actual, expected);
                return Err(Error::InvalidChecksum);
            }
        }
        None => {
            if config.checksum_required {
                return Err(Error::InvalidChecksum);
            }
        }
    }

    Ok(Block {
        typ,
        headers,
        data,
        has_checksum: checksum.is_some(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SMALL: &str = "-----BEGIN PGP PUBLIC KEY BLOCK-----\n\
Version: GnuPG v1\n\
\n\
mQGiBEig\n\
-----END PGP PUBLIC KEY BLOCK-----\n";

    #[test]
    fn parse_small() {
        let block = parse(SMALL, &Config::default()).unwrap();
        assert_eq!(block.typ, BlockType::PublicKey);
        assert_eq!(block.headers.get("Version").unwrap(), "GnuPG v1");
        assert!(!block.has_checksum);
        assert_eq!(block.data.len(), 6);
    }

    #[test]
    fn missing_checksum_required() {
        let config = Config {
            checksum_required: true,
            ..Config::default()
        };
        assert!(matches!(
            parse(SMALL, &config),
            Err(Error::InvalidChecksum)
        ));
    }

    #[test]
    fn mismatched_wrappers() {
        let input = "-----BEGIN PGP MESSAGE-----\n\nmQGiBEig\n-----END PGP SIGNATURE-----\n";
        assert!(matches!(
            parse(input, &Config::default()),
            Err(Error::InvalidArmorWrappers)
        ));
    }

    #[test]
    fn unknown_type() {
        let input = "-----BEGIN PGP HUG-----\n\nmQGiBEig\n-----END PGP HUG-----\n";
        assert!(matches!(
            parse(input, &Config::default()),
            Err(Error::UnknownArmorType { .. })
        ));
    }

    #[test]
    fn header_syntax() {
        assert!(parse_header_line("Version: GnuPG v1").is_ok());
        assert!(parse_header_line("special-stuff: cool12.0").is_ok());
        // leading whitespace
        assert!(parse_header_line(" Version: 1").is_err());
        // space before the colon
        assert!(parse_header_line("Version : 1").is_err());
        // missing colon
        assert!(parse_header_line("Version 1").is_err());
        // missing space after the colon
        assert!(parse_header_line("Version:1").is_err());
        // empty value
        assert!(parse_header_line("Version: ").is_err());
    }
}
