//! ASCII armor: the text encoding of binary OpenPGP data.

mod reader;
mod writer;

pub use self::reader::*;
pub use self::writer::*;

use std::collections::BTreeMap;
use std::fmt;

use crate::errors::{Error, Result};

/// Armor headers, ordered by key.
pub type Headers = BTreeMap<String, String>;

/// Armor block types.
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub enum BlockType {
    Message,
    MultiPartMessage(usize, usize),
    PublicKey,
    PrivateKey,
    Signature,
    CleartextMessage,
}

impl fmt::Display for BlockType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockType::Message => write!(f, "PGP MESSAGE"),
            BlockType::MultiPartMessage(x, 0) => write!(f, "PGP MESSAGE, PART {}", x),
            BlockType::MultiPartMessage(x, y) => write!(f, "PGP MESSAGE, PART {}/{}", x, y),
            BlockType::PublicKey => write!(f, "PGP PUBLIC KEY BLOCK"),
            BlockType::PrivateKey => write!(f, "PGP PRIVATE KEY BLOCK"),
            BlockType::Signature => write!(f, "PGP SIGNATURE"),
            BlockType::CleartextMessage => write!(f, "PGP SIGNED MESSAGE"),
        }
    }
}

impl BlockType {
    /// Parse the text between `-----BEGIN ` and `-----`.
    pub fn from_marker(marker: &str) -> Result<Self> {
        match marker {
            "PGP MESSAGE" => Ok(BlockType::Message),
            "PGP PUBLIC KEY BLOCK" => Ok(BlockType::PublicKey),
            "PGP PRIVATE KEY BLOCK" => Ok(BlockType::PrivateKey),
            "PGP SIGNATURE" => Ok(BlockType::Signature),
            "PGP SIGNED MESSAGE" => Ok(BlockType::CleartextMessage),
            _ => {
                if let Some(rest) = marker.strip_prefix("PGP MESSAGE, PART ") {
                    let mut parts = rest.splitn(2, '/');
                    let x = parts
                        .next()
                        .and_then(|v| v.parse::<usize>().ok())
                        .ok_or_else(|| Error::UnknownArmorType {
                            typ: marker.to_string(),
                        })?;
                    let y = match parts.next() {
                        Some(v) => v.parse::<usize>().map_err(|_| Error::UnknownArmorType {
                            typ: marker.to_string(),
                        })?,
                        None => 0,
                    };
                    return Ok(BlockType::MultiPartMessage(x, y));
                }

                Err(Error::UnknownArmorType {
                    typ: marker.to_string(),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_type_markers() {
        assert_eq!(
            BlockType::from_marker("PGP MESSAGE").unwrap(),
            BlockType::Message
        );
        assert_eq!(
            BlockType::from_marker("PGP MESSAGE, PART 3/14").unwrap(),
            BlockType::MultiPartMessage(3, 14)
        );
        assert_eq!(
            BlockType::from_marker("PGP MESSAGE, PART 14").unwrap(),
            BlockType::MultiPartMessage(14, 0)
        );
        assert!(matches!(
            BlockType::from_marker("PGP FANCY NEW TYPE"),
            Err(Error::UnknownArmorType { .. })
        ));

        assert_eq!(BlockType::PublicKey.to_string(), "PGP PUBLIC KEY BLOCK");
        assert_eq!(
            BlockType::MultiPartMessage(3, 14).to_string(),
            "PGP MESSAGE, PART 3/14"
        );
    }
}
