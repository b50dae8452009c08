use std::io;

use byteorder::{BigEndian, WriteBytesExt};
use bytes::Buf;
use chrono::{DateTime, SubsecRound, TimeZone, Utc};

use crate::errors::Result;
use crate::packet::PacketTrait;
use crate::parsing::BufParsing;
use crate::ser::Serialize;
use crate::types::Tag;

/// Literal Data Packet
/// Ref: <https://tools.ietf.org/html/rfc4880.html#section-5.9>
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiteralData {
    pub mode: DataMode,
    pub file_name: String,
    pub created: DateTime<Utc>,
    data: Vec<u8>,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[repr(u8)]
pub enum DataMode {
    Binary = b'b',
    Text = b't',
    Utf8 = b'u',
    Mime = b'm',
}

impl DataMode {
    fn from_u8(mode: u8) -> Result<Self> {
        match mode {
            b'b' => Ok(DataMode::Binary),
            b't' => Ok(DataMode::Text),
            b'u' => Ok(DataMode::Utf8),
            b'm' => Ok(DataMode::Mime),
            _ => Err(crate::errors::Error::MalformedPacket {
                message: format!("invalid literal data mode {}", mode),
            }),
        }
    }
}

impl LiteralData {
    /// Creates a literal data packet from the given bytes.
    pub fn from_bytes(file_name: impl Into<String>, data: &[u8]) -> Self {
        LiteralData {
            mode: DataMode::Binary,
            file_name: file_name.into(),
            created: Utc::now().trunc_subsecs(0),
            data: data.to_vec(),
        }
    }

    /// Creates a literal data packet from the given string, setting the
    /// utf8 mode.
    pub fn from_str(file_name: impl Into<String>, text: &str) -> Self {
        LiteralData {
            mode: DataMode::Utf8,
            file_name: file_name.into(),
            created: Utc::now().trunc_subsecs(0),
            data: text.as_bytes().to_vec(),
        }
    }

    /// Parses a `LiteralData` packet from the given body.
    pub fn from_slice(input: &[u8]) -> Result<Self> {
        let mut i = input;
        let mode = DataMode::from_u8(i.read_u8()?)?;
        let name_len = i.read_u8()?;
        let name = i.take_bytes(name_len as usize)?;
        let created = i.read_be_u32()?;
        let data = i.rest();

        Ok(LiteralData {
            mode,
            file_name: String::from_utf8_lossy(&name).to_string(),
            created: Utc
                .timestamp_opt(i64::from(created), 0)
                .single()
                .unwrap_or_default(),
            data,
        })
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn into_data(self) -> Vec<u8> {
        self.data
    }
}

impl Serialize for LiteralData {
    fn to_writer<W: io::Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_all(&[self.mode as u8, self.file_name.len() as u8])?;
        writer.write_all(self.file_name.as_bytes())?;
        writer.write_u32::<BigEndian>(self.created.timestamp() as u32)?;
        writer.write_all(&self.data)?;

        Ok(())
    }
}

impl PacketTrait for LiteralData {
    fn tag(&self) -> Tag {
        Tag::Literal
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip() {
        let literal = LiteralData::from_str("hello.txt", "hello world\n");
        let bytes = literal.to_bytes().unwrap();
        let back = LiteralData::from_slice(&bytes).unwrap();
        assert_eq!(literal, back);
    }

    #[test]
    fn empty_data_roundtrip() {
        let literal = LiteralData::from_bytes("", b"");
        let bytes = literal.to_bytes().unwrap();
        let back = LiteralData::from_slice(&bytes).unwrap();
        assert_eq!(literal, back);
    }
}
