use std::fmt;
use std::io;

use crate::errors::Result;
use crate::packet::PacketTrait;
use crate::ser::Serialize;
use crate::types::Tag;

/// User ID Packet, conventionally `Name <email>`.
/// Ref: <https://tools.ietf.org/html/rfc4880.html#section-5.11>
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UserId {
    id: String,
}

impl UserId {
    pub fn from_str(id: impl Into<String>) -> Self {
        UserId { id: id.into() }
    }

    pub fn from_slice(input: &[u8]) -> Result<Self> {
        Ok(UserId {
            id: String::from_utf8_lossy(input).to_string(),
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id)
    }
}

impl Serialize for UserId {
    fn to_writer<W: io::Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_all(self.id.as_bytes())?;
        Ok(())
    }
}

impl PacketTrait for UserId {
    fn tag(&self) -> Tag {
        Tag::UserId
    }
}
