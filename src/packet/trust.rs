use std::io;

use crate::errors::Result;
use crate::packet::PacketTrait;
use crate::ser::Serialize;
use crate::types::Tag;

/// Trust Packet. Implementation defined content, carried through
/// unchanged.
/// Ref: <https://tools.ietf.org/html/rfc4880.html#section-5.10>
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trust {
    pub data: Vec<u8>,
}

impl Trust {
    pub fn from_slice(input: &[u8]) -> Result<Self> {
        Ok(Trust {
            data: input.to_vec(),
        })
    }
}

impl Serialize for Trust {
    fn to_writer<W: io::Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_all(&self.data)?;
        Ok(())
    }
}

impl PacketTrait for Trust {
    fn tag(&self) -> Tag {
        Tag::Trust
    }
}
