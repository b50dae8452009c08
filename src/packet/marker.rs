use std::io;

use log::warn;

use crate::errors::Result;
use crate::packet::PacketTrait;
use crate::ser::Serialize;
use crate::types::Tag;

/// Marker Packet, must be ignored.
/// Ref: <https://tools.ietf.org/html/rfc4880.html#section-5.8>
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Marker {}

impl Marker {
    pub fn from_slice(input: &[u8]) -> Result<Self> {
        if input != b"PGP" {
            warn!("non standard marker content: {}", hex::encode(input));
        }

        Ok(Marker {})
    }
}

impl Serialize for Marker {
    fn to_writer<W: io::Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_all(b"PGP")?;
        Ok(())
    }
}

impl PacketTrait for Marker {
    fn tag(&self) -> Tag {
        Tag::Marker
    }
}
