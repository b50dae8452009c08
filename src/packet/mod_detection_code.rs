use std::io;

use crate::errors::{ensure_eq, Result};
use crate::packet::PacketTrait;
use crate::ser::Serialize;
use crate::types::Tag;

/// Modification Detection Code Packet. Normally consumed while
/// decrypting an integrity protected data packet; only seen standalone
/// in already decrypted streams.
/// Ref: <https://tools.ietf.org/html/rfc4880.html#section-5.14>
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModDetectionCode {
    pub hash: [u8; 20],
}

impl ModDetectionCode {
    pub fn from_slice(input: &[u8]) -> Result<Self> {
        ensure_eq!(input.len(), 20, "invalid mdc length");
        let mut hash = [0u8; 20];
        hash.copy_from_slice(input);

        Ok(ModDetectionCode { hash })
    }
}

impl Serialize for ModDetectionCode {
    fn to_writer<W: io::Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_all(&self.hash)?;
        Ok(())
    }
}

impl PacketTrait for ModDetectionCode {
    fn tag(&self) -> Tag {
        Tag::ModDetectionCode
    }
}
