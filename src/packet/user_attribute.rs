use std::fmt;
use std::io;

use bytes::Buf;

use crate::errors::Result;
use crate::packet::PacketTrait;
use crate::parsing::BufParsing;
use crate::ser::Serialize;
use crate::types::Tag;
use crate::util::{read_subpacket_length, write_subpacket_length};

/// User Attribute Packet: a list of attribute subpackets, in practice a
/// single image.
/// Ref: <https://tools.ietf.org/html/rfc4880.html#section-5.12>
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UserAttribute {
    pub subpackets: Vec<UserAttributeSubpacket>,
}

/// A single user attribute subpacket. The image variant keeps the full
/// body (image header included) so the packet reserializes exactly.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum UserAttributeSubpacket {
    Image { data: Vec<u8> },
    Unknown { typ: u8, data: Vec<u8> },
}

impl UserAttribute {
    pub fn from_slice(input: &[u8]) -> Result<Self> {
        let mut i = input;
        let mut subpackets = Vec::new();

        while i.has_remaining() {
            let len = read_subpacket_length(&mut i)?;
            crate::errors::ensure!(len > 0, "empty user attribute subpacket");
            let mut body = i.take_bytes(len)?;
            let typ = body.remove(0);

            subpackets.push(match typ {
                1 => UserAttributeSubpacket::Image { data: body },
                _ => UserAttributeSubpacket::Unknown { typ, data: body },
            });
        }

        Ok(UserAttribute { subpackets })
    }
}

impl fmt::Display for UserAttribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for sub in &self.subpackets {
            match sub {
                UserAttributeSubpacket::Image { data } => {
                    write!(f, "[image of {} bytes]", data.len())?
                }
                UserAttributeSubpacket::Unknown { typ, data } => {
                    write!(f, "[attribute {} of {} bytes]", typ, data.len())?
                }
            }
        }
        Ok(())
    }
}

impl Serialize for UserAttribute {
    fn to_writer<W: io::Write>(&self, writer: &mut W) -> Result<()> {
        for sub in &self.subpackets {
            let (typ, data) = match sub {
                UserAttributeSubpacket::Image { data } => (1, data),
                UserAttributeSubpacket::Unknown { typ, data } => (*typ, data),
            };
            write_subpacket_length(data.len() + 1, writer)?;
            writer.write_all(&[typ])?;
            writer.write_all(data)?;
        }

        Ok(())
    }
}

impl PacketTrait for UserAttribute {
    fn tag(&self) -> Tag {
        Tag::UserAttribute
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip() {
        let attr = UserAttribute {
            subpackets: vec![
                UserAttributeSubpacket::Image {
                    data: vec![0x10, 0x00, 0x01, 0x01, 0xAA, 0xBB],
                },
                UserAttributeSubpacket::Unknown {
                    typ: 100,
                    data: vec![1, 2, 3],
                },
            ],
        };

        let bytes = attr.to_bytes().unwrap();
        let back = UserAttribute::from_slice(&bytes).unwrap();
        assert_eq!(attr, back);
    }
}
