use bytes::Buf;

use crate::errors::{Error, Result};
use crate::parsing::BufParsing;
use crate::types::{PacketHeaderVersion, Tag};
use crate::util::read_packet_length;

/// The length of a packet body, as described by its header.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PacketLength {
    Fixed(usize),
    /// Old format only: the body extends to the end of the input.
    Indeterminate,
    /// New format only: the body continues in further chunks.
    Partial(usize),
}

/// A parsed packet header.
/// Ref: <https://tools.ietf.org/html/rfc4880.html#section-4.2>
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct PacketHeader {
    pub version: PacketHeaderVersion,
    pub tag: Tag,
    pub length: PacketLength,
}

impl PacketHeader {
    /// Parse a single packet header from the given buffer.
    pub fn from_buf<B: Buf>(i: &mut B) -> Result<Self> {
        let header = i.read_u8()?;

        if header & 0b1000_0000 == 0 {
            return Err(Error::MalformedPacket {
                message: format!("invalid packet header 0b{:b}", header),
            });
        }

        if header & 0b0100_0000 != 0 {
            // new format: the low six bits are the tag
            let tag = Tag::from(header & 0b0011_1111);
            let (len, partial) = read_packet_length(i)?;
            let length = if partial {
                PacketLength::Partial(len)
            } else {
                PacketLength::Fixed(len)
            };

            Ok(PacketHeader {
                version: PacketHeaderVersion::New,
                tag,
                length,
            })
        } else {
            // old format: bits 5-2 are the tag, bits 1-0 the length type
            let tag = Tag::from((header & 0b0011_1100) >> 2);
            let length = match header & 0b0000_0011 {
                0 => PacketLength::Fixed(i.read_u8()?.into()),
                1 => PacketLength::Fixed(i.read_be_u16()?.into()),
                2 => PacketLength::Fixed(i.read_be_u32()?.try_into()?),
                3 => PacketLength::Indeterminate,
                _ => unreachable!("old packet length type is only 2 bits"),
            };

            Ok(PacketHeader {
                version: PacketHeaderVersion::Old,
                tag,
                length,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_format_lengths() {
        // one octet
        let header = PacketHeader::from_buf(&mut &[0xCB, 0x10][..]).unwrap();
        assert_eq!(header.version, PacketHeaderVersion::New);
        assert_eq!(header.tag, Tag::Literal);
        assert_eq!(header.length, PacketLength::Fixed(16));

        // two octets, biased
        let header = PacketHeader::from_buf(&mut &[0xCB, 0xC5, 0xFB][..]).unwrap();
        assert_eq!(header.length, PacketLength::Fixed(1723));

        // five octets
        let header = PacketHeader::from_buf(&mut &[0xD1, 0xFF, 0x00, 0x00, 0x13, 0x6D][..])
            .unwrap();
        assert_eq!(header.tag, Tag::UserAttribute);
        assert_eq!(header.length, PacketLength::Fixed(4973));

        // partial
        let header = PacketHeader::from_buf(&mut &[0xCB, 0xE9][..]).unwrap();
        assert_eq!(header.length, PacketLength::Partial(512));
    }

    #[test]
    fn old_format_lengths() {
        // tag 6 (public key), one octet length
        let header = PacketHeader::from_buf(&mut &[0x98, 0x20][..]).unwrap();
        assert_eq!(header.version, PacketHeaderVersion::Old);
        assert_eq!(header.tag, Tag::PublicKey);
        assert_eq!(header.length, PacketLength::Fixed(32));

        // two octet length
        let header = PacketHeader::from_buf(&mut &[0x99, 0x01, 0x00][..]).unwrap();
        assert_eq!(header.length, PacketLength::Fixed(256));

        // indeterminate
        let header = PacketHeader::from_buf(&mut &[0x9B][..]).unwrap();
        assert_eq!(header.length, PacketLength::Indeterminate);
    }

    #[test]
    fn top_bit_must_be_set() {
        assert!(PacketHeader::from_buf(&mut &[0x3F, 0x01][..]).is_err());
    }
}
