use std::io;

use byteorder::{BigEndian, WriteBytesExt};
use bytes::Buf;

use crate::errors::Result;
use crate::parsing::BufParsing;

/// Write a new-format packet length.
/// Ref: <https://tools.ietf.org/html/rfc4880.html#section-4.2.2>
pub fn write_packet_length(len: usize, writer: &mut impl io::Write) -> Result<()> {
    if len < 192 {
        writer.write_u8(len as u8)?;
    } else if len < 8384 {
        writer.write_u8((((len - 192) >> 8) + 192) as u8)?;
        writer.write_u8(((len - 192) & 0xFF) as u8)?;
    } else {
        writer.write_u8(255)?;
        writer.write_u32::<BigEndian>(len as u32)?;
    }

    Ok(())
}

/// Read a new-format packet length. Returns `(length, is_partial)`;
/// a partial length is the chunk size of a partial body.
pub fn read_packet_length<B: Buf>(i: &mut B) -> Result<(usize, bool)> {
    let olen = i.read_u8()?;
    match olen {
        // One-Octet Lengths
        0..=191 => Ok((olen as usize, false)),
        // Two-Octet Lengths
        192..=223 => {
            let a = i.read_u8()?;
            Ok((((olen as usize - 192) << 8) + 192 + a as usize, false))
        }
        // Partial Body Lengths
        224..=254 => Ok((1 << (olen as usize & 0x1F), true)),
        // Five-Octet Lengths
        255 => {
            let len = i.read_be_u32()?;
            Ok((len as usize, false))
        }
    }
}

/// Read a subpacket length. Unlike packet lengths, the 224..=254 octet
/// range is part of the two octet form here; there are no partial
/// lengths.
/// Ref: <https://tools.ietf.org/html/rfc4880.html#section-5.2.3.1>
pub fn read_subpacket_length<B: Buf>(i: &mut B) -> Result<usize> {
    let olen = i.read_u8()?;
    match olen {
        0..=191 => Ok(olen as usize),
        192..=254 => {
            let a = i.read_u8()?;
            Ok(((olen as usize - 192) << 8) + 192 + a as usize)
        }
        255 => Ok(i.read_be_u32()? as usize),
    }
}

/// Write a subpacket length.
pub fn write_subpacket_length(len: usize, writer: &mut impl io::Write) -> Result<()> {
    if len < 192 {
        writer.write_u8(len as u8)?;
    } else if len < 16320 {
        writer.write_u8((((len - 192) >> 8) + 192) as u8)?;
        writer.write_u8(((len - 192) & 0xFF) as u8)?;
    } else {
        writer.write_u8(255)?;
        writer.write_u32::<BigEndian>(len as u32)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subpacket_length_roundtrip() {
        for len in [0usize, 1, 191, 192, 8383, 8384, 16319, 16320, 100_000] {
            let mut buf = Vec::new();
            write_subpacket_length(len, &mut buf).unwrap();
            let back = read_subpacket_length(&mut &buf[..]).unwrap();
            assert_eq!(back, len);
        }
    }

    #[test]
    fn packet_length_roundtrip() {
        for len in [0usize, 1, 190, 191, 192, 193, 8383, 8384, 100_000, 1 << 24] {
            let mut buf = Vec::new();
            write_packet_length(len, &mut buf).unwrap();
            let (back, partial) = read_packet_length(&mut &buf[..]).unwrap();
            assert_eq!(back, len);
            assert!(!partial);
        }
    }

    #[test]
    fn partial_length_decoding() {
        // 224 => 1 << 0, 254 => 1 << 30
        let (len, partial) = read_packet_length(&mut &[224u8][..]).unwrap();
        assert_eq!(len, 1);
        assert!(partial);

        let (len, partial) = read_packet_length(&mut &[0xE9u8][..]).unwrap();
        assert_eq!(len, 512);
        assert!(partial);
    }
}
