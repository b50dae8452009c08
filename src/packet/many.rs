use bytes::Buf;
use log::{debug, warn};

use crate::errors::{Error, Result};
use crate::packet::{Packet, PacketHeader, PacketLength};
use crate::parsing::BufParsing;
use crate::util::read_packet_length;

/// Parse packets out of an in-memory byte stream.
///
/// Body level problems surface as `Err` items while the iterator keeps
/// going; framing level problems end the iteration after yielding the
/// error.
pub struct PacketParser<'a> {
    input: &'a [u8],
    done: bool,
}

impl<'a> PacketParser<'a> {
    pub fn new(input: &'a [u8]) -> Self {
        PacketParser { input, done: false }
    }

    fn next_packet(&mut self) -> Result<Packet> {
        let header = PacketHeader::from_buf(&mut self.input)?;
        debug!("found header: {:?}", header);

        let body = match header.length {
            PacketLength::Fixed(len) => self.input.take_bytes(len)?,
            PacketLength::Indeterminate => self.input.rest(),
            PacketLength::Partial(len) => {
                // collect chunks until a non partial length shows up
                let mut body = self.input.take_bytes(len)?;
                loop {
                    let (len, partial) = read_packet_length(&mut self.input)?;
                    body.extend_from_slice(&self.input.take_bytes(len)?);
                    if !partial {
                        break;
                    }
                }
                body
            }
        };

        Packet::from_parts(header.tag, &body)
    }
}

impl Iterator for PacketParser<'_> {
    type Item = Result<Packet>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done || !self.input.has_remaining() {
            return None;
        }

        match self.next_packet() {
            Ok(packet) => Some(Ok(packet)),
            Err(err @ Error::InvalidPacketContent { .. })
            | Err(err @ Error::Unsupported { .. }) => {
                // the framing was intact, continue with the next packet
                Some(Err(err))
            }
            Err(err) => {
                // framing is gone, nothing left to recover
                self.done = true;
                Some(Err(err))
            }
        }
    }
}

/// Parse all packets, handling per packet failures according to
/// `tolerant`: in tolerant mode unparseable packets are dropped and
/// collected into the error list, in strict mode the first failure
/// aborts.
pub fn parse_packets(input: &[u8], tolerant: bool) -> Result<(Vec<Packet>, Vec<Error>)> {
    let mut packets = Vec::new();
    let mut errors = Vec::new();

    for result in PacketParser::new(input) {
        match result {
            Ok(packet) => packets.push(packet),
            Err(err) => {
                if tolerant && !is_fatal(&err) {
                    warn!("skipping unparseable packet: {:?}", err);
                    errors.push(err);
                } else {
                    return Err(err);
                }
            }
        }
    }

    Ok((packets, errors))
}

fn is_fatal(err: &Error) -> bool {
    !matches!(
        err,
        Error::InvalidPacketContent { .. } | Error::Unsupported { .. }
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packet::{write_packet, LiteralData};

    #[test]
    fn parse_sequence() {
        let mut buf = Vec::new();
        write_packet(&mut buf, &LiteralData::from_str("a.txt", "first")).unwrap();
        write_packet(&mut buf, &LiteralData::from_str("b.txt", "second")).unwrap();

        let (packets, errors) = parse_packets(&buf, true).unwrap();
        assert!(errors.is_empty());
        assert_eq!(packets.len(), 2);
        match &packets[1] {
            Packet::LiteralData(l) => assert_eq!(l.data(), b"second"),
            p => panic!("unexpected packet {:?}", p),
        }
    }

    #[test]
    fn parse_partial_lengths() {
        // literal packet body: mode, name_len, created, 2 bytes of data
        let mut body = vec![b'b', 0];
        body.extend_from_slice(&[0, 0, 0, 0]);
        body.extend_from_slice(b"hi");

        // first chunk of 4 bytes (0xE2 => 1 << 2), then a fixed rest
        let mut buf = vec![0xCB, 0xE2];
        buf.extend_from_slice(&body[..4]);
        buf.push((body.len() - 4) as u8);
        buf.extend_from_slice(&body[4..]);

        let (packets, _) = parse_packets(&buf, true).unwrap();
        assert_eq!(packets.len(), 1);
        match &packets[0] {
            Packet::LiteralData(l) => assert_eq!(l.data(), b"hi"),
            p => panic!("unexpected packet {:?}", p),
        }
    }

    #[test]
    fn tolerant_vs_strict() {
        let mut buf = Vec::new();
        write_packet(&mut buf, &LiteralData::from_str("a.txt", "ok")).unwrap();

        // a packet with an unknown tag (0xEF & 0x3F == 47)
        buf.push(0xEF);
        buf.push(0x01);
        buf.push(0xAA);

        write_packet(&mut buf, &LiteralData::from_str("b.txt", "ok too")).unwrap();

        let (packets, errors) = parse_packets(&buf, true).unwrap();
        assert_eq!(packets.len(), 2);
        assert_eq!(errors.len(), 1);

        assert!(parse_packets(&buf, false).is_err());
    }

    #[test]
    fn truncated_packet_is_fatal() {
        let mut buf = Vec::new();
        write_packet(&mut buf, &LiteralData::from_str("a.txt", "ok")).unwrap();
        // a literal packet header claiming 100 bytes with nothing behind it
        buf.push(0xCB);
        buf.push(100);

        assert!(parse_packets(&buf, true).is_err());
    }
}
