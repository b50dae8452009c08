use std::iter::Peekable;
use std::vec;

use log::debug;

use crate::armor::{self, BlockType, Headers};
use crate::config::Config;
use crate::errors::{bail, Error, Result};
use crate::packet::{parse_packets, Packet};

/// The packet stream compositions are assembled from.
pub type PacketIter = Peekable<vec::IntoIter<Packet>>;

pub trait Deserializable: Sized {
    /// Turn a list of packets into one composition.
    fn from_packets(packets: &mut PacketIter) -> Result<Self>;

    /// Check if the given typ is a valid block type for this type.
    fn matches_block_type(typ: BlockType) -> bool;

    /// Does this packet begin a new composition of this type?
    /// Used to resynchronize after a broken composition.
    fn starts_item(packet: &Packet) -> bool;

    /// Parse a single composition from binary packet data.
    fn from_bytes(bytes: &[u8], config: &Config) -> Result<Self> {
        let (packets, _errors) = parse_packets(bytes, config.tolerant)?;
        let mut packets = prepare_packets(packets);

        if packets.peek().is_none() {
            return Err(Error::NoMatchingPacket);
        }

        Self::from_packets(&mut packets)
    }

    /// Parse all compositions from binary packet data.
    ///
    /// Failures of individual compositions are collected into the error
    /// list without aborting the remaining ones.
    fn from_bytes_many(bytes: &[u8], config: &Config) -> Result<(Vec<Self>, Vec<Error>)> {
        let (packets, mut errors) = parse_packets(bytes, config.tolerant)?;
        let mut packets = prepare_packets(packets);

        let mut items = Vec::new();
        while packets.peek().is_some() {
            match Self::from_packets(&mut packets) {
                Ok(item) => items.push(item),
                Err(err) => {
                    debug!("composition failed: {:?}", err);
                    errors.push(err);

                    // drop packets until the next composition boundary
                    while let Some(packet) = packets.peek() {
                        if Self::starts_item(packet) {
                            break;
                        }
                        let _ = packets.next();
                    }
                }
            }
        }

        Ok((items, errors))
    }

    /// Parse a single composition from an armored block.
    fn from_armor_single(input: &str, config: &Config) -> Result<(Self, Headers)> {
        let block = armor::parse(input, config)?;
        if !Self::matches_block_type(block.typ) {
            bail!("unexpected block type: {}", block.typ);
        }

        let item = Self::from_bytes(&block.data, config)?;
        Ok((item, block.headers))
    }

    /// Parse all compositions from an armored block, collecting per
    /// composition failures.
    #[allow(clippy::type_complexity)]
    fn from_armor_many(input: &str, config: &Config) -> Result<(Vec<Self>, Vec<Error>, Headers)> {
        let block = armor::parse(input, config)?;
        if !Self::matches_block_type(block.typ) {
            bail!("unexpected block type: {}", block.typ);
        }

        let (items, errors) = Self::from_bytes_many(&block.data, config)?;
        Ok((items, errors, block.headers))
    }
}

/// Marker packets carry no content; they never contribute to a
/// composition.
pub(crate) fn prepare_packets(packets: Vec<Packet>) -> PacketIter {
    packets
        .into_iter()
        .filter(|p| !matches!(p, Packet::Marker(_)))
        .collect::<Vec<_>>()
        .into_iter()
        .peekable()
}
