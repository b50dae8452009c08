use std::io::{self, Read, Write};

use bytes::Buf;
use flate2::read::{DeflateDecoder, ZlibDecoder};
use flate2::write::{DeflateEncoder, ZlibEncoder};
use flate2::Compression;
use log::debug;

use crate::errors::{unimplemented_err, unsupported_err, Result};
use crate::packet::PacketTrait;
use crate::parsing::BufParsing;
use crate::ser::Serialize;
use crate::types::{CompressionAlgorithm, Tag};

/// Compressed Data Packet
/// Ref: <https://tools.ietf.org/html/rfc4880.html#section-5.6>
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompressedData {
    pub alg: CompressionAlgorithm,
    compressed: Vec<u8>,
}

impl CompressedData {
    /// Parses a `CompressedData` packet from the given body.
    pub fn from_slice(input: &[u8]) -> Result<Self> {
        let mut i = input;
        let alg = CompressionAlgorithm::from(i.read_u8()?);
        let compressed = i.rest();

        Ok(CompressedData { alg, compressed })
    }

    /// Compress the given data.
    pub fn compress(alg: CompressionAlgorithm, data: &[u8]) -> Result<Self> {
        debug!("compressing {} bytes with {:?}", data.len(), alg);

        let compressed = match alg {
            CompressionAlgorithm::Uncompressed => data.to_vec(),
            CompressionAlgorithm::ZIP => {
                let mut enc = DeflateEncoder::new(Vec::new(), Compression::default());
                enc.write_all(data)?;
                enc.finish()?
            }
            CompressionAlgorithm::ZLIB => {
                let mut enc = ZlibEncoder::new(Vec::new(), Compression::default());
                enc.write_all(data)?;
                enc.finish()?
            }
            CompressionAlgorithm::BZip2 => {
                let mut enc =
                    bzip2::write::BzEncoder::new(Vec::new(), bzip2::Compression::default());
                enc.write_all(data)?;
                enc.finish()?
            }
            CompressionAlgorithm::Other(v) => {
                unsupported_err!("compression algorithm {}", v)
            }
        };

        Ok(CompressedData { alg, compressed })
    }

    /// Decompress the contained data.
    pub fn decompress(&self) -> Result<Vec<u8>> {
        debug!("decompressing with {:?}", self.alg);

        match self.alg {
            CompressionAlgorithm::Uncompressed => Ok(self.compressed.clone()),
            CompressionAlgorithm::ZIP => {
                let mut out = Vec::new();
                DeflateDecoder::new(&self.compressed[..]).read_to_end(&mut out)?;
                Ok(out)
            }
            CompressionAlgorithm::ZLIB => {
                let mut out = Vec::new();
                ZlibDecoder::new(&self.compressed[..]).read_to_end(&mut out)?;
                Ok(out)
            }
            CompressionAlgorithm::BZip2 => {
                let mut out = Vec::new();
                bzip2::read::BzDecoder::new(&self.compressed[..]).read_to_end(&mut out)?;
                Ok(out)
            }
            CompressionAlgorithm::Other(v) => {
                unimplemented_err!("compression algorithm {}", v)
            }
        }
    }
}

impl Serialize for CompressedData {
    fn to_writer<W: io::Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_all(&[self.alg.into()])?;
        writer.write_all(&self.compressed)?;

        Ok(())
    }
}

impl PacketTrait for CompressedData {
    fn tag(&self) -> Tag {
        Tag::CompressedData
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compress_roundtrip() {
        let data = b"some highly compressible data data data data data data";

        for alg in [
            CompressionAlgorithm::Uncompressed,
            CompressionAlgorithm::ZIP,
            CompressionAlgorithm::ZLIB,
            CompressionAlgorithm::BZip2,
        ] {
            let packet = CompressedData::compress(alg, data).unwrap();
            assert_eq!(packet.decompress().unwrap(), data, "{:?}", alg);

            let bytes = packet.to_bytes().unwrap();
            let back = CompressedData::from_slice(&bytes).unwrap();
            assert_eq!(packet, back);
        }
    }
}
