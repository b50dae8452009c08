use std::fmt;
use std::io;

use byteorder::{BigEndian, WriteBytesExt};
use bytes::Buf;
use num_bigint::BigUint;

use crate::errors::{Error, Result};
use crate::parsing::BufParsing;
use crate::ser::Serialize;

/// Number of bits we accept when reading or writing MPIs.
/// The value is the same as gnupgs.
const MAX_EXTERN_MPI_BITS: u16 = 16384;

/// Represents an owned MPI value.
/// The inner value is stored in minimal form, without leading zero bytes.
///
/// Ref: <https://tools.ietf.org/html/rfc4880.html#section-3.2>
#[derive(Default, Clone, PartialEq, Eq, Hash)]
pub struct Mpi(Vec<u8>);

impl Mpi {
    /// Parses a length-prefixed MPI from the given buffer.
    ///
    /// Leading zero octets are forbidden by the format, but tolerated here
    /// since non-conformant producers emit them.
    pub fn from_buf<B: Buf>(i: &mut B) -> Result<Self> {
        let len_bits = i.read_be_u16()?;

        if len_bits > MAX_EXTERN_MPI_BITS {
            return Err(Error::MalformedPacket {
                message: format!("mpi too large: {} bits", len_bits),
            });
        }

        let len_bytes = (len_bits as usize + 7) >> 3;
        let n = i.take_bytes(len_bytes)?;

        Ok(Mpi(strip_leading_zeros(&n).to_vec()))
    }

    /// Wraps `raw` as an Mpi, stripping leading zeros.
    /// `raw` is not expected to be length-prefixed.
    pub fn from_slice(raw: &[u8]) -> Self {
        Mpi(strip_leading_zeros(raw).to_vec())
    }

    /// Wraps an already minimal encoding without copying checks.
    pub fn from_raw(raw: Vec<u8>) -> Self {
        debug_assert!(raw.first() != Some(&0));
        Mpi(raw)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// The value, left padded with zeros to `size` bytes.
    pub fn to_padded(&self, size: usize) -> Vec<u8> {
        let mut out = vec![0u8; size.saturating_sub(self.0.len())];
        out.extend_from_slice(&self.0);
        out
    }
}

/// Returns the bit length of a given slice, ignoring leading zeros.
#[inline]
fn bit_size(val: &[u8]) -> usize {
    if val.is_empty() {
        0
    } else {
        (val.len() * 8) - val[0].leading_zeros() as usize
    }
}

#[inline]
pub(crate) fn strip_leading_zeros(bytes: &[u8]) -> &[u8] {
    bytes
        .iter()
        .position(|b| b != &0)
        .map_or(&[][..], |offset| &bytes[offset..])
}

impl AsRef<[u8]> for Mpi {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl zeroize::Zeroize for Mpi {
    fn zeroize(&mut self) {
        zeroize::Zeroize::zeroize(&mut self.0);
    }
}

impl fmt::Debug for Mpi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Mpi({})", hex::encode(&self.0))
    }
}

impl Serialize for Mpi {
    fn to_writer<W: io::Write>(&self, w: &mut W) -> Result<()> {
        let size = bit_size(&self.0);
        w.write_u16::<BigEndian>(size as u16)?;
        w.write_all(&self.0)?;

        Ok(())
    }
}

impl From<BigUint> for Mpi {
    fn from(other: BigUint) -> Self {
        Mpi(other.to_bytes_be())
    }
}

impl From<&BigUint> for Mpi {
    fn from(other: &BigUint) -> Self {
        Mpi(other.to_bytes_be())
    }
}

impl From<Mpi> for BigUint {
    fn from(other: Mpi) -> Self {
        BigUint::from_bytes_be(other.as_bytes())
    }
}

impl From<&Mpi> for BigUint {
    fn from(other: &Mpi) -> Self {
        BigUint::from_bytes_be(other.as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mpi() {
        // Decode the number `511` (`0x1FF` in hex).
        assert_eq!(
            Mpi::from_buf(&mut &[0x00, 0x09, 0x01, 0xFF][..]).unwrap(),
            Mpi::from_slice(&[0x01, 0xFF][..])
        );

        // Tolerate a zero-padded encoding of the same number.
        assert_eq!(
            Mpi::from_buf(&mut &[0x00, 0x10, 0x00, 0x01, 0xFF][..]).unwrap(),
            Mpi::from_slice(&[0x01, 0xFF][..])
        );
    }

    #[test]
    fn test_mpi_roundtrip() {
        for val in [
            vec![0x01u8],
            vec![0x01, 0xFF],
            vec![0x7F; 200],
            vec![0x80, 0, 0, 0, 0, 0x07],
        ] {
            let mpi = Mpi::from_slice(&val);
            let encoded = mpi.to_bytes().unwrap();
            let back = Mpi::from_buf(&mut &encoded[..]).unwrap();
            assert_eq!(mpi, back);
        }
    }

    #[test]
    fn test_mpi_truncated() {
        // declares 16 bits but carries a single byte
        assert!(Mpi::from_buf(&mut &[0x00, 0x10, 0x01][..]).is_err());
    }

    #[test]
    fn test_strip_leading_zeros_with_all_zeros() {
        let buf = [0u8, 0u8, 0u8];
        let stripped: &[u8] = strip_leading_zeros(&buf[..]);
        assert!(stripped.is_empty());
    }

    #[test]
    fn test_padded() {
        let mpi = Mpi::from_slice(&[0x01, 0xFF]);
        assert_eq!(mpi.to_padded(4), vec![0, 0, 0x01, 0xFF]);
        assert_eq!(mpi.to_padded(1), vec![0x01, 0xFF]);
    }
}
