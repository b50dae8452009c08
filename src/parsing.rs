//! Parsing helpers to read binary packet data from a [`Buf`].

use bytes::Buf;

use crate::errors::{Error, Result};

pub trait BufParsing: Buf + Sized {
    fn read_u8(&mut self) -> Result<u8> {
        self.ensure_remaining(1)?;
        Ok(self.get_u8())
    }

    fn read_be_u16(&mut self) -> Result<u16> {
        self.ensure_remaining(2)?;
        Ok(self.get_u16())
    }

    fn read_be_u32(&mut self) -> Result<u32> {
        self.ensure_remaining(4)?;
        Ok(self.get_u32())
    }

    fn read_array<const C: usize>(&mut self) -> Result<[u8; C]> {
        self.ensure_remaining(C)?;
        let mut arr = [0u8; C];
        self.copy_to_slice(&mut arr);
        Ok(arr)
    }

    fn take_bytes(&mut self, size: usize) -> Result<Vec<u8>> {
        self.ensure_remaining(size)?;
        let mut out = vec![0u8; size];
        self.copy_to_slice(&mut out);
        Ok(out)
    }

    fn rest(&mut self) -> Vec<u8> {
        let mut out = vec![0u8; self.remaining()];
        self.copy_to_slice(&mut out);
        out
    }

    fn ensure_remaining(&self, size: usize) -> Result<()> {
        if self.remaining() < size {
            return Err(Error::MalformedPacket {
                message: format!("needed {} bytes, {} remaining", size, self.remaining()),
            });
        }

        Ok(())
    }
}

impl<B: Buf> BufParsing for B {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_scalars() {
        let mut buf = &[0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07][..];
        assert_eq!(buf.read_u8().unwrap(), 0x01);
        assert_eq!(buf.read_be_u16().unwrap(), 0x0203);
        assert_eq!(buf.read_be_u32().unwrap(), 0x0405_0607);
        assert!(buf.read_u8().is_err());
    }

    #[test]
    fn test_take_too_much() {
        let mut buf = &[0x01, 0x02][..];
        assert!(buf.take_bytes(3).is_err());
        // nothing consumed on failure
        assert_eq!(buf.remaining(), 2);
    }
}
