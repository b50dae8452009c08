use sha1::{Digest, Sha1};

use crate::errors::{ensure_eq, Result};

/// Two octet checksum: sum of all octets mod 65536.
#[inline]
pub fn simple_sum(data: &[u8]) -> u16 {
    (data.iter().map(|v| u32::from(*v)).sum::<u32>() & 0xffff) as u16
}

/// Verify the two octet checksum over `data`.
#[inline]
pub fn simple(expected: &[u8], data: &[u8]) -> Result<()> {
    ensure_eq!(expected.len(), 2, "invalid simple checksum length");
    let checksum = u16::from_be_bytes([expected[0], expected[1]]);

    ensure_eq!(checksum, simple_sum(data), "invalid simple checksum");

    Ok(())
}

/// Verify the SHA1 checksum, first 20 octets.
#[inline]
pub fn sha1(hash: &[u8], data: &[u8]) -> Result<()> {
    ensure_eq!(hash, &Sha1::digest(data)[0..20], "invalid SHA1 checksum");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_sum_wraps() {
        assert_eq!(simple_sum(&[0xff, 0x02]), 0x101);
        let data = vec![0xffu8; 300];
        let sum = simple_sum(&data);
        assert_eq!(u32::from(sum), (300 * 0xff) & 0xffff);
    }

    #[test]
    fn test_simple_verify() {
        let data = [1u8, 2, 3, 4];
        let sum = simple_sum(&data).to_be_bytes();
        assert!(simple(&sum, &data).is_ok());
        assert!(simple(&[0, 0], &data).is_err());
    }
}
