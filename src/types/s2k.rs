use std::io;

use bytes::Buf;
use rand::{CryptoRng, Rng};
use zeroize::Zeroizing;

use crate::crypto::hash::HashAlgorithm;
use crate::errors::{unsupported_err, Result};
use crate::parsing::BufParsing;
use crate::ser::Serialize;

const EXPBIAS: u32 = 6;

/// Count octet used for newly created iterated & salted S2Ks:
/// decodes to 65536 iterations.
const DEFAULT_COUNT: u8 = 0x60;

/// Available String-To-Key types.
/// Ref: <https://tools.ietf.org/html/rfc4880.html#section-3.7.1>
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
#[repr(u8)]
pub enum StringToKeyType {
    Simple = 0,
    Salted = 1,
    Reserved = 2,
    IteratedAndSalted = 3,
    /// GnuPG extension: no secret key material present.
    GnuDummy = 101,
}

impl StringToKeyType {
    pub fn from_u8(typ: u8) -> Option<Self> {
        match typ {
            0 => Some(StringToKeyType::Simple),
            1 => Some(StringToKeyType::Salted),
            2 => Some(StringToKeyType::Reserved),
            3 => Some(StringToKeyType::IteratedAndSalted),
            101 => Some(StringToKeyType::GnuDummy),
            _ => None,
        }
    }
}

/// A parsed String-To-Key specifier, used to derive symmetric keys from
/// passphrases.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StringToKey {
    pub typ: StringToKeyType,
    pub hash: HashAlgorithm,
    pub salt: Option<[u8; 8]>,
    pub count: Option<u8>,
    /// GNU extension mode; 1 marks a dummy key without secret material.
    pub gnu_mode: Option<u8>,
}

impl StringToKey {
    pub fn new_iterated<R: Rng + CryptoRng>(rng: &mut R) -> Self {
        let mut salt = [0u8; 8];
        rng.fill_bytes(&mut salt);

        StringToKey {
            typ: StringToKeyType::IteratedAndSalted,
            hash: HashAlgorithm::Sha256,
            salt: Some(salt),
            count: Some(DEFAULT_COUNT),
            gnu_mode: None,
        }
    }

    /// Converts the coded count into the octet count.
    /// Ref: <https://tools.ietf.org/html/rfc4880.html#section-3.7.1.3>
    pub fn decoded_count(&self) -> Option<usize> {
        self.count
            .map(|c| ((16u32 + u32::from(c & 15)) << (u32::from(c >> 4) + EXPBIAS)) as usize)
    }

    pub fn is_dummy(&self) -> bool {
        self.typ == StringToKeyType::GnuDummy && self.gnu_mode == Some(1)
    }

    pub fn from_buf<B: Buf>(i: &mut B) -> Result<Self> {
        let typ = i.read_u8()?;
        let typ = StringToKeyType::from_u8(typ).ok_or_else(|| {
            crate::errors::Error::MalformedPacket {
                message: format!("unknown s2k type {}", typ),
            }
        })?;
        let hash = HashAlgorithm::from(i.read_u8()?);

        match typ {
            StringToKeyType::Simple | StringToKeyType::Reserved => Ok(StringToKey {
                typ,
                hash,
                salt: None,
                count: None,
                gnu_mode: None,
            }),
            StringToKeyType::Salted => Ok(StringToKey {
                typ,
                hash,
                salt: Some(i.read_array::<8>()?),
                count: None,
                gnu_mode: None,
            }),
            StringToKeyType::IteratedAndSalted => Ok(StringToKey {
                typ,
                hash,
                salt: Some(i.read_array::<8>()?),
                count: Some(i.read_u8()?),
                gnu_mode: None,
            }),
            StringToKeyType::GnuDummy => {
                let marker = i.read_array::<3>()?;
                crate::errors::ensure_eq!(&marker[..], b"GNU", "invalid gnu s2k extension marker");
                let mode = i.read_u8()?;
                Ok(StringToKey {
                    typ,
                    hash,
                    salt: None,
                    count: None,
                    gnu_mode: Some(mode),
                })
            }
        }
    }

    /// Derive a symmetric key of `key_size` bytes from the passphrase.
    /// Ref: <https://tools.ietf.org/html/rfc4880.html#section-3.7.1>
    pub fn derive_key(&self, passphrase: &str, key_size: usize) -> Result<Vec<u8>> {
        match self.typ {
            StringToKeyType::Simple
            | StringToKeyType::Salted
            | StringToKeyType::IteratedAndSalted => {}
            _ => unsupported_err!("s2k: {:?}", self.typ),
        }

        let hash_size = self
            .hash
            .digest_size()
            .ok_or_else(|| crate::errors::format_err!("unknown digest size for {:?}", self.hash))?;
        let pw = Zeroizing::new(passphrase.as_bytes().to_vec());

        let mut key = vec![0u8; key_size];
        let mut zeros = 0;

        for chunk in key.chunks_mut(hash_size) {
            let mut hasher = self.hash.new_hasher()?;
            // each context is preloaded with one more zero octet
            hasher.update(&vec![0u8; zeros]);
            zeros += 1;

            match self.typ {
                StringToKeyType::Simple => {
                    hasher.update(&pw);
                }
                StringToKeyType::Salted => {
                    hasher.update(self.salt.as_ref().expect("salted s2k"));
                    hasher.update(&pw);
                }
                StringToKeyType::IteratedAndSalted => {
                    let salt = self.salt.as_ref().expect("iterated s2k");
                    let count = self.decoded_count().expect("iterated s2k");

                    let mut data = Vec::with_capacity(salt.len() + pw.len());
                    data.extend_from_slice(salt);
                    data.extend_from_slice(&pw);

                    if count <= data.len() {
                        hasher.update(&data[..count]);
                    } else {
                        let full = count / data.len();
                        let tail = count - full * data.len();
                        for _ in 0..full {
                            hasher.update(&data);
                        }
                        hasher.update(&data[..tail]);
                    }
                }
                _ => unreachable!("filtered above"),
            }

            let digest = hasher.finalize();
            let l = chunk.len();
            chunk.copy_from_slice(&digest[..l]);
        }

        Ok(key)
    }
}

impl Serialize for StringToKey {
    fn to_writer<W: io::Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_all(&[self.typ as u8, self.hash.into()])?;

        if let Some(ref salt) = self.salt {
            writer.write_all(salt)?;
        }

        if let Some(count) = self.count {
            writer.write_all(&[count])?;
        }

        if self.typ == StringToKeyType::GnuDummy {
            writer.write_all(b"GNU")?;
            writer.write_all(&[self.gnu_mode.unwrap_or(1)])?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decoded_count() {
        let s2k = StringToKey {
            typ: StringToKeyType::IteratedAndSalted,
            hash: HashAlgorithm::Sha1,
            salt: Some([1u8; 8]),
            count: Some(0x60),
            gnu_mode: None,
        };
        assert_eq!(s2k.decoded_count(), Some(65536));

        let s2k = StringToKey { count: Some(0xFF), ..s2k };
        assert_eq!(s2k.decoded_count(), Some(65_011_712));
    }

    #[test]
    fn s2k_roundtrip() {
        let s2k = StringToKey {
            typ: StringToKeyType::IteratedAndSalted,
            hash: HashAlgorithm::Sha256,
            salt: Some([7u8; 8]),
            count: Some(0x60),
            gnu_mode: None,
        };
        let bytes = s2k.to_bytes().unwrap();
        let back = StringToKey::from_buf(&mut &bytes[..]).unwrap();
        assert_eq!(s2k, back);
    }

    #[test]
    fn gnu_dummy_roundtrip() {
        let s2k = StringToKey {
            typ: StringToKeyType::GnuDummy,
            hash: HashAlgorithm::Sha1,
            salt: None,
            count: None,
            gnu_mode: Some(1),
        };
        let bytes = s2k.to_bytes().unwrap();
        let back = StringToKey::from_buf(&mut &bytes[..]).unwrap();
        assert!(back.is_dummy());
        assert_eq!(s2k, back);
    }

    #[test]
    fn derive_is_deterministic() {
        let s2k = StringToKey {
            typ: StringToKeyType::IteratedAndSalted,
            hash: HashAlgorithm::Sha256,
            salt: Some([3u8; 8]),
            count: Some(0x60),
            gnu_mode: None,
        };
        let a = s2k.derive_key("secret", 32).unwrap();
        let b = s2k.derive_key("secret", 32).unwrap();
        let c = s2k.derive_key("other", 32).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.len(), 32);
    }
}
