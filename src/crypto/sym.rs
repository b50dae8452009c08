use aes::{Aes128, Aes192, Aes256};
use blowfish::Blowfish;
use camellia::{Camellia128, Camellia192, Camellia256};
use cast5::Cast5;
use cfb_mode::{
    cipher::{AsyncStreamCipher, KeyIvInit},
    BufDecryptor, BufEncryptor, Decryptor, Encryptor,
};
use cipher::{BlockCipher, BlockDecrypt, BlockEncryptMut};
use des::TdesEde3;
use idea::Idea;
use log::debug;
use num_enum::{FromPrimitive, IntoPrimitive};
use rand::{CryptoRng, Rng};
use sha1::{Digest, Sha1};
use twofish::Twofish;
use zeroize::Zeroizing;

use crate::errors::{bail, ensure, unimplemented_err, Error, Result};

/// MDC trailer: 1 byte packet tag, 1 byte length, 20 bytes SHA1.
const MDC_LEN: usize = 22;

fn encrypt<MODE>(key: &[u8], iv: &[u8], prefix: &mut [u8], data: &mut [u8]) -> Result<()>
where
    MODE: BlockDecrypt + BlockEncryptMut + BlockCipher,
    BufEncryptor<MODE>: KeyIvInit,
{
    let mut mode = BufEncryptor::<MODE>::new_from_slices(key, iv)?;
    mode.encrypt(prefix);
    mode.encrypt(data);

    Ok(())
}

/// Legacy OpenPGP CFB mode with resynchronization after the prefix.
/// Ref: <https://tools.ietf.org/html/rfc4880.html#section-13.9>
fn encrypt_resync<MODE>(key: &[u8], iv: &[u8], prefix: &mut [u8], data: &mut [u8]) -> Result<()>
where
    MODE: BlockDecrypt + BlockEncryptMut + BlockCipher,
    BufEncryptor<MODE>: KeyIvInit,
{
    let mut mode = BufEncryptor::<MODE>::new_from_slices(key, iv)?;
    mode.encrypt(prefix);

    // resync
    mode = BufEncryptor::<MODE>::new_from_slices(key, &prefix[2..])?;
    mode.encrypt(data);

    Ok(())
}

fn decrypt<MODE>(key: &[u8], iv: &[u8], ciphertext: &mut [u8]) -> Result<()>
where
    MODE: BlockDecrypt + BlockEncryptMut + BlockCipher,
    BufDecryptor<MODE>: KeyIvInit,
{
    let mut mode = BufDecryptor::<MODE>::new_from_slices(key, iv)?;
    mode.decrypt(ciphertext);

    Ok(())
}

fn decrypt_resync<MODE>(key: &[u8], iv: &[u8], prefix: &mut [u8], data: &mut [u8]) -> Result<()>
where
    MODE: BlockDecrypt + BlockEncryptMut + BlockCipher,
    BufDecryptor<MODE>: KeyIvInit,
{
    // the iv for the data portion is the still encrypted end of the prefix
    let encrypted_prefix = prefix[2..].to_vec();

    let mut mode = BufDecryptor::<MODE>::new_from_slices(key, iv)?;
    mode.decrypt(prefix);

    mode = BufDecryptor::<MODE>::new_from_slices(key, &encrypted_prefix)?;
    mode.decrypt(data);

    Ok(())
}

/// Available symmetric key algorithms.
/// Ref: <https://tools.ietf.org/html/rfc4880.html#section-9.2>
#[derive(Debug, PartialEq, Eq, Copy, Clone, Hash, FromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum SymmetricKeyAlgorithm {
    /// Plaintext or unencrypted data
    Plaintext = 0,
    IDEA = 1,
    /// Triple-DES
    TripleDES = 2,
    CAST5 = 3,
    Blowfish = 4,
    // 5 & 6 are reserved for DES/SK
    /// AES with 128-bit key
    AES128 = 7,
    /// AES with 192-bit key
    AES192 = 8,
    /// AES with 256-bit key
    AES256 = 9,
    /// Twofish with 256-bit key
    Twofish = 10,
    Camellia128 = 11,
    Camellia192 = 12,
    Camellia256 = 13,

    #[num_enum(catch_all)]
    Other(u8),
}

impl Default for SymmetricKeyAlgorithm {
    fn default() -> Self {
        Self::AES128
    }
}

impl std::fmt::Display for SymmetricKeyAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl SymmetricKeyAlgorithm {
    /// The size of a single block in bytes.
    pub fn block_size(self) -> usize {
        match self {
            SymmetricKeyAlgorithm::Plaintext => 0,
            SymmetricKeyAlgorithm::IDEA => 8,
            SymmetricKeyAlgorithm::TripleDES => 8,
            SymmetricKeyAlgorithm::CAST5 => 8,
            SymmetricKeyAlgorithm::Blowfish => 8,
            SymmetricKeyAlgorithm::AES128 => 16,
            SymmetricKeyAlgorithm::AES192 => 16,
            SymmetricKeyAlgorithm::AES256 => 16,
            SymmetricKeyAlgorithm::Twofish => 16,
            SymmetricKeyAlgorithm::Camellia128 => 16,
            SymmetricKeyAlgorithm::Camellia192 => 16,
            SymmetricKeyAlgorithm::Camellia256 => 16,
            SymmetricKeyAlgorithm::Other(_) => 0,
        }
    }

    /// The size of the key in bytes.
    pub const fn key_size(self) -> usize {
        match self {
            SymmetricKeyAlgorithm::Plaintext => 0,
            SymmetricKeyAlgorithm::IDEA => 16,
            SymmetricKeyAlgorithm::TripleDES => 24,
            SymmetricKeyAlgorithm::CAST5 => 16,
            SymmetricKeyAlgorithm::Blowfish => 16,
            SymmetricKeyAlgorithm::AES128 => 16,
            SymmetricKeyAlgorithm::AES192 => 24,
            SymmetricKeyAlgorithm::AES256 => 32,
            SymmetricKeyAlgorithm::Twofish => 32,
            SymmetricKeyAlgorithm::Camellia128 => 16,
            SymmetricKeyAlgorithm::Camellia192 => 24,
            SymmetricKeyAlgorithm::Camellia256 => 32,
            SymmetricKeyAlgorithm::Other(_) => 0,
        }
    }

    /// A cipher with a 128 bit or larger block, for which the integrity
    /// protected packet form is mandatory.
    pub fn is_modern(self) -> bool {
        self.block_size() >= 16
    }

    /// Decrypt legacy data using OpenPGP CFB mode with resynchronization.
    /// Returns the plaintext with the random prefix removed.
    pub fn decrypt_legacy(self, key: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>> {
        debug!("unprotected decrypt");

        let bs = self.block_size();
        ensure!(ciphertext.len() >= bs + 2, "invalid ciphertext length");

        let iv_vec = vec![0u8; bs];
        let mut buf = ciphertext.to_vec();
        let (prefix, data) = buf.split_at_mut(bs + 2);

        match self {
            SymmetricKeyAlgorithm::Plaintext => {
                bail!("'Plaintext' is not a legal cipher for encrypted data")
            }
            SymmetricKeyAlgorithm::IDEA => decrypt_resync::<Idea>(key, &iv_vec, prefix, data)?,
            SymmetricKeyAlgorithm::TripleDES => {
                decrypt_resync::<TdesEde3>(key, &iv_vec, prefix, data)?
            }
            SymmetricKeyAlgorithm::CAST5 => decrypt_resync::<Cast5>(key, &iv_vec, prefix, data)?,
            SymmetricKeyAlgorithm::Blowfish => {
                decrypt_resync::<Blowfish>(key, &iv_vec, prefix, data)?
            }
            SymmetricKeyAlgorithm::AES128 => decrypt_resync::<Aes128>(key, &iv_vec, prefix, data)?,
            SymmetricKeyAlgorithm::AES192 => decrypt_resync::<Aes192>(key, &iv_vec, prefix, data)?,
            SymmetricKeyAlgorithm::AES256 => decrypt_resync::<Aes256>(key, &iv_vec, prefix, data)?,
            SymmetricKeyAlgorithm::Twofish => {
                decrypt_resync::<Twofish>(key, &iv_vec, prefix, data)?
            }
            SymmetricKeyAlgorithm::Camellia128 => {
                decrypt_resync::<Camellia128>(key, &iv_vec, prefix, data)?
            }
            SymmetricKeyAlgorithm::Camellia192 => {
                decrypt_resync::<Camellia192>(key, &iv_vec, prefix, data)?
            }
            SymmetricKeyAlgorithm::Camellia256 => {
                decrypt_resync::<Camellia256>(key, &iv_vec, prefix, data)?
            }
            SymmetricKeyAlgorithm::Other(v) => {
                unimplemented_err!("SymmetricKeyAlgorithm {} is unsupported", v)
            }
        }

        // We do not check the "quick check" octets, to avoid providing a
        // decryption oracle. See <https://eprint.iacr.org/2005/033>.

        Ok(buf.split_off(bs + 2))
    }

    /// Decrypt integrity protected data (zero IV, no resynchronization),
    /// verifying and stripping the MDC trailer.
    pub fn decrypt_protected(self, key: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>> {
        debug!("protected decrypt");

        let bs = self.block_size();
        ensure!(
            ciphertext.len() >= bs + 2 + MDC_LEN,
            "invalid protected ciphertext length"
        );

        let iv_vec = vec![0u8; bs];
        let mut buf = ciphertext.to_vec();

        match self {
            SymmetricKeyAlgorithm::Plaintext => {
                bail!("'Plaintext' is not a legal cipher for encrypted data")
            }
            SymmetricKeyAlgorithm::IDEA => decrypt::<Idea>(key, &iv_vec, &mut buf)?,
            SymmetricKeyAlgorithm::TripleDES => decrypt::<TdesEde3>(key, &iv_vec, &mut buf)?,
            SymmetricKeyAlgorithm::CAST5 => decrypt::<Cast5>(key, &iv_vec, &mut buf)?,
            SymmetricKeyAlgorithm::Blowfish => decrypt::<Blowfish>(key, &iv_vec, &mut buf)?,
            SymmetricKeyAlgorithm::AES128 => decrypt::<Aes128>(key, &iv_vec, &mut buf)?,
            SymmetricKeyAlgorithm::AES192 => decrypt::<Aes192>(key, &iv_vec, &mut buf)?,
            SymmetricKeyAlgorithm::AES256 => decrypt::<Aes256>(key, &iv_vec, &mut buf)?,
            SymmetricKeyAlgorithm::Twofish => decrypt::<Twofish>(key, &iv_vec, &mut buf)?,
            SymmetricKeyAlgorithm::Camellia128 => decrypt::<Camellia128>(key, &iv_vec, &mut buf)?,
            SymmetricKeyAlgorithm::Camellia192 => decrypt::<Camellia192>(key, &iv_vec, &mut buf)?,
            SymmetricKeyAlgorithm::Camellia256 => decrypt::<Camellia256>(key, &iv_vec, &mut buf)?,
            SymmetricKeyAlgorithm::Other(v) => {
                unimplemented_err!("SymmetricKeyAlgorithm {} is unsupported", v)
            }
        }

        // split off the MDC and verify it over everything before it,
        // including its own tag and length octet
        let mdc = buf.split_off(buf.len() - MDC_LEN);
        if mdc[0] != 0xD3 || mdc[1] != 0x14 {
            return Err(Error::MdcError);
        }

        let mut hasher = Sha1::new();
        hasher.update(&buf);
        hasher.update(&mdc[..2]);
        let sha1: [u8; 20] = hasher.finalize().into();

        if mdc[2..] != sha1[..] {
            return Err(Error::MdcError);
        }

        Ok(buf.split_off(bs + 2))
    }

    /// Plain CFB, no prefix handling. Used for secret key material and
    /// session key encryption.
    pub fn decrypt_with_iv_regular(
        self,
        key: &[u8],
        iv_vec: &[u8],
        ciphertext: &mut [u8],
    ) -> Result<()> {
        match self {
            SymmetricKeyAlgorithm::Plaintext => {
                bail!("'Plaintext' is not a legal cipher for encrypted data")
            }
            SymmetricKeyAlgorithm::IDEA => {
                Decryptor::<Idea>::new_from_slices(key, iv_vec)?.decrypt(ciphertext);
            }
            SymmetricKeyAlgorithm::TripleDES => {
                Decryptor::<TdesEde3>::new_from_slices(key, iv_vec)?.decrypt(ciphertext);
            }
            SymmetricKeyAlgorithm::CAST5 => {
                Decryptor::<Cast5>::new_from_slices(key, iv_vec)?.decrypt(ciphertext);
            }
            SymmetricKeyAlgorithm::Blowfish => {
                Decryptor::<Blowfish>::new_from_slices(key, iv_vec)?.decrypt(ciphertext);
            }
            SymmetricKeyAlgorithm::AES128 => {
                Decryptor::<Aes128>::new_from_slices(key, iv_vec)?.decrypt(ciphertext);
            }
            SymmetricKeyAlgorithm::AES192 => {
                Decryptor::<Aes192>::new_from_slices(key, iv_vec)?.decrypt(ciphertext);
            }
            SymmetricKeyAlgorithm::AES256 => {
                Decryptor::<Aes256>::new_from_slices(key, iv_vec)?.decrypt(ciphertext);
            }
            SymmetricKeyAlgorithm::Twofish => {
                Decryptor::<Twofish>::new_from_slices(key, iv_vec)?.decrypt(ciphertext);
            }
            SymmetricKeyAlgorithm::Camellia128 => {
                Decryptor::<Camellia128>::new_from_slices(key, iv_vec)?.decrypt(ciphertext);
            }
            SymmetricKeyAlgorithm::Camellia192 => {
                Decryptor::<Camellia192>::new_from_slices(key, iv_vec)?.decrypt(ciphertext);
            }
            SymmetricKeyAlgorithm::Camellia256 => {
                Decryptor::<Camellia256>::new_from_slices(key, iv_vec)?.decrypt(ciphertext);
            }
            SymmetricKeyAlgorithm::Other(v) => {
                unimplemented_err!("SymmetricKeyAlgorithm {} is unsupported", v)
            }
        }
        Ok(())
    }

    /// Plain CFB, no prefix handling.
    pub fn encrypt_with_iv_regular(
        self,
        key: &[u8],
        iv_vec: &[u8],
        plaintext: &mut [u8],
    ) -> Result<()> {
        match self {
            SymmetricKeyAlgorithm::Plaintext => {
                bail!("'Plaintext' is not a legal cipher for encrypted data")
            }
            SymmetricKeyAlgorithm::IDEA => {
                Encryptor::<Idea>::new_from_slices(key, iv_vec)?.encrypt(plaintext);
            }
            SymmetricKeyAlgorithm::TripleDES => {
                Encryptor::<TdesEde3>::new_from_slices(key, iv_vec)?.encrypt(plaintext);
            }
            SymmetricKeyAlgorithm::CAST5 => {
                Encryptor::<Cast5>::new_from_slices(key, iv_vec)?.encrypt(plaintext);
            }
            SymmetricKeyAlgorithm::Blowfish => {
                Encryptor::<Blowfish>::new_from_slices(key, iv_vec)?.encrypt(plaintext);
            }
            SymmetricKeyAlgorithm::AES128 => {
                Encryptor::<Aes128>::new_from_slices(key, iv_vec)?.encrypt(plaintext);
            }
            SymmetricKeyAlgorithm::AES192 => {
                Encryptor::<Aes192>::new_from_slices(key, iv_vec)?.encrypt(plaintext);
            }
            SymmetricKeyAlgorithm::AES256 => {
                Encryptor::<Aes256>::new_from_slices(key, iv_vec)?.encrypt(plaintext);
            }
            SymmetricKeyAlgorithm::Twofish => {
                Encryptor::<Twofish>::new_from_slices(key, iv_vec)?.encrypt(plaintext);
            }
            SymmetricKeyAlgorithm::Camellia128 => {
                Encryptor::<Camellia128>::new_from_slices(key, iv_vec)?.encrypt(plaintext);
            }
            SymmetricKeyAlgorithm::Camellia192 => {
                Encryptor::<Camellia192>::new_from_slices(key, iv_vec)?.encrypt(plaintext);
            }
            SymmetricKeyAlgorithm::Camellia256 => {
                Encryptor::<Camellia256>::new_from_slices(key, iv_vec)?.encrypt(plaintext);
            }
            SymmetricKeyAlgorithm::Other(v) => {
                unimplemented_err!("SymmetricKeyAlgorithm {} is unsupported", v)
            }
        }
        Ok(())
    }

    /// Encrypt the data with OpenPGP CFB mode and legacy resynchronization,
    /// producing the body of a legacy symmetrically encrypted data packet.
    pub fn encrypt_legacy<R: CryptoRng + Rng>(
        self,
        rng: &mut R,
        key: &[u8],
        plaintext: &[u8],
    ) -> Result<Vec<u8>> {
        debug!("unprotected encrypt");

        let bs = self.block_size();
        let iv_vec = vec![0u8; bs];

        let prefix_len = bs + 2;
        let plaintext_len = plaintext.len();

        let mut ciphertext = vec![0u8; prefix_len + plaintext_len];
        // prefix
        rng.fill_bytes(&mut ciphertext[..bs]);

        // quick check
        ciphertext[bs] = ciphertext[bs - 2];
        ciphertext[bs + 1] = ciphertext[bs - 1];

        // plaintext
        ciphertext[prefix_len..].copy_from_slice(plaintext);

        let (prefix, data) = ciphertext.split_at_mut(prefix_len);

        match self {
            SymmetricKeyAlgorithm::Plaintext => {
                bail!("'Plaintext' is not a legal cipher for encrypted data")
            }
            SymmetricKeyAlgorithm::IDEA => encrypt_resync::<Idea>(key, &iv_vec, prefix, data)?,
            SymmetricKeyAlgorithm::TripleDES => {
                encrypt_resync::<TdesEde3>(key, &iv_vec, prefix, data)?
            }
            SymmetricKeyAlgorithm::CAST5 => encrypt_resync::<Cast5>(key, &iv_vec, prefix, data)?,
            SymmetricKeyAlgorithm::Blowfish => {
                encrypt_resync::<Blowfish>(key, &iv_vec, prefix, data)?
            }
            SymmetricKeyAlgorithm::AES128 => encrypt_resync::<Aes128>(key, &iv_vec, prefix, data)?,
            SymmetricKeyAlgorithm::AES192 => encrypt_resync::<Aes192>(key, &iv_vec, prefix, data)?,
            SymmetricKeyAlgorithm::AES256 => encrypt_resync::<Aes256>(key, &iv_vec, prefix, data)?,
            SymmetricKeyAlgorithm::Twofish => {
                encrypt_resync::<Twofish>(key, &iv_vec, prefix, data)?
            }
            SymmetricKeyAlgorithm::Camellia128 => {
                encrypt_resync::<Camellia128>(key, &iv_vec, prefix, data)?
            }
            SymmetricKeyAlgorithm::Camellia192 => {
                encrypt_resync::<Camellia192>(key, &iv_vec, prefix, data)?
            }
            SymmetricKeyAlgorithm::Camellia256 => {
                encrypt_resync::<Camellia256>(key, &iv_vec, prefix, data)?
            }
            SymmetricKeyAlgorithm::Other(v) => {
                unimplemented_err!("SymmetricKeyAlgorithm {} is unsupported", v)
            }
        }

        Ok(ciphertext)
    }

    /// Encrypt the data with a trailing MDC, producing the body of an
    /// integrity protected data packet (after the version octet).
    pub fn encrypt_protected<R: CryptoRng + Rng>(
        self,
        rng: &mut R,
        key: &[u8],
        plaintext: &[u8],
    ) -> Result<Vec<u8>> {
        debug!("protected encrypt");

        let bs = self.block_size();
        let prefix_len = bs + 2;
        let plaintext_len = plaintext.len();

        let mut ciphertext = vec![0u8; prefix_len + plaintext_len + MDC_LEN];

        // prefix
        rng.fill_bytes(&mut ciphertext[..bs]);

        // quick check
        ciphertext[bs] = ciphertext[bs - 2];
        ciphertext[bs + 1] = ciphertext[bs - 1];

        // plaintext
        ciphertext[prefix_len..(prefix_len + plaintext_len)].copy_from_slice(plaintext);
        // mdc header
        ciphertext[prefix_len + plaintext_len] = 0xD3;
        ciphertext[prefix_len + plaintext_len + 1] = 0x14;
        // mdc body
        let checksum = &Sha1::digest(&ciphertext[..(prefix_len + plaintext_len + 2)])[..20];
        ciphertext[(prefix_len + plaintext_len + 2)..].copy_from_slice(checksum);

        // IV is all zeroes
        let iv_vec = vec![0u8; bs];

        let (prefix, data) = ciphertext.split_at_mut(prefix_len);

        match self {
            SymmetricKeyAlgorithm::Plaintext => {
                bail!("'Plaintext' is not a legal cipher for encrypted data")
            }
            SymmetricKeyAlgorithm::IDEA => encrypt::<Idea>(key, &iv_vec, prefix, data)?,
            SymmetricKeyAlgorithm::TripleDES => encrypt::<TdesEde3>(key, &iv_vec, prefix, data)?,
            SymmetricKeyAlgorithm::CAST5 => encrypt::<Cast5>(key, &iv_vec, prefix, data)?,
            SymmetricKeyAlgorithm::Blowfish => encrypt::<Blowfish>(key, &iv_vec, prefix, data)?,
            SymmetricKeyAlgorithm::AES128 => encrypt::<Aes128>(key, &iv_vec, prefix, data)?,
            SymmetricKeyAlgorithm::AES192 => encrypt::<Aes192>(key, &iv_vec, prefix, data)?,
            SymmetricKeyAlgorithm::AES256 => encrypt::<Aes256>(key, &iv_vec, prefix, data)?,
            SymmetricKeyAlgorithm::Twofish => encrypt::<Twofish>(key, &iv_vec, prefix, data)?,
            SymmetricKeyAlgorithm::Camellia128 => {
                encrypt::<Camellia128>(key, &iv_vec, prefix, data)?
            }
            SymmetricKeyAlgorithm::Camellia192 => {
                encrypt::<Camellia192>(key, &iv_vec, prefix, data)?
            }
            SymmetricKeyAlgorithm::Camellia256 => {
                encrypt::<Camellia256>(key, &iv_vec, prefix, data)?
            }
            SymmetricKeyAlgorithm::Other(v) => {
                unimplemented_err!("SymmetricKeyAlgorithm {} is unsupported", v)
            }
        }

        Ok(ciphertext)
    }

    /// Generate a new session key.
    pub fn new_session_key<R: Rng + CryptoRng>(self, rng: &mut R) -> Zeroizing<Vec<u8>> {
        let mut session_key = Zeroizing::new(vec![0u8; self.key_size()]);
        rng.fill_bytes(&mut session_key);
        session_key
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::*;

    #[test]
    fn legacy_roundtrip() {
        let mut rng = ChaCha8Rng::seed_from_u64(0);

        for alg in [
            SymmetricKeyAlgorithm::TripleDES,
            SymmetricKeyAlgorithm::CAST5,
            SymmetricKeyAlgorithm::AES128,
            SymmetricKeyAlgorithm::AES256,
        ] {
            let key = alg.new_session_key(&mut rng);
            let plaintext = b"hello legacy cfb world";

            let ciphertext = alg.encrypt_legacy(&mut rng, &key, plaintext).unwrap();
            assert_ne!(&ciphertext[alg.block_size() + 2..], &plaintext[..]);

            let decrypted = alg.decrypt_legacy(&key, &ciphertext).unwrap();
            assert_eq!(decrypted, plaintext);
        }
    }

    #[test]
    fn protected_roundtrip() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);

        for alg in [
            SymmetricKeyAlgorithm::AES128,
            SymmetricKeyAlgorithm::AES192,
            SymmetricKeyAlgorithm::AES256,
            SymmetricKeyAlgorithm::Twofish,
        ] {
            let key = alg.new_session_key(&mut rng);
            let plaintext = b"hello protected world";

            let ciphertext = alg.encrypt_protected(&mut rng, &key, plaintext).unwrap();
            let decrypted = alg.decrypt_protected(&key, &ciphertext).unwrap();
            assert_eq!(decrypted, plaintext);
        }
    }

    #[test]
    fn protected_detects_tampering() {
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let alg = SymmetricKeyAlgorithm::AES256;
        let key = alg.new_session_key(&mut rng);

        let mut ciphertext = alg.encrypt_protected(&mut rng, &key, b"payload").unwrap();
        let last = ciphertext.len() - 1;
        ciphertext[last] ^= 0x01;

        assert!(matches!(
            alg.decrypt_protected(&key, &ciphertext),
            Err(Error::MdcError)
        ));
    }

    #[test]
    fn regular_cfb_roundtrip() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let alg = SymmetricKeyAlgorithm::AES256;
        let key = alg.new_session_key(&mut rng);
        let iv = vec![0u8; alg.block_size()];

        let mut data = b"some secret bytes".to_vec();
        alg.encrypt_with_iv_regular(&key, &iv, &mut data).unwrap();
        assert_ne!(&data, b"some secret bytes");
        alg.decrypt_with_iv_regular(&key, &iv, &mut data).unwrap();
        assert_eq!(&data, b"some secret bytes");
    }
}
