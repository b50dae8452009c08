use std::io;

use byteorder::{BigEndian, ByteOrder};
use bytes::Buf;
use rand::{CryptoRng, Rng};

use crate::crypto::aead::AeadAlgorithm;
use crate::crypto::sym::SymmetricKeyAlgorithm;
use crate::errors::{ensure, ensure_eq, Result};
use crate::packet::PacketTrait;
use crate::parsing::BufParsing;
use crate::ser::Serialize;
use crate::types::Tag;

/// AEAD Protected Data Packet, chunked authenticated encryption.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AeadEncryptedData {
    pub sym_algorithm: SymmetricKeyAlgorithm,
    pub aead: AeadAlgorithm,
    /// Chunks are `1 << (chunk_size + 6)` bytes of plaintext.
    pub chunk_size: u8,
    pub iv: Vec<u8>,
    data: Vec<u8>,
}

impl AeadEncryptedData {
    pub fn from_slice(input: &[u8]) -> Result<Self> {
        let mut i = input;
        let version = i.read_u8()?;
        ensure_eq!(version, 1, "invalid aead packet version");

        let sym_algorithm = SymmetricKeyAlgorithm::from(i.read_u8()?);
        let aead = AeadAlgorithm::from(i.read_u8()?);
        let chunk_size = i.read_u8()?;
        ensure!(chunk_size <= 16, "invalid aead chunk size");
        let iv = i.take_bytes(aead.iv_length())?;
        let data = i.rest();

        Ok(AeadEncryptedData {
            sym_algorithm,
            aead,
            chunk_size,
            iv,
            data,
        })
    }

    fn chunk_len(&self) -> usize {
        1usize << (self.chunk_size as usize + 6)
    }

    fn adata(&self, index: u64) -> [u8; 13] {
        let mut adata = [0u8; 13];
        adata[0] = 0xC0 | u8::from(Tag::AeadEncryptedData);
        adata[1] = 0x01;
        adata[2] = self.sym_algorithm.into();
        adata[3] = self.aead.into();
        adata[4] = self.chunk_size;
        BigEndian::write_u64(&mut adata[5..], index);
        adata
    }

    fn nonce(&self, index: u64) -> Vec<u8> {
        let mut nonce = self.iv.clone();
        let mut index_be = [0u8; 8];
        BigEndian::write_u64(&mut index_be, index);

        let offset = nonce.len() - 8;
        for (i, b) in index_be.iter().enumerate() {
            nonce[offset + i] ^= b;
        }

        nonce
    }

    /// Encrypt the given plaintext in chunks.
    pub fn encrypt<R: Rng + CryptoRng>(
        rng: &mut R,
        sym_algorithm: SymmetricKeyAlgorithm,
        aead: AeadAlgorithm,
        chunk_size: u8,
        key: &[u8],
        plaintext: &[u8],
    ) -> Result<Self> {
        let mut iv = vec![0u8; aead.iv_length()];
        rng.fill_bytes(&mut iv);

        let mut packet = AeadEncryptedData {
            sym_algorithm,
            aead,
            chunk_size,
            iv,
            data: Vec::new(),
        };

        let chunk_len = packet.chunk_len();
        let mut data = Vec::with_capacity(
            plaintext.len() + (plaintext.len() / chunk_len + 2) * aead.tag_length(),
        );

        let mut index = 0u64;
        for chunk in plaintext.chunks(chunk_len) {
            let adata = packet.adata(index);
            let encrypted =
                aead.encrypt(sym_algorithm, key, &packet.nonce(index), &adata, chunk)?;
            data.extend_from_slice(&encrypted);
            index += 1;
        }

        // final tag authenticates the total plaintext length
        let mut final_adata = [0u8; 21];
        final_adata[..13].copy_from_slice(&packet.adata(index));
        BigEndian::write_u64(&mut final_adata[13..], plaintext.len() as u64);
        let final_tag =
            aead.encrypt(sym_algorithm, key, &packet.nonce(index), &final_adata, &[])?;
        data.extend_from_slice(&final_tag);

        packet.data = data;

        Ok(packet)
    }

    /// Decrypt, verifying every chunk tag and the final tag.
    pub fn decrypt(&self, key: &[u8]) -> Result<Vec<u8>> {
        let tag_len = self.aead.tag_length();
        ensure!(self.data.len() >= tag_len, "aead data too short");

        let (chunks, final_tag) = self.data.split_at(self.data.len() - tag_len);

        let mut out = Vec::with_capacity(chunks.len());
        let mut index = 0u64;
        for chunk in chunks.chunks(self.chunk_len() + tag_len) {
            let adata = self.adata(index);
            let plain = self.aead.decrypt(
                self.sym_algorithm,
                key,
                &self.nonce(index),
                &adata,
                chunk,
            )?;
            out.extend_from_slice(&plain);
            index += 1;
        }

        let mut final_adata = [0u8; 21];
        final_adata[..13].copy_from_slice(&self.adata(index));
        BigEndian::write_u64(&mut final_adata[13..], out.len() as u64);
        self.aead.decrypt(
            self.sym_algorithm,
            key,
            &self.nonce(index),
            &final_adata,
            final_tag,
        )?;

        Ok(out)
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }
}

impl Serialize for AeadEncryptedData {
    fn to_writer<W: io::Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_all(&[
            0x01,
            self.sym_algorithm.into(),
            self.aead.into(),
            self.chunk_size,
        ])?;
        writer.write_all(&self.iv)?;
        writer.write_all(&self.data)?;

        Ok(())
    }
}

impl PacketTrait for AeadEncryptedData {
    fn tag(&self) -> Tag {
        Tag::AeadEncryptedData
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::*;
    use crate::errors::Error;

    #[test]
    fn roundtrip_small_chunks() {
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let key = [3u8; 32];
        // chunk size 0 => 64 byte chunks, forces several chunks
        let plaintext = vec![0x42u8; 200];

        for aead in [AeadAlgorithm::Eax, AeadAlgorithm::Ocb, AeadAlgorithm::Gcm] {
            let packet = AeadEncryptedData::encrypt(
                &mut rng,
                SymmetricKeyAlgorithm::AES256,
                aead,
                0,
                &key,
                &plaintext,
            )
            .unwrap();

            let bytes = packet.to_bytes().unwrap();
            let back = AeadEncryptedData::from_slice(&bytes).unwrap();
            assert_eq!(packet, back);

            assert_eq!(back.decrypt(&key).unwrap(), plaintext, "{:?}", aead);
        }
    }

    #[test]
    fn tampering_detected() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let key = [9u8; 16];

        let mut packet = AeadEncryptedData::encrypt(
            &mut rng,
            SymmetricKeyAlgorithm::AES128,
            AeadAlgorithm::Eax,
            6,
            &key,
            b"very secret",
        )
        .unwrap();

        packet.data[0] ^= 0x01;
        assert!(matches!(packet.decrypt(&key), Err(Error::Eax)));
    }

    #[test]
    fn empty_plaintext_roundtrip() {
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let key = [1u8; 32];

        let packet = AeadEncryptedData::encrypt(
            &mut rng,
            SymmetricKeyAlgorithm::AES256,
            AeadAlgorithm::Eax,
            6,
            &key,
            b"",
        )
        .unwrap();

        assert_eq!(packet.decrypt(&key).unwrap(), b"");
    }
}
