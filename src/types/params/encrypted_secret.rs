use std::io;

use crate::crypto::sym::SymmetricKeyAlgorithm;
use crate::errors::Result;
use crate::ser::Serialize;
use crate::types::StringToKey;

/// Still encrypted secret key material, protected by a passphrase derived
/// key.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct EncryptedSecretParams {
    /// The encrypted data, including the trailing checksum.
    pub data: Vec<u8>,
    pub iv: Vec<u8>,
    pub alg: SymmetricKeyAlgorithm,
    pub s2k: StringToKey,
    /// The s2k usage octet: 254 (SHA1 checksum) or 255 (simple checksum).
    pub usage: u8,
}

impl EncryptedSecretParams {
    pub fn has_sha1_checksum(&self) -> bool {
        self.usage == 254
    }
}

impl Serialize for EncryptedSecretParams {
    fn to_writer<W: io::Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_all(&[self.usage, self.alg.into()])?;
        self.s2k.to_writer(writer)?;
        writer.write_all(&self.iv)?;
        writer.write_all(&self.data)?;

        Ok(())
    }
}
