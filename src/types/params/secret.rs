use std::io;

use bytes::Buf;
use log::debug;

use crate::crypto::checksum;
use crate::crypto::public_key::PublicKeyAlgorithm;
use crate::crypto::sym::SymmetricKeyAlgorithm;
use crate::errors::{ensure, Result};
use crate::parsing::BufParsing;
use crate::ser::Serialize;
use crate::types::{EncryptedSecretParams, PlainSecretParams, StringToKey};

/// The secret key material of a secret key packet, in one of its three
/// states.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum SecretParams {
    Plain(PlainSecretParams),
    Encrypted(EncryptedSecretParams),
    /// GnuPG extension: the secret material was stripped (gnu-dummy s2k).
    /// The key is fully parseable but unusable for secret operations.
    Stripped,
}

impl SecretParams {
    pub fn is_encrypted(&self) -> bool {
        matches!(self, SecretParams::Encrypted(_))
    }

    pub fn from_buf<B: Buf>(alg: PublicKeyAlgorithm, i: &mut B) -> Result<Self> {
        let usage = i.read_u8()?;

        match usage {
            0 => {
                // plaintext, with a trailing simple checksum
                let data = i.rest();
                let params = PlainSecretParams::from_slice_with_checksum(alg, &data, false)?;
                Ok(SecretParams::Plain(params))
            }
            254 | 255 => {
                let sym_alg = SymmetricKeyAlgorithm::from(i.read_u8()?);
                let s2k = StringToKey::from_buf(i)?;

                if s2k.is_dummy() {
                    debug!("gnu-dummy key, no secret material");
                    return Ok(SecretParams::Stripped);
                }

                let iv = i.take_bytes(sym_alg.block_size())?;
                let data = i.rest();
                ensure!(!data.is_empty(), "missing encrypted secret params");

                Ok(SecretParams::Encrypted(EncryptedSecretParams {
                    data,
                    iv,
                    alg: sym_alg,
                    s2k,
                    usage,
                }))
            }
            _ => {
                // legacy: the usage octet is the symmetric algorithm itself,
                // the key is derived with a simple MD5 s2k
                let sym_alg = SymmetricKeyAlgorithm::from(usage);
                let iv = i.take_bytes(sym_alg.block_size())?;
                let data = i.rest();

                Ok(SecretParams::Encrypted(EncryptedSecretParams {
                    data,
                    iv,
                    alg: sym_alg,
                    s2k: StringToKey {
                        typ: crate::types::StringToKeyType::Simple,
                        hash: crate::crypto::hash::HashAlgorithm::Md5,
                        salt: None,
                        count: None,
                        gnu_mode: None,
                    },
                    usage,
                }))
            }
        }
    }
}

impl Serialize for SecretParams {
    fn to_writer<W: io::Write>(&self, writer: &mut W) -> Result<()> {
        match self {
            SecretParams::Plain(params) => {
                writer.write_all(&[0])?;
                let body = params.to_bytes()?;
                writer.write_all(&body)?;
                writer.write_all(&checksum::simple_sum(&body).to_be_bytes())?;
            }
            SecretParams::Encrypted(params) => {
                params.to_writer(writer)?;
            }
            SecretParams::Stripped => {
                writer.write_all(&[254, 0])?;
                StringToKey {
                    typ: crate::types::StringToKeyType::GnuDummy,
                    hash: crate::crypto::hash::HashAlgorithm::Sha1,
                    salt: None,
                    count: None,
                    gnu_mode: Some(1),
                }
                .to_writer(writer)?;
            }
        }

        Ok(())
    }
}
