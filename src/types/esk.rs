use std::io;

use bytes::Buf;

use crate::crypto::public_key::PublicKeyAlgorithm;
use crate::errors::Result;
use crate::parsing::BufParsing;
use crate::ser::Serialize;
use crate::types::Mpi;

/// Algorithm specific values of an encrypted session key, as carried in a
/// public key encrypted session key packet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EskBytes {
    Rsa {
        mpi: Mpi,
    },
    Elgamal {
        first: Mpi,
        second: Mpi,
    },
    Ecdh {
        public_point: Mpi,
        encrypted_session_key: Vec<u8>,
    },
    Other {
        data: Vec<u8>,
    },
}

impl EskBytes {
    pub fn from_buf<B: Buf>(alg: PublicKeyAlgorithm, i: &mut B) -> Result<Self> {
        match alg {
            PublicKeyAlgorithm::RSA
            | PublicKeyAlgorithm::RSAEncrypt
            | PublicKeyAlgorithm::RSASign => Ok(EskBytes::Rsa {
                mpi: Mpi::from_buf(i)?,
            }),
            PublicKeyAlgorithm::Elgamal => Ok(EskBytes::Elgamal {
                first: Mpi::from_buf(i)?,
                second: Mpi::from_buf(i)?,
            }),
            PublicKeyAlgorithm::ECDH => {
                let public_point = Mpi::from_buf(i)?;
                let len = i.read_u8()?;
                let encrypted_session_key = i.take_bytes(len as usize)?;
                Ok(EskBytes::Ecdh {
                    public_point,
                    encrypted_session_key,
                })
            }
            _ => Ok(EskBytes::Other { data: i.rest() }),
        }
    }
}

impl Serialize for EskBytes {
    fn to_writer<W: io::Write>(&self, writer: &mut W) -> Result<()> {
        match self {
            EskBytes::Rsa { mpi } => mpi.to_writer(writer),
            EskBytes::Elgamal { first, second } => {
                first.to_writer(writer)?;
                second.to_writer(writer)
            }
            EskBytes::Ecdh {
                public_point,
                encrypted_session_key,
            } => {
                public_point.to_writer(writer)?;
                writer.write_all(&[encrypted_session_key.len() as u8])?;
                writer.write_all(encrypted_session_key)?;
                Ok(())
            }
            EskBytes::Other { data } => {
                writer.write_all(data)?;
                Ok(())
            }
        }
    }
}
