use std::io;

use bytes::Buf;

use crate::crypto::ecc_curve::{ecc_curve_from_oid, EccCurve};
use crate::crypto::hash::HashAlgorithm;
use crate::crypto::public_key::PublicKeyAlgorithm;
use crate::crypto::sym::SymmetricKeyAlgorithm;
use crate::errors::{ensure, ensure_eq, unsupported_err, Result};
use crate::parsing::BufParsing;
use crate::ser::Serialize;
use crate::types::Mpi;

/// Algorithm specific public key material.
/// Ref: <https://tools.ietf.org/html/rfc4880.html#section-5.5.2>
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum PublicParams {
    Rsa {
        n: Mpi,
        e: Mpi,
    },
    Dsa {
        p: Mpi,
        q: Mpi,
        g: Mpi,
        y: Mpi,
    },
    Elgamal {
        p: Mpi,
        g: Mpi,
        y: Mpi,
    },
    Ecdsa {
        curve: EccCurve,
        p: Mpi,
    },
    Ecdh {
        curve: EccCurve,
        p: Mpi,
        hash: HashAlgorithm,
        alg_sym: SymmetricKeyAlgorithm,
    },
    EdDsa {
        curve: EccCurve,
        q: Mpi,
    },
}

fn read_curve<B: Buf>(i: &mut B) -> Result<EccCurve> {
    let oid_len = i.read_u8()?;
    ensure!(oid_len > 0 && oid_len < 127, "invalid curve oid length");
    let oid = i.take_bytes(oid_len as usize)?;
    Ok(ecc_curve_from_oid(&oid))
}

impl PublicParams {
    pub fn from_buf<B: Buf>(alg: PublicKeyAlgorithm, i: &mut B) -> Result<Self> {
        match alg {
            PublicKeyAlgorithm::RSA
            | PublicKeyAlgorithm::RSAEncrypt
            | PublicKeyAlgorithm::RSASign => {
                let n = Mpi::from_buf(i)?;
                let e = Mpi::from_buf(i)?;
                Ok(PublicParams::Rsa { n, e })
            }
            PublicKeyAlgorithm::DSA => {
                let p = Mpi::from_buf(i)?;
                let q = Mpi::from_buf(i)?;
                let g = Mpi::from_buf(i)?;
                let y = Mpi::from_buf(i)?;
                Ok(PublicParams::Dsa { p, q, g, y })
            }
            PublicKeyAlgorithm::Elgamal | PublicKeyAlgorithm::ElgamalSign => {
                let p = Mpi::from_buf(i)?;
                let g = Mpi::from_buf(i)?;
                let y = Mpi::from_buf(i)?;
                Ok(PublicParams::Elgamal { p, g, y })
            }
            PublicKeyAlgorithm::ECDSA => {
                let curve = read_curve(i)?;
                let p = Mpi::from_buf(i)?;
                Ok(PublicParams::Ecdsa { curve, p })
            }
            PublicKeyAlgorithm::ECDH => {
                let curve = read_curve(i)?;
                let p = Mpi::from_buf(i)?;
                // KDF parameters: length, reserved, hash, symmetric algorithm
                let kdf_len = i.read_u8()?;
                ensure_eq!(kdf_len, 3, "invalid ecdh kdf parameter length");
                let reserved = i.read_u8()?;
                ensure_eq!(reserved, 1, "invalid ecdh kdf reserved octet");
                let hash = HashAlgorithm::from(i.read_u8()?);
                let alg_sym = SymmetricKeyAlgorithm::from(i.read_u8()?);
                Ok(PublicParams::Ecdh {
                    curve,
                    p,
                    hash,
                    alg_sym,
                })
            }
            PublicKeyAlgorithm::EdDsa => {
                let curve = read_curve(i)?;
                let q = Mpi::from_buf(i)?;
                Ok(PublicParams::EdDsa { curve, q })
            }
            PublicKeyAlgorithm::Other(v) => {
                unsupported_err!("public key algorithm {}", v)
            }
        }
    }
}

impl Serialize for PublicParams {
    fn to_writer<W: io::Write>(&self, writer: &mut W) -> Result<()> {
        match self {
            PublicParams::Rsa { n, e } => {
                n.to_writer(writer)?;
                e.to_writer(writer)?;
            }
            PublicParams::Dsa { p, q, g, y } => {
                p.to_writer(writer)?;
                q.to_writer(writer)?;
                g.to_writer(writer)?;
                y.to_writer(writer)?;
            }
            PublicParams::Elgamal { p, g, y } => {
                p.to_writer(writer)?;
                g.to_writer(writer)?;
                y.to_writer(writer)?;
            }
            PublicParams::Ecdsa { curve, p } => {
                let oid = curve.oid();
                writer.write_all(&[oid.len() as u8])?;
                writer.write_all(&oid)?;
                p.to_writer(writer)?;
            }
            PublicParams::Ecdh {
                curve,
                p,
                hash,
                alg_sym,
            } => {
                let oid = curve.oid();
                writer.write_all(&[oid.len() as u8])?;
                writer.write_all(&oid)?;
                p.to_writer(writer)?;
                writer.write_all(&[0x03, 0x01, (*hash).into(), (*alg_sym).into()])?;
            }
            PublicParams::EdDsa { curve, q } => {
                let oid = curve.oid();
                writer.write_all(&[oid.len() as u8])?;
                writer.write_all(&oid)?;
                q.to_writer(writer)?;
            }
        }

        Ok(())
    }
}
