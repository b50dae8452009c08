use elliptic_curve::sec1::ToEncodedPoint;
use log::debug;
use rand::{CryptoRng, Rng};
use zeroize::{Zeroize, Zeroizing};

use crate::crypto::aes_kw;
use crate::crypto::ecc_curve::EccCurve;
use crate::crypto::hash::HashAlgorithm;
use crate::crypto::public_key::PublicKeyAlgorithm;
use crate::crypto::sym::SymmetricKeyAlgorithm;
use crate::errors::{bail, ensure, ensure_eq, unsupported_err, Result};
use crate::types::{EcdhSecretKey, Mpi, PlainSecretParams, PublicParams};

/// 20 octets representing "Anonymous Sender    ".
const ANON_SENDER: [u8; 20] = [
    0x41, 0x6E, 0x6F, 0x6E, 0x79, 0x6D, 0x6F, 0x75, 0x73, 0x20, 0x53, 0x65, 0x6E, 0x64, 0x65,
    0x72, 0x20, 0x20, 0x20, 0x20,
];

/// Generate an ECDH key pair.
pub fn generate_key<R: Rng + CryptoRng>(
    rng: &mut R,
    curve: &EccCurve,
) -> Result<(PublicParams, PlainSecretParams)> {
    let hash = HashAlgorithm::Sha256;
    let alg_sym = SymmetricKeyAlgorithm::AES128;

    match curve {
        EccCurve::Curve25519 => {
            let mut secret_key_bytes = Zeroizing::new([0u8; 32]);
            rng.fill_bytes(&mut *secret_key_bytes);

            let secret = x25519_dalek::StaticSecret::from(*secret_key_bytes);
            let public = x25519_dalek::PublicKey::from(&secret);

            // native point format, prefixed with 0x40
            let mut p = Vec::with_capacity(33);
            p.push(0x40);
            p.extend_from_slice(&public.as_bytes()[..]);

            // secret scalars are stored big endian
            let q = secret.to_bytes().iter().rev().cloned().collect::<Vec<u8>>();

            Ok((
                PublicParams::Ecdh {
                    curve: EccCurve::Curve25519,
                    p: Mpi::from_raw(p),
                    hash,
                    alg_sym,
                },
                PlainSecretParams::Ecdh(Mpi::from_slice(&q)),
            ))
        }
        EccCurve::P256 => {
            let secret = p256::SecretKey::random(rng);
            let public = secret.public_key();

            Ok((
                PublicParams::Ecdh {
                    curve: EccCurve::P256,
                    p: Mpi::from_slice(public.to_encoded_point(false).as_bytes()),
                    hash,
                    alg_sym,
                },
                PlainSecretParams::Ecdh(Mpi::from_slice(&secret.to_bytes())),
            ))
        }
        EccCurve::P384 => {
            let secret = p384::SecretKey::random(rng);
            let public = secret.public_key();

            Ok((
                PublicParams::Ecdh {
                    curve: EccCurve::P384,
                    p: Mpi::from_slice(public.to_encoded_point(false).as_bytes()),
                    hash: HashAlgorithm::Sha384,
                    alg_sym: SymmetricKeyAlgorithm::AES192,
                },
                PlainSecretParams::Ecdh(Mpi::from_slice(&secret.to_bytes())),
            ))
        }
        _ => unsupported_err!("curve {:?} for ECDH", curve.to_string()),
    }
}

/// Build the KDF parameter block (as defined in RFC 6637).
/// Ref: <https://tools.ietf.org/html/rfc6637#section-8>
pub fn build_ecdh_param(
    oid: &[u8],
    alg_sym: SymmetricKeyAlgorithm,
    hash: HashAlgorithm,
    fingerprint: &[u8],
) -> Vec<u8> {
    let kdf_params = vec![
        0x03, // length of the following fields
        0x01, // reserved for future extensions
        hash.into(),
        alg_sym.into(),
    ];

    let oid_len = [oid.len() as u8];
    let alg_ecdh = [u8::from(PublicKeyAlgorithm::ECDH)];

    let values: Vec<&[u8]> = vec![
        &oid_len,
        oid,
        &alg_ecdh,
        &kdf_params,
        &ANON_SENDER[..],
        fingerprint,
    ];

    values.concat()
}

/// Key Derivation Function for ECDH (as defined in RFC 6637).
/// Ref: <https://tools.ietf.org/html/rfc6637#section-7>
fn kdf(hash: HashAlgorithm, x: &[u8], length: usize, param: &[u8]) -> Result<Vec<u8>> {
    let prefix = vec![0, 0, 0, 1];

    let values: Vec<&[u8]> = vec![&prefix, x, param];
    let data = values.concat();

    let mut digest = hash.digest(&data)?;
    digest.truncate(length);

    Ok(digest)
}

/// PKCS5 style padding to a multiple of 8 octets: always appends
/// between 1 and 8 octets whose value is the number of octets appended.
fn pad(plain: &[u8]) -> Vec<u8> {
    let n = 8 - plain.len() % 8;
    let mut padded = plain.to_vec();
    padded.resize(plain.len() + n, n as u8);
    padded
}

fn unpad(mut padded: Vec<u8>) -> Result<Vec<u8>> {
    ensure!(
        !padded.is_empty() && padded.len() % 8 == 0,
        "invalid padded key length {}",
        padded.len()
    );
    let n = padded[padded.len() - 1] as usize;
    ensure!(n >= 1 && n <= 8 && n < padded.len(), "invalid padding");
    padded.truncate(padded.len() - n);
    Ok(padded)
}

fn shared_secret(priv_key: &EcdhSecretKey, ephemeral: &[u8]) -> Result<Zeroizing<Vec<u8>>> {
    // secret scalars are stored as MPIs and may have lost leading zeros
    let field_len = match priv_key.curve {
        EccCurve::Curve25519 | EccCurve::P256 => 32,
        EccCurve::P384 => 48,
        _ => unsupported_err!("curve {:?} for ECDH", priv_key.curve.to_string()),
    };
    ensure!(priv_key.secret.len() <= field_len, "invalid secret scalar");
    let mut secret_be = Zeroizing::new(vec![0u8; field_len - priv_key.secret.len()]);
    secret_be.extend_from_slice(&priv_key.secret);

    match priv_key.curve {
        EccCurve::Curve25519 => {
            ensure_eq!(ephemeral.len(), 33, "invalid public point");
            ensure_eq!(ephemeral[0], 0x40, "invalid public point prefix");

            let mut their_public = [0u8; 32];
            their_public.copy_from_slice(&ephemeral[1..]);
            let their_public = x25519_dalek::PublicKey::from(their_public);

            // scalar is stored big endian, x25519 wants little endian
            let mut private_arr = [0u8; 32];
            for (i, b) in secret_be.iter().rev().enumerate() {
                private_arr[i] = *b;
            }

            let our_secret = x25519_dalek::StaticSecret::from(private_arr);
            private_arr.zeroize();

            let shared = our_secret.diffie_hellman(&their_public);
            Ok(Zeroizing::new(shared.as_bytes().to_vec()))
        }
        EccCurve::P256 => {
            let secret = p256::SecretKey::from_slice(&secret_be)?;
            let public = p256::PublicKey::from_sec1_bytes(ephemeral)?;
            let shared = elliptic_curve::ecdh::diffie_hellman(
                secret.to_nonzero_scalar(),
                public.as_affine(),
            );
            Ok(Zeroizing::new(shared.raw_secret_bytes().to_vec()))
        }
        EccCurve::P384 => {
            let secret = p384::SecretKey::from_slice(&secret_be)?;
            let public = p384::PublicKey::from_sec1_bytes(ephemeral)?;
            let shared = elliptic_curve::ecdh::diffie_hellman(
                secret.to_nonzero_scalar(),
                public.as_affine(),
            );
            Ok(Zeroizing::new(shared.raw_secret_bytes().to_vec()))
        }
        _ => unsupported_err!("curve {:?} for ECDH", priv_key.curve.to_string()),
    }
}

/// ECDH decryption.
pub fn decrypt(
    priv_key: &EcdhSecretKey,
    public_point: &Mpi,
    encrypted_session_key: &[u8],
    fingerprint: &[u8],
) -> Result<Vec<u8>> {
    debug!("ECDH decrypt");

    let param = build_ecdh_param(&priv_key.oid, priv_key.alg_sym, priv_key.hash, fingerprint);

    // native points carry a 0x40 prefix, SEC1 points an 0x04 prefix;
    // both are non zero, so the minimal MPI encoding keeps them intact
    let shared = shared_secret(priv_key, public_point.as_bytes())?;

    let z = kdf(
        priv_key.hash,
        &shared,
        priv_key.alg_sym.key_size(),
        &param,
    )?;

    let decrypted = aes_kw::unwrap(&z, encrypted_session_key)?;
    unpad(decrypted.to_vec())
}

/// ECDH encryption. Returns the ephemeral public point and the wrapped
/// session key.
pub fn encrypt<R: CryptoRng + Rng>(
    rng: &mut R,
    curve: &EccCurve,
    alg_sym: SymmetricKeyAlgorithm,
    hash: HashAlgorithm,
    fingerprint: &[u8],
    q: &[u8],
    plain: &[u8],
) -> Result<(Mpi, Vec<u8>)> {
    debug!("ECDH encrypt");

    ensure!(plain.len() < 240, "plaintext too long for ecdh wrapping");

    let param = build_ecdh_param(&curve.oid(), alg_sym, hash, fingerprint);

    let (our_public, shared) = match curve {
        EccCurve::Curve25519 => {
            ensure_eq!(q.len(), 33, "invalid public key");
            ensure_eq!(q[0], 0x40, "invalid public key prefix");

            let mut their_public = [0u8; 32];
            their_public.copy_from_slice(&q[1..]);
            let their_public = x25519_dalek::PublicKey::from(their_public);

            let mut secret_bytes = Zeroizing::new([0u8; 32]);
            rng.fill_bytes(&mut *secret_bytes);
            let our_secret = x25519_dalek::StaticSecret::from(*secret_bytes);

            let shared = our_secret.diffie_hellman(&their_public);

            let mut encoded = Vec::with_capacity(33);
            encoded.push(0x40);
            encoded.extend_from_slice(x25519_dalek::PublicKey::from(&our_secret).as_bytes());

            (encoded, Zeroizing::new(shared.as_bytes().to_vec()))
        }
        EccCurve::P256 => {
            let their_public = p256::PublicKey::from_sec1_bytes(q)?;
            let our_secret = p256::SecretKey::random(rng);
            let shared = elliptic_curve::ecdh::diffie_hellman(
                our_secret.to_nonzero_scalar(),
                their_public.as_affine(),
            );
            let encoded = our_secret
                .public_key()
                .to_encoded_point(false)
                .as_bytes()
                .to_vec();
            (encoded, Zeroizing::new(shared.raw_secret_bytes().to_vec()))
        }
        EccCurve::P384 => {
            let their_public = p384::PublicKey::from_sec1_bytes(q)?;
            let our_secret = p384::SecretKey::random(rng);
            let shared = elliptic_curve::ecdh::diffie_hellman(
                our_secret.to_nonzero_scalar(),
                their_public.as_affine(),
            );
            let encoded = our_secret
                .public_key()
                .to_encoded_point(false)
                .as_bytes()
                .to_vec();
            (encoded, Zeroizing::new(shared.raw_secret_bytes().to_vec()))
        }
        _ => bail!("unsupported curve {:?} for ECDH", curve.to_string()),
    };

    let z = kdf(hash, &shared, alg_sym.key_size(), &param)?;
    let wrapped = aes_kw::wrap(&z, &pad(plain))?;

    Ok((Mpi::from_raw(our_public), wrapped))
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::*;
    use crate::types::SecretKeyRepr;

    #[test]
    fn pad_unpad() {
        for len in 1..40 {
            let data = vec![0xAAu8; len];
            let padded = pad(&data);
            assert_eq!(padded.len() % 8, 0);
            assert!(padded.len() > data.len());
            assert_eq!(unpad(padded).unwrap(), data);
        }
    }

    #[test]
    fn encrypt_decrypt_roundtrip() {
        let mut rng = ChaCha8Rng::seed_from_u64(0);

        for curve in [EccCurve::Curve25519, EccCurve::P256, EccCurve::P384] {
            let (public, secret) = generate_key(&mut rng, &curve).unwrap();

            let (q, hash, alg_sym) = match &public {
                PublicParams::Ecdh {
                    p, hash, alg_sym, ..
                } => (p.clone(), *hash, *alg_sym),
                _ => panic!("invalid key generated"),
            };

            let fingerprint = [7u8; 20];
            let plain = b"\x09sixteen byte key";

            let (point, wrapped) = encrypt(
                &mut rng,
                &curve,
                alg_sym,
                hash,
                &fingerprint,
                q.as_bytes(),
                plain,
            )
            .unwrap();

            let priv_key = match secret.as_repr(&public).unwrap() {
                SecretKeyRepr::Ecdh(key) => key,
                _ => panic!("invalid key generated"),
            };

            let decrypted = decrypt(&priv_key, &point, &wrapped, &fingerprint).unwrap();
            assert_eq!(decrypted, plain, "curve {:?}", curve);
        }
    }
}
