use log::debug;
use num_bigint::{BigUint, ModInverse};
use rand::{CryptoRng, Rng};
use rsa::{Pkcs1v15Encrypt, Pkcs1v15Sign, RsaPrivateKey, RsaPublicKey};

use crate::crypto::hash::HashAlgorithm;
use crate::errors::{ensure_eq, format_err, unimplemented_err, Result};
use crate::types::{Mpi, PlainSecretParams, PublicParams};

fn sig_scheme(hash: HashAlgorithm) -> Result<Pkcs1v15Sign> {
    match hash {
        HashAlgorithm::Md5 => Ok(Pkcs1v15Sign::new::<md5::Md5>()),
        HashAlgorithm::Sha1 => Ok(Pkcs1v15Sign::new::<sha1::Sha1>()),
        HashAlgorithm::Ripemd160 => Ok(Pkcs1v15Sign::new::<ripemd::Ripemd160>()),
        HashAlgorithm::Sha256 => Ok(Pkcs1v15Sign::new::<sha2::Sha256>()),
        HashAlgorithm::Sha384 => Ok(Pkcs1v15Sign::new::<sha2::Sha384>()),
        HashAlgorithm::Sha512 => Ok(Pkcs1v15Sign::new::<sha2::Sha512>()),
        HashAlgorithm::Sha224 => Ok(Pkcs1v15Sign::new::<sha2::Sha224>()),
        _ => unimplemented_err!("rsa signing with hash {:?}", hash),
    }
}

/// RSA decryption using PKCS1v15 padding.
pub fn decrypt(priv_key: &RsaPrivateKey, mpi: &Mpi) -> Result<Vec<u8>> {
    debug!("RSA decrypt");

    let m = priv_key.decrypt(Pkcs1v15Encrypt, mpi.as_bytes())?;

    Ok(m)
}

/// RSA encryption using PKCS1v15 padding.
pub fn encrypt<R: CryptoRng + Rng>(rng: &mut R, n: &Mpi, e: &Mpi, plaintext: &[u8]) -> Result<Mpi> {
    debug!("RSA encrypt");

    let key = RsaPublicKey::new(BigUint::from(n), BigUint::from(e))?;
    let data = key.encrypt(rng, Pkcs1v15Encrypt, plaintext)?;

    Ok(Mpi::from_slice(&data))
}

/// Generate an RSA key pair.
pub fn generate_key<R: Rng + CryptoRng>(
    rng: &mut R,
    bit_size: usize,
) -> Result<(PublicParams, PlainSecretParams)> {
    use rsa::traits::{PrivateKeyParts, PublicKeyParts};

    let key = RsaPrivateKey::new(rng, bit_size)?;

    let p = &key.primes()[0];
    let q = &key.primes()[1];
    let u = p
        .clone()
        .mod_inverse(q)
        .and_then(|u| u.to_biguint())
        .ok_or_else(|| format_err!("invalid prime generated"))?;

    Ok((
        PublicParams::Rsa {
            n: key.n().into(),
            e: key.e().into(),
        },
        PlainSecretParams::Rsa {
            d: key.d().into(),
            p: p.into(),
            q: q.into(),
            u: u.into(),
        },
    ))
}

/// Verify a RSA, PKCS1v15 padded signature.
pub fn verify(n: &Mpi, e: &Mpi, hash: HashAlgorithm, hashed: &[u8], sig: &[Mpi]) -> Result<()> {
    ensure_eq!(sig.len(), 1, "invalid signature");

    let key = RsaPublicKey::new(BigUint::from(n), BigUint::from(e))?;
    // short encodings must be padded back up to the modulus size
    let sig_bytes = sig[0].to_padded(n.len());

    key.verify(sig_scheme(hash)?, hashed, &sig_bytes)?;

    Ok(())
}

/// Sign using RSA, with PKCS1v15 padding.
pub fn sign(key: &RsaPrivateKey, hash: HashAlgorithm, digest: &[u8]) -> Result<Vec<Mpi>> {
    let sig = key.sign(sig_scheme(hash)?, digest)?;

    Ok(vec![Mpi::from_slice(&sig)])
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::*;

    #[test]
    fn sign_verify_roundtrip() {
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let (public, secret) = generate_key(&mut rng, 1024).unwrap();

        let (n, e) = match &public {
            PublicParams::Rsa { n, e } => (n.clone(), e.clone()),
            _ => panic!("invalid key generated"),
        };

        let repr = secret.as_repr(&public).unwrap();
        let key = match repr {
            crate::types::SecretKeyRepr::Rsa(key) => key,
            _ => panic!("invalid key generated"),
        };

        let digest = HashAlgorithm::Sha256.digest(b"hello world").unwrap();
        let sig = sign(&key, HashAlgorithm::Sha256, &digest).unwrap();
        verify(&n, &e, HashAlgorithm::Sha256, &digest, &sig).unwrap();

        let bad_digest = HashAlgorithm::Sha256.digest(b"hello worlt").unwrap();
        assert!(verify(&n, &e, HashAlgorithm::Sha256, &bad_digest, &sig).is_err());
    }

    #[test]
    fn encrypt_decrypt_roundtrip() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let (public, secret) = generate_key(&mut rng, 1024).unwrap();

        let (n, e) = match &public {
            PublicParams::Rsa { n, e } => (n.clone(), e.clone()),
            _ => panic!("invalid key generated"),
        };

        let mpi = encrypt(&mut rng, &n, &e, b"session key bytes").unwrap();

        let key = match secret.as_repr(&public).unwrap() {
            crate::types::SecretKeyRepr::Rsa(key) => key,
            _ => panic!("invalid key generated"),
        };
        let plain = decrypt(&key, &mpi).unwrap();
        assert_eq!(plain, b"session key bytes");
    }
}
