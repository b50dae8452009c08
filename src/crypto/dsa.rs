use dsa::{Components, KeySize, Signature, SigningKey, VerifyingKey};
use num_bigint::BigUint;
use rand::{CryptoRng, Rng};
use signature::hazmat::PrehashVerifier;

use crate::crypto::hash::HashAlgorithm;
use crate::errors::{format_err, unimplemented_err, Result};
use crate::types::{DsaSecretKey, Mpi, PlainSecretParams, PublicParams};

/// Generate a DSA key pair.
pub fn generate_key<R: Rng + CryptoRng>(
    rng: &mut R,
    key_size: KeySize,
) -> Result<(PublicParams, PlainSecretParams)> {
    let components = Components::generate(rng, key_size);
    let signing_key = SigningKey::generate(rng, components);
    let verifying_key = signing_key.verifying_key();
    let components = verifying_key.components();

    Ok((
        PublicParams::Dsa {
            p: components.p().into(),
            q: components.q().into(),
            g: components.g().into(),
            y: verifying_key.y().into(),
        },
        PlainSecretParams::Dsa(signing_key.x().into()),
    ))
}

fn signing_key(key: &DsaSecretKey) -> Result<SigningKey> {
    let components = Components::from_components(key.p.clone(), key.q.clone(), key.g.clone())
        .map_err(|e| format_err!("invalid dsa components: {:?}", e))?;
    let verifying_key = VerifyingKey::from_components(components, key.y.clone())
        .map_err(|e| format_err!("invalid dsa public key: {:?}", e))?;

    SigningKey::from_components(verifying_key, key.x.clone())
        .map_err(|e| format_err!("invalid dsa secret key: {:?}", e))
}

/// Sign using DSA with deterministic nonces (RFC 6979).
pub fn sign(key: &DsaSecretKey, hash: HashAlgorithm, digest: &[u8]) -> Result<Vec<Mpi>> {
    let signing_key = signing_key(key)?;

    let signature = match hash {
        HashAlgorithm::Sha1 => signing_key.sign_prehashed_rfc6979::<sha1::Sha1>(digest),
        HashAlgorithm::Sha256 => signing_key.sign_prehashed_rfc6979::<sha2::Sha256>(digest),
        HashAlgorithm::Sha384 => signing_key.sign_prehashed_rfc6979::<sha2::Sha384>(digest),
        HashAlgorithm::Sha512 => signing_key.sign_prehashed_rfc6979::<sha2::Sha512>(digest),
        HashAlgorithm::Sha224 => signing_key.sign_prehashed_rfc6979::<sha2::Sha224>(digest),
        _ => unimplemented_err!("dsa signing with hash {:?}", hash),
    }?;

    Ok(vec![
        Mpi::from_slice(&signature.r().to_bytes_be()),
        Mpi::from_slice(&signature.s().to_bytes_be()),
    ])
}

/// Verify a DSA signature.
pub fn verify(p: &Mpi, q: &Mpi, g: &Mpi, y: &Mpi, hashed: &[u8], sig: &[Mpi]) -> Result<()> {
    crate::errors::ensure_eq!(sig.len(), 2, "invalid signature");

    let components = Components::from_components(
        BigUint::from(p),
        BigUint::from(q),
        BigUint::from(g),
    )
    .map_err(|e| format_err!("invalid dsa components: {:?}", e))?;
    let verifying_key = VerifyingKey::from_components(components, BigUint::from(y))
        .map_err(|e| format_err!("invalid dsa public key: {:?}", e))?;

    let signature = Signature::from_components(BigUint::from(&sig[0]), BigUint::from(&sig[1]))
        .map_err(|e| format_err!("invalid dsa signature: {:?}", e))?;

    verifying_key.verify_prehash(hashed, &signature)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::*;
    use crate::types::SecretKeyRepr;

    #[test]
    #[ignore] // parameter generation is slow in debug mode
    fn sign_verify_roundtrip() {
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let (public, secret) = generate_key(&mut rng, KeySize::DSA_2048_256).unwrap();

        let (p, q, g, y) = match &public {
            PublicParams::Dsa { p, q, g, y } => (p.clone(), q.clone(), g.clone(), y.clone()),
            _ => panic!("invalid key generated"),
        };

        let key = match secret.as_repr(&public).unwrap() {
            SecretKeyRepr::Dsa(key) => key,
            _ => panic!("invalid key generated"),
        };

        let digest = HashAlgorithm::Sha256.digest(b"hello world").unwrap();
        let sig = sign(&key, HashAlgorithm::Sha256, &digest).unwrap();
        verify(&p, &q, &g, &y, &digest, &sig).unwrap();

        let other = HashAlgorithm::Sha256.digest(b"hello world!").unwrap();
        assert!(verify(&p, &q, &g, &y, &other, &sig).is_err());
    }
}
