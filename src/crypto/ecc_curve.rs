use std::fmt;

use const_oid::ObjectIdentifier;

/// The curves relevant for OpenPGP keys.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub enum EccCurve {
    Curve25519,
    Ed25519,
    P256,
    P384,
    P521,
    Unknown(ObjectIdentifier),
}

impl EccCurve {
    /// Standard name
    pub fn name(&self) -> &str {
        match self {
            EccCurve::Curve25519 => "Curve25519",
            EccCurve::Ed25519 => "Ed25519",
            EccCurve::P256 => "NIST P-256",
            EccCurve::P384 => "NIST P-384",
            EccCurve::P521 => "NIST P-521",
            EccCurve::Unknown(_oid) => "unknown",
        }
    }

    /// IETF formatted OID
    pub fn oid_str(&self) -> String {
        match self {
            EccCurve::Curve25519 => "1.3.6.1.4.1.3029.1.5.1".into(),
            EccCurve::Ed25519 => "1.3.6.1.4.1.11591.15.1".into(),
            EccCurve::P256 => "1.2.840.10045.3.1.7".into(),
            EccCurve::P384 => "1.3.132.0.34".into(),
            EccCurve::P521 => "1.3.132.0.35".into(),
            EccCurve::Unknown(oid) => oid.to_string(),
        }
    }

    /// Nominal bit length of the curve
    pub fn nbits(&self) -> u16 {
        match self {
            EccCurve::Curve25519 => 255,
            EccCurve::Ed25519 => 255,
            EccCurve::P256 => 256,
            EccCurve::P384 => 384,
            EccCurve::P521 => 521,
            EccCurve::Unknown(_oid) => 0,
        }
    }

    /// The wire encoding of the curve OID, without the first two numbers
    /// being split.
    pub fn oid(&self) -> Vec<u8> {
        let mut id: Vec<u32> = self
            .oid_str()
            .split('.')
            // safe, these are hard coded
            .map(|v| v.parse::<u32>().expect("bad oid string"))
            .collect();

        // combine the first two
        let first = id.remove(0) * 40 + id.remove(0);
        id.insert(0, first);

        id.iter()
            .flat_map(|ident| asn1_der_object_id_val_enc(*ident))
            .collect()
    }
}

/// Get the curve for a given wire encoded oid.
pub fn ecc_curve_from_oid(oid: &[u8]) -> EccCurve {
    for curve in [
        EccCurve::Curve25519,
        EccCurve::Ed25519,
        EccCurve::P256,
        EccCurve::P384,
        EccCurve::P521,
    ] {
        if curve.oid().as_slice() == oid {
            return curve;
        }
    }

    match ObjectIdentifier::from_bytes(oid) {
        Ok(oid) => EccCurve::Unknown(oid),
        // not decodable as an oid, but keep the raw value attached to a
        // recognizable dummy so parsing can continue in tolerant mode
        Err(_) => EccCurve::Unknown(ObjectIdentifier::new_unwrap("0.0")),
    }
}

fn asn1_der_object_id_val_enc(val: u32) -> Vec<u8> {
    let mut val = val;
    let mut acc = vec![(val & 0x7f) as u8];
    val >>= 7;

    while val > 0 {
        acc.insert(0, (0x80 | (val & 0x7f)) as u8);
        val >>= 7;
    }

    acc
}

impl fmt::Display for EccCurve {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ecc_curve_to_oid() {
        assert_eq!(
            EccCurve::P256.oid(),
            vec![0x2A, 0x86, 0x48, 0xCE, 0x3D, 0x03, 0x01, 0x07]
        );
        assert_eq!(EccCurve::P384.oid(), vec![0x2B, 0x81, 0x04, 0x00, 0x22]);
        assert_eq!(EccCurve::P521.oid(), vec![0x2B, 0x81, 0x04, 0x00, 0x23]);
        assert_eq!(
            EccCurve::Ed25519.oid(),
            vec![0x2B, 0x06, 0x01, 0x04, 0x01, 0xDA, 0x47, 0x0F, 0x01]
        );
        assert_eq!(
            EccCurve::Curve25519.oid(),
            vec![0x2B, 0x06, 0x01, 0x04, 0x01, 0x97, 0x55, 0x01, 0x05, 0x01]
        );
    }

    #[test]
    fn test_ecc_curve_from_oid() {
        let one = vec![0x2A, 0x86, 0x48, 0xCE, 0x3D, 0x03, 0x01, 0x07];
        assert_eq!(ecc_curve_from_oid(one.as_slice()), EccCurve::P256);
    }

    #[test]
    fn test_asn1_der_object_id_val_enc() {
        assert_eq!(asn1_der_object_id_val_enc(840), vec![0x86, 0x48]);
        assert_eq!(asn1_der_object_id_val_enc(113_549), vec![0x86, 0xf7, 0x0d]);
    }
}
