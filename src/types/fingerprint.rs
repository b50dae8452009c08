use std::fmt;

/// Represents a key fingerprint: MD5 based for legacy (v3) keys,
/// SHA-1 based for v4 keys.
#[derive(Clone, Eq, PartialEq, Hash)]
pub enum Fingerprint {
    V3([u8; 16]),
    V4([u8; 20]),
}

impl Fingerprint {
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        match self {
            Self::V3(_) => 16,
            Self::V4(_) => 20,
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::V3(fp) => &fp[..],
            Self::V4(fp) => &fp[..],
        }
    }
}

impl AsRef<[u8]> for Fingerprint {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::V3(fp) => write!(f, "Fingerprint::V3({})", hex::encode(fp)),
            Self::V4(fp) => write!(f, "Fingerprint::V4({})", hex::encode(fp)),
        }
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.as_bytes()))
    }
}
