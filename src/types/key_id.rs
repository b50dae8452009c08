use std::fmt;

use crate::errors::{ensure_eq, Result};

/// Represents a Key ID, the low-order eight octets of the fingerprint
/// derived value.
#[derive(Clone, Copy, Eq, PartialEq, Hash)]
pub struct KeyId([u8; 8]);

impl KeyId {
    pub fn from_slice(input: &[u8]) -> Result<KeyId> {
        ensure_eq!(input.len(), 8, "invalid input length");
        let mut r = [0u8; 8];
        r.copy_from_slice(input);

        Ok(KeyId(r))
    }

    /// The all zero key id, used as an anonymous recipient marker.
    pub fn wildcard() -> KeyId {
        KeyId([0u8; 8])
    }

    pub fn is_wildcard(&self) -> bool {
        self.0 == [0u8; 8]
    }

    pub fn to_vec(&self) -> Vec<u8> {
        self.0.to_vec()
    }
}

impl AsRef<[u8]> for KeyId {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for KeyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "KeyId({})", hex::encode(self.0))
    }
}

impl fmt::Display for KeyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}
