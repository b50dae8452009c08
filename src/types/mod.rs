mod compression;
mod esk;
mod fingerprint;
mod key_id;
mod key_traits;
mod mpi;
mod params;
mod s2k;
mod secret_key_repr;

pub use self::compression::*;
pub use self::esk::*;
pub use self::fingerprint::*;
pub use self::key_id::*;
pub use self::key_traits::*;
pub use self::mpi::*;
pub use self::params::*;
pub use self::s2k::*;
pub use self::secret_key_repr::*;

use num_enum::{FromPrimitive, IntoPrimitive};

/// Packet tags.
/// Ref: <https://tools.ietf.org/html/rfc4880.html#section-4.3>
#[derive(Debug, PartialEq, Eq, Copy, Clone, Hash, FromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum Tag {
    PublicKeyEncryptedSessionKey = 1,
    Signature = 2,
    SymKeyEncryptedSessionKey = 3,
    OnePassSignature = 4,
    SecretKey = 5,
    PublicKey = 6,
    SecretSubkey = 7,
    CompressedData = 8,
    SymEncryptedData = 9,
    Marker = 10,
    Literal = 11,
    Trust = 12,
    UserId = 13,
    PublicSubkey = 14,
    UserAttribute = 17,
    SymEncryptedProtectedData = 18,
    ModDetectionCode = 19,
    AeadEncryptedData = 20,

    #[num_enum(catch_all)]
    Other(u8),
}

/// Key versions.
/// V2 and V3 are the legacy formats, V4 the current one.
#[derive(Debug, PartialEq, Eq, Copy, Clone, Hash)]
#[repr(u8)]
pub enum KeyVersion {
    V2 = 2,
    V3 = 3,
    V4 = 4,
}

impl KeyVersion {
    pub fn try_from_u8(version: u8) -> Option<Self> {
        match version {
            2 => Some(KeyVersion::V2),
            3 => Some(KeyVersion::V3),
            4 => Some(KeyVersion::V4),
            _ => None,
        }
    }

    /// Legacy keys carry an expiration in days directly in the key packet.
    pub fn is_legacy(self) -> bool {
        matches!(self, KeyVersion::V2 | KeyVersion::V3)
    }
}

/// Packet header framing style.
#[derive(Debug, Default, PartialEq, Eq, Copy, Clone)]
pub enum PacketHeaderVersion {
    /// Old format ("legacy")
    Old,
    /// New format
    #[default]
    New,
}
