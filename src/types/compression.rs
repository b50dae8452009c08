use num_enum::{FromPrimitive, IntoPrimitive};

/// Available compression algorithms.
/// Ref: <https://tools.ietf.org/html/rfc4880.html#section-9.3>
#[derive(Debug, PartialEq, Eq, Copy, Clone, FromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum CompressionAlgorithm {
    Uncompressed = 0,
    ZIP = 1,
    ZLIB = 2,
    BZip2 = 3,

    #[num_enum(catch_all)]
    Other(u8),
}

impl Default for CompressionAlgorithm {
    fn default() -> Self {
        Self::Uncompressed
    }
}
