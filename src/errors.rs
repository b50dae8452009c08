use std::num::TryFromIntError;

use snafu::Snafu;

pub type Result<T, E = Error> = ::std::result::Result<T, E>;

/// Error types
#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("invalid input"))]
    InvalidInput,
    #[snafu(display("{message}"))]
    Message { message: String },
    #[snafu(display("Not yet implemented: {message}"))]
    Unimplemented { message: String },
    /// Signals packet versions and parameters we don't support, but can safely ignore.
    #[snafu(display("Unsupported: {message}"))]
    Unsupported { message: String },

    #[snafu(display("malformed packet: {message}"))]
    MalformedPacket { message: String },
    #[snafu(display("invalid packet content: {source:?}"))]
    InvalidPacketContent { source: Box<Error> },
    #[snafu(display("no matching packet found"))]
    NoMatchingPacket,

    #[snafu(display("invalid armor wrappers"))]
    InvalidArmorWrappers,
    #[snafu(display("unknown armor type: {typ}"))]
    UnknownArmorType { typ: String },
    #[snafu(display("improperly formatted armor header: {line:?}"))]
    InvalidArmorHeader { line: String },
    #[snafu(display("unexpected armor header {key:?}: only \"Hash\" is allowed here"))]
    UnexpectedArmorHeader { key: String },
    #[snafu(display("unknown hash algorithm in armor header: {name:?}"))]
    UnknownHashAlgorithm { name: String },
    #[snafu(display(
        "hash algorithm {algorithm} of the signature does not match the armor Hash header"
    ))]
    HashAlgorithmMismatch { algorithm: String },
    #[snafu(display(
        "no Hash armor header present, but signature uses {algorithm} (only MD5 is implied)"
    ))]
    MissingHashHeader { algorithm: String },
    #[snafu(display("invalid crc24 checksum"))]
    InvalidChecksum,

    #[snafu(display("Modification Detection Code mismatch"))]
    MdcError,
    #[snafu(display(
        "missing Modification Detection Code for modern cipher {algorithm}: refusing to decrypt"
    ))]
    MissingMdc { algorithm: String },
    #[snafu(display("GCM"))]
    Gcm,
    #[snafu(display("EAX"))]
    Eax,
    #[snafu(display("OCB"))]
    Ocb,

    #[snafu(display("secret key material is locked: decrypt it with the passphrase first"))]
    LockedKey,
    #[snafu(display("secret key material has been stripped from this key (gnu-dummy)"))]
    NoSecretMaterial,
    #[snafu(display("incompatible key merge: {message}"))]
    IncompatibleKeyMerge { message: String },
    #[snafu(display("fingerprints do not match: refusing to merge distinct keys"))]
    FingerprintMismatch,
    #[snafu(display("no recipients: supply public keys, passwords or a session key"))]
    NoRecipients,
    #[snafu(display("invalid user id: {value:?}"))]
    InvalidUserId { value: String },
    #[snafu(display("missing key"))]
    MissingKey,

    #[snafu(display("invalid key length"))]
    InvalidKeyLength,
    #[snafu(display("cfb: invalid key iv length"))]
    CfbInvalidKeyIvLength,
    #[snafu(display("Unpadding failed"))]
    UnpadError,
    #[snafu(display("Padding failed"))]
    PadError,

    #[snafu(transparent)]
    RsaError { source: rsa::errors::Error },
    #[snafu(transparent)]
    EllipticCurve { source: elliptic_curve::Error },
    #[snafu(transparent)]
    SignatureError { source: signature::Error },
    #[snafu(transparent)]
    Base64Decode { source: base64::DecodeError },
    #[snafu(transparent)]
    Io { source: std::io::Error },
    #[snafu(transparent)]
    Utf8Error { source: std::str::Utf8Error },
    #[snafu(transparent)]
    FromUtf8Error { source: std::string::FromUtf8Error },
    #[snafu(transparent)]
    ParseIntError { source: std::num::ParseIntError },
    #[snafu(transparent)]
    TryFromInt { source: TryFromIntError },
    #[snafu(transparent)]
    AesKw { source: aes_kw::Error },
}

impl From<String> for Error {
    fn from(message: String) -> Error {
        Error::Message { message }
    }
}

impl From<cipher::InvalidLength> for Error {
    fn from(_: cipher::InvalidLength) -> Error {
        Error::CfbInvalidKeyIvLength
    }
}

impl From<block_padding::UnpadError> for Error {
    fn from(_: block_padding::UnpadError) -> Error {
        Error::UnpadError
    }
}

impl From<derive_builder::UninitializedFieldError> for Error {
    fn from(err: derive_builder::UninitializedFieldError) -> Error {
        Error::Message {
            message: err.to_string(),
        }
    }
}

#[macro_export]
macro_rules! unimplemented_err {
    ($e:expr) => {
        return Err($crate::errors::Error::Unimplemented { message: $e.to_string() })
    };
    ($fmt:expr, $($arg:tt)+) => {
        return Err($crate::errors::Error::Unimplemented { message: format!($fmt, $($arg)+)})
    };
}

#[macro_export]
macro_rules! unsupported_err {
    ($e:expr) => {
        return Err($crate::errors::Error::Unsupported { message: $e.to_string()})
    };
    ($fmt:expr, $($arg:tt)+) => {
        return Err($crate::errors::Error::Unsupported { message: format!($fmt, $($arg)+) })
    };
}

#[macro_export]
macro_rules! bail {
    ($e:expr) => {
        return Err($crate::errors::Error::Message { message: $e.to_string() })
    };
    ($fmt:expr, $($arg:tt)+) => {
        return Err($crate::errors::Error::Message { message: format!($fmt, $($arg)+) })
    };
}

#[macro_export]
macro_rules! format_err {
    ($e:expr) => {
        $crate::errors::Error::Message { message: $e.to_string() }
    };
    ($fmt:expr, $($arg:tt)+) => {
        $crate::errors::Error::Message { message: format!($fmt, $($arg)+) }
    };
}

#[macro_export]
macro_rules! ensure {
    ($cond:expr, $e:expr) => {
        if !($cond) {
            $crate::bail!($e);
        }
    };
    ($cond:expr, $fmt:expr, $($arg:tt)+) => {
        if !($cond) {
            $crate::bail!($fmt, $($arg)+);
        }
    };
}

#[macro_export]
macro_rules! ensure_eq {
    ($left:expr, $right:expr) => ({
        match (&$left, &$right) {
            (left_val, right_val) => {
                if !(*left_val == *right_val) {
                    $crate::bail!(r#"assertion failed: `(left == right)`
  left: `{:?}`,
 right: `{:?}`"#, left_val, right_val)
                }
            }
        }
    });
    ($left:expr, $right:expr,) => ({
        $crate::ensure_eq!($left, $right)
    });
    ($left:expr, $right:expr, $($arg:tt)+) => ({
        match (&($left), &($right)) {
            (left_val, right_val) => {
                if !(*left_val == *right_val) {
                    $crate::bail!(r#"assertion failed: `(left == right)`
  left: `{:?}`,
 right: `{:?}`: {}"#, left_val, right_val,
                           format_args!($($arg)+))
                }
            }
        }
    });
}

#[macro_export]
macro_rules! err_opt {
    ($e:expr) => {
        match $e {
            Ok(v) => v,
            Err(err) => return Some(Err(err)),
        }
    };
}

pub use crate::{bail, ensure, ensure_eq, err_opt, format_err, unimplemented_err, unsupported_err};
