//! Composed structures: messages, cleartext signed messages and keys,
//! assembled out of packet sequences.

mod cleartext;
mod key;
mod message;
mod shared;
mod signature;

pub use self::cleartext::*;
pub use self::key::*;
pub use self::message::*;
pub use self::shared::*;
pub use self::signature::*;
