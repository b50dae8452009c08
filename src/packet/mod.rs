//! # Packet module
//!
//! Everything in relationship to packets: framing, the per tag body
//! types and the polymorphic [`Packet`] sum type.

mod header;
mod many;
mod packet_sum;

mod aead_encrypted_data;
mod compressed_data;
mod key;
mod literal_data;
mod marker;
mod mod_detection_code;
mod one_pass_signature;
mod public_key_encrypted_session_key;
mod signature;
mod sym_encrypted_data;
mod sym_encrypted_protected_data;
mod sym_key_encrypted_session_key;
mod trust;
mod user_attribute;
mod user_id;

pub use self::aead_encrypted_data::*;
pub use self::compressed_data::*;
pub use self::header::*;
pub use self::key::*;
pub use self::literal_data::*;
pub use self::many::*;
pub use self::marker::*;
pub use self::mod_detection_code::*;
pub use self::one_pass_signature::*;
pub use self::packet_sum::*;
pub use self::public_key_encrypted_session_key::*;
pub use self::signature::*;
pub use self::sym_encrypted_data::*;
pub use self::sym_encrypted_protected_data::*;
pub use self::sym_key_encrypted_session_key::*;
pub use self::trust::*;
pub use self::user_attribute::*;
pub use self::user_id::*;

use std::io;

use crate::errors::Result;
use crate::ser::Serialize;
use crate::types::Tag;
use crate::util::write_packet_length;

pub trait PacketTrait: Serialize {
    fn tag(&self) -> Tag;
}

impl<T: PacketTrait> PacketTrait for &T {
    fn tag(&self) -> Tag {
        (*self).tag()
    }
}

/// Write a packet with a new format header.
pub fn write_packet(writer: &mut impl io::Write, packet: &impl PacketTrait) -> Result<()> {
    let body = packet.to_bytes()?;

    writer.write_all(&[0b1100_0000 | u8::from(packet.tag())])?;
    write_packet_length(body.len(), writer)?;
    writer.write_all(&body)?;

    Ok(())
}
