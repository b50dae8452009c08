use log::warn;

use crate::armor::BlockType;
use crate::composed::key::{Key, PrimaryKey, SubKey, SubkeyPacket, User, UserContent};
use crate::composed::shared::{Deserializable, PacketIter};
use crate::errors::{bail, Error, Result};
use crate::packet::{Packet, SignatureType};
use crate::types::KeyTrait;

impl Deserializable for Key {
    fn matches_block_type(typ: BlockType) -> bool {
        matches!(typ, BlockType::PublicKey | BlockType::PrivateKey)
    }

    fn starts_item(packet: &Packet) -> bool {
        matches!(packet, Packet::PublicKey(_) | Packet::SecretKey(_))
    }

    /// Assemble one key out of the packet stream: the primary key
    /// packet, followed by signatures, users and subkeys, up to the
    /// next primary key packet.
    fn from_packets(packets: &mut PacketIter) -> Result<Self> {
        let primary_key = match packets.next() {
            Some(Packet::PublicKey(key)) => PrimaryKey::Public(key),
            Some(Packet::SecretKey(key)) => PrimaryKey::Secret(key),
            Some(packet) => {
                return Err(Error::MalformedPacket {
                    message: format!("unexpected packet {:?} instead of a primary key", packet.tag()),
                })
            }
            None => return Err(Error::NoMatchingPacket),
        };

        let mut key = Key {
            primary_key,
            revocation_signatures: Vec::new(),
            direct_signatures: Vec::new(),
            users: Vec::new(),
            subkeys: Vec::new(),
        };

        enum Position {
            PrimaryKey,
            User(usize),
            Subkey(usize),
        }

        let mut position = Position::PrimaryKey;

        while let Some(packet) = packets.peek() {
            if Self::starts_item(packet) {
                break;
            }

            let packet = packets.next().expect("peeked");
            match packet {
                Packet::Signature(sig) => match position {
                    Position::PrimaryKey => match sig.typ() {
                        SignatureType::KeyRevocation => key.revocation_signatures.push(sig),
                        _ => key.direct_signatures.push(sig),
                    },
                    Position::User(index) => {
                        let user = &mut key.users[index];
                        let primary_id = key.primary_key.key_id();

                        if sig.typ() == SignatureType::CertRevocation {
                            user.revocation_signatures.push(sig);
                        } else if sig.typ().is_certification() {
                            let self_signed = match sig.issuer() {
                                Some(issuer) => issuer == &primary_id,
                                // missing issuer: assume a self signature
                                None => true,
                            };
                            if self_signed {
                                user.self_certifications.push(sig);
                            } else {
                                user.other_certifications.push(sig);
                            }
                        } else {
                            warn!("ignoring signature {:?} after user packet", sig.typ());
                        }
                    }
                    Position::Subkey(index) => {
                        let subkey = &mut key.subkeys[index];
                        match sig.typ() {
                            SignatureType::SubkeyBinding | SignatureType::KeyBinding => {
                                subkey.binding_signatures.push(sig)
                            }
                            SignatureType::SubkeyRevocation => {
                                subkey.revocation_signatures.push(sig)
                            }
                            typ => {
                                warn!("ignoring signature {:?} after subkey packet", typ);
                            }
                        }
                    }
                },
                Packet::UserId(id) => {
                    key.users.push(User {
                        content: UserContent::Id(id),
                        self_certifications: Vec::new(),
                        other_certifications: Vec::new(),
                        revocation_signatures: Vec::new(),
                    });
                    position = Position::User(key.users.len() - 1);
                }
                Packet::UserAttribute(attr) => {
                    key.users.push(User {
                        content: UserContent::Attribute(attr),
                        self_certifications: Vec::new(),
                        other_certifications: Vec::new(),
                        revocation_signatures: Vec::new(),
                    });
                    position = Position::User(key.users.len() - 1);
                }
                Packet::PublicSubkey(subkey) => {
                    key.subkeys.push(SubKey {
                        key: SubkeyPacket::Public(subkey),
                        binding_signatures: Vec::new(),
                        revocation_signatures: Vec::new(),
                    });
                    position = Position::Subkey(key.subkeys.len() - 1);
                }
                Packet::SecretSubkey(subkey) => {
                    key.subkeys.push(SubKey {
                        key: SubkeyPacket::Secret(subkey),
                        binding_signatures: Vec::new(),
                        revocation_signatures: Vec::new(),
                    });
                    position = Position::Subkey(key.subkeys.len() - 1);
                }
                Packet::Trust(_) => {
                    // implementation specific, ignored on import
                }
                packet => {
                    bail!("unexpected packet in key block: {:?}", packet.tag());
                }
            }
        }

        Ok(key)
    }
}
