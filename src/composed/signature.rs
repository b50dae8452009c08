use std::io;

use crate::armor::{self, BlockType, Headers};
use crate::composed::key::Key;
use crate::composed::message::SignatureVerification;
use crate::composed::shared::{Deserializable, PacketIter};
use crate::config::Config;
use crate::crypto::hash::HashAlgorithm;
use crate::errors::{Error, Result};
use crate::packet::{
    write_packet, Packet, Signature, SignatureConfig, SignatureType,
};
use crate::ser::Serialize;
use crate::types::KeyTrait;

/// One or more bare signature packets, independent of the signed data:
/// the detached signature form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetachedSignature {
    pub signatures: Vec<Signature>,
}

impl DetachedSignature {
    /// Create a detached signature over `data` with each of the given
    /// keys.
    pub fn sign(
        config: &Config,
        data: &[u8],
        keys: &[&Key],
        hash_algorithm: HashAlgorithm,
        text_mode: bool,
    ) -> Result<Self> {
        let typ = if text_mode {
            SignatureType::Text
        } else {
            SignatureType::Binary
        };

        let mut signatures = Vec::with_capacity(keys.len());
        for key in keys {
            let signing_key = key.signing_key(config).ok_or(Error::MissingKey)?;
            let sig_config = SignatureConfig::v4(
                typ,
                signing_key.algorithm(),
                hash_algorithm,
                signing_key.key_id(),
            );
            signatures.push(sig_config.sign(&signing_key, data)?);
        }

        Ok(DetachedSignature { signatures })
    }

    /// Check each signature against the supplied keys, in signature
    /// order. Unknown issuers map to `valid: None`.
    pub fn verify(&self, data: &[u8], keys: &[&Key]) -> Vec<SignatureVerification> {
        self.signatures
            .iter()
            .map(|sig| {
                let issuer = sig.issuer().copied();

                let mut verification = SignatureVerification {
                    key_id: issuer,
                    valid: None,
                };

                if let Some(issuer) = &issuer {
                    for key in keys {
                        let mut matched = false;
                        let mut valid = false;

                        if key.primary_key.key_id() == *issuer {
                            matched = true;
                            valid |= sig.verify(&key.primary_key, data).is_ok();
                        }
                        for sk in &key.subkeys {
                            if sk.key.key_id() == *issuer {
                                matched = true;
                                valid |= sig.verify(&sk.key, data).is_ok();
                            }
                        }

                        if matched {
                            verification.valid = Some(valid);
                            break;
                        }
                    }
                }

                verification
            })
            .collect()
    }

    pub fn to_armored_writer(
        &self,
        writer: &mut impl io::Write,
        headers: Option<&Headers>,
        config: &Config,
    ) -> Result<()> {
        armor::write(self, BlockType::Signature, writer, headers, config)
    }

    pub fn to_armored_string(&self, headers: Option<&Headers>, config: &Config) -> Result<String> {
        let mut buf = Vec::new();
        self.to_armored_writer(&mut buf, headers, config)?;
        Ok(String::from_utf8(buf)?)
    }
}

impl Serialize for DetachedSignature {
    fn to_writer<W: io::Write>(&self, writer: &mut W) -> Result<()> {
        for sig in &self.signatures {
            write_packet(writer, sig)?;
        }
        Ok(())
    }
}

impl Deserializable for DetachedSignature {
    fn matches_block_type(typ: BlockType) -> bool {
        matches!(typ, BlockType::Signature)
    }

    fn starts_item(packet: &Packet) -> bool {
        matches!(packet, Packet::Signature(_))
    }

    fn from_packets(packets: &mut PacketIter) -> Result<Self> {
        let mut signatures = Vec::new();

        while let Some(Packet::Signature(_)) = packets.peek() {
            match packets.next() {
                Some(Packet::Signature(sig)) => signatures.push(sig),
                _ => unreachable!("peeked"),
            }
        }

        if signatures.is_empty() {
            return Err(Error::NoMatchingPacket);
        }

        Ok(DetachedSignature { signatures })
    }
}
