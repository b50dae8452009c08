use std::io;
use std::str::FromStr;

use log::debug;

use crate::armor;
use crate::composed::key::Key;
use crate::composed::message::SignatureVerification;
use crate::composed::shared::Deserializable;
use crate::composed::signature::DetachedSignature;
use crate::config::Config;
use crate::crypto::hash::HashAlgorithm;
use crate::errors::{Error, Result};
use crate::packet::{Signature, SignatureConfig, SignatureType};
use crate::types::KeyTrait;

const HEADER_LINE: &str = "-----BEGIN PGP SIGNED MESSAGE-----";
const SIGNATURE_LINE: &str = "-----BEGIN PGP SIGNATURE-----";

/// A cleartext signed message: human readable text together with one or
/// more signatures over its canonical form.
/// Ref: <https://tools.ietf.org/html/rfc4880.html#section-7>
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleartextSignedMessage {
    /// The message text, with the dash escaping removed.
    text: String,
    pub signatures: Vec<Signature>,
}

/// The canonical form that is signed: trailing whitespace of every line
/// removed, lines joined with `\r\n`.
fn canonicalize(text: &str) -> String {
    text.lines()
        .map(|line| line.trim_end())
        .collect::<Vec<_>>()
        .join("\r\n")
}

fn dash_escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for line in text.lines() {
        if line.starts_with('-') {
            out.push_str("- ");
        }
        out.push_str(line);
        out.push('\n');
    }
    out
}

fn dash_unescape(line: &str) -> &str {
    line.strip_prefix("- ").unwrap_or(line)
}

impl CleartextSignedMessage {
    /// Sign `text` with each of the given private keys.
    pub fn sign(
        config: &Config,
        text: &str,
        keys: &[&Key],
        hash_algorithm: HashAlgorithm,
    ) -> Result<Self> {
        let canonical = canonicalize(text);

        let mut signatures = Vec::with_capacity(keys.len());
        for key in keys {
            let signing_key = key.signing_key(config).ok_or(Error::MissingKey)?;
            let sig_config = SignatureConfig::v4(
                SignatureType::Text,
                signing_key.algorithm(),
                hash_algorithm,
                signing_key.key_id(),
            );
            signatures.push(sig_config.sign(&signing_key, canonical.as_bytes())?);
        }

        Ok(CleartextSignedMessage {
            text: canonical.replace("\r\n", "\n"),
            signatures,
        })
    }

    /// The message text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Check each signature against the supplied keys, in signature
    /// order.
    pub fn verify(&self, keys: &[&Key]) -> Vec<SignatureVerification> {
        let canonical = canonicalize(&self.text);
        DetachedSignature {
            signatures: self.signatures.clone(),
        }
        .verify(canonical.as_bytes(), keys)
    }

    /// Parse the two block cleartext framing.
    pub fn from_string(input: &str, config: &Config) -> Result<(Self, armor::Headers)> {
        let mut lines = input.lines();

        // the signed message marker
        loop {
            let line = lines
                .next()
                .ok_or_else(|| crate::errors::format_err!("no cleartext framing found"))?;
            if line.trim() == HEADER_LINE {
                break;
            }
        }

        // only Hash headers are allowed here
        let mut hash_names: Vec<String> = Vec::new();
        for line in lines.by_ref() {
            // the first fully whitespace line separates headers and text
            if line.chars().all(char::is_whitespace) {
                break;
            }

            let (key, value) = armor::parse_header_line(line)?;
            if !key.eq_ignore_ascii_case("hash") {
                return Err(Error::UnexpectedArmorHeader { key });
            }

            hash_names.extend(value.split(',').map(|v| v.trim().to_string()));
        }

        // text lines, dash unescaped, until the signature block begins
        let mut text_lines = Vec::new();
        let mut rest = Vec::new();
        let mut in_signature = false;
        for line in lines {
            if in_signature {
                rest.push(line);
                continue;
            }
            if line.trim() == SIGNATURE_LINE {
                in_signature = true;
                rest.push(line);
                continue;
            }

            text_lines.push(dash_unescape(line));
        }

        if !in_signature {
            return Err(Error::InvalidArmorWrappers);
        }

        let text = text_lines.join("\n");
        let signature_block = rest.join("\n");

        let (detached, headers) =
            DetachedSignature::from_armor_single(&signature_block, config)?;

        // reconcile the signature hash algorithms with the Hash headers
        let mut declared = Vec::with_capacity(hash_names.len());
        for name in &hash_names {
            let alg = HashAlgorithm::from_str(name).map_err(|_| Error::UnknownHashAlgorithm {
                name: name.clone(),
            })?;
            declared.push(alg);
        }

        for sig in &detached.signatures {
            let alg = sig.config.hash_alg;
            if declared.is_empty() {
                // historical default: no Hash header means MD5
                if alg != HashAlgorithm::Md5 {
                    return Err(Error::MissingHashHeader {
                        algorithm: alg.to_string(),
                    });
                }
            } else if !declared.contains(&alg) {
                return Err(Error::HashAlgorithmMismatch {
                    algorithm: alg.to_string(),
                });
            }
        }

        debug!("parsed cleartext message with {} signatures", detached.signatures.len());

        Ok((
            CleartextSignedMessage {
                text,
                signatures: detached.signatures,
            },
            headers,
        ))
    }

    pub fn to_armored_writer(
        &self,
        writer: &mut impl io::Write,
        config: &Config,
    ) -> Result<()> {
        writer.write_all(HEADER_LINE.as_bytes())?;
        writer.write_all(b"\n")?;

        let mut names: Vec<String> = self
            .signatures
            .iter()
            .map(|sig| sig.config.hash_alg.to_string())
            .collect();
        names.sort();
        names.dedup();
        writer.write_all(format!("Hash: {}\n", names.join(",")).as_bytes())?;
        writer.write_all(b"\n")?;

        writer.write_all(dash_escape(&self.text).as_bytes())?;

        let detached = DetachedSignature {
            signatures: self.signatures.clone(),
        };
        detached.to_armored_writer(writer, None, config)?;

        Ok(())
    }

    pub fn to_armored_string(&self, config: &Config) -> Result<String> {
        let mut buf = Vec::new();
        self.to_armored_writer(&mut buf, config)?;
        Ok(String::from_utf8(buf)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_form() {
        assert_eq!(canonicalize("a  \nb\t\nc"), "a\r\nb\r\nc");
        assert_eq!(canonicalize("hello"), "hello");
    }

    #[test]
    fn dash_escaping() {
        let text = "normal\n-----dashes\n- already escaped";
        let escaped = dash_escape(text);
        assert_eq!(escaped, "normal\n- -----dashes\n- - already escaped\n");

        let back: Vec<&str> = escaped.lines().map(dash_unescape).collect();
        assert_eq!(back.join("\n"), text);
    }
}
