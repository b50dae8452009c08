//! Interfaces towards the external persistence and keyserver
//! collaborators. The storage medium and HTTP transport live outside
//! this crate; only the contracts and the armoring glue are here.

use std::collections::HashMap;

use crate::composed::{Deserializable, Key};
use crate::config::Config;
use crate::errors::{Error, Result};
use crate::types::KeyTrait;

/// A named text blob store, the shape of e.g. browser local storage.
/// Setting `None` removes the item entirely.
pub trait BlobStore {
    fn get(&self, name: &str) -> Option<String>;
    fn set(&mut self, name: &str, value: Option<&str>);
}

/// An in-memory store, mainly for tests and as a reference
/// implementation.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    items: HashMap<String, String>,
}

impl BlobStore for MemoryStore {
    fn get(&self, name: &str) -> Option<String> {
        self.items.get(name).cloned()
    }

    fn set(&mut self, name: &str, value: Option<&str>) {
        match value {
            Some(value) => {
                self.items.insert(name.to_string(), value.to_string());
            }
            None => {
                self.items.remove(name);
            }
        }
    }
}

/// Persistence of public and private keys over a [BlobStore],
/// namespaced by a caller supplied prefix.
#[derive(Debug)]
pub struct Keyring<S: BlobStore> {
    prefix: String,
    store: S,
}

impl<S: BlobStore> Keyring<S> {
    pub fn new(prefix: impl Into<String>, store: S) -> Self {
        Keyring {
            prefix: prefix.into(),
            store,
        }
    }

    fn public_name(&self) -> String {
        format!("{}public-keys", self.prefix)
    }

    fn private_name(&self) -> String {
        format!("{}private-keys", self.prefix)
    }

    fn store_keys(&mut self, name: &str, keys: &[&Key], config: &Config) -> Result<()> {
        if keys.is_empty() {
            // an empty list removes the stored item, it does not store
            // an empty serialization
            self.store.set(name, None);
            return Ok(());
        }

        let mut armored = String::new();
        for key in keys {
            armored.push_str(&key.to_armored_string(None, config)?);
        }

        self.store.set(name, Some(&armored));
        Ok(())
    }

    fn load_keys(&self, name: &str, config: &Config) -> Result<Vec<Key>> {
        let Some(armored) = self.store.get(name) else {
            return Ok(Vec::new());
        };

        let mut keys = Vec::new();
        // the blob may hold several concatenated armor blocks
        for block in split_armor_blocks(&armored) {
            let (mut block_keys, errors, _) = Key::from_armor_many(&block, config)?;
            for err in errors {
                log::warn!("skipping unreadable stored key: {:?}", err);
            }
            keys.append(&mut block_keys);
        }

        Ok(keys)
    }

    pub fn store_public_keys(&mut self, keys: &[&Key], config: &Config) -> Result<()> {
        let name = self.public_name();
        self.store_keys(&name, keys, config)
    }

    pub fn load_public_keys(&self, config: &Config) -> Result<Vec<Key>> {
        self.load_keys(&self.public_name(), config)
    }

    pub fn store_private_keys(&mut self, keys: &[&Key], config: &Config) -> Result<()> {
        let name = self.private_name();
        self.store_keys(&name, keys, config)
    }

    pub fn load_private_keys(&self, config: &Config) -> Result<Vec<Key>> {
        self.load_keys(&self.private_name(), config)
    }

    /// Find a stored public key by its key id.
    pub fn get_public_key(&self, id: &crate::types::KeyId, config: &Config) -> Result<Option<Key>> {
        let keys = self.load_public_keys(config)?;
        Ok(keys.into_iter().find(|key| {
            key.key_id() == *id || key.subkeys.iter().any(|sk| sk.key.key_id() == *id)
        }))
    }
}

fn split_armor_blocks(input: &str) -> Vec<String> {
    let mut blocks = Vec::new();
    let mut current = String::new();

    for line in input.lines() {
        current.push_str(line);
        current.push('\n');
        if line.trim().starts_with("-----END ") {
            blocks.push(std::mem::take(&mut current));
        }
    }

    if !current.trim().is_empty() {
        blocks.push(current);
    }

    blocks
}

/// Lookup query against a keyserver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupQuery {
    Email(String),
    KeyId(crate::types::KeyId),
}

/// The HKP keyserver collaborator: an external service that resolves
/// queries to armored key text.
pub trait KeyServer {
    /// Look up a key; `None` when the server does not know it.
    fn lookup(&self, query: &LookupQuery) -> Result<Option<String>>;

    /// Upload armored key text.
    fn upload(&self, armored: &str) -> Result<()>;
}

/// Fetch a key from a keyserver and parse it.
pub fn fetch_key(
    server: &impl KeyServer,
    query: &LookupQuery,
    config: &Config,
) -> Result<Option<Key>> {
    let Some(armored) = server.lookup(query)? else {
        return Ok(None);
    };

    let (keys, errors, _) = Key::from_armor_many(&armored, config)?;
    if keys.is_empty() {
        if let Some(err) = errors.into_iter().next() {
            return Err(err);
        }
        return Err(Error::NoMatchingPacket);
    }

    Ok(keys.into_iter().next())
}

/// Publish a key to a keyserver.
pub fn publish_key(server: &impl KeyServer, key: &Key, config: &Config) -> Result<()> {
    let armored = key.public_key().to_armored_string(None, config)?;
    server.upload(&armored)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_list_removes_item() {
        let mut keyring = Keyring::new("test-", MemoryStore::default());
        let config = Config::default();

        keyring
            .store
            .set("test-public-keys", Some("left over state"));
        keyring.store_public_keys(&[], &config).unwrap();
        assert!(keyring.store.get("test-public-keys").is_none());
    }

    #[test]
    fn split_blocks() {
        let input = "-----BEGIN PGP PUBLIC KEY BLOCK-----\n\nAAAA\n-----END PGP PUBLIC KEY BLOCK-----\n-----BEGIN PGP PUBLIC KEY BLOCK-----\n\nBBBB\n-----END PGP PUBLIC KEY BLOCK-----\n";
        let blocks = split_armor_blocks(input);
        assert_eq!(blocks.len(), 2);
        assert!(blocks[0].contains("AAAA"));
        assert!(blocks[1].contains("BBBB"));
    }
}
