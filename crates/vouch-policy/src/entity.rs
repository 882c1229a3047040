//! Registries of logs and witnesses keyed by public key hash.

use std::{collections::HashMap, fmt};

use rand::{seq::SliceRandom, Rng};
use vouch_core::{KeyHash, PublicKey};

use crate::error::{PolicyError, Result};

/// Which registry an entity belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    /// A transparency log.
    Log,
    /// A cosigning witness.
    Witness,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Log => f.write_str("log"),
            Self::Witness => f.write_str("witness"),
        }
    }
}

/// A log or witness known to a policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entity {
    /// Public key used to check the entity's signatures.
    pub public_key: PublicKey,

    /// Where the entity can be reached, if advertised.
    pub url: Option<String>,
}

impl Entity {
    /// Create an entity.
    pub fn new(public_key: PublicKey, url: Option<String>) -> Self {
        Self { public_key, url }
    }

    /// Hash of the entity's public key.
    pub fn key_hash(&self) -> KeyHash {
        self.public_key.key_hash()
    }
}

/// Entities of one kind, unique by public key.
#[derive(Debug, Clone)]
pub struct Registry {
    kind: EntityKind,
    entities: HashMap<KeyHash, Entity>,
}

impl Registry {
    /// Create an empty registry.
    pub fn new(kind: EntityKind) -> Self {
        Self { kind, entities: HashMap::new() }
    }

    /// Adds an entity, returning its key hash.
    ///
    /// # Errors
    ///
    /// Returns `PolicyError::DuplicateKey` if the public key is already
    /// registered. The registry is left unchanged.
    pub fn add(&mut self, entity: Entity) -> Result<KeyHash> {
        let key_hash = entity.key_hash();
        if self.entities.contains_key(&key_hash) {
            return Err(PolicyError::DuplicateKey { kind: self.kind, key_hash });
        }
        self.entities.insert(key_hash, entity);
        Ok(key_hash)
    }

    /// Looks up an entity by key hash.
    pub fn get(&self, key_hash: &KeyHash) -> Option<&Entity> {
        self.entities.get(key_hash)
    }

    /// Whether the key hash is registered.
    pub fn contains(&self, key_hash: &KeyHash) -> bool {
        self.entities.contains_key(key_hash)
    }

    /// The kind of entity held.
    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    /// Number of entities.
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Iterates over entities in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = (&KeyHash, &Entity)> {
        self.entities.iter()
    }

    /// Entities advertising a URL, shuffled by `rng`.
    pub fn with_url<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<&Entity> {
        let mut entities: Vec<&Entity> = self
            .entities
            .values()
            .filter(|entity| entity.url.as_deref().is_some_and(|url| !url.is_empty()))
            .collect();
        // Sort first so the result depends only on the seed.
        entities.sort_by(|a, b| a.public_key.as_bytes().cmp(b.public_key.as_bytes()));
        entities.shuffle(rng);
        entities
    }
}
