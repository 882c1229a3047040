//! Fixed-size hashes, Ed25519 keys and signatures.
//!
//! Keys are stored as raw bytes and only decompressed when a signature is
//! checked. A policy may therefore name a key that is not a valid curve
//! point; such a key simply never verifies anything.

use std::fmt;

use ed25519_dalek::{Verifier, VerifyingKey};
use sha2::{Digest, Sha256};

use crate::error::{CoreError, Result};

/// Size of a SHA-256 digest in bytes.
pub const HASH_SIZE: usize = 32;

/// Size of a raw Ed25519 public key in bytes.
pub const PUBLIC_KEY_SIZE: usize = 32;

/// Size of an Ed25519 signature in bytes.
pub const SIGNATURE_SIZE: usize = 64;

macro_rules! fixed_bytes {
    ($name:ident, $size:expr, $what:literal) => {
        impl $name {
            /// Wraps raw bytes.
            pub const fn new(bytes: [u8; $size]) -> Self {
                Self(bytes)
            }

            /// Returns the raw bytes.
            pub fn as_bytes(&self) -> &[u8; $size] {
                &self.0
            }

            /// Decodes a hex string of exactly the right length.
            ///
            /// # Errors
            ///
            /// Returns `CoreError::InvalidHex` if the string has the wrong
            /// length or contains non-hex characters.
            pub fn from_hex(s: &str) -> Result<Self> {
                let mut bytes = [0u8; $size];
                hex::decode_to_slice(s, &mut bytes)
                    .map_err(|e| CoreError::invalid_hex($what, e.to_string()))?;
                Ok(Self(bytes))
            }

            /// Lowercase hex encoding.
            pub fn to_hex(&self) -> String {
                hex::encode(self.0)
            }
        }

        impl From<[u8; $size]> for $name {
            fn from(bytes: [u8; $size]) -> Self {
                Self(bytes)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.to_hex())
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.to_hex())
            }
        }
    };
}

/// SHA-256 digest.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Hash(pub [u8; HASH_SIZE]);

fixed_bytes!(Hash, HASH_SIZE, "hash");

/// Hash of a public key, used to name logs and witnesses in registries.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct KeyHash(pub [u8; HASH_SIZE]);

fixed_bytes!(KeyHash, HASH_SIZE, "key hash");

impl KeyHash {
    /// Hashes a public key.
    pub fn of(public_key: &PublicKey) -> Self {
        Self(hash_bytes(public_key.as_bytes()).0)
    }
}

/// Raw Ed25519 public key.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct PublicKey(pub [u8; PUBLIC_KEY_SIZE]);

fixed_bytes!(PublicKey, PUBLIC_KEY_SIZE, "public key");

impl PublicKey {
    /// Hash of this key.
    pub fn key_hash(&self) -> KeyHash {
        KeyHash::of(self)
    }
}

/// Ed25519 signature.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Signature(pub [u8; SIGNATURE_SIZE]);

fixed_bytes!(Signature, SIGNATURE_SIZE, "signature");

/// Hashes arbitrary bytes with SHA-256.
pub fn hash_bytes(data: &[u8]) -> Hash {
    Hash(Sha256::digest(data).into())
}

/// Checks an Ed25519 signature.
///
/// Returns `false` for a bad signature and for a public key that does not
/// decode to a curve point.
pub fn verify(public_key: &PublicKey, message: &[u8], signature: &Signature) -> bool {
    let Ok(key) = VerifyingKey::from_bytes(public_key.as_bytes()) else {
        return false;
    };
    let signature = ed25519_dalek::Signature::from_bytes(signature.as_bytes());
    key.verify(message, &signature).is_ok()
}
