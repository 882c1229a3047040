//! Short key identifiers binding signature lines to keys.
//!
//! A key id is the first four bytes of
//! `SHA-256(name || "\n" || signature type || public key)`. It only helps a
//! reader pick the right key before verifying; collisions are possible and
//! the signature check remains the trust boundary.

use std::fmt;

use sha2::{Digest, Sha256};

use crate::{
    crypto::PublicKey,
    error::{CoreError, Result},
};

/// Size of a key id in bytes.
pub const KEY_ID_SIZE: usize = 4;

/// Reserved signature type bytes mixed into key ids.
///
/// Distinct types keep a log key and a witness key with identical bytes
/// from sharing an identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum SignatureType {
    /// A log's Ed25519 signature over its own tree head.
    Ed25519 = 0x01,
    /// A witness cosignature (`cosignature/v1`).
    CosignatureV1 = 0x04,
}

impl SignatureType {
    /// The wire byte for this type.
    pub const fn as_byte(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for SignatureType {
    type Error = CoreError;

    fn try_from(byte: u8) -> Result<Self> {
        match byte {
            0x01 => Ok(Self::Ed25519),
            0x04 => Ok(Self::CosignatureV1),
            sig_type => Err(CoreError::UnsupportedSignatureType { sig_type }),
        }
    }
}

/// Truncated hash identifying a named key.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct KeyId(pub [u8; KEY_ID_SIZE]);

impl KeyId {
    /// Derives the key id for a named key of the given type.
    pub fn derive(name: &str, sig_type: SignatureType, public_key: &PublicKey) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(name.as_bytes());
        hasher.update(b"\n");
        hasher.update([sig_type.as_byte()]);
        hasher.update(public_key.as_bytes());
        let digest = hasher.finalize();

        let mut id = [0u8; KEY_ID_SIZE];
        id.copy_from_slice(&digest[..KEY_ID_SIZE]);
        Self(id)
    }

    /// Reads a key id from exactly four bytes.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::InvalidKeyIdLength` for any other length.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let id: [u8; KEY_ID_SIZE] =
            bytes.try_into().map_err(|_| CoreError::InvalidKeyIdLength { len: bytes.len() })?;
        Ok(Self(id))
    }

    /// Returns the raw bytes.
    pub fn as_bytes(&self) -> &[u8; KEY_ID_SIZE] {
        &self.0
    }
}

impl fmt::Display for KeyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl fmt::Debug for KeyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "KeyId({self})")
    }
}

/// Derives the key id for `name`, a raw signature type byte and a key.
///
/// # Errors
///
/// Returns `CoreError::UnsupportedSignatureType` if `sig_type` is not one of
/// the reserved values.
pub fn derive_key_id(name: &str, sig_type: u8, public_key: &PublicKey) -> Result<KeyId> {
    Ok(KeyId::derive(name, SignatureType::try_from(sig_type)?, public_key))
}
