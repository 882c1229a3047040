//! Ed25519 signing capability for logs and witnesses.
//!
//! The verification core only ever consumes signatures; producing them goes
//! through the `Signer` trait so that agent-backed or hardware signers can be
//! plugged in without touching tree head code.

use ed25519_dalek::{Signer as _, SigningKey};
use rand::rngs::OsRng;

use crate::{
    crypto::{KeyHash, PublicKey, Signature},
    error::{CoreError, Result},
};

/// Capability to sign messages with a single Ed25519 key.
pub trait Signer {
    /// Public half of the signing key.
    fn public_key(&self) -> PublicKey;

    /// Signs `message`.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::SigningFailed` if the backing key is unavailable.
    fn sign(&self, message: &[u8]) -> Result<Signature>;
}

/// In-process Ed25519 signer.
///
/// Signatures are deterministic: the same key and message always produce
/// the same bytes.
#[derive(Debug)]
pub struct SigningService {
    signing_key: SigningKey,
    public_key: PublicKey,
    key_hash: KeyHash,
}

impl SigningService {
    /// Create an ephemeral signing service with a fresh Ed25519 keypair.
    ///
    /// Suitable for tests and throwaway witnesses. Long-lived keys should be
    /// loaded from storage with `try_from_bytes`.
    pub fn ephemeral() -> Self {
        Self::from_signing_key(SigningKey::generate(&mut OsRng))
    }

    /// Create a signing service from a 32-byte Ed25519 seed.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::InvalidHex` if the seed is not exactly 32 bytes.
    pub fn try_from_bytes(seed: &[u8]) -> Result<Self> {
        let seed: &[u8; 32] = seed.try_into().map_err(|_| {
            CoreError::invalid_hex("private key", format!("expected 32 bytes, got {}", seed.len()))
        })?;
        Ok(Self::from_signing_key(SigningKey::from_bytes(seed)))
    }

    fn from_signing_key(signing_key: SigningKey) -> Self {
        let public_key = PublicKey::new(signing_key.verifying_key().to_bytes());
        let key_hash = public_key.key_hash();

        Self { signing_key, public_key, key_hash }
    }

    /// Hash of the public key, as used in policy registries.
    pub fn key_hash(&self) -> KeyHash {
        self.key_hash
    }
}

impl Signer for SigningService {
    fn public_key(&self) -> PublicKey {
        self.public_key
    }

    fn sign(&self, message: &[u8]) -> Result<Signature> {
        Ok(Signature::new(self.signing_key.sign(message).to_bytes()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::verify;

    #[test]
    fn derives_public_key_from_seed() {
        let service = SigningService::try_from_bytes(&[0x11; 32]).unwrap();

        assert_eq!(
            service.public_key().to_hex(),
            "d04ab232742bb4ab3a1368bd4615e4e6d0224ab71a016baf8520a332c9778737"
        );
        assert_eq!(service.key_hash(), service.public_key().key_hash());
    }

    #[test]
    fn rejects_seed_of_wrong_length() {
        assert!(SigningService::try_from_bytes(&[0u8; 31]).is_err());
    }

    #[test]
    fn signs_deterministically() {
        let service = SigningService::try_from_bytes(&[0x42; 32]).unwrap();

        let sig1 = service.sign(b"tree head").unwrap();
        let sig2 = service.sign(b"tree head").unwrap();

        assert_eq!(sig1, sig2, "Signatures must be deterministic");
    }

    #[test]
    fn signature_verifies_with_public_key() {
        let service = SigningService::ephemeral();
        let signature = service.sign(b"message").unwrap();

        assert!(verify(&service.public_key(), b"message", &signature));
    }

    #[test]
    fn signature_fails_with_tampered_message() {
        let service = SigningService::ephemeral();
        let signature = service.sign(b"message").unwrap();

        assert!(!verify(&service.public_key(), b"massage", &signature));
    }

    #[test]
    fn ephemeral_keys_differ() {
        let a = SigningService::ephemeral();
        let b = SigningService::ephemeral();

        assert_ne!(a.key_hash(), b.key_hash());
    }
}
