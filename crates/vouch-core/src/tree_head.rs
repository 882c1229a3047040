//! Tree heads, log signatures and witness cosignatures.
//!
//! A log signs the checkpoint body of its tree head:
//!
//! ```text
//! <origin>\n<size>\n<base64 root hash>\n
//! ```
//!
//! where the origin is derived from the log's key hash. A witness signs the
//! same body prefixed with `cosignature/v1\ntime <timestamp>\n`, so a
//! cosignature covers the origin, the tree head and the witness's clock.

use std::collections::BTreeMap;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, Utc};

use crate::{
    crypto::{verify, Hash, KeyHash, PublicKey, Signature},
    error::{CoreError, Result},
    signing::Signer,
};

/// Prefix of every origin derived from a log key.
pub const CHECKPOINT_ORIGIN_PREFIX: &str = "sigsum.org/v1/tree/";

/// Namespace line that opens every cosigned message.
pub const COSIGNATURE_NAMESPACE: &str = "cosignature/v1";

/// Returns the checkpoint origin for a log.
///
/// The mapping is stable so that independently operated verifiers agree on
/// the origin without coordinating.
pub fn checkpoint_origin(log_key_hash: &KeyHash) -> String {
    format!("{CHECKPOINT_ORIGIN_PREFIX}{log_key_hash}")
}

/// A log's claim about its current state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TreeHead {
    /// Number of leaves in the tree.
    pub size: u64,

    /// Merkle root over those leaves.
    pub root_hash: Hash,
}

impl TreeHead {
    /// Create a tree head.
    pub fn new(size: u64, root_hash: Hash) -> Self {
        Self { size, root_hash }
    }

    /// Canonical checkpoint body signed by the log.
    pub fn to_checkpoint_body(&self, origin: &str) -> String {
        format!("{origin}\n{}\n{}\n", self.size, STANDARD.encode(self.root_hash.as_bytes()))
    }

    /// Message a witness signs when cosigning this tree head at `timestamp`.
    pub fn cosignature_message(&self, origin: &str, timestamp: u64) -> String {
        format!("{COSIGNATURE_NAMESPACE}\ntime {timestamp}\n{}", self.to_checkpoint_body(origin))
    }

    /// Signs the tree head as the log owning `signer`'s key.
    ///
    /// # Errors
    ///
    /// Propagates signer failures.
    pub fn sign(&self, signer: &(impl Signer + ?Sized)) -> Result<SignedTreeHead> {
        let origin = checkpoint_origin(&signer.public_key().key_hash());
        self.sign_for_origin(signer, &origin)
    }

    /// Signs the tree head under an explicit origin.
    ///
    /// # Errors
    ///
    /// Propagates signer failures.
    pub fn sign_for_origin(
        &self,
        signer: &(impl Signer + ?Sized),
        origin: &str,
    ) -> Result<SignedTreeHead> {
        let signature = signer.sign(self.to_checkpoint_body(origin).as_bytes())?;
        Ok(SignedTreeHead { tree_head: *self, signature })
    }

    /// Cosigns the tree head as a witness.
    ///
    /// # Errors
    ///
    /// Propagates signer failures.
    pub fn cosign(
        &self,
        signer: &(impl Signer + ?Sized),
        origin: &str,
        timestamp: u64,
    ) -> Result<Cosignature> {
        let signature = signer.sign(self.cosignature_message(origin, timestamp).as_bytes())?;
        Ok(Cosignature { key_hash: signer.public_key().key_hash(), timestamp, signature })
    }
}

/// Tree head together with the log's signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignedTreeHead {
    /// The signed tree head.
    pub tree_head: TreeHead,

    /// Log signature over the checkpoint body.
    pub signature: Signature,
}

impl SignedTreeHead {
    /// Verifies the log signature, deriving the origin from `public_key`.
    pub fn verify(&self, public_key: &PublicKey) -> bool {
        self.verify_for_origin(public_key, &checkpoint_origin(&public_key.key_hash()))
    }

    /// Verifies the log signature under an explicit origin.
    pub fn verify_for_origin(&self, public_key: &PublicKey, origin: &str) -> bool {
        verify(public_key, self.tree_head.to_checkpoint_body(origin).as_bytes(), &self.signature)
    }
}

/// A witness endorsement of a tree head.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cosignature {
    /// Key hash of the witness that produced the cosignature.
    pub key_hash: KeyHash,

    /// Unix time in seconds at which the witness cosigned.
    pub timestamp: u64,

    /// Signature over the cosignature message.
    pub signature: Signature,
}

impl Cosignature {
    /// Verifies the cosignature over `tree_head` under `origin`.
    pub fn verify(&self, public_key: &PublicKey, origin: &str, tree_head: &TreeHead) -> bool {
        let message = tree_head.cosignature_message(origin, self.timestamp);
        verify(public_key, message.as_bytes(), &self.signature)
    }

    /// Cosigning time as a UTC date, if it is representable.
    pub fn timestamp_utc(&self) -> Option<DateTime<Utc>> {
        i64::try_from(self.timestamp).ok().and_then(|secs| DateTime::from_timestamp(secs, 0))
    }
}

/// Signed tree head plus the cosignatures collected for it.
///
/// Cosignatures are keyed by witness key hash. Keys need not belong to any
/// particular policy; verifiers ignore witnesses they do not know.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CosignedTreeHead {
    /// The log-signed tree head.
    pub signed_tree_head: SignedTreeHead,

    /// Cosignatures by witness key hash.
    pub cosignatures: BTreeMap<KeyHash, Cosignature>,
}

impl CosignedTreeHead {
    /// Create a cosigned tree head with no cosignatures yet.
    pub fn new(signed_tree_head: SignedTreeHead) -> Self {
        Self { signed_tree_head, cosignatures: BTreeMap::new() }
    }

    /// Create a cosigned tree head from a list of cosignatures.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::DuplicateCosignature` if two entries share a
    /// witness key hash.
    pub fn with_cosignatures(
        signed_tree_head: SignedTreeHead,
        cosignatures: impl IntoIterator<Item = Cosignature>,
    ) -> Result<Self> {
        let mut cth = Self::new(signed_tree_head);
        for cosignature in cosignatures {
            cth.add_cosignature(cosignature)?;
        }
        Ok(cth)
    }

    /// Adds a cosignature.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::DuplicateCosignature` if the witness already
    /// contributed one.
    pub fn add_cosignature(&mut self, cosignature: Cosignature) -> Result<()> {
        if self.cosignatures.contains_key(&cosignature.key_hash) {
            return Err(CoreError::DuplicateCosignature { key_hash: cosignature.key_hash });
        }
        self.cosignatures.insert(cosignature.key_hash, cosignature);
        Ok(())
    }

    /// The underlying tree head.
    pub fn tree_head(&self) -> &TreeHead {
        &self.signed_tree_head.tree_head
    }
}
