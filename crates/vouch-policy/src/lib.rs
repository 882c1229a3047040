//! Witness quorum policies for cosigned tree heads.
//!
//! A `Policy` names the logs a verifier accepts, the witnesses it knows, and
//! a quorum tree saying which combinations of witness cosignatures are
//! enough. Policies are built once, from the text format in `parser` or
//! through `PolicyBuilder`, and are immutable afterwards; share them behind
//! an `Arc` or swap them atomically through `PolicyStore`.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use std::{collections::HashSet, sync::Arc};

use rand::Rng;
use vouch_core::KeyHash;

pub mod builder;
pub mod catalog;
pub mod entity;
pub mod error;
pub mod parser;
pub mod quorum;
pub mod store;
pub mod verify;

pub use builder::{PolicyBuilder, Threshold, NONE};
pub use catalog::{BuiltinPolicy, FsPolicyDirectory, PolicyCatalog, PolicyDirectory};
pub use entity::{Entity, EntityKind, Registry};
pub use error::{PolicyError, Result, VerifyError};
pub use parser::parse_policy;
pub use quorum::QuorumNode;
pub use store::PolicyStore;
pub use verify::VerificationReport;

/// An immutable trust policy.
#[derive(Debug, Clone)]
pub struct Policy {
    logs: Registry,
    witnesses: Registry,
    quorum: Arc<QuorumNode>,
}

impl Policy {
    pub(crate) fn from_parts(logs: Registry, witnesses: Registry, quorum: Arc<QuorumNode>) -> Self {
        Self { logs, witnesses, quorum }
    }

    /// Parses a policy from its text form. See [`parse_policy`].
    ///
    /// # Errors
    ///
    /// Returns the first `PolicyError` found.
    pub fn parse(input: &[u8]) -> Result<Self> {
        parse_policy(input)
    }

    /// Looks up a log by key hash.
    pub fn log(&self, key_hash: &KeyHash) -> Option<&Entity> {
        self.logs.get(key_hash)
    }

    /// Looks up a witness by key hash.
    pub fn witness(&self, key_hash: &KeyHash) -> Option<&Entity> {
        self.witnesses.get(key_hash)
    }

    /// All logs.
    pub fn logs(&self) -> &Registry {
        &self.logs
    }

    /// All witnesses.
    pub fn witnesses(&self) -> &Registry {
        &self.witnesses
    }

    /// Root of the quorum tree.
    pub fn quorum(&self) -> &QuorumNode {
        &self.quorum
    }

    /// Logs advertising a URL, in an order drawn from `rng`.
    pub fn logs_with_url<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<&Entity> {
        self.logs.with_url(rng)
    }

    /// Witnesses advertising a URL, in an order drawn from `rng`.
    pub fn witnesses_with_url<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<&Entity> {
        self.witnesses.with_url(rng)
    }

    /// Whether the verified witnesses satisfy the quorum.
    pub fn is_quorum_satisfied(&self, verified: &HashSet<KeyHash>) -> bool {
        self.quorum.is_satisfied(verified)
    }
}
