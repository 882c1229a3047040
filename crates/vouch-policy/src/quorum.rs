//! Quorum trees of witnesses and threshold groups.
//!
//! A tree is evaluated against the set of witnesses whose cosignatures
//! verified. Evaluation is a pure function, so a tree can be shared between
//! threads and evaluated concurrently.

use std::{collections::HashSet, sync::Arc};

use vouch_core::KeyHash;

/// One node of a quorum tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuorumNode {
    /// Satisfied when the witness's cosignature verified.
    Witness(KeyHash),

    /// Satisfied when at least `threshold` members are satisfied.
    Group {
        /// Child nodes.
        members: Vec<Arc<QuorumNode>>,
        /// Number of members that must be satisfied.
        threshold: usize,
    },
}

impl QuorumNode {
    /// The empty group, satisfied by any set including the empty one.
    pub fn none() -> Self {
        Self::Group { members: Vec::new(), threshold: 0 }
    }

    /// Whether the node is satisfied by the given verified witnesses.
    pub fn is_satisfied(&self, verified: &HashSet<KeyHash>) -> bool {
        match self {
            Self::Witness(key_hash) => verified.contains(key_hash),
            Self::Group { members, threshold } => {
                members.iter().filter(|member| member.is_satisfied(verified)).count() >= *threshold
            },
        }
    }

    /// Every witness key hash reachable from this node.
    pub fn witnesses(&self) -> HashSet<KeyHash> {
        let mut out = HashSet::new();
        self.collect_witnesses(&mut out);
        out
    }

    fn collect_witnesses(&self, out: &mut HashSet<KeyHash>) {
        match self {
            Self::Witness(key_hash) => {
                out.insert(*key_hash);
            },
            Self::Group { members, .. } => {
                for member in members {
                    member.collect_witnesses(out);
                }
            },
        }
    }
}
