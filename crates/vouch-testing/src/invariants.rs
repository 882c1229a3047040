//! Invariant checks and property-based testing utilities for policies.

use std::collections::HashSet;

use anyhow::{ensure, Result};
use vouch_core::KeyHash;
use vouch_policy::{Policy, QuorumNode};

/// Properties every built policy must have.
pub struct Invariants;

impl Invariants {
    /// Monotonicity: if `subset` satisfies the quorum, so does `superset`.
    pub fn quorum_monotonic(
        policy: &Policy,
        subset: &HashSet<KeyHash>,
        superset: &HashSet<KeyHash>,
    ) -> Result<()> {
        ensure!(subset.is_subset(superset), "first set must be a subset of the second");
        if policy.is_quorum_satisfied(subset) {
            ensure!(
                policy.is_quorum_satisfied(superset),
                "adding {} witnesses un-satisfied the quorum",
                superset.len() - subset.len()
            );
        }
        Ok(())
    }

    /// Every witness in the quorum tree is registered in the policy.
    pub fn quorum_witnesses_registered(policy: &Policy) -> Result<()> {
        for key_hash in policy.quorum().witnesses() {
            ensure!(
                policy.witness(&key_hash).is_some(),
                "quorum references unregistered witness {key_hash}"
            );
        }
        Ok(())
    }

    /// Group thresholds lie in `[1, members]`, except the empty `none` group.
    pub fn thresholds_in_range(node: &QuorumNode) -> Result<()> {
        if let QuorumNode::Group { members, threshold } = node {
            if members.is_empty() {
                ensure!(*threshold == 0, "empty group must have threshold 0");
            } else {
                ensure!(
                    (1..=members.len()).contains(threshold),
                    "threshold {threshold} out of range for {} members",
                    members.len()
                );
            }
            for member in members {
                Self::thresholds_in_range(member)?;
            }
        }
        Ok(())
    }

    /// The full set of policy witnesses satisfies the quorum.
    pub fn all_witnesses_satisfy(policy: &Policy) -> Result<()> {
        let all: HashSet<KeyHash> = policy.witnesses().iter().map(|(hash, _)| *hash).collect();
        ensure!(policy.is_quorum_satisfied(&all), "quorum unreachable with every witness");
        Ok(())
    }
}

/// Proptest strategies for quorum trees.
pub mod strategies {
    use proptest::{
        collection::vec,
        prelude::{any, Just, Strategy},
    };
    use vouch_core::{KeyHash, Signer};

    use crate::fixtures::{log_signer, witness_signer, PolicyTextBuilder};

    /// Shape of a generated quorum tree.
    #[derive(Debug, Clone)]
    pub enum Shape {
        /// A witness leaf.
        Witness,
        /// A group; the threshold is derived from `threshold_seed`.
        Group {
            /// Chooses a threshold in `[1, members.len()]`.
            threshold_seed: usize,
            /// Child shapes.
            members: Vec<Shape>,
        },
    }

    /// A policy generated from a `Shape`.
    #[derive(Debug, Clone)]
    pub struct GeneratedPolicy {
        /// Policy configuration text.
        pub text: String,
        /// Key hashes of the witnesses, in declaration order.
        pub witnesses: Vec<KeyHash>,
    }

    /// Strategy for quorum tree shapes up to three levels deep.
    pub fn shape_strategy() -> impl Strategy<Value = Shape> {
        Just(Shape::Witness).prop_recursive(3, 24, 4, |inner| {
            (any::<usize>(), vec(inner, 1..5))
                .prop_map(|(threshold_seed, members)| Shape::Group { threshold_seed, members })
        })
    }

    /// Strategy for valid policy texts over fixture witness keys.
    pub fn policy_strategy() -> impl Strategy<Value = GeneratedPolicy> {
        shape_strategy().prop_map(|shape| render(&shape))
    }

    /// Strategy for a bitmask selecting a subset of up to 64 witnesses.
    pub fn subset_mask_strategy() -> impl Strategy<Value = u64> {
        any::<u64>()
    }

    /// Selects the witnesses whose bit is set in `mask`.
    pub fn select(witnesses: &[KeyHash], mask: u64) -> std::collections::HashSet<KeyHash> {
        witnesses
            .iter()
            .enumerate()
            .filter(|(i, _)| *i < 64 && mask & (1 << i) != 0)
            .map(|(_, hash)| *hash)
            .collect()
    }

    fn render(shape: &Shape) -> GeneratedPolicy {
        let mut state = RenderState {
            builder: PolicyTextBuilder::new().log(&log_signer().public_key(), None),
            witnesses: Vec::new(),
            groups: 0,
        };
        let root = state.declare(shape);
        GeneratedPolicy { text: state.builder.quorum(&root).build(), witnesses: state.witnesses }
    }

    struct RenderState {
        builder: PolicyTextBuilder,
        witnesses: Vec<KeyHash>,
        groups: usize,
    }

    impl RenderState {
        fn declare(&mut self, shape: &Shape) -> String {
            match shape {
                Shape::Witness => {
                    let index = self.witnesses.len();
                    let signer = witness_signer(index);
                    let name = format!("w{index}");
                    self.witnesses.push(signer.key_hash());
                    self.builder = std::mem::take(&mut self.builder).witness(
                        &name,
                        &signer.public_key(),
                        None,
                    );
                    name
                },
                Shape::Group { threshold_seed, members } => {
                    let names: Vec<String> = members.iter().map(|m| self.declare(m)).collect();
                    let refs: Vec<&str> = names.iter().map(String::as_str).collect();
                    let threshold = 1 + threshold_seed % names.len();
                    let name = format!("g{}", self.groups);
                    self.groups += 1;
                    self.builder = std::mem::take(&mut self.builder).group(&name, threshold, &refs);
                    name
                },
            }
        }
    }
}
