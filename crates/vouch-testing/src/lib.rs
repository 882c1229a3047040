//! Test infrastructure for deterministic verification scenarios.
//!
//! Provides fixed-seed log and witness keys, builders for policy text and
//! cosigned tree heads, invariant checks over policies, and proptest
//! strategies that generate valid quorum trees.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod fixtures;
pub mod invariants;

pub use fixtures::{
    log_signer, witness_signer, CosignedTreeHeadBuilder, PolicyTextBuilder, DEFAULT_TIMESTAMP,
};
pub use invariants::{strategies, Invariants};
