//! Core primitives for verifying cosigned transparency log tree heads.
//!
//! Provides the fixed-size hash, key and signature types, the Ed25519
//! signing capability, key identifiers used to bind signature lines to keys,
//! and the tree head family (`TreeHead`, `SignedTreeHead`, `Cosignature`,
//! `CosignedTreeHead`) together with their line-oriented ASCII encoding.
//! Everything in this crate is synchronous and free of I/O.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod ascii;
pub mod crypto;
pub mod error;
pub mod key_id;
pub mod signing;
pub mod tree_head;

pub use ascii::parse_decimal;
pub use crypto::{hash_bytes, verify, Hash, KeyHash, PublicKey, Signature};
pub use error::{CoreError, Result};
pub use key_id::{derive_key_id, KeyId, SignatureType};
pub use signing::{Signer, SigningService};
pub use tree_head::{
    checkpoint_origin, Cosignature, CosignedTreeHead, SignedTreeHead, TreeHead,
};
