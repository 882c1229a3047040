//! Error taxonomy for building policies and verifying against them.
//!
//! Policy errors (`E30xx`) are terminal for a policy load: no partially
//! built policy is ever returned. Verification errors (`E20xx`) describe why
//! a cosigned tree head was rejected.

use thiserror::Error;
use vouch_core::KeyHash;

use crate::entity::EntityKind;

/// Result type alias using `PolicyError`.
pub type Result<T> = std::result::Result<T, PolicyError>;

/// Errors produced while building, parsing or looking up a policy.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PolicyError {
    /// A config line starts with an unrecognised keyword (E3001).
    #[error("[E3001] Unknown keyword {keyword:?}")]
    UnknownKeyword {
        /// The keyword that was found.
        keyword: String,
    },

    /// A config line has the wrong number of fields (E3002).
    #[error("[E3002] Invalid {keyword} line: {reason}")]
    InvalidSyntax {
        /// Keyword of the offending line.
        keyword: &'static str,
        /// What was wrong with it.
        reason: String,
    },

    /// A public key did not decode (E3003).
    #[error("[E3003] Invalid public key: {reason}")]
    InvalidPublicKey {
        /// Why decoding failed.
        reason: String,
    },

    /// The same key was added twice to one registry (E3004).
    #[error("[E3004] Duplicate {kind} key {key_hash}")]
    DuplicateKey {
        /// Registry the key was added to.
        kind: EntityKind,
        /// Hash of the repeated key.
        key_hash: KeyHash,
    },

    /// A witness or group name is already taken (E3005).
    #[error("[E3005] Duplicate name {name:?}")]
    DuplicateName {
        /// The repeated name.
        name: String,
    },

    /// A name was referenced before being defined (E3006).
    #[error("[E3006] Undefined name {name:?}")]
    UndefinedName {
        /// The unknown name.
        name: String,
    },

    /// A group threshold is not a number in range, `any` or `all` (E3007).
    #[error("[E3007] Invalid threshold {threshold:?} for group of {members} members")]
    InvalidThreshold {
        /// Threshold as written.
        threshold: String,
        /// Number of members in the group.
        members: usize,
    },

    /// A witness or group is already counted by another group (E3008).
    #[error("[E3008] {member:?} is already a member of {group:?}")]
    AlreadyMember {
        /// The member that was reused.
        member: String,
        /// Group that already contains it.
        group: String,
    },

    /// A second quorum declaration (E3009).
    #[error("[E3009] Quorum already set")]
    QuorumAlreadySet,

    /// The policy never declares a quorum (E3010).
    #[error("[E3010] Missing quorum declaration")]
    MissingQuorum,

    /// A config line contains a control character (E3011).
    #[error("[E3011] Invalid character {character:?}")]
    InvalidCharacter {
        /// The rejected character.
        character: char,
    },

    /// A config line is not valid UTF-8 (E3012).
    #[error("[E3012] Invalid UTF-8")]
    InvalidUtf8,

    /// The builder was used after an earlier call failed (E3013).
    #[error("[E3013] Policy builder unusable after an earlier error")]
    BuilderPoisoned,

    /// A policy name contains characters outside the safe set (E3014).
    #[error("[E3014] Invalid policy name {name:?}")]
    InvalidPolicyName {
        /// The rejected name.
        name: String,
    },

    /// No directory entry or builtin has this name (E3015).
    #[error("[E3015] Unknown policy {name:?}")]
    UnknownPolicy {
        /// The name that was looked up.
        name: String,
    },

    /// Reading the policy directory failed (E3016).
    #[error("[E3016] Policy directory error: {reason}")]
    Directory {
        /// Underlying I/O failure.
        reason: String,
    },

    /// An error attributed to a config line.
    #[error("line {line}: {source}")]
    AtLine {
        /// One-based line number.
        line: usize,
        /// The error found on that line.
        source: Box<PolicyError>,
    },
}

impl PolicyError {
    /// Create an invalid syntax error for a keyword.
    pub fn invalid_syntax(keyword: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidSyntax { keyword, reason: reason.into() }
    }

    /// Attributes the error to a one-based config line.
    pub fn at_line(self, line: usize) -> Self {
        Self::AtLine { line, source: Box::new(self) }
    }

    /// Line number for errors raised by the config parser.
    pub fn line(&self) -> Option<usize> {
        match self {
            Self::AtLine { line, .. } => Some(*line),
            _ => None,
        }
    }

    /// Returns the error code (E3001-E3016).
    pub fn code(&self) -> &'static str {
        match self {
            Self::UnknownKeyword { .. } => "E3001",
            Self::InvalidSyntax { .. } => "E3002",
            Self::InvalidPublicKey { .. } => "E3003",
            Self::DuplicateKey { .. } => "E3004",
            Self::DuplicateName { .. } => "E3005",
            Self::UndefinedName { .. } => "E3006",
            Self::InvalidThreshold { .. } => "E3007",
            Self::AlreadyMember { .. } => "E3008",
            Self::QuorumAlreadySet => "E3009",
            Self::MissingQuorum => "E3010",
            Self::InvalidCharacter { .. } => "E3011",
            Self::InvalidUtf8 => "E3012",
            Self::BuilderPoisoned => "E3013",
            Self::InvalidPolicyName { .. } => "E3014",
            Self::UnknownPolicy { .. } => "E3015",
            Self::Directory { .. } => "E3016",
            Self::AtLine { source, .. } => source.code(),
        }
    }

    /// The error without its line attribution.
    pub fn root(&self) -> &Self {
        match self {
            Self::AtLine { source, .. } => source.root(),
            other => other,
        }
    }
}

/// Reasons a cosigned tree head is rejected by a policy.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VerifyError {
    /// The log is not in the policy (E2001).
    #[error("[E2001] Unknown log: {key_hash} is not in the policy")]
    UnknownLog {
        /// Key hash the caller asked about.
        key_hash: KeyHash,
    },

    /// The log's signature on the tree head does not verify (E2002).
    #[error("[E2002] Invalid log signature")]
    InvalidLogSignature,

    /// Too few valid cosignatures to satisfy the quorum (E2003).
    #[error(
        "[E2003] Insufficient cosignatures: {verified} of {total} verified, {failed} failed"
    )]
    InsufficientCosignatures {
        /// Cosignatures carried by the tree head.
        total: usize,
        /// Cosignatures from policy witnesses that verified.
        verified: usize,
        /// Cosignatures from policy witnesses that did not verify.
        failed: usize,
    },
}

impl VerifyError {
    /// Returns the error code (E2001-E2003).
    pub const fn code(&self) -> &'static str {
        match self {
            Self::UnknownLog { .. } => "E2001",
            Self::InvalidLogSignature => "E2002",
            Self::InsufficientCosignatures { .. } => "E2003",
        }
    }

    /// Whether collecting more cosignatures could turn the rejection around.
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::InsufficientCosignatures { .. })
    }
}
