//! Error taxonomy for checkpoint parsing and verification.
//!
//! Codes `E1001`-`E1009` let operators tell structural problems apart from
//! signature failures without parsing messages.

use thiserror::Error;
use vouch_core::KeyId;

/// Result type alias using `CheckpointError`.
pub type Result<T> = std::result::Result<T, CheckpointError>;

/// Errors produced while parsing or verifying a checkpoint.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CheckpointError {
    /// A line is not terminated by `\n` (E1001).
    #[error("[E1001] Missing newline: line {line} is not newline-terminated")]
    MissingNewline {
        /// One-based line number.
        line: usize,
    },

    /// The origin, size or root hash line is malformed (E1002).
    #[error("[E1002] Malformed header: line {line}: {reason}")]
    MalformedHeader {
        /// One-based line number.
        line: usize,
        /// What was wrong with the line.
        reason: String,
    },

    /// A signature line does not have the `— <name> <base64>` shape (E1003).
    #[error("[E1003] Malformed signature line {line}: {reason}")]
    MalformedSignatureLine {
        /// One-based line number.
        line: usize,
        /// What was wrong with the line.
        reason: String,
    },

    /// The signature paragraph exceeds the line limit (E1004).
    #[error("[E1004] Too many signature lines: more than {max}")]
    TooManySignatures {
        /// Maximum number of signature lines accepted.
        max: usize,
    },

    /// No signature line carries a log signature for the origin (E1005).
    #[error("[E1005] Missing signature: no log signature line for origin {origin}")]
    MissingSignature {
        /// Origin the parser looked for.
        origin: String,
    },

    /// More than one signature line matches (E1006).
    #[error("[E1006] Duplicate signature: line {line} repeats the log signature")]
    DuplicateSignature {
        /// One-based line number of the second match.
        line: usize,
    },

    /// Content follows the signature paragraph (E1007).
    #[error("[E1007] Trailing data at line {line}")]
    TrailingData {
        /// One-based line number where the unexpected content starts.
        line: usize,
    },

    /// The parsed key id is not the one derived from the public key (E1008).
    #[error("[E1008] Key id mismatch: expected {expected}, found {found}")]
    KeyIdMismatch {
        /// Key id derived from the origin and public key.
        expected: KeyId,
        /// Key id carried by the checkpoint.
        found: KeyId,
    },

    /// The log signature does not verify (E1009).
    #[error("[E1009] Invalid signature: checkpoint signature does not verify")]
    InvalidSignature,
}

impl CheckpointError {
    /// Create a malformed header error.
    pub fn malformed_header(line: usize, reason: impl Into<String>) -> Self {
        Self::MalformedHeader { line, reason: reason.into() }
    }

    /// Create a malformed signature line error.
    pub fn malformed_signature_line(line: usize, reason: impl Into<String>) -> Self {
        Self::MalformedSignatureLine { line, reason: reason.into() }
    }

    /// Returns the error code (E1001-E1009).
    pub const fn code(&self) -> &'static str {
        match self {
            Self::MissingNewline { .. } => "E1001",
            Self::MalformedHeader { .. } => "E1002",
            Self::MalformedSignatureLine { .. } => "E1003",
            Self::TooManySignatures { .. } => "E1004",
            Self::MissingSignature { .. } => "E1005",
            Self::DuplicateSignature { .. } => "E1006",
            Self::TrailingData { .. } => "E1007",
            Self::KeyIdMismatch { .. } => "E1008",
            Self::InvalidSignature => "E1009",
        }
    }

    /// Whether the error was raised by `Checkpoint::verify` rather than the parser.
    pub const fn is_verification_failure(&self) -> bool {
        matches!(self, Self::KeyIdMismatch { .. } | Self::InvalidSignature)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_codes_are_stable() {
        assert_eq!(CheckpointError::MissingNewline { line: 1 }.code(), "E1001");
        assert_eq!(CheckpointError::malformed_header(2, "bad size").code(), "E1002");
        assert_eq!(CheckpointError::TooManySignatures { max: 16 }.code(), "E1004");
        assert_eq!(CheckpointError::DuplicateSignature { line: 6 }.code(), "E1006");
        assert_eq!(CheckpointError::InvalidSignature.code(), "E1009");
    }

    #[test]
    fn error_message_formatting() {
        let err = CheckpointError::malformed_signature_line(5, "invalid base64");
        assert_eq!(err.to_string(), "[E1003] Malformed signature line 5: invalid base64");

        let err = CheckpointError::TrailingData { line: 7 };
        assert_eq!(err.to_string(), "[E1007] Trailing data at line 7");
    }

    #[test]
    fn verification_failures_identified() {
        assert!(CheckpointError::InvalidSignature.is_verification_failure());
        assert!(CheckpointError::KeyIdMismatch { expected: KeyId([0; 4]), found: KeyId([1; 4]) }
            .is_verification_failure());
        assert!(!CheckpointError::TrailingData { line: 1 }.is_verification_failure());
    }
}
