//! Error types for primitive decoding, signing and the ASCII codec.
//!
//! Codes `E0001`-`E0006` are stable and appear at the start of every message.
//!
//! All variants describe malformed input or a failed signer; none of them
//! are produced by panicking code paths, so untrusted bytes always surface
//! as a recoverable `CoreError`.

use crate::crypto::KeyHash;

/// Errors produced while decoding primitives or tree head encodings.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CoreError {
    /// A hex field did not decode to the expected fixed-size value.
    #[error("[E0001] Invalid {what}: {reason}")]
    InvalidHex {
        /// Which kind of value was being decoded (for example "public key").
        what: &'static str,
        /// Why decoding failed.
        reason: String,
    },

    /// A key id blob had the wrong number of bytes.
    #[error("[E0002] Invalid key id length: expected 4 bytes, got {len}")]
    InvalidKeyIdLength {
        /// Number of bytes that were supplied.
        len: usize,
    },

    /// A signature type byte is not one of the reserved values.
    #[error("[E0003] Unsupported signature type 0x{sig_type:02x}")]
    UnsupportedSignatureType {
        /// The rejected type byte.
        sig_type: u8,
    },

    /// The signer could not produce a signature.
    #[error("[E0004] Signing failed: {reason}")]
    SigningFailed {
        /// Reason reported by the signer.
        reason: String,
    },

    /// A line of the key=value ASCII encoding could not be parsed.
    #[error("[E0005] Line {line}: {reason}")]
    MalformedAscii {
        /// One-based line number of the offending line.
        line: usize,
        /// What was wrong with it.
        reason: String,
    },

    /// Two cosignatures claim the same witness key hash.
    #[error("[E0006] Duplicate cosignature from witness {key_hash}")]
    DuplicateCosignature {
        /// Key hash that appeared more than once.
        key_hash: KeyHash,
    },
}

impl CoreError {
    /// Create an invalid hex error for the named kind of value.
    pub fn invalid_hex(what: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidHex { what, reason: reason.into() }
    }

    /// Create a signing failure with a custom reason.
    pub fn signing_failed(reason: impl Into<String>) -> Self {
        Self::SigningFailed { reason: reason.into() }
    }

    /// Create a malformed ASCII error for a one-based line number.
    pub fn malformed_ascii(line: usize, reason: impl Into<String>) -> Self {
        Self::MalformedAscii { line, reason: reason.into() }
    }

    /// Whether the error was caused by the input rather than by the signer.
    pub fn is_client_error(&self) -> bool {
        match self {
            Self::InvalidHex { .. }
            | Self::InvalidKeyIdLength { .. }
            | Self::UnsupportedSignatureType { .. }
            | Self::MalformedAscii { .. }
            | Self::DuplicateCosignature { .. } => true,

            Self::SigningFailed { .. } => false,
        }
    }

    /// Stable code for operators and logs.
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidHex { .. } => "E0001",
            Self::InvalidKeyIdLength { .. } => "E0002",
            Self::UnsupportedSignatureType { .. } => "E0003",
            Self::SigningFailed { .. } => "E0004",
            Self::MalformedAscii { .. } => "E0005",
            Self::DuplicateCosignature { .. } => "E0006",
        }
    }
}

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_message_formatting() {
        let err = CoreError::UnsupportedSignatureType { sig_type: 0x7f };
        assert_eq!(err.to_string(), "[E0003] Unsupported signature type 0x7f");

        let err = CoreError::malformed_ascii(3, "expected key \"signature\"");
        assert_eq!(err.to_string(), "[E0005] Line 3: expected key \"signature\"");

        let err = CoreError::InvalidKeyIdLength { len: 7 };
        assert_eq!(err.to_string(), "[E0002] Invalid key id length: expected 4 bytes, got 7");
    }

    #[test]
    fn error_client_classification() {
        assert!(CoreError::invalid_hex("hash", "odd length").is_client_error());
        assert!(CoreError::UnsupportedSignatureType { sig_type: 2 }.is_client_error());
        assert!(!CoreError::signing_failed("agent unavailable").is_client_error());
    }

    #[test]
    fn error_codes_match_messages() {
        let errors = [
            CoreError::invalid_hex("hash", "odd length"),
            CoreError::InvalidKeyIdLength { len: 3 },
            CoreError::UnsupportedSignatureType { sig_type: 9 },
            CoreError::signing_failed("agent unavailable"),
            CoreError::malformed_ascii(1, "missing key \"size\""),
            CoreError::DuplicateCosignature { key_hash: KeyHash::new([1; 32]) },
        ];

        let codes: Vec<_> = errors.iter().map(CoreError::code).collect();
        assert_eq!(codes, ["E0001", "E0002", "E0003", "E0004", "E0005", "E0006"]);
        for err in &errors {
            assert!(err.to_string().starts_with(&format!("[{}] ", err.code())));
        }
    }
}
