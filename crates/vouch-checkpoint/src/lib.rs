//! Signed checkpoints for transparency logs.
//!
//! A checkpoint is the canonical text rendering of a log's signed tree head:
//! a three line header (origin, size, base64 root hash), a blank line, and a
//! paragraph of `— <name> <base64>` signature lines. The parser is strict
//! about structure but skips signature lines that belong to other keys, so a
//! checkpoint can carry witness cosignatures alongside the log signature.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod checkpoint;
pub mod error;

pub use checkpoint::{cosignature_line, Checkpoint, MAX_SIGNATURE_LINES, SIGNATURE_LINE_PREFIX};
pub use error::{CheckpointError, Result};
