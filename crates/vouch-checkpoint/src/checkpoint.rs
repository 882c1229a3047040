//! Checkpoint rendering, parsing and verification.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use tracing::debug;
use vouch_core::{
    checkpoint_origin,
    crypto::{HASH_SIZE, SIGNATURE_SIZE},
    key_id::KEY_ID_SIZE,
    parse_decimal, Cosignature, Hash, KeyId, PublicKey, Signature, SignatureType, SignedTreeHead,
    TreeHead,
};

use crate::error::{CheckpointError, Result};

/// Prefix of every signature line: an em dash followed by a space.
pub const SIGNATURE_LINE_PREFIX: &str = "\u{2014} ";

/// Upper bound on signature lines accepted in one checkpoint.
pub const MAX_SIGNATURE_LINES: usize = 16;

const LOG_SIGNATURE_BLOB_SIZE: usize = KEY_ID_SIZE + SIGNATURE_SIZE;

/// A log's signed tree head in checkpoint form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Checkpoint {
    /// Origin line; also the name on the log's signature line.
    pub origin: String,

    /// Tree head and log signature.
    pub signed_tree_head: SignedTreeHead,

    /// Key id carried on the log's signature line.
    pub key_id: KeyId,
}

impl Checkpoint {
    /// Create a checkpoint from its parts.
    ///
    /// The origin doubles as the name on the log's signature line, so it
    /// must be non-empty and free of spaces and control characters for the
    /// rendering to parse back; `from_ascii` rejects anything else.
    pub fn new(origin: impl Into<String>, signed_tree_head: SignedTreeHead, key_id: KeyId) -> Self {
        Self { origin: origin.into(), signed_tree_head, key_id }
    }

    /// Wraps a signed tree head under the origin and key id derived from `log_key`.
    pub fn for_log(signed_tree_head: SignedTreeHead, log_key: &PublicKey) -> Self {
        let origin = checkpoint_origin(&log_key.key_hash());
        let key_id = KeyId::derive(&origin, SignatureType::Ed25519, log_key);
        Self { origin, signed_tree_head, key_id }
    }

    /// The checkpointed tree head.
    pub fn tree_head(&self) -> &TreeHead {
        &self.signed_tree_head.tree_head
    }

    /// Renders the canonical text form with the log's signature line.
    pub fn to_ascii(&self) -> String {
        let mut blob = Vec::with_capacity(LOG_SIGNATURE_BLOB_SIZE);
        blob.extend_from_slice(self.key_id.as_bytes());
        blob.extend_from_slice(self.signed_tree_head.signature.as_bytes());

        format!(
            "{}\n{SIGNATURE_LINE_PREFIX}{} {}\n",
            self.tree_head().to_checkpoint_body(&self.origin),
            self.origin,
            STANDARD.encode(blob)
        )
    }

    /// Parses a checkpoint.
    ///
    /// Exactly one signature line must be named after the origin and carry a
    /// key id plus Ed25519 signature. Lines for other names, or with blobs of
    /// another size, are skipped.
    ///
    /// # Errors
    ///
    /// Returns a `CheckpointError` for malformed structure, an oversized
    /// signature paragraph, a missing or repeated log signature, or content
    /// after the signatures.
    pub fn from_ascii(text: &str) -> Result<Self> {
        let lines = split_lines(text)?;
        let (origin, tree_head) = parse_header(&lines)?;

        let mut found: Option<(KeyId, Signature)> = None;
        let mut seen = 0;

        for (index, line) in lines.iter().enumerate().skip(4) {
            let number = index + 1;
            if line.is_empty() {
                return Err(CheckpointError::TrailingData { line: number });
            }
            if seen == MAX_SIGNATURE_LINES {
                return Err(CheckpointError::TooManySignatures { max: MAX_SIGNATURE_LINES });
            }
            seen += 1;

            let (name, blob) = parse_signature_line(line, number)?;
            if name != origin {
                debug!(line = number, name, "skipping signature line for another key");
                continue;
            }
            if blob.len() != LOG_SIGNATURE_BLOB_SIZE {
                debug!(line = number, len = blob.len(), "skipping non-log signature line");
                continue;
            }
            if found.is_some() {
                return Err(CheckpointError::DuplicateSignature { line: number });
            }

            let (key_id, signature) = blob.split_at(KEY_ID_SIZE);
            let key_id = KeyId::from_slice(key_id)
                .map_err(|e| CheckpointError::malformed_signature_line(number, e.to_string()))?;
            let mut bytes = [0u8; SIGNATURE_SIZE];
            bytes.copy_from_slice(signature);
            found = Some((key_id, Signature::new(bytes)));
        }

        let Some((key_id, signature)) = found else {
            return Err(CheckpointError::MissingSignature { origin: origin.to_string() });
        };

        let signed_tree_head = SignedTreeHead { tree_head, signature };
        Ok(Self { origin: origin.to_string(), signed_tree_head, key_id })
    }

    /// Verifies the checkpoint against the log's public key.
    ///
    /// # Errors
    ///
    /// Returns `CheckpointError::KeyIdMismatch` if the key id was not derived
    /// from this origin and key, and `CheckpointError::InvalidSignature` if
    /// the signature does not verify.
    pub fn verify(&self, public_key: &PublicKey) -> Result<()> {
        let expected = KeyId::derive(&self.origin, SignatureType::Ed25519, public_key);
        if expected != self.key_id {
            return Err(CheckpointError::KeyIdMismatch { expected, found: self.key_id });
        }
        if !self.signed_tree_head.verify_for_origin(public_key, &self.origin) {
            return Err(CheckpointError::InvalidSignature);
        }
        Ok(())
    }
}

/// Renders a witness cosignature as a checkpoint signature line.
///
/// The blob is the witness key id, the big-endian timestamp and the
/// signature. Checkpoint parsing treats such lines as foreign.
pub fn cosignature_line(
    witness_name: &str,
    witness_key: &PublicKey,
    cosignature: &Cosignature,
) -> String {
    let key_id = KeyId::derive(witness_name, SignatureType::CosignatureV1, witness_key);

    let mut blob = Vec::with_capacity(KEY_ID_SIZE + 8 + SIGNATURE_SIZE);
    blob.extend_from_slice(key_id.as_bytes());
    blob.extend_from_slice(&cosignature.timestamp.to_be_bytes());
    blob.extend_from_slice(cosignature.signature.as_bytes());

    format!("{SIGNATURE_LINE_PREFIX}{witness_name} {}\n", STANDARD.encode(blob))
}

fn split_lines(text: &str) -> Result<Vec<&str>> {
    match text.strip_suffix('\n') {
        Some(body) => Ok(body.split('\n').collect()),
        None => Err(CheckpointError::MissingNewline { line: text.split('\n').count() }),
    }
}

fn parse_header<'a>(lines: &[&'a str]) -> Result<(&'a str, TreeHead)> {
    let field = |index: usize, what: &str| {
        lines.get(index).copied().ok_or_else(|| {
            CheckpointError::malformed_header(index + 1, format!("missing {what}"))
        })
    };

    let origin = field(0, "origin")?;
    if origin.is_empty() {
        return Err(CheckpointError::malformed_header(1, "empty origin"));
    }
    if let Some(c) = origin.chars().find(|&c| c == ' ' || c.is_control()) {
        return Err(CheckpointError::malformed_header(
            1,
            format!("character {:#04x} not allowed in origin", u32::from(c)),
        ));
    }

    let size = field(1, "size")?;
    let size = parse_decimal(size)
        .ok_or_else(|| CheckpointError::malformed_header(2, format!("invalid size {size:?}")))?;

    let root_hash = STANDARD
        .decode(field(2, "root hash")?)
        .map_err(|e| CheckpointError::malformed_header(3, format!("invalid root hash: {e}")))?;
    let root_hash: [u8; HASH_SIZE] = root_hash.as_slice().try_into().map_err(|_| {
        CheckpointError::malformed_header(
            3,
            format!("root hash is {} bytes, expected {HASH_SIZE}", root_hash.len()),
        )
    })?;

    if !field(3, "blank line")?.is_empty() {
        return Err(CheckpointError::malformed_header(4, "expected blank line after header"));
    }

    Ok((origin, TreeHead::new(size, Hash::new(root_hash))))
}

fn parse_signature_line(line: &str, number: usize) -> Result<(&str, Vec<u8>)> {
    let rest = line.strip_prefix(SIGNATURE_LINE_PREFIX).ok_or_else(|| {
        CheckpointError::malformed_signature_line(number, "missing signature line prefix")
    })?;

    let (name, encoded) = match rest.split(' ').collect::<Vec<_>>().as_slice() {
        [name, encoded] if !name.is_empty() && !encoded.is_empty() => (*name, *encoded),
        _ => {
            return Err(CheckpointError::malformed_signature_line(
                number,
                "expected a key name and a base64 signature",
            ))
        },
    };
    if name.chars().any(char::is_control) {
        return Err(CheckpointError::malformed_signature_line(number, "control character in name"));
    }

    let blob = STANDARD.decode(encoded).map_err(|e| {
        CheckpointError::malformed_signature_line(number, format!("invalid base64: {e}"))
    })?;
    Ok((name, blob))
}
