//! Key=value transport encoding for signed and cosigned tree heads.
//!
//! ```text
//! size=<decimal>
//! root_hash=<hex>
//! signature=<hex>
//! cosignature=<hex key hash> <decimal timestamp> <hex signature>
//! ```
//!
//! Keys appear in exactly this order, every line ends in `\n`, hex is
//! lowercase and decimals carry no sign or leading zeros. The encoding is
//! therefore canonical: parsing and re-rendering reproduces the input bytes.

use std::fmt::Write as _;

use crate::{
    crypto::{Hash, KeyHash, Signature},
    error::{CoreError, Result},
    tree_head::{Cosignature, CosignedTreeHead, SignedTreeHead, TreeHead},
};

const SIZE: &str = "size";
const ROOT_HASH: &str = "root_hash";
const SIGNATURE: &str = "signature";
const COSIGNATURE: &str = "cosignature";

/// Parses a canonical unsigned decimal.
///
/// Rejects empty strings, signs, leading zeros (other than `0` itself) and
/// values that overflow `u64`.
pub fn parse_decimal(s: &str) -> Option<u64> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if s.len() > 1 && s.starts_with('0') {
        return None;
    }
    s.parse().ok()
}

impl SignedTreeHead {
    /// Renders the key=value encoding.
    pub fn to_ascii(&self) -> String {
        let mut out = String::new();
        self.write_ascii(&mut out);
        out
    }

    /// Parses the key=value encoding of a signed tree head.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::MalformedAscii` naming the first offending line.
    pub fn from_ascii(text: &str) -> Result<Self> {
        let lines = split_lines(text)?;
        let sth = parse_signed(&lines)?;
        if let Some(extra) = lines.get(3) {
            return Err(unexpected_line(4, extra));
        }
        Ok(sth)
    }

    fn write_ascii(&self, out: &mut String) {
        let _ = writeln!(out, "{SIZE}={}", self.tree_head.size);
        let _ = writeln!(out, "{ROOT_HASH}={}", self.tree_head.root_hash);
        let _ = writeln!(out, "{SIGNATURE}={}", self.signature);
    }
}

impl CosignedTreeHead {
    /// Renders the key=value encoding, cosignatures ordered by key hash.
    pub fn to_ascii(&self) -> String {
        let mut out = String::new();
        self.signed_tree_head.write_ascii(&mut out);
        for cosignature in self.cosignatures.values() {
            let _ = writeln!(
                out,
                "{COSIGNATURE}={} {} {}",
                cosignature.key_hash, cosignature.timestamp, cosignature.signature
            );
        }
        out
    }

    /// Parses the key=value encoding of a cosigned tree head.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::MalformedAscii` for syntax errors and
    /// `CoreError::DuplicateCosignature` if a witness appears twice.
    pub fn from_ascii(text: &str) -> Result<Self> {
        let lines = split_lines(text)?;
        let mut cth = Self::new(parse_signed(&lines)?);

        for (index, line) in lines.iter().enumerate().skip(3) {
            let number = index + 1;
            let value = value_of(line, number, COSIGNATURE)?;
            cth.add_cosignature(parse_cosignature(value, number)?)?;
        }
        Ok(cth)
    }
}

fn split_lines(text: &str) -> Result<Vec<&str>> {
    match text.strip_suffix('\n') {
        Some(body) => Ok(body.split('\n').collect()),
        None => {
            let last = text.split('\n').count();
            Err(CoreError::malformed_ascii(last, "missing trailing newline"))
        },
    }
}

fn parse_signed(lines: &[&str]) -> Result<SignedTreeHead> {
    let size = expect_line(lines, 0, SIZE)?;
    let size = parse_decimal(size)
        .ok_or_else(|| CoreError::malformed_ascii(1, format!("invalid size {size:?}")))?;
    let root_hash = parse_hex(expect_line(lines, 1, ROOT_HASH)?, 2, Hash::from_hex)?;
    let signature = parse_hex(expect_line(lines, 2, SIGNATURE)?, 3, Signature::from_hex)?;

    Ok(SignedTreeHead { tree_head: TreeHead::new(size, root_hash), signature })
}

fn parse_cosignature(value: &str, line: usize) -> Result<Cosignature> {
    let fields: Vec<&str> = value.split(' ').collect();
    let [key_hash, timestamp, signature] = fields.as_slice() else {
        return Err(CoreError::malformed_ascii(
            line,
            format!("expected 3 space-separated fields, got {}", fields.len()),
        ));
    };

    let key_hash = parse_hex(key_hash, line, KeyHash::from_hex)?;
    let timestamp = parse_decimal(timestamp).ok_or_else(|| {
        CoreError::malformed_ascii(line, format!("invalid timestamp {timestamp:?}"))
    })?;
    let signature = parse_hex(signature, line, Signature::from_hex)?;

    Ok(Cosignature { key_hash, timestamp, signature })
}

fn expect_line<'a>(lines: &[&'a str], index: usize, key: &str) -> Result<&'a str> {
    let number = index + 1;
    let line = lines
        .get(index)
        .ok_or_else(|| CoreError::malformed_ascii(number, format!("missing key {key:?}")))?;
    value_of(line, number, key)
}

fn value_of<'a>(line: &'a str, number: usize, key: &str) -> Result<&'a str> {
    match line.split_once('=') {
        Some((found, value)) if found == key => Ok(value),
        _ => Err(CoreError::malformed_ascii(number, format!("expected key {key:?}"))),
    }
}

fn parse_hex<T>(value: &str, line: usize, decode: fn(&str) -> Result<T>) -> Result<T> {
    if value.bytes().any(|b| b.is_ascii_uppercase()) {
        return Err(CoreError::malformed_ascii(line, "hex must be lowercase"));
    }
    decode(value).map_err(|e| CoreError::malformed_ascii(line, e.to_string()))
}

fn unexpected_line(line: usize, content: &str) -> CoreError {
    CoreError::malformed_ascii(line, format!("unexpected line {content:?}"))
}
