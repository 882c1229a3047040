//! Builders for policies and cosigned tree heads.
//!
//! Keys come from fixed seeds so that every run produces the same key
//! hashes and signatures.

use vouch_checkpoint::{cosignature_line, Checkpoint};
use vouch_core::{
    checkpoint_origin, CosignedTreeHead, Hash, PublicKey, Signer, SigningService, TreeHead,
};

/// Cosigning time used when a test does not care.
pub const DEFAULT_TIMESTAMP: u64 = 1_700_000_000;

/// The development log key (seed `0x11`).
pub fn log_signer() -> SigningService {
    signer_from_seed(0x11)
}

/// Witness key number `index` (seed `0x20 + index`).
///
/// # Panics
///
/// Panics if `index` is larger than 0xdf.
pub fn witness_signer(index: usize) -> SigningService {
    let offset = u8::try_from(index).ok().and_then(|i| i.checked_add(0x20));
    signer_from_seed(offset.unwrap_or_else(|| panic!("witness index {index} out of range")))
}

fn signer_from_seed(byte: u8) -> SigningService {
    SigningService::try_from_bytes(&[byte; 32])
        .unwrap_or_else(|e| panic!("fixed seed must be valid: {e}"))
}

/// Builder for policy configuration text.
#[derive(Debug, Default, Clone)]
pub struct PolicyTextBuilder {
    lines: Vec<String>,
}

impl PolicyTextBuilder {
    /// Create an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a `log` line.
    pub fn log(mut self, public_key: &PublicKey, url: Option<&str>) -> Self {
        self.lines.push(with_url(format!("log {public_key}"), url));
        self
    }

    /// Adds a `witness` line.
    pub fn witness(mut self, name: &str, public_key: &PublicKey, url: Option<&str>) -> Self {
        self.lines.push(with_url(format!("witness {name} {public_key}"), url));
        self
    }

    /// Adds a `group` line; `threshold` is written as given.
    pub fn group(mut self, name: &str, threshold: impl ToString, members: &[&str]) -> Self {
        self.lines.push(format!("group {name} {} {}", threshold.to_string(), members.join(" ")));
        self
    }

    /// Adds a `quorum` line.
    pub fn quorum(mut self, name: &str) -> Self {
        self.lines.push(format!("quorum {name}"));
        self
    }

    /// Adds a comment line.
    pub fn comment(mut self, text: &str) -> Self {
        self.lines.push(format!("# {text}"));
        self
    }

    /// Renders the policy text, one declaration per line.
    pub fn build(self) -> String {
        let mut text = self.lines.join("\n");
        text.push('\n');
        text
    }
}

fn with_url(line: String, url: Option<&str>) -> String {
    match url {
        Some(url) => format!("{line} {url}"),
        None => line,
    }
}

/// Builder for cosigned tree heads signed by fixture keys.
#[derive(Debug, Clone)]
pub struct CosignedTreeHeadBuilder<'a> {
    log: &'a SigningService,
    tree_head: TreeHead,
    cosigners: Vec<(&'a SigningService, u64, bool)>,
    forge_log_signature: bool,
}

impl<'a> CosignedTreeHeadBuilder<'a> {
    /// Create a builder for a tree head of size 42 signed by `log`.
    pub fn new(log: &'a SigningService) -> Self {
        Self {
            log,
            tree_head: TreeHead::new(42, Hash::new([7; 32])),
            cosigners: Vec::new(),
            forge_log_signature: false,
        }
    }

    /// Sets the tree size.
    pub fn size(mut self, size: u64) -> Self {
        self.tree_head.size = size;
        self
    }

    /// Sets the root hash.
    pub fn root_hash(mut self, root_hash: Hash) -> Self {
        self.tree_head.root_hash = root_hash;
        self
    }

    /// Adds a valid cosignature from `witness` at the default timestamp.
    pub fn cosigned_by(self, witness: &'a SigningService) -> Self {
        self.cosigned_at(witness, DEFAULT_TIMESTAMP)
    }

    /// Adds a valid cosignature from `witness` at `timestamp`.
    pub fn cosigned_at(mut self, witness: &'a SigningService, timestamp: u64) -> Self {
        self.cosigners.push((witness, timestamp, true));
        self
    }

    /// Adds a cosignature from `witness` that will not verify.
    pub fn forged_by(mut self, witness: &'a SigningService) -> Self {
        self.cosigners.push((witness, DEFAULT_TIMESTAMP, false));
        self
    }

    /// Replaces the log signature with one that will not verify.
    pub fn forged_log_signature(mut self) -> Self {
        self.forge_log_signature = true;
        self
    }

    /// Origin the tree head is signed under.
    pub fn origin(&self) -> String {
        checkpoint_origin(&self.log.key_hash())
    }

    /// Signs and cosigns the tree head.
    ///
    /// # Panics
    ///
    /// Panics if a witness was added twice.
    pub fn build(self) -> CosignedTreeHead {
        let origin = self.origin();
        let mut sth = self.tree_head.sign(self.log).unwrap_or_else(|e| panic!("log signing: {e}"));
        if self.forge_log_signature {
            sth.signature.0[0] ^= 0x01;
        }

        let mut cth = CosignedTreeHead::new(sth);
        for (witness, timestamp, valid) in self.cosigners {
            // A cosignature over a different time does not verify for `timestamp`.
            let signed_at = if valid { timestamp } else { timestamp.wrapping_add(1) };
            let mut cosignature = self
                .tree_head
                .cosign(witness, &origin, signed_at)
                .unwrap_or_else(|e| panic!("witness signing: {e}"));
            cosignature.timestamp = timestamp;
            cth.add_cosignature(cosignature).unwrap_or_else(|e| panic!("{e}"));
        }
        cth
    }

    /// Renders a checkpoint followed by one signature line per cosigner.
    pub fn build_checkpoint_text(self) -> String {
        let log_key = self.log.public_key();
        let names: Vec<(String, PublicKey)> = self
            .cosigners
            .iter()
            .enumerate()
            .map(|(i, (witness, ..))| (format!("witness-{i}.example.org"), witness.public_key()))
            .collect();

        let cth = self.build();
        let mut text = Checkpoint::for_log(cth.signed_tree_head, &log_key).to_ascii();
        for (name, key) in names {
            if let Some(cosignature) = cth.cosignatures.get(&key.key_hash()) {
                text.push_str(&cosignature_line(&name, &key, cosignature));
            }
        }
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixture_keys_are_stable() {
        assert_eq!(
            log_signer().key_hash().to_string(),
            "10ba682c8ad13513971e8b56881aab8bd702bb807796eca81932c735a94d6e6d"
        );
        assert_eq!(
            witness_signer(0).key_hash().to_string(),
            "c6107c1842c20449a2e69adba9606b0780be1d0c9cdca5fd2fb771b388d2eadb"
        );
    }

    #[test]
    fn policy_text_layout() {
        let text = PolicyTextBuilder::new()
            .comment("two witnesses")
            .log(&PublicKey::new([1; 32]), Some("https://log.example/"))
            .witness("w0", &PublicKey::new([2; 32]), None)
            .group("g", "any", &["w0"])
            .quorum("g")
            .build();

        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "# two witnesses");
        assert_eq!(lines[1], format!("log {} https://log.example/", "01".repeat(32)));
        assert_eq!(lines[3], "group g any w0");
        assert_eq!(lines[4], "quorum g");
        assert!(text.ends_with('\n'));
    }

    #[test]
    fn forged_cosignature_does_not_verify() {
        let log = log_signer();
        let good = witness_signer(0);
        let bad = witness_signer(1);

        let builder = CosignedTreeHeadBuilder::new(&log).cosigned_by(&good).forged_by(&bad);
        let origin = builder.origin();
        let cth = builder.build();

        let check = |w: &SigningService| {
            cth.cosignatures[&w.key_hash()].verify(&w.public_key(), &origin, cth.tree_head())
        };
        assert!(check(&good));
        assert!(!check(&bad));
        assert!(cth.signed_tree_head.verify(&log.public_key()));
    }
}
