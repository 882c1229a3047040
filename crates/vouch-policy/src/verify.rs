//! Checking cosigned tree heads against a policy.

use std::collections::HashSet;

use tracing::{debug, info, warn};
use vouch_core::{checkpoint_origin, CosignedTreeHead, KeyHash};

use crate::{error::VerifyError, Policy};

/// Cosignature counts from a successful verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerificationReport {
    /// Cosignatures carried by the tree head.
    pub total: usize,
    /// Cosignatures from policy witnesses that verified.
    pub verified: usize,
    /// Cosignatures from policy witnesses that did not verify.
    pub failed: usize,
    /// Cosignatures from witnesses the policy does not know.
    pub ignored: usize,
}

impl Policy {
    /// Verifies a cosigned tree head from the log with `log_key_hash`.
    ///
    /// The log signature must verify, and the witnesses whose cosignatures
    /// verify must satisfy the quorum. Cosignatures from witnesses outside
    /// the policy are ignored; invalid ones from known witnesses are counted
    /// but do not abort verification.
    ///
    /// # Errors
    ///
    /// Returns `VerifyError::UnknownLog`, `VerifyError::InvalidLogSignature`
    /// or `VerifyError::InsufficientCosignatures`.
    pub fn verify_cosigned_tree_head(
        &self,
        log_key_hash: &KeyHash,
        cth: &CosignedTreeHead,
    ) -> Result<VerificationReport, VerifyError> {
        let log =
            self.log(log_key_hash).ok_or(VerifyError::UnknownLog { key_hash: *log_key_hash })?;

        let origin = checkpoint_origin(log_key_hash);
        if !cth.signed_tree_head.verify_for_origin(&log.public_key, &origin) {
            warn!(log = %log_key_hash, size = cth.tree_head().size, "invalid log signature");
            return Err(VerifyError::InvalidLogSignature);
        }

        let mut verified = HashSet::new();
        let mut failed = 0;
        let mut ignored = 0;

        for (key_hash, cosignature) in &cth.cosignatures {
            let Some(witness) = self.witness(key_hash) else {
                debug!(witness = %key_hash, "ignoring cosignature from unknown witness");
                ignored += 1;
                continue;
            };

            if cosignature.verify(&witness.public_key, &origin, cth.tree_head()) {
                verified.insert(*key_hash);
            } else {
                warn!(
                    witness = %key_hash,
                    timestamp = cosignature.timestamp,
                    "cosignature failed verification"
                );
                failed += 1;
            }
        }

        let total = cth.cosignatures.len();
        if !self.is_quorum_satisfied(&verified) {
            warn!(
                log = %log_key_hash,
                total,
                verified = verified.len(),
                failed,
                "quorum not satisfied"
            );
            return Err(VerifyError::InsufficientCosignatures {
                total,
                verified: verified.len(),
                failed,
            });
        }

        info!(
            log = %log_key_hash,
            size = cth.tree_head().size,
            verified = verified.len(),
            failed,
            ignored,
            "cosigned tree head verified"
        );
        Ok(VerificationReport { total, verified: verified.len(), failed, ignored })
    }
}
