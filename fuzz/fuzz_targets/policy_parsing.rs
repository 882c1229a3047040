#![no_main]

//! Fuzz target for the policy text parser.
//!
//! Operators edit policy files by hand. Every byte string must either
//! produce a policy or a line-numbered error.

use libfuzzer_sys::fuzz_target;
use vouch_policy::Policy;

fuzz_target!(|data: &[u8]| {
    match Policy::parse(data) {
        Ok(policy) => {
            let _ = policy.is_quorum_satisfied(&Default::default());
        },
        Err(err) => {
            assert!(err.code().starts_with("E3"));
        },
    }
});
