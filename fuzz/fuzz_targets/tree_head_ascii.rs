#![no_main]

//! Fuzz target for the key=value tree head encoding.
//!
//! The encoding is canonical: anything that parses renders back to the
//! exact input.

use libfuzzer_sys::fuzz_target;
use vouch_core::CosignedTreeHead;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    if let Ok(cth) = CosignedTreeHead::from_ascii(text) {
        assert_eq!(cth.to_ascii(), text);
    }
});
