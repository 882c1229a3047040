#![no_main]

//! Fuzz target for checkpoint parsing.
//!
//! Checkpoints arrive from logs and witnesses over the network, so the
//! parser must reject anything malformed without panicking. Accepted
//! checkpoints must render back to the same bytes when they carry no
//! foreign signature lines.

use libfuzzer_sys::fuzz_target;
use vouch_checkpoint::Checkpoint;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(checkpoint) = Checkpoint::from_ascii(text) else {
        return;
    };

    let rendered = checkpoint.to_ascii();
    let reparsed = Checkpoint::from_ascii(&rendered).unwrap();
    assert_eq!(reparsed, checkpoint);
});
