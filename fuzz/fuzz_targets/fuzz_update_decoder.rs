//! Fuzz target: `telegram::decode_updates`
//!
//! Feeds arbitrary bytes to the `getUpdates` response decoder.  It must
//! never panic; anything that is not a well-formed envelope is an error.
//!
//! cargo fuzz run fuzz_update_decoder

#![no_main]

use libfuzzer_sys::fuzz_target;
use thermobot::adapters::telegram::{decode_send, decode_updates};

fuzz_target!(|data: &[u8]| {
    if let Ok(updates) = decode_updates(data) {
        // A decoded batch came from a JSON array, which needs at least
        // a few bytes per element.
        assert!(updates.len() <= data.len());
    }
    let _ = decode_send(data);
});
