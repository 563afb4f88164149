//! Fuzz target: `Command::parse` and reply escaping
//!
//! cargo fuzz run fuzz_command_parse

#![no_main]

use libfuzzer_sys::fuzz_target;
use thermobot::adapters::utils::percent_escape;
use thermobot::app::commands::Command;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = core::str::from_utf8(data) else {
        return;
    };
    let parsed = Command::parse(text);
    assert_eq!(parsed.is_some(), text.trim().starts_with('/'));

    let escaped = percent_escape(text);
    assert!(escaped.is_ascii());
    assert!(escaped.len() >= text.len());
});
