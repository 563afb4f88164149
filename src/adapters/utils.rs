//! Shared helpers for the network adapters.

use core::fmt::Write as _;

/// Returns `true` if every byte of `s` is in the printable ASCII range
/// `0x20..=0x7E` (space through tilde, inclusive).
///
/// Used to validate WiFi SSID strings.
pub(super) fn is_printable_ascii(s: &str) -> bool {
    s.bytes().all(|b| (0x20..=0x7E).contains(&b))
}

/// Percent-encode `s` for use as a URL query value.
///
/// Only RFC 3986 unreserved bytes (`A–Z a–z 0–9 - . _ ~`) pass through;
/// everything else, including each byte of a multi-byte UTF-8 sequence,
/// becomes `%XX` with upper-case hex.
pub fn percent_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for b in s.bytes() {
        if b.is_ascii_alphanumeric() || matches!(b, b'-' | b'.' | b'_' | b'~') {
            out.push(char::from(b));
        } else {
            let _ = write!(out, "%{:02X}", b);
        }
    }
    out
}
