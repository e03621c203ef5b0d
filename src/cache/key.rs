//! Cache key normalization.
//!
//! Raw keys look like `npm-@scope/pkg` or `github-owner-repo`. They become
//! file names in the cache directory, so reserved characters are replaced by
//! fixed tokens:
//!
//! | input | token |
//! |-------|-------|
//! | `@`   | `_at_` |
//! | `/`   | `_slash_` |
//! | `_`   | `__` |
//! | anything outside `[A-Za-z0-9.-]` | `_x<HEX>_` (UTF-8 bytes) |
//!
//! Every token starts with `_` and the character after it (`_`, `a`, `s`,
//! `x`) identifies the token, so the encoding can be decoded left to right
//! and two different raw keys never share a normalized key. A leading `.` is
//! escaped as well so no key becomes a hidden file or `..`.

use std::fmt::Write;

/// Maps a raw lookup identifier to a file-name-safe cache key.
///
/// # Examples
///
/// ```rust
/// use catalog_enrich::cache::normalize_key;
///
/// assert_eq!(normalize_key("npm-@sveltejs/kit"), "npm-_at_sveltejs_slash_kit");
/// assert_eq!(normalize_key("github-foo-bar"), "github-foo-bar");
/// ```
#[must_use]
pub fn normalize_key(raw: &str) -> String {
    let mut normalized = String::with_capacity(raw.len());

    for (index, ch) in raw.chars().enumerate() {
        match ch {
            '@' => normalized.push_str("_at_"),
            '/' => normalized.push_str("_slash_"),
            '_' => normalized.push_str("__"),
            '.' if index == 0 => escape(&mut normalized, ch),
            c if c.is_ascii_alphanumeric() || c == '-' || c == '.' => normalized.push(c),
            c => escape(&mut normalized, c),
        }
    }

    normalized
}

fn escape(out: &mut String, ch: char) {
    let mut buf = [0u8; 4];
    out.push_str("_x");
    for byte in ch.encode_utf8(&mut buf).bytes() {
        let _ = write!(out, "{byte:02X}");
    }
    out.push('_');
}
