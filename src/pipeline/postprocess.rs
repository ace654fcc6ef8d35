//! Post-processing: deterministic cleanup of raw model output before it is
//! parsed as JSON.
//!
//! Even when told to "return ONLY the JSON array", chat models regularly
//! wrap the answer in a ```` ```json ```` fence, emit a byte-order mark or
//! use `\r\n` line endings. These rules remove that packaging and nothing
//! else: prose around the JSON is left in place, so a non-compliant answer
//! still fails to parse and is reported as malformed.
//!
//! ## Rule Order
//!
//! Invisible characters go first so a BOM cannot hide the opening fence;
//! line endings are normalised before the fence regex, which matches `\n`.
//! Invisible characters are only removed around the response, never
//! inside it: a soft hyphen or zero-width joiner in an extracted name is
//! part of the value.

use once_cell::sync::Lazy;
use regex::Regex;

/// Apply all cleanup rules to the raw model output.
///
/// Rules (applied in order):
/// 1. Strip leading/trailing invisible Unicode (BOM, zero-width spaces)
/// 2. Normalise line endings (CRLF → LF)
/// 3. Strip an outer code fence (```` ```json ````, ```` ``` ````)
/// 4. Trim surrounding whitespace
pub fn clean_model_output(input: &str) -> String {
    let s = strip_invisible_edges(input);
    let s = normalise_line_endings(s);
    let s = strip_code_fences(&s);
    s.trim().to_string()
}

// ── Rule 1: Strip invisible Unicode around the response ─────────────────────

const INVISIBLE: [char; 6] = [
    '\u{200B}', '\u{FEFF}', '\u{00AD}', '\u{200C}', '\u{200D}', '\u{2060}',
];

fn strip_invisible_edges(input: &str) -> &str {
    input.trim_matches(|c: char| INVISIBLE.contains(&c) || c.is_whitespace())
}

// ── Rule 2: Normalise line endings ───────────────────────────────────────────

fn normalise_line_endings(input: &str) -> String {
    input.replace("\r\n", "\n").replace('\r', "\n")
}

// ── Rule 3: Strip outer code fences ──────────────────────────────────────────

static RE_OUTER_FENCES: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)^```[A-Za-z]*[ \t]*\n(.*?)\n?```\s*$").expect("valid fence regex")
});

fn strip_code_fences(input: &str) -> String {
    if let Some(caps) = RE_OUTER_FENCES.captures(input.trim()) {
        caps[1].to_string()
    } else {
        input.to_string()
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────
