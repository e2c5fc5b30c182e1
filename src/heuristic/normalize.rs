//! Whitespace and separator normalization for raw address text.

use once_cell::sync::Lazy;
use regex::Regex;

static NEWLINE_RUNS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n+").expect("Valid regex pattern"));

static WHITESPACE_RUNS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").expect("Valid regex pattern"));

static COMMA_RUNS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r",(?:\s*,)+").expect("Valid regex pattern"));

/// Flatten a possibly multi-line address onto one comma-separated line.
///
/// CRLF becomes LF, newline runs become `", "`, whitespace runs collapse to
/// one space and repeated commas collapse to one. Newlines are handled
/// before whitespace so the introduced separators survive. Idempotent.
///
/// ```
/// use address_pipeline::heuristic::normalize;
///
/// assert_eq!(normalize("123 Main St\r\nSpringfield,\n IL"), "123 Main St, Springfield, IL");
/// ```
pub fn normalize(text: &str) -> String {
    let text = text.replace("\r\n", "\n");
    let text = NEWLINE_RUNS.replace_all(&text, ", ");
    let text = WHITESPACE_RUNS.replace_all(&text, " ");
    let text = COMMA_RUNS.replace_all(&text, ",");
    text.trim().to_string()
}

/// Collapse separators left behind after removing tokens, and trim stray
/// commas from both ends.
pub(crate) fn tidy(text: &str) -> String {
    let text = WHITESPACE_RUNS.replace_all(text, " ");
    let text = COMMA_RUNS.replace_all(&text, ",");
    text.trim_matches(|c: char| c == ',' || c.is_whitespace())
        .to_string()
}
