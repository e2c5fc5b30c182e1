//! Defensive extraction of a JSON object from free-text model replies.
//!
//! Replies are not guaranteed to be pure JSON: they may carry commentary,
//! markdown fences, or `<think>` blocks from reasoning models. Objects are
//! located with a nesting- and string-aware brace scanner rather than a
//! greedy match, so `"see {a} then {"City": "X"}"` and nested objects are
//! handled without truncation or over-capture.

use crate::error::{AddressError, Result};
use serde_json::{Map, Value};

/// Strip all `<think>...</think>` and `<thinking>...</thinking>` blocks from text.
///
/// Handles complete blocks, incomplete blocks (no closing tag),
/// and multiple sequential blocks.
///
/// # Examples
///
/// ```
/// use address_pipeline::extract::strip_think_tags;
///
/// assert_eq!(strip_think_tags("<think>reasoning</think>result"), "result");
/// assert_eq!(strip_think_tags("<think>no closing tag"), "");
/// ```
pub fn strip_think_tags(text: &str) -> String {
    let result = strip_tag_variant(text, "<think>", "</think>");
    strip_tag_variant(&result, "<thinking>", "</thinking>")
}

fn strip_tag_variant(text: &str, open: &str, close: &str) -> String {
    let mut result = text.to_string();
    while let Some(start) = result.find(open) {
        if let Some(end_offset) = result[start..].find(close) {
            let end = start + end_offset + close.len();
            result = format!("{}{}", &result[..start], &result[end..]);
        } else {
            // unterminated: drop everything after the open tag
            result.truncate(start);
            break;
        }
    }
    result
}

/// Content of the first fenced markdown code block, if any.
///
/// ```
/// use address_pipeline::extract::extract_code_block;
///
/// assert_eq!(extract_code_block("Here:\n```json\n{\"a\": 1}\n```"), Some("{\"a\": 1}"));
/// ```
pub fn extract_code_block(text: &str) -> Option<&str> {
    let fence_start = text.find("```")?;
    let after_backticks = fence_start + 3;
    let line_end = text[after_backticks..].find('\n')?;
    let content_start = after_backticks + line_end + 1;
    let close_offset = text[content_start..].find("```")?;
    Some(text[content_start..content_start + close_offset].trim())
}

/// All top-level balanced `{...}` regions, in order of appearance.
///
/// Braces inside JSON string literals are ignored. An opening brace that is
/// never closed is skipped and scanning resumes right after it.
pub fn object_candidates(text: &str) -> Vec<&str> {
    let mut found = Vec::new();
    let mut scan_from = 0;

    while let Some(offset) = text[scan_from..].find('{') {
        let start = scan_from + offset;
        match balanced_end(&text[start..]) {
            Some(len) => {
                found.push(&text[start..start + len]);
                scan_from = start + len;
            }
            None => scan_from = start + 1,
        }
    }

    found
}

/// Byte length of the balanced object starting at `text[0] == '{'`.
fn balanced_end(text: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escape_next = false;

    for (i, ch) in text.char_indices() {
        if escape_next {
            escape_next = false;
            continue;
        }
        match ch {
            '\\' if in_string => escape_next = true,
            '"' => in_string = !in_string,
            _ if in_string => {}
            '{' => depth += 1,
            '}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(i + 1);
                }
            }
            _ => {}
        }
    }
    None
}

/// First brace-delimited substring of `text`, using the balanced scanner.
///
/// ```
/// use address_pipeline::extract::find_first_object;
///
/// let reply = r#"Sure! {"City": "Austin", "meta": {"k": 1}} Anything else?"#;
/// assert_eq!(find_first_object(reply), Some(r#"{"City": "Austin", "meta": {"k": 1}}"#));
/// ```
pub fn find_first_object(text: &str) -> Option<&str> {
    object_candidates(text).into_iter().next()
}

/// Extract the first JSON object from a model reply.
///
/// Think blocks are stripped and a fenced code block, when present, is
/// searched first. Candidates are tried in order; the first that parses as
/// a JSON object wins.
///
/// # Errors
///
/// [`AddressError::UnparsableResponse`] when the reply holds no brace-delimited
/// region, or none of them is a valid JSON object.
pub fn extract_object(reply: &str) -> Result<Map<String, Value>> {
    let cleaned = strip_think_tags(reply);
    let cleaned = cleaned.trim();

    let mut candidates = extract_code_block(cleaned)
        .map(object_candidates)
        .unwrap_or_default();
    candidates.extend(object_candidates(cleaned));

    if candidates.is_empty() {
        return Err(AddressError::UnparsableResponse(format!(
            "no JSON object found in reply: {}",
            truncate(cleaned, 200)
        )));
    }

    let mut first_error = None;
    for candidate in candidates {
        match serde_json::from_str::<Value>(candidate) {
            Ok(Value::Object(map)) => return Ok(map),
            Ok(_) => {}
            Err(e) => {
                first_error.get_or_insert(e);
            }
        }
    }

    Err(AddressError::UnparsableResponse(match first_error {
        Some(e) => format!("invalid JSON object in reply: {}", e),
        None => "no JSON object found in reply".to_string(),
    }))
}

/// Truncate to at most `max_chars` characters, appending "..." if truncated.
pub(crate) fn truncate(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &s[..idx]),
        None => s.to_string(),
    }
}
