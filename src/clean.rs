//! Pre-cleaning of raw address text before it reaches a parser.
//!
//! Copied addresses often start with an attention marker or repeat the
//! recipient's name on the first line. Both confuse the street/city split,
//! so they are removed here. Line structure is preserved; flattening is the
//! deterministic parser's job.

use crate::error::{AddressError, Result};
use crate::heuristic::normalize::tidy;
use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};

static ATTENTION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*-?\s*(?:attention|attn)\b\.?\s*[-:]?\s*").expect("Valid regex pattern")
});

/// Remove a leading `Attention`/`Attn` marker.
///
/// ```
/// use address_pipeline::clean::strip_attention;
///
/// assert_eq!(strip_attention("ATTN: Receiving\n1 Elm St"), "Receiving\n1 Elm St");
/// ```
pub fn strip_attention(text: &str) -> String {
    ATTENTION.replace(text, "").into_owned()
}

/// Remove every case-insensitive occurrence of `name`, then tidy the commas
/// and spaces left behind on each line. Lines emptied by the removal are
/// dropped.
pub fn remove_contact(text: &str, name: &str) -> String {
    let name = name.trim();
    if name.is_empty() {
        return text.to_string();
    }

    let mut pattern = regex::escape(name);
    if name.starts_with(|c: char| c.is_alphanumeric()) {
        pattern.insert_str(0, r"\b");
    }
    if name.ends_with(|c: char| c.is_alphanumeric()) {
        pattern.push_str(r"\b");
    }

    let re = match RegexBuilder::new(&pattern).case_insensitive(true).build() {
        Ok(re) => re,
        Err(e) => {
            log::warn!("contact name not removed: {}", e);
            return text.to_string();
        }
    };

    let stripped = re.replace_all(text, "");
    stripped
        .lines()
        .map(tidy)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Clean `raw` for parsing.
///
/// # Errors
///
/// [`AddressError::InputInvalid`] when nothing but whitespace remains.
pub fn prepare(raw: &str, contact: Option<&str>) -> Result<String> {
    let text = strip_attention(raw);
    let text = match contact {
        Some(name) => remove_contact(&text, name),
        None => text,
    };
    let text = text.trim();
    if text.is_empty() {
        return Err(AddressError::InputInvalid(
            "address text is empty after cleaning".to_string(),
        ));
    }
    Ok(text.to_string())
}
