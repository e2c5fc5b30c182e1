//! Reading addresses out of, and merging results into, JSON records.

use crate::error::{AddressError, Result};
use crate::types::{AddressField, ParseOutcome};
use serde_json::{Map, Value};

/// Raw address text from `record[field]`.
///
/// A string is returned as is; an array of strings is joined with newlines
/// (one address line per element, non-string elements skipped).
///
/// # Errors
///
/// [`AddressError::InputInvalid`] when the field is missing, has another
/// type, or holds only whitespace.
pub fn address_text(record: &Map<String, Value>, field: &str) -> Result<String> {
    let text = match record.get(field) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Array(lines)) => lines
            .iter()
            .filter_map(Value::as_str)
            .collect::<Vec<_>>()
            .join("\n"),
        Some(other) => {
            return Err(AddressError::InputInvalid(format!(
                "field {:?} is not text: {}",
                field, other
            )))
        }
        None => {
            return Err(AddressError::InputInvalid(format!(
                "record has no {:?} field",
                field
            )))
        }
    };

    if text.trim().is_empty() {
        return Err(AddressError::InputInvalid(format!("field {:?} is empty", field)));
    }
    Ok(text)
}

/// String value of `record[field]`, if present and non-blank.
pub fn text_field<'a>(record: &'a Map<String, Value>, field: &str) -> Option<&'a str> {
    record
        .get(field)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// Write the six address keys of `outcome` into `record`, overwriting any
/// existing values. No other keys are touched.
pub fn merge_outcome(record: &mut Map<String, Value>, outcome: &ParseOutcome) {
    for field in AddressField::ALL {
        record.insert(
            field.key().to_string(),
            Value::String(outcome.address.get(field).to_string()),
        );
    }
}
