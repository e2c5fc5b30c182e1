//! Deterministic, pattern-based address decomposition.
//!
//! [`DeterministicParser`] is the guaranteed-terminal strategy: it never
//! fails and always returns all six fields. Extraction runs on a normalized
//! working copy, and each step removes what it matched so later steps see
//! only the remainder:
//!
//! 1. ZIP (`12345` or `12345-6789`)
//! 2. State (two-letter token, USPS codes first, replaced by a comma marker)
//! 3. City (last comma segment)
//! 4. `Address1`/`Address2` split via [`SplitRules`]
//! 5. City backfill from the words just before the state, for addresses
//!    written without commas
//!
//! `Country` is always [`DEFAULT_COUNTRY`](crate::types::DEFAULT_COUNTRY).

pub mod normalize;
pub mod unit;

pub use normalize::normalize;
pub use unit::{InlineDesignator, SplitRule, SplitRules, TrailingClause};

use crate::types::ParsedAddress;
use once_cell::sync::Lazy;
use regex::Regex;
use std::ops::Range;

static ZIP: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b\d{5}(?:-\d{4})?\b").expect("Valid regex pattern"));

/// Standalone two-letter token with optional surrounding commas. Group 1 is
/// the token itself.
static STATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:,\s*)?\b([A-Z]{2})\b(?:\s*,)?").expect("Valid regex pattern")
});

static CITY_WORD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z][A-Za-z.'-]*$").expect("Valid regex pattern"));

/// USPS state, district, territory and military codes.
const STATE_CODES: &[&str] = &[
    "AL", "AK", "AZ", "AR", "CA", "CO", "CT", "DE", "FL", "GA", "HI", "ID", "IL", "IN", "IA",
    "KS", "KY", "LA", "ME", "MD", "MA", "MI", "MN", "MS", "MO", "MT", "NE", "NV", "NH", "NJ",
    "NM", "NY", "NC", "ND", "OH", "OK", "OR", "PA", "RI", "SC", "SD", "TN", "TX", "UT", "VT",
    "VA", "WA", "WV", "WI", "WY", "DC", "PR", "VI", "GU", "AS", "MP", "AA", "AE", "AP",
];

/// Street-type suffixes that can precede a city when no comma separates them.
const STREET_SUFFIXES: &[&str] = &[
    "st", "street", "ave", "av", "avenue", "rd", "road", "blvd", "boulevard", "dr", "drive",
    "ln", "lane", "ct", "court", "way", "pl", "place", "pkwy", "parkway", "hwy", "highway",
    "ter", "terrace", "cir", "circle", "sq", "square", "trl", "trail", "plz", "plaza", "aly",
    "alley", "loop", "row", "run", "pike", "expy", "fwy",
];

/// Byte ranges of a state match: the whole match (with any commas) and the
/// two-letter code.
#[derive(Debug, Clone, PartialEq, Eq)]
struct StateMatch {
    whole: Range<usize>,
    code: Range<usize>,
}

/// State token in `text`.
///
/// The first USPS code wins. Without one, the first other two-letter token
/// is accepted if it closes a comma segment or the whole address (only a ZIP
/// may follow) and is not a street suffix such as `ST`.
fn find_state(text: &str) -> Option<StateMatch> {
    let candidates: Vec<StateMatch> = STATE
        .captures_iter(text)
        .filter_map(|caps| {
            Some(StateMatch {
                whole: caps.get(0)?.range(),
                code: caps.get(1)?.range(),
            })
        })
        .collect();

    let code = |m: &StateMatch| text.get(m.code.clone()).unwrap_or_default();
    if let Some(found) = candidates.iter().find(|m| STATE_CODES.contains(&code(m))) {
        return Some(found.clone());
    }

    candidates
        .into_iter()
        .find(|m| !is_street_suffix(code(m)) && (comma_led(text, m) || closes_address(text, m)))
}

/// A comma precedes the token, possibly consumed by an earlier match.
fn comma_led(text: &str, m: &StateMatch) -> bool {
    text.get(..m.code.start)
        .map_or(false, |head| head.trim_end().ends_with(','))
}

/// Nothing but separators or ZIP digits follows the token.
fn closes_address(text: &str, m: &StateMatch) -> bool {
    text.get(m.code.end..).map_or(false, |tail| {
        tail.chars()
            .all(|c| c.is_whitespace() || c == ',' || c == '-' || c.is_ascii_digit())
    })
}

fn is_street_suffix(word: &str) -> bool {
    let word = word.trim_end_matches('.').to_ascii_lowercase();
    STREET_SUFFIXES.contains(&word.as_str())
}

/// Remove the first ZIP from `working`, returning it.
fn take_zip(working: &mut String) -> Option<String> {
    let range = ZIP.find(working.as_str())?.range();
    let zip = working[range.clone()].to_string();
    working.replace_range(range, " ");
    Some(zip)
}

/// Replace the first state token in `working` with a comma marker,
/// returning the code.
fn take_state(working: &mut String) -> Option<String> {
    let found = find_state(working.as_str())?;
    let code = working[found.code].to_string();
    working.replace_range(found.whole, ",");
    Some(code)
}

/// `(street, city)` from the comma segments of the remainder.
fn split_city(remainder: &str) -> (String, String) {
    let segments: Vec<&str> = remainder
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();

    match segments.split_last() {
        Some((city, street)) if !street.is_empty() => (street.join(", "), city.to_string()),
        _ => (segments.join(", "), String::new()),
    }
}

/// Up to three words immediately before the state token in `normalized`,
/// skipping anything up to a street-type suffix.
fn backfill_city(normalized: &str) -> Option<String> {
    let state = find_state(normalized)?;
    let before = normalized
        .get(..state.whole.start)?
        .trim_end()
        .trim_end_matches(',')
        .trim_end();

    let mut words: Vec<&str> = before
        .rsplit(' ')
        .take_while(|w| CITY_WORD.is_match(w))
        .take(3)
        .collect();
    words.reverse();

    if let Some(pos) = words.iter().rposition(|w| is_street_suffix(w)) {
        words.drain(..=pos);
    }

    (!words.is_empty()).then(|| words.join(" "))
}

/// Drop a trailing `city` from `line` if it ends with it on a word boundary.
/// A line holding only the city is cleared.
fn strip_trailing_city(line: &mut String, city: &str) {
    if line.as_str() == city {
        line.clear();
        return;
    }
    let Some(head) = line.strip_suffix(city) else {
        return;
    };
    if !head.is_empty() && head.ends_with(' ') {
        let head = head.trim_end().trim_end_matches(',').trim_end();
        if !head.is_empty() {
            *line = head.to_string();
        }
    }
}

/// Rule-based parser used when the model path is unavailable.
///
/// # Example
///
/// ```
/// use address_pipeline::DeterministicParser;
///
/// let address = DeterministicParser::new().parse("123 Main St Apt 4B, Springfield, IL 62704");
/// assert_eq!(address.address1, "123 Main St");
/// assert_eq!(address.address2, "Apt 4B");
/// assert_eq!(address.city, "Springfield");
/// assert_eq!(address.state, "IL");
/// assert_eq!(address.zip, "62704");
/// assert_eq!(address.country, "USA");
/// ```
#[derive(Debug, Default)]
pub struct DeterministicParser {
    rules: SplitRules,
}

impl DeterministicParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a custom street-line rule list.
    pub fn with_rules(rules: SplitRules) -> Self {
        Self { rules }
    }

    /// Decompose `text`. Never fails; unknown parts are left empty.
    pub fn parse(&self, text: &str) -> ParsedAddress {
        let normalized = normalize(text);
        let mut working = normalized.clone();

        let zip = take_zip(&mut working).unwrap_or_default();
        let state = take_state(&mut working).unwrap_or_default();
        let remainder = normalize::tidy(&working);

        let (street, mut city) = split_city(&remainder);
        let (mut address1, mut address2) = self.rules.split(&street);

        if city.is_empty() && !state.is_empty() {
            if let Some(found) = backfill_city(&normalized) {
                if address2.ends_with(&found) {
                    strip_trailing_city(&mut address2, &found);
                } else {
                    strip_trailing_city(&mut address1, &found);
                }
                city = found;
            }
        }

        log::debug!(
            "deterministic parse: zip={:?} state={:?} city={:?}",
            zip,
            state,
            city
        );

        ParsedAddress {
            address1,
            address2,
            city,
            state,
            zip,
            ..ParsedAddress::default()
        }
    }
}
