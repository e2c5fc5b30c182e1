//! Street-line splitting on secondary-unit designators.
//!
//! The split is an ordered list of [`SplitRule`]s. Each rule either names the
//! byte offset where `Address2` begins or declines; the first rule that
//! answers wins and the remainder becomes `Address1`.

use once_cell::sync::Lazy;
use regex::Regex;

/// Keyword designator, optionally followed by an identifier: `Apt 4B`,
/// `Suite #200`, `Bldg. C`.
static KEYWORD_DESIGNATOR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(?:apartment|apt|suite|ste|unit|building|bldg|floor|fl|room|rm)\b\.?(?:\s*#?\s*[a-z0-9][a-z0-9-]*)?",
    )
    .expect("Valid regex pattern")
});

/// Bare `#` identifier: `#12`, `# 3A`.
static HASH_DESIGNATOR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"#\s*[A-Za-z0-9][A-Za-z0-9-]*").expect("Valid regex pattern"));

/// Ordinal floor: `2nd Floor`, `14th Fl`.
static ORDINAL_FLOOR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b\d+(?:st|nd|rd|th)\s+(?:floor|fl)\b").expect("Valid regex pattern")
});

/// A comma clause that opens with a designator, using the wider USPS
/// vocabulary.
static CLAUSE_DESIGNATOR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^(?:#|(?:apartment|apt|suite|ste|unit|building|bldg|floor|fl|room|rm|department|dept|lot|space|spc|office|ofc|penthouse|ph|pmb|trailer|trlr|lobby|lbby|basement|bsmt|rear|front|frnt)\b)",
    )
    .expect("Valid regex pattern")
});

/// One candidate rule for splitting a street line into `Address1`/`Address2`.
pub trait SplitRule: Send + Sync {
    /// Short identifier for logging.
    fn name(&self) -> &'static str;

    /// Byte offset where `Address2` starts, or `None` if the rule does not
    /// apply. Offsets of zero are ignored by the caller.
    fn split_at(&self, street: &str) -> Option<usize>;
}

/// Inline designator anywhere in the line.
///
/// All three pattern families are scanned once and the smallest positive
/// offset wins. A designator at offset zero cannot be the split point since
/// the street line would be empty.
#[derive(Debug, Clone, Copy, Default)]
pub struct InlineDesignator;

impl SplitRule for InlineDesignator {
    fn name(&self) -> &'static str {
        "inline-designator"
    }

    fn split_at(&self, street: &str) -> Option<usize> {
        [&*KEYWORD_DESIGNATOR, &*HASH_DESIGNATOR, &*ORDINAL_FLOOR]
            .iter()
            .flat_map(|re| re.find_iter(street).map(|m| m.start()))
            .filter(|&start| start > 0)
            .min()
    }
}

/// A trailing comma-separated clause that begins with a designator.
#[derive(Debug, Clone, Copy, Default)]
pub struct TrailingClause;

impl SplitRule for TrailingClause {
    fn name(&self) -> &'static str {
        "trailing-clause"
    }

    fn split_at(&self, street: &str) -> Option<usize> {
        street.match_indices(',').find_map(|(idx, _)| {
            let rest = &street[idx + 1..];
            let clause = rest.trim_start();
            CLAUSE_DESIGNATOR
                .is_match(clause)
                .then(|| idx + 1 + (rest.len() - clause.len()))
        })
    }
}

/// Ordered rule list used by the deterministic parser.
pub struct SplitRules {
    rules: Vec<Box<dyn SplitRule>>,
}

impl Default for SplitRules {
    fn default() -> Self {
        Self::new(vec![Box::new(InlineDesignator), Box::new(TrailingClause)])
    }
}

impl std::fmt::Debug for SplitRules {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.rules.iter().map(|r| r.name()))
            .finish()
    }
}

impl SplitRules {
    pub fn new(rules: Vec<Box<dyn SplitRule>>) -> Self {
        Self { rules }
    }

    /// Append a rule, evaluated after the existing ones.
    pub fn push(mut self, rule: Box<dyn SplitRule>) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Split `street` into `(address1, address2)`.
    ///
    /// Without a usable split point the whole line is `address1`.
    pub fn split(&self, street: &str) -> (String, String) {
        let street = street.trim();
        for rule in &self.rules {
            let Some(at) = rule.split_at(street) else {
                continue;
            };
            let (Some(head), Some(tail)) = (street.get(..at), street.get(at..)) else {
                continue;
            };
            let address1 = head.trim_end().trim_end_matches(',').trim_end();
            if address1.is_empty() {
                continue;
            }
            log::trace!("split {:?} at {} via {}", street, at, rule.name());
            return (address1.to_string(), tail.trim().to_string());
        }
        (street.to_string(), String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn split(street: &str) -> (String, String) {
        SplitRules::default().split(street)
    }

    #[test]
    fn test_keyword_split() {
        assert_eq!(split("123 Main St Apt 4B"), ("123 Main St".into(), "Apt 4B".into()));
        assert_eq!(split("9 Elm Rd Suite #200"), ("9 Elm Rd".into(), "Suite #200".into()));
        assert_eq!(split("9 Elm Rd bldg. C"), ("9 Elm Rd".into(), "bldg. C".into()));
    }

    #[test]
    fn test_hash_split() {
        assert_eq!(split("123 Main St #5"), ("123 Main St".into(), "#5".into()));
    }

    #[test]
    fn test_smallest_offset_wins() {
        // ordinal floor starts before the bare keyword match inside it
        assert_eq!(
            split("1 Market St 2nd Floor Room 5"),
            ("1 Market St".into(), "2nd Floor Room 5".into())
        );
        // keyword before hash
        assert_eq!(split("1 Oak Ave Apt #7"), ("1 Oak Ave".into(), "Apt #7".into()));
    }

    #[test]
    fn test_offset_zero_is_not_a_split() {
        assert_eq!(split("Suite 100"), ("Suite 100".into(), String::new()));
        // a later designator is still used
        assert_eq!(split("Unit 3 Rear #B"), ("Unit 3 Rear".into(), "#B".into()));
    }

    #[test]
    fn test_comma_before_designator_is_trimmed() {
        assert_eq!(split("77 Pine St, Unit 9"), ("77 Pine St".into(), "Unit 9".into()));
    }

    #[test]
    fn test_trailing_clause_rule() {
        let rule = TrailingClause;
        assert_eq!(rule.split_at("12 Lake Dr, Lot 44"), Some(12));
        assert_eq!(rule.split_at("12 Lake Dr, # 4"), Some(12));
        assert_eq!(rule.split_at("12 Lake Dr, Lakeside"), None);
        assert_eq!(split("12 Lake Dr, Lot 44"), ("12 Lake Dr".into(), "Lot 44".into()));
        assert_eq!(split("5 Hill Rd, PMB 210"), ("5 Hill Rd".into(), "PMB 210".into()));
    }

    #[test]
    fn test_no_designator() {
        assert_eq!(split("123 Main St"), ("123 Main St".into(), String::new()));
        assert_eq!(split("500 United Way"), ("500 United Way".into(), String::new()));
        assert_eq!(split(""), (String::new(), String::new()));
    }

    #[test]
    fn test_custom_rule_appended() {
        struct CareOf;
        impl SplitRule for CareOf {
            fn name(&self) -> &'static str {
                "care-of"
            }
            fn split_at(&self, street: &str) -> Option<usize> {
                street.find(" c/o ").map(|i| i + 1)
            }
        }
        let rules = SplitRules::default().push(Box::new(CareOf));
        assert_eq!(rules.len(), 3);
        assert_eq!(
            rules.split("1 Elm St c/o Front Desk"),
            ("1 Elm St".into(), "c/o Front Desk".into())
        );
    }
}
