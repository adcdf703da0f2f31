//! Cell name validation and normalization.
//!
//! A cell name is one or more ASCII letters followed by one or more ASCII
//! digits (e.g. "A1", "bc12", "Z0"). Documents layer their own rules on top:
//! a normalizer (typically upper-casing) and a validity predicate.
//!
//! # Examples
//!
//! ```ignore
//! let name = CellName::parse("b3", |s| s.to_uppercase(), |_| true).unwrap();
//! assert_eq!(name.as_str(), "B3");
//! ```

use regex::Regex;
use std::cmp::Ordering;
use std::fmt;
use std::sync::OnceLock;
use thiserror::Error;

/// A validated, normalized cell name.
///
/// Values of this type only come out of [`CellName::parse`] (or its
/// syntax-only shorthand), so anything holding one can rely on it being the
/// normalized form the owning document agreed on.
#[derive(Clone, Debug, Hash, Eq, PartialEq)]
pub struct CellName(String);

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid cell name: {0:?}")]
pub struct InvalidCellName(pub String);

/// Returns true if `name` is letters followed by digits.
pub fn is_cell_name(name: &str) -> bool {
    cell_name_re().is_match(name)
}

fn cell_name_re() -> &'static Regex {
    static CELL_NAME_RE: OnceLock<Regex> = OnceLock::new();
    CELL_NAME_RE.get_or_init(|| {
        Regex::new(r"^[A-Za-z]+[0-9]+$").expect("cell name regex must compile")
    })
}

impl CellName {
    /// Normalize `raw`, then require the normalized form to be a syntactic
    /// cell name accepted by `is_valid`.
    pub fn parse<N, V>(raw: &str, normalize: N, is_valid: V) -> Result<CellName, InvalidCellName>
    where
        N: Fn(&str) -> String,
        V: Fn(&str) -> bool,
    {
        let normalized = normalize(raw);
        if is_cell_name(&normalized) && is_valid(&normalized) {
            Ok(CellName(normalized))
        } else {
            Err(InvalidCellName(raw.to_string()))
        }
    }

    /// Syntax-only parse with the identity normalizer.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(name: &str) -> Option<CellName> {
        Self::parse(name, |s| s.to_string(), |_| true).ok()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    /// Split into the letter and digit runs ("AB12" -> ("AB", "12")).
    pub fn parts(&self) -> (&str, &str) {
        let split = self
            .0
            .find(|c: char| c.is_ascii_digit())
            .unwrap_or(self.0.len());
        self.0.split_at(split)
    }
}

impl std::str::FromStr for CellName {
    type Err = InvalidCellName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CellName::from_str(s).ok_or_else(|| InvalidCellName(s.to_string()))
    }
}

impl fmt::Display for CellName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CellName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for CellName {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for CellName {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// Column-major ordering: letters (shorter first, then case-insensitively),
/// then the row number numerically. Raw text breaks remaining ties so the
/// ordering agrees with `Eq`.
impl Ord for CellName {
    fn cmp(&self, other: &Self) -> Ordering {
        let (a_letters, a_digits) = self.parts();
        let (b_letters, b_digits) = other.parts();
        let a_row = a_digits.trim_start_matches('0');
        let b_row = b_digits.trim_start_matches('0');

        a_letters
            .len()
            .cmp(&b_letters.len())
            .then_with(|| {
                a_letters
                    .to_ascii_uppercase()
                    .cmp(&b_letters.to_ascii_uppercase())
            })
            .then_with(|| a_row.len().cmp(&b_row.len()))
            .then_with(|| a_row.cmp(b_row))
            .then_with(|| self.0.cmp(&other.0))
    }
}

impl PartialOrd for CellName {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_applies_normalizer_before_validation() {
        let name = CellName::parse("b1", |s| s.to_uppercase(), |s| s.starts_with('B')).unwrap();
        assert_eq!(name.as_str(), "B1");

        // Normalized to "B1", which no longer starts with a lowercase 'b'.
        let err = CellName::parse("b1", |s| s.to_uppercase(), |s| s.starts_with('b'));
        assert_eq!(err, Err(InvalidCellName("b1".to_string())));
    }

    #[test]
    fn test_normalizer_output_must_still_be_a_cell_name() {
        assert!(CellName::parse("A1", |s| format!("{s}!"), |_| true).is_err());
        assert!(CellName::parse("A1", |s| format!("{s}0"), |_| true).is_ok());
    }

    #[test]
    fn test_syntax() {
        assert!(is_cell_name("A1"));
        assert!(is_cell_name("bc12"));
        assert!(is_cell_name("Z0"));
        assert!(!is_cell_name(""));
        assert!(!is_cell_name("A"));
        assert!(!is_cell_name("12"));
        assert!(!is_cell_name("1A"));
        assert!(!is_cell_name("A1B"));
        assert!(!is_cell_name("A_1"));
        assert!(!is_cell_name(" A1"));
    }

    #[test]
    fn test_ordering_is_column_then_numeric_row() {
        let mut names: Vec<CellName> = ["B2", "AA1", "A10", "A2", "B1"]
            .iter()
            .map(|s| CellName::from_str(s).unwrap())
            .collect();
        names.sort();
        let sorted: Vec<&str> = names.iter().map(CellName::as_str).collect();
        assert_eq!(sorted, vec!["A2", "A10", "B1", "B2", "AA1"]);
    }

    #[test]
    fn test_parts() {
        let name = CellName::from_str("AB012").unwrap();
        assert_eq!(name.parts(), ("AB", "012"));
    }
}
