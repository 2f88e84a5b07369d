use crate::utils::fold;
use compact_str::CompactString;
use serde::{Deserialize, Serialize};

/// A raw name split into surname and given-name fields.
///
/// Both fields are always populated; a name that cannot provide both is not parsed at all.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedName {
    /// Surname field as it appeared, trimmed
    pub surnames: String,
    /// Given-name field as it appeared, trimmed
    pub given_names: String,
    /// Folded surname field with whitespace runs replaced by `_`, periods kept
    pub surnames_normalized: String,
    /// Folded given-name field with whitespace runs replaced by `_`, periods kept
    pub given_names_normalized: String,
    /// Comparison tokens; periods also separate, so initials stand alone
    pub surname_parts: Vec<CompactString>,
    pub given_parts: Vec<CompactString>,
}

impl ParsedName {
    /// Canonical key fragment: `surnames_normalized + "_" + given_names_normalized`.
    pub fn key(&self) -> String {
        format!("{}_{}", self.surnames_normalized, self.given_names_normalized)
    }
}

/// Parses a raw author string into a [`ParsedName`].
///
/// Returns `None` for any shape other than a single `surname, given` comma split
/// (a second comma is tolerated when one of the three segments is empty) or a
/// comma-free string of exactly two tokens.
///
/// # Arguments
///
/// * `raw` - The name as harvested, e.g. `"García López, Ana María"`
pub fn parse_name(raw: &str) -> Option<ParsedName> {
    let segments: Vec<&str> = raw.split(',').collect();

    let (surnames, given_names) = match segments.as_slice() {
        [surnames, given_names] => (*surnames, *given_names),
        [first, second, third] if [first, second, third].iter().any(|s| s.trim().is_empty()) => {
            (*first, *second)
        }
        [whole] => match whole.split_whitespace().collect::<Vec<_>>().as_slice() {
            [surname, given] => (*surname, *given),
            _ => return None,
        },
        _ => return None,
    };

    let surnames = surnames.trim();
    let given_names = given_names.trim();

    let surname_parts = tokenize(surnames);
    let given_parts = tokenize(given_names);
    if surname_parts.is_empty() || given_parts.is_empty() {
        return None;
    }

    Some(ParsedName {
        surnames: surnames.to_string(),
        given_names: given_names.to_string(),
        surnames_normalized: normalize_field(surnames),
        given_names_normalized: normalize_field(given_names),
        surname_parts,
        given_parts,
    })
}

fn normalize_field(field: &str) -> String {
    fold(field).split_whitespace().collect::<Vec<_>>().join("_")
}

/// Folds a name field and splits it on whitespace and periods, so `"A."` becomes the
/// initial `a` and `"J.M."` becomes `j`, `m`.
fn tokenize(field: &str) -> Vec<CompactString> {
    fold(field)
        .split(|c: char| c.is_whitespace() || c == '.')
        .filter(|token| !token.is_empty())
        .map(CompactString::from)
        .collect()
}
