//! Compiled patterns shared by the name helpers.
//!
//! The engine is `regex` by default and `regex_lite` with the `lite` feature; the
//! patterns only use syntax both accept.

use std::sync::LazyLock;

#[cfg(feature = "lite")]
pub(crate) use regex_lite::Regex;
#[cfg(all(feature = "regex", not(feature = "lite")))]
pub(crate) use regex::Regex;

#[cfg(not(any(feature = "regex", feature = "lite")))]
compile_error!("bibresolve needs a regex engine: enable the \"regex\" or \"lite\" feature");

/// Runs of whitespace and hyphens between name tokens, so `"García-López"` and
/// `"García López"` tokenize alike.
pub(crate) static NAME_SEPARATOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\s\-]+").unwrap());

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case("garcia-lopez ana", vec!["garcia", "lopez", "ana"])]
    #[case("ana -- maria", vec!["ana", "maria"])]
    #[case("ana\tmaria", vec!["ana", "maria"])]
    fn test_name_separator(#[case] text: &str, #[case] expected: Vec<&str>) {
        assert_eq!(NAME_SEPARATOR.split(text).collect::<Vec<_>>(), expected);
    }

    #[test]
    fn test_leading_separator_leaves_empty_piece() {
        let pieces: Vec<&str> = NAME_SEPARATOR.split("-perez").collect();
        assert_eq!(pieces, vec!["", "perez"]);
    }
}
