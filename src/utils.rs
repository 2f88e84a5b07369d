use crate::regex::NAME_SEPARATOR;
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

/// Removes diacritics by decomposing to NFD and dropping combining marks.
///
/// # Arguments
///
/// * `text` - The text to fold
pub fn strip_diacritics(text: &str) -> String {
    text.nfd().filter(|c| !is_combining_mark(*c)).collect()
}

/// Trims, strips diacritics and lowercases a string.
pub fn fold(text: &str) -> String {
    strip_diacritics(text.trim()).to_lowercase()
}

/// Levenshtein distance counted in characters, not bytes.
pub fn edit_distance(a: &str, b: &str) -> usize {
    strsim::levenshtein(a, b)
}

/// Splits on whitespace and hyphens, dropping empty pieces.
pub fn split_name_tokens(text: &str) -> Vec<&str> {
    NAME_SEPARATOR
        .split(text)
        .filter(|token| !token.is_empty())
        .collect()
}

/// Folds an author string from an index export into the form used for matching:
/// lowercase, no diacritics, no periods, single spaces.
///
/// # Arguments
///
/// * `name` - Author display name as harvested, e.g. `"Gregory Randall"`
pub fn normalize_author_query(name: &str) -> String {
    fold(name)
        .replace('.', " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Cleans a free-text keyword: trimmed, periods removed, folded.
///
/// Returns `None` when nothing is left.
pub fn normalize_keyword(keyword: &str) -> Option<String> {
    let cleaned = fold(&keyword.replace('.', ""));
    let cleaned = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned)
    }
}
