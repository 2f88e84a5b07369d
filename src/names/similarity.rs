use super::ParsedName;
use crate::utils::edit_distance;

/// Edit-distance thresholds for deciding whether two parsed names denote one person.
///
/// Both the surname and the given-name predicate must hold.
///
/// # Examples
///
/// ```
/// use bibresolve::names::{parse_name, NameSimilarity};
///
/// let a = parse_name("Pérez, Juan").unwrap();
/// let b = parse_name("Pérez, Pedro").unwrap();
/// assert!(!NameSimilarity::LOOSE.same_person(&a, &b));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NameSimilarity {
    pub surname_threshold: usize,
    pub given_threshold: usize,
}

impl NameSimilarity {
    /// High-precision thresholds used while clustering one corpus.
    pub const STRICT: Self = Self::with_threshold(1);
    /// Tolerant thresholds used when auditing clusters.
    pub const LOOSE: Self = Self::with_threshold(2);

    pub const fn with_threshold(threshold: usize) -> Self {
        Self {
            surname_threshold: threshold,
            given_threshold: threshold,
        }
    }

    pub fn same_person(&self, a: &ParsedName, b: &ParsedName) -> bool {
        surnames_match(&a.surname_parts, &b.surname_parts, self.surname_threshold)
            && given_names_match(&a.given_parts, &b.given_parts, self.given_threshold)
    }
}

impl Default for NameSimilarity {
    fn default() -> Self {
        Self::LOOSE
    }
}

/// Checks whether two surname token sequences can belong to the same person.
///
/// The leading tokens must be within `threshold`; then every token of the shorter
/// sequence needs a counterpart in the longer one. Equal-length sequences are checked
/// in both directions.
pub fn surnames_match<S: AsRef<str>>(a: &[S], b: &[S], threshold: usize) -> bool {
    let (shorter, longer) = if a.len() <= b.len() { (a, b) } else { (b, a) };

    let (Some(short_first), Some(long_first)) = (shorter.first(), longer.first()) else {
        return false;
    };
    if edit_distance(short_first.as_ref(), long_first.as_ref()) > threshold {
        return false;
    }

    covered_by(shorter, longer, threshold)
        && (shorter.len() != longer.len() || covered_by(longer, shorter, threshold))
}

fn covered_by<S: AsRef<str>>(parts: &[S], candidates: &[S], threshold: usize) -> bool {
    parts.iter().all(|part| {
        candidates
            .iter()
            .any(|candidate| edit_distance(part.as_ref(), candidate.as_ref()) <= threshold)
    })
}

/// Checks whether two given-name token sequences can belong to the same person.
///
/// Missing given names are not evidence of a difference. The primary given names must
/// be within `threshold`; when either of them is an initial, the rest reduces to
/// first-letter equality.
pub fn given_names_match<S: AsRef<str>>(a: &[S], b: &[S], threshold: usize) -> bool {
    let (Some(primary_a), Some(primary_b)) = (a.first(), b.first()) else {
        return true;
    };
    let (primary_a, primary_b) = (primary_a.as_ref(), primary_b.as_ref());

    if edit_distance(primary_a, primary_b) > threshold {
        return false;
    }
    if is_initial(primary_a) || is_initial(primary_b) {
        return first_letter(primary_a) == first_letter(primary_b);
    }

    parts_correspond(a, b, threshold) && parts_correspond(b, a, threshold)
}

/// Every token in `names` either has a counterpart in `others`, or is tolerated as
/// missing. A full name without counterpart is only rejected when `others` carries a
/// non-primary initial with a different letter.
fn parts_correspond<S: AsRef<str>>(names: &[S], others: &[S], threshold: usize) -> bool {
    names.iter().map(AsRef::as_ref).all(|name| {
        let matched = others
            .iter()
            .any(|other| tokens_correspond(name, other.as_ref(), threshold));
        if matched || is_initial(name) {
            return true;
        }

        let conflicting_initial = others.iter().skip(1).map(AsRef::as_ref).any(|other| {
            is_initial(other) && first_letter(other) != first_letter(name)
        });
        !conflicting_initial
    })
}

fn tokens_correspond(a: &str, b: &str, threshold: usize) -> bool {
    if is_initial(a) || is_initial(b) {
        first_letter(a) == first_letter(b)
    } else {
        edit_distance(a, b) <= threshold
    }
}

fn is_initial(token: &str) -> bool {
    token.chars().count() == 1
}

fn first_letter(token: &str) -> Option<char> {
    token.chars().next()
}
