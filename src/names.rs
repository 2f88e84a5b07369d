//! Author name parsing and pairwise name comparison.
//!
//! Names harvested from bibliographic records come in two shapes:
//!
//! - `"Surnames, Given Names"` (one comma, optionally a trailing empty segment)
//! - `"Surname Given"` (exactly two whitespace separated tokens, no comma)
//!
//! Anything else is rejected by [`parse_name`] and never guessed at.
//!
//! # Example
//!
//! ```
//! use bibresolve::names::{parse_name, NameSimilarity};
//!
//! let a = parse_name("Rodríguez, Juan").unwrap();
//! let b = parse_name("Rodriguez, Juan").unwrap();
//! assert_eq!(a.surnames_normalized, "rodriguez");
//! assert!(NameSimilarity::LOOSE.same_person(&a, &b));
//! ```

mod parse;
mod similarity;

pub use parse::{ParsedName, parse_name};
pub use similarity::{NameSimilarity, given_names_match, surnames_match};
