//! Mapping author strings from a second corpus onto existing people.
//!
//! The second corpus writes names as `"given surname"` without commas, so the
//! comma-driven parser and clusterer are not used here. Instead every existing person
//! becomes a set of terms (given-name tokens, surname tokens and given-name initials)
//! and each query is scored by how many of its tokens appear in a person's term set.
//!
//! A query is mapped only when
//!
//! 1. it has at least [`MatcherConfig::min_query_tokens`] tokens,
//! 2. every query token is covered by the best candidates, and
//! 3. exactly one best candidate remains once people whose token count differs from
//!    the query's by more than [`MatcherConfig::max_token_gap`] are dropped.
//!
//! Everything else is left unmapped: a wrong merge across corpora costs more than a
//! missed one.
//!
//! ```
//! use bibresolve::identity::Person;
//! use bibresolve::matcher::{AuthorMatcher, MatchOutcome};
//!
//! let people = vec![Person::from_aliases(vec!["Randall, Gregory".to_string()]).unwrap()];
//! let matcher = AuthorMatcher::new(&people);
//! assert_eq!(
//!     matcher.match_query("gregory randall"),
//!     MatchOutcome::Matched("randall_gregory".to_string())
//! );
//! assert_eq!(matcher.match_query("g randall"), MatchOutcome::Matched("randall_gregory".to_string()));
//! assert_eq!(matcher.match_query("randall"), MatchOutcome::TooShort);
//! ```

use crate::identity::Person;
use crate::utils::{normalize_author_query, split_name_tokens};
use compact_str::CompactString;
use log::{debug, info};
use std::collections::{BTreeMap, HashMap, HashSet};

/// Settings for cross-source author matching.
#[derive(Debug, Clone)]
pub struct MatcherConfig {
    /// Largest allowed difference between query and candidate token counts.
    pub max_token_gap: usize,
    /// Queries with fewer tokens are never matched.
    pub min_query_tokens: usize,
    /// Create a new person for queries that found no candidate at all.
    pub admit_new_identities: bool,
    /// Score queries on the rayon thread pool. Ignored without the `parallel` feature.
    pub run_in_parallel: bool,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            max_token_gap: 2,
            min_query_tokens: 2,
            admit_new_identities: false,
            run_in_parallel: false,
        }
    }
}

/// Decision for one query string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchOutcome {
    /// Mapped onto the person with this canonical key
    Matched(String),
    /// Several candidates tie with full coverage
    Ambiguous { candidates: usize },
    /// Best candidates cover only part of the query
    PartialCoverage { covered: usize, tokens: usize },
    /// Full-coverage candidates all differ too much in token count
    LengthMismatch,
    /// No query token is known
    NoCandidate,
    /// Not enough tokens to be evidence of identity
    TooShort,
}

/// Result of matching a batch of queries.
#[derive(Debug, Clone, Default)]
pub struct CrossSourceMatches {
    /// Query → canonical key, for matched queries only
    pub mapping: BTreeMap<String, String>,
    /// Every query's outcome
    pub outcomes: BTreeMap<String, MatchOutcome>,
    /// People created for unknown queries when `admit_new_identities` is set
    pub new_people: Vec<Person>,
}

impl CrossSourceMatches {
    pub fn resolve(&self, query: &str) -> Option<&str> {
        self.mapping.get(query).map(String::as_str)
    }

    pub fn count(&self, predicate: impl Fn(&MatchOutcome) -> bool) -> usize {
        self.outcomes.values().filter(|o| predicate(o)).count()
    }

    pub fn ambiguous(&self) -> usize {
        self.count(|o| matches!(o, MatchOutcome::Ambiguous { .. } | MatchOutcome::LengthMismatch))
    }

    pub fn partial(&self) -> usize {
        self.count(|o| matches!(o, MatchOutcome::PartialCoverage { .. }))
    }
}

/// Term index over the people of an existing registry.
///
/// Scoring a query is a sparse dot product: the query's distinct tokens are looked up
/// in the inverted index and hits are counted per person.
#[derive(Debug)]
pub struct AuthorMatcher<'a> {
    people: Vec<&'a Person>,
    token_counts: Vec<usize>,
    index: HashMap<CompactString, Vec<usize>>,
    /// Canonical keys of every person, indexed or not
    known_keys: HashSet<&'a str>,
    config: MatcherConfig,
}

impl<'a> AuthorMatcher<'a> {
    /// Indexes every person that has both given names and surnames.
    pub fn new(people: &'a [Person]) -> Self {
        let mut matcher = Self {
            people: Vec::new(),
            token_counts: Vec::new(),
            index: HashMap::new(),
            known_keys: people.iter().map(|p| p.canonical_key.as_str()).collect(),
            config: MatcherConfig::default(),
        };

        for person in people {
            let (Some(given), Some(surnames)) = (&person.given_names, &person.surnames) else {
                continue;
            };
            let position = matcher.people.len();
            let (terms, token_count) = person_terms(given, surnames);
            for term in terms {
                matcher.index.entry(term).or_default().push(position);
            }
            matcher.token_counts.push(token_count);
            matcher.people.push(person);
        }

        debug!("Indexed {} of {} people for matching", matcher.people.len(), people.len());
        matcher
    }

    #[must_use]
    pub fn with_config(mut self, config: MatcherConfig) -> Self {
        self.config = config;
        self
    }

    /// Decides a single query. The query is normalized first, so raw display names work.
    pub fn match_query(&self, query: &str) -> MatchOutcome {
        let query = normalize_author_query(query);
        let tokens = split_name_tokens(&query);
        if tokens.len() < self.config.min_query_tokens {
            return MatchOutcome::TooShort;
        }

        let distinct: HashSet<&str> = tokens.iter().copied().collect();
        let mut scores: HashMap<usize, usize> = HashMap::new();
        for token in distinct {
            for &position in self.index.get(token).into_iter().flatten() {
                *scores.entry(position).or_default() += 1;
            }
        }

        let Some(&best) = scores.values().max() else {
            return MatchOutcome::NoCandidate;
        };
        if best != tokens.len() {
            return MatchOutcome::PartialCoverage {
                covered: best,
                tokens: tokens.len(),
            };
        }

        let close: Vec<usize> = scores
            .iter()
            .filter(|&(_, &score)| score == best)
            .map(|(&position, _)| position)
            .filter(|&position| {
                self.token_counts[position].abs_diff(tokens.len()) <= self.config.max_token_gap
            })
            .collect();

        match close.as_slice() {
            [single] => MatchOutcome::Matched(self.people[*single].canonical_key.clone()),
            [] => MatchOutcome::LengthMismatch,
            many => MatchOutcome::Ambiguous {
                candidates: many.len(),
            },
        }
    }

    /// Decides every query. Each query gets exactly one outcome, so the mapping is a
    /// function from query to canonical key.
    ///
    /// An admitted query whose key already belongs to an existing person is mapped to
    /// that person instead of creating a new one.
    pub fn match_all<S: AsRef<str> + Sync>(&self, queries: &[S]) -> CrossSourceMatches {
        let decided = self.decide_all(queries);

        let mut matches = CrossSourceMatches::default();
        let mut admitted: BTreeMap<String, Person> = BTreeMap::new();
        for (query, outcome) in decided {
            match &outcome {
                MatchOutcome::Matched(key) => {
                    matches.mapping.insert(query.clone(), key.clone());
                }
                MatchOutcome::NoCandidate if self.config.admit_new_identities => {
                    if let Some(person) = admit_identity(&query) {
                        let key = person.canonical_key.clone();
                        if self.known_keys.contains(key.as_str()) {
                            debug!("Query {query:?} names existing person {key}");
                        } else {
                            admitted.entry(key.clone()).or_insert(person);
                        }
                        matches.mapping.insert(query.clone(), key);
                    }
                }
                MatchOutcome::Ambiguous { candidates } => {
                    debug!("Query {query:?} is ambiguous between {candidates} people");
                }
                _ => {}
            }
            matches.outcomes.insert(query, outcome);
        }
        matches.new_people = admitted.into_values().collect();

        info!(
            "Matched {} of {} author strings ({} ambiguous, {} partial, {} new people)",
            matches.mapping.len(),
            matches.outcomes.len(),
            matches.ambiguous(),
            matches.partial(),
            matches.new_people.len()
        );
        matches
    }

    fn decide_all<S: AsRef<str> + Sync>(&self, queries: &[S]) -> Vec<(String, MatchOutcome)> {
        #[cfg(feature = "parallel")]
        if self.config.run_in_parallel {
            use rayon::prelude::*;

            return queries
                .par_iter()
                .map(|q| (q.as_ref().to_string(), self.match_query(q.as_ref())))
                .collect();
        }

        queries
            .iter()
            .map(|q| (q.as_ref().to_string(), self.match_query(q.as_ref())))
            .collect()
    }
}

/// Terms describing a person, tokenized exactly like queries: given-name and surname
/// tokens plus the initial of every given name. Also returns the token count.
fn person_terms(given: &str, surnames: &str) -> (HashSet<CompactString>, usize) {
    let given = normalize_author_query(given);
    let surnames = normalize_author_query(surnames);
    let given_tokens = split_name_tokens(&given);
    let surname_tokens = split_name_tokens(&surnames);
    let token_count = given_tokens.len() + surname_tokens.len();

    let initials = given_tokens
        .iter()
        .filter_map(|name| name.chars().next().map(|c| &name[..c.len_utf8()]));

    let terms = given_tokens
        .iter()
        .copied()
        .chain(surname_tokens.iter().copied())
        .chain(initials)
        .map(CompactString::from)
        .collect();
    (terms, token_count)
}

/// Builds a person for an unknown `"given surname"` query. The alias is rewritten in
/// `"surname, given"` form so the canonical key follows the usual rule.
fn admit_identity(query: &str) -> Option<Person> {
    let query = normalize_author_query(query);
    let (given, surname) = query.rsplit_once(' ')?;
    Person::from_aliases(vec![format!("{surname}, {given}")]).ok()
}
