//! Grouping raw author strings into identities and auditing the groups.
//!
//! ## Clustering
//!
//! [`NameClusterer`] sorts the distinct input names by length, longest first, and
//! grows one [`NameGroup`] per unvisited seed by absorbing every later, unvisited name
//! that the strict [`NameSimilarity`] accepts against the seed. Fuller names therefore
//! anchor the groups their abbreviated variants fall into.
//!
//! ## Validation
//!
//! [`ClusterValidator`] re-checks every pair inside a group with the loose thresholds.
//! A group with any disagreeing pair is reported as a [`ClusterConflict`] and, unless
//! configured otherwise, replaced by singleton groups. Splitting never feeds back into
//! clustering.
//!
//! ```
//! use bibresolve::cluster::{ClusterValidator, NameClusterer};
//!
//! let names = ["Pérez, Juan", "Perez, Juan", "Pérez, Juan C.", "Gómez, Ana"];
//! let clustering = NameClusterer::new().cluster(&names);
//! assert_eq!(clustering.groups.len(), 2);
//!
//! let validated = ClusterValidator::new().split_conflicting(clustering.groups);
//! assert!(validated.conflicts.is_empty());
//! ```
//!
//! # Performance
//!
//! - Time complexity: O(n²) comparisons in the worst case
//! - Each name is parsed once up front

use crate::names::{NameSimilarity, ParsedName, parse_name};
use itertools::Itertools;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;

/// Thresholds and policy for clustering one corpus.
#[derive(Debug, Clone)]
pub struct ClusterConfig {
    /// Edit distance used to absorb names into a group.
    pub threshold: usize,
    /// Edit distance used by the post-hoc audit. Should be looser than `threshold`.
    pub validation_threshold: usize,
    /// Replace conflicting groups by singletons. When `false`, conflicts are only reported.
    pub split_conflicting: bool,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            threshold: 1,
            validation_threshold: 2,
            split_conflicting: true,
        }
    }
}

/// A set of raw names believed to denote one person, in the order they joined.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameGroup {
    members: Vec<String>,
}

impl NameGroup {
    pub fn new(seed: impl Into<String>) -> Self {
        Self {
            members: vec![seed.into()],
        }
    }

    /// Builds a group from members in the given order. Duplicates are dropped.
    pub fn from_members<I, S>(members: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            members: members.into_iter().map(Into::into).unique().collect(),
        }
    }

    pub fn members(&self) -> &[String] {
        &self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.members.iter().any(|m| m == name)
    }

    fn push(&mut self, name: String) {
        self.members.push(name);
    }
}

/// Output of [`NameClusterer::cluster`].
#[derive(Debug, Clone, Default)]
pub struct Clustering {
    pub groups: Vec<NameGroup>,
    /// Names excluded because they could not be parsed.
    pub unparseable: Vec<String>,
}

/// Groups raw author strings from a single corpus.
#[derive(Debug, Default, Clone)]
pub struct NameClusterer {
    config: ClusterConfig,
}

#[derive(Debug)]
struct PreparedName<'a> {
    raw: &'a str,
    parsed: Option<ParsedName>,
}

impl NameClusterer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_config(mut self, config: ClusterConfig) -> Self {
        self.config = config;
        self
    }

    /// Partitions the parseable names into groups.
    ///
    /// Input order does not matter: names are deduplicated and visited by descending
    /// character count, ties in lexicographic order. Every parseable name ends up in
    /// exactly one group.
    pub fn cluster<S: AsRef<str>>(&self, names: &[S]) -> Clustering {
        let similarity = NameSimilarity::with_threshold(self.config.threshold);

        let prepared: Vec<PreparedName> = names
            .iter()
            .map(AsRef::as_ref)
            .unique()
            .sorted_by_cached_key(|name| (Reverse(name.chars().count()), *name))
            .map(|raw| PreparedName {
                raw,
                parsed: parse_name(raw),
            })
            .collect();

        let mut clustering = Clustering::default();
        let mut visited = vec![false; prepared.len()];

        for i in 0..prepared.len() {
            if visited[i] {
                continue;
            }
            visited[i] = true;

            let seed = &prepared[i];
            let Some(seed_parsed) = &seed.parsed else {
                clustering.unparseable.push(seed.raw.to_string());
                continue;
            };

            let mut group = NameGroup::new(seed.raw);
            for (j, other) in prepared.iter().enumerate().skip(i + 1) {
                if visited[j] {
                    continue;
                }
                let Some(other_parsed) = &other.parsed else {
                    continue;
                };
                if similarity.same_person(seed_parsed, other_parsed) {
                    group.push(other.raw.to_string());
                    visited[j] = true;
                }
            }

            clustering.groups.push(group);
        }

        info!(
            "Clustered {} distinct names into {} groups ({} unparseable)",
            prepared.len(),
            clustering.groups.len(),
            clustering.unparseable.len()
        );

        clustering
    }
}

/// Result of auditing a single group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupVerdict {
    pub same_person: bool,
    /// Member pairs the loose comparison considers different people.
    pub conflicting_pairs: Vec<(String, String)>,
}

/// A group found to mix at least two people.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterConflict {
    pub members: Vec<String>,
    pub conflicting_pairs: Vec<(String, String)>,
}

/// Groups after the audit, plus every conflict that was found.
#[derive(Debug, Clone, Default)]
pub struct ValidatedGroups {
    pub groups: Vec<NameGroup>,
    pub conflicts: Vec<ClusterConflict>,
}

/// Audits clusters for members that should not have been merged.
#[derive(Debug, Clone)]
pub struct ClusterValidator {
    similarity: NameSimilarity,
    split_conflicting: bool,
}

impl Default for ClusterValidator {
    fn default() -> Self {
        Self::from_config(&ClusterConfig::default())
    }
}

impl ClusterValidator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &ClusterConfig) -> Self {
        Self {
            similarity: NameSimilarity::with_threshold(config.validation_threshold),
            split_conflicting: config.split_conflicting,
        }
    }

    /// Compares every pair of parseable members. Groups with fewer than two
    /// parseable members trivially stand.
    pub fn validate(&self, group: &NameGroup) -> GroupVerdict {
        let parsed: Vec<(&str, ParsedName)> = group
            .members()
            .iter()
            .filter_map(|m| parse_name(m).map(|p| (m.as_str(), p)))
            .collect();

        let conflicting_pairs: Vec<(String, String)> = parsed
            .iter()
            .tuple_combinations()
            .filter(|((_, a), (_, b))| !self.similarity.same_person(a, b))
            .map(|((raw_a, _), (raw_b, _))| (raw_a.to_string(), raw_b.to_string()))
            .collect();

        GroupVerdict {
            same_person: conflicting_pairs.is_empty(),
            conflicting_pairs,
        }
    }

    /// Audits all groups, then builds a fresh group list in which every conflicting
    /// group is replaced by one singleton per member (when splitting is enabled).
    pub fn split_conflicting(&self, groups: Vec<NameGroup>) -> ValidatedGroups {
        let verdicts: Vec<GroupVerdict> = groups
            .iter()
            .map(|group| {
                if group.len() < 2 {
                    GroupVerdict {
                        same_person: true,
                        conflicting_pairs: Vec::new(),
                    }
                } else {
                    self.validate(group)
                }
            })
            .collect();

        let mut validated = ValidatedGroups::default();
        for (group, verdict) in groups.into_iter().zip(verdicts) {
            if verdict.same_person {
                validated.groups.push(group);
                continue;
            }

            debug!(
                "Group {:?} mixes different people: {:?}",
                group.members(),
                verdict.conflicting_pairs
            );
            validated.conflicts.push(ClusterConflict {
                members: group.members().to_vec(),
                conflicting_pairs: verdict.conflicting_pairs,
            });

            if self.split_conflicting {
                validated
                    .groups
                    .extend(group.members.into_iter().map(NameGroup::new));
            } else {
                validated.groups.push(group);
            }
        }

        info!(
            "Validated groups: {} conflicts, {} groups after splitting",
            validated.conflicts.len(),
            validated.groups.len()
        );

        validated
    }
}
