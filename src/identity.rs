//! Canonical person identities built from name groups.
//!
//! Every accepted [`NameGroup`] becomes one [`Person`]. The canonical alias is the
//! member with the fewest characters (first one wins on ties) and the canonical key
//! is `surnames_normalized + "_" + given_names_normalized` of that alias. Merging two
//! people unions their aliases and recomputes the key the same way.

use crate::cluster::NameGroup;
use crate::names::parse_name;
use crate::utils::fold;
use crate::{ResolutionError, Result};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// A canonical researcher identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    pub canonical_key: String,
    /// Raw name strings that resolved to this person, never empty
    pub aliases: Vec<String>,
    /// Best-known given names for display
    pub given_names: Option<String>,
    /// Best-known surnames for display
    pub surnames: Option<String>,
}

impl Person {
    /// Builds a person from its aliases, deriving the canonical key from the shortest one.
    ///
    /// # Errors
    ///
    /// Returns [`ResolutionError::InvariantViolation`] when `aliases` is empty or the
    /// canonical alias does not parse. Aliases come from groups whose members already
    /// parsed, so either case means a logic defect upstream.
    pub fn from_aliases(aliases: Vec<String>) -> Result<Self> {
        let mut person = Self {
            canonical_key: String::new(),
            aliases,
            given_names: None,
            surnames: None,
        };
        person.recompute_key()?;
        Ok(person)
    }

    /// The alias with the fewest characters, first one on ties.
    pub fn canonical_alias(&self) -> Option<&str> {
        self.aliases
            .iter()
            .min_by_key(|alias| alias.chars().count())
            .map(String::as_str)
    }

    /// Merges `other` into `self`: aliases are unioned (keeping first-seen order),
    /// display names are kept when present and otherwise taken from `other`, and the
    /// canonical key is recomputed.
    pub fn merge(mut self, other: Person) -> Result<Self> {
        for alias in other.aliases {
            if !self.aliases.contains(&alias) {
                self.aliases.push(alias);
            }
        }
        let given_names = self.given_names.take().or(other.given_names);
        let surnames = self.surnames.take().or(other.surnames);

        self.recompute_key()?;
        self.given_names = given_names.or(self.given_names.take());
        self.surnames = surnames.or(self.surnames.take());
        Ok(self)
    }

    /// Folded `"given surnames"` used to spot people that share a refined display name.
    pub fn display_key(&self) -> Option<String> {
        let given = self.given_names.as_deref()?;
        let surnames = self.surnames.as_deref()?;
        let folded = fold(&format!("{given} {surnames}"))
            .replace(['.', '_'], " ")
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ");
        (!folded.is_empty()).then_some(folded)
    }

    fn recompute_key(&mut self) -> Result<()> {
        let alias = self.canonical_alias().ok_or_else(|| {
            ResolutionError::InvariantViolation("person without aliases".to_string())
        })?;
        let parsed = parse_name(alias).ok_or_else(|| {
            ResolutionError::InvariantViolation(format!(
                "canonical alias {alias:?} no longer parses"
            ))
        })?;

        self.canonical_key = parsed.key();
        self.given_names = Some(parsed.given_names);
        self.surnames = Some(parsed.surnames);
        Ok(())
    }
}

/// People plus the alias → canonical key lookup used when emitting edges.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Identities {
    pub people: Vec<Person>,
    pub alias_map: BTreeMap<String, String>,
}

impl Identities {
    /// Collapses people sharing a canonical key and rebuilds the alias map.
    pub fn from_people(people: Vec<Person>) -> Result<Self> {
        let mut by_key: HashMap<String, usize> = HashMap::new();
        let mut merged: Vec<Person> = Vec::with_capacity(people.len());

        for person in people {
            match by_key.get(&person.canonical_key) {
                Some(&index) => {
                    debug!("Merging people sharing key {}", person.canonical_key);
                    let existing = merged[index].clone();
                    merged[index] = existing.merge(person)?;
                }
                None => {
                    by_key.insert(person.canonical_key.clone(), merged.len());
                    merged.push(person);
                }
            }
        }

        let alias_map = merged
            .iter()
            .flat_map(|p| p.aliases.iter().map(|a| (a.clone(), p.canonical_key.clone())))
            .collect();

        Ok(Self {
            people: merged,
            alias_map,
        })
    }

    pub fn resolve(&self, alias: &str) -> Option<&str> {
        self.alias_map.get(alias).map(String::as_str)
    }
}

/// Turns validated name groups into canonical people.
#[derive(Debug, Default, Clone)]
pub struct IdentityBuilder;

impl IdentityBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Builds one person per group. Groups that end up with the same key (for example
    /// singletons split off the same conflicting group) are merged.
    ///
    /// # Errors
    ///
    /// Aborts with [`ResolutionError::InvariantViolation`] if a canonical alias fails
    /// to parse.
    pub fn build(&self, groups: &[NameGroup]) -> Result<Identities> {
        let people = groups
            .iter()
            .filter(|group| !group.is_empty())
            .map(|group| Person::from_aliases(group.members().to_vec()))
            .collect::<Result<Vec<_>>>()?;

        let identities = Identities::from_people(people)?;
        info!(
            "Built {} people from {} groups",
            identities.people.len(),
            groups.len()
        );
        Ok(identities)
    }

    /// Merges people whose refined display names fold to the same string.
    ///
    /// Returns the consolidated identities and, for every canonical key that changed,
    /// the key it was replaced by.
    pub fn consolidate(
        &self,
        people: Vec<Person>,
    ) -> Result<(Identities, BTreeMap<String, String>)> {
        let original_keys: Vec<(Vec<String>, String)> = people
            .iter()
            .map(|p| (p.aliases.clone(), p.canonical_key.clone()))
            .collect();

        let mut by_display: HashMap<String, usize> = HashMap::new();
        let mut merged: Vec<Person> = Vec::with_capacity(people.len());
        for person in people {
            let slot = person
                .display_key()
                .and_then(|key| by_display.get(&key).copied());
            match slot {
                Some(index) => {
                    let existing = merged[index].clone();
                    merged[index] = existing.merge(person)?;
                }
                None => {
                    if let Some(key) = person.display_key() {
                        by_display.insert(key, merged.len());
                    }
                    merged.push(person);
                }
            }
        }

        let identities = Identities::from_people(merged)?;
        let renamed: BTreeMap<String, String> = original_keys
            .into_iter()
            .filter_map(|(aliases, old_key)| {
                let new_key = aliases.first().and_then(|a| identities.resolve(a))?;
                (new_key != old_key).then(|| (old_key, new_key.to_string()))
            })
            .collect();

        info!(
            "Consolidated people by display name: {} people, {} keys replaced",
            identities.people.len(),
            renamed.len()
        );
        Ok((identities, renamed))
    }
}
