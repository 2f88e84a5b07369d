//! Durable snapshot of resolved people and works.
//!
//! A registry is the hand-off between batches: the primary corpus produces one, the
//! secondary corpus is reconciled against it, and the loader upserts from it. Works are
//! keyed by normalized title, people by canonical key.

use crate::identity::Person;
use crate::works::Work;
use crate::{ResolutionError, Result};
use log::info;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registry {
    pub people: Vec<Person>,
    /// Normalized title → work
    pub works: BTreeMap<String, Work>,
}

impl Registry {
    /// Builds a registry and checks its invariants.
    ///
    /// # Errors
    ///
    /// See [`Registry::validate`].
    pub fn new(people: Vec<Person>, works: impl IntoIterator<Item = Work>) -> Result<Self> {
        let registry = Self {
            people,
            works: works
                .into_iter()
                .map(|w| (w.normalized_title.clone(), w))
                .collect(),
        };
        registry.validate()?;
        Ok(registry)
    }

    /// Checks that canonical keys are unique, every person has an alias and every work
    /// is stored under its own normalized title.
    ///
    /// # Errors
    ///
    /// Returns [`ResolutionError::InvariantViolation`] describing the first problem.
    pub fn validate(&self) -> Result<()> {
        let mut keys = HashSet::new();
        for person in &self.people {
            if person.aliases.is_empty() {
                return Err(ResolutionError::InvariantViolation(format!(
                    "person {} has no aliases",
                    person.canonical_key
                )));
            }
            if !keys.insert(person.canonical_key.as_str()) {
                return Err(ResolutionError::InvariantViolation(format!(
                    "duplicate canonical key {}",
                    person.canonical_key
                )));
            }
        }

        if let Some((key, work)) = self
            .works
            .iter()
            .find(|(key, work)| **key != work.normalized_title)
        {
            return Err(ResolutionError::InvariantViolation(format!(
                "work {:?} stored under key {key:?}",
                work.normalized_title
            )));
        }
        Ok(())
    }

    pub fn person(&self, canonical_key: &str) -> Option<&Person> {
        self.people.iter().find(|p| p.canonical_key == canonical_key)
    }

    pub fn work(&self, normalized_title: &str) -> Option<&Work> {
        self.works.get(normalized_title)
    }

    /// Works in normalized-title order.
    pub fn works(&self) -> Vec<Work> {
        self.works.values().cloned().collect()
    }

    /// Writes the registry as pretty-printed JSON.
    pub fn to_writer<W: Write>(&self, writer: W) -> Result<()> {
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    /// Reads and validates a registry written by [`Registry::to_writer`].
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let registry: Self = serde_json::from_reader(reader)?;
        registry.validate()?;
        Ok(registry)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut writer = BufWriter::new(File::create(path.as_ref())?);
        self.to_writer(&mut writer)?;
        writer.flush()?;
        info!(
            "Saved registry with {} people and {} works to {}",
            self.people.len(),
            self.works.len(),
            path.as_ref().display()
        );
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let registry = Self::from_reader(BufReader::new(File::open(path.as_ref())?))?;
        info!(
            "Loaded registry with {} people and {} works from {}",
            registry.people.len(),
            registry.works.len(),
            path.as_ref().display()
        );
        Ok(registry)
    }
}
