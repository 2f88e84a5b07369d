//! Batch resolution stages wired together.
//!
//! [`Pipeline::resolve_primary`] runs parse → cluster → validate → canonicalize over
//! one harvested corpus and produces a [`Registry`] plus the edges a loader needs.
//! [`Pipeline::reconcile_secondary`] maps a second corpus onto an existing registry:
//! authors through the [`AuthorMatcher`], works through the [`WorkDeduplicator`].
//!
//! Every stage takes its inputs by reference and returns new values; nothing is
//! mutated in place, so each stage can be exercised on its own.
//!
//! ```
//! use bibresolve::pipeline::Pipeline;
//! use bibresolve::records::read_json_lines;
//!
//! let input = r#"{"title": "Redes viales", "authors": ["Pérez, Juan", "Perez, Juan"]}"#;
//! let resolution = Pipeline::new().resolve_ingested(&read_json_lines(input)).unwrap();
//! assert_eq!(resolution.registry.people.len(), 1);
//! assert_eq!(resolution.person_edges.len(), 1);
//! ```

use crate::cluster::{ClusterConfig, ClusterConflict, ClusterValidator, NameClusterer};
use crate::identity::{IdentityBuilder, Person};
use crate::matcher::{AuthorMatcher, CrossSourceMatches, MatcherConfig};
use crate::records::{HarvestedRecord, IndexRecord, Ingested};
use crate::registry::Registry;
use crate::utils::normalize_keyword;
use crate::works::{Work, WorkDedupConfig, WorkDeduplicator, WorkReconciliation};
use crate::{ResolutionError, Result};
use itertools::Itertools;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Settings for every stage of a batch.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub cluster: ClusterConfig,
    pub matcher: MatcherConfig,
    pub works: WorkDedupConfig,
    /// A secondary work is kept only when this many of its authors are known people.
    pub min_mapped_authors: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            cluster: ClusterConfig::default(),
            matcher: MatcherConfig::default(),
            works: WorkDedupConfig::default(),
            min_mapped_authors: 2,
        }
    }
}

/// How a person relates to a work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Relation {
    Authored,
    Contributed,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PersonWorkEdge {
    pub person_key: String,
    pub work_title: String,
    pub relation: Relation,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WorkTypeEdge {
    pub work_title: String,
    pub work_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WorkKeywordEdge {
    pub work_title: String,
    pub keyword: String,
}

/// Operator-facing counts for one batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchReport {
    pub records_read: usize,
    pub quarantined_records: usize,
    pub distinct_names: usize,
    pub people_created: usize,
    pub unparseable_names: usize,
    pub conflicts_found: usize,
    pub ambiguous_names: usize,
    pub partial_coverage_names: usize,
    pub works_created: usize,
    pub works_updated: usize,
    /// Records or incoming works folded into another work by title
    pub titles_merged: usize,
    /// Records or incoming works that were not turned into works
    pub works_dropped: usize,
}

impl BatchReport {
    pub fn log_summary(&self) {
        info!(
            "Batch: {} records read, {} quarantined",
            self.records_read, self.quarantined_records
        );
        info!(
            "People: {} distinct names, {} people created, {} unparseable, {} conflicts",
            self.distinct_names, self.people_created, self.unparseable_names, self.conflicts_found
        );
        info!(
            "Matching: {} ambiguous names skipped, {} partial-coverage names skipped",
            self.ambiguous_names, self.partial_coverage_names
        );
        info!(
            "Works: {} created, {} updated, {} titles merged, {} dropped",
            self.works_created, self.works_updated, self.titles_merged, self.works_dropped
        );
    }
}

/// Display names obtained for a person outside of the name strings themselves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefinedName {
    pub given_names: String,
    pub surnames: String,
}

/// Output of resolving the primary corpus.
#[derive(Debug, Clone)]
pub struct PrimaryResolution {
    pub registry: Registry,
    /// Raw name string → canonical key
    pub alias_map: BTreeMap<String, String>,
    pub person_edges: Vec<PersonWorkEdge>,
    pub type_edges: Vec<WorkTypeEdge>,
    pub keyword_edges: Vec<WorkKeywordEdge>,
    /// Groups the validator found to mix different people
    pub conflicts: Vec<ClusterConflict>,
    pub report: BatchReport,
}

impl PrimaryResolution {
    /// Overrides display names by canonical key, then merges people whose display
    /// names now coincide and rewrites the alias map and edges to the surviving keys.
    ///
    /// Unknown keys are ignored.
    ///
    /// # Errors
    ///
    /// Propagates [`ResolutionError::InvariantViolation`] from person merging.
    pub fn apply_refinements(&mut self, refinements: &BTreeMap<String, RefinedName>) -> Result<()> {
        let people: Vec<Person> = self
            .registry
            .people
            .iter()
            .cloned()
            .map(|mut person| {
                if let Some(refined) = refinements.get(&person.canonical_key) {
                    person.given_names = Some(refined.given_names.clone());
                    person.surnames = Some(refined.surnames.clone());
                }
                person
            })
            .collect();

        let (identities, renamed) = IdentityBuilder::new().consolidate(people)?;

        self.person_edges = std::mem::take(&mut self.person_edges)
            .into_iter()
            .map(|mut edge| {
                if let Some(new_key) = renamed.get(&edge.person_key) {
                    edge.person_key.clone_from(new_key);
                }
                edge
            })
            .unique()
            .collect();
        self.alias_map = identities.alias_map;
        self.registry = Registry::new(identities.people, self.registry.works.values().cloned())?;
        self.report.people_created = self.registry.people.len();
        Ok(())
    }
}

/// Output of reconciling a secondary corpus against a registry.
#[derive(Debug, Clone)]
pub struct SecondaryResolution {
    pub matches: CrossSourceMatches,
    pub works: WorkReconciliation,
    pub person_edges: Vec<PersonWorkEdge>,
    pub type_edges: Vec<WorkTypeEdge>,
    pub keyword_edges: Vec<WorkKeywordEdge>,
    pub report: BatchReport,
}

impl SecondaryResolution {
    /// Applies the reconciliation to `registry`, returning the new snapshot.
    ///
    /// # Errors
    ///
    /// Fails if the result breaks a registry invariant.
    pub fn apply_to(&self, registry: &Registry) -> Result<Registry> {
        let mut works = registry.works.clone();
        for work in self.works.updated.iter().chain(&self.works.new_works) {
            works.insert(work.normalized_title.clone(), work.clone());
        }

        let mut people = registry.people.clone();
        people.extend(self.matches.new_people.iter().cloned());
        Registry::new(people, works.into_values())
    }
}

/// Runs the resolution stages with one configuration.
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    /// Resolves an ingested batch, carrying the quarantine count into the report.
    pub fn resolve_ingested(&self, ingested: &Ingested) -> Result<PrimaryResolution> {
        let mut resolution = self.resolve_primary(&ingested.records)?;
        resolution.report.quarantined_records = ingested.quarantined.len();
        resolution.report.records_read += ingested.quarantined.len();
        Ok(resolution)
    }

    /// Builds people, works and edges from the primary corpus.
    ///
    /// # Errors
    ///
    /// Returns [`ResolutionError::InvariantViolation`] if canonicalization breaks; data
    /// problems (unparseable names, blank titles) are only counted.
    pub fn resolve_primary(&self, records: &[HarvestedRecord]) -> Result<PrimaryResolution> {
        let mut report = BatchReport {
            records_read: records.len(),
            ..Default::default()
        };

        let names: Vec<&str> = records.iter().flat_map(HarvestedRecord::names).unique().collect();
        report.distinct_names = names.len();

        let clustering = NameClusterer::new()
            .with_config(self.config.cluster.clone())
            .cluster(&names);
        report.unparseable_names = clustering.unparseable.len();

        let validated = ClusterValidator::from_config(&self.config.cluster)
            .split_conflicting(clustering.groups);
        report.conflicts_found = validated.conflicts.len();

        let identities = IdentityBuilder::new().build(&validated.groups)?;
        report.people_created = identities.people.len();

        let mut works: Vec<Work> = Vec::new();
        let mut work_index: HashMap<String, usize> = HashMap::new();
        let mut person_edges = Vec::new();
        let mut type_edges = Vec::new();
        let mut keyword_edges = Vec::new();

        let excluded_keywords: Vec<String> = records
            .iter()
            .filter_map(|r| r.work_type.as_deref())
            .filter_map(normalize_keyword)
            .unique()
            .collect();

        for record in records {
            let Some(work) = harvested_work(record) else {
                warn!("Dropping record whose title has no words: {:?}", record.title);
                report.works_dropped += 1;
                continue;
            };
            let title = work.normalized_title.clone();

            match work_index.get(&title) {
                Some(&index) => {
                    works[index].merge_missing(&work);
                    report.titles_merged += 1;
                }
                None => {
                    work_index.insert(title.clone(), works.len());
                    works.push(work);
                }
            }

            let relations = record
                .authors
                .iter()
                .map(|a| (a, Relation::Authored))
                .chain(record.contributors.iter().map(|c| (c, Relation::Contributed)));
            for (name, relation) in relations {
                if let Some(key) = identities.resolve(name) {
                    person_edges.push(PersonWorkEdge {
                        person_key: key.to_string(),
                        work_title: title.clone(),
                        relation,
                    });
                }
            }

            if let Some(work_type) = &record.work_type {
                type_edges.push(WorkTypeEdge {
                    work_title: title.clone(),
                    work_type: work_type.clone(),
                });
            }
            for keyword in record.normalized_keywords(&excluded_keywords) {
                keyword_edges.push(WorkKeywordEdge {
                    work_title: title.clone(),
                    keyword,
                });
            }
        }
        report.works_created = works.len();

        let registry = Registry::new(identities.people, works)?;
        let resolution = PrimaryResolution {
            registry,
            alias_map: identities.alias_map,
            person_edges: person_edges.into_iter().unique().collect(),
            type_edges: type_edges.into_iter().unique().collect(),
            keyword_edges: keyword_edges.into_iter().unique().collect(),
            conflicts: validated.conflicts,
            report,
        };
        resolution.report.log_summary();
        Ok(resolution)
    }

    /// Maps a secondary corpus onto `registry`.
    ///
    /// Only works with at least `min_mapped_authors` known authors are considered.
    /// Their titles are reconciled against the registry's works, and edges point at the
    /// registry title whenever a match was found.
    ///
    /// # Errors
    ///
    /// Returns [`ResolutionError::Config`] when `min_mapped_authors` is zero, which
    /// would admit works with no known author.
    pub fn reconcile_secondary(
        &self,
        records: &[IndexRecord],
        registry: &Registry,
    ) -> Result<SecondaryResolution> {
        if self.config.min_mapped_authors == 0 {
            return Err(ResolutionError::Config(
                "min_mapped_authors must be at least 1".to_string(),
            ));
        }

        let mut report = BatchReport {
            records_read: records.len(),
            ..Default::default()
        };

        let queries: Vec<&str> = records
            .iter()
            .flat_map(|r| r.authors.iter().map(String::as_str))
            .unique()
            .collect();
        report.distinct_names = queries.len();

        let matches = AuthorMatcher::new(&registry.people)
            .with_config(self.config.matcher.clone())
            .match_all(&queries);
        report.ambiguous_names = matches.ambiguous();
        report.partial_coverage_names = matches.partial();
        report.people_created = matches.new_people.len();

        let kept: Vec<(&IndexRecord, Work)> = records
            .iter()
            .filter_map(|record| {
                let mapped = record
                    .authors
                    .iter()
                    .filter(|a| matches.resolve(a).is_some())
                    .count();
                if mapped < self.config.min_mapped_authors {
                    report.works_dropped += 1;
                    return None;
                }
                match index_work(record) {
                    Some(work) => Some((record, work)),
                    None => {
                        warn!("Dropping index work whose title has no words: {:?}", record.title);
                        report.works_dropped += 1;
                        None
                    }
                }
            })
            .collect();

        let catalog = registry.works();
        let reconciliation = WorkDeduplicator::new()
            .with_config(self.config.works.clone())
            .reconcile(&catalog, kept.iter().map(|(_, work)| work.clone()).collect());
        report.works_created = reconciliation.new_works.len();
        report.works_updated = reconciliation.updated.len();
        report.titles_merged = reconciliation.title_mapping.len();

        let mut person_edges = Vec::new();
        let mut type_edges = Vec::new();
        let mut keyword_edges = Vec::new();
        for (record, work) in &kept {
            let title = reconciliation.resolve(&work.normalized_title).to_string();

            for key in record.authors.iter().filter_map(|a| matches.resolve(a)) {
                person_edges.push(PersonWorkEdge {
                    person_key: key.to_string(),
                    work_title: title.clone(),
                    relation: Relation::Authored,
                });
            }
            if let Some(work_type) = &record.work_type {
                type_edges.push(WorkTypeEdge {
                    work_title: title.clone(),
                    work_type: work_type.clone(),
                });
            }
            for keyword in record.normalized_keywords() {
                keyword_edges.push(WorkKeywordEdge {
                    work_title: title.clone(),
                    keyword,
                });
            }
        }

        let resolution = SecondaryResolution {
            matches,
            works: reconciliation,
            person_edges: person_edges.into_iter().unique().collect(),
            type_edges: type_edges.into_iter().unique().collect(),
            keyword_edges: keyword_edges.into_iter().unique().collect(),
            report,
        };
        resolution.report.log_summary();
        Ok(resolution)
    }
}

fn harvested_work(record: &HarvestedRecord) -> Option<Work> {
    Some(Work {
        abstract_text: record.abstract_text.clone(),
        work_type: record.work_type.clone(),
        source: record.source.clone(),
        language: record.language.clone(),
        pdf_url: record.pdf_url.clone(),
        ..Work::new(&record.title)?
    })
}

/// The index only exposes a landing page, which is stored as the work's PDF link.
fn index_work(record: &IndexRecord) -> Option<Work> {
    Some(Work {
        abstract_text: record.abstract_text.clone(),
        work_type: record.work_type.clone(),
        language: record.language.clone(),
        pdf_url: record.landing_page_url.clone(),
        ..Work::new(&record.title)?
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn harvested(title: &str, authors: &[&str], contributors: &[&str]) -> HarvestedRecord {
        HarvestedRecord {
            title: title.to_string(),
            authors: authors.iter().map(|s| s.to_string()).collect(),
            contributors: contributors.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        }
    }

    fn primary_corpus() -> Vec<HarvestedRecord> {
        let mut first = harvested(
            "Redes viales en Montevideo",
            &["Pérez Rodríguez, Juan", "García, Ana María"],
            &["Randall, Gregory"],
        );
        first.work_type = Some("Tesis de grado".to_string());
        first.keywords = vec!["Redes; Tesis de grado".to_string()];

        let mut second = harvested("Redes viales en Montevideo.", &["Pérez, Juan Carlos"], &[]);
        second.abstract_text = Some("Resumen".to_string());

        let third = harvested("Caminos rurales", &["Pérez, Juan M.", "Gomez"], &[]);
        vec![first, second, third]
    }

    fn edge(person: &str, work: &str, relation: Relation) -> PersonWorkEdge {
        PersonWorkEdge {
            person_key: person.to_string(),
            work_title: work.to_string(),
            relation,
        }
    }

    fn index(title: &str, authors: &[&str]) -> IndexRecord {
        IndexRecord {
            title: title.to_string(),
            authors: authors.iter().map(|s| s.to_string()).collect(),
            work_type: Some("article".to_string()),
            ..Default::default()
        }
    }

    fn secondary_corpus() -> Vec<IndexRecord> {
        let mut first = index(
            "Redes viales en Montevideo UY",
            &["Juan Carlos Pérez", "Ana María García", "Someone Else"],
        );
        first.language = Some("es".to_string());
        first.landing_page_url = Some("https://example.org/w1".to_string());
        first.keywords = vec!["Tránsito".to_string()];

        let mut third = index("Caminos rurales", &["Gregory Randall", "Juan M. Pérez"]);
        third.abstract_text = Some("Abstract".to_string());

        vec![
            first,
            index("Otro trabajo", &["Gregory Randall", "Juan Perez"]),
            third,
            index("Nuevo trabajo sobre redes", &["G Randall", "A M Garcia"]),
        ]
    }

    #[test]
    fn test_resolve_primary() {
        let resolution = Pipeline::new().resolve_primary(&primary_corpus()).unwrap();

        let keys: Vec<&str> = resolution
            .registry
            .people
            .iter()
            .map(|p| p.canonical_key.as_str())
            .collect();
        assert_eq!(
            keys,
            vec![
                "perez_rodriguez_juan",
                "perez_juan_carlos",
                "perez_juan_m.",
                "garcia_ana_maria",
                "randall_gregory"
            ]
        );
        assert_eq!(resolution.conflicts.len(), 1);
        assert_eq!(
            resolution.conflicts[0].conflicting_pairs,
            vec![("Pérez, Juan Carlos".to_string(), "Pérez, Juan M.".to_string())]
        );
        assert_eq!(resolution.alias_map.get("Gomez"), None);

        let redes = resolution.registry.work("redes_viales_en_montevideo").unwrap();
        assert_eq!(redes.title.as_deref(), Some("Redes viales en Montevideo"));
        assert_eq!(redes.abstract_text.as_deref(), Some("Resumen"));
        assert_eq!(redes.work_type.as_deref(), Some("Tesis de grado"));

        assert_eq!(
            resolution.person_edges,
            vec![
                edge("perez_rodriguez_juan", "redes_viales_en_montevideo", Relation::Authored),
                edge("garcia_ana_maria", "redes_viales_en_montevideo", Relation::Authored),
                edge("randall_gregory", "redes_viales_en_montevideo", Relation::Contributed),
                edge("perez_juan_carlos", "redes_viales_en_montevideo", Relation::Authored),
                edge("perez_juan_m.", "caminos_rurales", Relation::Authored),
            ]
        );
        assert_eq!(
            resolution.keyword_edges,
            vec![WorkKeywordEdge {
                work_title: "redes_viales_en_montevideo".to_string(),
                keyword: "redes".to_string(),
            }]
        );
        assert_eq!(resolution.type_edges.len(), 1);

        assert_eq!(
            resolution.report,
            BatchReport {
                records_read: 3,
                distinct_names: 6,
                people_created: 5,
                unparseable_names: 1,
                conflicts_found: 1,
                works_created: 2,
                titles_merged: 1,
                ..Default::default()
            }
        );
    }

    #[test]
    fn test_every_parseable_alias_resolves() {
        let resolution = Pipeline::new().resolve_primary(&primary_corpus()).unwrap();
        for record in primary_corpus() {
            for name in record.names().filter(|n| *n != "Gomez") {
                let key = resolution.alias_map.get(name).unwrap();
                assert!(resolution.registry.person(key).is_some(), "{name}");
            }
        }
    }

    #[test]
    fn test_apply_refinements_merges_people() {
        let mut resolution = Pipeline::new().resolve_primary(&primary_corpus()).unwrap();
        let refinements = BTreeMap::from([(
            "perez_rodriguez_juan".to_string(),
            RefinedName {
                given_names: "Juan Carlos".to_string(),
                surnames: "Pérez".to_string(),
            },
        )]);
        resolution.apply_refinements(&refinements).unwrap();

        assert_eq!(resolution.registry.people.len(), 4);
        assert_eq!(
            resolution.alias_map.get("Pérez Rodríguez, Juan").map(String::as_str),
            Some("perez_juan_carlos")
        );
        let juan = resolution.registry.person("perez_juan_carlos").unwrap();
        assert_eq!(juan.aliases.len(), 2);
        assert_eq!(juan.given_names.as_deref(), Some("Juan Carlos"));

        let redes_authors: Vec<&str> = resolution
            .person_edges
            .iter()
            .filter(|e| e.work_title == "redes_viales_en_montevideo")
            .map(|e| e.person_key.as_str())
            .collect();
        assert_eq!(
            redes_authors,
            vec!["perez_juan_carlos", "garcia_ana_maria", "randall_gregory"]
        );
        assert_eq!(resolution.report.people_created, 4);
    }

    #[test]
    fn test_reconcile_secondary() {
        let pipeline = Pipeline::new();
        let primary = pipeline.resolve_primary(&primary_corpus()).unwrap();
        let secondary = pipeline
            .reconcile_secondary(&secondary_corpus(), &primary.registry)
            .unwrap();

        assert_eq!(
            secondary.matches.resolve("Juan Carlos Pérez"),
            Some("perez_juan_carlos")
        );
        assert_eq!(secondary.matches.resolve("Juan M. Pérez"), Some("perez_juan_m."));
        assert_eq!(secondary.matches.resolve("Juan Perez"), None);
        assert_eq!(secondary.matches.resolve("Someone Else"), None);

        assert_eq!(
            secondary.works.title_mapping,
            BTreeMap::from([
                ("caminos_rurales".to_string(), "caminos_rurales".to_string()),
                (
                    "redes_viales_en_montevideo_uy".to_string(),
                    "redes_viales_en_montevideo".to_string()
                ),
            ])
        );
        assert_eq!(secondary.works.new_works.len(), 1);
        assert_eq!(secondary.works.new_works[0].normalized_title, "nuevo_trabajo_sobre_redes");

        assert_eq!(
            secondary.person_edges,
            vec![
                edge("perez_juan_carlos", "redes_viales_en_montevideo", Relation::Authored),
                edge("garcia_ana_maria", "redes_viales_en_montevideo", Relation::Authored),
                edge("randall_gregory", "caminos_rurales", Relation::Authored),
                edge("perez_juan_m.", "caminos_rurales", Relation::Authored),
                edge("randall_gregory", "nuevo_trabajo_sobre_redes", Relation::Authored),
                edge("garcia_ana_maria", "nuevo_trabajo_sobre_redes", Relation::Authored),
            ]
        );
        assert_eq!(
            secondary.keyword_edges,
            vec![WorkKeywordEdge {
                work_title: "redes_viales_en_montevideo".to_string(),
                keyword: "tránsito".to_string(),
            }]
        );
        assert_eq!(secondary.type_edges.len(), 3);

        assert_eq!(
            secondary.report,
            BatchReport {
                records_read: 4,
                distinct_names: 8,
                ambiguous_names: 1,
                works_created: 1,
                works_updated: 2,
                titles_merged: 2,
                works_dropped: 1,
                ..Default::default()
            }
        );
    }

    #[test]
    fn test_secondary_merge_keeps_existing_fields() {
        let pipeline = Pipeline::new();
        let primary = pipeline.resolve_primary(&primary_corpus()).unwrap();
        let secondary = pipeline
            .reconcile_secondary(&secondary_corpus(), &primary.registry)
            .unwrap();
        let registry = secondary.apply_to(&primary.registry).unwrap();

        assert_eq!(registry.works.len(), 3);
        assert_eq!(registry.people.len(), 5);

        let redes = registry.work("redes_viales_en_montevideo").unwrap();
        assert_eq!(redes.abstract_text.as_deref(), Some("Resumen"));
        assert_eq!(redes.work_type.as_deref(), Some("Tesis de grado"));
        assert_eq!(redes.language.as_deref(), Some("es"));
        assert_eq!(redes.pdf_url.as_deref(), Some("https://example.org/w1"));

        let caminos = registry.work("caminos_rurales").unwrap();
        assert_eq!(caminos.abstract_text.as_deref(), Some("Abstract"));
        assert_eq!(caminos.work_type.as_deref(), Some("article"));
    }

    #[test]
    fn test_admitted_author_with_known_key_applies_cleanly() {
        let people = vec![
            Person::from_aliases(vec!["Randall, Gregory".to_string()]).unwrap(),
            Person {
                given_names: None,
                ..Person::from_aliases(vec!["Gómez, Laura".to_string()]).unwrap()
            },
        ];
        let registry = Registry::new(people, []).unwrap();
        let config = PipelineConfig {
            matcher: MatcherConfig {
                admit_new_identities: true,
                ..Default::default()
            },
            ..Default::default()
        };

        let secondary = Pipeline::new()
            .with_config(config)
            .reconcile_secondary(
                &[index("Suelos", &["Gregory Randall", "Laura Gómez", "Wolfgang Xu"])],
                &registry,
            )
            .unwrap();
        assert_eq!(secondary.matches.resolve("Laura Gómez"), Some("gomez_laura"));
        assert_eq!(secondary.report.people_created, 1);

        let updated = secondary.apply_to(&registry).unwrap();
        let keys: Vec<&str> = updated.people.iter().map(|p| p.canonical_key.as_str()).collect();
        assert_eq!(keys, vec!["randall_gregory", "gomez_laura", "xu_wolfgang"]);
        assert_eq!(
            secondary
                .person_edges
                .iter()
                .map(|e| e.person_key.as_str())
                .collect::<Vec<_>>(),
            vec!["randall_gregory", "gomez_laura", "xu_wolfgang"]
        );
    }

    #[test]
    fn test_zero_mapped_authors_is_rejected() {
        let config = PipelineConfig {
            min_mapped_authors: 0,
            ..Default::default()
        };
        let err = Pipeline::new()
            .with_config(config)
            .reconcile_secondary(&[], &Registry::default())
            .unwrap_err();
        assert!(matches!(err, ResolutionError::Config(_)));
    }
}
