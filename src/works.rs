//! Work title normalization and cross-corpus work deduplication.
//!
//! Titles are folded to a key such as `analisis_de_redes_sociales`. An incoming work
//! matches a catalog work when the keys are equal, or, for catalog titles of at least
//! [`WorkDedupConfig::min_fuzzy_title_len`] characters, when the edit distance is below
//! [`WorkDedupConfig::max_title_distance`]. Matched works are merged field by field,
//! first non-null value wins.
//!
//! ```
//! use bibresolve::works::{normalize_title, Work, WorkDeduplicator};
//!
//! assert_eq!(
//!     normalize_title("Análisis de Redes Sociales").as_deref(),
//!     Some("analisis_de_redes_sociales")
//! );
//!
//! let catalog = vec![Work::new("Análisis de Redes Sociales").unwrap()];
//! let incoming = vec![Work::new("Análisis de Redes Sociales UY").unwrap()];
//! let reconciled = WorkDeduplicator::new().reconcile(&catalog, incoming);
//! assert!(reconciled.new_works.is_empty());
//! ```

use crate::utils::{edit_distance, fold};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

/// A publication keyed by its normalized title.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Work {
    pub normalized_title: String,
    pub title: Option<String>,
    #[serde(rename = "abstract")]
    pub abstract_text: Option<String>,
    #[serde(rename = "type")]
    pub work_type: Option<String>,
    /// Landing page the record was harvested from
    pub source: Option<String>,
    pub language: Option<String>,
    pub pdf_url: Option<String>,
}

impl Work {
    /// Creates a work with only its title set. `None` when the title normalizes to nothing.
    pub fn new(title: &str) -> Option<Self> {
        Some(Self {
            normalized_title: normalize_title(title)?,
            title: Some(title.trim().to_string()),
            ..Default::default()
        })
    }

    /// Fills every empty field from `other`. Populated fields are never touched.
    ///
    /// Returns `true` if anything changed.
    pub fn merge_missing(&mut self, other: &Work) -> bool {
        let mut updated = false;
        for (field, incoming) in [
            (&mut self.title, &other.title),
            (&mut self.abstract_text, &other.abstract_text),
            (&mut self.work_type, &other.work_type),
            (&mut self.source, &other.source),
            (&mut self.language, &other.language),
            (&mut self.pdf_url, &other.pdf_url),
        ] {
            if field.is_none() && incoming.is_some() {
                field.clone_from(incoming);
                updated = true;
            }
        }
        updated
    }
}

/// Folds a title into its key: punctuation dropped, diacritics stripped, lowercased,
/// whitespace runs replaced by a single `_`.
///
/// Returns `None` if no word characters remain.
pub fn normalize_title(title: &str) -> Option<String> {
    let folded: String = fold(title)
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .collect();
    let normalized = folded.split_whitespace().collect::<Vec<_>>().join("_");
    (!normalized.is_empty()).then_some(normalized)
}

/// Thresholds for fuzzy title matching.
#[derive(Debug, Clone)]
pub struct WorkDedupConfig {
    /// Catalog titles shorter than this (in characters) only match exactly.
    pub min_fuzzy_title_len: usize,
    /// A fuzzy match needs an edit distance strictly below this.
    pub max_title_distance: usize,
}

impl Default for WorkDedupConfig {
    fn default() -> Self {
        Self {
            min_fuzzy_title_len: 20,
            max_title_distance: 5,
        }
    }
}

/// Outcome of reconciling incoming works against a catalog.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkReconciliation {
    /// Catalog works that gained at least one field
    pub updated: Vec<Work>,
    /// Incoming works with no catalog counterpart, deduplicated among themselves
    pub new_works: Vec<Work>,
    /// Incoming normalized title → catalog normalized title, for every match
    pub title_mapping: BTreeMap<String, String>,
}

impl WorkReconciliation {
    /// Title an incoming work should be referred to by after reconciliation.
    pub fn resolve<'a>(&'a self, normalized_title: &'a str) -> &'a str {
        self.title_mapping
            .get(normalized_title)
            .map_or(normalized_title, String::as_str)
    }
}

/// Matches incoming works against an existing catalog.
#[derive(Debug, Default, Clone)]
pub struct WorkDeduplicator {
    config: WorkDedupConfig,
}

impl WorkDeduplicator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_config(mut self, config: WorkDedupConfig) -> Self {
        self.config = config;
        self
    }

    /// Maps incoming normalized titles onto catalog titles.
    ///
    /// An exact match always wins. Otherwise the closest eligible catalog title is
    /// chosen, earliest in catalog order on ties.
    pub fn find_repeated<S: AsRef<str>>(
        &self,
        incoming_titles: &[S],
        existing: &[Work],
    ) -> BTreeMap<String, String> {
        let incoming: BTreeSet<&str> = incoming_titles.iter().map(AsRef::as_ref).collect();
        let catalog: HashSet<&str> = existing
            .iter()
            .map(|w| w.normalized_title.as_str())
            .collect();
        let fuzzy_candidates: Vec<&str> = existing
            .iter()
            .map(|w| w.normalized_title.as_str())
            .filter(|t| t.chars().count() >= self.config.min_fuzzy_title_len)
            .collect();

        let mut repeated = BTreeMap::new();
        for title in incoming {
            if catalog.contains(title) {
                repeated.insert(title.to_string(), title.to_string());
                continue;
            }

            let closest = fuzzy_candidates
                .iter()
                .map(|candidate| (edit_distance(candidate, title), *candidate))
                .filter(|(distance, _)| *distance < self.config.max_title_distance)
                .min_by_key(|(distance, _)| *distance);

            if let Some((distance, candidate)) = closest {
                debug!("Title {title} matches {candidate} at distance {distance}");
                repeated.insert(title.to_string(), candidate.to_string());
            }
        }
        repeated
    }

    /// Reconciles incoming works with the catalog without modifying either input.
    pub fn reconcile(&self, existing: &[Work], incoming: Vec<Work>) -> WorkReconciliation {
        let titles: Vec<&str> = incoming
            .iter()
            .map(|w| w.normalized_title.as_str())
            .collect();
        let title_mapping = self.find_repeated(&titles, existing);

        let catalog: HashMap<&str, &Work> = existing
            .iter()
            .map(|w| (w.normalized_title.as_str(), w))
            .collect();

        let mut touched: BTreeMap<String, (Work, bool)> = BTreeMap::new();
        let mut new_works: Vec<Work> = Vec::new();
        let mut new_index: HashMap<String, usize> = HashMap::new();

        for work in incoming {
            if let Some(target) = title_mapping.get(&work.normalized_title) {
                let Some(&base) = catalog.get(target.as_str()) else {
                    continue;
                };
                let (merged, changed) = touched
                    .entry(target.clone())
                    .or_insert_with(|| (base.clone(), false));
                *changed |= merged.merge_missing(&work);
            } else if let Some(&index) = new_index.get(&work.normalized_title) {
                new_works[index].merge_missing(&work);
            } else {
                new_index.insert(work.normalized_title.clone(), new_works.len());
                new_works.push(work);
            }
        }

        let updated: Vec<Work> = touched
            .into_values()
            .filter_map(|(work, changed)| changed.then_some(work))
            .collect();

        info!(
            "Reconciled works: {} matched the catalog, {} updated, {} new",
            title_mapping.len(),
            updated.len(),
            new_works.len()
        );

        WorkReconciliation {
            updated,
            new_works,
            title_mapping,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::*;

    fn work(title: &str) -> Work {
        Work::new(title).unwrap()
    }

    #[rstest]
    #[case("Análisis de Redes Sociales", Some("analisis_de_redes_sociales"))]
    #[case("  Machine   Learning: a  survey! ", Some("machine_learning_a_survey"))]
    #[case("¿Qué es la Ingeniería?", Some("que_es_la_ingenieria"))]
    #[case("Redes\tneuronales\n(2da edición)", Some("redes_neuronales_2da_edicion"))]
    #[case("...", None)]
    #[case("", None)]
    fn test_normalize_title(#[case] title: &str, #[case] expected: Option<&str>) {
        assert_eq!(normalize_title(title).as_deref(), expected);
    }

    #[test]
    fn test_long_near_duplicate_is_merged() {
        let catalog = vec![work("Análisis de Redes Sociales")];
        let incoming = ["analisis_de_redes_sociales_uy"];
        let repeated = WorkDeduplicator::new().find_repeated(&incoming, &catalog);
        assert_eq!(
            repeated,
            BTreeMap::from([(
                "analisis_de_redes_sociales_uy".to_string(),
                "analisis_de_redes_sociales".to_string()
            )])
        );
    }

    #[test]
    fn test_short_titles_only_match_exactly() {
        let catalog = vec![work("Redes Viales")];
        assert_eq!(catalog[0].normalized_title.chars().count(), 12);

        let incoming = ["redes_vialez", "redes_viales"];
        let repeated = WorkDeduplicator::new().find_repeated(&incoming, &catalog);
        assert_eq!(
            repeated,
            BTreeMap::from([("redes_viales".to_string(), "redes_viales".to_string())])
        );
    }

    #[test]
    fn test_distance_must_stay_below_limit() {
        let catalog = vec![work("Optimización de redes de transporte")];
        let incoming = [
            "optimizacion_de_redes_de_transporte_xxxx",
            "optimizacion_de_redes_de_transporte_xxx",
        ];
        let repeated = WorkDeduplicator::new().find_repeated(&incoming, &catalog);
        assert_eq!(repeated.len(), 1);
        assert!(repeated.contains_key("optimizacion_de_redes_de_transporte_xxx"));
    }

    #[test]
    fn test_exact_match_beats_fuzzy() {
        let catalog = vec![
            work("Sistemas distribuidos tolerantes a fallas v2"),
            work("Sistemas distribuidos tolerantes a fallas"),
        ];
        let incoming = ["sistemas_distribuidos_tolerantes_a_fallas"];
        let repeated = WorkDeduplicator::new().find_repeated(&incoming, &catalog);
        assert_eq!(
            repeated["sistemas_distribuidos_tolerantes_a_fallas"],
            "sistemas_distribuidos_tolerantes_a_fallas"
        );
    }

    #[test]
    fn test_merge_first_non_null_wins() {
        let mut existing = Work {
            abstract_text: Some("original abstract".to_string()),
            ..work("Análisis de Redes Sociales")
        };
        let incoming = Work {
            abstract_text: Some("other abstract".to_string()),
            language: Some("es".to_string()),
            ..work("Analisis de redes sociales")
        };

        assert!(existing.merge_missing(&incoming));
        assert_eq!(existing.abstract_text.as_deref(), Some("original abstract"));
        assert_eq!(existing.language.as_deref(), Some("es"));
        assert_eq!(existing.title.as_deref(), Some("Análisis de Redes Sociales"));

        assert!(!existing.merge_missing(&incoming));
    }

    #[test]
    fn test_merge_is_monotonic() {
        let mut existing = work("Redes");
        let fuller = Work {
            pdf_url: Some("https://example.org/a.pdf".to_string()),
            work_type: Some("article".to_string()),
            ..work("Redes")
        };
        let empty = Work {
            normalized_title: "redes".to_string(),
            ..Default::default()
        };

        existing.merge_missing(&fuller);
        let snapshot = existing.clone();
        existing.merge_missing(&empty);
        assert_eq!(existing, snapshot);
    }

    #[test]
    fn test_reconcile() {
        let catalog = vec![
            Work {
                abstract_text: Some("known".to_string()),
                ..work("Análisis de Redes Sociales")
            },
            work("Compiladores"),
        ];
        let incoming = vec![
            Work {
                language: Some("es".to_string()),
                ..work("Análisis de Redes Sociales UY")
            },
            work("Compiladores"),
            Work {
                work_type: Some("article".to_string()),
                ..work("Bases de datos")
            },
            Work {
                language: Some("en".to_string()),
                ..work("Bases de Datos")
            },
        ];

        let reconciled = WorkDeduplicator::new().reconcile(&catalog, incoming);

        assert_eq!(reconciled.updated.len(), 1);
        assert_eq!(reconciled.updated[0].normalized_title, "analisis_de_redes_sociales");
        assert_eq!(reconciled.updated[0].abstract_text.as_deref(), Some("known"));
        assert_eq!(reconciled.updated[0].language.as_deref(), Some("es"));

        assert_eq!(reconciled.new_works.len(), 1);
        assert_eq!(reconciled.new_works[0].work_type.as_deref(), Some("article"));
        assert_eq!(reconciled.new_works[0].language.as_deref(), Some("en"));

        assert_eq!(reconciled.resolve("analisis_de_redes_sociales_uy"), "analisis_de_redes_sociales");
        assert_eq!(reconciled.resolve("bases_de_datos"), "bases_de_datos");
        assert_eq!(catalog[0].language, None);
    }
}
