//! Entity resolution for bibliographic metadata harvested from heterogeneous sources.
//!
//! `bibresolve` turns raw author strings and work titles from a repository harvest into
//! canonical people and works, then maps a second corpus (a scholarly-index export)
//! onto them without creating duplicates.
//!
//! # Key Features
//!
//! - **Name handling**:
//!   - Parsing of `"Surnames, Given"` and `"Surname Given"` strings
//!   - Accent-insensitive, initial-aware name comparison
//!   - Longest-first clustering with a looser post-hoc audit
//!
//! - **Identity resolution**:
//!   - Deterministic canonical keys from the shortest alias
//!   - Cross-source author matching by term coverage
//!   - Consolidation once display names are refined
//!
//! - **Work deduplication**:
//!   - Title normalization to stable keys
//!   - Edit-distance matching for long titles
//!   - First-non-null field merging
//!
//! # Basic Usage
//!
//! ```rust
//! use bibresolve::pipeline::Pipeline;
//! use bibresolve::records::read_json_lines;
//!
//! let input = r#"{"title": "Análisis de Redes", "authors": ["Pérez, Juan"], "contributors": ["Randall, Gregory"]}
//! {"title": "Redes viales", "authors": ["Perez, Juan"]}"#;
//!
//! let resolution = Pipeline::new().resolve_ingested(&read_json_lines(input)).unwrap();
//! assert_eq!(resolution.registry.people.len(), 2);
//! assert_eq!(resolution.registry.works.len(), 2);
//! assert_eq!(resolution.alias_map["Pérez, Juan"], "perez_juan");
//! ```
//!
//! # Reconciling a second corpus
//!
//! ```rust
//! # #[cfg(feature = "csv")]
//! # {
//! use bibresolve::csv::IndexCsvReader;
//! use bibresolve::pipeline::Pipeline;
//! use bibresolve::records::read_json_lines;
//!
//! let harvest = r#"{"title": "Redes viales", "authors": ["Pérez, Juan", "García, Ana"]}"#;
//! let export = "title,authorships.author.display_name\nRedes Viales,Juan Pérez|Ana García";
//!
//! let pipeline = Pipeline::new();
//! let primary = pipeline.resolve_ingested(&read_json_lines(harvest)).unwrap();
//! let index = IndexCsvReader::new().parse(export).unwrap();
//! let secondary = pipeline.reconcile_secondary(&index, &primary.registry).unwrap();
//!
//! assert!(secondary.works.new_works.is_empty());
//! assert_eq!(secondary.person_edges.len(), 2);
//! # }
//! ```
//!
//! # Error Handling
//!
//! Data-quality problems (unparseable names, ambiguous matches, malformed lines) are
//! counted in a [`pipeline::BatchReport`] rather than returned as errors. Operations
//! that can fail return the crate [`Result`] type wrapping [`ResolutionError`]:
//!
//! ```rust
//! use bibresolve::registry::Registry;
//! use bibresolve::ResolutionError;
//!
//! match Registry::load("missing-registry.json") {
//!     Ok(registry) => println!("{} people", registry.people.len()),
//!     Err(ResolutionError::Io(e)) => eprintln!("Cannot read registry: {e}"),
//!     Err(e) => eprintln!("Other error: {e}"),
//! }
//! ```
//!
//! # Logging
//!
//! Stages report through the [`log`] facade. Install any logger in the binary to see
//! batch summaries at `info` and per-item decisions at `debug`.
//!
//! # Performance Considerations
//!
//! - Clustering is quadratic in the number of distinct names of one corpus
//! - Cross-source matching uses an inverted term index and can score queries on
//!   the rayon thread pool (`parallel` feature, `MatcherConfig::run_in_parallel`)

use thiserror::Error;

#[cfg(feature = "csv")]
extern crate csv as csv_crate;

pub mod cluster;
#[cfg(feature = "csv")]
pub mod csv;
pub mod identity;
pub mod matcher;
pub mod names;
pub mod pipeline;
pub mod records;
mod regex;
pub mod registry;
pub mod utils;
pub mod works;

// Reexports
pub use cluster::{ClusterValidator, NameClusterer, NameGroup};
#[cfg(feature = "csv")]
pub use csv::IndexCsvReader;
pub use identity::{IdentityBuilder, Person};
pub use matcher::{AuthorMatcher, MatchOutcome};
pub use names::{NameSimilarity, ParsedName, parse_name};
pub use pipeline::{Pipeline, PipelineConfig};
pub use registry::Registry;
pub use works::{Work, WorkDeduplicator, normalize_title};

/// A specialized Result type for resolution operations.
pub type Result<T> = std::result::Result<T, ResolutionError>;

/// Errors that abort an operation.
#[derive(Error, Debug)]
pub enum ResolutionError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Parse error: {0}")]
    InvalidFormat(String),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Malformed record: {message} at line {line}")]
    MalformedRecord { message: String, line: usize },

    #[error("Invariant violated: {0}")]
    InvariantViolation(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

#[cfg(feature = "csv")]
impl From<csv_crate::Error> for ResolutionError {
    fn from(err: csv_crate::Error) -> Self {
        ResolutionError::InvalidFormat(err.to_string())
    }
}
