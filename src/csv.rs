//! Reader for the scholarly-index CSV export.
//!
//! The export flattens nested fields into dotted column names and joins list values
//! with `|`. Columns are mapped onto [`IndexRecord`] fields through configurable
//! header aliases.
//!
//! # Example
//!
//! ```
//! use bibresolve::csv::IndexCsvReader;
//!
//! let input = "title,authorships.author.display_name,type\n\
//!              Redes viales,Juan Pérez|Ana García,article";
//!
//! let records = IndexCsvReader::new().parse(input).unwrap();
//! assert_eq!(records[0].title, "Redes viales");
//! assert_eq!(records[0].authors, vec!["Juan Pérez", "Ana García"]);
//! ```

use csv::{ReaderBuilder, StringRecord};
use log::{debug, warn};
use std::collections::HashMap;

use crate::records::IndexRecord;
use crate::{ResolutionError, Result};

/// Default header mappings for the index export
const DEFAULT_HEADERS: &[(&str, &[&str])] = &[
    ("title", &["title", "display_name"]),
    ("authors", &["authorships.author.display_name", "authors"]),
    ("abstract", &["abstract", "abstract_inverted_index"]),
    ("language", &["language"]),
    ("type", &["type"]),
    (
        "landing_page_url",
        &["primary_location.landing_page_url", "landing_page_url"],
    ),
    ("keywords", &["keywords.display_name", "keywords"]),
];

/// Configuration for reading index CSV exports.
///
/// # Examples
///
/// ```
/// use bibresolve::csv::IndexCsvConfig;
///
/// let mut config = IndexCsvConfig::new();
/// config
///     .set_header_mapping("title", vec!["Work Title".to_string()])
///     .set_delimiter(b';')
///     .set_list_separator('#');
/// ```
#[derive(Debug, Clone)]
pub struct IndexCsvConfig {
    /// Field name → accepted header names
    header_map: HashMap<String, Vec<String>>,
    delimiter: u8,
    /// Separator inside multi-valued cells
    list_separator: char,
}

impl Default for IndexCsvConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl IndexCsvConfig {
    #[must_use]
    pub fn new() -> Self {
        let header_map = DEFAULT_HEADERS
            .iter()
            .map(|(field, aliases)| {
                (
                    field.to_string(),
                    aliases.iter().map(|s| s.to_string()).collect(),
                )
            })
            .collect();
        Self {
            header_map,
            delimiter: b',',
            list_separator: '|',
        }
    }

    /// Replaces the accepted header names for a field
    pub fn set_header_mapping(&mut self, field: &str, aliases: Vec<String>) -> &mut Self {
        self.header_map.insert(field.to_string(), aliases);
        self
    }

    pub fn set_delimiter(&mut self, delimiter: u8) -> &mut Self {
        self.delimiter = delimiter;
        self
    }

    pub fn set_list_separator(&mut self, separator: char) -> &mut Self {
        self.list_separator = separator;
        self
    }

    fn field_for_header(&self, header: &str) -> Option<&str> {
        let header = header.trim().to_lowercase();
        self.header_map
            .iter()
            .find(|(_, aliases)| aliases.iter().any(|a| a.to_lowercase() == header))
            .map(|(field, _)| field.as_str())
    }
}

/// Parser for index CSV exports.
#[derive(Debug, Clone, Default)]
pub struct IndexCsvReader {
    config: IndexCsvConfig,
}

impl IndexCsvReader {
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: IndexCsvConfig::new(),
        }
    }

    #[must_use]
    pub fn with_config(mut self, config: IndexCsvConfig) -> Self {
        self.config = config;
        self
    }

    /// Parses a whole export. Rows without a title are skipped with a warning.
    ///
    /// # Errors
    ///
    /// Returns [`ResolutionError::InvalidFormat`] when the CSV itself is malformed and
    /// [`ResolutionError::MissingField`] when no column maps onto `title`.
    pub fn parse(&self, input: &str) -> Result<Vec<IndexRecord>> {
        let mut reader = ReaderBuilder::new()
            .delimiter(self.config.delimiter)
            .has_headers(true)
            .flexible(true)
            .from_reader(input.as_bytes());

        let fields: Vec<Option<&str>> = reader
            .headers()?
            .iter()
            .map(|h| self.config.field_for_header(h))
            .collect();
        if !fields.contains(&Some("title")) {
            return Err(ResolutionError::MissingField("title".to_string()));
        }

        let mut records = Vec::new();
        for (index, result) in reader.records().enumerate() {
            let row = result?;
            match self.parse_row(&fields, &row) {
                Some(record) => records.push(record),
                None => warn!("Skipping index row {} without a title", index + 2),
            }
        }

        debug!("Read {} index records", records.len());
        Ok(records)
    }

    fn parse_row(&self, fields: &[Option<&str>], row: &StringRecord) -> Option<IndexRecord> {
        let mut record = IndexRecord::default();

        for (field, value) in fields.iter().zip(row.iter()) {
            let value = value.trim();
            if value.is_empty() {
                continue;
            }
            match field {
                Some("title") => record.title = value.to_string(),
                Some("authors") => record.authors = self.split_list(value),
                Some("abstract") => record.abstract_text = Some(value.to_string()),
                Some("language") => record.language = Some(value.to_string()),
                Some("type") => record.work_type = Some(value.to_string()),
                Some("landing_page_url") => record.landing_page_url = Some(value.to_string()),
                Some("keywords") => record.keywords = self.split_list(value),
                _ => {}
            }
        }

        (!record.title.is_empty()).then_some(record)
    }

    fn split_list(&self, value: &str) -> Vec<String> {
        value
            .split(self.config.list_separator)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect()
    }
}
