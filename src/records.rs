//! Input records for both corpora.
//!
//! The repository harvester writes one JSON object per line. Lines are decoded into a
//! loose raw shape first and then validated into [`HarvestedRecord`]; lines that fail
//! either step are quarantined with their line number so one bad record never aborts a
//! batch.
//!
//! ```
//! use bibresolve::records::read_json_lines;
//!
//! let input = r#"{"title": "Redes viales", "authors": ["Pérez, Juan"]}
//! not json
//! {"title": "  ", "authors": []}"#;
//!
//! let ingested = read_json_lines(input);
//! assert_eq!(ingested.records.len(), 1);
//! assert_eq!(ingested.quarantined.len(), 2);
//! assert_eq!(ingested.quarantined[0].line, 2);
//! ```

use crate::utils::normalize_keyword;
use crate::{ResolutionError, Result};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::io::BufRead;

/// Contributor entries containing this marker name an institution, not a person.
const INSTITUTION_MARKER: &str = "Universidad";

/// One record from the repository harvester, after validation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HarvestedRecord {
    pub title: String,
    /// Raw author strings, usually `"Surname, Given"`
    pub authors: Vec<String>,
    /// Raw advisor/contributor strings
    pub contributors: Vec<String>,
    #[serde(rename = "abstract")]
    pub abstract_text: Option<String>,
    #[serde(rename = "type")]
    pub work_type: Option<String>,
    pub language: Option<String>,
    pub pdf_url: Option<String>,
    /// Landing page the record was harvested from
    pub source: Option<String>,
    /// Keyword entries as harvested, possibly `;`-joined
    pub keywords: Vec<String>,
    /// Collection breadcrumbs, only used to partition harvest output
    pub collection_path: Vec<String>,
}

impl HarvestedRecord {
    /// Every distinct-looking name string on the record, authors first.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.authors
            .iter()
            .chain(&self.contributors)
            .map(String::as_str)
    }

    /// Normalized keywords: entries are split on `;`, periods dropped and folded.
    /// Keywords equal to one of `excluded` (typically the known work types) are skipped.
    pub fn normalized_keywords(&self, excluded: &[String]) -> Vec<String> {
        let mut keywords: Vec<String> = Vec::new();
        for keyword in self
            .keywords
            .iter()
            .flat_map(|entry| entry.split(';'))
            .filter_map(normalize_keyword)
        {
            if !excluded.contains(&keyword) && !keywords.contains(&keyword) {
                keywords.push(keyword);
            }
        }
        keywords
    }
}

/// Decoded but unvalidated harvester output.
#[derive(Debug, Deserialize)]
struct RawRecord {
    title: Option<String>,
    #[serde(default)]
    authors: Vec<String>,
    #[serde(default)]
    contributors: Vec<String>,
    #[serde(rename = "abstract")]
    abstract_text: Option<String>,
    #[serde(rename = "type")]
    work_type: Option<String>,
    language: Option<String>,
    pdf_url: Option<String>,
    source: Option<String>,
    #[serde(default)]
    keywords: Vec<String>,
    #[serde(default)]
    collection_path: Vec<String>,
}

impl TryFrom<RawRecord> for HarvestedRecord {
    type Error = ResolutionError;

    fn try_from(raw: RawRecord) -> Result<Self> {
        let title = raw
            .title
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ResolutionError::MissingField("title".to_string()))?;

        Ok(Self {
            title,
            authors: clean_names(raw.authors),
            contributors: clean_names(raw.contributors)
                .into_iter()
                .filter(|c| !c.contains(INSTITUTION_MARKER))
                .collect(),
            abstract_text: non_blank(raw.abstract_text),
            work_type: non_blank(raw.work_type),
            language: non_blank(raw.language),
            pdf_url: non_blank(raw.pdf_url),
            source: non_blank(raw.source),
            keywords: raw.keywords,
            collection_path: raw.collection_path,
        })
    }
}

fn clean_names(names: Vec<String>) -> Vec<String> {
    names
        .into_iter()
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .collect()
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// A line that could not be turned into a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuarantinedRecord {
    /// 1-based line number in the input
    pub line: usize,
    pub message: String,
}

/// Result of reading a JSON Lines batch.
#[derive(Debug, Clone, Default)]
pub struct Ingested {
    pub records: Vec<HarvestedRecord>,
    pub quarantined: Vec<QuarantinedRecord>,
}

/// Parses one JSON Lines document. Blank lines are skipped.
pub fn read_json_lines(input: &str) -> Ingested {
    let mut ingested = Ingested::default();
    for (index, line) in input.lines().enumerate() {
        ingest_line(&mut ingested, index + 1, line);
    }
    log_ingested(&ingested);
    ingested
}

/// Like [`read_json_lines`] but streams from a reader.
///
/// # Errors
///
/// Only I/O errors are returned; malformed lines are quarantined.
pub fn read_json_lines_from<R: BufRead>(reader: R) -> Result<Ingested> {
    let mut ingested = Ingested::default();
    for (index, line) in reader.lines().enumerate() {
        ingest_line(&mut ingested, index + 1, &line?);
    }
    log_ingested(&ingested);
    Ok(ingested)
}

fn ingest_line(ingested: &mut Ingested, line: usize, text: &str) {
    if text.trim().is_empty() {
        return;
    }
    match parse_line(text, line) {
        Ok(record) => ingested.records.push(record),
        Err(err) => {
            debug!("Quarantined line {line}: {err}");
            ingested.quarantined.push(QuarantinedRecord {
                line,
                message: err.to_string(),
            });
        }
    }
}

fn parse_line(text: &str, line: usize) -> Result<HarvestedRecord> {
    let raw: RawRecord =
        serde_json::from_str(text).map_err(|e| ResolutionError::MalformedRecord {
            message: e.to_string(),
            line,
        })?;
    HarvestedRecord::try_from(raw)
}

fn log_ingested(ingested: &Ingested) {
    if !ingested.quarantined.is_empty() {
        warn!(
            "Quarantined {} of {} harvested lines",
            ingested.quarantined.len(),
            ingested.quarantined.len() + ingested.records.len()
        );
    }
}

/// One work from the scholarly-index export.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexRecord {
    pub title: String,
    /// Author display names, usually `"Given Surname"`
    pub authors: Vec<String>,
    #[serde(rename = "abstract")]
    pub abstract_text: Option<String>,
    pub language: Option<String>,
    #[serde(rename = "type")]
    pub work_type: Option<String>,
    pub landing_page_url: Option<String>,
    pub keywords: Vec<String>,
}

impl IndexRecord {
    /// Index keywords are only lowercased and trimmed.
    pub fn normalized_keywords(&self) -> Vec<String> {
        let mut keywords: Vec<String> = Vec::new();
        for keyword in self
            .keywords
            .iter()
            .map(|k| k.trim().to_lowercase())
            .filter(|k| !k.is_empty())
        {
            if !keywords.contains(&keyword) {
                keywords.push(keyword);
            }
        }
        keywords
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Cursor;

    const HARVEST: &str = r#"{"title": " Redes viales ", "authors": ["Pérez, Juan", " "], "contributors": ["García, Ana", "Universidad de la República"], "abstract": "", "type": "Tesis de grado", "keywords": ["Redes; Tránsito.", "redes"], "collection_path": ["Ingeniería", "Tesis"], "source": "https://example.org/handle/1"}
{"authors": ["Pérez, Juan"]}

{"title": 42}
"#;

    #[test]
    fn test_read_json_lines() {
        let ingested = read_json_lines(HARVEST);
        assert_eq!(ingested.records.len(), 1);

        let record = &ingested.records[0];
        assert_eq!(record.title, "Redes viales");
        assert_eq!(record.authors, vec!["Pérez, Juan".to_string()]);
        assert_eq!(record.contributors, vec!["García, Ana".to_string()]);
        assert_eq!(record.abstract_text, None);
        assert_eq!(record.work_type.as_deref(), Some("Tesis de grado"));
        assert_eq!(record.source.as_deref(), Some("https://example.org/handle/1"));
        assert_eq!(record.collection_path.len(), 2);
        assert_eq!(
            record.names().collect::<Vec<_>>(),
            vec!["Pérez, Juan", "García, Ana"]
        );
    }

    #[test]
    fn test_bad_lines_are_quarantined_with_line_numbers() {
        let ingested = read_json_lines(HARVEST);
        let lines: Vec<usize> = ingested.quarantined.iter().map(|q| q.line).collect();
        assert_eq!(lines, vec![2, 4]);
        assert!(ingested.quarantined[0].message.contains("title"));
    }

    #[test]
    fn test_read_from_reader() {
        let ingested = read_json_lines_from(Cursor::new(HARVEST)).unwrap();
        assert_eq!(ingested.records.len(), 1);
        assert_eq!(ingested.quarantined.len(), 2);
    }

    #[test]
    fn test_harvested_keywords() {
        let ingested = read_json_lines(HARVEST);
        let record = &ingested.records[0];
        assert_eq!(
            record.normalized_keywords(&[]),
            vec!["redes".to_string(), "transito".to_string()]
        );
        assert_eq!(
            record.normalized_keywords(&["redes".to_string()]),
            vec!["transito".to_string()]
        );
    }

    #[test]
    fn test_index_keywords_are_lowercased() {
        let record = IndexRecord {
            title: "Paper".to_string(),
            keywords: vec!["Tránsito".to_string(), " tránsito ".to_string(), "".to_string()],
            ..Default::default()
        };
        assert_eq!(record.normalized_keywords(), vec!["tránsito".to_string()]);
    }
}
