use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::enrich::OpenAccessResult;
use crate::text::normalize_doi;
use crate::xref::CrossReference;

/// Bibliographic source a record was fetched from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Scopus,
    Openalex,
    Pubmed,
    Other,
}

impl Source {
    pub fn as_str(&self) -> &'static str {
        match self {
            Source::Scopus => "scopus",
            Source::Openalex => "openalex",
            Source::Pubmed => "pubmed",
            Source::Other => "other",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One bibliographic item as delivered by a source adapter.
///
/// `title` is logically required but sources do ship records with an empty or
/// missing one; those surface later as `InvalidTitle`. Unknown input columns
/// are kept in `extra` so they survive the merge.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublicationRecord {
    pub source: Source,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub doi: Option<String>,
    #[serde(default)]
    pub external_id: Option<String>,
    #[serde(default)]
    pub venue: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, String>,
}

impl PublicationRecord {
    /// Lowercased DOI with URL prefix and bracketed suffix stripped, or `None`
    /// when the record carries no usable identifier.
    pub fn normalized_doi(&self) -> Option<String> {
        self.doi.as_deref().and_then(normalize_doi)
    }
}

/// A record after deduplication, progressively annotated by the
/// cross-referencer, the enrichment pipeline and the rule engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergedRecord {
    /// Sorted `|`-join of the contributing source names.
    pub sources: String,
    /// Sorted `|`-join of the source-specific identifiers.
    #[serde(default)]
    pub external_ids: String,
    /// Normalized DOI shared by the whole group, if any.
    #[serde(default)]
    pub doi: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub venue: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub archive: Option<CrossReference>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub open_access: Option<OpenAccessResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deposit_condition: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authors: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_roundtrip() {
        let parsed: Source = serde_json::from_str("\"openalex\"").unwrap();
        assert_eq!(parsed, Source::Openalex);
        assert_eq!(serde_json::to_string(&Source::Scopus).unwrap(), "\"scopus\"");
    }

    #[test]
    fn test_record_parses_minimal_json() {
        let json = r#"{"source":"pubmed","title":"A study"}"#;
        let record: PublicationRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.source, Source::Pubmed);
        assert_eq!(record.title.as_deref(), Some("A study"));
        assert!(record.doi.is_none());
        assert!(record.extra.is_empty());
    }

    #[test]
    fn test_record_keeps_unknown_columns() {
        let json = r#"{"source":"scopus","title":"T","issn":"1234-5678"}"#;
        let record: PublicationRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.extra.get("issn").map(String::as_str), Some("1234-5678"));
    }

    #[test]
    fn test_normalized_doi() {
        let record = PublicationRecord {
            source: Source::Scopus,
            title: None,
            doi: Some("https://doi.org/10.1234/ABC".to_string()),
            external_id: None,
            venue: None,
            date: None,
            extra: BTreeMap::new(),
        };
        assert_eq!(record.normalized_doi().as_deref(), Some("10.1234/abc"));
    }
}
