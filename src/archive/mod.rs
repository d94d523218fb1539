pub mod client;
pub mod snapshot;

pub use client::{ArchiveClient, RemoteArchive, RemoteDocument, DEFAULT_ARCHIVE_ENDPOINT};
pub use snapshot::{load_snapshot, write_snapshot};

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::text::{normalize_title, normalized_titles_match, Tolerance};

/// Deposit kind attached to an archive entry. Anything that is not a
/// full-text file deposit is flattened to `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DepositType {
    File,
    #[serde(other)]
    Other,
}

impl DepositType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DepositType::File => "file",
            DepositType::Other => "other",
        }
    }
}

impl fmt::Display for DepositType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for DepositType {
    fn from(s: &str) -> Self {
        if s.eq_ignore_ascii_case("file") {
            DepositType::File
        } else {
            DepositType::Other
        }
    }
}

/// One row of the collection snapshot. The archive models a work with N
/// alternate titles as N entries sharing the same `archive_id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReferenceArchiveEntry {
    pub archive_id: String,
    /// Normalized DOI, empty when the archive entry has none.
    #[serde(default)]
    pub doi: String,
    pub title: String,
    pub deposit_type: DepositType,
    #[serde(default)]
    pub external_link: String,
    #[serde(default)]
    pub external_link_id: String,
}

/// Immutable lookup structure built once per batch from the collection
/// snapshot: a DOI map, a raw-title map, and the normalized title list the
/// fuzzy matcher scans. Matching never mutates the snapshot.
pub struct ArchiveIndex {
    entries: Vec<ReferenceArchiveEntry>,
    by_doi: HashMap<String, usize>,
    by_title: HashMap<String, usize>,
    normalized_titles: Vec<(String, usize)>,
}

impl ArchiveIndex {
    pub fn build(entries: Vec<ReferenceArchiveEntry>) -> Self {
        let mut by_doi = HashMap::new();
        let mut by_title = HashMap::new();
        let mut normalized_titles = Vec::with_capacity(entries.len());
        for (i, entry) in entries.iter().enumerate() {
            if !entry.doi.is_empty() {
                by_doi.entry(entry.doi.clone()).or_insert(i);
            }
            by_title.entry(entry.title.clone()).or_insert(i);
            normalized_titles.push((normalize_title(&entry.title), i));
        }
        Self {
            entries,
            by_doi,
            by_title,
            normalized_titles,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Exact match on a normalized DOI.
    pub fn find_doi(&self, normalized_doi: &str) -> Option<&ReferenceArchiveEntry> {
        self.by_doi.get(normalized_doi).map(|&i| &self.entries[i])
    }

    /// Byte-for-byte match on a raw title.
    pub fn find_exact_title(&self, title: &str) -> Option<&ReferenceArchiveEntry> {
        self.by_title.get(title).map(|&i| &self.entries[i])
    }

    /// First entry whose normalized title passes the fuzzy comparison.
    pub fn find_fuzzy_title(&self, title: &str) -> Option<&ReferenceArchiveEntry> {
        let query = normalize_title(title);
        self.normalized_titles
            .iter()
            .find(|(candidate, _)| normalized_titles_match(&query, candidate, Tolerance::Standard))
            .map(|&(_, i)| &self.entries[i])
    }
}
