use futures::stream::{self, StreamExt};
use log::debug;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Semaphore;

use crate::archive::{ArchiveIndex, DepositType, ReferenceArchiveEntry, RemoteArchive, RemoteDocument};
use crate::common::create_count_progress_bar;
use crate::record::MergedRecord;
use crate::text::{normalize_title, normalized_titles_match, trim_bilingual_suffix, Tolerance};

/// Multiplier for buffer_unordered capacity relative to concurrency
const BUFFER_CAPACITY_MULTIPLIER: usize = 2;

/// Where a record stands relative to the archive and the target collection.
/// The variants mirror the fixed matching order: DOI before title, exact
/// before fuzzy, local collection before the full archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CrossRefStatus {
    InCollection,
    InArchiveOutsideCollection,
    TitleExactInCollection,
    TitleFuzzyInCollection,
    TitleExactInArchiveOutsideCollection,
    TitleFuzzyInArchiveOutsideCollection,
    NotInArchive,
    InvalidTitle,
    NoIdentifier,
    LookupError,
}

impl CrossRefStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CrossRefStatus::InCollection => "in_collection",
            CrossRefStatus::InArchiveOutsideCollection => "in_archive_outside_collection",
            CrossRefStatus::TitleExactInCollection => "title_exact_in_collection",
            CrossRefStatus::TitleFuzzyInCollection => "title_fuzzy_in_collection",
            CrossRefStatus::TitleExactInArchiveOutsideCollection => {
                "title_exact_in_archive_outside_collection"
            }
            CrossRefStatus::TitleFuzzyInArchiveOutsideCollection => {
                "title_fuzzy_in_archive_outside_collection"
            }
            CrossRefStatus::NotInArchive => "not_in_archive",
            CrossRefStatus::InvalidTitle => "invalid_title",
            CrossRefStatus::NoIdentifier => "no_identifier",
            CrossRefStatus::LookupError => "lookup_error",
        }
    }
}

/// Outcome of one matching attempt, immutable once produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrossReference {
    pub status: CrossRefStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matched_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matched_archive_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matched_deposit_type: Option<DepositType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matched_link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matched_link_id: Option<String>,
}

impl CrossReference {
    fn status_only(status: CrossRefStatus) -> Self {
        Self {
            status,
            matched_title: None,
            matched_archive_id: None,
            matched_deposit_type: None,
            matched_link: None,
            matched_link_id: None,
        }
    }

    fn from_entry(status: CrossRefStatus, entry: &ReferenceArchiveEntry) -> Self {
        Self {
            status,
            matched_title: Some(entry.title.clone()),
            matched_archive_id: Some(entry.archive_id.clone()),
            matched_deposit_type: Some(entry.deposit_type),
            matched_link: Some(entry.external_link.clone()),
            matched_link_id: Some(entry.external_link_id.clone()),
        }
    }

    fn from_remote(status: CrossRefStatus, doc: &RemoteDocument) -> Self {
        Self {
            status,
            matched_title: doc.titles.first().cloned(),
            matched_archive_id: Some(doc.archive_id.clone()),
            matched_deposit_type: Some(doc.deposit_type),
            matched_link: Some(doc.external_link.clone()),
            matched_link_id: Some(doc.external_link_id.clone()),
        }
    }

    /// DOI matches are authoritative; anything else gets a second opinion
    /// from the title pass.
    pub fn resolved_by_doi(&self) -> bool {
        matches!(
            self.status,
            CrossRefStatus::InCollection | CrossRefStatus::InArchiveOutsideCollection
        )
    }
}

/// Per-batch cross-reference counters.
#[derive(Debug, Clone, Default)]
pub struct XrefStats {
    pub total: usize,
    pub in_collection: usize,
    pub in_archive_outside: usize,
    pub title_exact_in_collection: usize,
    pub title_fuzzy_in_collection: usize,
    pub title_exact_outside: usize,
    pub title_fuzzy_outside: usize,
    pub not_in_archive: usize,
    pub invalid_title: usize,
    pub no_identifier: usize,
    pub lookup_errors: usize,
}

impl XrefStats {
    fn count(&mut self, status: CrossRefStatus) {
        self.total += 1;
        match status {
            CrossRefStatus::InCollection => self.in_collection += 1,
            CrossRefStatus::InArchiveOutsideCollection => self.in_archive_outside += 1,
            CrossRefStatus::TitleExactInCollection => self.title_exact_in_collection += 1,
            CrossRefStatus::TitleFuzzyInCollection => self.title_fuzzy_in_collection += 1,
            CrossRefStatus::TitleExactInArchiveOutsideCollection => self.title_exact_outside += 1,
            CrossRefStatus::TitleFuzzyInArchiveOutsideCollection => self.title_fuzzy_outside += 1,
            CrossRefStatus::NotInArchive => self.not_in_archive += 1,
            CrossRefStatus::InvalidTitle => self.invalid_title += 1,
            CrossRefStatus::NoIdentifier => self.no_identifier += 1,
            CrossRefStatus::LookupError => self.lookup_errors += 1,
        }
    }
}

/// DOI pass: local index first, then the remote archive when available.
async fn cross_reference_doi(
    record: &MergedRecord,
    index: &ArchiveIndex,
    remote: Option<&dyn RemoteArchive>,
) -> CrossReference {
    let Some(doi) = record.doi.as_deref().filter(|d| !d.is_empty()) else {
        return CrossReference::status_only(CrossRefStatus::NoIdentifier);
    };

    if let Some(entry) = index.find_doi(doi) {
        return CrossReference::from_entry(CrossRefStatus::InCollection, entry);
    }

    if let Some(remote) = remote {
        match remote.find_by_doi(doi).await {
            Ok(Some(doc)) => {
                return CrossReference::from_remote(CrossRefStatus::InArchiveOutsideCollection, &doc)
            }
            Ok(None) => {}
            Err(e) => {
                debug!("Archive DOI lookup failed for {}: {}", doi, e);
                return CrossReference::status_only(CrossRefStatus::LookupError);
            }
        }
    }
    CrossReference::status_only(CrossRefStatus::NotInArchive)
}

/// Title pass: exact then fuzzy against the local snapshot, then exact and
/// loose against the remote archive.
async fn cross_reference_title(
    record: &MergedRecord,
    index: &ArchiveIndex,
    remote: Option<&dyn RemoteArchive>,
) -> CrossReference {
    let raw = record.title.as_deref().map(str::trim).unwrap_or("");
    if raw.is_empty() {
        return CrossReference::status_only(CrossRefStatus::InvalidTitle);
    }
    let title = trim_bilingual_suffix(raw);

    if let Some(entry) = index.find_exact_title(title) {
        return CrossReference::from_entry(CrossRefStatus::TitleExactInCollection, entry);
    }
    if let Some(entry) = index.find_fuzzy_title(title) {
        return CrossReference::from_entry(CrossRefStatus::TitleFuzzyInCollection, entry);
    }

    if let Some(remote) = remote {
        match remote.find_by_title(title).await {
            Ok(Some(doc)) if doc.titles.iter().any(|t| t == title) => {
                return CrossReference::from_remote(
                    CrossRefStatus::TitleExactInArchiveOutsideCollection,
                    &doc,
                );
            }
            Ok(_) => {}
            Err(e) => {
                debug!("Archive title lookup failed for {:?}: {}", title, e);
                return CrossReference::status_only(CrossRefStatus::LookupError);
            }
        }
        // The loose query casts a wide net, so its hits are held to the
        // tighter edit budget.
        let query_norm = normalize_title(title);
        match remote.find_by_title_loose(title).await {
            Ok(Some(doc))
                if doc.titles.iter().any(|t| {
                    normalized_titles_match(&query_norm, &normalize_title(t), Tolerance::Tight)
                }) =>
            {
                return CrossReference::from_remote(
                    CrossRefStatus::TitleFuzzyInArchiveOutsideCollection,
                    &doc,
                );
            }
            Ok(_) => {}
            Err(e) => {
                debug!("Archive loose title lookup failed for {:?}: {}", title, e);
                return CrossReference::status_only(CrossRefStatus::LookupError);
            }
        }
    }
    CrossReference::status_only(CrossRefStatus::NotInArchive)
}

/// Resolves one record's membership status. Checks run in a fixed order and
/// the first authoritative match wins; failures surface as statuses, never
/// as errors.
pub async fn cross_reference_record(
    record: &MergedRecord,
    index: &ArchiveIndex,
    remote: Option<&dyn RemoteArchive>,
) -> CrossReference {
    let by_doi = cross_reference_doi(record, index, remote).await;
    if by_doi.resolved_by_doi() {
        return by_doi;
    }
    cross_reference_title(record, index, remote).await
}

/// Cross-references the whole batch under a bounded worker pool and writes
/// results back by record index.
pub async fn cross_reference_all(
    records: &mut [MergedRecord],
    index: &ArchiveIndex,
    remote: Option<Arc<dyn RemoteArchive>>,
    concurrency: usize,
) -> XrefStats {
    let semaphore = Arc::new(Semaphore::new(concurrency));
    let progress = create_count_progress_bar(records.len() as u64);

    let results: Vec<(usize, CrossReference)> = stream::iter(records.iter().enumerate())
        .map(|(i, record)| {
            let semaphore = semaphore.clone();
            let remote = remote.clone();
            let progress = progress.clone();
            async move {
                let _permit = semaphore
                    .acquire()
                    .await
                    .expect("semaphore should never be closed");
                let result = cross_reference_record(record, index, remote.as_deref()).await;
                progress.inc(1);
                (i, result)
            }
        })
        .buffer_unordered(concurrency * BUFFER_CAPACITY_MULTIPLIER)
        .collect()
        .await;

    progress.finish_and_clear();

    let mut stats = XrefStats::default();
    for (i, result) in results {
        stats.count(result.status);
        records[i].archive = Some(result);
    }
    stats
}
