pub mod authors;
pub mod oa;
pub mod permissions;

pub use authors::{AuthorLookup, CrossrefClient, DEFAULT_CROSSREF_ENDPOINT};
pub use oa::{OaClient, OaLookup, OaStatus, OpenAccessResult, DEFAULT_OA_ENDPOINT};
pub use permissions::{PermissionsClient, PermissionsLookup, DEFAULT_PERMISSIONS_ENDPOINT};

use futures::stream::{self, StreamExt};
use std::sync::Arc;
use tokio::sync::Semaphore;

use crate::common::create_count_progress_bar;
use crate::record::MergedRecord;

/// Multiplier for buffer_unordered capacity relative to concurrency
const BUFFER_CAPACITY_MULTIPLIER: usize = 2;

/// External services the enrichment pipeline draws from. The author lookup
/// is optional; the others always run.
pub struct EnrichmentServices {
    pub oa: Arc<dyn OaLookup>,
    pub permissions: Arc<dyn PermissionsLookup>,
    pub authors: Option<Arc<dyn AuthorLookup>>,
}

/// Per-batch enrichment counters.
#[derive(Debug, Clone, Default)]
pub struct EnrichStats {
    pub total: usize,
    pub open: usize,
    pub closed: usize,
    pub missing: usize,
    pub oa_failures: usize,
    pub with_deposit_condition: usize,
    pub permission_skipped: usize,
    pub with_authors: usize,
}

/// Runs the enrichment stages over the whole batch: open-access status first,
/// then deposit conditions, then (optionally) author lists. Each stage
/// completes for every record before the next one starts, because the
/// permission stage reads what the OA stage wrote.
pub async fn enrich_records(
    records: &mut [MergedRecord],
    services: &EnrichmentServices,
    concurrency: usize,
) -> EnrichStats {
    let mut stats = EnrichStats {
        total: records.len(),
        ..Default::default()
    };

    run_oa_stage(records, services.oa.clone(), concurrency, &mut stats).await;
    run_permission_stage(records, services.permissions.clone(), concurrency, &mut stats).await;
    if let Some(authors) = services.authors.clone() {
        run_author_stage(records, authors, concurrency, &mut stats).await;
    }
    stats
}

async fn run_oa_stage(
    records: &mut [MergedRecord],
    oa: Arc<dyn OaLookup>,
    concurrency: usize,
    stats: &mut EnrichStats,
) {
    let semaphore = Arc::new(Semaphore::new(concurrency));
    let progress = create_count_progress_bar(records.len() as u64);

    let results: Vec<(usize, OpenAccessResult)> = stream::iter(records.iter().enumerate())
        .map(|(i, record)| {
            let oa = oa.clone();
            let semaphore = semaphore.clone();
            let progress = progress.clone();
            let doi = record.doi.clone();
            async move {
                let _permit = semaphore
                    .acquire()
                    .await
                    .expect("semaphore should never be closed");
                // Records without a DOI cannot be looked up at all.
                let result = match doi.as_deref().filter(|d| !d.is_empty()) {
                    Some(doi) => oa.query(doi).await,
                    None => OpenAccessResult::status_only(OaStatus::Missing),
                };
                progress.inc(1);
                (i, result)
            }
        })
        .buffer_unordered(concurrency * BUFFER_CAPACITY_MULTIPLIER)
        .collect()
        .await;

    progress.finish_and_clear();

    for (i, result) in results {
        match result.status {
            OaStatus::Open => stats.open += 1,
            OaStatus::Closed => stats.closed += 1,
            OaStatus::Missing => stats.missing += 1,
            OaStatus::Timeout | OaStatus::Error => stats.oa_failures += 1,
        }
        records[i].open_access = Some(result);
    }
}

async fn run_permission_stage(
    records: &mut [MergedRecord],
    permissions: Arc<dyn PermissionsLookup>,
    concurrency: usize,
    stats: &mut EnrichStats,
) {
    let semaphore = Arc::new(Semaphore::new(concurrency));

    let results: Vec<(usize, String)> = stream::iter(records.iter().enumerate())
        .map(|(i, record)| {
            let permissions = permissions.clone();
            let semaphore = semaphore.clone();
            let doi = record.doi.clone();
            // The OA stage already settled these records.
            let skip = record
                .open_access
                .as_ref()
                .is_some_and(OpenAccessResult::resolves_deposit);
            async move {
                let _permit = semaphore
                    .acquire()
                    .await
                    .expect("semaphore should never be closed");
                let condition = match doi.as_deref().filter(|d| !d.is_empty()) {
                    Some(doi) if !skip => permissions.deposit_condition(doi).await,
                    _ => String::new(),
                };
                (i, condition)
            }
        })
        .buffer_unordered(concurrency * BUFFER_CAPACITY_MULTIPLIER)
        .collect()
        .await;

    for (i, condition) in results {
        if records[i]
            .open_access
            .as_ref()
            .is_some_and(OpenAccessResult::resolves_deposit)
        {
            stats.permission_skipped += 1;
        } else if !condition.is_empty() {
            stats.with_deposit_condition += 1;
        }
        records[i].deposit_condition = Some(condition);
    }
}

async fn run_author_stage(
    records: &mut [MergedRecord],
    authors: Arc<dyn AuthorLookup>,
    concurrency: usize,
    stats: &mut EnrichStats,
) {
    let semaphore = Arc::new(Semaphore::new(concurrency));

    let results: Vec<(usize, Vec<String>)> = stream::iter(records.iter().enumerate())
        .map(|(i, record)| {
            let authors = authors.clone();
            let semaphore = semaphore.clone();
            let doi = record.doi.clone();
            async move {
                let _permit = semaphore
                    .acquire()
                    .await
                    .expect("semaphore should never be closed");
                let names = match doi.as_deref().filter(|d| !d.is_empty()) {
                    Some(doi) => authors.authors(doi).await,
                    None => Vec::new(),
                };
                (i, names)
            }
        })
        .buffer_unordered(concurrency * BUFFER_CAPACITY_MULTIPLIER)
        .collect()
        .await;

    for (i, names) in results {
        if !names.is_empty() {
            stats.with_authors += 1;
            records[i].authors = Some(names.join("|"));
        }
    }
}
