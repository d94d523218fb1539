use anyhow::Result;
use log::{info, warn};
use std::sync::Arc;
use std::time::Instant;

use super::load_or_fetch_snapshot;
use crate::archive::{ArchiveClient, ArchiveIndex, RemoteArchive};
use crate::cli::XrefArgs;
use crate::common::{format_elapsed, read_jsonl, setup_logging, write_jsonl};
use crate::record::MergedRecord;
use crate::xref::{cross_reference_all, XrefStats};

pub(crate) fn log_xref_stats(stats: &XrefStats) {
    info!("Cross-reference results:");
    info!("  Total records: {}", stats.total);
    info!("  In collection by DOI: {}", stats.in_collection);
    info!("  In archive outside collection by DOI: {}", stats.in_archive_outside);
    info!("  Exact title in collection: {}", stats.title_exact_in_collection);
    info!("  Fuzzy title in collection: {}", stats.title_fuzzy_in_collection);
    info!("  Exact title outside collection: {}", stats.title_exact_outside);
    info!("  Fuzzy title outside collection: {}", stats.title_fuzzy_outside);
    info!("  Not in archive: {}", stats.not_in_archive);
    info!("  Invalid titles: {}", stats.invalid_title);
    info!("  No identifier: {}", stats.no_identifier);
    info!("  Lookup errors: {}", stats.lookup_errors);
}

pub async fn run_xref_async(args: XrefArgs) -> Result<XrefStats> {
    let start_time = Instant::now();

    setup_logging(&args.log_level)?;

    info!("Starting archive cross-reference");
    info!("Input: {}", args.input);
    info!("Output: {}", args.output);
    info!("Offline: {}", args.offline);
    info!("Concurrency: {}", args.concurrency);

    let mut records: Vec<MergedRecord> = read_jsonl(&args.input)?;

    let entries = load_or_fetch_snapshot(
        args.snapshot.as_deref(),
        args.collection.as_deref(),
        args.from_year,
        args.to_year,
        &args.endpoint,
        args.timeout,
    )
    .await?;
    let index = ArchiveIndex::build(entries);
    info!("Snapshot entries: {}", index.len());
    if index.is_empty() {
        warn!("Snapshot is empty; no record can match the collection");
    }

    let remote: Option<Arc<dyn RemoteArchive>> = if args.offline {
        None
    } else {
        Some(Arc::new(ArchiveClient::new(&args.endpoint, args.timeout)?))
    };

    let stats = cross_reference_all(&mut records, &index, remote, args.concurrency).await;
    log_xref_stats(&stats);

    write_jsonl(&args.output, &records)?;
    info!(
        "Wrote {} annotated records to {} in {}",
        records.len(),
        args.output,
        format_elapsed(start_time.elapsed())
    );
    Ok(stats)
}

pub fn run_xref(args: XrefArgs) -> Result<XrefStats> {
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(run_xref_async(args))
}
