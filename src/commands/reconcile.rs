use anyhow::{bail, Result};
use log::info;
use std::sync::Arc;
use std::time::Instant;

use super::enrich::log_enrich_stats;
use super::load_or_fetch_snapshot;
use super::xref::log_xref_stats;
use crate::actions::apply_actions;
use crate::archive::{ArchiveClient, ArchiveIndex, RemoteArchive};
use crate::cli::ReconcileArgs;
use crate::common::{format_elapsed, read_jsonl, setup_logging, write_csv, write_jsonl};
use crate::enrich::{
    enrich_records, AuthorLookup, CrossrefClient, EnrichmentServices, OaClient, PermissionsClient,
};
use crate::merge::merge_records;
use crate::record::PublicationRecord;
use crate::xref::cross_reference_all;

pub async fn run_reconcile_async(args: ReconcileArgs) -> Result<usize> {
    let start_time = Instant::now();

    setup_logging(&args.log_level)?;

    info!("Starting reconciliation pipeline");
    info!("Input: {}", args.input);
    info!("Output: {}", args.output);
    info!("Offline: {}", args.offline);
    info!("Skip enrichment: {}", args.skip_enrichment);
    info!("Concurrency: {}", args.concurrency);

    let email = match (&args.email, args.skip_enrichment) {
        (Some(email), _) => email.clone(),
        (None, true) => String::new(),
        (None, false) => bail!("--email is required unless --skip-enrichment is set"),
    };

    // Stage 1: merge duplicates across source exports.
    let records: Vec<PublicationRecord> = read_jsonl(&args.input)?;
    let input_count = records.len();
    let mut merged = merge_records(records);
    info!(
        "Merged {} input records into {} ({} duplicates collapsed)",
        input_count,
        merged.len(),
        input_count - merged.len()
    );

    // Stage 2: cross-reference against the archive.
    let entries = load_or_fetch_snapshot(
        args.snapshot.as_deref(),
        args.collection.as_deref(),
        args.from_year,
        args.to_year,
        &args.archive_endpoint,
        args.timeout,
    )
    .await?;
    let index = ArchiveIndex::build(entries);
    info!("Snapshot entries: {}", index.len());

    let remote: Option<Arc<dyn RemoteArchive>> = if args.offline {
        None
    } else {
        Some(Arc::new(ArchiveClient::new(&args.archive_endpoint, args.timeout)?))
    };

    let xref_stats = cross_reference_all(&mut merged, &index, remote, args.concurrency).await;
    log_xref_stats(&xref_stats);

    // Stage 3: enrichment lookups.
    if !args.skip_enrichment {
        let authors: Option<Arc<dyn AuthorLookup>> = if args.authors {
            Some(Arc::new(CrossrefClient::new(&args.crossref_endpoint, args.timeout)?))
        } else {
            None
        };
        let services = EnrichmentServices {
            oa: Arc::new(OaClient::new(&args.oa_endpoint, &email, args.timeout)?),
            permissions: Arc::new(PermissionsClient::new(&args.permissions_endpoint, args.timeout)?),
            authors,
        };
        let enrich_stats = enrich_records(&mut merged, &services, args.concurrency).await;
        log_enrich_stats(&enrich_stats);
    }

    // Stage 4: recommended actions.
    apply_actions(&mut merged);

    write_jsonl(&args.output, &merged)?;
    if let Some(csv_path) = &args.csv {
        write_csv(csv_path, &merged)?;
        info!("Wrote CSV export to {}", csv_path);
    }

    info!("==================== FINAL SUMMARY ====================");
    info!("Total execution time: {}", format_elapsed(start_time.elapsed()));
    info!("Input records: {}", input_count);
    info!("Output records: {}", merged.len());
    info!("Output: {}", args.output);
    info!("========================================================");

    Ok(merged.len())
}

pub fn run_reconcile(args: ReconcileArgs) -> Result<usize> {
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(run_reconcile_async(args))
}
