use anyhow::Result;
use log::info;
use std::sync::Arc;
use std::time::Instant;

use crate::cli::EnrichArgs;
use crate::common::{format_elapsed, read_jsonl, setup_logging, write_jsonl};
use crate::enrich::{
    enrich_records, AuthorLookup, CrossrefClient, EnrichStats, EnrichmentServices, OaClient,
    PermissionsClient,
};
use crate::record::MergedRecord;

pub(crate) fn log_enrich_stats(stats: &EnrichStats) {
    info!("Enrichment results:");
    info!("  Total records: {}", stats.total);
    info!("  Open access: {}", stats.open);
    info!("  Closed access: {}", stats.closed);
    info!("  Missing from OA service: {}", stats.missing);
    info!("  OA lookup failures: {}", stats.oa_failures);
    info!("  Deposit conditions found: {}", stats.with_deposit_condition);
    info!("  Permission lookups skipped: {}", stats.permission_skipped);
    info!("  Author lists found: {}", stats.with_authors);
}

pub async fn run_enrich_async(args: EnrichArgs) -> Result<EnrichStats> {
    let start_time = Instant::now();

    setup_logging(&args.log_level)?;

    info!("Starting enrichment");
    info!("Input: {}", args.input);
    info!("Output: {}", args.output);
    info!("Concurrency: {}", args.concurrency);
    info!("Author lookups: {}", args.authors);

    let mut records: Vec<MergedRecord> = read_jsonl(&args.input)?;

    let authors: Option<Arc<dyn AuthorLookup>> = if args.authors {
        Some(Arc::new(CrossrefClient::new(&args.crossref_endpoint, args.timeout)?))
    } else {
        None
    };
    let services = EnrichmentServices {
        oa: Arc::new(OaClient::new(&args.oa_endpoint, &args.email, args.timeout)?),
        permissions: Arc::new(PermissionsClient::new(&args.permissions_endpoint, args.timeout)?),
        authors,
    };

    let stats = enrich_records(&mut records, &services, args.concurrency).await;
    log_enrich_stats(&stats);

    write_jsonl(&args.output, &records)?;
    info!(
        "Wrote {} enriched records to {} in {}",
        records.len(),
        args.output,
        format_elapsed(start_time.elapsed())
    );
    Ok(stats)
}

pub fn run_enrich(args: EnrichArgs) -> Result<EnrichStats> {
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(run_enrich_async(args))
}
