use anyhow::Result;
use log::info;
use std::time::Instant;

use crate::archive::{write_snapshot, ArchiveClient};
use crate::cli::FetchCollectionArgs;
use crate::common::{create_spinner, format_elapsed, setup_logging};

pub async fn run_fetch_collection_async(args: FetchCollectionArgs) -> Result<usize> {
    let start_time = Instant::now();

    setup_logging(&args.log_level)?;

    info!("Starting collection snapshot download");
    info!("Collection: {}", args.collection);
    info!(
        "Years: {} to {}",
        args.from_year,
        args.to_year.map(|y| y.to_string()).unwrap_or_else(|| "*".to_string())
    );
    info!("Endpoint: {}", args.endpoint);
    info!("Output: {}", args.output);

    let client = ArchiveClient::new(&args.endpoint, args.timeout)?;
    let spinner = create_spinner("Downloading snapshot pages...");
    spinner.enable_steady_tick(std::time::Duration::from_millis(100));
    let entries = client
        .fetch_collection(&args.collection, args.from_year, args.to_year)
        .await?;
    spinner.finish_and_clear();

    write_snapshot(&args.output, &entries)?;

    info!(
        "Wrote {} snapshot entries to {} in {}",
        entries.len(),
        args.output,
        format_elapsed(start_time.elapsed())
    );
    Ok(entries.len())
}

pub fn run_fetch_collection(args: FetchCollectionArgs) -> Result<usize> {
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(run_fetch_collection_async(args))
}
