use anyhow::Result;
use log::info;
use std::time::Instant;

use crate::cli::MergeArgs;
use crate::common::{format_elapsed, read_jsonl, setup_logging, write_jsonl};
use crate::merge::merge_records;
use crate::record::PublicationRecord;

pub fn run_merge(args: MergeArgs) -> Result<usize> {
    let start_time = Instant::now();

    setup_logging(&args.log_level)?;

    info!("Starting duplicate merge");
    info!("Input: {}", args.input);
    info!("Output: {}", args.output);

    let records: Vec<PublicationRecord> = read_jsonl(&args.input)?;
    let input_count = records.len();

    let merged = merge_records(records);
    write_jsonl(&args.output, &merged)?;

    info!(
        "Merged {} records into {} ({} duplicates collapsed) in {}",
        input_count,
        merged.len(),
        input_count - merged.len(),
        format_elapsed(start_time.elapsed())
    );
    Ok(merged.len())
}
