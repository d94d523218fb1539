use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};

use crate::record::MergedRecord;

/// Reads a JSONL file, one value per non-blank line.
pub fn read_jsonl<T: DeserializeOwned>(path: &str) -> Result<Vec<T>> {
    let file = File::open(path).with_context(|| format!("Failed to open input file: {}", path))?;
    let reader = BufReader::new(file);

    let mut values = Vec::new();
    for (lineno, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let value: T = serde_json::from_str(&line)
            .with_context(|| format!("Failed to parse {} at line {}", path, lineno + 1))?;
        values.push(value);
    }
    Ok(values)
}

/// Writes values as JSONL, one value per line.
pub fn write_jsonl<T: Serialize>(path: &str, values: &[T]) -> Result<()> {
    let file = File::create(path).with_context(|| format!("Failed to create output file: {}", path))?;
    let mut writer = BufWriter::new(file);
    for value in values {
        writeln!(writer, "{}", serde_json::to_string(value)?)?;
    }
    writer.flush()?;
    Ok(())
}

/// Flat review-friendly CSV export. Annotation columns are spelled out so a
/// spreadsheet reader never has to unpack nested JSON; source-specific extra
/// columns are left to the JSONL output.
pub fn write_csv(path: &str, records: &[MergedRecord]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create CSV file: {}", path))?;

    writer.write_record([
        "sources",
        "external_ids",
        "doi",
        "title",
        "venue",
        "date",
        "archive_status",
        "matched_title",
        "matched_archive_id",
        "matched_deposit_type",
        "matched_link",
        "oa_status",
        "oa_color",
        "publisher_license",
        "publisher_link",
        "repository_link",
        "publisher",
        "deposit_condition",
        "authors",
        "action",
    ])?;

    for record in records {
        let archive = record.archive.as_ref();
        let oa = record.open_access.as_ref();
        writer.write_record([
            record.sources.as_str(),
            record.external_ids.as_str(),
            record.doi.as_deref().unwrap_or(""),
            record.title.as_deref().unwrap_or(""),
            record.venue.as_deref().unwrap_or(""),
            record.date.as_deref().unwrap_or(""),
            archive.map(|a| a.status.as_str()).unwrap_or(""),
            archive.and_then(|a| a.matched_title.as_deref()).unwrap_or(""),
            archive.and_then(|a| a.matched_archive_id.as_deref()).unwrap_or(""),
            archive
                .and_then(|a| a.matched_deposit_type)
                .map(|t| t.as_str())
                .unwrap_or(""),
            archive.and_then(|a| a.matched_link.as_deref()).unwrap_or(""),
            oa.map(|o| o.status.as_str()).unwrap_or(""),
            oa.and_then(|o| o.color.as_deref()).unwrap_or(""),
            oa.and_then(|o| o.publisher_license.as_deref()).unwrap_or(""),
            oa.and_then(|o| o.publisher_link.as_deref()).unwrap_or(""),
            oa.and_then(|o| o.repository_link.as_deref()).unwrap_or(""),
            oa.and_then(|o| o.publisher.as_deref()).unwrap_or(""),
            record.deposit_condition.as_deref().unwrap_or(""),
            record.authors.as_deref().unwrap_or(""),
            record.action.as_deref().unwrap_or(""),
        ])?;
    }
    writer.flush()?;
    Ok(())
}
