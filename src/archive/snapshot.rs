use anyhow::{Context, Result};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};

use super::ReferenceArchiveEntry;

/// Loads a collection snapshot previously written by `write_snapshot`.
pub fn load_snapshot(path: &str) -> Result<Vec<ReferenceArchiveEntry>> {
    let file = File::open(path).with_context(|| format!("Failed to open snapshot: {}", path))?;
    let reader = BufReader::new(file);

    let mut entries = Vec::new();
    for (lineno, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let entry: ReferenceArchiveEntry = serde_json::from_str(&line)
            .with_context(|| format!("Failed to parse snapshot entry at line {}", lineno + 1))?;
        entries.push(entry);
    }
    Ok(entries)
}

/// Writes a collection snapshot as JSONL, one entry per line.
pub fn write_snapshot(path: &str, entries: &[ReferenceArchiveEntry]) -> Result<()> {
    let file = File::create(path).with_context(|| format!("Failed to create snapshot: {}", path))?;
    let mut writer = BufWriter::new(file);
    for entry in entries {
        writeln!(writer, "{}", serde_json::to_string(entry)?)?;
    }
    writer.flush()?;
    Ok(())
}
