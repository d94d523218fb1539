use clap::{Parser, Subcommand};

use crate::archive::DEFAULT_ARCHIVE_ENDPOINT;
use crate::enrich::{DEFAULT_CROSSREF_ENDPOINT, DEFAULT_OA_ENDPOINT, DEFAULT_PERMISSIONS_ENDPOINT};

#[derive(Parser)]
#[command(name = "publication-reconciler")]
#[command(about = "Unified CLI for merging, cross-referencing, and enriching bibliographic exports against an open archive")]
#[command(version = "1.0.0")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Download a collection snapshot from the reference archive
    FetchCollection(FetchCollectionArgs),

    /// Merge duplicate records sharing a DOI across source exports
    Merge(MergeArgs),

    /// Cross-reference merged records against the archive
    Xref(XrefArgs),

    /// Enrich records with open-access status, deposit conditions, and authors
    Enrich(EnrichArgs),

    /// Run the full pipeline: merge -> xref -> enrich -> actions
    Reconcile(ReconcileArgs),
}

#[derive(Parser, Clone)]
pub struct FetchCollectionArgs {
    /// Archive collection code to snapshot
    #[arg(short, long, required = true)]
    pub collection: String,

    /// First publication year to include
    #[arg(long, default_value = "2000")]
    pub from_year: u16,

    /// Last publication year to include (open-ended when omitted)
    #[arg(long)]
    pub to_year: Option<u16>,

    /// Output snapshot file (JSONL)
    #[arg(short, long, default_value = "snapshot.jsonl")]
    pub output: String,

    /// Archive search API endpoint
    #[arg(long, default_value = DEFAULT_ARCHIVE_ENDPOINT)]
    pub endpoint: String,

    /// Timeout in seconds per request
    #[arg(short, long, default_value = "30")]
    pub timeout: u64,

    /// Logging level (DEBUG, INFO, WARN, ERROR)
    #[arg(short, long, default_value = "INFO")]
    pub log_level: String,
}

#[derive(Parser, Clone)]
pub struct MergeArgs {
    /// Input records file (JSONL, one source record per line)
    #[arg(short, long, required = true)]
    pub input: String,

    /// Output merged records file (JSONL)
    #[arg(short, long, default_value = "merged.jsonl")]
    pub output: String,

    /// Logging level (DEBUG, INFO, WARN, ERROR)
    #[arg(short, long, default_value = "INFO")]
    pub log_level: String,
}

#[derive(Parser, Clone)]
pub struct XrefArgs {
    /// Input merged records file (JSONL)
    #[arg(short, long, required = true)]
    pub input: String,

    /// Collection snapshot file from fetch-collection
    #[arg(short, long)]
    pub snapshot: Option<String>,

    /// Archive collection code to snapshot when no --snapshot is given
    #[arg(short, long)]
    pub collection: Option<String>,

    /// First publication year for an on-the-fly snapshot
    #[arg(long, default_value = "2000")]
    pub from_year: u16,

    /// Last publication year for an on-the-fly snapshot
    #[arg(long)]
    pub to_year: Option<u16>,

    /// Skip remote archive lookups and match against the snapshot only
    #[arg(long)]
    pub offline: bool,

    /// Archive search API endpoint
    #[arg(long, default_value = DEFAULT_ARCHIVE_ENDPOINT)]
    pub endpoint: String,

    /// Concurrent archive lookups
    #[arg(long, default_value = "10")]
    pub concurrency: usize,

    /// Timeout in seconds per request
    #[arg(short, long, default_value = "30")]
    pub timeout: u64,

    /// Output annotated records file (JSONL)
    #[arg(short, long, default_value = "xref.jsonl")]
    pub output: String,

    /// Logging level (DEBUG, INFO, WARN, ERROR)
    #[arg(short, long, default_value = "INFO")]
    pub log_level: String,
}

#[derive(Parser, Clone)]
pub struct EnrichArgs {
    /// Input records file (JSONL of merged records)
    #[arg(short, long, required = true)]
    pub input: String,

    /// Contact email sent with open-access lookups
    #[arg(short, long, required = true)]
    pub email: String,

    /// Also look up author lists
    #[arg(long)]
    pub authors: bool,

    /// Open-access API endpoint
    #[arg(long, default_value = DEFAULT_OA_ENDPOINT)]
    pub oa_endpoint: String,

    /// Permissions API endpoint
    #[arg(long, default_value = DEFAULT_PERMISSIONS_ENDPOINT)]
    pub permissions_endpoint: String,

    /// Works API endpoint for author lookups
    #[arg(long, default_value = DEFAULT_CROSSREF_ENDPOINT)]
    pub crossref_endpoint: String,

    /// Concurrent enrichment lookups
    #[arg(long, default_value = "10")]
    pub concurrency: usize,

    /// Timeout in seconds per request
    #[arg(short, long, default_value = "30")]
    pub timeout: u64,

    /// Output enriched records file (JSONL)
    #[arg(short, long, default_value = "enriched.jsonl")]
    pub output: String,

    /// Logging level (DEBUG, INFO, WARN, ERROR)
    #[arg(short, long, default_value = "INFO")]
    pub log_level: String,
}

#[derive(Parser, Clone)]
pub struct ReconcileArgs {
    /// Input records file (JSONL, one source record per line)
    #[arg(short, long, required = true)]
    pub input: String,

    /// Collection snapshot file from fetch-collection
    #[arg(short, long)]
    pub snapshot: Option<String>,

    /// Archive collection code to snapshot when no --snapshot is given
    #[arg(short, long)]
    pub collection: Option<String>,

    /// First publication year for an on-the-fly snapshot
    #[arg(long, default_value = "2000")]
    pub from_year: u16,

    /// Last publication year for an on-the-fly snapshot
    #[arg(long)]
    pub to_year: Option<u16>,

    /// Skip remote archive lookups and match against the snapshot only
    #[arg(long)]
    pub offline: bool,

    /// Skip the enrichment stages entirely
    #[arg(long)]
    pub skip_enrichment: bool,

    /// Also look up author lists during enrichment
    #[arg(long)]
    pub authors: bool,

    /// Contact email sent with open-access lookups (required unless --skip-enrichment)
    #[arg(short, long)]
    pub email: Option<String>,

    /// Archive search API endpoint
    #[arg(long, default_value = DEFAULT_ARCHIVE_ENDPOINT)]
    pub archive_endpoint: String,

    /// Open-access API endpoint
    #[arg(long, default_value = DEFAULT_OA_ENDPOINT)]
    pub oa_endpoint: String,

    /// Permissions API endpoint
    #[arg(long, default_value = DEFAULT_PERMISSIONS_ENDPOINT)]
    pub permissions_endpoint: String,

    /// Works API endpoint for author lookups
    #[arg(long, default_value = DEFAULT_CROSSREF_ENDPOINT)]
    pub crossref_endpoint: String,

    /// Concurrent remote lookups
    #[arg(long, default_value = "10")]
    pub concurrency: usize,

    /// Timeout in seconds per request
    #[arg(short, long, default_value = "30")]
    pub timeout: u64,

    /// Output annotated records file (JSONL)
    #[arg(short, long, default_value = "reconciled.jsonl")]
    pub output: String,

    /// Also export a flat CSV for review (optional)
    #[arg(long)]
    pub csv: Option<String>,

    /// Logging level (DEBUG, INFO, WARN, ERROR)
    #[arg(short, long, default_value = "INFO")]
    pub log_level: String,
}
