pub mod enrich;
pub mod fetch;
pub mod merge;
pub mod reconcile;
pub mod xref;

pub use enrich::run_enrich;
pub use fetch::run_fetch_collection;
pub use merge::run_merge;
pub use reconcile::run_reconcile;
pub use xref::run_xref;

use anyhow::{bail, Result};
use log::info;

use crate::archive::{load_snapshot, ArchiveClient, ReferenceArchiveEntry};

/// Resolves the collection snapshot: a local file when `--snapshot` is given,
/// a fresh download when `--collection` is given, an error when neither is.
pub(crate) async fn load_or_fetch_snapshot(
    snapshot: Option<&str>,
    collection: Option<&str>,
    from_year: u16,
    to_year: Option<u16>,
    endpoint: &str,
    timeout: u64,
) -> Result<Vec<ReferenceArchiveEntry>> {
    match (snapshot, collection) {
        (Some(path), _) => {
            info!("Loading collection snapshot from: {}", path);
            load_snapshot(path)
        }
        (None, Some(collection)) => {
            info!("Fetching collection snapshot for: {}", collection);
            let client = ArchiveClient::new(endpoint, timeout)?;
            client.fetch_collection(collection, from_year, to_year).await
        }
        (None, None) => bail!("Either --snapshot or --collection must be given"),
    }
}
