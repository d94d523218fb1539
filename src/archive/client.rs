use anyhow::{Context, Result};
use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use super::{DepositType, ReferenceArchiveEntry};
use crate::text::{escape_query, normalize_doi};

pub const DEFAULT_ARCHIVE_ENDPOINT: &str = "https://api.archives-ouvertes.fr/search/";

/// Fields requested from the archive search API.
const ARCHIVE_FIELDS: &str = "docid,doiId_s,title_s,submitType_s,linkExtUrl_s,linkExtId_s";

/// Page size for snapshot pagination.
const SNAPSHOT_ROWS: &str = "1000";

/// Best-matching document returned by a remote archive search.
#[derive(Debug, Clone)]
pub struct RemoteDocument {
    pub archive_id: String,
    pub titles: Vec<String>,
    pub deposit_type: DepositType,
    pub external_link: String,
    pub external_link_id: String,
}

/// Remote search surface of the reference archive. An `Err` is a transport
/// failure; `Ok(None)` covers both a true miss and an unparseable response.
#[async_trait]
pub trait RemoteArchive: Send + Sync {
    /// Exact-identifier search on an already-normalized DOI.
    async fn find_by_doi(&self, doi: &str) -> Result<Option<RemoteDocument>>;

    /// Quoted-phrase search on the title field.
    async fn find_by_title(&self, title: &str) -> Result<Option<RemoteDocument>>;

    /// Loose (unquoted) search on the title field.
    async fn find_by_title_loose(&self, title: &str) -> Result<Option<RemoteDocument>>;
}

#[derive(Deserialize)]
struct SearchResponse {
    response: ResponseBody,
    #[serde(rename = "nextCursorMark", default)]
    next_cursor_mark: Option<String>,
}

#[derive(Deserialize)]
struct ResponseBody {
    #[serde(rename = "numFound")]
    num_found: u64,
    #[serde(default)]
    docs: Vec<ArchiveDoc>,
}

#[derive(Deserialize)]
struct ArchiveDoc {
    docid: serde_json::Value,
    #[serde(rename = "doiId_s", default)]
    doi: Option<String>,
    #[serde(rename = "title_s", default)]
    titles: Vec<String>,
    #[serde(rename = "submitType_s", default)]
    submit_type: Option<String>,
    #[serde(rename = "linkExtUrl_s", default)]
    external_link: Option<String>,
    #[serde(rename = "linkExtId_s", default)]
    external_link_id: Option<String>,
}

impl ArchiveDoc {
    /// The archive serves docids as bare numbers.
    fn id(&self) -> String {
        match self.docid.as_str() {
            Some(s) => s.to_string(),
            None => self.docid.to_string(),
        }
    }

    fn deposit_type(&self) -> DepositType {
        self.submit_type.as_deref().map(DepositType::from).unwrap_or(DepositType::Other)
    }

    fn into_document(self) -> RemoteDocument {
        let archive_id = self.id();
        let deposit_type = self.deposit_type();
        RemoteDocument {
            archive_id,
            titles: self.titles,
            deposit_type,
            external_link: self.external_link.unwrap_or_default(),
            external_link_id: self.external_link_id.unwrap_or_default(),
        }
    }
}

/// HTTP client for the reference archive's search endpoint.
pub struct ArchiveClient {
    client: Client,
    endpoint: String,
    timeout: Duration,
}

impl ArchiveClient {
    pub fn new(endpoint: &str, timeout_secs: u64) -> reqwest::Result<Self> {
        Ok(Self {
            client: Client::builder().build()?,
            endpoint: format!("{}/", endpoint.trim_end_matches('/')),
            timeout: Duration::from_secs(timeout_secs),
        })
    }

    async fn search(&self, query: &str) -> Result<Option<RemoteDocument>> {
        let resp = self
            .client
            .get(&self.endpoint)
            .query(&[("q", query), ("rows", "1"), ("fl", ARCHIVE_FIELDS), ("wt", "json")])
            .timeout(self.timeout)
            .send()
            .await?;

        // A malformed body degrades this one lookup to a miss.
        let parsed: SearchResponse = match resp.json().await {
            Ok(parsed) => parsed,
            Err(e) => {
                debug!("Unparseable archive response for query {}: {}", query, e);
                return Ok(None);
            }
        };

        if parsed.response.num_found == 0 {
            return Ok(None);
        }
        Ok(parsed.response.docs.into_iter().next().map(ArchiveDoc::into_document))
    }

    /// Downloads the full collection snapshot for an inclusive year range,
    /// cursor-paginated, one entry per alternate title. This is the only
    /// archive call allowed to fail the batch.
    pub async fn fetch_collection(
        &self,
        collection: &str,
        from_year: u16,
        to_year: Option<u16>,
    ) -> Result<Vec<ReferenceArchiveEntry>> {
        let url = format!("{}{}/", self.endpoint, collection);
        let year_filter = format!(
            "publicationDateY_i:[{} TO {}]",
            from_year,
            to_year.map(|y| y.to_string()).unwrap_or_else(|| "*".to_string())
        );

        let mut entries = Vec::new();
        let mut cursor = "*".to_string();
        loop {
            let resp = self
                .client
                .get(&url)
                .query(&[
                    ("q", "*"),
                    ("fq", year_filter.as_str()),
                    ("fl", ARCHIVE_FIELDS),
                    ("rows", SNAPSHOT_ROWS),
                    ("cursorMark", cursor.as_str()),
                    ("sort", "docid asc"),
                    ("wt", "json"),
                ])
                .timeout(self.timeout)
                .send()
                .await
                .with_context(|| format!("Snapshot request failed for collection {}", collection))?;

            let page: SearchResponse = resp
                .json()
                .await
                .with_context(|| format!("Snapshot response for collection {} was not valid JSON", collection))?;

            for doc in page.response.docs {
                let archive_id = doc.id();
                let deposit_type = doc.deposit_type();
                let doi = doc
                    .doi
                    .as_deref()
                    .and_then(normalize_doi)
                    .unwrap_or_default();
                let external_link = doc.external_link.clone().unwrap_or_default();
                let external_link_id = doc.external_link_id.clone().unwrap_or_default();
                for title in doc.titles {
                    entries.push(ReferenceArchiveEntry {
                        archive_id: archive_id.clone(),
                        doi: doi.clone(),
                        title,
                        deposit_type,
                        external_link: external_link.clone(),
                        external_link_id: external_link_id.clone(),
                    });
                }
            }

            match page.next_cursor_mark {
                Some(next) if next != cursor => cursor = next,
                _ => break,
            }
        }
        Ok(entries)
    }
}

#[async_trait]
impl RemoteArchive for ArchiveClient {
    async fn find_by_doi(&self, doi: &str) -> Result<Option<RemoteDocument>> {
        let query = format!("doiId_id:{}", escape_query(doi));
        self.search(&query).await
    }

    async fn find_by_title(&self, title: &str) -> Result<Option<RemoteDocument>> {
        let query = format!("title_t:\"{}\"", escape_query(title));
        self.search(&query).await
    }

    async fn find_by_title_loose(&self, title: &str) -> Result<Option<RemoteDocument>> {
        let query = format!("title_t:{}", escape_query(title));
        self.search(&query).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_response_parses_archive_shape() {
        let body = r#"{
            "response": {
                "numFound": 1,
                "docs": [{
                    "docid": 123456,
                    "doiId_s": "10.1234/Example",
                    "title_s": ["Primary title", "Alternate title"],
                    "submitType_s": "file",
                    "linkExtUrl_s": "https://example.org/pdf"
                }]
            },
            "nextCursorMark": "AoE="
        }"#;
        let parsed: SearchResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.response.num_found, 1);
        assert_eq!(parsed.next_cursor_mark.as_deref(), Some("AoE="));

        let doc = parsed.response.docs.into_iter().next().unwrap();
        assert_eq!(doc.id(), "123456");
        let document = doc.into_document();
        assert_eq!(document.titles.len(), 2);
        assert_eq!(document.deposit_type, DepositType::File);
        assert_eq!(document.external_link, "https://example.org/pdf");
        assert_eq!(document.external_link_id, "");
    }

    #[test]
    fn test_doc_missing_optional_fields() {
        let body = r#"{"response":{"numFound":1,"docs":[{"docid":"77","title_s":["T"],"submitType_s":"notice"}]}}"#;
        let parsed: SearchResponse = serde_json::from_str(body).unwrap();
        let doc = parsed.response.docs.into_iter().next().unwrap();
        assert_eq!(doc.id(), "77");
        assert_eq!(doc.deposit_type(), DepositType::Other);
    }
}
