use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

pub const DEFAULT_OA_ENDPOINT: &str = "https://api.unpaywall.org/v2";

/// Open-access verdict for one DOI. Failure modes are statuses, not errors,
/// so a human reviewer can triage them alongside the successes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OaStatus {
    Open,
    Closed,
    #[default]
    Missing,
    Timeout,
    Error,
}

impl OaStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OaStatus::Open => "open",
            OaStatus::Closed => "closed",
            OaStatus::Missing => "missing",
            OaStatus::Timeout => "timeout",
            OaStatus::Error => "error",
        }
    }
}

impl fmt::Display for OaStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of one open-access lookup.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OpenAccessResult {
    pub status: OaStatus,
    /// OA color reported by the lookup service (gold, green, hybrid, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publisher_license: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publisher_link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repository_link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publisher: Option<String>,
}

impl OpenAccessResult {
    pub fn status_only(status: OaStatus) -> Self {
        Self {
            status,
            ..Default::default()
        }
    }

    /// Once OA already produced a repository link or a publisher license the
    /// permission lookup is redundant and must be skipped.
    pub fn resolves_deposit(&self) -> bool {
        let non_blank = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.trim().is_empty());
        non_blank(&self.repository_link) || non_blank(&self.publisher_license)
    }
}

/// Per-DOI open-access status lookup.
#[async_trait]
pub trait OaLookup: Send + Sync {
    async fn query(&self, doi: &str) -> OpenAccessResult;
}

#[derive(Deserialize)]
struct OaResponse {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    is_oa: bool,
    #[serde(default)]
    oa_status: Option<String>,
    #[serde(default)]
    publisher: Option<String>,
    #[serde(default)]
    best_oa_location: Option<OaLocation>,
}

#[derive(Deserialize)]
struct OaLocation {
    #[serde(default)]
    host_type: Option<String>,
    #[serde(default)]
    license: Option<String>,
    #[serde(default)]
    url_for_pdf: Option<String>,
    #[serde(default)]
    url_for_landing_page: Option<String>,
}

/// Unpaywall-style HTTP client.
pub struct OaClient {
    client: Client,
    endpoint: String,
    email: String,
    timeout: Duration,
}

impl OaClient {
    pub fn new(endpoint: &str, email: &str, timeout_secs: u64) -> reqwest::Result<Self> {
        Ok(Self {
            client: Client::builder().build()?,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            email: email.to_string(),
            timeout: Duration::from_secs(timeout_secs),
        })
    }
}

#[async_trait]
impl OaLookup for OaClient {
    async fn query(&self, doi: &str) -> OpenAccessResult {
        let url = format!("{}/{}", self.endpoint, doi);
        let resp = match self
            .client
            .get(&url)
            .query(&[("email", self.email.as_str())])
            .timeout(self.timeout)
            .send()
            .await
        {
            Ok(resp) => resp,
            Err(e) => {
                debug!("OA lookup failed for {}: {}", doi, e);
                let status = if e.is_timeout() { OaStatus::Timeout } else { OaStatus::Error };
                return OpenAccessResult::status_only(status);
            }
        };

        let body: OaResponse = match resp.json().await {
            Ok(body) => body,
            Err(e) => {
                debug!("Unparseable OA response for {}: {}", doi, e);
                return OpenAccessResult::status_only(OaStatus::Error);
            }
        };

        parse_oa_response(body)
    }
}

fn parse_oa_response(body: OaResponse) -> OpenAccessResult {
    // The service answers unknown DOIs with a message instead of a record.
    if body
        .message
        .as_deref()
        .is_some_and(|m| m.contains("isn't in Unpaywall"))
    {
        return OpenAccessResult::status_only(OaStatus::Missing);
    }

    let mut result = OpenAccessResult {
        status: if body.is_oa { OaStatus::Open } else { OaStatus::Closed },
        color: body.oa_status,
        publisher: body.publisher,
        ..Default::default()
    };

    if let Some(location) = body.best_oa_location {
        match location.host_type.as_deref() {
            Some("publisher") => {
                result.publisher_license = location.license;
                result.publisher_link = location.url_for_pdf.or(location.url_for_landing_page);
            }
            Some("repository") => {
                result.repository_link = location.url_for_pdf;
            }
            _ => {}
        }
    }
    result
}
