use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

pub const DEFAULT_PERMISSIONS_ENDPOINT: &str = "https://bg.api.oa.works/permissions";

/// Archive deposit versions a rights statement can authorize.
const DEPOSITABLE_VERSIONS: [&str; 2] = ["acceptedVersion", "publishedVersion"];

/// Deposit-condition lookup. Returns a formatted condition string, or an
/// empty string when nothing depositable could be established.
#[async_trait]
pub trait PermissionsLookup: Send + Sync {
    async fn deposit_condition(&self, doi: &str) -> String;
}

#[derive(Deserialize)]
struct PermissionsResponse {
    #[serde(default)]
    best_permission: Option<BestPermission>,
}

#[derive(Deserialize)]
struct BestPermission {
    #[serde(default)]
    locations: Vec<String>,
    #[serde(default)]
    version: Option<String>,
    #[serde(default)]
    licence: Option<String>,
    #[serde(rename = "embargo_months", default)]
    embargo_months: Option<serde_json::Value>,
}

/// HTTP client for the rights-statement API.
pub struct PermissionsClient {
    client: Client,
    endpoint: String,
    timeout: Duration,
}

impl PermissionsClient {
    pub fn new(endpoint: &str, timeout_secs: u64) -> reqwest::Result<Self> {
        Ok(Self {
            client: Client::builder().build()?,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            timeout: Duration::from_secs(timeout_secs),
        })
    }
}

#[async_trait]
impl PermissionsLookup for PermissionsClient {
    async fn deposit_condition(&self, doi: &str) -> String {
        let url = format!("{}/{}", self.endpoint, doi);
        let resp = match self.client.get(&url).timeout(self.timeout).send().await {
            Ok(resp) => resp,
            Err(e) => {
                debug!("Permission lookup failed for {}: {}", doi, e);
                return String::new();
            }
        };

        let body: PermissionsResponse = match resp.json().await {
            Ok(body) => body,
            Err(e) => {
                debug!("Unparseable permission response for {}: {}", doi, e);
                return String::new();
            }
        };

        format_condition(body)
    }
}

fn format_condition(body: PermissionsResponse) -> String {
    let Some(best) = body.best_permission else {
        return String::new();
    };

    // Only statements that allow repository deposit are of any use here.
    if !best
        .locations
        .iter()
        .any(|l| l.to_lowercase().contains("repository"))
    {
        return String::new();
    }

    let Some(version) = best
        .version
        .filter(|v| DEPOSITABLE_VERSIONS.contains(&v.as_str()))
    else {
        return String::new();
    };

    let licence = best
        .licence
        .filter(|l| !l.trim().is_empty())
        .unwrap_or_else(|| "unknown licence".to_string());

    let embargo = match best.embargo_months {
        Some(serde_json::Value::Number(n)) => format!("{} months", n),
        Some(serde_json::Value::String(s)) => s,
        _ => "no months".to_string(),
    };

    format!("{} ; {} ; {}", version, licence, embargo)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn condition(json: &str) -> String {
        format_condition(serde_json::from_str(json).unwrap())
    }

    #[test]
    fn test_full_statement() {
        let c = condition(
            r#"{"best_permission":{"locations":["institutional repository"],"version":"acceptedVersion","licence":"cc-by-nc","embargo_months":12}}"#,
        );
        assert_eq!(c, "acceptedVersion ; cc-by-nc ; 12 months");
    }

    #[test]
    fn test_missing_licence_and_embargo() {
        let c = condition(
            r#"{"best_permission":{"locations":["Repository"],"version":"publishedVersion"}}"#,
        );
        assert_eq!(c, "publishedVersion ; unknown licence ; no months");
    }

    #[test]
    fn test_string_embargo_kept_verbatim() {
        let c = condition(
            r#"{"best_permission":{"locations":["repository"],"version":"acceptedVersion","licence":"cc-by","embargo_months":"6 months after publication"}}"#,
        );
        assert_eq!(c, "acceptedVersion ; cc-by ; 6 months after publication");
    }

    #[test]
    fn test_non_repository_location_rejected() {
        let c = condition(
            r#"{"best_permission":{"locations":["publisher website"],"version":"acceptedVersion","licence":"cc-by"}}"#,
        );
        assert_eq!(c, "");
    }

    #[test]
    fn test_submitted_version_rejected() {
        let c = condition(
            r#"{"best_permission":{"locations":["repository"],"version":"submittedVersion","licence":"cc-by"}}"#,
        );
        assert_eq!(c, "");
    }

    #[test]
    fn test_no_best_permission() {
        assert_eq!(condition(r#"{}"#), "");
    }
}
