use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashSet;
use std::time::Duration;

use crate::text::names::{initial_form, normalize_name};

pub const DEFAULT_CROSSREF_ENDPOINT: &str = "https://api.crossref.org/works";

/// Drops repeated authors that differ only in spelling. Two names collide
/// when they normalize identically, or when one is an initial-only form of
/// the other; the first spelling seen wins.
pub fn dedupe_authors(names: Vec<String>) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut initials: HashSet<String> = HashSet::new();
    let mut result = Vec::with_capacity(names.len());
    for name in names {
        let normalized = normalize_name(&name);
        if normalized.is_empty() || !seen.insert(normalized.clone()) {
            continue;
        }
        let initial = initial_form(&normalized);
        let is_initial_only = normalized
            .split_whitespace()
            .next()
            .is_some_and(|first| first.len() == 1);
        if is_initial_only && initials.contains(&initial) {
            continue;
        }
        initials.insert(initial);
        result.push(name);
    }
    result
}

/// Author-list lookup keyed by DOI. Failures degrade to an empty list.
#[async_trait]
pub trait AuthorLookup: Send + Sync {
    async fn authors(&self, doi: &str) -> Vec<String>;
}

#[derive(Deserialize)]
struct WorksResponse {
    message: WorksMessage,
}

#[derive(Deserialize)]
struct WorksMessage {
    #[serde(default)]
    author: Vec<WorkAuthor>,
}

#[derive(Deserialize)]
struct WorkAuthor {
    #[serde(default)]
    given: Option<String>,
    #[serde(default)]
    family: Option<String>,
}

impl WorkAuthor {
    fn full_name(&self) -> Option<String> {
        match (self.given.as_deref(), self.family.as_deref()) {
            (Some(given), Some(family)) => Some(format!("{} {}", given, family)),
            (None, Some(family)) => Some(family.to_string()),
            (Some(given), None) => Some(given.to_string()),
            (None, None) => None,
        }
    }
}

/// HTTP client for the Crossref works API.
pub struct CrossrefClient {
    client: Client,
    endpoint: String,
    timeout: Duration,
}

impl CrossrefClient {
    pub fn new(endpoint: &str, timeout_secs: u64) -> reqwest::Result<Self> {
        Ok(Self {
            client: Client::builder().build()?,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            timeout: Duration::from_secs(timeout_secs),
        })
    }
}

#[async_trait]
impl AuthorLookup for CrossrefClient {
    async fn authors(&self, doi: &str) -> Vec<String> {
        let url = format!("{}/{}", self.endpoint, doi);
        let resp = match self.client.get(&url).timeout(self.timeout).send().await {
            Ok(resp) => resp,
            Err(e) => {
                debug!("Author lookup failed for {}: {}", doi, e);
                return Vec::new();
            }
        };

        let body: WorksResponse = match resp.json().await {
            Ok(body) => body,
            Err(e) => {
                debug!("Unparseable author response for {}: {}", doi, e);
                return Vec::new();
            }
        };

        dedupe_authors(
            body.message
                .author
                .iter()
                .filter_map(WorkAuthor::full_name)
                .collect(),
        )
    }
}
