//! Chart repository index
//!
//! Fetches a repository's `index.yaml`, finds the chart at an exact version
//! and resolves its (possibly relative) download URL against the repository.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use url::Url;

#[cfg(test)]
use mockall::automock;

use crate::error::{Error, Result};

/// Well-known index filename stripped from repository URLs
const INDEX_FILE: &str = "index.yaml";

/// Parsed chart repository index; fetched per provision attempt, never persisted
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartIndex {
    #[serde(default)]
    pub api_version: Option<String>,
    #[serde(default)]
    pub entries: BTreeMap<String, Vec<ChartVersion>>,
}

/// One published version of a chart
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ChartVersion {
    pub version: String,
    #[serde(default)]
    pub urls: Vec<String>,
}

impl ChartIndex {
    /// Parse an index document
    pub fn from_yaml(url: &str, contents: &str) -> Result<Self> {
        serde_yaml::from_str(contents).map_err(|e| Error::IndexFetch {
            url: url.to_string(),
            message: format!("invalid index: {}", e),
        })
    }

    /// First download URL of the first entry matching `chart` at exactly `version`
    pub fn chart_url(&self, chart: &str, version: &str) -> Option<&str> {
        self.entries
            .get(chart)?
            .iter()
            .find(|v| v.version == version)?
            .urls
            .first()
            .map(String::as_str)
    }
}

/// Resolve a chart URL from the index against the repository URL
///
/// A repository URL ending in `/index.yaml` has that filename stripped to
/// obtain the base. Absolute chart URLs are returned unchanged.
pub fn resolve_chart_url(repository_url: &str, chart_url: &str) -> Result<String> {
    let url_err = |message: String| Error::ChartUrl {
        base: repository_url.to_string(),
        chart_url: chart_url.to_string(),
        message,
    };

    let base = match repository_url.strip_suffix(INDEX_FILE) {
        Some(stripped) if stripped.ends_with('/') => stripped,
        _ => repository_url,
    };

    let mut base = Url::parse(base).map_err(|e| url_err(e.to_string()))?;
    // Without a trailing slash the last path segment would be replaced
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }

    base.join(chart_url)
        .map(String::from)
        .map_err(|e| url_err(e.to_string()))
}

/// Trait abstracting chart index retrieval
#[cfg_attr(test, automock)]
#[async_trait]
pub trait IndexFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<ChartIndex>;
}

/// Index fetcher using HTTP(S)
pub struct HttpIndexFetcher {
    client: reqwest::Client,
}

impl HttpIndexFetcher {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::IndexFetch {
                url: String::new(),
                message: format!("failed to create HTTP client: {}", e),
            })?;
        Ok(Self { client })
    }
}

#[async_trait]
impl IndexFetcher for HttpIndexFetcher {
    async fn fetch(&self, url: &str) -> Result<ChartIndex> {
        let fetch_err = |message: String| Error::IndexFetch {
            url: url.to_string(),
            message,
        };

        tracing::debug!("Fetching chart index from: {}", url);
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| fetch_err(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(fetch_err(format!("HTTP status {}", resp.status())));
        }

        let body = resp.text().await.map_err(|e| fetch_err(e.to_string()))?;
        ChartIndex::from_yaml(url, &body)
    }
}
