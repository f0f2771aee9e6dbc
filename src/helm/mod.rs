//! Package installer collaborator
//!
//! Installs and uninstalls Helm releases and reports a release's current
//! status and rendered manifest.

pub mod cli;
pub mod index;
pub mod storage;

use async_trait::async_trait;
use serde_json::{Map, Value};

#[cfg(test)]
use mockall::automock;

use crate::error::Result;

pub use cli::HelmCli;
pub use index::{ChartIndex, ChartVersion, HttpIndexFetcher, IndexFetcher, resolve_chart_url};

/// Installed package instance as reported by Helm storage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Release {
    pub name: String,
    pub namespace: String,
    /// Helm release status (e.g. "deployed", "pending-install", "failed")
    pub status: String,
    /// Rendered multi-document manifest
    pub manifest: String,
}

/// Trait abstracting Helm operations
///
/// `install` must be safe to repeat with identical arguments: the pass
/// retries the whole provision stage after any failure.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait PackageInstaller: Send + Sync {
    /// Install the chart at `chart_url` as `release` into `namespace`
    async fn install(
        &self,
        chart_url: &str,
        release: &str,
        namespace: &str,
        values: &Map<String, Value>,
    ) -> Result<()>;

    /// Fetch the current release record
    async fn get_release(&self, release: &str, namespace: &str) -> Result<Release>;

    /// Uninstall the release; an already-absent release is not an error
    async fn uninstall(&self, release: &str, namespace: &str) -> Result<()>;
}
