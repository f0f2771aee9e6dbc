//! Helm CLI package installer
//!
//! Install and uninstall shell out to the `helm` binary; release queries
//! read Helm's storage Secrets directly through the Kubernetes API.

use std::io::Write;
use std::process::Output;
use std::time::Duration;

use async_trait::async_trait;
use kube::Client;
use serde_json::{Map, Value};
use tokio::process::Command;
use tracing::{debug, info};

use super::storage::ReleaseStorage;
use super::{PackageInstaller, Release};
use crate::error::{Error, Result};

/// Package installer driving the Helm CLI
pub struct HelmCli {
    binary: String,
    timeout: Duration,
    storage: ReleaseStorage,
}

impl HelmCli {
    pub fn new(client: Client, binary: impl Into<String>, timeout: Duration) -> Self {
        Self {
            binary: binary.into(),
            timeout,
            storage: ReleaseStorage::new(client),
        }
    }

    async fn run(&self, action: &'static str, release: &str, args: &[String]) -> Result<Output> {
        debug!(binary = %self.binary, ?args, "executing helm {}", action);
        Command::new(&self.binary)
            .args(args)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| Error::Helm {
                action,
                release: release.to_string(),
                message: format!("failed to execute {}: {}", self.binary, e),
            })
    }
}

/// Arguments for an idempotent install: `upgrade --install` succeeds
/// whether or not the release already exists
fn install_args(
    chart_url: &str,
    release: &str,
    namespace: &str,
    values_file: &str,
    timeout: Duration,
) -> Vec<String> {
    vec![
        "upgrade".to_string(),
        "--install".to_string(),
        release.to_string(),
        chart_url.to_string(),
        "--namespace".to_string(),
        namespace.to_string(),
        "--values".to_string(),
        values_file.to_string(),
        "--timeout".to_string(),
        format!("{}s", timeout.as_secs()),
    ]
}

fn command_error(action: &'static str, release: &str, output: &Output) -> Error {
    Error::Helm {
        action,
        release: release.to_string(),
        message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
    }
}

/// Helm reports a missing release as "release: not found"
fn is_release_not_found(stderr: &str) -> bool {
    stderr.contains("release: not found")
}

#[async_trait]
impl PackageInstaller for HelmCli {
    async fn install(
        &self,
        chart_url: &str,
        release: &str,
        namespace: &str,
        values: &Map<String, Value>,
    ) -> Result<()> {
        let values_err = |message: String| Error::Helm {
            action: "install",
            release: release.to_string(),
            message,
        };

        // JSON is valid YAML, so helm reads the values file as-is
        let mut values_file = tempfile::Builder::new()
            .prefix("values-")
            .suffix(".yaml")
            .tempfile()
            .map_err(|e| values_err(format!("failed to create values file: {}", e)))?;
        let body = serde_json::to_vec(values)
            .map_err(|e| values_err(format!("failed to serialize values: {}", e)))?;
        values_file
            .write_all(&body)
            .map_err(|e| values_err(format!("failed to write values file: {}", e)))?;

        let path = values_file.path().to_string_lossy().to_string();
        let args = install_args(chart_url, release, namespace, &path, self.timeout);
        let output = self.run("install", release, &args).await?;
        if !output.status.success() {
            return Err(command_error("install", release, &output));
        }

        info!(release = %release, namespace = %namespace, chart = %chart_url, "helm release installed");
        Ok(())
    }

    async fn get_release(&self, release: &str, namespace: &str) -> Result<Release> {
        self.storage.current(release, namespace).await
    }

    async fn uninstall(&self, release: &str, namespace: &str) -> Result<()> {
        let args = vec![
            "uninstall".to_string(),
            release.to_string(),
            "--namespace".to_string(),
            namespace.to_string(),
        ];
        let output = self.run("uninstall", release, &args).await?;
        if output.status.success() {
            info!(release = %release, namespace = %namespace, "helm release uninstalled");
            return Ok(());
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        if is_release_not_found(&stderr) {
            info!(release = %release, namespace = %namespace, "helm release already absent");
            return Ok(());
        }
        Err(command_error("uninstall", release, &output))
    }
}
