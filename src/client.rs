//! Kubernetes client construction
//!
//! Uses the default kubeconfig loading strategy:
//! 1. In-cluster config (if running in a pod)
//! 2. KUBECONFIG environment variable
//! 3. ~/.kube/config

use anyhow::{Context, Result};
use kube::{Client, Config};

/// Initialize and return a Kubernetes client
pub async fn create_client() -> Result<Client> {
    let config = Config::infer()
        .await
        .context("Failed to infer Kubernetes configuration")?;
    tracing::info!(
        cluster_url = %config.cluster_url,
        default_namespace = %config.default_namespace,
        "connecting to Kubernetes API server"
    );

    Client::try_from(config).context("Failed to create Kubernetes client")
}
