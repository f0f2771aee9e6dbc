//! Nested cluster descriptor extraction for HyperShift
//!
//! A release whose manifest renders a HostedCluster describes a hosted
//! control plane. Readiness and credential locations come from the live
//! HostedCluster object, since the rendered document carries no status.

use async_trait::async_trait;
use kube::api::Api;
use kube::config::Kubeconfig;
use kube::{Client, ResourceExt};
use tracing::{debug, warn};

#[cfg(test)]
use mockall::automock;

use crate::error::Result;
use crate::manifest::ManifestDocument;
use crate::models::{HostedCluster, HostedClusterStatus, RunCondition};

/// Cluster status reported once the hosted control plane is available
pub const STATUS_AVAILABLE: &str = "Available";
pub const STATUS_DEGRADED: &str = "Degraded";
pub const STATUS_PENDING: &str = "Pending";

/// Readiness and credential locations of the provisioned cluster
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NestedClusterDescriptor {
    pub namespace: String,
    pub password_secret: String,
    pub kubeconfig_secret: String,
    pub status: String,
}

/// Trait abstracting descriptor extraction from manifest documents
#[cfg_attr(test, automock)]
#[async_trait]
pub trait DescriptorExtractor: Send + Sync {
    /// Extract a descriptor, or `None` if the document does not describe a cluster
    ///
    /// `default_namespace` applies when the document omits its namespace.
    async fn extract(
        &self,
        document: &ManifestDocument,
        default_namespace: &str,
    ) -> Result<Option<NestedClusterDescriptor>>;
}

/// Extractor reading the live HostedCluster through the Kubernetes API
#[derive(Clone)]
pub struct HostedClusterExtractor {
    client: Client,
}

impl HostedClusterExtractor {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl DescriptorExtractor for HostedClusterExtractor {
    async fn extract(
        &self,
        document: &ManifestDocument,
        default_namespace: &str,
    ) -> Result<Option<NestedClusterDescriptor>> {
        let ManifestDocument::HostedCluster(rendered) = document else {
            return Ok(None);
        };

        let name = rendered.name_any();
        let namespace = rendered
            .namespace()
            .unwrap_or_else(|| default_namespace.to_string());

        let api: Api<HostedCluster> = Api::namespaced(self.client.clone(), &namespace);
        let live = api.get_opt(&name).await?;
        if live.is_none() {
            debug!(hosted_cluster = %name, namespace = %namespace, "HostedCluster not created yet");
        }

        Ok(Some(describe(
            &name,
            &namespace,
            live.as_ref().and_then(|hc| hc.status.as_ref()),
        )))
    }
}

/// Build a descriptor from a HostedCluster's identity and observed status
pub fn describe(
    name: &str,
    namespace: &str,
    status: Option<&HostedClusterStatus>,
) -> NestedClusterDescriptor {
    let secret_ref = |reference: Option<&crate::models::LocalObjectReference>, default: String| {
        reference
            .map(|r| r.name.clone())
            .filter(|n| !n.is_empty())
            .unwrap_or(default)
    };

    NestedClusterDescriptor {
        namespace: namespace.to_string(),
        password_secret: secret_ref(
            status.and_then(|s| s.kubeadmin_password.as_ref()),
            format!("{}-kubeadmin-password", name),
        ),
        kubeconfig_secret: secret_ref(
            status.and_then(|s| s.kubeconfig.as_ref()),
            format!("{}-admin-kubeconfig", name),
        ),
        status: cluster_status(status.map(|s| s.conditions.as_slice()).unwrap_or_default())
            .to_string(),
    }
}

/// Summarize HostedCluster conditions into a single cluster status
pub fn cluster_status(conditions: &[RunCondition]) -> &'static str {
    let is_true = |condition_type: &str| {
        conditions
            .iter()
            .any(|c| c.condition_type == condition_type && c.status == "True")
    };

    if is_true("Available") {
        STATUS_AVAILABLE
    } else if is_true("Degraded") {
        STATUS_DEGRADED
    } else {
        STATUS_PENDING
    }
}

/// Server URL of the first cluster entry of a kubeconfig document
///
/// Returns `None` for undecodable kubeconfigs or ones without clusters.
pub fn api_server_url(kubeconfig: &str) -> Option<String> {
    let config = match Kubeconfig::from_yaml(kubeconfig) {
        Ok(config) => config,
        Err(e) => {
            warn!("failed to decode kubeconfig: {}", e);
            return None;
        }
    };

    config
        .clusters
        .into_iter()
        .next()
        .and_then(|named| named.cluster)
        .and_then(|cluster| cluster.server)
}
