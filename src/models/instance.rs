//! ClusterTemplateInstance custom resource
//!
//! The spec is owned by the requester; the status sub-document is owned
//! exclusively by the operator and is rebuilt on every reconciliation pass.

use k8s_openapi::apimachinery::pkg::apis::meta::v1::Time;
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// One requested cluster deployment built from a ClusterTemplate
#[derive(CustomResource, Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "clustertemplate.rawagner.com",
    version = "v1alpha1",
    kind = "ClusterTemplateInstance",
    plural = "clustertemplateinstances",
    shortname = "cti",
    status = "ClusterTemplateInstanceStatus",
    namespaced,
    derive = "PartialEq",
    printcolumn = r#"{"name":"Template","type":"string","jsonPath":".spec.template"}"#,
    printcolumn = r#"{"name":"Status","type":"string","jsonPath":".status.clusterStatus"}"#,
    printcolumn = r#"{"name":"Setup","type":"boolean","jsonPath":".status.clusterSetupStarted"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct ClusterTemplateInstanceSpec {
    /// Name of the cluster-scoped ClusterTemplate to instantiate
    pub template: String,

    /// Helm values passed to the chart install
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(schema_with = "crate::models::preserve_unknown_fields")]
    pub values: Option<serde_json::Value>,
}

/// Observed state of a ClusterTemplateInstance
///
/// Optional fields serialize as `null` so that a status merge patch clears
/// values that the current pass did not observe.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClusterTemplateInstanceStatus {
    /// The chart has been installed for this instance
    #[serde(default)]
    pub created: bool,

    /// Release status, overridden by the nested cluster's own status when present
    #[serde(default)]
    pub cluster_status: String,

    /// Post-provision setup tasks have been created
    #[serde(default)]
    pub cluster_setup_started: bool,

    /// Setup task progress, rebuilt from the observed tasks
    #[serde(default)]
    pub cluster_setup: Vec<ClusterSetupStatus>,

    /// Password of the kubeadmin user of the provisioned cluster
    #[serde(default)]
    pub kubeadmin_password: Option<String>,

    /// API server URL of the provisioned cluster
    #[serde(default, rename = "apiServerURL")]
    pub api_server_url: Option<String>,
}

/// Progress of one setup task
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClusterSetupStatus {
    pub name: String,
    #[serde(default)]
    pub succeeded: SetupOutcome,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub completion_time: Option<Time>,
}

/// Tri-state outcome of a setup task, mirroring a Kubernetes condition status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum SetupOutcome {
    True,
    False,
    #[default]
    Unknown,
}

impl SetupOutcome {
    /// Parse a condition status string; anything unrecognised is `Unknown`
    pub fn from_condition_status(status: &str) -> Self {
        match status {
            "True" => Self::True,
            "False" => Self::False,
            _ => Self::Unknown,
        }
    }
}

impl ClusterTemplateInstance {
    /// Returns true if the finalizer is attached
    pub fn has_finalizer(&self, finalizer: &str) -> bool {
        self.metadata
            .finalizers
            .as_ref()
            .is_some_and(|f| f.iter().any(|name| name == finalizer))
    }

    /// Returns true if deletion has been requested
    pub fn deletion_requested(&self) -> bool {
        self.metadata.deletion_timestamp.is_some()
    }

    /// Attach the finalizer (no-op when already present)
    pub fn add_finalizer(&mut self, finalizer: &str) {
        if self.has_finalizer(finalizer) {
            return;
        }
        self.metadata
            .finalizers
            .get_or_insert_with(Vec::new)
            .push(finalizer.to_string());
    }

    /// Detach the finalizer
    pub fn remove_finalizer(&mut self, finalizer: &str) {
        if let Some(finalizers) = self.metadata.finalizers.as_mut() {
            finalizers.retain(|name| name != finalizer);
        }
    }

    /// Stored status, or the empty status of a fresh instance
    pub fn current_status(&self) -> ClusterTemplateInstanceStatus {
        self.status.clone().unwrap_or_default()
    }
}
