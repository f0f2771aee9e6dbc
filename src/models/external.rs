//! Typed views of CRDs owned by other controllers
//!
//! Only the fields the operator reads or writes are modelled. Unknown fields
//! are ignored on read. Schemas are disabled because these CRDs are installed
//! by their own projects.

use k8s_openapi::apimachinery::pkg::apis::meta::v1::Time;
use kube::CustomResource;
use serde::{Deserialize, Serialize};

/// OpenShift Helm chart repository (helm.openshift.io/v1beta1)
#[derive(CustomResource, Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[kube(
    group = "helm.openshift.io",
    version = "v1beta1",
    kind = "HelmChartRepository",
    plural = "helmchartrepositories",
    schema = "disabled"
)]
#[serde(rename_all = "camelCase")]
pub struct HelmChartRepositorySpec {
    #[serde(default)]
    pub connection_config: ConnectionConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionConfig {
    /// Chart repository URL, usually ending in `/index.yaml`
    #[serde(default)]
    pub url: String,
}

/// Knative-style status condition shared by HostedCluster and PipelineRun
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunCondition {
    #[serde(rename = "type")]
    pub condition_type: String,
    pub status: String,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LocalObjectReference {
    #[serde(default)]
    pub name: String,
}

/// HyperShift hosted control plane (hypershift.openshift.io/v1beta1)
#[derive(CustomResource, Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[kube(
    group = "hypershift.openshift.io",
    version = "v1beta1",
    kind = "HostedCluster",
    plural = "hostedclusters",
    status = "HostedClusterStatus",
    namespaced,
    derive = "PartialEq",
    schema = "disabled"
)]
pub struct HostedClusterSpec {
    #[serde(flatten)]
    pub fields: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostedClusterStatus {
    #[serde(default)]
    pub conditions: Vec<RunCondition>,
    #[serde(default)]
    pub kubeconfig: Option<LocalObjectReference>,
    #[serde(default)]
    pub kubeadmin_password: Option<LocalObjectReference>,
}

/// Tekton pipeline run (tekton.dev/v1beta1)
#[derive(CustomResource, Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[kube(
    group = "tekton.dev",
    version = "v1beta1",
    kind = "PipelineRun",
    plural = "pipelineruns",
    status = "PipelineRunStatus",
    namespaced,
    derive = "PartialEq",
    schema = "disabled"
)]
#[serde(rename_all = "camelCase")]
pub struct PipelineRunSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pipeline_ref: Option<PipelineRef>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub params: Vec<PipelineParam>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineRef {
    pub name: String,
}

/// Pipeline parameter; values may be strings or arrays on read
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineParam {
    pub name: String,
    pub value: serde_json::Value,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineRunStatus {
    #[serde(default)]
    pub conditions: Vec<RunCondition>,
    #[serde(default)]
    pub completion_time: Option<Time>,
}
