//! ClusterTemplate custom resource
//!
//! Cluster-scoped description of an installable chart and the ordered
//! post-provision setup pipelines to run against the resulting cluster.

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(CustomResource, Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "clustertemplate.rawagner.com",
    version = "v1alpha1",
    kind = "ClusterTemplate",
    plural = "clustertemplates",
    shortname = "ct",
    derive = "PartialEq",
    printcolumn = r#"{"name":"Chart","type":"string","jsonPath":".spec.helmChart"}"#,
    printcolumn = r#"{"name":"Version","type":"string","jsonPath":".spec.helmChartVersion"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct ClusterTemplateSpec {
    /// Name of the HelmChartRepository holding the chart
    pub helm_repository: String,

    /// Chart name within the repository index
    pub helm_chart: String,

    /// Exact chart version to install
    pub helm_chart_version: String,

    /// Setup pipelines, run in declaration order once the cluster is available
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cluster_setup: Vec<ClusterSetup>,
}

/// One post-provision setup step
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClusterSetup {
    /// Setup name reported in the instance status
    pub name: String,

    /// Tekton Pipeline to run
    pub pipeline: String,

    /// Extra string parameters passed to the pipeline
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub params: BTreeMap<String, String>,
}
