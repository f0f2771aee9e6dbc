//! Cluster template model layer
//!
//! This module provides Rust types for the resources the operator reads and writes.
//!
//! Structure:
//! - `instance.rs` - ClusterTemplateInstance CRD (owned by this operator's status)
//! - `template.rs` - ClusterTemplate CRD (read-only to the operator)
//! - `external.rs` - Typed views of foreign CRDs (Helm repositories, HostedClusters, PipelineRuns)

pub mod external;
pub mod instance;
pub mod template;

pub use external::{
    ConnectionConfig, HelmChartRepository, HelmChartRepositorySpec, HostedCluster,
    HostedClusterSpec, HostedClusterStatus, LocalObjectReference, PipelineParam, PipelineRef,
    PipelineRun, PipelineRunSpec, PipelineRunStatus, RunCondition,
};
pub use instance::{
    ClusterSetupStatus, ClusterTemplateInstance, ClusterTemplateInstanceSpec,
    ClusterTemplateInstanceStatus, SetupOutcome,
};
pub use template::{ClusterSetup, ClusterTemplate, ClusterTemplateSpec};

/// API group served by this operator
pub const API_GROUP: &str = "clustertemplate.rawagner.com";

/// API version served by this operator
pub const API_VERSION: &str = "v1alpha1";

/// Schema for opaque documents that Kubernetes must store verbatim
pub(crate) fn preserve_unknown_fields(_: &mut schemars::SchemaGenerator) -> schemars::Schema {
    schemars::json_schema!({
        "type": "object",
        "x-kubernetes-preserve-unknown-fields": true
    })
}
