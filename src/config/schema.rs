//! Configuration schema definitions
//!
//! Defines the structure of the operator configuration file.

use serde::{Deserialize, Serialize};

use crate::reconciler::{DEFAULT_FINALIZER, DEFAULT_REQUEUE_AFTER};

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Config {
    /// Namespace to watch; all namespaces when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub watch_namespace: Option<String>,

    /// Minimum delay before a polling pass re-runs
    #[serde(default = "default_requeue_after_secs")]
    pub requeue_after_secs: u64,

    /// Finalizer attached to managed instances
    #[serde(default = "default_finalizer")]
    pub finalizer: String,

    /// Helm CLI configuration
    #[serde(default)]
    pub helm: HelmConfig,

    /// Chart index fetch configuration
    #[serde(default)]
    pub index_fetch: IndexFetchConfig,

    /// Requeue delays after failed passes
    #[serde(default)]
    pub retry: RetryConfig,
}

/// Helm CLI configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct HelmConfig {
    /// Helm binary name or path
    #[serde(default = "default_helm_binary")]
    pub binary: String,

    /// Timeout passed to `helm upgrade --install`
    #[serde(default = "default_helm_timeout_secs")]
    pub timeout_secs: u64,
}

/// Chart index fetch configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct IndexFetchConfig {
    #[serde(default = "default_index_timeout_secs")]
    pub timeout_secs: u64,
}

/// Requeue delays after failed passes
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RetryConfig {
    /// Delay after store, network or helm failures
    #[serde(default = "default_transient_secs")]
    pub transient_secs: u64,

    /// Delay after template, repository or chart lookups fail
    #[serde(default = "default_missing_reference_secs")]
    pub missing_reference_secs: u64,
}

// Default value functions
fn default_requeue_after_secs() -> u64 {
    DEFAULT_REQUEUE_AFTER.as_secs()
}

fn default_finalizer() -> String {
    DEFAULT_FINALIZER.to_string()
}

fn default_helm_binary() -> String {
    "helm".to_string()
}

fn default_helm_timeout_secs() -> u64 {
    600
}

fn default_index_timeout_secs() -> u64 {
    30
}

fn default_transient_secs() -> u64 {
    15
}

fn default_missing_reference_secs() -> u64 {
    300
}

impl Default for Config {
    fn default() -> Self {
        Self {
            watch_namespace: None,
            requeue_after_secs: default_requeue_after_secs(),
            finalizer: default_finalizer(),
            helm: HelmConfig::default(),
            index_fetch: IndexFetchConfig::default(),
            retry: RetryConfig::default(),
        }
    }
}

impl Default for HelmConfig {
    fn default() -> Self {
        Self {
            binary: default_helm_binary(),
            timeout_secs: default_helm_timeout_secs(),
        }
    }
}

impl Default for IndexFetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_index_timeout_secs(),
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            transient_secs: default_transient_secs(),
            missing_reference_secs: default_missing_reference_secs(),
        }
    }
}
