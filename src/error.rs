//! Error types for the reconciliation pass
//!
//! Any variant returned from a stage aborts the remaining stages of the pass
//! and surfaces to the controller's error policy.

use thiserror::Error;

/// Main error type for reconciliation
#[derive(Debug, Error)]
pub enum Error {
    /// Kubernetes API error
    #[error("kubernetes error: {source}")]
    Kube {
        #[from]
        source: kube::Error,
    },

    /// Optimistic-concurrency check failed while persisting
    #[error("conflict updating {kind} {name}: object was modified concurrently")]
    Conflict { kind: &'static str, name: String },

    /// The instance references a ClusterTemplate that does not exist
    #[error("cluster template {name:?} not found")]
    TemplateNotFound { name: String },

    /// No HelmChartRepository matches the template's repository name
    #[error("repository not found: {name:?}")]
    RepositoryNotFound { name: String },

    /// The repository index has no entry for the chart at the requested version
    #[error("chart not found: {chart:?} version {version:?} in repository {repository:?}")]
    ChartNotFound {
        repository: String,
        chart: String,
        version: String,
    },

    /// The instance's values document is not a key/value mapping
    #[error("invalid values for instance {instance}: {message}")]
    InvalidValues { instance: String, message: String },

    /// A fragment of the rendered release manifest is not valid YAML
    #[error("failed to parse manifest document {index} of release {release}: {source}")]
    Manifest {
        release: String,
        index: usize,
        #[source]
        source: serde_yaml::Error,
    },

    /// A recognised document could not be decoded into its typed form
    #[error("failed to decode {kind}: {message}")]
    Decode { kind: &'static str, message: String },

    /// Chart repository index could not be fetched or parsed
    #[error("failed to fetch chart index from {url}: {message}")]
    IndexFetch { url: String, message: String },

    /// Chart URL could not be resolved against the repository base
    #[error("failed to resolve chart url {chart_url:?} against {base:?}: {message}")]
    ChartUrl {
        base: String,
        chart_url: String,
        message: String,
    },

    /// Helm command failed
    #[error("helm {action} failed for release {release}: {message}")]
    Helm {
        action: &'static str,
        release: String,
        message: String,
    },

    /// No Helm storage record exists for the release
    #[error("release {release} not found in namespace {namespace}")]
    ReleaseNotFound { release: String, namespace: String },

    /// Helm storage record exists but cannot be decoded
    #[error("failed to read release {release}: {message}")]
    ReleaseStorage { release: String, message: String },

    /// Setup task creation or listing failed
    #[error("setup tasks for instance {instance}: {message}")]
    SetupTasks { instance: String, message: String },
}

impl Error {
    /// Returns true for template, repository or chart references that cannot be resolved
    ///
    /// These are retried like any other failure, but on a slower schedule
    /// since they only clear once someone creates the missing object.
    pub fn is_missing_reference(&self) -> bool {
        matches!(
            self,
            Self::TemplateNotFound { .. } | Self::RepositoryNotFound { .. } | Self::ChartNotFound { .. }
        )
    }

    /// Create a decode error for a typed document
    pub fn decode(kind: &'static str, err: impl std::fmt::Display) -> Self {
        Self::Decode {
            kind,
            message: err.to_string(),
        }
    }
}

/// Result type for reconciliation operations
pub type Result<T, E = Error> = std::result::Result<T, E>;
