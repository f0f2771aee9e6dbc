//! Configuration system for the operator
//!
//! Settings come from built-in defaults, an optional YAML file and
//! environment overrides, in increasing precedence.

pub mod loader;
pub mod paths;
pub mod schema;

use std::time::Duration;

pub use loader::ConfigLoader;
pub use schema::Config;

use crate::controller::RetryPolicy;
use crate::reconciler::ReconcilerSettings;

impl Config {
    /// Settings of the reconciliation pass
    pub fn reconciler_settings(&self) -> ReconcilerSettings {
        ReconcilerSettings {
            finalizer: self.finalizer.clone(),
            requeue_after: Duration::from_secs(self.requeue_after_secs),
        }
    }

    /// Requeue delays after failed passes
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            transient: Duration::from_secs(self.retry.transient_secs),
            missing_reference: Duration::from_secs(self.retry.missing_reference_secs),
        }
    }

    pub fn helm_timeout(&self) -> Duration {
        Duration::from_secs(self.helm.timeout_secs)
    }

    pub fn index_fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.index_fetch.timeout_secs)
    }
}
