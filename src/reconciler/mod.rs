//! Reconciliation pass pipeline
//!
//! One pass drives a ClusterTemplateInstance through strictly sequential
//! stages: lifecycle gate, provision, cluster status, setup and status
//! persistence. Any stage error aborts the rest of the pass, and nothing
//! except finalizer changes is written before the final status update.

mod lifecycle;
mod persist;
mod provision;
mod setup;
mod status;

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, instrument};

use crate::error::{Error, Result};
use crate::helm::{IndexFetcher, PackageInstaller};
use crate::hypershift::DescriptorExtractor;
use crate::setup::TaskRunner;
use crate::store::ObjectStore;

pub use lifecycle::{GateAction, Lifecycle};
pub use provision::decode_values;
pub use setup::SetupState;

/// Default finalizer guarding release cleanup
pub const DEFAULT_FINALIZER: &str = "clustertemplateinstance.rawagner.com/finalizer";

/// Default minimum delay before a polling pass re-runs
pub const DEFAULT_REQUEUE_AFTER: Duration = Duration::from_secs(60);

/// External systems a pass talks to
#[derive(Clone)]
pub struct Collaborators {
    pub store: Arc<dyn ObjectStore>,
    pub installer: Arc<dyn PackageInstaller>,
    pub index: Arc<dyn IndexFetcher>,
    pub tasks: Arc<dyn TaskRunner>,
    pub extractor: Arc<dyn DescriptorExtractor>,
}

/// Tunables of the pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcilerSettings {
    pub finalizer: String,
    pub requeue_after: Duration,
}

impl Default for ReconcilerSettings {
    fn default() -> Self {
        Self {
            finalizer: DEFAULT_FINALIZER.to_string(),
            requeue_after: DEFAULT_REQUEUE_AFTER,
        }
    }
}

/// Re-trigger decision returned by a successful pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PassOutcome {
    /// Re-run after `minimum_delay` even without a change notification
    pub continue_polling: bool,
    pub minimum_delay: Duration,
}

impl PassOutcome {
    /// Wait for the next change notification
    pub fn settle(minimum_delay: Duration) -> Self {
        Self {
            continue_polling: false,
            minimum_delay,
        }
    }

    /// Re-run after the minimum delay
    pub fn poll(minimum_delay: Duration) -> Self {
        Self {
            continue_polling: true,
            minimum_delay,
        }
    }
}

/// Runs reconciliation passes for ClusterTemplateInstances
#[derive(Clone)]
pub struct Reconciler {
    collaborators: Collaborators,
    settings: ReconcilerSettings,
}

impl Reconciler {
    pub fn new(collaborators: Collaborators, settings: ReconcilerSettings) -> Self {
        Self {
            collaborators,
            settings,
        }
    }

    /// Run one full pass for the instance identified by `namespace`/`name`
    #[instrument(skip_all, fields(instance = %name, namespace = %namespace))]
    pub async fn reconcile_pass(&self, namespace: &str, name: &str) -> Result<PassOutcome> {
        let store = &self.collaborators.store;
        let delay = self.settings.requeue_after;

        let Some(instance) = store.get_instance(namespace, name).await? else {
            info!("instance no longer exists");
            return Ok(PassOutcome::settle(delay));
        };

        let Some(instance) = self.gate(instance).await? else {
            return Ok(PassOutcome::settle(delay));
        };

        let template = store
            .get_template(&instance.spec.template)
            .await?
            .ok_or_else(|| Error::TemplateNotFound {
                name: instance.spec.template.clone(),
            })?;

        let previous = instance.current_status();
        if !previous.created {
            self.provision(&instance, &template).await?;
        }

        let mut status = status::initial_status(&previous);
        let kubeconfig_secret = self.observe_cluster(&instance, &mut status).await?;
        let continue_polling = self
            .drive_setup(&instance, &template, &mut status, &kubeconfig_secret)
            .await?;

        self.persist(instance, status, continue_polling).await
    }
}
