//! Setup stage
//!
//! The setup state is derived from the status computed so far in the pass;
//! nothing beyond `clusterSetupStarted` is persisted to remember it.

use kube::ResourceExt;
use tracing::info;

use super::Reconciler;
use crate::error::Result;
use crate::hypershift::STATUS_AVAILABLE;
use crate::models::{
    ClusterSetupStatus, ClusterTemplate, ClusterTemplateInstance, ClusterTemplateInstanceStatus,
};
use crate::setup::{InstanceIdentity, compute_setup_status, instance_selector, is_setup_complete};

/// Where an instance stands with respect to its setup tasks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetupState {
    /// The cluster is not available yet
    NotReady,
    /// The cluster is available and tasks have not been created
    AwaitingStart,
    /// Tasks exist and at least one has not finished
    Polling,
    /// Every observed task has finished, whatever its outcome
    Complete,
}

impl SetupState {
    pub fn of(status: &ClusterTemplateInstanceStatus) -> Self {
        if status.cluster_status != STATUS_AVAILABLE {
            Self::NotReady
        } else if !status.cluster_setup_started {
            Self::AwaitingStart
        } else {
            Self::Polling
        }
    }

    /// Refine `Polling` once the tasks have been observed
    pub fn observed(setup: &[ClusterSetupStatus]) -> Self {
        if is_setup_complete(setup) {
            Self::Complete
        } else {
            Self::Polling
        }
    }

    /// Whether the pass should be re-run without a change notification
    pub fn continue_polling(self) -> bool {
        self != Self::Complete
    }
}

impl Reconciler {
    /// Advance setup; returns whether the pass should keep polling
    pub(super) async fn drive_setup(
        &self,
        instance: &ClusterTemplateInstance,
        template: &ClusterTemplate,
        status: &mut ClusterTemplateInstanceStatus,
        kubeconfig_secret: &str,
    ) -> Result<bool> {
        let name = instance.name_any();
        let namespace = instance.namespace().unwrap_or_default();

        match SetupState::of(status) {
            SetupState::NotReady => {
                info!(stage = "setup", cluster_status = %status.cluster_status, "cluster not ready for setup");
                Ok(true)
            }
            SetupState::AwaitingStart => {
                let identity = InstanceIdentity {
                    name,
                    namespace,
                    uid: instance.uid().unwrap_or_default(),
                };
                self.collaborators
                    .tasks
                    .create_ordered_tasks(template, &identity, kubeconfig_secret)
                    .await?;
                status.cluster_setup_started = true;
                info!(
                    stage = "setup",
                    tasks = template.spec.cluster_setup.len(),
                    "setup tasks created"
                );
                Ok(true)
            }
            SetupState::Polling => {
                let tasks = self
                    .collaborators
                    .tasks
                    .list_tasks(&instance_selector(&name), &namespace)
                    .await?;
                status.cluster_setup = compute_setup_status(&tasks);

                let state = SetupState::observed(&status.cluster_setup);
                info!(
                    stage = "setup",
                    tasks = status.cluster_setup.len(),
                    ?state,
                    "setup progress observed"
                );
                Ok(state.continue_polling())
            }
            SetupState::Complete => Ok(false),
        }
    }
}
