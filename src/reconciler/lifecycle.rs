//! Lifecycle gate
//!
//! Computes the instance lifecycle from its stored flags and owns the
//! finalizer that keeps the object around until its release is removed.

use tracing::info;

use super::Reconciler;
use crate::error::Result;
use crate::models::ClusterTemplateInstance;

/// Lifecycle of an instance as seen at the start of a pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    /// Not being deleted
    Active,
    /// Deletion requested and the release may still exist
    Deleting,
    /// Deletion requested and cleanup already finished
    Deleted,
}

/// What the gate does with the instance this pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateAction {
    /// Uninstall the release, then detach the finalizer
    Finalize,
    /// Nothing left to do
    Stop,
    /// Attach the finalizer, then continue with the remaining stages
    AttachFinalizer,
    /// Continue with the remaining stages
    Proceed,
}

impl Lifecycle {
    pub fn of(instance: &ClusterTemplateInstance, finalizer: &str) -> Self {
        match (instance.deletion_requested(), instance.has_finalizer(finalizer)) {
            (false, _) => Self::Active,
            (true, true) => Self::Deleting,
            (true, false) => Self::Deleted,
        }
    }

    /// Transition table keyed by lifecycle and finalizer presence
    pub fn action(self, has_finalizer: bool) -> GateAction {
        match (self, has_finalizer) {
            (Self::Active, false) => GateAction::AttachFinalizer,
            (Self::Active, true) => GateAction::Proceed,
            (Self::Deleting, _) => GateAction::Finalize,
            (Self::Deleted, _) => GateAction::Stop,
        }
    }
}

impl Reconciler {
    /// Run the lifecycle gate
    ///
    /// Returns the instance to continue with, or `None` when the pass ends here.
    pub(super) async fn gate(
        &self,
        mut instance: ClusterTemplateInstance,
    ) -> Result<Option<ClusterTemplateInstance>> {
        let finalizer = self.settings.finalizer.as_str();
        let has_finalizer = instance.has_finalizer(finalizer);
        let lifecycle = Lifecycle::of(&instance, finalizer);

        match lifecycle.action(has_finalizer) {
            GateAction::Finalize => {
                let name = instance.metadata.name.clone().unwrap_or_default();
                let namespace = instance.metadata.namespace.clone().unwrap_or_default();

                info!(stage = "lifecycle", "uninstalling release before deletion");
                self.collaborators
                    .installer
                    .uninstall(&name, &namespace)
                    .await?;

                instance.remove_finalizer(finalizer);
                self.collaborators.store.update_instance(&instance).await?;
                info!(stage = "lifecycle", "finalizer removed");
                Ok(None)
            }
            GateAction::Stop => Ok(None),
            GateAction::AttachFinalizer => {
                instance.add_finalizer(finalizer);
                let updated = self.collaborators.store.update_instance(&instance).await?;
                info!(stage = "lifecycle", "finalizer attached");
                Ok(Some(updated))
            }
            GateAction::Proceed => Ok(Some(instance)),
        }
    }
}
