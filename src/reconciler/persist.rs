//! Status persister

use tracing::info;

use super::{PassOutcome, Reconciler};
use crate::error::Result;
use crate::models::{ClusterTemplateInstance, ClusterTemplateInstanceStatus};

impl Reconciler {
    /// Replace the stored status with the one computed by this pass
    pub(super) async fn persist(
        &self,
        mut instance: ClusterTemplateInstance,
        status: ClusterTemplateInstanceStatus,
        continue_polling: bool,
    ) -> Result<PassOutcome> {
        instance.status = Some(status);
        self.collaborators
            .store
            .update_instance_status(&instance)
            .await?;

        info!(stage = "persist", continue_polling, "status updated");
        let delay = self.settings.requeue_after;
        Ok(if continue_polling {
            PassOutcome::poll(delay)
        } else {
            PassOutcome::settle(delay)
        })
    }
}
