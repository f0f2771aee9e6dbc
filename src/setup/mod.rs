//! Post-provision setup tasks
//!
//! Setup tasks are created once the provisioned cluster is available and
//! are correlated back to their instance through labels. Their progress is
//! recomputed from the observed tasks on every pass.

pub mod tekton;

use std::collections::BTreeMap;

use async_trait::async_trait;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::Time;

#[cfg(test)]
use mockall::automock;

use crate::error::Result;
use crate::models::{ClusterSetupStatus, ClusterTemplate, RunCondition, SetupOutcome};

pub use tekton::TektonTaskRunner;

/// Label carrying the owning instance's name
pub const INSTANCE_LABEL: &str = "clustertemplate.rawagner.com/instance";

/// Label carrying the setup name from the template
pub const SETUP_LABEL: &str = "clustertemplate.rawagner.com/setup";

/// Label carrying the setup's position in the template
pub const SETUP_ORDER_LABEL: &str = "clustertemplate.rawagner.com/setup-order";

/// Condition type whose status reports a task's outcome
pub const SUCCEEDED_CONDITION: &str = "Succeeded";

/// Label selector matching every task of an instance
pub fn instance_selector(instance: &str) -> String {
    format!("{}={}", INSTANCE_LABEL, instance)
}

/// Identity of the instance that owns the setup tasks
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstanceIdentity {
    pub name: String,
    pub namespace: String,
    pub uid: String,
}

/// A setup task as observed through the task runner
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObservedTask {
    pub name: String,
    pub labels: BTreeMap<String, String>,
    pub conditions: Vec<RunCondition>,
    pub completion_time: Option<Time>,
}

/// Trait abstracting the setup task engine
#[cfg_attr(test, automock)]
#[async_trait]
pub trait TaskRunner: Send + Sync {
    /// Create one task per setup entry of the template, in declaration order
    ///
    /// Repeating the call for the same instance must not duplicate tasks.
    async fn create_ordered_tasks(
        &self,
        template: &ClusterTemplate,
        instance: &InstanceIdentity,
        kubeconfig_secret: &str,
    ) -> Result<()>;

    /// List tasks matching a label selector in a namespace
    async fn list_tasks(&self, selector: &str, namespace: &str) -> Result<Vec<ObservedTask>>;
}

/// Build the setup status list from the currently observed tasks
///
/// Tasks without a setup label are ignored. The result is ordered by the
/// setup's template position, then by setup name.
pub fn compute_setup_status(tasks: &[ObservedTask]) -> Vec<ClusterSetupStatus> {
    let mut entries: Vec<(u32, ClusterSetupStatus)> = tasks
        .iter()
        .filter_map(|task| {
            let name = task.labels.get(SETUP_LABEL).filter(|n| !n.is_empty())?;
            let order = task
                .labels
                .get(SETUP_ORDER_LABEL)
                .and_then(|o| o.parse().ok())
                .unwrap_or(u32::MAX);

            // Last matching condition wins
            let succeeded = task
                .conditions
                .iter()
                .rev()
                .find(|c| c.condition_type == SUCCEEDED_CONDITION);

            let status = ClusterSetupStatus {
                name: name.clone(),
                succeeded: succeeded
                    .map(|c| SetupOutcome::from_condition_status(&c.status))
                    .unwrap_or_default(),
                reason: succeeded.and_then(|c| c.reason.clone()).unwrap_or_default(),
                message: succeeded.and_then(|c| c.message.clone()).unwrap_or_default(),
                completion_time: task.completion_time.clone(),
            };
            Some((order, status))
        })
        .collect();

    entries.sort_by(|(a_order, a), (b_order, b)| {
        a_order.cmp(b_order).then_with(|| a.name.cmp(&b.name))
    });
    entries.into_iter().map(|(_, status)| status).collect()
}

/// Setup is complete once every listed task has finished, whatever its outcome
pub fn is_setup_complete(setup: &[ClusterSetupStatus]) -> bool {
    setup.iter().all(|s| s.completion_time.is_some())
}
