//! Controller wiring
//!
//! Connects the reconciliation pass to `kube::runtime::Controller`, which
//! owns watching, scheduling and backoff for ClusterTemplateInstances.

use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use kube::runtime::Controller;
use kube::runtime::controller::Action;
use kube::runtime::watcher::Config as WatcherConfig;
use kube::{Api, Client, ResourceExt};
use tracing::{debug, error, info, warn};

use crate::error::Error;
use crate::models::ClusterTemplateInstance;
use crate::reconciler::{PassOutcome, Reconciler};

/// Requeue delays applied after a failed pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub transient: Duration,
    pub missing_reference: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            transient: Duration::from_secs(15),
            missing_reference: Duration::from_secs(300),
        }
    }
}

impl RetryPolicy {
    pub fn delay_for(&self, err: &Error) -> Duration {
        if err.is_missing_reference() {
            self.missing_reference
        } else {
            self.transient
        }
    }
}

/// Shared controller context
pub struct Context {
    pub reconciler: Reconciler,
    pub retry: RetryPolicy,
}

/// Map a pass outcome onto a scheduler action
pub fn action_for(outcome: PassOutcome) -> Action {
    if outcome.continue_polling {
        Action::requeue(outcome.minimum_delay)
    } else {
        Action::await_change()
    }
}

/// Reconcile one ClusterTemplateInstance
pub async fn reconcile(
    instance: Arc<ClusterTemplateInstance>,
    ctx: Arc<Context>,
) -> Result<Action, Error> {
    let namespace = instance.namespace().unwrap_or_default();
    let name = instance.name_any();

    let outcome = ctx.reconciler.reconcile_pass(&namespace, &name).await?;
    Ok(action_for(outcome))
}

/// Requeue a failed pass according to the failure class
pub fn error_policy(
    instance: Arc<ClusterTemplateInstance>,
    err: &Error,
    ctx: Arc<Context>,
) -> Action {
    let delay = ctx.retry.delay_for(err);
    if err.is_missing_reference() {
        warn!(
            instance = %instance.name_any(),
            namespace = %instance.namespace().unwrap_or_default(),
            error = %err,
            retry_secs = delay.as_secs(),
            "reference not found; retrying later"
        );
    } else {
        error!(
            instance = %instance.name_any(),
            namespace = %instance.namespace().unwrap_or_default(),
            error = %err,
            retry_secs = delay.as_secs(),
            "reconciliation failed"
        );
    }
    Action::requeue(delay)
}

/// Run the controller until a shutdown signal arrives
pub async fn run(client: Client, watch_namespace: Option<&str>, ctx: Arc<Context>) {
    let instances: Api<ClusterTemplateInstance> = match watch_namespace {
        Some(ns) => Api::namespaced(client, ns),
        None => Api::all(client),
    };
    info!(
        namespace = watch_namespace.unwrap_or("<all>"),
        "starting ClusterTemplateInstance controller"
    );

    Controller::new(instances, WatcherConfig::default())
        .shutdown_on_signal()
        .run(reconcile, error_policy, ctx)
        .for_each(|result| {
            match result {
                Ok((object, action)) => debug!(instance = %object.name, ?action, "reconciled"),
                Err(e) => debug!(error = %e, "controller event"),
            }
            futures::future::ready(())
        })
        .await;

    info!("controller stopped");
}
