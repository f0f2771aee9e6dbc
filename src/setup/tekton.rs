//! Tekton-backed setup task runner
//!
//! Each setup entry of a template becomes one PipelineRun in the instance's
//! namespace, owned by the instance and named `<instance>-<setup>`.

use std::collections::BTreeMap;

use async_trait::async_trait;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{ObjectMeta, OwnerReference};
use kube::api::{Api, ListParams, PostParams};
use kube::{Client, ResourceExt};
use tracing::{debug, info};

use super::{
    INSTANCE_LABEL, InstanceIdentity, ObservedTask, SETUP_LABEL, SETUP_ORDER_LABEL, TaskRunner,
};
use crate::error::{Error, Result};
use crate::models::{
    API_GROUP, API_VERSION, ClusterSetup, ClusterTemplate, PipelineParam, PipelineRef,
    PipelineRun, PipelineRunSpec,
};

/// Pipeline parameter carrying the kubeconfig secret name
pub const KUBECONFIG_PARAM: &str = "kubeconfigSecret";

/// Task runner creating Tekton PipelineRuns
#[derive(Clone)]
pub struct TektonTaskRunner {
    client: Client,
}

impl TektonTaskRunner {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

/// Build the PipelineRun for one setup entry
pub fn pipeline_run(
    setup: &ClusterSetup,
    order: usize,
    instance: &InstanceIdentity,
    kubeconfig_secret: &str,
) -> PipelineRun {
    let labels = BTreeMap::from([
        (INSTANCE_LABEL.to_string(), instance.name.clone()),
        (SETUP_LABEL.to_string(), setup.name.clone()),
        (SETUP_ORDER_LABEL.to_string(), order.to_string()),
    ]);

    let mut params = vec![PipelineParam {
        name: KUBECONFIG_PARAM.to_string(),
        value: serde_json::Value::String(kubeconfig_secret.to_string()),
    }];
    params.extend(setup.params.iter().map(|(name, value)| PipelineParam {
        name: name.clone(),
        value: serde_json::Value::String(value.clone()),
    }));

    let mut run = PipelineRun::new(
        &format!("{}-{}", instance.name, setup.name),
        PipelineRunSpec {
            pipeline_ref: Some(PipelineRef {
                name: setup.pipeline.clone(),
            }),
            params,
        },
    );
    run.metadata = ObjectMeta {
        namespace: Some(instance.namespace.clone()),
        labels: Some(labels),
        owner_references: Some(vec![OwnerReference {
            api_version: format!("{}/{}", API_GROUP, API_VERSION),
            kind: "ClusterTemplateInstance".to_string(),
            name: instance.name.clone(),
            uid: instance.uid.clone(),
            controller: Some(true),
            block_owner_deletion: Some(true),
        }]),
        ..run.metadata
    };
    run
}

/// Returns true if `run` was created for `instance`
///
/// Run names are not unique across instances (`a` + `b-c` and `a-b` + `c`
/// both yield `a-b-c`), so an existing run only counts when its instance
/// label and controlling owner match.
pub fn owned_by(run: &PipelineRun, instance: &InstanceIdentity) -> bool {
    let labelled = run
        .labels()
        .get(INSTANCE_LABEL)
        .is_some_and(|name| *name == instance.name);
    let owned = run
        .owner_references()
        .iter()
        .any(|owner| owner.controller == Some(true) && owner.uid == instance.uid);
    labelled && owned
}

fn observe(run: PipelineRun) -> ObservedTask {
    let name = run.name_any();
    let labels = run.metadata.labels.unwrap_or_default();
    let (conditions, completion_time) = run
        .status
        .map(|s| (s.conditions, s.completion_time))
        .unwrap_or_default();

    ObservedTask {
        name,
        labels,
        conditions,
        completion_time,
    }
}

#[async_trait]
impl TaskRunner for TektonTaskRunner {
    async fn create_ordered_tasks(
        &self,
        template: &ClusterTemplate,
        instance: &InstanceIdentity,
        kubeconfig_secret: &str,
    ) -> Result<()> {
        let api: Api<PipelineRun> = Api::namespaced(self.client.clone(), &instance.namespace);

        for (order, setup) in template.spec.cluster_setup.iter().enumerate() {
            let run = pipeline_run(setup, order, instance, kubeconfig_secret);
            let run_name = run.name_any();

            match api.create(&PostParams::default(), &run).await {
                Ok(_) => {
                    info!(
                        instance = %instance.name,
                        setup = %setup.name,
                        pipeline_run = %run_name,
                        "created setup pipeline run"
                    );
                }
                Err(kube::Error::Api(ae)) if ae.code == 409 => {
                    let existing = api.get(&run_name).await?;
                    if !owned_by(&existing, instance) {
                        return Err(Error::SetupTasks {
                            instance: instance.name.clone(),
                            message: format!(
                                "pipeline run {} already exists and belongs to another instance",
                                run_name
                            ),
                        });
                    }
                    debug!(pipeline_run = %run_name, "setup pipeline run already exists");
                }
                Err(e) => {
                    return Err(Error::SetupTasks {
                        instance: instance.name.clone(),
                        message: format!("failed to create {}: {}", run_name, e),
                    });
                }
            }
        }

        Ok(())
    }

    async fn list_tasks(&self, selector: &str, namespace: &str) -> Result<Vec<ObservedTask>> {
        let api: Api<PipelineRun> = Api::namespaced(self.client.clone(), namespace);
        let runs = api.list(&ListParams::default().labels(selector)).await?;
        Ok(runs.items.into_iter().map(observe).collect())
    }
}
