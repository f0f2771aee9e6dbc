//! Object store collaborator
//!
//! Reads and writes the Kubernetes objects a pass touches. Updates are
//! guarded by the object's resourceVersion, so a write that races another
//! writer fails with [`Error::Conflict`] and the pass is re-run.

use async_trait::async_trait;
use k8s_openapi::api::core::v1::Secret;
use kube::api::{Api, ListParams, Patch, PatchParams, PostParams};
use kube::{Client, ResourceExt};
use tracing::debug;

#[cfg(test)]
use mockall::automock;

use crate::error::{Error, Result};
use crate::models::{ClusterTemplate, ClusterTemplateInstance, HelmChartRepository};

/// Trait abstracting the object store for ClusterTemplateInstance passes
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Fetch an instance; `None` if it no longer exists
    async fn get_instance(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<ClusterTemplateInstance>>;

    /// Replace the instance's metadata/spec (used for finalizer changes)
    ///
    /// Returns the stored object with its new resourceVersion.
    async fn update_instance(
        &self,
        instance: &ClusterTemplateInstance,
    ) -> Result<ClusterTemplateInstance>;

    /// Replace the instance's status sub-document
    async fn update_instance_status(
        &self,
        instance: &ClusterTemplateInstance,
    ) -> Result<ClusterTemplateInstance>;

    /// Fetch a cluster-scoped ClusterTemplate; `None` if absent
    async fn get_template(&self, name: &str) -> Result<Option<ClusterTemplate>>;

    /// List all known Helm chart repositories
    async fn list_repositories(&self) -> Result<Vec<HelmChartRepository>>;

    /// Fetch a Secret; `None` if absent
    async fn get_secret(&self, namespace: &str, name: &str) -> Result<Option<Secret>>;
}

/// Object store backed by the Kubernetes API
#[derive(Clone)]
pub struct KubeStore {
    client: Client,
}

impl KubeStore {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    fn instances(&self, namespace: &str) -> Api<ClusterTemplateInstance> {
        Api::namespaced(self.client.clone(), namespace)
    }
}

/// Map a 409 from the API server onto [`Error::Conflict`]
fn map_conflict(err: kube::Error, name: &str) -> Error {
    match err {
        kube::Error::Api(ae) if ae.code == 409 => Error::Conflict {
            kind: "ClusterTemplateInstance",
            name: name.to_string(),
        },
        other => other.into(),
    }
}

#[async_trait]
impl ObjectStore for KubeStore {
    async fn get_instance(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<ClusterTemplateInstance>> {
        Ok(self.instances(namespace).get_opt(name).await?)
    }

    async fn update_instance(
        &self,
        instance: &ClusterTemplateInstance,
    ) -> Result<ClusterTemplateInstance> {
        let name = instance.name_any();
        let namespace = instance.namespace().unwrap_or_default();
        debug!(instance = %name, namespace = %namespace, "replacing instance");

        self.instances(&namespace)
            .replace(&name, &PostParams::default(), instance)
            .await
            .map_err(|e| map_conflict(e, &name))
    }

    async fn update_instance_status(
        &self,
        instance: &ClusterTemplateInstance,
    ) -> Result<ClusterTemplateInstance> {
        let name = instance.name_any();
        let namespace = instance.namespace().unwrap_or_default();

        // resourceVersion in a merge patch is a precondition: the API server
        // rejects it with 409 if the object changed since it was read
        let patch = serde_json::json!({
            "metadata": { "resourceVersion": instance.resource_version() },
            "status": instance.status,
        });
        debug!(instance = %name, namespace = %namespace, "patching instance status");

        self.instances(&namespace)
            .patch_status(&name, &PatchParams::default(), &Patch::Merge(&patch))
            .await
            .map_err(|e| map_conflict(e, &name))
    }

    async fn get_template(&self, name: &str) -> Result<Option<ClusterTemplate>> {
        let api: Api<ClusterTemplate> = Api::all(self.client.clone());
        Ok(api.get_opt(name).await?)
    }

    async fn list_repositories(&self) -> Result<Vec<HelmChartRepository>> {
        let api: Api<HelmChartRepository> = Api::all(self.client.clone());
        Ok(api.list(&ListParams::default()).await?.items)
    }

    async fn get_secret(&self, namespace: &str, name: &str) -> Result<Option<Secret>> {
        let api: Api<Secret> = Api::namespaced(self.client.clone(), namespace);
        Ok(api.get_opt(name).await?)
    }
}
