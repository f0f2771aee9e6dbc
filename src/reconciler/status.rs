//! Cluster status stage
//!
//! Queries the release on every pass, lets a nested cluster descriptor
//! override the release status, and collects cluster credentials on a
//! best-effort basis.

use k8s_openapi::api::core::v1::Secret;
use kube::ResourceExt;
use tracing::{debug, info, warn};

use super::Reconciler;
use crate::error::Result;
use crate::hypershift::{NestedClusterDescriptor, api_server_url};
use crate::manifest::parse_manifest;
use crate::models::{ClusterTemplateInstance, ClusterTemplateInstanceStatus};

/// Secret key holding the kubeadmin password
pub const PASSWORD_KEY: &str = "password";

/// Secret key holding the admin kubeconfig
pub const KUBECONFIG_KEY: &str = "kubeconfig";

/// Starting point of the status computed by a pass
///
/// Only the one-way flags carry over; everything else is observed afresh.
pub(super) fn initial_status(previous: &ClusterTemplateInstanceStatus) -> ClusterTemplateInstanceStatus {
    ClusterTemplateInstanceStatus {
        created: true,
        cluster_setup_started: previous.cluster_setup_started,
        ..Default::default()
    }
}

fn secret_value(secret: &Secret, key: &str) -> Option<String> {
    secret
        .data
        .as_ref()
        .and_then(|data| data.get(key))
        .map(|bytes| String::from_utf8_lossy(&bytes.0).into_owned())
}

impl Reconciler {
    /// Fill cluster status and credentials; returns the kubeconfig secret name
    ///
    /// The name is empty when the manifest has no nested cluster descriptor.
    pub(super) async fn observe_cluster(
        &self,
        instance: &ClusterTemplateInstance,
        status: &mut ClusterTemplateInstanceStatus,
    ) -> Result<String> {
        let name = instance.name_any();
        let namespace = instance.namespace().unwrap_or_default();

        let release = self
            .collaborators
            .installer
            .get_release(&name, &namespace)
            .await?;
        status.cluster_status = release.status.clone();

        let mut descriptor: Option<NestedClusterDescriptor> = None;
        for document in parse_manifest(&name, &release.manifest)? {
            if let Some(found) = self
                .collaborators
                .extractor
                .extract(&document, &namespace)
                .await?
            {
                status.cluster_status = found.status.clone();
                descriptor = Some(found);
            }
        }

        let Some(descriptor) = descriptor else {
            debug!(stage = "status", cluster_status = %status.cluster_status, "no nested cluster descriptor");
            return Ok(String::new());
        };
        info!(
            stage = "status",
            cluster_status = %status.cluster_status,
            cluster_namespace = %descriptor.namespace,
            "nested cluster descriptor found"
        );

        if let Some(secret) = self
            .fetch_secret(&descriptor.namespace, &descriptor.password_secret)
            .await
        {
            status.kubeadmin_password = secret_value(&secret, PASSWORD_KEY);
        }

        if let Some(secret) = self
            .fetch_secret(&descriptor.namespace, &descriptor.kubeconfig_secret)
            .await
        {
            status.api_server_url =
                secret_value(&secret, KUBECONFIG_KEY).and_then(|kc| api_server_url(&kc));
        }

        Ok(descriptor.kubeconfig_secret)
    }

    /// Best-effort secret read; absence and read failures are only logged
    async fn fetch_secret(&self, namespace: &str, name: &str) -> Option<Secret> {
        match self.collaborators.store.get_secret(namespace, name).await {
            Ok(Some(secret)) => Some(secret),
            Ok(None) => {
                info!(stage = "status", secret = %name, secret_namespace = %namespace, "secret not found");
                None
            }
            Err(e) => {
                warn!(stage = "status", secret = %name, secret_namespace = %namespace, error = %e, "failed to read secret");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;
    use crate::helm::Release;
    use crate::manifest::ManifestDocument;
    use k8s_openapi::ByteString;
    use std::collections::BTreeMap;

    const MANIFEST: &str = "---\nkind: Secret\nmetadata:\n  name: pull-secret\n---\napiVersion: hypershift.openshift.io/v1beta1\nkind: HostedCluster\nmetadata:\n  name: demo\nspec: {}\n";

    const KUBECONFIG: &str = "apiVersion: v1\nkind: Config\nclusters:\n- name: demo\n  cluster:\n    server: https://api.demo.example.com:6443\n";

    fn release(status: &str, manifest: &str) -> Release {
        Release {
            name: "demo".to_string(),
            namespace: "clusters".to_string(),
            status: status.to_string(),
            manifest: manifest.to_string(),
        }
    }

    fn secret(key: &str, value: &str) -> Secret {
        Secret {
            data: Some(BTreeMap::from([(
                key.to_string(),
                ByteString(value.as_bytes().to_vec()),
            )])),
            ..Default::default()
        }
    }

    fn descriptor(status: &str) -> NestedClusterDescriptor {
        NestedClusterDescriptor {
            namespace: "clusters".to_string(),
            password_secret: "demo-kubeadmin-password".to_string(),
            kubeconfig_secret: "demo-admin-kubeconfig".to_string(),
            status: status.to_string(),
        }
    }

    fn extract_hosted_clusters(mocks: &mut Mocks, status: &'static str) {
        mocks
            .extractor
            .expect_extract()
            .returning(move |doc, _| match doc {
                ManifestDocument::HostedCluster(_) => Ok(Some(descriptor(status))),
                _ => Ok(None),
            });
    }

    #[test]
    fn test_initial_status_keeps_only_flags() {
        let previous = ClusterTemplateInstanceStatus {
            created: true,
            cluster_status: "Available".to_string(),
            cluster_setup_started: true,
            kubeadmin_password: Some("secret".to_string()),
            api_server_url: Some("https://api.demo.example.com:6443".to_string()),
            cluster_setup: vec![crate::models::ClusterSetupStatus {
                name: "configure-oauth".to_string(),
                ..Default::default()
            }],
        };
        let next = initial_status(&previous);
        assert!(next.created);
        assert!(next.cluster_setup_started);
        assert_eq!(next.cluster_status, "");
        assert!(next.kubeadmin_password.is_none());
        assert!(next.api_server_url.is_none());
        assert!(next.cluster_setup.is_empty());
    }

    #[tokio::test]
    async fn test_release_status_without_descriptor() {
        let mut mocks = Mocks::new();
        mocks
            .installer
            .expect_get_release()
            .returning(|_, _| Ok(release("deployed", "---\nkind: ConfigMap\n")));
        mocks.extractor.expect_extract().returning(|_, _| Ok(None));
        mocks.store.expect_get_secret().never();

        let mut status = ClusterTemplateInstanceStatus::default();
        let secret_name = mocks
            .into_reconciler()
            .observe_cluster(&instance("demo"), &mut status)
            .await
            .unwrap();
        assert_eq!(status.cluster_status, "deployed");
        assert_eq!(secret_name, "");
    }

    #[tokio::test]
    async fn test_descriptor_overrides_release_status() {
        let mut mocks = Mocks::new();
        mocks
            .installer
            .expect_get_release()
            .returning(|_, _| Ok(release("deployed", MANIFEST)));
        extract_hosted_clusters(&mut mocks, "Available");
        mocks
            .store
            .expect_get_secret()
            .returning(|_, name| match name {
                "demo-kubeadmin-password" => Ok(Some(secret(PASSWORD_KEY, "hunter2"))),
                "demo-admin-kubeconfig" => Ok(Some(secret(KUBECONFIG_KEY, KUBECONFIG))),
                _ => Ok(None),
            });

        let mut status = ClusterTemplateInstanceStatus::default();
        let secret_name = mocks
            .into_reconciler()
            .observe_cluster(&instance("demo"), &mut status)
            .await
            .unwrap();
        assert_eq!(status.cluster_status, "Available");
        assert_eq!(status.kubeadmin_password.as_deref(), Some("hunter2"));
        assert_eq!(
            status.api_server_url.as_deref(),
            Some("https://api.demo.example.com:6443")
        );
        assert_eq!(secret_name, "demo-admin-kubeconfig");
    }

    #[tokio::test]
    async fn test_missing_secrets_are_not_errors() {
        let mut mocks = Mocks::new();
        mocks
            .installer
            .expect_get_release()
            .returning(|_, _| Ok(release("deployed", MANIFEST)));
        extract_hosted_clusters(&mut mocks, "Pending");
        mocks.store.expect_get_secret().returning(|_, _| Ok(None));

        let mut status = ClusterTemplateInstanceStatus::default();
        let secret_name = mocks
            .into_reconciler()
            .observe_cluster(&instance("demo"), &mut status)
            .await
            .unwrap();
        assert_eq!(status.cluster_status, "Pending");
        assert!(status.kubeadmin_password.is_none());
        assert!(status.api_server_url.is_none());
        assert_eq!(secret_name, "demo-admin-kubeconfig");
    }

    #[tokio::test]
    async fn test_unparseable_manifest_fails_the_pass() {
        let mut mocks = Mocks::new();
        mocks
            .installer
            .expect_get_release()
            .returning(|_, _| Ok(release("deployed", "kind: [oops\n")));
        mocks.extractor.expect_extract().never();

        let mut status = ClusterTemplateInstanceStatus::default();
        let result = mocks
            .into_reconciler()
            .observe_cluster(&instance("demo"), &mut status)
            .await;
        assert!(matches!(result, Err(crate::error::Error::Manifest { .. })));
    }
}
