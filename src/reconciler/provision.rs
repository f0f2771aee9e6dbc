//! Provision stage
//!
//! Resolves template, repository and chart version to a download URL and
//! installs the chart as a release named after the instance. Nothing is
//! recorded until the whole stage succeeds.

use kube::ResourceExt;
use serde_json::{Map, Value};
use tracing::info;

use super::Reconciler;
use crate::error::{Error, Result};
use crate::helm::resolve_chart_url;
use crate::models::{ClusterTemplate, ClusterTemplateInstance};

/// Decode the instance's values document into a key/value mapping
///
/// An absent or null document is an empty mapping.
pub fn decode_values(instance: &ClusterTemplateInstance) -> Result<Map<String, Value>> {
    match &instance.spec.values {
        None | Some(Value::Null) => Ok(Map::new()),
        Some(Value::Object(values)) => Ok(values.clone()),
        Some(other) => Err(Error::InvalidValues {
            instance: instance.name_any(),
            message: format!("expected a mapping, found {}", value_type(other)),
        }),
    }
}

fn value_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "a mapping",
    }
}

impl Reconciler {
    pub(super) async fn provision(
        &self,
        instance: &ClusterTemplateInstance,
        template: &ClusterTemplate,
    ) -> Result<()> {
        let values = decode_values(instance)?;
        let spec = &template.spec;

        let repositories = self.collaborators.store.list_repositories().await?;
        let repository = repositories
            .iter()
            .find(|r| r.name_any() == spec.helm_repository)
            .ok_or_else(|| Error::RepositoryNotFound {
                name: spec.helm_repository.clone(),
            })?;
        let repository_url = repository.spec.connection_config.url.as_str();

        let index = self.collaborators.index.fetch(repository_url).await?;
        let chart_url = index
            .chart_url(&spec.helm_chart, &spec.helm_chart_version)
            .ok_or_else(|| Error::ChartNotFound {
                repository: spec.helm_repository.clone(),
                chart: spec.helm_chart.clone(),
                version: spec.helm_chart_version.clone(),
            })?;
        let chart_url = resolve_chart_url(repository_url, chart_url)?;

        let name = instance.name_any();
        let namespace = instance.namespace().unwrap_or_default();
        info!(
            stage = "provision",
            chart = %spec.helm_chart,
            version = %spec.helm_chart_version,
            url = %chart_url,
            "installing chart"
        );
        self.collaborators
            .installer
            .install(&chart_url, &name, &namespace, &values)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;
    use crate::helm::{ChartIndex, ChartVersion};
    use crate::models::{HelmChartRepository, HelmChartRepositorySpec};
    use std::collections::BTreeMap;

    fn repository(name: &str, url: &str) -> HelmChartRepository {
        let mut spec = HelmChartRepositorySpec::default();
        spec.connection_config.url = url.to_string();
        HelmChartRepository::new(name, spec)
    }

    fn index() -> ChartIndex {
        ChartIndex {
            api_version: Some("v1".to_string()),
            entries: BTreeMap::from([(
                "hypershift-template".to_string(),
                vec![ChartVersion {
                    version: "0.0.2".to_string(),
                    urls: vec!["charts/hypershift-template-0.0.2.tgz".to_string()],
                }],
            )]),
        }
    }

    #[test]
    fn test_decode_values() {
        let cti = instance("demo");
        assert_eq!(decode_values(&cti).unwrap()["nodePoolReplicas"], 2);

        let mut empty = instance("demo");
        empty.spec.values = None;
        assert!(decode_values(&empty).unwrap().is_empty());
        empty.spec.values = Some(Value::Null);
        assert!(decode_values(&empty).unwrap().is_empty());

        let mut invalid = instance("demo");
        invalid.spec.values = Some(serde_json::json!(["a", "b"]));
        let err = decode_values(&invalid).unwrap_err();
        assert!(err.to_string().contains("found a list"));
    }

    #[tokio::test]
    async fn test_provision_installs_resolved_chart() {
        let mut mocks = Mocks::new();
        mocks.store.expect_list_repositories().returning(|| {
            Ok(vec![
                repository("other", "https://other.example.com/index.yaml"),
                repository("charts", "https://charts.example.com/stable/index.yaml"),
            ])
        });
        mocks
            .index
            .expect_fetch()
            .withf(|url| url == "https://charts.example.com/stable/index.yaml")
            .returning(|_| Ok(index()));
        mocks
            .installer
            .expect_install()
            .withf(|url, release, ns, values| {
                url == "https://charts.example.com/stable/charts/hypershift-template-0.0.2.tgz"
                    && release == "demo"
                    && ns == "clusters"
                    && values["nodePoolReplicas"] == 2
            })
            .times(1)
            .returning(|_, _, _, _| Ok(()));

        mocks
            .into_reconciler()
            .provision(&instance("demo"), &template())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_provision_repository_not_found() {
        let mut mocks = Mocks::new();
        mocks
            .store
            .expect_list_repositories()
            .returning(|| Ok(vec![repository("other", "https://other.example.com")]));
        mocks.index.expect_fetch().never();
        mocks.installer.expect_install().never();

        let err = mocks
            .into_reconciler()
            .provision(&instance("demo"), &template())
            .await
            .unwrap_err();
        assert!(err.to_string().starts_with("repository not found"));
    }

    #[tokio::test]
    async fn test_provision_chart_version_not_found() {
        let mut mocks = Mocks::new();
        mocks
            .store
            .expect_list_repositories()
            .returning(|| Ok(vec![repository("charts", "https://charts.example.com/index.yaml")]));
        mocks.index.expect_fetch().returning(|_| Ok(index()));
        mocks.installer.expect_install().never();

        let mut tmpl = template();
        tmpl.spec.helm_chart_version = "9.9.9".to_string();
        let err = mocks
            .into_reconciler()
            .provision(&instance("demo"), &tmpl)
            .await
            .unwrap_err();
        assert!(err.to_string().starts_with("chart not found"));
    }

    #[tokio::test]
    async fn test_invalid_values_fail_before_lookups() {
        let mut mocks = Mocks::new();
        mocks.store.expect_list_repositories().never();

        let mut cti = instance("demo");
        cti.spec.values = Some(serde_json::json!("replicas=2"));
        let err = mocks
            .into_reconciler()
            .provision(&cti, &template())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidValues { .. }));
    }
}
