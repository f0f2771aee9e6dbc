//! CRD compatibility tests
//!
//! These tests pin the generated CRDs and the wire format of the resources
//! the operator reads, so that model changes cannot silently break clusters
//! already running the operator.

use kube::CustomResourceExt;
use serde_json::{Value, json};

use cluster_templates_operator::models::{
    API_GROUP, API_VERSION, ClusterTemplate, ClusterTemplateInstance, HelmChartRepository,
    HostedCluster, PipelineRun, SetupOutcome,
};

fn crd_json<K: CustomResourceExt>() -> Value {
    serde_json::to_value(K::crd()).unwrap()
}

fn open_api_schema(crd: &Value) -> &Value {
    &crd["spec"]["versions"][0]["schema"]["openAPIV3Schema"]
}

#[test]
fn test_instance_crd_identity() {
    let crd = crd_json::<ClusterTemplateInstance>();
    assert_eq!(crd["metadata"]["name"], "clustertemplateinstances.clustertemplate.rawagner.com");
    assert_eq!(crd["spec"]["group"], API_GROUP);
    assert_eq!(crd["spec"]["scope"], "Namespaced");
    assert_eq!(crd["spec"]["names"]["kind"], "ClusterTemplateInstance");
    assert_eq!(crd["spec"]["names"]["plural"], "clustertemplateinstances");
    assert_eq!(crd["spec"]["names"]["shortNames"], json!(["cti"]));
    assert_eq!(crd["spec"]["versions"][0]["name"], API_VERSION);
}

#[test]
fn test_instance_crd_has_status_subresource() {
    let crd = crd_json::<ClusterTemplateInstance>();
    assert_eq!(crd["spec"]["versions"][0]["subresources"]["status"], json!({}));

    let status = &open_api_schema(&crd)["properties"]["status"]["properties"];
    for field in [
        "created",
        "clusterStatus",
        "clusterSetupStarted",
        "clusterSetup",
        "kubeadminPassword",
        "apiServerURL",
    ] {
        assert!(status.get(field).is_some(), "missing status field {field}");
    }
}

#[test]
fn test_instance_values_are_preserved_verbatim() {
    let crd = crd_json::<ClusterTemplateInstance>();
    let values = &open_api_schema(&crd)["properties"]["spec"]["properties"]["values"];
    assert_eq!(values["x-kubernetes-preserve-unknown-fields"], true);
}

#[test]
fn test_instance_crd_printer_columns() {
    let crd = crd_json::<ClusterTemplateInstance>();
    let columns = crd["spec"]["versions"][0]["additionalPrinterColumns"]
        .as_array()
        .unwrap();
    let paths: Vec<_> = columns.iter().map(|c| c["jsonPath"].as_str().unwrap()).collect();
    assert_eq!(
        paths,
        [".spec.template", ".status.clusterStatus", ".status.clusterSetupStarted"]
    );
}

#[test]
fn test_template_crd_is_cluster_scoped() {
    let crd = crd_json::<ClusterTemplate>();
    assert_eq!(crd["metadata"]["name"], "clustertemplates.clustertemplate.rawagner.com");
    assert_eq!(crd["spec"]["scope"], "Cluster");
    assert_eq!(crd["spec"]["names"]["shortNames"], json!(["ct"]));

    let spec = &open_api_schema(&crd)["properties"]["spec"];
    let required: Vec<_> = spec["required"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_str().unwrap())
        .collect();
    assert!(required.contains(&"helmRepository"));
    assert!(required.contains(&"helmChart"));
    assert!(required.contains(&"helmChartVersion"));
}

#[test]
fn test_instance_deserializes_from_cluster_json() {
    let cti: ClusterTemplateInstance = serde_json::from_value(json!({
        "apiVersion": "clustertemplate.rawagner.com/v1alpha1",
        "kind": "ClusterTemplateInstance",
        "metadata": {"name": "demo", "namespace": "clusters", "resourceVersion": "42"},
        "spec": {
            "template": "hypershift",
            "values": {"nodePoolReplicas": 2, "nested": {"list": [1, 2]}}
        },
        "status": {
            "created": true,
            "clusterStatus": "Available",
            "clusterSetupStarted": true,
            "clusterSetup": [
                {"name": "configure-oauth", "succeeded": "False", "reason": "Failed", "message": "boom"}
            ],
            "apiServerURL": "https://api.demo.example.com:6443"
        }
    }))
    .unwrap();

    assert_eq!(cti.spec.template, "hypershift");
    assert_eq!(cti.spec.values.as_ref().unwrap()["nested"]["list"][1], 2);
    let status = cti.current_status();
    assert!(status.created);
    assert_eq!(status.cluster_setup[0].succeeded, SetupOutcome::False);
    assert!(status.cluster_setup[0].completion_time.is_none());
    assert!(status.kubeadmin_password.is_none());
}

#[test]
fn test_instance_without_status_reads_as_fresh() {
    let cti: ClusterTemplateInstance = serde_json::from_value(json!({
        "apiVersion": "clustertemplate.rawagner.com/v1alpha1",
        "kind": "ClusterTemplateInstance",
        "metadata": {"name": "demo", "namespace": "clusters"},
        "spec": {"template": "hypershift"}
    }))
    .unwrap();
    let status = cti.current_status();
    assert!(!status.created);
    assert!(!status.cluster_setup_started);
    assert!(cti.spec.values.is_none());
}

#[test]
fn test_template_deserializes_setup_entries() {
    let ct: ClusterTemplate = serde_json::from_value(json!({
        "apiVersion": "clustertemplate.rawagner.com/v1alpha1",
        "kind": "ClusterTemplate",
        "metadata": {"name": "hypershift"},
        "spec": {
            "helmRepository": "charts",
            "helmChart": "hypershift-template",
            "helmChartVersion": "0.0.2",
            "clusterSetup": [
                {"name": "configure-oauth", "pipeline": "oauth-pipeline"},
                {"name": "install-operators", "pipeline": "operators", "params": {"channel": "stable"}}
            ]
        }
    }))
    .unwrap();
    assert_eq!(ct.spec.cluster_setup.len(), 2);
    assert!(ct.spec.cluster_setup[0].params.is_empty());
    assert_eq!(ct.spec.cluster_setup[1].params["channel"], "stable");
}

#[test]
fn test_foreign_resources_ignore_unknown_fields() {
    let repo: HelmChartRepository = serde_json::from_value(json!({
        "apiVersion": "helm.openshift.io/v1beta1",
        "kind": "HelmChartRepository",
        "metadata": {"name": "charts"},
        "spec": {
            "name": "Community charts",
            "connectionConfig": {"url": "https://charts.example.com/index.yaml", "ca": {"name": "ca"}}
        }
    }))
    .unwrap();
    assert_eq!(repo.spec.connection_config.url, "https://charts.example.com/index.yaml");

    let hc: HostedCluster = serde_json::from_value(json!({
        "apiVersion": "hypershift.openshift.io/v1beta1",
        "kind": "HostedCluster",
        "metadata": {"name": "demo", "namespace": "clusters"},
        "spec": {"release": {"image": "quay.io/openshift-release-dev/ocp-release:4.10.0"}},
        "status": {
            "conditions": [{"type": "Available", "status": "True", "lastTransitionTime": "2022-06-01T12:00:00Z"}],
            "kubeconfig": {"name": "demo-admin-kubeconfig"},
            "version": {"desired": {}}
        }
    }))
    .unwrap();
    let status = hc.status.unwrap();
    assert_eq!(status.conditions[0].status, "True");
    assert_eq!(status.kubeconfig.unwrap().name, "demo-admin-kubeconfig");
    assert!(status.kubeadmin_password.is_none());

    let run: PipelineRun = serde_json::from_value(json!({
        "apiVersion": "tekton.dev/v1beta1",
        "kind": "PipelineRun",
        "metadata": {"name": "demo-configure-oauth", "namespace": "clusters"},
        "spec": {
            "pipelineRef": {"name": "oauth-pipeline"},
            "params": [{"name": "kubeconfigSecret", "value": "demo-admin-kubeconfig"}],
            "serviceAccountName": "pipeline"
        },
        "status": {
            "conditions": [{"type": "Succeeded", "status": "Unknown", "reason": "Running"}],
            "startTime": "2022-06-01T12:00:00Z"
        }
    }))
    .unwrap();
    let status = run.status.unwrap();
    assert!(status.completion_time.is_none());
    assert_eq!(status.conditions[0].reason.as_deref(), Some("Running"));
}
