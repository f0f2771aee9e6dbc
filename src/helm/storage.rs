//! Helm release storage reader
//!
//! Helm 3 stores each release revision in a Secret named
//! `sh.helm.release.v1.{release}.v{version}` labelled `owner=helm`,
//! `name={release}` and `version={version}`. The `release` key holds
//! base64 text of an (optionally gzipped) JSON release record.

use std::io::Read;

use base64::Engine;
use k8s_openapi::api::core::v1::Secret;
use kube::api::{Api, ListParams};
use kube::{Client, ResourceExt};
use serde::Deserialize;

use super::Release;
use crate::error::{Error, Result};

/// Gzip magic bytes (0x1f, 0x8b) plus deflate method (0x08)
const GZIP_MAGIC: [u8; 3] = [0x1f, 0x8b, 0x08];

/// The subset of Helm's release record the operator needs
#[derive(Debug, Deserialize)]
struct ReleaseRecord {
    name: String,
    #[serde(default)]
    namespace: String,
    #[serde(default)]
    info: ReleaseInfo,
    #[serde(default)]
    manifest: String,
}

#[derive(Debug, Default, Deserialize)]
struct ReleaseInfo {
    #[serde(default)]
    status: String,
}

/// Label selector matching every stored revision of a release
pub fn release_selector(release: &str) -> String {
    format!("owner=helm,name={}", release)
}

/// Pick the revision with the highest `version` label
pub fn latest_revision(secrets: &[Secret]) -> Option<&Secret> {
    secrets
        .iter()
        .filter_map(|s| {
            let version = s.labels().get("version")?.parse::<u64>().ok()?;
            Some((version, s))
        })
        .max_by_key(|(version, _)| *version)
        .map(|(_, s)| s)
}

/// Decode the `release` payload of a Helm storage Secret
///
/// Decode chain: base64 → gzip detection → decompress → JSON parse.
pub fn decode_release(release_name: &str, payload: &[u8]) -> Result<Release> {
    let storage_err = |message: String| Error::ReleaseStorage {
        release: release_name.to_string(),
        message,
    };

    let decoded = base64::engine::general_purpose::STANDARD
        .decode(payload)
        .map_err(|e| storage_err(format!("invalid base64 release data: {}", e)))?;

    let decompressed = if decoded.starts_with(&GZIP_MAGIC) {
        let mut decoder = flate2::read::GzDecoder::new(&decoded[..]);
        let mut buf = Vec::new();
        decoder
            .read_to_end(&mut buf)
            .map_err(|e| storage_err(format!("failed to decompress release data: {}", e)))?;
        buf
    } else {
        decoded
    };

    let record: ReleaseRecord = serde_json::from_slice(&decompressed)
        .map_err(|e| storage_err(format!("invalid release JSON: {}", e)))?;

    Ok(Release {
        name: record.name,
        namespace: record.namespace,
        status: record.info.status,
        manifest: record.manifest,
    })
}

/// Reads the current revision of a release from its storage Secrets
#[derive(Clone)]
pub struct ReleaseStorage {
    client: Client,
}

impl ReleaseStorage {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub async fn current(&self, release: &str, namespace: &str) -> Result<Release> {
        let secrets: Api<Secret> = Api::namespaced(self.client.clone(), namespace);
        let revisions = secrets
            .list(&ListParams::default().labels(&release_selector(release)))
            .await?
            .items;

        let latest = latest_revision(&revisions).ok_or_else(|| Error::ReleaseNotFound {
            release: release.to_string(),
            namespace: namespace.to_string(),
        })?;

        let payload = latest
            .data
            .as_ref()
            .and_then(|data| data.get("release"))
            .ok_or_else(|| Error::ReleaseStorage {
                release: release.to_string(),
                message: format!("secret {} missing 'release' key", latest.name_any()),
            })?;

        tracing::debug!(
            release = %release,
            revision = %latest.name_any(),
            "decoding Helm release revision"
        );
        decode_release(release, &payload.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::Compression;
    use flate2::write::GzEncoder;
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
    use std::collections::BTreeMap;
    use std::io::Write;

    const RECORD: &str = r#"{
        "name": "demo",
        "namespace": "clusters",
        "version": 2,
        "info": {"status": "deployed", "description": "Upgrade complete"},
        "manifest": "---\nkind: ConfigMap\n"
    }"#;

    fn encode(bytes: &[u8]) -> Vec<u8> {
        base64::engine::general_purpose::STANDARD
            .encode(bytes)
            .into_bytes()
    }

    fn revision(version: &str) -> Secret {
        Secret {
            metadata: ObjectMeta {
                name: Some(format!("sh.helm.release.v1.demo.v{}", version)),
                labels: Some(BTreeMap::from([
                    ("owner".to_string(), "helm".to_string()),
                    ("version".to_string(), version.to_string()),
                ])),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_decode_gzipped_release() {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(RECORD.as_bytes()).unwrap();
        let gz = encoder.finish().unwrap();

        let release = decode_release("demo", &encode(&gz)).unwrap();
        assert_eq!(release.name, "demo");
        assert_eq!(release.namespace, "clusters");
        assert_eq!(release.status, "deployed");
        assert_eq!(release.manifest, "---\nkind: ConfigMap\n");
    }

    #[test]
    fn test_decode_plain_release() {
        let release = decode_release("demo", &encode(RECORD.as_bytes())).unwrap();
        assert_eq!(release.status, "deployed");
    }

    #[test]
    fn test_decode_rejects_garbage() {
        let err = decode_release("demo", b"%%%not-base64%%%").unwrap_err();
        assert!(matches!(err, Error::ReleaseStorage { .. }));

        let err = decode_release("demo", &encode(b"not json")).unwrap_err();
        assert!(err.to_string().contains("invalid release JSON"));
    }

    #[test]
    fn test_latest_revision_compares_numerically() {
        let secrets = vec![revision("9"), revision("10"), revision("2")];
        let latest = latest_revision(&secrets).unwrap();
        assert_eq!(latest.name_any(), "sh.helm.release.v1.demo.v10");
    }

    #[test]
    fn test_latest_revision_ignores_unlabelled() {
        let mut unlabelled = revision("1");
        unlabelled.metadata.labels = None;
        assert!(latest_revision(&[unlabelled]).is_none());
    }
}
