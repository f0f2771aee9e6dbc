//! Rendered release manifest decoding
//!
//! A release manifest is multi-document YAML. Each fragment is parsed
//! strictly, then recognised kinds get a typed decode attempt.

use crate::error::{Error, Result};
use crate::models::HostedCluster;

/// Separator between documents in a rendered manifest
pub const DOCUMENT_SEPARATOR: &str = "---\n";

/// Kind of the nested cluster descriptor document
pub const HOSTED_CLUSTER_KIND: &str = "HostedCluster";

/// One parsed manifest document, tagged by whether its kind is recognised
#[derive(Debug, Clone, PartialEq)]
pub enum ManifestDocument {
    HostedCluster(Box<HostedCluster>),
    Other { kind: Option<String> },
}

impl ManifestDocument {
    pub fn kind(&self) -> Option<&str> {
        match self {
            Self::HostedCluster(_) => Some(HOSTED_CLUSTER_KIND),
            Self::Other { kind } => kind.as_deref(),
        }
    }
}

/// Split a rendered manifest and decode every non-empty fragment
///
/// Any fragment that is not valid YAML fails the whole manifest, as does a
/// HostedCluster document that does not match the typed model.
pub fn parse_manifest(release: &str, manifest: &str) -> Result<Vec<ManifestDocument>> {
    let mut documents = Vec::new();

    for (index, fragment) in manifest.split(DOCUMENT_SEPARATOR).enumerate() {
        if is_blank(fragment) {
            continue;
        }

        let value: serde_yaml::Value =
            serde_yaml::from_str(fragment).map_err(|source| Error::Manifest {
                release: release.to_string(),
                index,
                source,
            })?;
        if value.is_null() {
            continue;
        }

        documents.push(decode_document(value)?);
    }

    Ok(documents)
}

/// Typed decode of one parsed document
///
/// Unrecognised documents are only inspected for `kind`, so YAML that has no
/// JSON equivalent (such as integer mapping keys) is accepted there.
pub fn decode_document(value: serde_yaml::Value) -> Result<ManifestDocument> {
    let kind = value
        .get("kind")
        .and_then(|k| k.as_str())
        .map(str::to_string);

    match kind.as_deref() {
        Some(HOSTED_CLUSTER_KIND) => {
            let hc: HostedCluster =
                serde_yaml::from_value(value).map_err(|e| Error::decode(HOSTED_CLUSTER_KIND, e))?;
            Ok(ManifestDocument::HostedCluster(Box::new(hc)))
        }
        _ => Ok(ManifestDocument::Other { kind }),
    }
}

/// Fragments holding only whitespace or YAML comments carry no document
fn is_blank(fragment: &str) -> bool {
    fragment.lines().all(|line| {
        let line = line.trim();
        line.is_empty() || line.starts_with('#')
    })
}
