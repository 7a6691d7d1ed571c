//! Nulecule manifest model
//!
//! The manifest describes the application as an ordered graph of components.
//! A component is either *external* (it has a `source` naming a separately
//! packaged application) or *local* (it carries parameters and per-provider
//! artifact sets).
//!
//! # Manifest Format
//!
//! ```yaml
//! specversion: 0.0.2
//! id: helloapache-app
//! graph:
//!   - name: helloapache
//!     params:
//!       - name: hostport
//!         description: The host TCP port as the external endpoint
//!         default: 80
//!     artifacts:
//!       kubernetes:
//!         - file://artifacts/kubernetes/hello-apache-pod.json
//!       openshift:
//!         - inherit:
//!           - kubernetes
//!   - name: mariadb
//!     source: docker://projectatomic/mariadb-centos7-atomicapp
//! ```
//!
//! The model is read-only once loaded.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::answers::yaml_scalar;
use crate::constants::{DOCKER_SOURCE_PREFIX, FILE_ARTIFACT_PREFIX, MAIN_FILE, NULECULE_SPEC_VERSION};
use crate::error::{AtomicAppError, Result};

/// Parsed `Nulecule` file
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Nulecule {
    /// Specification version the manifest was written against
    #[serde(default, deserialize_with = "deserialize_scalar")]
    pub specversion: Option<String>,

    /// Application identifier
    #[serde(default)]
    pub id: Option<String>,

    /// Free-form application metadata (name, appversion, description, ...)
    #[serde(default)]
    pub metadata: BTreeMap<String, serde_yaml::Value>,

    /// Ordered deployment graph; `None` when the section is missing entirely
    #[serde(default)]
    pub graph: Option<Vec<GraphItem>>,
}

/// One component entry of the graph
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct GraphItem {
    /// Component name; required, checked at dispatch time
    #[serde(default)]
    pub name: Option<String>,

    /// Location of an external application (`docker://<image>`)
    #[serde(default)]
    pub source: Option<String>,

    /// Declared parameters with optional defaults
    #[serde(default)]
    pub params: Vec<Param>,

    /// Artifact sets keyed by provider name
    #[serde(default)]
    pub artifacts: BTreeMap<String, Vec<ArtifactEntry>>,
}

/// A declared component parameter
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Param {
    pub name: String,

    #[serde(default)]
    pub description: Option<String>,

    /// Default value, stringified from whatever YAML scalar was written
    #[serde(default, deserialize_with = "deserialize_scalar")]
    pub default: Option<String>,
}

impl Param {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            default: None,
        }
    }

    pub fn with_default(mut self, default: impl Into<String>) -> Self {
        self.default = Some(default.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// One entry of an artifact set
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum ArtifactEntry {
    /// Relative path to an artifact file or directory
    Path(String),
    /// Reuse the resolved entries of other provider keys of the same component
    Inherit { inherit: Vec<String> },
}

impl ArtifactEntry {
    /// The relative artifact path with any `file://` prefix removed.
    pub fn local_path(&self) -> Option<PathBuf> {
        match self {
            ArtifactEntry::Path(path) => Some(PathBuf::from(
                path.strip_prefix(FILE_ARTIFACT_PREFIX).unwrap_or(path),
            )),
            ArtifactEntry::Inherit { .. } => None,
        }
    }
}

fn deserialize_scalar<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_yaml::Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(yaml_scalar))
}

impl GraphItem {
    /// Whether this item references an external application.
    pub fn is_external(&self) -> bool {
        self.source.is_some()
    }

    /// Image reference of an external item's `docker://` source.
    pub fn source_image(&self) -> Result<Option<String>> {
        let Some(source) = &self.source else {
            return Ok(None);
        };
        match source.strip_prefix(DOCKER_SOURCE_PREFIX) {
            Some(image) if !image.is_empty() => Ok(Some(image.to_string())),
            _ => Err(AtomicAppError::specification(format!(
                "Unsupported source '{}' for component '{}'",
                source,
                self.name.as_deref().unwrap_or("<unnamed>")
            ))),
        }
    }

    /// Declared defaults as a `name -> value` map.
    pub fn defaults(&self) -> BTreeMap<String, String> {
        self.params
            .iter()
            .filter_map(|p| p.default.clone().map(|d| (p.name.clone(), d)))
            .collect()
    }
}

impl Nulecule {
    /// Load the manifest file of an application directory.
    pub fn load_from_dir(app_path: &Path) -> Result<Self> {
        Self::from_file(&app_path.join(MAIN_FILE))
    }

    /// Load a manifest from a YAML (or JSON) file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            AtomicAppError::specification(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_yaml(&content)
    }

    /// Parse a manifest from YAML text.
    pub fn from_yaml(content: &str) -> Result<Self> {
        let manifest: Option<Self> = serde_yaml::from_str(content).map_err(|e| {
            AtomicAppError::specification(format!("Malformed {}: {}", MAIN_FILE, e))
        })?;
        Ok(manifest.unwrap_or_default())
    }

    /// The graph, or a specification error when the section is missing.
    pub fn graph(&self) -> Result<&[GraphItem]> {
        self.graph.as_deref().ok_or_else(|| {
            AtomicAppError::specification(format!("Graph not specified in {}", MAIN_FILE))
        })
    }

    /// Warn when the manifest targets another specification version.
    pub fn check_spec_version(&self) -> bool {
        match self.specversion.as_deref() {
            Some(NULECULE_SPEC_VERSION) => true,
            Some(other) => {
                tracing::warn!(
                    "Nulecule spec version {} differs from supported {}",
                    other,
                    NULECULE_SPEC_VERSION
                );
                false
            }
            None => {
                tracing::warn!("Nulecule spec version not specified");
                false
            }
        }
    }

    /// Verify every concrete artifact of every local component exists.
    pub fn check_all_artifacts(&self, app_path: &Path) -> Result<()> {
        for item in self.graph.as_deref().unwrap_or_default() {
            if item.is_external() {
                continue;
            }
            for (provider, entries) in &item.artifacts {
                for path in entries.iter().filter_map(ArtifactEntry::local_path) {
                    if !app_path.join(&path).exists() {
                        return Err(AtomicAppError::specification(format!(
                            "Missing artifact {} for provider {} of component '{}'",
                            path.display(),
                            provider,
                            item.name.as_deref().unwrap_or("<unnamed>")
                        )));
                    }
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HELLOAPACHE: &str = r#"
specversion: 0.0.2
id: helloapache-app
metadata:
  name: Hello Apache App
  appversion: 0.0.1
graph:
  - name: helloapache-app
    params:
      - name: image
        description: The webserver image
        default: centos/httpd
      - name: hostport
        description: The host TCP port as the external endpoint
        default: 80
      - name: password
        description: No default for this one
    artifacts:
      docker:
        - file://artifacts/docker/hello-apache-pod_run
      kubernetes:
        - file://artifacts/kubernetes/hello-apache-pod.json
      openshift:
        - inherit:
          - kubernetes
  - name: mariadb
    source: docker://projectatomic/mariadb-centos7-atomicapp
"#;

    #[test]
    fn test_parse_graph() {
        let nulecule = Nulecule::from_yaml(HELLOAPACHE).unwrap();
        let graph = nulecule.graph().unwrap();

        assert_eq!(graph.len(), 2);
        assert_eq!(graph[0].name.as_deref(), Some("helloapache-app"));
        assert!(!graph[0].is_external());
        assert!(graph[1].is_external());
        assert!(nulecule.check_spec_version());
    }

    #[test]
    fn test_defaults_are_stringified() {
        let nulecule = Nulecule::from_yaml(HELLOAPACHE).unwrap();
        let defaults = nulecule.graph().unwrap()[0].defaults();

        assert_eq!(defaults.get("hostport").map(String::as_str), Some("80"));
        assert_eq!(defaults.get("image").map(String::as_str), Some("centos/httpd"));
        assert!(!defaults.contains_key("password"));
    }

    #[test]
    fn test_artifact_entries() {
        let nulecule = Nulecule::from_yaml(HELLOAPACHE).unwrap();
        let sets = &nulecule.graph().unwrap()[0].artifacts;

        assert_eq!(
            sets["kubernetes"][0].local_path(),
            Some(PathBuf::from("artifacts/kubernetes/hello-apache-pod.json"))
        );
        assert_eq!(
            sets["openshift"][0],
            ArtifactEntry::Inherit {
                inherit: vec!["kubernetes".to_string()]
            }
        );
    }

    #[test]
    fn test_source_image() {
        let nulecule = Nulecule::from_yaml(HELLOAPACHE).unwrap();
        let graph = nulecule.graph().unwrap();

        assert_eq!(graph[0].source_image().unwrap(), None);
        assert_eq!(
            graph[1].source_image().unwrap().as_deref(),
            Some("projectatomic/mariadb-centos7-atomicapp")
        );

        let bad = GraphItem {
            name: Some("x".to_string()),
            source: Some("git://example.com/app".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            bad.source_image(),
            Err(AtomicAppError::Specification(_))
        ));
    }

    #[test]
    fn test_missing_graph_is_specification_error() {
        let nulecule = Nulecule::from_yaml("specversion: 0.0.2\nid: empty\n").unwrap();
        assert!(matches!(
            nulecule.graph(),
            Err(AtomicAppError::Specification(_))
        ));
    }

    #[test]
    fn test_malformed_manifest_is_specification_error() {
        let result = Nulecule::from_yaml("graph: [unclosed");
        assert!(matches!(result, Err(AtomicAppError::Specification(ref m)) if m.starts_with("Malformed")));
    }

    #[test]
    fn test_check_all_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let nulecule = Nulecule::from_yaml(HELLOAPACHE).unwrap();

        assert!(nulecule.check_all_artifacts(dir.path()).is_err());

        for rel in [
            "artifacts/docker/hello-apache-pod_run",
            "artifacts/kubernetes/hello-apache-pod.json",
        ] {
            let path = dir.path().join(rel);
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(path, "{}").unwrap();
        }
        assert!(nulecule.check_all_artifacts(dir.path()).is_ok());
    }
}
