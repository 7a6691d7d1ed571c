//! Provider Adapters
//!
//! A provider turns rendered artifacts into running (or removed) workloads on
//! one kind of infrastructure. The engine only talks to the `Provider` trait;
//! concrete adapters are looked up by name in a `ProviderRegistry`.
//!
//! # Contract
//!
//! - `load_artifact` / `save_artifact`: raw artifact in, rendered artifact out.
//!   Saving always writes, also under dry-run.
//! - `set_artifacts`: the component's resolved artifact list, relative paths
//!   below the provider's destination directory.
//! - `init`, then exactly one of `deploy` / `undeploy`.
//!
//! Every failure of `init`, `deploy` or `undeploy` is reported as
//! `AtomicAppError::ProviderFailed`.

pub mod command;
pub mod docker;
pub mod kubernetes;

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::{AtomicAppError, Result};
use crate::params::ResolvedConfig;

pub use docker::DockerProvider;
pub use kubernetes::KubernetesProvider;

/// Everything a provider instance is constructed from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderContext {
    /// Registered provider name
    pub name: String,
    /// Resolved configuration of the component being deployed
    pub config: ResolvedConfig,
    /// `<workdir>/<component>`
    pub dst_dir: PathBuf,
    /// Log cluster-changing commands instead of running them
    pub dry_run: bool,
}

impl ProviderContext {
    /// Location of the rendered copy of an artifact.
    pub fn rendered(&self, artifact: &Path) -> PathBuf {
        self.dst_dir.join(artifact)
    }
}

/// Polymorphic deployment backend.
pub trait Provider {
    /// Registered name of this provider.
    fn name(&self) -> &str;

    /// Read a raw artifact.
    fn load_artifact(&self, path: &Path) -> Result<String> {
        read_artifact(path)
    }

    /// Write a rendered artifact, creating parent directories.
    fn save_artifact(&self, path: &Path, content: &str) -> Result<()> {
        write_artifact(path, content)
    }

    /// Record the artifacts `deploy`/`undeploy` act on.
    fn set_artifacts(&mut self, artifacts: Vec<PathBuf>);

    fn init(&mut self) -> Result<()>;

    fn deploy(&mut self) -> Result<()>;

    fn undeploy(&mut self) -> Result<()>;
}

/// Default artifact loading: the file as UTF-8 text.
pub fn read_artifact(path: &Path) -> Result<String> {
    tracing::debug!("Loading artifact {}", path.display());
    Ok(std::fs::read_to_string(path)?)
}

/// Default artifact saving: create parents, then write.
pub fn write_artifact(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    tracing::debug!("Saving rendered artifact {}", path.display());
    std::fs::write(path, content)?;
    Ok(())
}

/// Constructor of a provider instance.
pub type ProviderFactory = Box<dyn Fn(ProviderContext) -> Box<dyn Provider>>;

/// Registry of known providers, keyed by name.
#[derive(Default)]
pub struct ProviderRegistry {
    factories: BTreeMap<String, ProviderFactory>,
}

impl fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("providers", &self.names().collect::<Vec<_>>())
            .finish()
    }
}

impl ProviderRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a provider factory, replacing any provider of the same name
    pub fn register<F>(&mut self, name: impl Into<String>, factory: F)
    where
        F: Fn(ProviderContext) -> Box<dyn Provider> + 'static,
    {
        self.factories.insert(name.into(), Box::new(factory));
    }

    /// Look up a provider factory; fails closed for unknown names
    pub fn get(&self, name: &str) -> Result<&ProviderFactory> {
        self.factories
            .get(name)
            .ok_or_else(|| AtomicAppError::UnknownProvider {
                name: name.to_string(),
            })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Registered provider names, sorted
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }

    /// Create a registry with the built-in providers
    pub fn with_builtin_providers() -> Self {
        let mut registry = Self::new();
        registry.register("kubernetes", |ctx| {
            Box::new(KubernetesProvider::kubernetes(ctx)) as Box<dyn Provider>
        });
        registry.register("openshift", |ctx| {
            Box::new(KubernetesProvider::openshift(ctx)) as Box<dyn Provider>
        });
        registry.register("docker", |ctx| {
            Box::new(DockerProvider::new(ctx)) as Box<dyn Provider>
        });
        registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context(name: &str) -> ProviderContext {
        ProviderContext {
            name: name.to_string(),
            config: ResolvedConfig::new(),
            dst_dir: PathBuf::from("/tmp/work/web"),
            dry_run: true,
        }
    }

    #[test]
    fn test_registry_with_builtin_providers() {
        let registry = ProviderRegistry::with_builtin_providers();

        assert!(registry.contains("kubernetes"));
        assert!(registry.contains("openshift"));
        assert!(registry.contains("docker"));
        assert_eq!(
            registry.names().collect::<Vec<_>>(),
            vec!["docker", "kubernetes", "openshift"]
        );
    }

    #[test]
    fn test_registry_unknown_provider_fails_closed() {
        let registry = ProviderRegistry::with_builtin_providers();
        assert!(matches!(
            registry.get("marathon"),
            Err(AtomicAppError::UnknownProvider { ref name }) if name == "marathon"
        ));
    }

    #[test]
    fn test_factory_builds_named_provider() {
        let registry = ProviderRegistry::with_builtin_providers();
        let factory = registry.get("openshift").unwrap();
        let provider = factory(context("openshift"));
        assert_eq!(provider.name(), "openshift");
    }

    #[test]
    fn test_save_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("web/artifacts/kubernetes/pod.json");

        write_artifact(&target, "{\"kind\": \"Pod\"}").unwrap();

        assert_eq!(read_artifact(&target).unwrap(), "{\"kind\": \"Pod\"}");
    }

    #[test]
    fn test_rendered_path_mirrors_artifact() {
        let ctx = context("kubernetes");
        assert_eq!(
            ctx.rendered(Path::new("artifacts/pod.json")),
            PathBuf::from("/tmp/work/web/artifacts/pod.json")
        );
    }
}
