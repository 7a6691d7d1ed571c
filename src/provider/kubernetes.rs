//! Kubernetes and OpenShift providers
//!
//! Both clusters are driven through their CLI (`kubectl` / `oc`), which share
//! the same `create -f` / `delete -f` surface.

use std::path::PathBuf;

use super::command::run_command;
use super::{Provider, ProviderContext};
use crate::constants::{DEFAULT_NAMESPACE, NAMESPACE_KEY, PROVIDER_CONFIG_KEY};
use crate::error::{AtomicAppError, Result};

/// Provider backed by a kubectl-compatible CLI.
#[derive(Debug)]
pub struct KubernetesProvider {
    ctx: ProviderContext,
    cli: &'static str,
    binary: PathBuf,
    namespace: String,
    artifacts: Vec<PathBuf>,
}

impl KubernetesProvider {
    pub fn kubernetes(ctx: ProviderContext) -> Self {
        Self::with_cli(ctx, "kubectl")
    }

    pub fn openshift(ctx: ProviderContext) -> Self {
        Self::with_cli(ctx, "oc")
    }

    fn with_cli(ctx: ProviderContext, cli: &'static str) -> Self {
        let namespace = ctx
            .config
            .get(NAMESPACE_KEY)
            .cloned()
            .unwrap_or_else(|| DEFAULT_NAMESPACE.to_string());
        Self {
            ctx,
            cli,
            binary: PathBuf::from(cli),
            namespace,
            artifacts: Vec::new(),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Full argument list for one artifact operation (`create` / `delete`).
    fn args_for(&self, verb: &str, artifact: &std::path::Path) -> Vec<String> {
        let mut args = Vec::new();
        if let Some(config) = self.ctx.config.get(PROVIDER_CONFIG_KEY) {
            args.push(format!("--kubeconfig={}", config));
        }
        args.push(verb.to_string());
        args.push("-f".to_string());
        args.push(self.ctx.rendered(artifact).to_string_lossy().to_string());
        args.push(format!("--namespace={}", self.namespace));
        args
    }

    fn call(&self, args: Vec<String>) -> Result<()> {
        let output = run_command(&self.binary, &args, self.ctx.dry_run).map_err(|e| {
            AtomicAppError::provider_failed(
                &self.ctx.name,
                format!("failed to run {}: {}", self.cli, e),
            )
        })?;
        output
            .ensure_success(&format!("{} {}", self.cli, args.join(" ")))
            .map_err(|msg| AtomicAppError::provider_failed(&self.ctx.name, msg))
    }
}

impl Provider for KubernetesProvider {
    fn name(&self) -> &str {
        &self.ctx.name
    }

    fn set_artifacts(&mut self, artifacts: Vec<PathBuf>) {
        self.artifacts = artifacts;
    }

    fn init(&mut self) -> Result<()> {
        tracing::debug!(
            "Initializing {} provider, namespace {}",
            self.ctx.name,
            self.namespace
        );
        if self.ctx.dry_run {
            return Ok(());
        }
        self.binary = which::which(self.cli).map_err(|e| {
            AtomicAppError::provider_failed(
                &self.ctx.name,
                format!("could not find {} in PATH: {}", self.cli, e),
            )
        })?;
        Ok(())
    }

    fn deploy(&mut self) -> Result<()> {
        for artifact in &self.artifacts {
            tracing::info!("Deploying {}", artifact.display());
            self.call(self.args_for("create", artifact))?;
        }
        Ok(())
    }

    fn undeploy(&mut self) -> Result<()> {
        for artifact in self.artifacts.iter().rev() {
            tracing::info!("Removing {}", artifact.display());
            self.call(self.args_for("delete", artifact))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::ResolvedConfig;
    use std::path::Path;

    fn context(config: &[(&str, &str)]) -> ProviderContext {
        ProviderContext {
            name: "kubernetes".to_string(),
            config: config
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect::<ResolvedConfig>(),
            dst_dir: PathBuf::from("/app/.workdir/web"),
            dry_run: true,
        }
    }

    #[test]
    fn test_namespace_defaults() {
        let provider = KubernetesProvider::kubernetes(context(&[]));
        assert_eq!(provider.namespace(), "default");
    }

    #[test]
    fn test_create_arguments() {
        let provider = KubernetesProvider::kubernetes(context(&[("namespace", "prod")]));
        let args = provider.args_for("create", Path::new("artifacts/pod.json"));
        assert_eq!(
            args,
            vec![
                "create",
                "-f",
                "/app/.workdir/web/artifacts/pod.json",
                "--namespace=prod"
            ]
        );
    }

    #[test]
    fn test_provider_config_adds_kubeconfig() {
        let provider =
            KubernetesProvider::openshift(context(&[("provider-config", "/etc/kube/config")]));
        let args = provider.args_for("delete", Path::new("svc.json"));
        assert_eq!(args[0], "--kubeconfig=/etc/kube/config");
        assert_eq!(args[1], "delete");
    }

    #[test]
    fn test_dry_run_lifecycle_succeeds_without_cli() {
        let mut provider = KubernetesProvider::openshift(context(&[]));
        provider.set_artifacts(vec![PathBuf::from("a.json"), PathBuf::from("b.json")]);

        provider.init().unwrap();
        provider.deploy().unwrap();
        provider.undeploy().unwrap();
    }
}
