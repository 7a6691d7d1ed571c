//! Docker provider
//!
//! Docker artifacts are plain text files with one `docker run ...` command per
//! line. Blank lines and `#` comments are ignored. Undeploy stops and removes
//! every container an artifact names with `--name`.

use std::path::{Path, PathBuf};

use super::command::run_command;
use super::{Provider, ProviderContext};
use crate::error::{AtomicAppError, Result};

#[derive(Debug)]
pub struct DockerProvider {
    ctx: ProviderContext,
    binary: PathBuf,
    artifacts: Vec<PathBuf>,
}

impl DockerProvider {
    pub fn new(ctx: ProviderContext) -> Self {
        Self {
            ctx,
            binary: PathBuf::from("docker"),
            artifacts: Vec::new(),
        }
    }

    fn failed(&self, msg: impl Into<String>) -> AtomicAppError {
        AtomicAppError::provider_failed(&self.ctx.name, msg)
    }

    /// `docker run` commands of one rendered artifact, as argument lists
    /// without the leading `docker`.
    fn run_commands(&self, artifact: &Path) -> Result<Vec<Vec<String>>> {
        let path = self.ctx.rendered(artifact);
        let content = std::fs::read_to_string(&path).map_err(|e| {
            self.failed(format!("cannot read artifact {}: {}", path.display(), e))
        })?;
        parse_run_commands(&content).map_err(|msg| {
            self.failed(format!("{}: {}", artifact.display(), msg))
        })
    }

    fn call(&self, args: &[String]) -> Result<()> {
        let output = run_command(&self.binary, args, self.ctx.dry_run)
            .map_err(|e| self.failed(format!("failed to run docker: {}", e)))?;
        output
            .ensure_success(&format!("docker {}", args.join(" ")))
            .map_err(|msg| self.failed(msg))
    }
}

/// Split artifact text into `docker run` argument lists.
fn parse_run_commands(content: &str) -> std::result::Result<Vec<Vec<String>>, String> {
    let mut commands = Vec::new();
    for (idx, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let words = shell_words::split(line)
            .map_err(|e| format!("line {}: {}", idx + 1, e))?;
        match words.as_slice() {
            [docker, run, ..] if docker == "docker" && run == "run" => {
                commands.push(words[1..].to_vec());
            }
            _ => {
                return Err(format!(
                    "line {}: expected a 'docker run' command, got '{}'",
                    idx + 1,
                    line
                ));
            }
        }
    }
    Ok(commands)
}

/// Value of `--name` in a `run` argument list.
fn container_name(args: &[String]) -> Option<String> {
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if arg == "--name" {
            return iter.next().cloned();
        }
        if let Some(name) = arg.strip_prefix("--name=") {
            return Some(name.to_string());
        }
    }
    None
}

impl Provider for DockerProvider {
    fn name(&self) -> &str {
        &self.ctx.name
    }

    fn set_artifacts(&mut self, artifacts: Vec<PathBuf>) {
        self.artifacts = artifacts;
    }

    fn init(&mut self) -> Result<()> {
        if self.ctx.dry_run {
            return Ok(());
        }
        self.binary = which::which("docker")
            .map_err(|e| self.failed(format!("could not find docker in PATH: {}", e)))?;
        Ok(())
    }

    fn deploy(&mut self) -> Result<()> {
        for artifact in &self.artifacts {
            for args in self.run_commands(artifact)? {
                self.call(&args)?;
            }
        }
        Ok(())
    }

    fn undeploy(&mut self) -> Result<()> {
        for artifact in self.artifacts.iter().rev() {
            for args in self.run_commands(artifact)?.iter().rev() {
                let Some(name) = container_name(args) else {
                    tracing::warn!(
                        "Cannot stop container without --name in {}",
                        artifact.display()
                    );
                    continue;
                };
                self.call(&["stop".to_string(), name.clone()])?;
                self.call(&["rm".to_string(), name])?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::ResolvedConfig;

    #[test]
    fn test_parse_run_commands() {
        let content = "# web tier\n\ndocker run -d --name web -p 80:80 'centos/httpd'\n";
        let commands = parse_run_commands(content).unwrap();
        assert_eq!(
            commands,
            vec![vec!["run", "-d", "--name", "web", "-p", "80:80", "centos/httpd"]]
        );
    }

    #[test]
    fn test_parse_rejects_other_commands() {
        let err = parse_run_commands("docker rm -f web").unwrap_err();
        assert!(err.starts_with("line 1:"));
    }

    #[test]
    fn test_parse_rejects_unbalanced_quotes() {
        assert!(parse_run_commands("docker run 'oops").is_err());
    }

    #[test]
    fn test_container_name_forms() {
        let split = |s: &str| shell_words::split(s).unwrap();
        assert_eq!(container_name(&split("run --name db x")), Some("db".to_string()));
        assert_eq!(container_name(&split("run --name=db x")), Some("db".to_string()));
        assert_eq!(container_name(&split("run -d x")), None);
    }

    #[test]
    fn test_dry_run_deploy_reads_rendered_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("run"), "docker run --name web nginx\n").unwrap();
        let mut provider = DockerProvider::new(ProviderContext {
            name: "docker".to_string(),
            config: ResolvedConfig::new(),
            dst_dir: dir.path().to_path_buf(),
            dry_run: true,
        });
        provider.set_artifacts(vec![PathBuf::from("run")]);

        provider.init().unwrap();
        provider.deploy().unwrap();
        provider.undeploy().unwrap();
    }

    #[test]
    fn test_missing_rendered_artifact_is_provider_failure() {
        let dir = tempfile::tempdir().unwrap();
        let mut provider = DockerProvider::new(ProviderContext {
            name: "docker".to_string(),
            config: ResolvedConfig::new(),
            dst_dir: dir.path().to_path_buf(),
            dry_run: true,
        });
        provider.set_artifacts(vec![PathBuf::from("absent")]);

        let err = provider.deploy().unwrap_err();
        assert!(err.is_provider_failure());
    }
}
