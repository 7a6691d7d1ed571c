//! External application bundles
//!
//! An external graph item names an application image. The bundle lives under
//! `/application-entity` inside the image and is copied out into a local
//! directory before the nested run reads its `Nulecule`.

use std::path::Path;

use crate::constants::{APP_ENT_PATH, MAIN_FILE};
use crate::error::{AtomicAppError, Result};
use crate::provider::command::run_command;

/// Source of application bundles.
pub trait AppFetcher {
    /// Copy the bundle of `image` into `target`.
    fn fetch(&self, image: &str, target: &Path, dry_run: bool) -> Result<()>;
}

/// Fetches bundles with the docker CLI.
#[derive(Debug, Clone, Default)]
pub struct DockerFetcher;

impl DockerFetcher {
    fn docker(&self, args: &[String], dry_run: bool) -> Result<String> {
        let output = run_command("docker", args, dry_run)
            .map_err(|e| AtomicAppError::fetch(format!("failed to run docker: {}", e)))?;
        output
            .ensure_success(&format!("docker {}", args.join(" ")))
            .map_err(AtomicAppError::fetch)?;
        Ok(output.stdout.trim().to_string())
    }
}

impl AppFetcher for DockerFetcher {
    fn fetch(&self, image: &str, target: &Path, dry_run: bool) -> Result<()> {
        tracing::info!("Fetching application {} into {}", image, target.display());
        if !dry_run {
            std::fs::create_dir_all(target)?;
        }

        self.docker(&["pull".to_string(), image.to_string()], dry_run)?;
        let container = self.docker(
            &[
                "create".to_string(),
                "--entrypoint".to_string(),
                "/bin/true".to_string(),
                image.to_string(),
            ],
            dry_run,
        )?;
        let container = if container.is_empty() {
            "<container>".to_string()
        } else {
            container
        };

        let copied = self.docker(
            &[
                "cp".to_string(),
                format!("{}:/{}/.", container, APP_ENT_PATH),
                target.to_string_lossy().to_string(),
            ],
            dry_run,
        );
        // the temporary container goes away even when the copy failed
        let removed = self.docker(&["rm".to_string(), container], dry_run);
        copied?;
        removed?;
        Ok(())
    }
}

/// Make sure `target` holds the bundle of `image`.
///
/// Fetches when the bundle has no manifest yet or `update` is set. Returns
/// whether a fetch happened.
pub fn ensure_bundle(
    fetcher: &dyn AppFetcher,
    image: &str,
    target: &Path,
    update: bool,
    dry_run: bool,
) -> Result<bool> {
    if target.join(MAIN_FILE).exists() && !update {
        tracing::debug!(
            "Application {} already present in {}",
            image,
            target.display()
        );
        return Ok(false);
    }
    fetcher.fetch(image, target, dry_run)?;
    Ok(true)
}
