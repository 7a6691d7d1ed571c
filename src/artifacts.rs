//! Artifact Resolver (inheritance expansion)
//!
//! Flattens a component's artifact set for one provider key into an ordered
//! list of concrete artifact paths, relative to the application root.
//!
//! # Resolution Rules
//!
//! | Entry | Expands to |
//! |-------|------------|
//! | file path | itself |
//! | directory path | the files directly inside it, sorted by name |
//! | `inherit: [k1, k2]` | the full expansion of `k1`, then of `k2`, in place |
//!
//! Expansion is depth-first and order-preserving. An inheritance chain that
//! revisits a key already being expanded fails with `CyclicInheritance`.
//! Resolution only reads the filesystem.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::{AtomicAppError, Result};
use crate::manifest::ArtifactEntry;

/// Flat artifact list of one component plus where its rendered copies go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedArtifacts {
    /// Artifact paths relative to the application root, in deployment order
    pub paths: Vec<PathBuf>,
    /// `<workdir>/<component>`; rendered artifacts mirror `paths` below it
    pub dst_dir: PathBuf,
}

impl ResolvedArtifacts {
    /// Destination of one rendered artifact.
    pub fn destination(&self, artifact: &Path) -> PathBuf {
        self.dst_dir.join(artifact)
    }
}

/// Resolve the artifacts of `component` for `provider_key`.
pub fn resolve_artifacts(
    app_path: &Path,
    workdir: &Path,
    component: &str,
    sets: &BTreeMap<String, Vec<ArtifactEntry>>,
    provider_key: &str,
) -> Result<ResolvedArtifacts> {
    let mut paths = Vec::new();
    let mut chain = Vec::new();
    expand(app_path, component, sets, provider_key, &mut chain, &mut paths)?;

    Ok(ResolvedArtifacts {
        paths,
        dst_dir: workdir.join(component),
    })
}

fn expand(
    app_path: &Path,
    component: &str,
    sets: &BTreeMap<String, Vec<ArtifactEntry>>,
    key: &str,
    chain: &mut Vec<String>,
    out: &mut Vec<PathBuf>,
) -> Result<()> {
    if chain.iter().any(|k| k == key) {
        let mut cycle = chain.clone();
        cycle.push(key.to_string());
        return Err(AtomicAppError::CyclicInheritance {
            component: component.to_string(),
            chain: cycle,
        });
    }

    let entries = sets.get(key).ok_or_else(|| AtomicAppError::ArtifactNotFound {
        component: component.to_string(),
        provider: key.to_string(),
    })?;

    chain.push(key.to_string());
    for entry in entries {
        match entry {
            ArtifactEntry::Inherit { inherit } => {
                tracing::debug!("Inheriting from {:?}", inherit);
                for parent in inherit {
                    expand(app_path, component, sets, parent, chain, out)?;
                }
            }
            ArtifactEntry::Path(_) => {
                let Some(rel) = entry.local_path() else {
                    continue;
                };
                let full = app_path.join(&rel);
                if full.is_dir() {
                    out.extend(list_dir_files(&full)?.into_iter().map(|f| rel.join(f)));
                } else {
                    out.push(rel);
                }
            }
        }
    }
    chain.pop();

    Ok(())
}

/// Regular files directly inside `dir`, sorted by file name.
fn list_dir_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            tracing::debug!("Skipping nested directory {}", entry.path().display());
            continue;
        }
        files.push(PathBuf::from(entry.file_name()));
    }
    files.sort();
    Ok(files)
}
