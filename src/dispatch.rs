//! Graph Dispatcher
//!
//! Walks a Nulecule graph in manifest order. Local components go through
//! parameter resolution, artifact resolution, rendering and the provider
//! lifecycle; external components run as nested invocations of the same
//! engine, rooted at `<app>/external/<component>`.
//!
//! # Run Flow
//!
//! ```text
//! run (top level)
//!  ├── fetch bundle (image given, manifest missing or --update)
//!  ├── load answers (defaults < answers file < --provider)
//!  ├── run_app
//!  │    ├── load Nulecule, check version, check artifacts
//!  │    └── for each graph item, in order
//!  │         ├── external → run_app(nested options)
//!  │         └── local    → process_component
//!  └── write answers output (once)
//! ```
//!
//! The Answer Store is shared by `&mut` across the whole tree of nested runs,
//! so answers collected by an external application are visible to the parent
//! and end up in the single output file.

use std::path::{Path, PathBuf};

use crate::answers::{AnswerStore, AnswersFormat, answers_path};
use crate::artifacts::resolve_artifacts;
use crate::constants::{
    ANSWERS_FILE, ANSWERS_FILE_SAMPLE, DEFAULT_PROVIDER, EXTERNAL_APP_DIR, GLOBAL_CONF, MAIN_FILE,
    PROVIDER_KEY, WORKDIR,
};
use crate::error::{AtomicAppError, Result};
use crate::fetch::{AppFetcher, ensure_bundle};
use crate::manifest::{GraphItem, Nulecule};
use crate::params::{ResolveMode, resolve};
use crate::prompt::Prompter;
use crate::provider::{ProviderContext, ProviderRegistry};
use crate::render::render;
use crate::status::{print_error_status, print_status, print_success};

/// Settings of one invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunOptions {
    /// Application root (holds `Nulecule`)
    pub app_path: PathBuf,
    /// Image to fetch the bundle from when the root has none
    pub image: Option<String>,
    /// Answers file, or directory containing `answers.conf`
    pub answers: Option<PathBuf>,
    /// Where to write the Answer Store after the run
    pub answers_output: Option<PathBuf>,
    pub answers_format: AnswersFormat,
    /// Overrides `general.provider`
    pub provider: Option<String>,
    /// Overrides `<app>/.workdir`
    pub workdir: Option<PathBuf>,
    pub dry_run: bool,
    /// Undeploy instead of deploy
    pub stop: bool,
    /// Prompt for every declared parameter
    pub ask: bool,
    /// Re-fetch bundles that are already present
    pub update: bool,
}

impl RunOptions {
    pub fn new(app_path: impl Into<PathBuf>) -> Self {
        Self {
            app_path: app_path.into(),
            ..Self::default()
        }
    }

    /// Directory rendered artifacts are written below.
    pub fn workdir(&self) -> PathBuf {
        self.workdir
            .clone()
            .unwrap_or_else(|| self.app_path.join(WORKDIR))
    }

    /// Options of the nested run for an external component.
    ///
    /// The nested run shares the parent's work directory and never writes
    /// the answers output itself.
    pub fn for_external(&self, component: &str, image: String) -> Self {
        Self {
            app_path: self.app_path.join(EXTERNAL_APP_DIR).join(component),
            image: Some(image),
            answers_output: None,
            workdir: Some(self.workdir()),
            ..self.clone()
        }
    }

    fn resolve_mode(&self) -> ResolveMode {
        if self.stop {
            ResolveMode::skip_interactive()
        } else {
            ResolveMode {
                skip_interactive: false,
                ask_all: self.ask,
            }
        }
    }
}

/// Effective provider name: override, then answers, then the default.
pub fn provider_name(options: &RunOptions, store: &AnswerStore) -> String {
    options
        .provider
        .clone()
        .unwrap_or_else(|| store.get_or(GLOBAL_CONF, PROVIDER_KEY, DEFAULT_PROVIDER))
}

/// Collaborators of a run.
pub struct Engine<'a> {
    registry: &'a ProviderRegistry,
    prompter: &'a mut dyn Prompter,
    fetcher: &'a dyn AppFetcher,
}

impl<'a> Engine<'a> {
    pub fn new(
        registry: &'a ProviderRegistry,
        prompter: &'a mut dyn Prompter,
        fetcher: &'a dyn AppFetcher,
    ) -> Self {
        Self {
            registry,
            prompter,
            fetcher,
        }
    }

    /// Top-level invocation. Returns the final Answer Store.
    pub fn run(&mut self, options: &RunOptions) -> Result<AnswerStore> {
        self.fetch_bundle(options)?;

        let mut store = AnswerStore::with_defaults();
        load_answers(options, &mut store)?;
        if let Some(provider) = &options.provider {
            store.set(GLOBAL_CONF, PROVIDER_KEY, provider.as_str());
        }

        self.run_app(options, &mut store)?;

        if let Some(output) = &options.answers_output {
            store.serialize(output, options.answers_format)?;
        }
        Ok(store)
    }

    fn fetch_bundle(&self, options: &RunOptions) -> Result<()> {
        if let Some(image) = &options.image {
            ensure_bundle(
                self.fetcher,
                image,
                &options.app_path,
                options.update,
                options.dry_run,
            )?;
        }
        Ok(())
    }

    /// Run the application at `options.app_path` against a shared store.
    pub fn run_app(&mut self, options: &RunOptions, store: &mut AnswerStore) -> Result<()> {
        let nulecule = Nulecule::load_from_dir(&options.app_path)?;
        nulecule.check_spec_version();
        nulecule.check_all_artifacts(&options.app_path)?;

        let action = if options.stop { "Undeploying" } else { "Deploying" };
        print_status(format!(
            "{} {}",
            action,
            nulecule.id.as_deref().unwrap_or("application")
        ));
        self.dispatch_graph(&nulecule, options, store)?;
        print_success(format!(
            "{} {} complete",
            action,
            nulecule.id.as_deref().unwrap_or("application")
        ));
        Ok(())
    }

    fn dispatch_graph(
        &mut self,
        nulecule: &Nulecule,
        options: &RunOptions,
        store: &mut AnswerStore,
    ) -> Result<()> {
        let graph = nulecule.graph()?;
        let names = component_names(graph)?;

        for (item, name) in graph.iter().zip(names) {
            match item.source_image()? {
                Some(image) => self.run_external(name, image, options, store)?,
                None => self.process_component(name, item, options, store)?,
            }
        }
        Ok(())
    }

    fn run_external(
        &mut self,
        name: &str,
        image: String,
        options: &RunOptions,
        store: &mut AnswerStore,
    ) -> Result<()> {
        let nested = options.for_external(name, image);
        tracing::info!(
            "Running external application {} from {}",
            name,
            nested.image.as_deref().unwrap_or_default()
        );
        self.fetch_bundle(&nested)?;

        if options.dry_run && !nested.app_path.join(MAIN_FILE).exists() {
            tracing::warn!(
                "Skipping external application {}: bundle not fetched in dry-run",
                name
            );
            return Ok(());
        }
        self.run_app(&nested, store)
    }

    /// Resolve, render and hand one local component to its provider.
    pub fn process_component(
        &mut self,
        name: &str,
        item: &GraphItem,
        options: &RunOptions,
        store: &mut AnswerStore,
    ) -> Result<()> {
        let registry = self.registry;
        let provider_key = provider_name(options, store);
        let factory = registry.get(&provider_key)?;
        tracing::info!("Processing component {} with provider {}", name, provider_key);

        let mut config = resolve(
            name,
            &item.params,
            store,
            &mut *self.prompter,
            options.resolve_mode(),
        )?;

        let workdir = options.workdir();
        let mut provider = factory(ProviderContext {
            name: provider_key.clone(),
            config: config.clone(),
            dst_dir: workdir.join(name),
            dry_run: options.dry_run,
        });

        let artifacts =
            resolve_artifacts(&options.app_path, &workdir, name, &item.artifacts, &provider_key)?;

        for artifact in &artifacts.paths {
            tracing::debug!("Rendering {} for {}", artifact.display(), name);
            let raw = provider.load_artifact(&options.app_path.join(artifact))?;
            let rendered = render(&raw, name, &mut config, store, &mut *self.prompter)?;
            provider.save_artifact(&artifacts.destination(artifact), &rendered)?;
        }
        provider.set_artifacts(artifacts.paths);

        let lifecycle = provider.init().and_then(|()| {
            if options.stop {
                provider.undeploy()
            } else {
                provider.deploy()
            }
        });
        if let Err(e) = lifecycle {
            if e.is_provider_failure() {
                print_error_status(&e);
                tracing::error!("Component {} failed: {}", name, e);
            }
            return Err(e);
        }

        print_success(format!("Component {} done", name));
        Ok(())
    }
}

/// Names of all graph items, or a specification error for the first one
/// without a usable name.
fn component_names(graph: &[GraphItem]) -> Result<Vec<&str>> {
    graph
        .iter()
        .enumerate()
        .map(|(idx, item)| match item.name.as_deref() {
            Some(name) if !name.trim().is_empty() => Ok(name),
            _ => Err(AtomicAppError::specification(format!(
                "Component name missing in graph item {}",
                idx + 1
            ))),
        })
        .collect()
}

/// Merge the configured answers source into `store`.
///
/// An explicit source must exist. Without one, `<app>/answers.conf` is used
/// when present.
pub fn load_answers(options: &RunOptions, store: &mut AnswerStore) -> Result<()> {
    match &options.answers {
        Some(source) => {
            let path = answers_path(source);
            if !path.exists() {
                return Err(AtomicAppError::answers(format!(
                    "Provided answers file does not exist: {}",
                    path.display()
                )));
            }
            store.load(&path, options.answers_format)
        }
        None => {
            let default = options.app_path.join(ANSWERS_FILE);
            if default.is_file() {
                store.load(&default, options.answers_format)
            } else {
                tracing::debug!("No answers file at {}", default.display());
                Ok(())
            }
        }
    }
}

/// Sample answers: general defaults plus each local component's defaults.
pub fn sample_answers(nulecule: &Nulecule) -> Result<AnswerStore> {
    let mut store = AnswerStore::with_defaults();
    let graph = nulecule.graph()?;
    for (item, name) in graph.iter().zip(component_names(graph)?) {
        if item.is_external() {
            continue;
        }
        for (key, value) in item.defaults() {
            store.set(name, &key, value);
        }
    }
    Ok(store)
}

/// Write a sample answers file for the application; returns its path.
pub fn generate_answers(
    options: &RunOptions,
    fetcher: &dyn AppFetcher,
    output: Option<&Path>,
) -> Result<PathBuf> {
    if let Some(image) = &options.image {
        ensure_bundle(fetcher, image, &options.app_path, options.update, false)?;
    }
    let nulecule = Nulecule::load_from_dir(&options.app_path)?;
    nulecule.check_spec_version();
    let store = sample_answers(&nulecule)?;

    let destination = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| options.app_path.join(ANSWERS_FILE_SAMPLE));
    store.serialize(&destination, options.answers_format)?;
    Ok(destination)
}
