//! Shared fixtures for integration tests: a provider, prompter and fetcher
//! that record what the engine asked of them.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use atomicapp::error::{AtomicAppError, Result};
use atomicapp::{AppFetcher, PromptError, Prompter, Provider, ProviderContext, ProviderRegistry};

pub type EventLog = Rc<RefCell<Vec<String>>>;

pub fn event_log() -> EventLog {
    Rc::new(RefCell::new(Vec::new()))
}

/// Provider that logs its lifecycle as `<step>:<component>`.
pub struct RecordingProvider {
    ctx: ProviderContext,
    events: EventLog,
    fail_on: Option<String>,
    artifacts: Vec<PathBuf>,
}

impl RecordingProvider {
    fn component(&self) -> String {
        self.ctx
            .dst_dir
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default()
    }

    fn record(&self, step: &str) -> Result<()> {
        let component = self.component();
        self.events
            .borrow_mut()
            .push(format!("{}:{}", step, component));
        if self.fail_on.as_deref() == Some(component.as_str()) && step != "init" {
            return Err(AtomicAppError::provider_failed(
                &self.ctx.name,
                format!("{} of {} refused", step, component),
            ));
        }
        Ok(())
    }

    pub fn artifacts(&self) -> &[PathBuf] {
        &self.artifacts
    }
}

impl Provider for RecordingProvider {
    fn name(&self) -> &str {
        &self.ctx.name
    }

    fn set_artifacts(&mut self, artifacts: Vec<PathBuf>) {
        self.artifacts = artifacts;
    }

    fn init(&mut self) -> Result<()> {
        self.record("init")
    }

    fn deploy(&mut self) -> Result<()> {
        self.record("deploy")
    }

    fn undeploy(&mut self) -> Result<()> {
        self.record("undeploy")
    }
}

/// Registry whose `kubernetes`, `openshift` and `docker` entries all record
/// into `events`. Deploy/undeploy of `fail_on` fails.
pub fn recording_registry(events: &EventLog, fail_on: Option<&str>) -> ProviderRegistry {
    let mut registry = ProviderRegistry::new();
    for name in ["kubernetes", "openshift", "docker"] {
        let events = Rc::clone(events);
        let fail_on = fail_on.map(str::to_string);
        registry.register(name, move |ctx| {
            Box::new(RecordingProvider {
                ctx,
                events: Rc::clone(&events),
                fail_on: fail_on.clone(),
                artifacts: Vec::new(),
            }) as Box<dyn Provider>
        });
    }
    registry
}

/// Prompter answering from a fixed table, remembering every question.
#[derive(Default)]
pub struct ScriptedPrompter {
    answers: BTreeMap<String, String>,
    pub asked: Vec<String>,
}

impl ScriptedPrompter {
    pub fn new(answers: &[(&str, &str)]) -> Self {
        Self {
            answers: answers
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            asked: Vec::new(),
        }
    }
}

impl Prompter for ScriptedPrompter {
    fn ask(
        &mut self,
        name: &str,
        _description: &str,
        _default: Option<&str>,
    ) -> std::result::Result<String, PromptError> {
        self.asked.push(name.to_string());
        self.answers
            .get(name)
            .cloned()
            .ok_or(PromptError::EndOfInput)
    }
}

/// Fetcher materialising bundles from in-memory fixtures.
pub struct RecordingFetcher {
    events: EventLog,
    bundles: BTreeMap<String, Vec<(String, String)>>,
}

impl RecordingFetcher {
    pub fn new(events: &EventLog) -> Self {
        Self {
            events: Rc::clone(events),
            bundles: BTreeMap::new(),
        }
    }

    /// Register the files of the bundle shipped in `image`.
    pub fn with_bundle(mut self, image: &str, files: &[(&str, &str)]) -> Self {
        self.bundles.insert(
            image.to_string(),
            files
                .iter()
                .map(|(p, c)| (p.to_string(), c.to_string()))
                .collect(),
        );
        self
    }
}

impl AppFetcher for RecordingFetcher {
    fn fetch(&self, image: &str, target: &Path, _dry_run: bool) -> Result<()> {
        self.events.borrow_mut().push(format!("fetch:{}", image));
        let files = self
            .bundles
            .get(image)
            .ok_or_else(|| AtomicAppError::fetch(format!("no such image {}", image)))?;
        write_files(target, files.iter().map(|(p, c)| (p.as_str(), c.as_str())));
        Ok(())
    }
}

/// Write `files` (relative path, content) below `root`.
pub fn write_files<'a>(root: &Path, files: impl IntoIterator<Item = (&'a str, &'a str)>) {
    for (path, content) in files {
        let full = root.join(path);
        std::fs::create_dir_all(full.parent().unwrap()).unwrap();
        std::fs::write(full, content).unwrap();
    }
}

/// Create an application directory with a `Nulecule` and extra files.
pub fn create_app(root: &Path, nulecule: &str, files: &[(&str, &str)]) -> PathBuf {
    std::fs::create_dir_all(root).unwrap();
    std::fs::write(root.join("Nulecule"), nulecule).unwrap();
    write_files(root, files.iter().copied());
    root.to_path_buf()
}

pub fn events(log: &EventLog) -> Vec<String> {
    log.borrow().clone()
}
