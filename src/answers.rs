//! Answer Store: the two-level `section -> key -> value` configuration.
//!
//! The `general` section holds values shared by every component; every other
//! section is named after a graph component. One store is shared by reference
//! across a whole run, including nested runs for external applications, and
//! only ever grows: keys are added or overwritten, never removed.
//!
//! # Formats
//!
//! | Format | Shape |
//! |--------|-------|
//! | `ini`  | `[section]` headers followed by `key = value` lines |
//! | `json` | `{"section": {"key": "value"}}` |
//! | `yaml` | `section:` mappings of `key: value` |
//!
//! Non-string scalars in JSON/YAML are stringified on load.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use strum::{Display, EnumIter, EnumString};

use crate::constants::{ANSWERS_FILE, GLOBAL_CONF, default_answers};
use crate::error::{AtomicAppError, Result};

/// Serialization format of an answers file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[derive(Display, EnumString, EnumIter, clap::ValueEnum)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum AnswersFormat {
    #[default]
    Ini,
    Json,
    Yaml,
}

impl AnswersFormat {
    /// Pick the format from a file extension, falling back to `fallback`.
    pub fn for_path(path: &Path, fallback: AnswersFormat) -> AnswersFormat {
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => AnswersFormat::Json,
            Some("yaml") | Some("yml") => AnswersFormat::Yaml,
            Some("ini") | Some("conf") => AnswersFormat::Ini,
            _ => fallback,
        }
    }
}

/// Hierarchical answers shared across one invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnswerStore {
    sections: BTreeMap<String, BTreeMap<String, String>>,
}

impl AnswerStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store seeded with the default `general` answers.
    pub fn with_defaults() -> Self {
        let mut store = Self::new();
        for (section, key, value) in default_answers() {
            store.set(section, key, value);
        }
        store
    }

    /// Look up `key` in `section`.
    pub fn get(&self, section: &str, key: &str) -> Option<&str> {
        self.sections
            .get(section)
            .and_then(|s| s.get(key))
            .map(String::as_str)
    }

    /// Look up `key` in `section`, returning `default` when absent.
    pub fn get_or(&self, section: &str, key: &str, default: &str) -> String {
        self.get(section, key).unwrap_or(default).to_string()
    }

    /// Set `key` in `section`, creating the section on first use.
    pub fn set(&mut self, section: &str, key: &str, value: impl Into<String>) {
        self.sections
            .entry(section.to_string())
            .or_default()
            .insert(key.to_string(), value.into());
    }

    /// All answers of one section, if any were recorded.
    pub fn section(&self, section: &str) -> Option<&BTreeMap<String, String>> {
        self.sections.get(section)
    }

    /// The shared `general` section.
    pub fn general(&self) -> Option<&BTreeMap<String, String>> {
        self.section(GLOBAL_CONF)
    }

    pub fn is_empty(&self) -> bool {
        self.sections.values().all(BTreeMap::is_empty)
    }

    /// Merge `other` into this store; values in `other` win.
    pub fn merge(&mut self, other: &AnswerStore) {
        for (section, values) in &other.sections {
            let target = self.sections.entry(section.clone()).or_default();
            for (key, value) in values {
                target.insert(key.clone(), value.clone());
            }
        }
    }

    /// Merge answers from a file, or from `answers.conf` inside a directory.
    ///
    /// The format comes from the file extension when recognised, otherwise
    /// from `format`.
    pub fn load(&mut self, source: &Path, format: AnswersFormat) -> Result<()> {
        let path = answers_path(source);
        let content = fs::read_to_string(&path).map_err(|e| {
            AtomicAppError::answers(format!("failed to read {}: {}", path.display(), e))
        })?;
        let format = AnswersFormat::for_path(&path, format);
        let loaded = Self::parse(&content, format)?;
        tracing::debug!("Loaded answers from {} ({})", path.display(), format);
        self.merge(&loaded);
        Ok(())
    }

    /// Parse answers text in the given format.
    pub fn parse(content: &str, format: AnswersFormat) -> Result<Self> {
        match format {
            AnswersFormat::Ini => parse_ini(content),
            AnswersFormat::Json => {
                let raw: BTreeMap<String, BTreeMap<String, serde_json::Value>> =
                    serde_json::from_str(content)?;
                Ok(Self::from_raw(raw, json_scalar))
            }
            AnswersFormat::Yaml => {
                let raw: Option<BTreeMap<String, BTreeMap<String, serde_yaml::Value>>> =
                    serde_yaml::from_str(content)?;
                Ok(Self::from_raw(raw.unwrap_or_default(), yaml_scalar))
            }
        }
    }

    /// Render the store in the given format.
    pub fn to_format_string(&self, format: AnswersFormat) -> Result<String> {
        match format {
            AnswersFormat::Ini => Ok(self.to_ini()),
            AnswersFormat::Json => Ok(serde_json::to_string_pretty(&self.sections)?),
            AnswersFormat::Yaml => Ok(serde_yaml::to_string(&self.sections)?),
        }
    }

    /// Write the store to `destination`.
    pub fn serialize(&self, destination: &Path, format: AnswersFormat) -> Result<()> {
        let format = AnswersFormat::for_path(destination, format);
        let content = self.to_format_string(format)?;
        if let Some(parent) = destination.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(destination, content)?;
        tracing::info!("Wrote answers to {}", destination.display());
        Ok(())
    }

    fn from_raw<V>(
        raw: BTreeMap<String, BTreeMap<String, V>>,
        scalar: fn(&V) -> Option<String>,
    ) -> Self {
        let mut store = Self::new();
        for (section, values) in raw {
            // keep empty sections so a component can be pinned without values
            store.sections.entry(section.clone()).or_default();
            for (key, value) in values {
                if let Some(value) = scalar(&value) {
                    store.set(&section, &key, value);
                }
            }
        }
        store
    }

    /// `general` leads; the component sections follow in name order.
    fn to_ini(&self) -> String {
        let general = self.sections.get_key_value(GLOBAL_CONF);
        let others = self.sections.iter().filter(|(name, _)| *name != GLOBAL_CONF);
        let mut out = String::new();
        for (section, values) in general.into_iter().chain(others) {
            if !out.is_empty() {
                out.push('\n');
            }
            out.push_str(&format!("[{}]\n", section));
            for (key, value) in values {
                out.push_str(&format!("{} = {}\n", key, value));
            }
        }
        out
    }
}

/// Resolve an answers source to a file path.
pub fn answers_path(source: &Path) -> PathBuf {
    if source.is_dir() {
        source.join(ANSWERS_FILE)
    } else {
        source.to_path_buf()
    }
}

fn parse_ini(content: &str) -> Result<AnswerStore> {
    let mut store = AnswerStore::new();
    let mut current: Option<String> = None;

    for (idx, raw_line) in content.lines().enumerate() {
        let line = raw_line.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
            continue;
        }

        if let Some(rest) = line.strip_prefix('[') {
            let name = rest.strip_suffix(']').ok_or_else(|| {
                AtomicAppError::answers(format!("line {}: unterminated section header", idx + 1))
            })?;
            let name = name.trim().to_string();
            store.sections.entry(name.clone()).or_default();
            current = Some(name);
            continue;
        }

        let section = current.as_deref().ok_or_else(|| {
            AtomicAppError::answers(format!("line {}: value outside of any section", idx + 1))
        })?;

        let split_at = line.find(['=', ':']).ok_or_else(|| {
            AtomicAppError::answers(format!("line {}: expected `key = value`", idx + 1))
        })?;
        let key = line[..split_at].trim();
        let value = line[split_at + 1..].trim();
        if key.is_empty() {
            return Err(AtomicAppError::answers(format!(
                "line {}: empty key",
                idx + 1
            )));
        }
        store.set(section, key, value);
    }

    Ok(store)
}

fn json_scalar(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::Null => None,
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Bool(b) => Some(b.to_string()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        other => Some(other.to_string()),
    }
}

pub(crate) fn yaml_scalar(value: &serde_yaml::Value) -> Option<String> {
    match value {
        serde_yaml::Value::Null => None,
        serde_yaml::Value::String(s) => Some(s.clone()),
        serde_yaml::Value::Bool(b) => Some(b.to_string()),
        serde_yaml::Value::Number(n) => Some(n.to_string()),
        other => serde_yaml::to_string(other)
            .ok()
            .map(|s| s.trim_end().to_string()),
    }
}
