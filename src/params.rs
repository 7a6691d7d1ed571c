//! Parameter Resolver
//!
//! Produces the final configuration of one component by layering, lowest to
//! highest precedence:
//!
//! 1. defaults declared in the manifest
//! 2. the Answer Store `general` section
//! 3. the Answer Store section named after the component
//!
//! Declared parameters still lacking a value are prompted for, unless the
//! caller asked to skip interaction (teardown runs). Every prompted value is
//! written back into the component's section right away, so later artifacts
//! of the same component reuse it without asking again. Once resolution is
//! done, every declared parameter that ended up with a value is recorded in
//! the component's section as well.

use std::collections::BTreeMap;

use crate::answers::AnswerStore;
use crate::error::{AtomicAppError, Result};
use crate::manifest::Param;
use crate::prompt::{PromptError, Prompter};

/// Final `parameter -> value` mapping of one component.
pub type ResolvedConfig = BTreeMap<String, String>;

/// How interactive resolution may be.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolveMode {
    /// Leave unresolved parameters absent instead of prompting
    pub skip_interactive: bool,
    /// Prompt for every declared parameter, offering the current value
    pub ask_all: bool,
}

impl ResolveMode {
    pub fn interactive() -> Self {
        Self::default()
    }

    pub fn skip_interactive() -> Self {
        Self {
            skip_interactive: true,
            ask_all: false,
        }
    }
}

/// Resolve the configuration of `component`.
///
/// # Errors
///
/// `MissingParameter` when a prompt is needed and the channel is unavailable,
/// hits end of input, or yields an empty value.
pub fn resolve(
    component: &str,
    params: &[Param],
    store: &mut AnswerStore,
    prompter: &mut dyn Prompter,
    mode: ResolveMode,
) -> Result<ResolvedConfig> {
    let mut config = layered_config(component, params, store);

    if mode.skip_interactive {
        record_resolved(component, params, &config, store);
        return Ok(config);
    }

    for param in params {
        let current = config.get(&param.name).cloned();
        if current.is_some() && !mode.ask_all {
            continue;
        }

        let description = param
            .description
            .clone()
            .unwrap_or_else(|| format!("Value for parameter '{}'", param.name));
        let answer = ask_and_record(
            component,
            &param.name,
            &description,
            current.as_deref(),
            store,
            prompter,
        );
        match answer {
            Ok(Some(value)) => {
                config.insert(param.name.clone(), value);
            }
            Ok(None) => {
                return Err(AtomicAppError::MissingParameter {
                    component: component.to_string(),
                    name: param.name.clone(),
                });
            }
            Err(e) => {
                tracing::debug!("Prompt for '{}' failed: {}", param.name, e);
                return Err(AtomicAppError::MissingParameter {
                    component: component.to_string(),
                    name: param.name.clone(),
                });
            }
        }
    }

    record_resolved(component, params, &config, store);
    Ok(config)
}

/// Persist every declared parameter that has a value into the component's
/// section, so later lookups and the answers output see it.
fn record_resolved(
    component: &str,
    params: &[Param],
    config: &ResolvedConfig,
    store: &mut AnswerStore,
) {
    for param in params {
        if let Some(value) = config.get(&param.name) {
            store.set(component, &param.name, value.as_str());
        }
    }
}

/// Merge defaults, general answers and component answers without prompting.
pub fn layered_config(component: &str, params: &[Param], store: &AnswerStore) -> ResolvedConfig {
    let mut config: ResolvedConfig = params
        .iter()
        .filter_map(|p| p.default.clone().map(|d| (p.name.clone(), d)))
        .collect();

    if let Some(general) = store.general() {
        config.extend(general.iter().map(|(k, v)| (k.clone(), v.clone())));
    }
    if let Some(section) = store.section(component) {
        config.extend(section.iter().map(|(k, v)| (k.clone(), v.clone())));
    }
    config
}

/// Prompt for one value and record it in the component's answers.
///
/// Returns `Ok(None)` for an empty answer, which is never recorded.
pub fn ask_and_record(
    component: &str,
    name: &str,
    description: &str,
    default: Option<&str>,
    store: &mut AnswerStore,
    prompter: &mut dyn Prompter,
) -> std::result::Result<Option<String>, PromptError> {
    let value = prompter.ask(name, description, default)?;
    if value.is_empty() {
        return Ok(None);
    }
    store.set(component, name, value.clone());
    Ok(Some(value))
}
