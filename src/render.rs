//! Artifact Renderer
//!
//! Substitutes `$name` / `${name}` placeholders in raw artifact text with the
//! component's resolved configuration. `$$` stands for a literal `$`.
//! Substitution is flat: substituted values are never scanned again.
//!
//! When an artifact needs a value nobody supplied, the renderer asks for it
//! (even on runs that otherwise skip prompting, since the artifact cannot be
//! produced without it), records the answer and retries. Each retry must make
//! progress: a name is asked for at most once per render.

use regex::{Captures, Regex};
use std::collections::BTreeSet;
use std::sync::OnceLock;

use crate::answers::AnswerStore;
use crate::constants::MAIN_FILE;
use crate::error::{AtomicAppError, Result};
use crate::params::{ResolvedConfig, ask_and_record};
use crate::prompt::Prompter;
use crate::status::print_error_status;

static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();

fn placeholder_regex() -> &'static Regex {
    PLACEHOLDER.get_or_init(|| {
        Regex::new(
            r"\$(?:(?P<escaped>\$)|(?P<named>[_a-zA-Z][_a-zA-Z0-9]*)|\{(?P<braced>[_a-zA-Z][_a-zA-Z0-9]*)\}|(?P<invalid>))",
        )
        .expect("placeholder regex")
    })
}

/// Why a single substitution pass failed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Substitution {
    /// First placeholder without a value
    Missing(String),
    /// A `$` that starts neither an escape nor a placeholder (1-based position)
    Invalid { line: usize, column: usize },
}

/// One substitution pass over `template`.
pub fn substitute(
    template: &str,
    config: &ResolvedConfig,
) -> std::result::Result<String, Substitution> {
    let mut out = String::with_capacity(template.len());
    let mut last = 0;

    for caps in placeholder_regex().captures_iter(template) {
        let whole = caps.get(0).expect("group 0 always matches");
        out.push_str(&template[last..whole.start()]);
        last = whole.end();
        out.push_str(&replacement(&caps, template, whole.start(), config)?);
    }

    out.push_str(&template[last..]);
    Ok(out)
}

fn replacement(
    caps: &Captures<'_>,
    template: &str,
    offset: usize,
    config: &ResolvedConfig,
) -> std::result::Result<String, Substitution> {
    if caps.name("escaped").is_some() {
        return Ok("$".to_string());
    }
    if let Some(name) = caps.name("named").or_else(|| caps.name("braced")) {
        return config
            .get(name.as_str())
            .cloned()
            .ok_or_else(|| Substitution::Missing(name.as_str().to_string()));
    }

    let prefix = &template[..offset];
    let line = prefix.matches('\n').count() + 1;
    let column = prefix
        .rsplit_once('\n')
        .map(|(_, tail)| tail)
        .unwrap_or(prefix)
        .chars()
        .count()
        + 1;
    Err(Substitution::Invalid { line, column })
}

/// Render `raw` for `component`, prompting for placeholders without a value.
///
/// Newly obtained values are added to `config` and to the component's
/// section of `store`, so the rest of the component's artifacts reuse them.
///
/// # Errors
///
/// - `UnresolvedParameter` when a missing value cannot be obtained (empty
///   answer, no interactive channel, end of input) or no progress is made
/// - `InvalidPlaceholder` for malformed `$` usage
pub fn render(
    raw: &str,
    component: &str,
    config: &mut ResolvedConfig,
    store: &mut AnswerStore,
    prompter: &mut dyn Prompter,
) -> Result<String> {
    let mut asked: BTreeSet<String> = BTreeSet::new();

    loop {
        let name = match substitute(raw, config) {
            Ok(output) => return Ok(output),
            Err(Substitution::Invalid { line, column }) => {
                return Err(AtomicAppError::InvalidPlaceholder { line, column });
            }
            Err(Substitution::Missing(name)) => name,
        };

        let unresolved = || AtomicAppError::UnresolvedParameter {
            component: component.to_string(),
            name: name.clone(),
        };

        if !asked.insert(name.clone()) {
            return Err(unresolved());
        }

        tracing::debug!("Artifact contains unknown parameter {}, asking for it", name);
        let description = format!(
            "Missing parameter '{}', provide the value or fix your {}",
            name, MAIN_FILE
        );
        match ask_and_record(component, &name, &description, None, store, prompter) {
            Ok(Some(value)) => {
                config.insert(name.clone(), value);
            }
            Ok(None) => {
                print_error_status(format!("Artifact contains unknown parameter {}.", name));
                return Err(unresolved());
            }
            Err(e) => {
                tracing::debug!("Prompt for '{}' failed: {}", name, e);
                print_error_status(format!("Artifact contains unknown parameter {}.", name));
                return Err(unresolved());
            }
        }
    }
}
