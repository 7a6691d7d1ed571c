//! Atomic App Library
//!
//! Deploys applications described by a Nulecule graph: components are
//! resolved in order, external applications run as nested invocations, and
//! each local component's artifacts are rendered and handed to a provider.

pub mod answers;
pub mod artifacts;
pub mod cli;
pub mod constants;
pub mod dispatch;
pub mod error;
pub mod fetch;
pub mod manifest;
pub mod params;
pub mod prompt;
pub mod provider;
pub mod render;
pub mod status;

// Re-export main types for convenience
pub use answers::{AnswerStore, AnswersFormat};
pub use artifacts::{ResolvedArtifacts, resolve_artifacts};
pub use dispatch::{Engine, RunOptions, generate_answers};
pub use error::{AtomicAppError, Result};
pub use fetch::{AppFetcher, DockerFetcher};
pub use manifest::{ArtifactEntry, GraphItem, Nulecule, Param};
pub use params::{ResolveMode, ResolvedConfig};
pub use prompt::{NonInteractive, PromptError, Prompter, TerminalPrompter};
pub use provider::{Provider, ProviderContext, ProviderRegistry};
pub use render::render;
