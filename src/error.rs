//! Error handling module for atomicapp
//!
//! Provides centralized error handling with proper error types using thiserror.
//! Every fatal condition of a run maps onto one variant here, so callers can
//! match on the taxonomy instead of parsing messages.

use thiserror::Error;

/// Main error type for atomicapp
#[derive(Error, Debug)]
pub enum AtomicAppError {
    /// Malformed or incomplete manifest (missing graph, unnamed component, ...)
    #[error("Specification error: {0}")]
    Specification(String),

    /// The component declares no artifact set for the requested provider
    #[error("Data for provider \"{provider}\" are not part of component '{component}'")]
    ArtifactNotFound { component: String, provider: String },

    /// An `inherit` chain loops back onto a provider key already being resolved
    #[error("Cyclic artifact inheritance in component '{component}': {}", chain.join(" -> "))]
    CyclicInheritance { component: String, chain: Vec<String> },

    /// A declared parameter could not be obtained interactively
    #[error("Missing parameter '{name}' for component '{component}'")]
    MissingParameter { component: String, name: String },

    /// An artifact references a placeholder nobody could supply
    #[error("Artifact of component '{component}' contains unknown parameter {name}")]
    UnresolvedParameter { component: String, name: String },

    /// A `$` in an artifact that is neither an escape nor a placeholder
    #[error("Invalid placeholder in artifact: line {line}, col {column}")]
    InvalidPlaceholder { line: usize, column: usize },

    /// The requested provider is not registered
    #[error("Unknown provider: {name}")]
    UnknownProvider { name: String },

    /// A provider adapter failed during init, deploy or undeploy
    #[error("Provider {provider} failed: {message}")]
    ProviderFailed { provider: String, message: String },

    /// Answers could not be read or written
    #[error("Answers error: {0}")]
    Answers(String),

    /// Fetching an external application bundle failed
    #[error("Fetch error: {0}")]
    Fetch(String),

    /// IO errors (artifact files, work directory, ...)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML serialization/deserialization errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Result type alias for atomicapp operations
pub type Result<T> = std::result::Result<T, AtomicAppError>;

// Convenient error constructors
impl AtomicAppError {
    /// Create a specification error
    pub fn specification(msg: impl Into<String>) -> Self {
        Self::Specification(msg.into())
    }

    /// Create an answers error
    pub fn answers(msg: impl Into<String>) -> Self {
        Self::Answers(msg.into())
    }

    /// Create a fetch error
    pub fn fetch(msg: impl Into<String>) -> Self {
        Self::Fetch(msg.into())
    }

    /// Create a provider failure
    pub fn provider_failed(provider: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::ProviderFailed {
            provider: provider.into(),
            message: msg.into(),
        }
    }

    /// Whether this failure came from a provider adapter
    pub fn is_provider_failure(&self) -> bool {
        matches!(self, Self::ProviderFailed { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = AtomicAppError::specification("Graph not specified in Nulecule");
        assert_eq!(
            err.to_string(),
            "Specification error: Graph not specified in Nulecule"
        );

        let err = AtomicAppError::ArtifactNotFound {
            component: "db".to_string(),
            provider: "docker".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Data for provider \"docker\" are not part of component 'db'"
        );
    }

    #[test]
    fn test_cyclic_inheritance_display_shows_chain() {
        let err = AtomicAppError::CyclicInheritance {
            component: "web".to_string(),
            chain: vec!["a".to_string(), "b".to_string(), "a".to_string()],
        };
        assert!(err.to_string().ends_with("a -> b -> a"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: AtomicAppError = io_err.into();
        assert!(matches!(err, AtomicAppError::Io(_)));
    }

    #[test]
    fn test_error_constructors() {
        let err = AtomicAppError::provider_failed("kubernetes", "kubectl exited with 1");
        assert!(err.is_provider_failure());

        let err = AtomicAppError::answers("bad line");
        assert!(!err.is_provider_failure());
        assert!(matches!(err, AtomicAppError::Answers(_)));
    }
}
