//! Well-known names shared across the engine.
//!
//! File and directory names here are part of the on-disk contract of an
//! application bundle, so changing them breaks existing bundles.

/// Version of this tool.
pub const ATOMICAPP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Nulecule specification version this engine implements.
pub const NULECULE_SPEC_VERSION: &str = "0.0.2";

/// Manifest file at the root of every application bundle.
pub const MAIN_FILE: &str = "Nulecule";

/// Answers file looked up inside an application or answers directory.
pub const ANSWERS_FILE: &str = "answers.conf";

/// Default destination of `genanswers`.
pub const ANSWERS_FILE_SAMPLE: &str = "answers.conf.sample";

/// Work directory (relative to the application root) for rendered artifacts.
pub const WORKDIR: &str = ".workdir";

/// Directory (relative to the application root) holding external applications.
pub const EXTERNAL_APP_DIR: &str = "external";

/// Path inside an application image that holds the bundle.
pub const APP_ENT_PATH: &str = "application-entity";

/// Answer Store section shared by every component.
pub const GLOBAL_CONF: &str = "general";

/// Answer key selecting the provider.
pub const PROVIDER_KEY: &str = "provider";

/// Answer key selecting the target namespace.
pub const NAMESPACE_KEY: &str = "namespace";

/// Answer key pointing providers at their client configuration file.
pub const PROVIDER_CONFIG_KEY: &str = "provider-config";

pub const DEFAULT_PROVIDER: &str = "kubernetes";
pub const DEFAULT_NAMESPACE: &str = "default";

/// URI scheme of external graph item sources.
pub const DOCKER_SOURCE_PREFIX: &str = "docker://";

/// Environment variable naming the image to run; the application argument
/// is then the directory the image is fetched into.
pub const IMAGE_ENV: &str = "IMAGE";

/// Optional prefix of local artifact references.
pub const FILE_ARTIFACT_PREFIX: &str = "file://";

/// Answers every run starts from, before any file is loaded.
pub fn default_answers() -> [(&'static str, &'static str, &'static str); 2] {
    [
        (GLOBAL_CONF, PROVIDER_KEY, DEFAULT_PROVIDER),
        (GLOBAL_CONF, NAMESPACE_KEY, DEFAULT_NAMESPACE),
    ]
}
