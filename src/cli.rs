use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};

use crate::answers::AnswersFormat;
use crate::constants::{DOCKER_SOURCE_PREFIX, IMAGE_ENV};
use crate::dispatch::RunOptions;

/// Atomic App - deploy Nulecule applications
#[derive(Parser, Debug)]
#[command(name = "atomicapp")]
#[command(about = "Deploy multi-component container applications described by a Nulecule graph")]
#[command(version)]
pub struct Cli {
    /// Show debug output
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only show warnings and errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Deploy an application
    Run {
        #[command(flatten)]
        app: AppArgs,

        /// Ask for every parameter, even ones that already have a value
        #[arg(long)]
        ask: bool,

        /// Write the final answers to this file
        #[arg(long)]
        answers_output: Option<PathBuf>,
    },
    /// Undeploy an application
    Stop {
        #[command(flatten)]
        app: AppArgs,
    },
    /// Write a sample answers file for an application
    #[command(name = "genanswers")]
    GenAnswers {
        /// Application directory or image
        app: String,

        /// Answers file format
        #[arg(long, value_enum, default_value_t)]
        answers_format: AnswersFormat,

        /// Destination (default: answers.conf.sample in the application directory)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Directory an image is fetched into (default: current directory)
        #[arg(long)]
        target: Option<PathBuf>,
    },
}

/// Arguments shared by `run` and `stop`.
#[derive(Args, Debug, Clone)]
pub struct AppArgs {
    /// Application directory, or image to fetch the application from
    pub app: String,

    /// Answers file, or directory containing answers.conf
    #[arg(short, long)]
    pub answers: Option<PathBuf>,

    /// Provider to deploy with (kubernetes, openshift, docker)
    #[arg(short, long)]
    pub provider: Option<String>,

    /// Show what would be executed without changing anything
    #[arg(long)]
    pub dry_run: bool,

    /// Re-fetch application images that are already present
    #[arg(long)]
    pub update: bool,

    /// Answers file format
    #[arg(long, value_enum, default_value_t)]
    pub answers_format: AnswersFormat,

    /// Work directory for rendered artifacts (default: <app>/.workdir)
    #[arg(long)]
    pub workdir: Option<PathBuf>,

    /// Directory an image is fetched into (default: current directory)
    #[arg(long)]
    pub target: Option<PathBuf>,
}

impl AppArgs {
    /// Build run options; `cwd` is the fallback fetch target for images.
    ///
    /// `image_override` (the `IMAGE` environment variable) names the image to
    /// run and turns `app` into the directory it is fetched into.
    pub fn to_options(&self, cwd: &Path, image_override: Option<&str>) -> RunOptions {
        let (app_path, image) = match image_override {
            Some(image) => {
                tracing::warn!("Setting image to {} from ${}", image, IMAGE_ENV);
                (PathBuf::from(&self.app), Some(strip_source_scheme(image)))
            }
            None => locate_app(&self.app, self.target.as_deref(), cwd),
        };
        RunOptions {
            app_path,
            image,
            answers: self.answers.clone(),
            answers_format: self.answers_format,
            provider: self.provider.clone(),
            workdir: self.workdir.clone(),
            dry_run: self.dry_run,
            update: self.update,
            ..RunOptions::default()
        }
    }
}

/// An existing directory is the application itself; anything else is an
/// image reference to fetch into `target` (or `cwd`).
pub fn locate_app(app: &str, target: Option<&Path>, cwd: &Path) -> (PathBuf, Option<String>) {
    let path = Path::new(app);
    if path.is_dir() {
        return (path.to_path_buf(), None);
    }
    let root = target.map(Path::to_path_buf).unwrap_or_else(|| cwd.to_path_buf());
    (root, Some(strip_source_scheme(app)))
}

fn strip_source_scheme(image: &str) -> String {
    image
        .strip_prefix(DOCKER_SOURCE_PREFIX)
        .unwrap_or(image)
        .to_string()
}

impl Cli {
    pub fn parse_args() -> Self {
        <Self as clap::Parser>::parse()
    }
}
