//! Atomic App - Main entry point

use anyhow::Context;
use tracing::{debug, error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use atomicapp::cli::{Cli, Commands};
use atomicapp::constants::{ATOMICAPP_VERSION, IMAGE_ENV};
use atomicapp::status::{print_error_status, print_success};
use atomicapp::{DockerFetcher, Engine, ProviderRegistry, TerminalPrompter, generate_answers};

/// Initialize tracing; `RUST_LOG` overrides the flag-derived level
fn init_tracing(verbose: bool, quiet: bool) {
    let filter = if verbose {
        "debug"
    } else if quiet {
        "warn"
    } else {
        "info"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().without_time())
        .init();
}

fn main() {
    let cli = Cli::parse_args();
    init_tracing(cli.verbose, cli.quiet);
    info!("Atomic App {} starting", ATOMICAPP_VERSION);

    // a blocked prompt or provider command is only ever cancelled from here
    if let Err(e) = ctrlc::set_handler(|| {
        eprintln!();
        print_error_status("Interrupted");
        std::process::exit(130);
    }) {
        tracing::warn!("Failed to install Ctrl-C handler: {}", e);
    }

    if let Err(e) = execute(cli) {
        error!("{:#}", e);
        print_error_status(format!("{:#}", e));
        std::process::exit(1);
    }
}

fn execute(cli: Cli) -> anyhow::Result<()> {
    let cwd = std::env::current_dir().context("Failed to determine current directory")?;
    let registry = ProviderRegistry::with_builtin_providers();
    let fetcher = DockerFetcher;
    let mut prompter = TerminalPrompter;
    // read once here; nested runs get their images from the graph
    let image_override = std::env::var(IMAGE_ENV).ok().filter(|v| !v.is_empty());

    match cli.command {
        Commands::Run {
            app,
            ask,
            answers_output,
        } => {
            let mut options = app.to_options(&cwd, image_override.as_deref());
            options.ask = ask;
            options.answers_output = answers_output;
            debug!("Run options: {:?}", options);

            Engine::new(&registry, &mut prompter, &fetcher)
                .run(&options)
                .with_context(|| format!("Failed to run {}", app.app))?;
        }
        Commands::Stop { app } => {
            let mut options = app.to_options(&cwd, image_override.as_deref());
            options.stop = true;
            debug!("Stop options: {:?}", options);

            Engine::new(&registry, &mut prompter, &fetcher)
                .run(&options)
                .with_context(|| format!("Failed to stop {}", app.app))?;
        }
        Commands::GenAnswers {
            app,
            answers_format,
            output,
            target,
        } => {
            let (app_path, image) = atomicapp::cli::locate_app(&app, target.as_deref(), &cwd);
            let options = atomicapp::RunOptions {
                app_path,
                image,
                answers_format,
                ..Default::default()
            };
            let written = generate_answers(&options, &fetcher, output.as_deref())
                .with_context(|| format!("Failed to generate answers for {}", app))?;
            print_success(format!("Wrote answers to {}", written.display()));
        }
    }

    Ok(())
}
