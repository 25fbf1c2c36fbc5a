use anyhow::{Context, Result};
use clap::Parser;
use envmigrate::cli::{Cli, Commands};
use envmigrate::commands::{init, list, migrate, status};
use envmigrate::migrations::builtin_registry;
use envmigrate::observability::install_panic_hook;
use envmigrate::progress::ProgressConfig;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    install_panic_hook();
    let cli = Cli::parse();
    init_logging(cli.verbosity, cli.quiet);

    // Fails fast when the step catalogue is inconsistent.
    let registry = builtin_registry().context("Migration registry failed its integrity check")?;
    let progress = ProgressConfig::from_env(cli.quiet);

    match cli.command {
        Commands::Migrate { selection, dry_run } => migrate::migrate_project(
            migrate::MigrateConfig {
                selection,
                dry_run,
                progress,
            },
            registry,
        ),
        Commands::Status { selection, json } => {
            status::show_status(&selection, json, progress, registry)
        }
        Commands::List => list::list_migrations(registry),
        Commands::Init { force } => init::init_config(force),
    }
}

/// `RUST_LOG` wins; otherwise `-v` repetitions pick the level.
fn init_logging(verbosity: u8, quiet: bool) {
    let level = match (quiet, verbosity) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "info",
        (false, 2) => "debug",
        (false, _) => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("envmigrate={}", level)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
