pub mod init;
pub mod list;
pub mod migrate;
pub mod status;

use std::path::PathBuf;

use anyhow::{bail, Context, Result};

use crate::cli::FileSelection;
use crate::config::{load_config, load_config_from, EnvMigrateConfig, CONFIG_FILE_NAME};
use crate::io::DocumentFinder;
use crate::observability::{set_phase, MigrationPhase};

/// Config file merged with command-line overrides.
pub fn resolve_config(selection: &FileSelection) -> Result<EnvMigrateConfig> {
    let mut config = match &selection.config {
        Some(path) => load_config_from(path)?,
        None => {
            let cwd = std::env::current_dir().context("Failed to get current directory")?;
            load_config(&cwd)
        }
    };

    if !selection.patterns.is_empty() {
        config.batch.include = selection.patterns.clone();
    }
    config.batch.exclude.extend(selection.exclude.iter().cloned());
    if let Some(jobs) = selection.jobs {
        config.parallel.max_concurrency = Some(jobs);
    }
    if selection.no_parallel {
        config.parallel.enabled = false;
    }
    Ok(config)
}

/// Expand the configured includes, minus excludes.
pub fn discover_files(config: &EnvMigrateConfig) -> Result<Vec<PathBuf>> {
    if config.batch.include.is_empty() {
        bail!(
            "no files given: pass files, directories or globs, or set [batch] include in {}",
            CONFIG_FILE_NAME
        );
    }
    let _phase = set_phase(MigrationPhase::Discovery);
    let files = DocumentFinder::new(config.batch.include.clone())
        .with_excludes(&config.batch.exclude)?
        .find()?;
    tracing::debug!(count = files.len(), "Discovered environment files");
    Ok(files)
}
