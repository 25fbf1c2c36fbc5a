use anyhow::{Context, Result};
use colored::Colorize;
use serde::Serialize;

use super::{discover_files, resolve_config};
use crate::batch::{inspect_files, FileStatus};
use crate::cli::FileSelection;
use crate::errors::BatchError;
use crate::migrations::{MigrationRegistry, VersionStatus};
use crate::progress::{ProgressConfig, ProgressManager, TEMPLATE_STATUS};

/// One line of `status --json` output.
#[derive(Serialize)]
struct StatusLine<'a> {
    path: String,
    #[serde(flatten)]
    status: Option<&'a FileStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

/// Exit non-zero when any file is pending, newer than supported, or unreadable.
pub fn show_status(
    selection: &FileSelection,
    json: bool,
    progress: ProgressConfig,
    registry: &MigrationRegistry,
) -> Result<()> {
    let settings = resolve_config(selection)?;
    let files = discover_files(&settings)?;

    let manager = ProgressManager::new(progress);
    let bar = manager.create_bar(files.len() as u64, TEMPLATE_STATUS, "Checking");
    let results = inspect_files(&files, registry, &settings.parallel, &bar);
    bar.finish_and_clear();

    let mut attention = 0;
    for (path, result) in &results {
        if result.as_ref().map_or(true, FileStatus::needs_attention) {
            attention += 1;
        }
        if json {
            let line = StatusLine {
                path: path.display().to_string(),
                status: result.as_ref().ok(),
                error: result.as_ref().err().map(BatchError::to_string),
            };
            println!("{}", serde_json::to_string(&line).context("Failed to serialize status")?);
        } else {
            println!("{}: {}", path.display(), describe(result, registry.current_version()));
        }
    }

    if attention > 0 {
        anyhow::bail!(
            "{} of {} environment file(s) are not at version {}",
            attention,
            results.len(),
            registry.current_version()
        );
    }
    Ok(())
}

fn describe(result: &Result<FileStatus, BatchError>, current: u32) -> String {
    match result {
        Ok(status) => {
            let version = if status.stamped {
                format!("version {}", status.version)
            } else {
                "unstamped".to_string()
            };
            match status.status {
                VersionStatus::UpToDate => format!("{}, up to date", version).green().to_string(),
                VersionStatus::PendingUpgrade => format!(
                    "{}, {} migration(s) pending",
                    version, status.pending
                )
                .yellow()
                .to_string(),
                VersionStatus::FutureVersion => format!(
                    "{}, more recent than supported version {}",
                    version, current
                )
                .red()
                .to_string(),
            }
        }
        Err(error) => format!("error: {}", error).red().to_string(),
    }
}
