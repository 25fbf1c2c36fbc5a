use anyhow::Result;
use colored::Colorize;

use super::{discover_files, resolve_config};
use crate::batch::{migrate_files, BatchOptions, BatchReport, FileOutcome};
use crate::cli::FileSelection;
use crate::migrations::MigrationRegistry;
use crate::observability::reset_progress;
use crate::progress::{ProgressConfig, ProgressManager, TEMPLATE_MIGRATION};

pub struct MigrateConfig {
    pub selection: FileSelection,
    pub dry_run: bool,
    pub progress: ProgressConfig,
}

pub fn migrate_project(config: MigrateConfig, registry: &MigrationRegistry) -> Result<()> {
    let settings = resolve_config(&config.selection)?;
    let files = discover_files(&settings)?;
    if files.is_empty() {
        eprintln!("No environment files matched");
        return Ok(());
    }

    let options = BatchOptions {
        dry_run: config.dry_run,
        output: settings.output,
        parallel: settings.parallel,
    };
    let quiet = config.progress.quiet_mode;
    let manager = ProgressManager::new(config.progress);
    let bar = manager.create_bar(files.len() as u64, TEMPLATE_MIGRATION, "Migrating");

    let report = migrate_files(&files, registry, &options, &bar);
    bar.finish_and_clear();
    reset_progress();

    if !quiet {
        print_report(&report, config.dry_run);
    }

    if report.has_failures() {
        if quiet {
            for (path, error) in report.failures() {
                eprintln!("{} {}: {}", "error:".red().bold(), path.display(), error);
            }
        }
        anyhow::bail!(
            "{} of {} environment file(s) failed to migrate",
            report.failed(),
            report.files.len()
        );
    }
    Ok(())
}

fn print_report(report: &BatchReport, dry_run: bool) {
    for file in &report.files {
        let line = file.outcome.to_string();
        let line = match &file.outcome {
            FileOutcome::Migrated { .. } if dry_run => format!("{} (dry run)", line).cyan(),
            FileOutcome::Migrated { .. } => line.green(),
            FileOutcome::UpToDate => line.normal(),
            FileOutcome::SkippedFuture { .. } => line.yellow(),
            FileOutcome::Failed(_) => line.red(),
        };
        println!("{}: {}", file.path.display(), line);
    }

    println!(
        "\n{} migrated, {} up to date, {} skipped, {} failed",
        report.migrated(),
        report.up_to_date(),
        report.skipped(),
        report.failed()
    );
}
