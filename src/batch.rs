//! Batch migration of environment files.
//!
//! Every file is an isolated failure domain: a read error, a parse error or a
//! failing step is recorded against that file and the run moves on. Files
//! are independent, so they are spread across a rayon pool; the registry is
//! the only shared state and it is read-only.

use std::path::{Path, PathBuf};

use indicatif::ProgressBar;
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug_span, info, warn};

use crate::config::{OutputConfig, ParallelConfig};
use crate::errors::BatchError;
use crate::io;
use crate::migrations::{classify, migrate, MigrationOutcome, MigrationRegistry, VersionStatus};
use crate::observability::{increment_processed, set_current_file, set_phase, set_progress, MigrationPhase};

/// Options for a migration run.
#[derive(Debug, Clone, Default)]
pub struct BatchOptions {
    /// Compute everything, write nothing.
    pub dry_run: bool,
    pub output: OutputConfig,
    pub parallel: ParallelConfig,
}

/// What happened to one file.
#[derive(Debug)]
pub enum FileOutcome {
    Migrated {
        from: u64,
        to: u32,
        applied: Vec<u32>,
        /// False on dry runs, or when the rendered output equals the file.
        written: bool,
    },
    UpToDate,
    /// Saved by a more recent release; left untouched.
    SkippedFuture { version: u64, current: u32 },
    Failed(BatchError),
}

impl std::fmt::Display for FileOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Migrated { from, to, .. } => write!(f, "migrated ({} -> {})", from, to),
            Self::UpToDate => write!(f, "up to date"),
            Self::SkippedFuture { version, current } => write!(
                f,
                "skipped: more recent version {} (current {})",
                version, current
            ),
            Self::Failed(error) => write!(f, "failed: {}", error),
        }
    }
}

#[derive(Debug)]
pub struct FileReport {
    pub path: PathBuf,
    pub outcome: FileOutcome,
}

/// Per-file outcomes of a run, in discovery order.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub files: Vec<FileReport>,
}

impl BatchReport {
    fn count(&self, pred: impl Fn(&FileOutcome) -> bool) -> usize {
        self.files.iter().filter(|f| pred(&f.outcome)).count()
    }

    pub fn migrated(&self) -> usize {
        self.count(|o| matches!(o, FileOutcome::Migrated { .. }))
    }

    pub fn up_to_date(&self) -> usize {
        self.count(|o| matches!(o, FileOutcome::UpToDate))
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, FileOutcome::SkippedFuture { .. }))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, FileOutcome::Failed(_)))
    }

    pub fn has_failures(&self) -> bool {
        self.failed() > 0
    }

    pub fn failures(&self) -> impl Iterator<Item = (&Path, &BatchError)> {
        self.files.iter().filter_map(|f| match &f.outcome {
            FileOutcome::Failed(error) => Some((f.path.as_path(), error)),
            _ => None,
        })
    }
}

/// Migrate every file in `paths`.
pub fn migrate_files(
    paths: &[PathBuf],
    registry: &MigrationRegistry,
    options: &BatchOptions,
    progress: &ProgressBar,
) -> BatchReport {
    set_progress(0, paths.len());
    let files = run_each(paths, &options.parallel, |path| {
        let outcome = match migrate_file(path, registry, options) {
            Ok(outcome) => outcome,
            Err(error) => {
                warn!("Failed migrating {}: {}", path.display(), error);
                FileOutcome::Failed(error)
            }
        };
        increment_processed();
        progress.inc(1);
        FileReport {
            path: path.to_path_buf(),
            outcome,
        }
    });
    BatchReport { files }
}

fn migrate_file(
    path: &Path,
    registry: &MigrationRegistry,
    options: &BatchOptions,
) -> Result<FileOutcome, BatchError> {
    let _file = set_current_file(path);
    let span = debug_span!("migrate_file", path = %path.display());
    let _entered = span.enter();
    info!("Starting migrating {}", path.display());

    let (raw, document) = {
        let _phase = set_phase(MigrationPhase::Loading);
        io::read_document_with_raw(path)?
    };

    let outcome = {
        let _phase = set_phase(MigrationPhase::Migrating);
        migrate(document, registry).map_err(|failed| BatchError::Migration {
            path: path.to_path_buf(),
            source: failed.error,
        })?
    };

    let result = match outcome {
        MigrationOutcome::UpToDate { .. } => FileOutcome::UpToDate,
        MigrationOutcome::FutureVersion {
            version, current, ..
        } => {
            warn!(
                "Skipping {}: saved by a more recent version ({} > {})",
                path.display(),
                version,
                current
            );
            info!("Skipped migrating {}", path.display());
            return Ok(FileOutcome::SkippedFuture { version, current });
        }
        MigrationOutcome::Migrated {
            document,
            from,
            to,
            applied,
        } => {
            let rendered = io::render_document(&document, &options.output).map_err(|source| {
                BatchError::Write {
                    path: path.to_path_buf(),
                    source: source.into(),
                }
            })?;
            let written = !options.dry_run && rendered != raw;
            if written {
                let _phase = set_phase(MigrationPhase::Writing);
                io::write_atomic(path, &rendered)?;
            }
            FileOutcome::Migrated {
                from,
                to,
                applied,
                written,
            }
        }
    };

    info!("Finished migrating {}", path.display());
    Ok(result)
}

/// Classification of one file, for the read-only status check.
#[derive(Debug, Clone, Serialize)]
pub struct FileStatus {
    pub version: u64,
    pub stamped: bool,
    pub status: VersionStatus,
    pub pending: usize,
}

impl FileStatus {
    /// Anything other than a file at the current version.
    pub fn needs_attention(&self) -> bool {
        self.status != VersionStatus::UpToDate
    }
}

/// Classify every file without modifying anything.
pub fn inspect_files(
    paths: &[PathBuf],
    registry: &MigrationRegistry,
    parallel: &ParallelConfig,
    progress: &ProgressBar,
) -> Vec<(PathBuf, Result<FileStatus, BatchError>)> {
    run_each(paths, parallel, |path| {
        let _file = set_current_file(path);
        let result = io::read_document(path).and_then(|document| {
            let classification = classify(&document, registry).map_err(|source| {
                BatchError::Migration {
                    path: path.to_path_buf(),
                    source,
                }
            })?;
            Ok(FileStatus {
                version: classification.version,
                stamped: classification.stamped,
                status: classification.status,
                pending: classification.pending.len(),
            })
        });
        progress.inc(1);
        (path.to_path_buf(), result)
    })
}

/// Run `f` over `paths`, in parallel when configured. Output keeps input order.
fn run_each<T, F>(paths: &[PathBuf], parallel: &ParallelConfig, f: F) -> Vec<T>
where
    T: Send,
    F: Fn(&Path) -> T + Sync + Send,
{
    if !parallel.enabled || paths.len() < 2 {
        return paths.iter().map(|p| f(p)).collect();
    }

    let pool = match rayon::ThreadPoolBuilder::new()
        .num_threads(parallel.effective_concurrency())
        .build()
    {
        Ok(pool) => pool,
        Err(e) => {
            warn!("Failed to build thread pool ({}); running sequentially", e);
            return paths.iter().map(|p| f(p)).collect();
        }
    };

    let chunk = parallel.effective_batch_size();
    pool.install(|| {
        paths
            .chunks(chunk)
            .flat_map(|batch| batch.par_iter().map(|p| f(p)).collect::<Vec<_>>())
            .collect()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::TransformError;
    use crate::migrations::MigrationStep;
    use serde_json::{json, Value};
    use std::fs;
    use std::sync::{Arc, Mutex};
    use tempfile::TempDir;

    fn add_headers(doc: &mut Value) -> Result<(), TransformError> {
        doc["headers"] = json!([]);
        Ok(())
    }

    fn registry() -> MigrationRegistry {
        MigrationRegistry::new(vec![MigrationStep::new(1, "headers", add_headers)]).unwrap()
    }

    fn write(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_failures_are_isolated() {
        let dir = TempDir::new().unwrap();
        let paths = vec![
            write(&dir, "a.json", r#"{"routes": []}"#),
            write(&dir, "b.json", "{ broken"),
            write(&dir, "c.json", r#"{"lastMigration": "one"}"#),
            write(&dir, "d.json", r#"{"lastMigration": 1}"#),
            write(&dir, "e.json", r#"{"lastMigration": 5}"#),
        ];

        let report = migrate_files(&paths, &registry(), &BatchOptions::default(), &ProgressBar::hidden());

        assert_eq!(report.migrated(), 1);
        assert_eq!(report.failed(), 2);
        assert_eq!(report.up_to_date(), 1);
        assert_eq!(report.skipped(), 1);
        assert!(report.has_failures());

        let migrated: Value = serde_json::from_str(&fs::read_to_string(&paths[0]).unwrap()).unwrap();
        assert_eq!(migrated, json!({ "routes": [], "headers": [], "lastMigration": 1 }));
        assert_eq!(fs::read_to_string(&paths[4]).unwrap(), r#"{"lastMigration": 5}"#);
    }

    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

    impl std::io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_every_started_file_logs_a_closing_line() {
        let dir = TempDir::new().unwrap();
        let paths = vec![
            write(&dir, "a.json", "{}"),
            write(&dir, "b.json", "{ broken"),
            write(&dir, "c.json", r#"{"lastMigration": 1}"#),
            write(&dir, "d.json", r#"{"lastMigration": 5}"#),
        ];
        let options = BatchOptions {
            parallel: ParallelConfig::sequential(),
            ..Default::default()
        };

        let logs = CapturedLogs::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::INFO)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        tracing::subscriber::with_default(subscriber, || {
            migrate_files(&paths, &registry(), &options, &ProgressBar::hidden());
        });

        let output = String::from_utf8(logs.0.lock().unwrap().clone()).unwrap();
        for path in &paths {
            let name = path.display().to_string();
            let lines: Vec<&str> = output.lines().filter(|line| line.contains(&name)).collect();
            let started = lines.iter().filter(|l| l.contains("Starting migrating")).count();
            let closed = lines
                .iter()
                .filter(|l| {
                    l.contains("Finished migrating")
                        || l.contains("Skipped migrating")
                        || l.contains("Failed migrating")
                })
                .count();
            assert_eq!((started, closed), (1, 1), "{}", name);
        }
        assert!(output.contains(&format!("Skipped migrating {}", paths[3].display())));
    }

    #[test]
    fn test_dry_run_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "a.json", "{}");
        let options = BatchOptions {
            dry_run: true,
            ..Default::default()
        };

        let report = migrate_files(&[path.clone()], &registry(), &options, &ProgressBar::hidden());

        assert!(matches!(
            report.files[0].outcome,
            FileOutcome::Migrated { written: false, .. }
        ));
        assert_eq!(fs::read_to_string(&path).unwrap(), "{}");
    }

    #[test]
    fn test_sequential_and_parallel_agree() {
        let dir = TempDir::new().unwrap();
        let paths: Vec<_> = (0..12)
            .map(|i| write(&dir, &format!("{:02}.json", i), r#"{"lastMigration": 1}"#))
            .collect();

        let parallel = ParallelConfig {
            enabled: true,
            max_concurrency: Some(3),
            batch_size: Some(5),
        };
        let statuses = inspect_files(&paths, &registry(), &parallel, &ProgressBar::hidden());

        let order: Vec<_> = statuses.iter().map(|(p, _)| p.clone()).collect();
        assert_eq!(order, paths);
        assert!(statuses
            .iter()
            .all(|(_, s)| s.as_ref().is_ok_and(|s| !s.needs_attention())));
    }

    #[test]
    fn test_outcome_display() {
        let outcome = FileOutcome::SkippedFuture {
            version: 20,
            current: 14,
        };
        assert_eq!(outcome.to_string(), "skipped: more recent version 20 (current 14)");
        let outcome = FileOutcome::Migrated {
            from: 3,
            to: 14,
            applied: vec![],
            written: true,
        };
        assert_eq!(outcome.to_string(), "migrated (3 -> 14)");
    }
}
