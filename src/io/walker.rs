use anyhow::{Context, Result};
use glob::Pattern;
use std::fmt::Display;
use std::path::{Component, Path, PathBuf};
use tracing::warn;
use walkdir::WalkDir;

/// Expands include patterns into a sorted list of environment files.
///
/// An include is an existing file, a directory (walked recursively for
/// `*.json`), or a glob. Excludes are globs matched against the discovered
/// path; fixtures intentionally kept at old or broken versions are listed
/// there.
pub struct DocumentFinder {
    includes: Vec<String>,
    excludes: Vec<Pattern>,
}

impl DocumentFinder {
    pub fn new(includes: Vec<String>) -> Self {
        Self {
            includes,
            excludes: vec![],
        }
    }

    pub fn with_excludes(mut self, patterns: &[String]) -> Result<Self> {
        for pattern in patterns {
            let compiled = Pattern::new(pattern)
                .with_context(|| format!("Invalid exclude pattern: {}", pattern))?;
            self.excludes.push(compiled);
        }
        Ok(self)
    }

    pub fn find(&self) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();

        for include in &self.includes {
            let path = Path::new(include);
            if path.is_dir() {
                files.extend(walk_json_files(path));
            } else if path.is_file() {
                files.push(path.to_path_buf());
            } else {
                let entries = glob::glob(include)
                    .with_context(|| format!("Invalid include pattern: {}", include))?;
                files.extend(entries.filter_map(readable).filter(|p| p.is_file()));
            }
        }

        files.retain(|path| !self.is_excluded(path));
        files.sort();
        files.dedup();
        Ok(files)
    }

    fn is_excluded(&self, path: &Path) -> bool {
        let normalized = normalize(path);
        let file_name = path.file_name().map(|n| n.to_string_lossy().into_owned());

        self.excludes.iter().any(|pattern| {
            pattern.matches_path(path)
                || pattern.matches(&normalized)
                || file_name.as_deref().is_some_and(|name| pattern.matches(name))
        })
    }
}

fn walk_json_files(root: &Path) -> impl Iterator<Item = PathBuf> {
    WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_entry(|entry| entry.depth() == 0 || !is_hidden(entry.file_name()))
        .filter_map(readable)
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
}

/// Keep a discovered entry, or warn and skip one that cannot be read.
fn readable<T, E: Display>(entry: Result<T, E>) -> Option<T> {
    match entry {
        Ok(entry) => Some(entry),
        Err(e) => {
            warn!("Skipping unreadable path: {}", e);
            None
        }
    }
}

fn is_hidden(name: &std::ffi::OsStr) -> bool {
    name.to_string_lossy().starts_with('.')
}

/// Drop leading `./` so `./envs/a.json` matches `envs/*.json`.
fn normalize(path: &Path) -> String {
    path.components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect::<PathBuf>()
        .to_string_lossy()
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn setup() -> TempDir {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("envs/nested")).unwrap();
        fs::create_dir_all(root.join("envs/.cache")).unwrap();
        fs::write(root.join("envs/a.json"), "{}").unwrap();
        fs::write(root.join("envs/nested/b.json"), "{}").unwrap();
        fs::write(root.join("envs/notes.txt"), "").unwrap();
        fs::write(root.join("envs/.cache/c.json"), "{}").unwrap();
        fs::write(root.join("envs/broken-v3.json"), "{}").unwrap();
        dir
    }

    fn names(files: &[PathBuf]) -> Vec<String> {
        files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn test_directory_is_walked_for_json() {
        let dir = setup();
        let root = dir.path().join("envs").to_string_lossy().into_owned();
        let files = DocumentFinder::new(vec![root]).find().unwrap();
        assert_eq!(names(&files), vec!["a.json", "broken-v3.json", "b.json"]);
    }

    #[test]
    fn test_excludes_match_file_name_and_path() {
        let dir = setup();
        let root = dir.path().join("envs").to_string_lossy().into_owned();
        let files = DocumentFinder::new(vec![root])
            .with_excludes(&["broken-*.json".to_string(), "**/nested/**".to_string()])
            .unwrap()
            .find()
            .unwrap();
        assert_eq!(names(&files), vec!["a.json"]);
    }

    #[test]
    fn test_glob_and_duplicates() {
        let dir = setup();
        let glob = dir.path().join("envs/*.json").to_string_lossy().into_owned();
        let file = dir.path().join("envs/a.json").to_string_lossy().into_owned();
        let files = DocumentFinder::new(vec![glob, file]).find().unwrap();
        assert_eq!(names(&files), vec!["a.json", "broken-v3.json"]);
    }

    #[test]
    fn test_invalid_exclude_is_an_error() {
        assert!(DocumentFinder::new(vec![]).with_excludes(&["[".to_string()]).is_err());
    }

    #[test]
    fn test_unreadable_entries_are_logged() {
        use std::sync::{Arc, Mutex};

        #[derive(Clone, Default)]
        struct Captured(Arc<Mutex<Vec<u8>>>);

        impl std::io::Write for Captured {
            fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
                self.0.lock().unwrap().extend_from_slice(buf);
                Ok(buf.len())
            }

            fn flush(&mut self) -> std::io::Result<()> {
                Ok(())
            }
        }

        let logs = Captured::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();

        let kept = tracing::subscriber::with_default(subscriber, || {
            let denied = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "envs/locked");
            (
                readable::<PathBuf, _>(Err(denied)),
                readable::<_, std::io::Error>(Ok(PathBuf::from("envs/a.json"))),
            )
        });

        assert_eq!(kept, (None, Some(PathBuf::from("envs/a.json"))));
        let output = String::from_utf8(logs.0.lock().unwrap().clone()).unwrap();
        assert!(output.contains("WARN"));
        assert!(output.contains("Skipping unreadable path: envs/locked"));
    }

    #[test]
    fn test_normalize_strips_cur_dir() {
        assert_eq!(normalize(Path::new("./envs/a.json")), "envs/a.json");
    }
}
