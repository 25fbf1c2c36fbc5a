use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use super::core::{EnvMigrateConfig, CONFIG_FILE_NAME};

const MAX_TRAVERSAL_DEPTH: usize = 10;

pub fn parse_config(contents: &str) -> Result<EnvMigrateConfig, toml::de::Error> {
    toml::from_str(contents)
}

/// Load an explicitly requested config file. Any failure is an error.
pub fn load_config_from(path: &Path) -> Result<EnvMigrateConfig> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    let config = parse_config(&contents)
        .with_context(|| format!("Failed to parse config file {}", path.display()))?;
    log::debug!("Loaded config from {}", path.display());
    Ok(config)
}

/// Search `start` and its ancestors for a config file.
///
/// The first readable file wins. A file that exists but does not parse is
/// reported and the defaults are used.
pub fn load_config(start: &Path) -> EnvMigrateConfig {
    directory_ancestors(start.to_path_buf(), MAX_TRAVERSAL_DEPTH)
        .map(|dir| dir.join(CONFIG_FILE_NAME))
        .find_map(|path| try_load_discovered(&path))
        .unwrap_or_else(|| {
            log::debug!(
                "No {} found within {} directories. Using defaults.",
                CONFIG_FILE_NAME,
                MAX_TRAVERSAL_DEPTH
            );
            EnvMigrateConfig::default()
        })
}

/// `Some(defaults)` when the file exists but is broken, so the search stops
/// at the nearest config instead of silently picking one further up.
fn try_load_discovered(path: &Path) -> Option<EnvMigrateConfig> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) => {
            if e.kind() != std::io::ErrorKind::NotFound {
                log::warn!("Failed to read config file {}: {}", path.display(), e);
            }
            return None;
        }
    };

    match parse_config(&contents) {
        Ok(config) => {
            log::debug!("Loaded config from {}", path.display());
            Some(config)
        }
        Err(e) => {
            log::warn!(
                "Failed to parse {}: {}. Using defaults.",
                path.display(),
                e
            );
            Some(EnvMigrateConfig::default())
        }
    }
}

pub fn directory_ancestors(start: PathBuf, max_depth: usize) -> impl Iterator<Item = PathBuf> {
    std::iter::successors(Some(start), |dir| {
        let mut parent = dir.clone();
        parent.pop().then_some(parent)
    })
    .take(max_depth)
}
