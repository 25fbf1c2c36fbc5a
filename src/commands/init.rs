use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

use crate::config::CONFIG_FILE_NAME;

pub const DEFAULT_CONFIG: &str = r#"# envmigrate configuration

[batch]
# Files, directories or globs migrated when none are given on the command line
include = ["environments"]
# Fixtures deliberately kept at historical or broken versions
exclude = [
    "node_modules/**",
    "target/**",
]

[parallel]
enabled = true
# max_concurrency = 4

[output]
indent = 2
trailing_newline = true
"#;

pub fn init_config(force: bool) -> Result<()> {
    init_config_in(Path::new("."), force)
}

pub fn init_config_in(dir: &Path, force: bool) -> Result<()> {
    let config_path = dir.join(CONFIG_FILE_NAME);

    if config_path.exists() && !force {
        anyhow::bail!(
            "{} already exists. Use --force to overwrite.",
            config_path.display()
        );
    }

    fs::write(&config_path, DEFAULT_CONFIG)
        .with_context(|| format!("Failed to write {}", config_path.display()))?;
    println!("Created {} configuration file", CONFIG_FILE_NAME);
    Ok(())
}
