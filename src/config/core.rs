use serde::{Deserialize, Serialize};

use super::parallel::ParallelConfig;

pub const CONFIG_FILE_NAME: &str = ".envmigrate.toml";

/// Root configuration, one section per concern.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct EnvMigrateConfig {
    #[serde(default)]
    pub batch: BatchConfig,
    #[serde(default)]
    pub parallel: ParallelConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Which files the batch tool touches.
///
/// Nothing is included by default: any unstamped JSON object reads as a
/// version 0 environment, so the tool only touches what it is pointed at.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct BatchConfig {
    /// Files, directories or globs used when none are given on the command line
    #[serde(default)]
    pub include: Vec<String>,
    /// Globs for fixtures deliberately left at historical or broken versions
    #[serde(default)]
    pub exclude: Vec<String>,
}

/// How migrated documents are written back.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OutputConfig {
    #[serde(default = "default_indent")]
    pub indent: usize,
    #[serde(default = "default_trailing_newline")]
    pub trailing_newline: bool,
}

fn default_indent() -> usize {
    2
}

fn default_trailing_newline() -> bool {
    true
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            indent: default_indent(),
            trailing_newline: default_trailing_newline(),
        }
    }
}
