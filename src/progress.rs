//! Progress bars for the batch tool.
//!
//! Bars are drawn on stderr and only when it is a terminal, so CI logs and
//! piped output stay clean. `--quiet` or `ENVMIGRATE_QUIET` suppress them
//! entirely.

use indicatif::{ProgressBar, ProgressStyle};
use std::io::IsTerminal;

pub const TEMPLATE_MIGRATION: &str =
    "{spinner} {msg} [{bar:30}] {pos}/{len} files ({percent}%) - {eta}";
pub const TEMPLATE_STATUS: &str = "{spinner} {msg} {pos}/{len} files";

#[derive(Debug, Clone, Default)]
pub struct ProgressConfig {
    pub quiet_mode: bool,
}

impl ProgressConfig {
    pub fn from_env(quiet: bool) -> Self {
        let env_quiet = std::env::var_os("ENVMIGRATE_QUIET").is_some();
        Self {
            quiet_mode: quiet || env_quiet,
        }
    }

    pub fn should_show_progress(&self) -> bool {
        !self.quiet_mode && std::io::stderr().is_terminal()
    }
}

/// Hands out bars, or hidden bars when progress should not be drawn.
#[derive(Debug, Clone)]
pub struct ProgressManager {
    config: ProgressConfig,
}

impl ProgressManager {
    pub fn new(config: ProgressConfig) -> Self {
        Self { config }
    }

    pub fn create_bar(&self, len: u64, template: &str, msg: &str) -> ProgressBar {
        if !self.config.should_show_progress() {
            return ProgressBar::hidden();
        }

        let style = ProgressStyle::default_bar()
            .template(template)
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=> ");
        let bar = ProgressBar::new(len).with_style(style);
        bar.set_message(msg.to_string());
        bar
    }
}
