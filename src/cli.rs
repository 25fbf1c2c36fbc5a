use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "envmigrate")]
#[command(about = "Versioned migrations for mock API environment files", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase log verbosity (can be repeated: -v, -vv, -vvv)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count, global = true)]
    pub verbosity: u8,

    /// Suppress progress bars and per-file lines
    #[arg(short = 'q', long = "quiet", global = true)]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Migrate environment files in place to the current schema version
    Migrate {
        #[command(flatten)]
        selection: FileSelection,

        /// Report what would change without writing any file
        #[arg(long = "dry-run")]
        dry_run: bool,
    },

    /// Report each file's schema version without modifying anything
    Status {
        #[command(flatten)]
        selection: FileSelection,

        /// Print one JSON object per file instead of text
        #[arg(long)]
        json: bool,
    },

    /// List the known migration steps and the current schema version
    List,

    /// Write a default .envmigrate.toml in the current directory
    Init {
        /// Overwrite an existing configuration file
        #[arg(long)]
        force: bool,
    },
}

/// Which files to process and how.
#[derive(Args, Debug, Clone, Default)]
pub struct FileSelection {
    /// Files, directories or glob patterns (defaults to [batch].include)
    pub patterns: Vec<String>,

    /// Glob of files to leave alone (repeatable, adds to [batch].exclude)
    #[arg(short = 'e', long = "exclude")]
    pub exclude: Vec<String>,

    /// Configuration file (skips the search for .envmigrate.toml)
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// Number of worker threads (0 = all cores)
    #[arg(short = 'j', long = "jobs", env = "ENVMIGRATE_JOBS")]
    pub jobs: Option<usize>,

    /// Process files one at a time
    #[arg(long = "no-parallel")]
    pub no_parallel: bool,
}
