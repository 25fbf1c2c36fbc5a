//! `.envmigrate.toml` configuration.
//!
//! ```toml
//! [batch]
//! include = ["environments"]
//! exclude = ["**/fixtures/broken-*.json"]
//!
//! [parallel]
//! enabled = true
//! max_concurrency = 4
//!
//! [output]
//! indent = 2
//! trailing_newline = true
//! ```

mod core;
mod loader;
mod parallel;

pub use self::core::{BatchConfig, EnvMigrateConfig, OutputConfig, CONFIG_FILE_NAME};
pub use loader::{directory_ancestors, load_config, load_config_from, parse_config};
pub use parallel::ParallelConfig;
