//! Crash reporting and context tracking.
//!
//! When the batch tool dies mid-run, the crash report should say which file
//! and which migration step it was working on and how far the run got.
//!
//! Install the panic hook at startup:
//!
//! ```ignore
//! envmigrate::observability::install_panic_hook();
//! ```
//!
//! and scope work with the RAII guards:
//!
//! ```ignore
//! use envmigrate::observability::{set_current_file, set_phase, MigrationPhase};
//!
//! let _phase = set_phase(MigrationPhase::Migrating);
//! let _file = set_current_file(&path);
//! ```

pub mod context;
pub mod panic_hook;

pub use context::{
    get_current_context, get_progress, increment_processed, reset_progress, set_current_file,
    set_current_step, set_phase, set_progress, ContextGuard, MigrationContext, MigrationPhase,
};
pub use panic_hook::install_panic_hook;
