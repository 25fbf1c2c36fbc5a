//! Thread-local context tracking for crash reports.
//!
//! Each thread (including rayon workers) carries its own context: current
//! phase, file and migration step. Progress counters are global atomics.
//! Guards restore the previous context on drop, so contexts nest.

use std::cell::RefCell;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};

static FILES_PROCESSED: AtomicUsize = AtomicUsize::new(0);
static FILES_TOTAL: AtomicUsize = AtomicUsize::new(0);

thread_local! {
    static CURRENT_CONTEXT: RefCell<MigrationContext> = const { RefCell::new(MigrationContext::new()) };
}

/// Snapshot of what the current thread is doing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationContext {
    pub phase: Option<MigrationPhase>,
    pub current_file: Option<PathBuf>,
    pub current_step: Option<u32>,
}

impl MigrationContext {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            phase: None,
            current_file: None,
            current_step: None,
        }
    }
}

/// Major stages of a batch run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrationPhase {
    /// Expanding patterns into document files
    Discovery,
    /// Reading and parsing a document
    Loading,
    /// Running migration steps
    Migrating,
    /// Writing a migrated document back
    Writing,
}

impl std::fmt::Display for MigrationPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Discovery => write!(f, "discovery"),
            Self::Loading => write!(f, "loading"),
            Self::Migrating => write!(f, "migrating"),
            Self::Writing => write!(f, "writing"),
        }
    }
}

/// Restores the previous context when dropped.
pub struct ContextGuard {
    previous: MigrationContext,
}

impl Drop for ContextGuard {
    fn drop(&mut self) {
        CURRENT_CONTEXT.with(|ctx| {
            *ctx.borrow_mut() = self.previous.clone();
        });
    }
}

fn update(f: impl FnOnce(&mut MigrationContext)) -> ContextGuard {
    CURRENT_CONTEXT.with(|ctx| {
        let previous = ctx.borrow().clone();
        f(&mut ctx.borrow_mut());
        ContextGuard { previous }
    })
}

#[must_use]
pub fn set_phase(phase: MigrationPhase) -> ContextGuard {
    update(|ctx| ctx.phase = Some(phase))
}

#[must_use]
pub fn set_current_file(path: impl Into<PathBuf>) -> ContextGuard {
    let path = path.into();
    update(|ctx| ctx.current_file = Some(path))
}

#[must_use]
pub fn set_current_step(id: u32) -> ContextGuard {
    update(|ctx| ctx.current_step = Some(id))
}

pub fn set_progress(processed: usize, total: usize) {
    FILES_PROCESSED.store(processed, Ordering::Relaxed);
    FILES_TOTAL.store(total, Ordering::Relaxed);
}

/// Thread-safe; called from rayon workers.
pub fn increment_processed() {
    FILES_PROCESSED.fetch_add(1, Ordering::Relaxed);
}

#[must_use]
pub fn get_current_context() -> MigrationContext {
    CURRENT_CONTEXT.with(|ctx| ctx.borrow().clone())
}

/// (processed, total)
#[must_use]
pub fn get_progress() -> (usize, usize) {
    (
        FILES_PROCESSED.load(Ordering::Relaxed),
        FILES_TOTAL.load(Ordering::Relaxed),
    )
}

pub fn reset_progress() {
    set_progress(0, 0);
}
