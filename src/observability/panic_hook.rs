//! Crash report printed when the tool panics.
//!
//! A batch run touches many files; a bare panic message does not say which
//! document or which migration step tripped it. The hook renders the
//! thread-local [`MigrationContext`] alongside the panic so the report can be
//! attached to a bug as-is.

use std::fmt::Write as _;
use std::panic::PanicHookInfo;

use tracing::Span;

use super::context::{get_current_context, get_progress, MigrationContext};

const VERSION: &str = env!("CARGO_PKG_VERSION");
const RULE: &str =
    "--------------------------------------------------------------------------------";

/// Install the crash-report hook. Call once at the top of `main`.
pub fn install_panic_hook() {
    std::panic::set_hook(Box::new(|info| {
        let span = Span::current();
        let report = CrashReport {
            message: extract_panic_message(info),
            location: info
                .location()
                .map(|l| format!("{}:{}:{}", l.file(), l.line(), l.column())),
            span: span.metadata().map(|m| m.name().to_string()),
            context: get_current_context(),
            progress: get_progress(),
        };
        eprintln!("{}", report.render());
        if std::env::var_os("RUST_BACKTRACE").is_some() {
            eprintln!("{}", std::backtrace::Backtrace::capture());
        } else {
            eprintln!("Run with RUST_BACKTRACE=1 for a stack trace");
        }
    }));
}

struct CrashReport {
    message: String,
    location: Option<String>,
    span: Option<String>,
    context: MigrationContext,
    progress: (usize, usize),
}

impl CrashReport {
    fn render(&self) -> String {
        let mut out = String::new();
        let timestamp = chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC");

        let _ = writeln!(out, "{}", RULE);
        let _ = writeln!(out, "envmigrate {} crashed ({}, {})", VERSION, std::env::consts::OS, timestamp);
        let _ = writeln!(out, "{}", RULE);
        let _ = writeln!(out, "panic:    {}", truncate(&self.message, 68));
        if let Some(location) = &self.location {
            let _ = writeln!(out, "location: {}", location);
        }

        match self.context.phase {
            Some(phase) => {
                let _ = writeln!(out, "phase:    {}", phase);
            }
            None => {
                let _ = writeln!(out, "phase:    (none, crashed before any file was touched)");
            }
        }
        if let Some(span) = &self.span {
            let _ = writeln!(out, "span:     {}", span);
        }
        if let Some(file) = &self.context.current_file {
            let _ = writeln!(out, "file:     {}", file.display());
        }
        if let Some(step) = self.context.current_step {
            let _ = writeln!(out, "step:     {}", step);
        }

        let (processed, total) = self.progress;
        if total > 0 {
            let _ = writeln!(
                out,
                "progress: {} / {} files ({}%)",
                processed,
                total,
                processed * 100 / total
            );
        }

        let _ = write!(out, "{}", RULE);
        out
    }
}

fn extract_panic_message(info: &PanicHookInfo<'_>) -> String {
    if let Some(s) = info.payload().downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = info.payload().downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

/// Char-aware, so multibyte messages never split mid-codepoint.
fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        return s.to_string();
    }
    let kept: String = s.chars().take(max_chars.saturating_sub(3)).collect();
    format!("{}...", kept)
}
