#![deny(missing_docs)]
//! Shared logging utilities for the sidepanel workspace.
//!
//! This crate provides the `panel_*` logging macros used across the codebase
//! and a minimal test initializer for the global logger. Every macro takes
//! an execution-context label first, so output from the three contexts
//! (background, bridge, frame) stays distinguishable in a combined log.

/// Context label for the background process.
pub const BACKGROUND: &str = "background";
/// Context label for the bridging document.
pub const BRIDGE: &str = "bridge";
/// Context label for the embedded UI.
pub const FRAME: &str = "frame";

/// Logs a trace-level message, prefixed with a context label.
#[macro_export]
macro_rules! panel_trace {
    ($ctx:expr, $($arg:tt)*) => {{
        log::trace!("[{}] {}", $ctx, format_args!($($arg)*));
    }};
}

/// Logs a debug-level message, prefixed with a context label.
#[macro_export]
macro_rules! panel_debug {
    ($ctx:expr, $($arg:tt)*) => {{
        log::debug!("[{}] {}", $ctx, format_args!($($arg)*));
    }};
}

/// Logs an info-level message, prefixed with a context label.
#[macro_export]
macro_rules! panel_info {
    ($ctx:expr, $($arg:tt)*) => {{
        log::info!("[{}] {}", $ctx, format_args!($($arg)*));
    }};
}

/// Logs a warn-level message, prefixed with a context label.
#[macro_export]
macro_rules! panel_warn {
    ($ctx:expr, $($arg:tt)*) => {{
        log::warn!("[{}] {}", $ctx, format_args!($($arg)*));
    }};
}

/// Logs an error-level message, prefixed with a context label.
#[macro_export]
macro_rules! panel_error {
    ($ctx:expr, $($arg:tt)*) => {{
        log::error!("[{}] {}", $ctx, format_args!($($arg)*));
    }};
}

/// Initializes a simple terminal logger for use in unit tests.
///
/// This safely no-ops if another logger has already been initialized.
pub fn initialize_for_tests() {
    use simplelog::{ColorChoice, CombinedLogger, Config, TermLogger, TerminalMode};

    // Use debug level in debug builds, info in release builds.
    let level = if cfg!(debug_assertions) {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    // Ignore the error if a logger was already set by another test.
    let _ = CombinedLogger::init(vec![TermLogger::new(
        level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )]);
}
