//! ## Features
//!
//! - Standard logging levels (info, warn, error, verbose, debug, success)
//! - Multi-line message support with consistent prefixes
//! - Output to stderr, or forwarded to `tracing` once a subscriber owns output
//! - Verbose and debug lines are suppressed until [`set_verbose`] enables them
//!
//! ## Usage
//!
//! Functions take a `&str`: `info()`, `warn()`, `error()`, `verbose()`, `debug()`, `success()`.
//! The macros of the same name accept `format!` arguments.

use colored::*;
use std::sync::atomic::{AtomicBool, Ordering};

/// Target of the `tracing` events scribe emits; filter on it with `scribe=<level>`
pub const TRACING_TARGET: &str = "scribe";

static VERBOSE: AtomicBool = AtomicBool::new(false);
static FORWARD_TO_TRACING: AtomicBool = AtomicBool::new(false);

/// Severity of a log line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
  Verbose,
  Debug,
  Info,
  Success,
  Warn,
  Error,
}

impl Level {
  fn tag(self) -> &'static str {
    match self {
      Level::Verbose => "verb",
      Level::Debug => "debug",
      Level::Info => "info",
      Level::Success => "sccs",
      Level::Warn => "warn",
      Level::Error => "error",
    }
  }

  fn color(self) -> Color {
    match self {
      Level::Verbose => Color::Cyan,
      Level::Debug => Color::Magenta,
      Level::Info => Color::Blue,
      Level::Success => Color::Green,
      Level::Warn => Color::Yellow,
      Level::Error => Color::Red,
    }
  }

  fn is_chatty(self) -> bool {
    matches!(self, Level::Verbose | Level::Debug)
  }
}

/// Turn colors on only when stderr is attended by a person
pub fn init() {
  colored::control::set_override(console::user_attended_stderr());
}

/// Show or hide verbose and debug lines
pub fn set_verbose(enabled: bool) {
  VERBOSE.store(enabled, Ordering::Relaxed);
}

pub fn is_verbose() -> bool {
  VERBOSE.load(Ordering::Relaxed)
}

/// Route messages through `tracing` events instead of writing to stderr directly
pub fn forward_to_tracing(enabled: bool) {
  FORWARD_TO_TRACING.store(enabled, Ordering::Relaxed);
}

/// Install a `tracing_subscriber` fmt layer with the given default filter.
///
/// `RUST_LOG` overrides the default when set. Once installed, scribe output is
/// forwarded to the subscriber so lines are not printed twice.
pub fn init_subscriber(default_filter: &str) {
  use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

  let filter =
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

  if tracing_subscriber::registry()
    .with(fmt::layer().with_writer(std::io::stderr))
    .with(filter)
    .try_init()
    .is_ok()
  {
    forward_to_tracing(true);
  }
}

/// Format a colored prefix for log messages
fn format_prefix(level: Level) -> String {
  let tag = level.tag();
  format!("[{}]{:<width$}", tag.color(level.color()).bold(), "", width = 7 - tag.len() - 2)
}

/// Prefix every line of a message, the way it is written to stderr
pub fn render(level: Level, message: &str) -> Vec<String> {
  let prefix = format_prefix(level);
  message.lines().map(|line| format!("{prefix} {line}")).collect()
}

/// Core logging function that dispatches a message to the active sink
pub fn log(level: Level, message: &str) {
  if level.is_chatty() && !is_verbose() {
    return;
  }

  if FORWARD_TO_TRACING.load(Ordering::Relaxed) {
    emit_tracing_event(level, message);
    return;
  }

  for line in render(level, message) {
    eprintln!("{line}");
  }
}

fn emit_tracing_event(level: Level, message: &str) {
  match level {
    Level::Verbose => tracing::trace!(target: TRACING_TARGET, "{message}"),
    Level::Debug => tracing::debug!(target: TRACING_TARGET, "{message}"),
    Level::Info | Level::Success => tracing::info!(target: TRACING_TARGET, "{message}"),
    Level::Warn => tracing::warn!(target: TRACING_TARGET, "{message}"),
    Level::Error => tracing::error!(target: TRACING_TARGET, "{message}"),
  }
}

/// Verbose level logging - shown only when verbose mode is on
pub fn verbose(message: &str) {
  log(Level::Verbose, message);
}

/// Debug level logging - detailed diagnostic information
pub fn debug(message: &str) {
  log(Level::Debug, message);
}

/// Info level logging - general information
pub fn info(message: &str) {
  log(Level::Info, message);
}

/// Success level logging - something completed successfully
pub fn success(message: &str) {
  log(Level::Success, message);
}

/// Warning level logging - something needs attention
pub fn warn(message: &str) {
  log(Level::Warn, message);
}

/// Error level logging - something went wrong
pub fn error(message: &str) {
  log(Level::Error, message);
}

#[macro_export]
macro_rules! verbose {
  ($($arg:tt)+) => {
    $crate::verbose(&format!($($arg)+)) // LCOV_EXCL_LINE
  };
}

#[macro_export]
macro_rules! debug {
  ($($arg:tt)+) => {
    $crate::debug(&format!($($arg)+)) // LCOV_EXCL_LINE
  };
}

#[macro_export]
macro_rules! info {
  ($($arg:tt)+) => {
    $crate::info(&format!($($arg)+)) // LCOV_EXCL_LINE
  };
}

#[macro_export]
macro_rules! success {
  ($($arg:tt)+) => {
    $crate::success(&format!($($arg)+)) // LCOV_EXCL_LINE
  };
}

#[macro_export]
macro_rules! warn {
  ($($arg:tt)+) => {
    $crate::warn(&format!($($arg)+)) // LCOV_EXCL_LINE
  };
}

#[macro_export]
macro_rules! error {
  ($($arg:tt)+) => {
    $crate::error(&format!($($arg)+)) // LCOV_EXCL_LINE
  };
}
