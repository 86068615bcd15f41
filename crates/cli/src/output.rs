//! Terminal and JSON rendering of the build report.
//!
//! Per-stage progress goes through `tracing` on stderr; this module only
//! prints the final outcome.

use std::time::Duration;

use anyhow::Context;
use clap::ValueEnum;
use owo_colors::{OwoColorize, Stream};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
  #[default]
  Text,
  Json,
}

impl OutputFormat {
  pub fn is_json(self) -> bool {
    matches!(self, OutputFormat::Json)
  }
}

pub mod symbols {
  pub const SUCCESS: &str = "✓";
  pub const ERROR: &str = "✗";
  pub const WARNING: &str = "⚠";
  pub const ARROW: &str = "→";
}

/// Outcome class of a status line; picks symbol, color and stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Status {
  Success,
  Warning,
  Error,
}

impl Status {
  fn symbol(self) -> &'static str {
    match self {
      Status::Success => symbols::SUCCESS,
      Status::Warning => symbols::WARNING,
      Status::Error => symbols::ERROR,
    }
  }
}

fn print_status(status: Status, message: &str) {
  match status {
    Status::Success => println!(
      "{} {}",
      status.symbol().if_supports_color(Stream::Stdout, |s| s.green()),
      message
    ),
    Status::Warning => eprintln!(
      "{} {}",
      status.symbol().if_supports_color(Stream::Stderr, |s| s.yellow()),
      message.if_supports_color(Stream::Stderr, |s| s.yellow())
    ),
    Status::Error => eprintln!(
      "{} {}",
      status.symbol().if_supports_color(Stream::Stderr, |s| s.red()),
      message.if_supports_color(Stream::Stderr, |s| s.red())
    ),
  }
}

pub fn print_success(message: &str) {
  print_status(Status::Success, message);
}

pub fn print_warning(message: &str) {
  print_status(Status::Warning, message);
}

pub fn print_error(message: &str) {
  print_status(Status::Error, message);
}

/// Human form of a build duration; builds can take hours.
pub fn format_duration(duration: Duration) -> String {
  let secs = duration.as_secs();
  match secs {
    3600.. => format!("{}h {}m", secs / 3600, (secs % 3600) / 60),
    60.. => format!("{}m {}s", secs / 60, secs % 60),
    1.. => format!("{}.{:02}s", secs, duration.subsec_millis() / 10),
    0 => format!("{}ms", duration.subsec_millis()),
  }
}

/// `1 library`, `3 libraries`.
pub fn plural(count: usize, one: &str, many: &str) -> String {
  format!("{} {}", count, if count == 1 { one } else { many })
}

pub fn print_stat(label: &str, value: &str) {
  println!(
    "  {}: {}",
    label.if_supports_color(Stream::Stdout, |s| s.dimmed()),
    value
  );
}

/// One `<configuration> → <library>: <elapsed>` line of the report.
pub fn print_build_row(configuration: &str, library: &str, elapsed: Duration) {
  print_stat(
    &format!("{} {} {}", configuration, symbols::ARROW, library),
    &format_duration(elapsed),
  );
}

pub fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
  let json = serde_json::to_string_pretty(value).context("Failed to serialize build report")?;
  println!("{}", json);
  Ok(())
}
