//! Terminal output formatting.
//!
//! Provides consistent formatting for the build summary and the entry
//! listing, with colors degrading gracefully on non-terminal streams.

use std::time::Duration;

use girder_lib::execute::RunSummary;
use girder_lib::registry::Registry;
use owo_colors::{OwoColorize, Stream};

mod symbols {
  pub const SUCCESS: &str = "✓";
  pub const ERROR: &str = "✗";
  pub const SKIP: &str = "•";
  pub const ARROW: &str = "←";
}

pub fn print_summary(summary: &RunSummary) {
  for name in &summary.executed {
    println!(
      "{} {}",
      symbols::SUCCESS.if_supports_color(Stream::Stdout, |s| s.green()),
      name
    );
  }
  for name in &summary.up_to_date {
    println!(
      "{} {} {}",
      symbols::SKIP.if_supports_color(Stream::Stdout, |s| s.dimmed()),
      name,
      "(up to date)".if_supports_color(Stream::Stdout, |s| s.dimmed())
    );
  }

  println!();
  println!("Build complete!");
  println!("  Target: {}", summary.target);
  println!("  Executed: {}", summary.executed.len());
  println!("  Up to date: {}", summary.up_to_date.len());
  println!("  Elapsed: {}", format_duration(Duration::from_millis(summary.elapsed_ms)));
}

pub fn print_entries(registry: &Registry) {
  for entry in registry.entries() {
    let default = if entry.is_default() { " (default)" } else { "" };
    let deps = if entry.params().is_empty() {
      String::new()
    } else {
      format!(" {} {}", symbols::ARROW, entry.params().join(", "))
    };
    println!("{:<12} {}{}{}", entry.kind().to_string(), entry.name(), default, deps);
  }
}

pub fn print_error(message: &str) {
  eprintln!(
    "{} {}",
    symbols::ERROR.if_supports_color(Stream::Stderr, |s| s.red()),
    message.if_supports_color(Stream::Stderr, |s| s.red())
  );
}

fn format_duration(duration: Duration) -> String {
  let secs = duration.as_secs();
  let millis = duration.subsec_millis();

  if secs >= 60 {
    format!("{}m {}s", secs / 60, secs % 60)
  } else if secs > 0 {
    format!("{}.{:02}s", secs, millis / 10)
  } else {
    format!("{}ms", millis)
  }
}
