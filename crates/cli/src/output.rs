//! CLI output formatting utilities.

use owo_colors::{OwoColorize, Stream};

/// A green status verb followed by plain detail text.
pub fn status(verb: &str, detail: &str) {
  println!(
    "{} {}",
    verb.if_supports_color(Stream::Stdout, |t| t.green().to_string()),
    detail
  );
}

/// Dim bracketed annotations, e.g. `[user-set, directory]`.
pub fn annotation(labels: &[&str]) -> String {
  if labels.is_empty() {
    return String::new();
  }
  let text = format!("[{}]", labels.join(", "));
  format!(
    "  {}",
    text.if_supports_color(Stream::Stdout, |t| t.dimmed().to_string())
  )
}
