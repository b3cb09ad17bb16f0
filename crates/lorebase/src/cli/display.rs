//! Display formatting for CLI output

use colored::*;

use crate::knowledge::SearchResult;

/// Wrap text to fit within a specified width
pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
  let mut lines = Vec::new();
  let mut current_line = String::new();

  for word in text.split_whitespace() {
    if current_line.is_empty() {
      current_line = word.to_string();
    } else if current_line.len() + 1 + word.len() <= width {
      current_line.push(' ');
      current_line.push_str(word);
    } else {
      lines.push(std::mem::take(&mut current_line));
      current_line = word.to_string();
    }
  }

  if !current_line.is_empty() {
    lines.push(current_line);
  }

  lines
}

/// Render extra payload fields as `key=value` pairs, sorted by key
pub fn format_extra(result: &SearchResult) -> String {
  result
    .extra
    .iter()
    .map(|(key, value)| match value.as_str() {
      Some(text) => format!("{key}={text}"),
      None => format!("{key}={value}"),
    })
    .collect::<Vec<_>>()
    .join("  ")
}

/// Print one ranked search result
pub fn display_search_result(rank: usize, result: &SearchResult) {
  println!("{} {}", format!("{rank}.").cyan().bold(), format!("[{:.3}]", result.score).yellow());

  for line in wrap_text(&result.text, 76) {
    println!("   {line}");
  }

  let extra = format_extra(result);
  if !extra.is_empty() {
    println!("   {}", extra.dimmed());
  }
  println!();
}
