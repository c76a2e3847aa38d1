//! Scaffold marker scan
//!
//! Exercises ship with `TODO` markers where the learner has to fill in code.
//! A source that still contains one is not finished, even if it builds and
//! produces the right output.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

use super::result::TodoMarker;

pub const SCAFFOLD_MARKER: &str = "TODO";

/// Every line containing the marker, case-insensitive
pub fn scan_for_markers(content: &str) -> Vec<TodoMarker> {
    let marker = SCAFFOLD_MARKER.to_ascii_lowercase();
    content
        .lines()
        .enumerate()
        .filter(|(_, line)| line.to_ascii_lowercase().contains(&marker))
        .map(|(i, line)| TodoMarker {
            line: i + 1,
            text: line.trim().to_string(),
        })
        .collect()
}

pub fn scan_file(path: &Path) -> Result<Vec<TodoMarker>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    Ok(scan_for_markers(&content))
}

/// Learner-facing report of remaining markers
pub fn describe_markers(markers: &[TodoMarker]) -> String {
    let mut message = format!(
        "Remove the {} scaffold marker(s) before this exercise counts as done:",
        markers.len()
    );
    for marker in markers {
        message.push_str(&format!("\n  line {}: {}", marker.line, marker.text));
    }
    message
}
