//! Drift detection
//!
//! Compares freshly rendered documents with the ones on disk and reports
//! the difference as a unified diff.

use super::render_units;
use crate::config::Settings;
use crate::error::{io_error, Result};
use crate::render::Renderer;
use crate::schema::Schema;
use similar::TextDiff;
use std::io::ErrorKind;
use std::path::Path;
use tracing::debug;

/// Lines of context around each hunk
pub const DIFF_CONTEXT: usize = 3;

/// Line-based unified diff of `a` against `b`.
///
/// Returns the empty string exactly when the two texts are identical.
pub fn unified_diff(a: &str, b: &str, from: &str, to: &str) -> String {
    if a == b {
        return String::new();
    }
    TextDiff::from_lines(a, b)
        .unified_diff()
        .context_radius(DIFF_CONTEXT)
        .header(from, to)
        .to_string()
}

/// Diff every rendered unit against its persisted document.
///
/// A missing document counts as empty. Each changed unit contributes a
/// `diff <from> <to>` line followed by its hunks; an empty result means the
/// documentation is up to date.
pub fn diff_docs(schema: &Schema, settings: &Settings, renderer: &dyn Renderer) -> Result<String> {
    let dir = Path::new(&settings.doc_path);
    let from = settings.masked_dsn();
    let mut out = String::new();

    for unit in render_units(schema, settings, renderer) {
        let path = dir.join(&unit.file);
        let persisted = match std::fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => String::new(),
            Err(e) => return Err(io_error(&path, e)),
        };

        let to = path.display().to_string();
        let diff = unified_diff(&unit.text, &persisted, &from, &to);
        if diff.is_empty() {
            continue;
        }
        debug!("{} has drifted", to);
        out.push_str(&format!("diff {} {}\n", from, to));
        out.push_str(&diff);
    }
    Ok(out)
}
