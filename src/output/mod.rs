//! Document output
//!
//! Renders the whole-schema unit and one unit per table, then writes them to
//! the configured directory or compares them with what is already there.

mod diff;

pub use diff::{diff_docs, unified_diff, DIFF_CONTEXT};

use crate::config::Settings;
use crate::error::{io_error, Result, SchemaError};
use crate::render::Renderer;
use crate::schema::Schema;
use std::path::{Path, PathBuf};
use tracing::info;

/// One rendered document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unit {
    /// File name inside the output directory
    pub file: String,
    pub text: String,
}

/// Render every unit of `schema` in output order: the index first, then
/// each live table.
pub fn render_units(schema: &Schema, settings: &Settings, renderer: &dyn Renderer) -> Vec<Unit> {
    let dir = Path::new(&settings.doc_path);
    let mut units = Vec::with_capacity(schema.table_ids().len() + 1);

    let er = er_exists(dir, "schema", settings);
    units.push(Unit {
        file: renderer.index_file(),
        text: renderer.render_schema(schema, er),
    });

    for table in schema.tables() {
        let er = er_exists(dir, &table.name, settings);
        units.push(Unit {
            file: renderer.table_file(&table.name),
            text: renderer.render_table(schema, table.id, er),
        });
    }
    units
}

fn er_exists(dir: &Path, stem: &str, settings: &Settings) -> bool {
    !settings.er.skip
        && dir
            .join(format!("{}.{}", stem, settings.er.format))
            .symlink_metadata()
            .is_ok()
}

/// Whether any document for `schema` already exists in `dir`.
///
/// One existing file is enough: the index or any single table document.
pub fn output_exists(schema: &Schema, dir: &Path, renderer: &dyn Renderer) -> bool {
    let exists = |file: String| dir.join(file).symlink_metadata().is_ok();
    exists(renderer.index_file()) || schema.tables().any(|t| exists(renderer.table_file(&t.name)))
}

/// Write every document into `settings.doc_path`.
///
/// Refuses to touch the directory when any document already exists, unless
/// `force` is set. Returns the written paths in output order.
pub fn write_docs(
    schema: &Schema,
    settings: &Settings,
    renderer: &dyn Renderer,
    force: bool,
) -> Result<Vec<PathBuf>> {
    let dir = Path::new(&settings.doc_path);
    if !force && output_exists(schema, dir, renderer) {
        return Err(SchemaError::OutputExists(dir.to_path_buf()));
    }
    std::fs::create_dir_all(dir).map_err(|e| io_error(dir, e))?;

    let mut written = Vec::new();
    for unit in render_units(schema, settings, renderer) {
        let path = dir.join(&unit.file);
        std::fs::write(&path, unit.text).map_err(|e| io_error(&path, e))?;
        info!("Wrote {}", path.display());
        written.push(path);
    }
    Ok(written)
}
