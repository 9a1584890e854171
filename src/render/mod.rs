//! Document renderers
//!
//! A renderer turns the schema into one index document plus one document per
//! table. Renderers only produce text; where it goes is decided by
//! [`crate::output`].

mod markdown;

pub use markdown::Markdown;

use crate::schema::{Schema, TableId};

pub trait Renderer {
    /// File name of the whole-schema document
    fn index_file(&self) -> String;

    /// File name of the document for the table called `name`
    fn table_file(&self, name: &str) -> String;

    /// Render the whole-schema document. `er` tells whether an ER diagram
    /// image exists next to it.
    fn render_schema(&self, schema: &Schema, er: bool) -> String;

    /// Render the document for one table
    fn render_table(&self, schema: &Schema, table: TableId, er: bool) -> String;
}
