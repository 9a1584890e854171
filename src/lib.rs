//! schemadoc
//!
//! Documents a database schema as Markdown and detects when that
//! documentation has drifted from the database.
//!
//! The pipeline is: a data source builds the [`schema::Schema`] graph, the
//! [`relation`] resolver links foreign keys into it, [`transform`] applies the
//! configured merges, exclusions and ordering, and [`output`] renders the
//! result and writes or diffs it.

pub mod config;
pub mod datasource;
pub mod error;
pub mod lint;
pub mod output;
pub mod relation;
pub mod render;
pub mod schema;
pub mod transform;

pub use error::{ErrorKind, Result, SchemaError};
