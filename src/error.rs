//! Error handling module
//!
//! One error type for the whole crate. Every failure carries enough context
//! to name the table, column or configuration entry that caused it.

use std::path::PathBuf;
use thiserror::Error;

/// Crate-wide error type
#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("table '{0}' not found")]
    TableNotFound(String),

    #[error("column '{column}' not found in table '{table}'")]
    ColumnNotFound { table: String, column: String },

    #[error("failed to exclude table '{table}': '{table}' is related by '{dependent}'")]
    ExcludeGuard { table: String, dependent: String },

    #[error("invalid constraint definition '{def}': {reason}")]
    Parse { def: String, reason: String },

    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("output files already exist in {}", .0.display())]
    OutputExists(PathBuf),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Database error: {0}")]
    Database(#[from] tokio_postgres::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("unsupported data source '{0}'")]
    UnsupportedSource(String),

    #[error("{context}: {source}")]
    Context {
        context: String,
        #[source]
        source: Box<SchemaError>,
    },
}

/// Coarse classification of a [`SchemaError`], looking through context layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A named table or column does not exist
    Lookup,
    /// An exclude would orphan the referenced side of a relation
    IntegrityGuard,
    /// A constraint definition does not match the expected grammar
    Parse,
    Io,
    OutputExists,
    Config,
    Database,
    Serialization,
    UnsupportedSource,
}

impl SchemaError {
    /// The innermost error, with all context layers removed
    pub fn root(&self) -> &SchemaError {
        let mut err = self;
        while let SchemaError::Context { source, .. } = err {
            err = source;
        }
        err
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            SchemaError::TableNotFound(_) | SchemaError::ColumnNotFound { .. } => ErrorKind::Lookup,
            SchemaError::ExcludeGuard { .. } => ErrorKind::IntegrityGuard,
            SchemaError::Parse { .. } => ErrorKind::Parse,
            SchemaError::Io { .. } => ErrorKind::Io,
            SchemaError::OutputExists(_) => ErrorKind::OutputExists,
            SchemaError::Config(_) => ErrorKind::Config,
            SchemaError::Database(_) => ErrorKind::Database,
            SchemaError::Json(_) | SchemaError::Yaml(_) => ErrorKind::Serialization,
            SchemaError::UnsupportedSource(_) => ErrorKind::UnsupportedSource,
            SchemaError::Context { source, .. } => source.kind(),
        }
    }

    /// Wrap this error with a description of the operation that failed
    pub fn context(self, context: impl Into<String>) -> Self {
        SchemaError::Context {
            context: context.into(),
            source: Box::new(self),
        }
    }
}

/// Result type alias used throughout the crate
pub type Result<T> = std::result::Result<T, SchemaError>;

/// Context helpers for [`Result`]
pub trait ResultExt<T> {
    fn context(self, context: impl Into<String>) -> Result<T>;

    fn with_context<F, S>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> S,
        S: Into<String>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.context(context))
    }

    fn with_context<F, S>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> S,
        S: Into<String>,
    {
        self.map_err(|e| e.context(f()))
    }
}

/// Helper function to create an I/O error bound to a path
pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> SchemaError {
    SchemaError::Io {
        path: path.into(),
        source,
    }
}

/// Helper function to create a constraint parse error
pub fn parse_error(def: &str, reason: impl Into<String>) -> SchemaError {
    SchemaError::Parse {
        def: def.to_string(),
        reason: reason.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_looks_through_context() {
        let err = SchemaError::TableNotFound("zzz".to_string())
            .context("failed to add relation")
            .context("failed to merge additional data");

        assert_eq!(err.kind(), ErrorKind::Lookup);
        assert_eq!(
            err.to_string(),
            "failed to merge additional data: failed to add relation: table 'zzz' not found"
        );
    }

    #[test]
    fn test_exclude_guard_message_names_both_tables() {
        let err = SchemaError::ExcludeGuard {
            table: "a".to_string(),
            dependent: "b".to_string(),
        };
        assert_eq!(err.kind(), ErrorKind::IntegrityGuard);
        assert_eq!(
            err.to_string(),
            "failed to exclude table 'a': 'a' is related by 'b'"
        );
    }
}
