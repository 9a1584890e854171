//! JSON schema documents

use crate::error::{io_error, Result, ResultExt, SchemaError};
use crate::schema::{Schema, SchemaDocument};
use std::path::Path;
use tracing::debug;

/// Read a [`SchemaDocument`] from `path` and merge it into `schema`
pub fn analyze_json(path: &Path, schema: &mut Schema) -> Result<()> {
    let text = std::fs::read_to_string(path).map_err(|e| io_error(path, e))?;
    let doc: SchemaDocument = serde_json::from_str(&text)
        .map_err(SchemaError::from)
        .with_context(|| format!("invalid schema document {}", path.display()))?;
    debug!("Loaded {} tables from {}", doc.tables.len(), path.display());
    schema.merge_document(doc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn fixture() -> &'static Path {
        Path::new(concat!(env!("CARGO_MANIFEST_DIR"), "/testdata/app.json"))
    }

    #[test]
    fn test_load_fixture() {
        let mut schema = Schema::default();
        analyze_json(fixture(), &mut schema).unwrap();

        assert_eq!(schema.name, "app");
        assert_eq!(schema.table_ids().len(), 4);
        assert_eq!(schema.relation_ids().len(), 3);
        assert_eq!(schema.driver.as_ref().unwrap().name, "postgres");

        let users = schema.find_table_by_name("users").unwrap();
        let id = schema.find_column_by_name(users, "id").unwrap();
        assert_eq!(schema.column(id).child_relations.len(), 2);
    }

    #[test]
    fn test_invalid_json_is_a_serialization_error() {
        let path = std::env::temp_dir().join(format!("schemadoc-invalid-{}.json", std::process::id()));
        std::fs::write(&path, "{ not json").unwrap();

        let err = analyze_json(&path, &mut Schema::default()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Serialization);
    }
}
