//! Serializable form of a [`Schema`].
//!
//! The arena uses indices, which are meaningless outside the process, so the
//! document form names every table and column instead. Loading a document
//! repairs the graph: relations are re-resolved by name and back-references
//! rebuilt.

use super::{
    Constraint, Driver, Index, NewColumn, NewRelation, NewTable, Schema, TableKind, Trigger,
};
use crate::error::{Result, ResultExt};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaDocument {
    pub name: String,
    #[serde(default)]
    pub tables: Vec<TableDocument>,
    #[serde(default)]
    pub relations: Vec<RelationDocument>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub driver: Option<Driver>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableDocument {
    pub name: String,
    #[serde(rename = "type", default = "default_table_type")]
    pub kind: String,
    #[serde(default)]
    pub comment: String,
    #[serde(default)]
    pub def: String,
    #[serde(default)]
    pub columns: Vec<ColumnDocument>,
    #[serde(default)]
    pub indexes: Vec<Index>,
    #[serde(default)]
    pub constraints: Vec<Constraint>,
    #[serde(default)]
    pub triggers: Vec<Trigger>,
}

fn default_table_type() -> String {
    TableKind::BaseTable.as_str().to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnDocument {
    pub name: String,
    #[serde(rename = "type")]
    pub data_type: String,
    #[serde(default)]
    pub nullable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
    #[serde(default)]
    pub comment: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationDocument {
    pub table: String,
    pub columns: Vec<String>,
    pub parent_table: String,
    pub parent_columns: Vec<String>,
    #[serde(default)]
    pub def: String,
    #[serde(default, rename = "virtual")]
    pub is_virtual: bool,
}

impl Schema {
    /// Export the live graph
    pub fn to_document(&self) -> SchemaDocument {
        let tables = self
            .tables()
            .map(|t| TableDocument {
                name: t.name.clone(),
                kind: t.kind.as_str().to_string(),
                comment: t.comment.clone(),
                def: t.def.clone(),
                columns: self
                    .columns_of(t.id)
                    .map(|c| ColumnDocument {
                        name: c.name.clone(),
                        data_type: c.data_type.clone(),
                        nullable: c.nullable,
                        default: c.default.clone(),
                        comment: c.comment.clone(),
                    })
                    .collect(),
                indexes: t.indexes.clone(),
                constraints: t.constraints.clone(),
                triggers: t.triggers.clone(),
            })
            .collect();

        let relations = self
            .relations()
            .map(|r| RelationDocument {
                table: self.table(r.table).name.clone(),
                columns: r.columns.iter().map(|c| self.column(*c).name.clone()).collect(),
                parent_table: self.table(r.parent_table).name.clone(),
                parent_columns: r
                    .parent_columns
                    .iter()
                    .map(|c| self.column(*c).name.clone())
                    .collect(),
                def: r.def.clone(),
                is_virtual: r.is_virtual,
            })
            .collect();

        SchemaDocument {
            name: self.name.clone(),
            tables,
            relations,
            driver: self.driver.clone(),
        }
    }

    /// Merge a document into this schema, re-linking its relations by name.
    ///
    /// Tables are appended after any already present, so several documents
    /// (or a document and a live database) can feed one schema.
    pub fn merge_document(&mut self, doc: SchemaDocument) -> Result<()> {
        self.name = doc.name;
        if doc.driver.is_some() {
            self.driver = doc.driver;
        }

        for t in doc.tables {
            let id = self.add_table(NewTable {
                name: t.name,
                kind: TableKind::from(t.kind.as_str()),
                comment: t.comment,
                def: t.def,
            });
            for c in t.columns {
                self.add_column(
                    id,
                    NewColumn {
                        name: c.name,
                        data_type: c.data_type,
                        nullable: c.nullable,
                        default: c.default,
                        comment: c.comment,
                    },
                );
            }
            let table = self.table_mut(id);
            table.indexes = t.indexes;
            table.constraints = t.constraints;
            table.triggers = t.triggers;
        }

        for r in doc.relations {
            let relation = self
                .resolve_relation_document(&r)
                .with_context(|| format!("failed to repair relation '{}' -> '{}'", r.table, r.parent_table))?;
            self.add_relation(relation);
        }
        Ok(())
    }

    /// Build a schema from a document
    pub fn from_document(doc: SchemaDocument) -> Result<Schema> {
        let mut schema = Schema::default();
        schema.merge_document(doc)?;
        Ok(schema)
    }

    fn resolve_relation_document(&self, r: &RelationDocument) -> Result<NewRelation> {
        let table = self.find_table_by_name(&r.table)?;
        let columns = self.find_columns_by_name(table, &r.columns)?;
        let parent_table = self.find_table_by_name(&r.parent_table)?;
        let parent_columns = self.find_columns_by_name(parent_table, &r.parent_columns)?;
        Ok(NewRelation {
            table,
            columns,
            parent_table,
            parent_columns,
            def: r.def.clone(),
            is_virtual: r.is_virtual,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    const DOC: &str = r#"{
        "name": "testdb",
        "tables": [
            {
                "name": "users",
                "type": "BASE TABLE",
                "comment": "Users table",
                "columns": [
                    { "name": "id", "type": "integer", "nullable": false },
                    { "name": "email", "type": "text", "nullable": false, "comment": "login" }
                ]
            },
            {
                "name": "posts",
                "columns": [
                    { "name": "id", "type": "integer" },
                    { "name": "user_id", "type": "integer", "nullable": true }
                ],
                "constraints": [
                    {
                        "name": "posts_user_id_fk",
                        "type": "FOREIGN_KEY",
                        "def": "FOREIGN KEY (user_id) REFERENCES users(id)",
                        "table": "posts",
                        "columns": ["user_id"],
                        "referenceTable": "users",
                        "referenceColumns": ["id"]
                    }
                ]
            }
        ],
        "relations": [
            {
                "table": "posts",
                "columns": ["user_id"],
                "parentTable": "users",
                "parentColumns": ["id"],
                "def": "FOREIGN KEY (user_id) REFERENCES users(id)"
            }
        ],
        "driver": { "name": "postgres", "databaseVersion": "16.2" }
    }"#;

    #[test]
    fn test_from_document_repairs_back_references() {
        let doc: SchemaDocument = serde_json::from_str(DOC).unwrap();
        let schema = Schema::from_document(doc).unwrap();

        assert_eq!(schema.name, "testdb");
        assert_eq!(schema.table_ids().len(), 2);
        assert_eq!(schema.relation_ids().len(), 1);

        let users = schema.find_table_by_name("users").unwrap();
        let posts = schema.find_table_by_name("posts").unwrap();
        assert_eq!(schema.table(posts).kind, TableKind::BaseTable);
        let id = schema.find_column_by_name(users, "id").unwrap();
        let user_id = schema.find_column_by_name(posts, "user_id").unwrap();
        let r = schema.relation_ids()[0];
        assert_eq!(schema.column(id).child_relations, vec![r]);
        assert_eq!(schema.column(user_id).parent_relations, vec![r]);
        assert_eq!(schema.driver.as_ref().unwrap().database_version, "16.2");
    }

    #[test]
    fn test_document_survives_export() {
        let doc: SchemaDocument = serde_json::from_str(DOC).unwrap();
        let schema = Schema::from_document(doc.clone()).unwrap();
        assert_eq!(schema.to_document(), doc);
    }

    #[test]
    fn test_unknown_relation_table_is_a_lookup_error() {
        let mut doc: SchemaDocument = serde_json::from_str(DOC).unwrap();
        doc.relations[0].parent_table = "accounts".to_string();

        let err = Schema::from_document(doc).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Lookup);
        assert!(err.to_string().contains("table 'accounts' not found"));
    }
}
