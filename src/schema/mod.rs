//! Schema Model
//!
//! The normalized, cross-referenced graph of tables, columns and relations.
//!
//! Tables, columns and relations reference each other in cycles (a column
//! knows the relations it takes part in, a relation knows its columns), so
//! every node lives in an arena owned by [`Schema`] and is addressed by a
//! typed index. The live view of the schema is the ordered `tables` and
//! `relations` id lists: removing an id from those lists (and from the
//! column back-reference lists) removes the node from the graph.

pub mod document;
mod sort;

pub use document::SchemaDocument;

use crate::error::{Result, SchemaError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Index of a [`Table`] in the schema arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TableId(usize);

/// Index of a [`Column`] in the schema arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ColumnId(usize);

/// Index of a [`Relation`] in the schema arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RelationId(usize);

/// Database engine metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Driver {
    pub name: String,
    pub database_version: String,
}

/// Kind of table reported by the engine
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TableKind {
    #[default]
    BaseTable,
    View,
    /// Engine-specific kind kept verbatim (e.g. "MATERIALIZED VIEW")
    Other(String),
}

impl TableKind {
    pub fn as_str(&self) -> &str {
        match self {
            TableKind::BaseTable => "BASE TABLE",
            TableKind::View => "VIEW",
            TableKind::Other(kind) => kind,
        }
    }
}

impl From<&str> for TableKind {
    fn from(kind: &str) -> Self {
        match kind {
            "BASE TABLE" => TableKind::BaseTable,
            "VIEW" => TableKind::View,
            other => TableKind::Other(other.to_string()),
        }
    }
}

impl fmt::Display for TableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Constraint classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConstraintKind {
    PrimaryKey,
    Unique,
    ForeignKey,
    Check,
    Unknown,
}

impl ConstraintKind {
    pub fn as_sql(&self) -> &'static str {
        match self {
            ConstraintKind::PrimaryKey => "PRIMARY KEY",
            ConstraintKind::Unique => "UNIQUE",
            ConstraintKind::ForeignKey => "FOREIGN KEY",
            ConstraintKind::Check => "CHECK",
            ConstraintKind::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for ConstraintKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_sql())
    }
}

/// Table constraint as reported by the engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Constraint {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ConstraintKind,
    pub def: String,
    pub table: String,
    #[serde(default)]
    pub columns: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_table: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub reference_columns: Vec<String>,
}

/// Index representation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Index {
    pub name: String,
    pub def: String,
    pub table: String,
    #[serde(default)]
    pub columns: Vec<String>,
}

/// Trigger representation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trigger {
    pub name: String,
    pub def: String,
}

/// Table node
#[derive(Debug, Clone)]
pub struct Table {
    pub id: TableId,
    pub name: String,
    pub kind: TableKind,
    pub comment: String,
    pub def: String,
    pub columns: Vec<ColumnId>,
    pub indexes: Vec<Index>,
    pub constraints: Vec<Constraint>,
    pub triggers: Vec<Trigger>,
}

/// Column node
#[derive(Debug, Clone)]
pub struct Column {
    pub id: ColumnId,
    pub table: TableId,
    pub name: String,
    pub data_type: String,
    pub nullable: bool,
    pub default: Option<String>,
    pub comment: String,
    /// Relations in which this column is on the foreign-key side
    pub parent_relations: Vec<RelationId>,
    /// Relations in which this column is on the referenced side
    pub child_relations: Vec<RelationId>,
}

/// Relation (edge) between a foreign-key side and a referenced side
#[derive(Debug, Clone)]
pub struct Relation {
    pub id: RelationId,
    pub table: TableId,
    pub columns: Vec<ColumnId>,
    pub parent_table: TableId,
    pub parent_columns: Vec<ColumnId>,
    pub def: String,
    /// Declared in configuration rather than derived from a constraint
    pub is_virtual: bool,
}

/// Facts needed to create a table
#[derive(Debug, Clone, Default)]
pub struct NewTable {
    pub name: String,
    pub kind: TableKind,
    pub comment: String,
    pub def: String,
}

impl NewTable {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}

/// Facts needed to create a column
#[derive(Debug, Clone, Default)]
pub struct NewColumn {
    pub name: String,
    pub data_type: String,
    pub nullable: bool,
    pub default: Option<String>,
    pub comment: String,
}

impl NewColumn {
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
            ..Default::default()
        }
    }
}

/// A fully resolved relation ready to be linked into the graph
#[derive(Debug, Clone)]
pub struct NewRelation {
    pub table: TableId,
    pub columns: Vec<ColumnId>,
    pub parent_table: TableId,
    pub parent_columns: Vec<ColumnId>,
    pub def: String,
    pub is_virtual: bool,
}

/// Root of the graph
#[derive(Debug, Clone, Default)]
pub struct Schema {
    pub name: String,
    pub driver: Option<Driver>,
    table_arena: Vec<Table>,
    column_arena: Vec<Column>,
    relation_arena: Vec<Relation>,
    tables: Vec<TableId>,
    relations: Vec<RelationId>,
}

impl Schema {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Append a table to the schema
    pub fn add_table(&mut self, new: NewTable) -> TableId {
        let id = TableId(self.table_arena.len());
        self.table_arena.push(Table {
            id,
            name: new.name,
            kind: new.kind,
            comment: new.comment,
            def: new.def,
            columns: Vec::new(),
            indexes: Vec::new(),
            constraints: Vec::new(),
            triggers: Vec::new(),
        });
        self.tables.push(id);
        id
    }

    /// Append a column to a table
    pub fn add_column(&mut self, table: TableId, new: NewColumn) -> ColumnId {
        let id = ColumnId(self.column_arena.len());
        self.column_arena.push(Column {
            id,
            table,
            name: new.name,
            data_type: new.data_type,
            nullable: new.nullable,
            default: new.default,
            comment: new.comment,
            parent_relations: Vec::new(),
            child_relations: Vec::new(),
        });
        self.table_arena[table.0].columns.push(id);
        id
    }

    /// Link a resolved relation into the graph.
    ///
    /// Appends it to the schema's relation list and registers it on every
    /// foreign-key column (`parent_relations`) and every referenced column
    /// (`child_relations`).
    pub fn add_relation(&mut self, new: NewRelation) -> RelationId {
        let id = RelationId(self.relation_arena.len());
        for column in &new.columns {
            self.column_arena[column.0].parent_relations.push(id);
        }
        for column in &new.parent_columns {
            self.column_arena[column.0].child_relations.push(id);
        }
        self.relation_arena.push(Relation {
            id,
            table: new.table,
            columns: new.columns,
            parent_table: new.parent_table,
            parent_columns: new.parent_columns,
            def: new.def,
            is_virtual: new.is_virtual,
        });
        self.relations.push(id);
        id
    }

    pub fn table(&self, id: TableId) -> &Table {
        &self.table_arena[id.0]
    }

    pub fn table_mut(&mut self, id: TableId) -> &mut Table {
        &mut self.table_arena[id.0]
    }

    pub fn column(&self, id: ColumnId) -> &Column {
        &self.column_arena[id.0]
    }

    pub fn column_mut(&mut self, id: ColumnId) -> &mut Column {
        &mut self.column_arena[id.0]
    }

    pub fn relation(&self, id: RelationId) -> &Relation {
        &self.relation_arena[id.0]
    }

    /// Live tables in document order
    pub fn table_ids(&self) -> &[TableId] {
        &self.tables
    }

    /// Live relations in document order
    pub fn relation_ids(&self) -> &[RelationId] {
        &self.relations
    }

    pub fn tables(&self) -> impl Iterator<Item = &Table> + '_ {
        self.tables.iter().map(move |id| self.table(*id))
    }

    pub fn relations(&self) -> impl Iterator<Item = &Relation> + '_ {
        self.relations.iter().map(move |id| self.relation(*id))
    }

    pub fn columns_of(&self, table: TableId) -> impl Iterator<Item = &Column> + '_ {
        self.table(table).columns.iter().map(move |id| self.column(*id))
    }

    /// Name of the table a relation is declared on
    pub fn relation_table_name(&self, id: RelationId) -> &str {
        &self.table(self.relation(id).table).name
    }

    /// Name of the table a relation references
    pub fn relation_parent_table_name(&self, id: RelationId) -> &str {
        &self.table(self.relation(id).parent_table).name
    }

    /// Find a live table by exact name; the first match wins
    pub fn find_table_by_name(&self, name: &str) -> Result<TableId> {
        self.tables
            .iter()
            .copied()
            .find(|id| self.table(*id).name == name)
            .ok_or_else(|| SchemaError::TableNotFound(name.to_string()))
    }

    /// Find a column of `table` by exact name; the first match wins
    pub fn find_column_by_name(&self, table: TableId, name: &str) -> Result<ColumnId> {
        let t = self.table(table);
        t.columns
            .iter()
            .copied()
            .find(|id| self.column(*id).name == name)
            .ok_or_else(|| SchemaError::ColumnNotFound {
                table: t.name.clone(),
                column: name.to_string(),
            })
    }

    /// Resolve a list of column names on `table`, preserving order
    pub fn find_columns_by_name<S: AsRef<str>>(
        &self,
        table: TableId,
        names: &[S],
    ) -> Result<Vec<ColumnId>> {
        names
            .iter()
            .map(|name| self.find_column_by_name(table, name.as_ref()))
            .collect()
    }

    /// Replace the live table list. Crate-internal: used by exclusion and sorting.
    pub(crate) fn set_table_ids(&mut self, tables: Vec<TableId>) {
        self.tables = tables;
    }

    pub(crate) fn set_relation_ids(&mut self, relations: Vec<RelationId>) {
        self.relations = relations;
    }

    /// Ids of every column of every live table
    pub(crate) fn live_column_ids(&self) -> Vec<ColumnId> {
        self.tables
            .iter()
            .flat_map(|id| self.table(*id).columns.iter().copied())
            .collect()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Tables `a(id)` and `b(id, a_id)`, no relations yet
    pub(crate) fn two_table_schema() -> (Schema, TableId, TableId) {
        let mut schema = Schema::new("testdb");
        let a = schema.add_table(NewTable::new("a"));
        schema.add_column(a, NewColumn::new("id", "integer"));
        let b = schema.add_table(NewTable::new("b"));
        schema.add_column(b, NewColumn::new("id", "integer"));
        schema.add_column(
            b,
            NewColumn {
                nullable: true,
                ..NewColumn::new("a_id", "integer")
            },
        );
        (schema, a, b)
    }

    #[test]
    fn test_find_table_and_column() {
        let (schema, _, b) = two_table_schema();

        assert_eq!(schema.find_table_by_name("b").unwrap(), b);
        let col = schema.find_column_by_name(b, "a_id").unwrap();
        assert_eq!(schema.column(col).name, "a_id");
        assert_eq!(schema.column(col).table, b);
        assert!(schema.column(col).nullable);
    }

    #[test]
    fn test_lookup_failures_name_the_missing_entity() {
        let (schema, a, _) = two_table_schema();

        let err = schema.find_table_by_name("zzz").unwrap_err();
        assert_eq!(err.to_string(), "table 'zzz' not found");

        let err = schema.find_column_by_name(a, "nope").unwrap_err();
        assert_eq!(err.to_string(), "column 'nope' not found in table 'a'");
    }

    #[test]
    fn test_add_relation_links_both_sides() {
        let (mut schema, a, b) = two_table_schema();
        let fk = schema.find_column_by_name(b, "a_id").unwrap();
        let pk = schema.find_column_by_name(a, "id").unwrap();

        let r = schema.add_relation(NewRelation {
            table: b,
            columns: vec![fk],
            parent_table: a,
            parent_columns: vec![pk],
            def: "FOREIGN KEY (a_id) REFERENCES a (id)".to_string(),
            is_virtual: false,
        });

        assert_eq!(schema.relation_ids(), &[r]);
        assert_eq!(schema.column(fk).parent_relations, vec![r]);
        assert_eq!(schema.column(pk).child_relations, vec![r]);
        assert_eq!(schema.relation_table_name(r), "b");
        assert_eq!(schema.relation_parent_table_name(r), "a");
    }

    #[test]
    fn test_table_kind_round_trips_engine_text() {
        assert_eq!(TableKind::from("VIEW"), TableKind::View);
        assert_eq!(
            TableKind::from("MATERIALIZED VIEW").as_str(),
            "MATERIALIZED VIEW"
        );
    }
}
