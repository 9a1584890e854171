//! Relation Resolver
//!
//! Turns a foreign-key constraint definition such as
//! `FOREIGN KEY (a, b) REFERENCES other (x, y)` into a [`Relation`] linked
//! into the schema graph.
//!
//! [`Relation`]: crate::schema::Relation

use crate::error::{parse_error, Result};
use crate::schema::{NewRelation, RelationId, Schema, TableId};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

static FOREIGN_KEY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"(?is)FOREIGN\s+KEY\s*\(([^)]*)\)\s*REFERENCES\s+",
        r#"((?:"[^"]*"|`[^`]*`|[^\s(."`]+)(?:\.(?:"[^"]*"|`[^`]*`|[^\s(."`]+))*)"#,
        r"\s*\(([^)]*)\)",
    ))
    .expect("foreign key pattern is valid")
});

/// One segment of a possibly qualified table name
static NAME_SEGMENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#""[^"]*"|`[^`]*`|[^."`]+"#).expect("name segment pattern is valid")
});

/// The parts of a parsed foreign-key definition, in textual order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignKeyDef {
    pub columns: Vec<String>,
    pub parent_table: String,
    pub parent_columns: Vec<String>,
}

/// Parse a foreign-key definition.
///
/// Identifiers may be quoted with `"` or backticks; quotes are removed. Text
/// after the referenced column list (`ON DELETE ...`, `DEFERRABLE`, ...) is
/// ignored.
pub fn parse_foreign_key(def: &str) -> Result<ForeignKeyDef> {
    let caps = FOREIGN_KEY
        .captures(def)
        .ok_or_else(|| parse_error(def, "expected FOREIGN KEY (...) REFERENCES table (...)"))?;

    let columns = split_identifiers(def, &caps[1])?;
    let parent_table = NAME_SEGMENT
        .find_iter(&caps[2])
        .map(|segment| unquote(segment.as_str()))
        .collect::<Vec<_>>()
        .join(".");
    if parent_table.is_empty() {
        return Err(parse_error(def, "empty referenced table name"));
    }
    let parent_columns = split_identifiers(def, &caps[3])?;

    if columns.len() != parent_columns.len() {
        return Err(parse_error(
            def,
            format!(
                "{} foreign key columns but {} referenced columns",
                columns.len(),
                parent_columns.len()
            ),
        ));
    }

    Ok(ForeignKeyDef {
        columns,
        parent_table,
        parent_columns,
    })
}

fn split_identifiers(def: &str, list: &str) -> Result<Vec<String>> {
    list.split(',')
        .map(|ident| {
            let ident = unquote(ident);
            if ident.is_empty() {
                Err(parse_error(def, "empty identifier in column list"))
            } else {
                Ok(ident)
            }
        })
        .collect()
}

fn unquote(ident: &str) -> String {
    let ident = ident.trim();
    let quoted = ident.len() >= 2
        && ((ident.starts_with('"') && ident.ends_with('"'))
            || (ident.starts_with('`') && ident.ends_with('`')));
    if quoted {
        ident[1..ident.len() - 1].to_string()
    } else {
        ident.to_string()
    }
}

/// Resolve `def`, declared on `table`, into a relation and link it into the graph.
///
/// Every name is looked up before anything is mutated: a missing column or
/// referenced table leaves the schema untouched.
pub fn resolve_relation(schema: &mut Schema, table: TableId, def: &str) -> Result<RelationId> {
    let fk = parse_foreign_key(def)?;
    link_foreign_key(schema, table, def, &fk)
}

/// Link an already parsed foreign key declared on `table`.
///
/// Drivers use this when they need to adjust the parsed names (for example
/// to drop a schema qualifier) before resolution.
pub fn link_foreign_key(
    schema: &mut Schema,
    table: TableId,
    def: &str,
    fk: &ForeignKeyDef,
) -> Result<RelationId> {
    let columns = schema.find_columns_by_name(table, &fk.columns)?;
    let parent_table = schema.find_table_by_name(&fk.parent_table)?;
    let parent_columns = schema.find_columns_by_name(parent_table, &fk.parent_columns)?;

    let id = schema.add_relation(NewRelation {
        table,
        columns,
        parent_table,
        parent_columns,
        def: def.to_string(),
        is_virtual: false,
    });

    debug!(
        "Resolved relation {}({}) -> {}({})",
        schema.table(table).name,
        fk.columns.join(", "),
        fk.parent_table,
        fk.parent_columns.join(", ")
    );
    Ok(id)
}
