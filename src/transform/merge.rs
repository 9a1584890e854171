//! Merge user-declared relations and comments into the schema graph.

use crate::config::{AdditionalComment, AdditionalRelation, Settings};
use crate::error::{Result, ResultExt};
use crate::schema::{ColumnId, NewRelation, Schema};
use tracing::debug;

/// Definition text of a virtual relation declared without one
pub const ADDITIONAL_RELATION_DEF: &str = "Additional Relation";

/// Merge configured relations, then configured comments
pub fn merge_additional_data(schema: &mut Schema, settings: &Settings) -> Result<()> {
    merge_additional_relations(schema, &settings.relations)?;
    merge_additional_comments(schema, &settings.comments)?;
    Ok(())
}

/// Add every configured relation as a virtual relation.
///
/// Stops at the first relation that names an unknown table or column; that
/// relation is not added, relations merged before it are kept.
pub fn merge_additional_relations(
    schema: &mut Schema,
    relations: &[AdditionalRelation],
) -> Result<()> {
    for r in relations {
        let relation = resolve_additional_relation(schema, r).with_context(|| {
            format!(
                "failed to add relation '{}({})' -> '{}({})'",
                r.table,
                r.columns.join(", "),
                r.parent_table,
                r.parent_columns.join(", ")
            )
        })?;
        schema.add_relation(relation);
        debug!("Merged additional relation {} -> {}", r.table, r.parent_table);
    }
    Ok(())
}

fn resolve_additional_relation(schema: &Schema, r: &AdditionalRelation) -> Result<NewRelation> {
    let table = schema.find_table_by_name(&r.table)?;
    let columns = schema.find_columns_by_name(table, &r.columns)?;
    let parent_table = schema.find_table_by_name(&r.parent_table)?;
    let parent_columns = schema.find_columns_by_name(parent_table, &r.parent_columns)?;
    Ok(NewRelation {
        table,
        columns,
        parent_table,
        parent_columns,
        def: r
            .def
            .clone()
            .filter(|d| !d.is_empty())
            .unwrap_or_else(|| ADDITIONAL_RELATION_DEF.to_string()),
        is_virtual: true,
    })
}

/// Overwrite table and column comments.
///
/// An empty table comment leaves the existing comment in place. Every name in
/// a spec is resolved before any of its comments are written.
pub fn merge_additional_comments(
    schema: &mut Schema,
    comments: &[AdditionalComment],
) -> Result<()> {
    for c in comments {
        let context = || format!("failed to add comment to table '{}'", c.table);
        let table = schema.find_table_by_name(&c.table).with_context(context)?;
        let columns: Vec<(ColumnId, &String)> = c
            .column_comments
            .iter()
            .map(|(name, comment)| {
                schema
                    .find_column_by_name(table, name)
                    .map(|column| (column, comment))
            })
            .collect::<Result<_>>()
            .with_context(context)?;

        if !c.table_comment.is_empty() {
            schema.table_mut(table).comment = c.table_comment.clone();
        }
        for (column, comment) in columns {
            schema.column_mut(column).comment = comment.clone();
        }
    }
    Ok(())
}
