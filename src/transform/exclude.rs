//! Remove tables from the schema graph.
//!
//! A relation is reachable from three places: the schema's relation list and
//! the back-reference lists of the columns on either side. Excluding a table
//! prunes all three.

use crate::error::{Result, SchemaError};
use crate::schema::{RelationId, Schema, TableId};
use tracing::{debug, warn};

/// Exclude each named table in turn.
///
/// Exclusions that succeeded before a failing one stay applied.
pub fn exclude_tables<S: AsRef<str>>(schema: &mut Schema, names: &[S]) -> Result<()> {
    for name in names {
        exclude_table(schema, name.as_ref())?;
    }
    Ok(())
}

/// Exclude one table.
///
/// Fails without touching the graph if any relation references `name` as
/// its parent table. Relations declared on `name` are dropped together with
/// it. Unknown names are ignored.
pub fn exclude_table(schema: &mut Schema, name: &str) -> Result<()> {
    let Ok(excluded) = schema.find_table_by_name(name) else {
        warn!("Table '{}' is listed in exclude but does not exist", name);
        return Ok(());
    };

    if let Some(r) = schema.relations().find(|r| r.parent_table == excluded) {
        return Err(SchemaError::ExcludeGuard {
            table: name.to_string(),
            dependent: schema.table(r.table).name.clone(),
        });
    }

    let tables: Vec<TableId> = schema
        .table_ids()
        .iter()
        .copied()
        .filter(|t| *t != excluded)
        .collect();
    schema.set_table_ids(tables);

    for column in schema.live_column_ids() {
        let c = schema.column(column);
        let parents = surviving(schema, &c.parent_relations, excluded);
        let children = surviving(schema, &c.child_relations, excluded);
        let c = schema.column_mut(column);
        c.parent_relations = parents;
        c.child_relations = children;
    }

    let relations = surviving(schema, schema.relation_ids(), excluded);
    schema.set_relation_ids(relations);

    debug!("Excluded table '{}'", name);
    Ok(())
}

/// Relations in `ids` that are not declared on `excluded`
fn surviving(schema: &Schema, ids: &[RelationId], excluded: TableId) -> Vec<RelationId> {
    ids.iter()
        .copied()
        .filter(|r| schema.relation(*r).table != excluded)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::relation::resolve_relation;
    use crate::schema::tests::two_table_schema;
    use crate::schema::{NewColumn, NewTable};

    fn related_schema() -> (Schema, TableId, TableId) {
        let (mut schema, a, b) = two_table_schema();
        resolve_relation(&mut schema, b, "FOREIGN KEY (a_id) REFERENCES a (id)").unwrap();
        (schema, a, b)
    }

    #[test]
    fn test_excluding_a_parent_table_is_rejected() {
        let (mut schema, a, b) = related_schema();

        let err = exclude_tables(&mut schema, &["a"]).unwrap_err();

        assert_eq!(err.kind(), ErrorKind::IntegrityGuard);
        assert_eq!(err.to_string(), "failed to exclude table 'a': 'a' is related by 'b'");
        assert_eq!(schema.table_ids(), &[a, b]);
        assert_eq!(schema.relation_ids().len(), 1);
    }

    #[test]
    fn test_excluding_a_child_table_prunes_every_view() {
        let (mut schema, a, _) = related_schema();

        exclude_tables(&mut schema, &["b"]).unwrap();

        assert_eq!(schema.table_ids(), &[a]);
        assert!(schema.relation_ids().is_empty());
        let id = schema.find_column_by_name(a, "id").unwrap();
        assert!(schema.column(id).child_relations.is_empty());
        assert!(schema.find_table_by_name("b").is_err());
    }

    #[test]
    fn test_unrelated_exclude_keeps_relations() {
        let (mut schema, a, b) = related_schema();
        let c = schema.add_table(NewTable::new("c"));
        schema.add_column(c, NewColumn::new("id", "integer"));

        exclude_tables(&mut schema, &["c"]).unwrap();

        assert_eq!(schema.table_ids(), &[a, b]);
        assert_eq!(schema.relation_ids().len(), 1);
        let a_id = schema.find_column_by_name(b, "a_id").unwrap();
        assert_eq!(schema.column(a_id).parent_relations.len(), 1);
    }

    #[test]
    fn test_unknown_table_is_ignored() {
        let (mut schema, a, b) = related_schema();
        exclude_tables(&mut schema, &["zzz"]).unwrap();
        assert_eq!(schema.table_ids(), &[a, b]);
    }

    #[test]
    fn test_earlier_exclusions_stay_applied() {
        let (mut schema, a, b) = related_schema();
        let c = schema.add_table(NewTable::new("c"));
        schema.add_column(c, NewColumn::new("id", "integer"));

        let err = exclude_tables(&mut schema, &["c", "a"]).unwrap_err();

        assert_eq!(err.kind(), ErrorKind::IntegrityGuard);
        assert_eq!(schema.table_ids(), &[a, b]);
    }

    #[test]
    fn test_sequential_exclusion_releases_the_guard() {
        let (mut schema, _, _) = related_schema();

        exclude_tables(&mut schema, &["b", "a"]).unwrap();

        assert!(schema.table_ids().is_empty());
        assert!(schema.relation_ids().is_empty());
    }

    #[test]
    fn test_self_referencing_table_is_guarded() {
        let mut schema = Schema::new("testdb");
        let tree = schema.add_table(NewTable::new("tree"));
        schema.add_column(tree, NewColumn::new("id", "integer"));
        schema.add_column(tree, NewColumn::new("parent_id", "integer"));
        resolve_relation(&mut schema, tree, "FOREIGN KEY (parent_id) REFERENCES tree (id)").unwrap();

        let err = exclude_tables(&mut schema, &["tree"]).unwrap_err();

        assert_eq!(err.to_string(), "failed to exclude table 'tree': 'tree' is related by 'tree'");
        assert_eq!(schema.table_ids(), &[tree]);
    }
}
