//! Config Transformer
//!
//! Applies configuration to an analyzed schema in a fixed order: merge the
//! additional relations and comments, exclude tables, then sort. Exclusion
//! runs after the merge so that it sees virtual relations; sorting runs last
//! so that it sees the final set of entities.

mod exclude;
mod merge;

pub use exclude::{exclude_table, exclude_tables};
pub use merge::{
    merge_additional_comments, merge_additional_data, merge_additional_relations,
    ADDITIONAL_RELATION_DEF,
};

use crate::config::Settings;
use crate::error::Result;
use crate::schema::Schema;
use tracing::info;

/// Apply every configured transformation to `schema`
pub fn modify_schema(schema: &mut Schema, settings: &Settings) -> Result<()> {
    merge_additional_data(schema, settings)?;
    exclude_tables(schema, &settings.exclude)?;
    if settings.format.sort {
        schema.sort();
    }
    info!(
        "Schema '{}' ready: {} tables, {} relations",
        schema.name,
        schema.table_ids().len(),
        schema.relation_ids().len()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AdditionalRelation;
    use crate::relation::resolve_relation;
    use crate::schema::{NewColumn, NewTable};

    #[test]
    fn test_exclude_sees_merged_relations() {
        let mut schema = Schema::new("testdb");
        let users = schema.add_table(NewTable::new("users"));
        schema.add_column(users, NewColumn::new("id", "integer"));
        let logs = schema.add_table(NewTable::new("logs"));
        schema.add_column(logs, NewColumn::new("user_id", "integer"));

        let settings = Settings {
            exclude: vec!["users".to_string()],
            relations: vec![AdditionalRelation {
                table: "logs".to_string(),
                columns: vec!["user_id".to_string()],
                parent_table: "users".to_string(),
                parent_columns: vec!["id".to_string()],
                def: None,
            }],
            ..Default::default()
        };

        let err = modify_schema(&mut schema, &settings).unwrap_err();
        assert_eq!(err.to_string(), "failed to exclude table 'users': 'users' is related by 'logs'");
    }

    #[test]
    fn test_sort_is_gated_by_format() {
        let mut schema = Schema::new("testdb");
        let b = schema.add_table(NewTable::new("b"));
        let a = schema.add_table(NewTable::new("a"));

        modify_schema(&mut schema, &Settings::default()).unwrap();
        assert_eq!(schema.table_ids(), &[b, a]);

        let mut settings = Settings::default();
        settings.format.sort = true;
        modify_schema(&mut schema, &settings).unwrap();
        assert_eq!(schema.table_ids(), &[a, b]);
    }

    #[test]
    fn test_full_pipeline_leaves_no_dangling_references() {
        let mut schema = Schema::new("testdb");
        let users = schema.add_table(NewTable::new("users"));
        schema.add_column(users, NewColumn::new("id", "integer"));
        let posts = schema.add_table(NewTable::new("posts"));
        schema.add_column(posts, NewColumn::new("id", "integer"));
        schema.add_column(posts, NewColumn::new("user_id", "integer"));
        let comments = schema.add_table(NewTable::new("comments"));
        schema.add_column(comments, NewColumn::new("post_id", "integer"));
        schema.add_column(comments, NewColumn::new("user_id", "integer"));
        resolve_relation(&mut schema, posts, "FOREIGN KEY (user_id) REFERENCES users (id)").unwrap();
        resolve_relation(&mut schema, comments, "FOREIGN KEY (post_id) REFERENCES posts (id)")
            .unwrap();

        let settings = Settings {
            exclude: vec!["comments".to_string()],
            relations: vec![AdditionalRelation {
                table: "comments".to_string(),
                columns: vec!["user_id".to_string()],
                parent_table: "users".to_string(),
                parent_columns: vec!["id".to_string()],
                def: None,
            }],
            ..Default::default()
        };
        modify_schema(&mut schema, &settings).unwrap();

        assert!(schema.find_table_by_name("comments").is_err());
        for relation in schema.relations() {
            assert_ne!(relation.table, comments);
            assert_ne!(relation.parent_table, comments);
        }
        for table in schema.tables() {
            for column in schema.columns_of(table.id) {
                for r in column.parent_relations.iter().chain(&column.child_relations) {
                    assert!(schema.relation_ids().contains(r));
                }
            }
        }
        assert_eq!(schema.relation_ids().len(), 1);
    }
}
