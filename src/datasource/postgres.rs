//! PostgreSQL driver
//!
//! Reads tables, views, columns, constraints, indexes and triggers from the
//! system catalogs. Foreign keys are resolved only after every table has been
//! loaded, since a constraint may reference a table that comes later.

use crate::error::{Result, ResultExt};
use crate::relation::{link_foreign_key, parse_foreign_key};
use crate::schema::{
    Constraint, ConstraintKind, Driver, Index, NewColumn, NewTable, Schema, TableId, TableKind,
    Trigger,
};
use tokio_postgres::{Client, NoTls};
use tracing::{debug, error};

const TABLES_QUERY: &str = r#"
    SELECT
        cls.oid AS oid,
        ns.nspname AS schema_name,
        cls.relname AS table_name,
        CASE cls.relkind
            WHEN 'r' THEN 'BASE TABLE'
            WHEN 'p' THEN 'BASE TABLE'
            WHEN 'v' THEN 'VIEW'
            WHEN 'm' THEN 'MATERIALIZED VIEW'
            WHEN 'f' THEN 'FOREIGN TABLE'
        END AS table_type,
        COALESCE(obj_description(cls.oid, 'pg_class'), '') AS comment,
        CASE WHEN cls.relkind IN ('v', 'm') THEN pg_get_viewdef(cls.oid) END AS view_def
    FROM pg_class cls
    JOIN pg_namespace ns ON ns.oid = cls.relnamespace
    WHERE ns.nspname NOT IN ('pg_catalog', 'information_schema')
      AND ns.nspname NOT LIKE 'pg_toast%'
      AND cls.relkind IN ('r', 'p', 'v', 'm', 'f')
    ORDER BY ns.nspname, cls.relname
"#;

const COLUMNS_QUERY: &str = r#"
    SELECT
        attr.attname AS column_name,
        format_type(attr.atttypid, attr.atttypmod) AS data_type,
        NOT attr.attnotnull AS nullable,
        pg_get_expr(def.adbin, def.adrelid) AS column_default,
        COALESCE(col_description(attr.attrelid, attr.attnum), '') AS comment
    FROM pg_attribute attr
    LEFT JOIN pg_attrdef def ON def.adrelid = attr.attrelid AND def.adnum = attr.attnum
    WHERE attr.attrelid = $1
      AND attr.attnum > 0
      AND NOT attr.attisdropped
    ORDER BY attr.attnum
"#;

const CONSTRAINTS_QUERY: &str = r#"
    SELECT
        con.conname AS name,
        con.contype::text AS kind,
        pg_get_constraintdef(con.oid) AS def,
        ARRAY(
            SELECT a.attname::text
            FROM unnest(con.conkey) WITH ORDINALITY AS k(num, ord)
            JOIN pg_attribute a ON a.attrelid = con.conrelid AND a.attnum = k.num
            ORDER BY k.ord
        ) AS columns,
        fcls.relname AS reference_table,
        ARRAY(
            SELECT a.attname::text
            FROM unnest(con.confkey) WITH ORDINALITY AS k(num, ord)
            JOIN pg_attribute a ON a.attrelid = con.confrelid AND a.attnum = k.num
            ORDER BY k.ord
        ) AS reference_columns
    FROM pg_constraint con
    LEFT JOIN pg_class fcls ON fcls.oid = con.confrelid
    WHERE con.conrelid = $1
    ORDER BY con.conname
"#;

const INDEXES_QUERY: &str = r#"
    SELECT
        cls.relname AS name,
        pg_get_indexdef(idx.indexrelid) AS def,
        ARRAY(
            SELECT a.attname::text
            FROM pg_attribute a
            WHERE a.attrelid = idx.indrelid AND a.attnum = ANY(idx.indkey)
            ORDER BY a.attnum
        ) AS columns
    FROM pg_index idx
    JOIN pg_class cls ON cls.oid = idx.indexrelid
    WHERE idx.indrelid = $1
    ORDER BY cls.relname
"#;

const TRIGGERS_QUERY: &str = r#"
    SELECT tgname AS name, pg_get_triggerdef(oid) AS def
    FROM pg_trigger
    WHERE tgrelid = $1 AND NOT tgisinternal
    ORDER BY tgname
"#;

/// Driver for a live PostgreSQL database
pub struct PostgresDriver {
    client: Client,
}

impl PostgresDriver {
    pub async fn connect(dsn: &str) -> Result<Self> {
        let (client, connection) = tokio_postgres::connect(dsn, NoTls).await?;
        tokio::spawn(async move {
            if let Err(e) = connection.await {
                error!("PostgreSQL connection error: {}", e);
            }
        });
        Ok(Self { client })
    }

    /// Engine name and server version
    pub async fn info(&self) -> Result<Driver> {
        let row = self
            .client
            .query_one("SELECT current_setting('server_version') AS version", &[])
            .await?;
        Ok(Driver {
            name: "postgres".to_string(),
            database_version: row.get("version"),
        })
    }

    /// Load every user table into `schema`, then resolve foreign keys
    pub async fn analyze(&self, schema: &mut Schema) -> Result<()> {
        let row = self
            .client
            .query_one(
                "SELECT current_database()::text AS database, current_schema()::text AS schema",
                &[],
            )
            .await?;
        let current: String = row.get("schema");
        schema.name = row.get("database");

        let mut foreign_keys: Vec<(TableId, String)> = Vec::new();

        for row in self.client.query(TABLES_QUERY, &[]).await? {
            let oid: u32 = row.get("oid");
            let namespace: String = row.get("schema_name");
            let name = qualified_name(&current, &namespace, row.get("table_name"));
            let kind: String = row.get("table_type");
            let view_def: Option<String> = row.get("view_def");

            let table = schema.add_table(NewTable {
                def: view_def
                    .map(|def| format!("CREATE VIEW {} AS (\n{}\n)", name, def.trim_end_matches(';')))
                    .unwrap_or_default(),
                kind: TableKind::from(kind.as_str()),
                comment: row.get("comment"),
                name: name.clone(),
            });

            for col in self.client.query(COLUMNS_QUERY, &[&oid]).await? {
                schema.add_column(
                    table,
                    NewColumn {
                        name: col.get("column_name"),
                        data_type: col.get("data_type"),
                        nullable: col.get("nullable"),
                        default: col.get("column_default"),
                        comment: col.get("comment"),
                    },
                );
            }

            let mut constraints = Vec::new();
            for con in self.client.query(CONSTRAINTS_QUERY, &[&oid]).await? {
                let code: String = con.get("kind");
                let constraint = Constraint {
                    name: con.get("name"),
                    kind: constraint_kind(&code),
                    def: con.get("def"),
                    table: name.clone(),
                    columns: con.get("columns"),
                    reference_table: con.get("reference_table"),
                    reference_columns: con.get("reference_columns"),
                };
                if constraint.kind == ConstraintKind::ForeignKey {
                    foreign_keys.push((table, constraint.def.clone()));
                }
                constraints.push(constraint);
            }

            let indexes = self
                .client
                .query(INDEXES_QUERY, &[&oid])
                .await?
                .iter()
                .map(|idx| Index {
                    name: idx.get("name"),
                    def: idx.get("def"),
                    table: name.clone(),
                    columns: idx.get("columns"),
                })
                .collect();

            let triggers = self
                .client
                .query(TRIGGERS_QUERY, &[&oid])
                .await?
                .iter()
                .map(|tr| Trigger {
                    name: tr.get("name"),
                    def: tr.get("def"),
                })
                .collect();

            let t = schema.table_mut(table);
            t.constraints = constraints;
            t.indexes = indexes;
            t.triggers = triggers;
            debug!("Introspected table {}", name);
        }

        for (table, def) in foreign_keys {
            let context = format!(
                "failed to resolve relation on table '{}'",
                schema.table(table).name
            );
            let mut fk = parse_foreign_key(&def).context(context.clone())?;
            fk.parent_table = unqualified_name(&current, &fk.parent_table);
            link_foreign_key(schema, table, &def, &fk).context(context)?;
        }

        debug!(
            "Introspected {} tables, {} relations",
            schema.table_ids().len(),
            schema.relation_ids().len()
        );
        Ok(())
    }
}

/// Tables outside the current schema are named `schema.table`
fn qualified_name(current: &str, namespace: &str, name: String) -> String {
    if namespace == current {
        name
    } else {
        format!("{}.{}", namespace, name)
    }
}

/// Drop a redundant `<current schema>.` prefix from a referenced table name
fn unqualified_name(current: &str, name: &str) -> String {
    name.strip_prefix(current)
        .and_then(|rest| rest.strip_prefix('.'))
        .unwrap_or(name)
        .to_string()
}

fn constraint_kind(code: &str) -> ConstraintKind {
    match code {
        "p" => ConstraintKind::PrimaryKey,
        "u" => ConstraintKind::Unique,
        "f" => ConstraintKind::ForeignKey,
        "c" => ConstraintKind::Check,
        _ => ConstraintKind::Unknown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_qualified_name() {
        assert_eq!(qualified_name("public", "public", "users".to_string()), "users");
        assert_eq!(qualified_name("public", "auth", "users".to_string()), "auth.users");
    }

    #[test]
    fn test_unqualified_name() {
        assert_eq!(unqualified_name("public", "public.users"), "users");
        assert_eq!(unqualified_name("public", "auth.users"), "auth.users");
        assert_eq!(unqualified_name("public", "publications"), "publications");
        assert_eq!(unqualified_name("public", "users"), "users");
    }

    #[test]
    fn test_constraint_kind() {
        assert_eq!(constraint_kind("p"), ConstraintKind::PrimaryKey);
        assert_eq!(constraint_kind("f"), ConstraintKind::ForeignKey);
        assert_eq!(constraint_kind("x"), ConstraintKind::Unknown);
    }
}
