//! Lint Rules
//!
//! Documentation guardrails checked against the analyzed schema. The rule set
//! is closed: each rule is a variant carrying its own parameters.

use crate::config::{LintSettings, Settings};
use crate::schema::{Schema, Table};
use std::collections::HashSet;

/// A configured lint rule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LintRule {
    /// Every table has a comment
    RequireTableComment,
    /// Every column has a comment
    RequireColumnComment,
    /// At most `max` tables take part in no relation
    NoRelationTables { max: usize },
    /// No table has more than `max` columns
    ColumnCount { max: usize },
}

/// A rule violation found during linting
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleViolation {
    pub rule_name: &'static str,
    pub message: String,
}

impl LintRule {
    /// Rules switched on in `settings`, in a fixed order
    pub fn enabled(settings: &LintSettings) -> Vec<LintRule> {
        let mut rules = Vec::new();
        if settings.require_table_comment.enabled {
            rules.push(LintRule::RequireTableComment);
        }
        if settings.require_column_comment.enabled {
            rules.push(LintRule::RequireColumnComment);
        }
        if settings.no_relation_tables.enabled {
            rules.push(LintRule::NoRelationTables {
                max: settings.no_relation_tables.max,
            });
        }
        if settings.column_count.enabled {
            rules.push(LintRule::ColumnCount {
                max: settings.column_count.max,
            });
        }
        rules
    }

    pub fn name(&self) -> &'static str {
        match self {
            LintRule::RequireTableComment => "requireTableComment",
            LintRule::RequireColumnComment => "requireColumnComment",
            LintRule::NoRelationTables { .. } => "noRelationTables",
            LintRule::ColumnCount { .. } => "columnCount",
        }
    }

    /// Check `tables` of `schema` against this rule
    pub fn check(&self, schema: &Schema, tables: &[&Table]) -> Vec<RuleViolation> {
        let violation = |message: String| RuleViolation {
            rule_name: self.name(),
            message,
        };

        match *self {
            LintRule::RequireTableComment => tables
                .iter()
                .filter(|t| t.comment.is_empty())
                .map(|t| violation(format!("{}: table comment required.", t.name)))
                .collect(),
            LintRule::RequireColumnComment => tables
                .iter()
                .flat_map(|t| {
                    schema
                        .columns_of(t.id)
                        .filter(|c| c.comment.is_empty())
                        .map(move |c| format!("{}.{}: column comment required.", t.name, c.name))
                })
                .map(violation)
                .collect(),
            LintRule::NoRelationTables { max } => {
                let related: HashSet<_> = schema
                    .relations()
                    .flat_map(|r| [r.table, r.parent_table])
                    .collect();
                let count = tables.iter().filter(|t| !related.contains(&t.id)).count();
                if count > max {
                    vec![violation(format!(
                        "schema has too many no relation tables. [{}/{}]",
                        count, max
                    ))]
                } else {
                    Vec::new()
                }
            }
            LintRule::ColumnCount { max } => tables
                .iter()
                .filter(|t| t.columns.len() > max)
                .map(|t| {
                    violation(format!(
                        "{} has too many columns. [{}/{}]",
                        t.name,
                        t.columns.len(),
                        max
                    ))
                })
                .collect(),
        }
    }
}

/// Run every enabled rule, skipping tables listed in `lintExclude`
pub fn lint(schema: &Schema, settings: &Settings) -> Vec<RuleViolation> {
    let tables: Vec<&Table> = schema
        .tables()
        .filter(|t| !settings.lint_exclude.contains(&t.name))
        .collect();

    LintRule::enabled(&settings.lint)
        .iter()
        .flat_map(|rule| rule.check(schema, &tables))
        .collect()
}
