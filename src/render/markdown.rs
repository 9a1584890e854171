//! Markdown renderer

use super::Renderer;
use crate::config::Settings;
use crate::schema::{Schema, TableId};
use unicode_width::UnicodeWidthStr;

const FOOTER: &str = "> Generated by schemadoc";

/// Renders `README.md` and one `<table>.md` per table
#[derive(Debug, Clone)]
pub struct Markdown {
    adjust: bool,
    er_format: String,
}

impl Markdown {
    pub fn new(settings: &Settings) -> Self {
        Self {
            adjust: settings.format.adjust,
            er_format: settings.er.format.clone(),
        }
    }

    fn link(name: &str) -> String {
        format!("[{}]({}.md)", name, name)
    }

    fn grid(&self, header: &[&str], rows: Vec<Vec<String>>) -> Vec<String> {
        let header: Vec<String> = header.iter().map(|h| h.to_string()).collect();
        let rows: Vec<Vec<String>> = rows
            .into_iter()
            .map(|row| row.iter().map(|cell| nl2br(cell)).collect())
            .collect();

        let widths: Vec<usize> = if self.adjust {
            (0..header.len())
                .map(|i| {
                    std::iter::once(&header)
                        .chain(&rows)
                        .map(|row| row[i].width())
                        .max()
                        .unwrap_or(0)
                })
                .collect()
        } else {
            header.iter().map(|h| h.width()).collect()
        };

        let pad = |cell: &str, width: usize| {
            if self.adjust {
                format!("{}{}", cell, " ".repeat(width.saturating_sub(cell.width())))
            } else {
                cell.to_string()
            }
        };
        let line = |cells: Vec<String>| format!("| {} |", cells.join(" | "));

        let mut lines = Vec::with_capacity(rows.len() + 2);
        lines.push(line(
            header.iter().zip(&widths).map(|(h, w)| pad(h, *w)).collect(),
        ));
        lines.push(line(widths.iter().map(|w| "-".repeat(*w)).collect()));
        for row in &rows {
            lines.push(line(row.iter().zip(&widths).map(|(c, w)| pad(c, *w)).collect()));
        }
        lines
    }
}

fn nl2br(text: &str) -> String {
    text.replace("\r\n", "<br>")
        .replace(['\n', '\r'], "<br>")
}

fn section(out: &mut Vec<String>, title: &str, body: Vec<String>) {
    out.push(format!("## {}", title));
    out.push(String::new());
    if !body.is_empty() {
        out.extend(body);
        out.push(String::new());
    }
}

fn finish(mut out: Vec<String>) -> String {
    out.push("---".to_string());
    out.push(String::new());
    out.push(FOOTER.to_string());
    let mut text = out.join("\n");
    text.push('\n');
    text
}

impl Renderer for Markdown {
    fn index_file(&self) -> String {
        "README.md".to_string()
    }

    fn table_file(&self, name: &str) -> String {
        format!("{}.md", name)
    }

    fn render_schema(&self, schema: &Schema, er: bool) -> String {
        let mut out = vec![format!("# {}", schema.name), String::new()];

        let rows = schema
            .tables()
            .map(|t| {
                vec![
                    Self::link(&t.name),
                    t.columns.len().to_string(),
                    t.comment.clone(),
                    t.kind.to_string(),
                ]
            })
            .collect();
        section(
            &mut out,
            "Tables",
            self.grid(&["Name", "Columns", "Comment", "Type"], rows),
        );

        if er {
            section(
                &mut out,
                "Relations",
                vec![format!("![er](schema.{})", self.er_format)],
            );
        }

        finish(out)
    }

    fn render_table(&self, schema: &Schema, table: TableId, er: bool) -> String {
        let t = schema.table(table);
        let mut out = vec![format!("# {}", t.name), String::new()];

        let mut description = Vec::new();
        if !t.comment.is_empty() {
            description.push(t.comment.clone());
            description.push(String::new());
        }
        if !t.def.is_empty() {
            description.extend([
                "<details>".to_string(),
                "<summary><strong>Table Definition</strong></summary>".to_string(),
                String::new(),
                "```sql".to_string(),
                t.def.clone(),
                "```".to_string(),
                String::new(),
                "</details>".to_string(),
                String::new(),
            ]);
        }
        if description.last().is_some_and(String::is_empty) {
            description.pop();
        }
        section(&mut out, "Description", description);

        let rows = schema
            .columns_of(table)
            .map(|c| {
                let mut children: Vec<&str> = Vec::new();
                for r in &c.child_relations {
                    let name = schema.relation_table_name(*r);
                    if !children.contains(&name) {
                        children.push(name);
                    }
                }
                let mut parents: Vec<&str> = Vec::new();
                for r in &c.parent_relations {
                    let name = schema.relation_parent_table_name(*r);
                    if !parents.contains(&name) {
                        parents.push(name);
                    }
                }
                vec![
                    c.name.clone(),
                    c.data_type.clone(),
                    c.default.clone().unwrap_or_default(),
                    c.nullable.to_string(),
                    children.iter().map(|n| Self::link(n)).collect::<Vec<_>>().join(" "),
                    parents.iter().map(|n| Self::link(n)).collect::<Vec<_>>().join(" "),
                    c.comment.clone(),
                ]
            })
            .collect();
        section(
            &mut out,
            "Columns",
            self.grid(
                &["Name", "Type", "Default", "Nullable", "Children", "Parents", "Comment"],
                rows,
            ),
        );

        if !t.constraints.is_empty() {
            let rows = t
                .constraints
                .iter()
                .map(|c| vec![c.name.clone(), c.kind.to_string(), c.def.clone()])
                .collect();
            section(
                &mut out,
                "Constraints",
                self.grid(&["Name", "Type", "Definition"], rows),
            );
        }

        if !t.indexes.is_empty() {
            let rows = t
                .indexes
                .iter()
                .map(|i| vec![i.name.clone(), i.def.clone()])
                .collect();
            section(&mut out, "Indexes", self.grid(&["Name", "Definition"], rows));
        }

        if !t.triggers.is_empty() {
            let rows = t
                .triggers
                .iter()
                .map(|tr| vec![tr.name.clone(), tr.def.clone()])
                .collect();
            section(&mut out, "Triggers", self.grid(&["Name", "Definition"], rows));
        }

        if er {
            section(
                &mut out,
                "Relations",
                vec![format!("![er]({}.{})", t.name, self.er_format)],
            );
        }

        finish(out)
    }
}
