use std::path::PathBuf;

use clap::Parser;
use relish::{Tree, load_tree};
use tracing::instrument;

use super::terminal::Colorize;

#[derive(Debug, Parser, Default)]
#[command(about = "Print the traceability matrix")]
pub struct Trace {
    /// Output format (table, json)
    #[arg(long, value_name = "FORMAT", default_value = "table")]
    format: OutputFormat,
}

#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
enum OutputFormat {
    #[default]
    Table,
    Json,
}

impl Trace {
    #[instrument(level = "debug", skip(self))]
    pub fn run(self, root: PathBuf) -> anyhow::Result<()> {
        let tree = load_tree(&root)?;

        if tree.is_empty() {
            println!("No documents found under {}.", root.display());
            return Ok(());
        }

        let (columns, rows) = matrix(&tree);

        match self.format {
            OutputFormat::Json => Self::output_json(&columns, &rows)?,
            OutputFormat::Table => Self::output_table(&columns, &rows),
        }

        Ok(())
    }

    fn output_json(columns: &[String], rows: &[Vec<Option<String>>]) -> anyhow::Result<()> {
        use serde_json::json;

        let output = json!({
            "columns": columns,
            "rows": rows,
        });

        println!("{}", serde_json::to_string_pretty(&output)?);
        Ok(())
    }

    fn output_table(columns: &[String], rows: &[Vec<Option<String>>]) {
        let mut widths: Vec<usize> = columns.iter().map(String::len).collect();
        for row in rows {
            for (index, cell) in row.iter().enumerate() {
                if let Some(uid) = cell {
                    widths[index] = widths[index].max(uid.len());
                }
            }
        }

        let header = columns
            .iter()
            .zip(&widths)
            .map(|(column, &width)| format!("{column:<width$}"))
            .collect::<Vec<_>>()
            .join("  ");
        println!("{}", header.trim_end());
        println!("{}", "─".repeat(header.trim_end().chars().count()).dim());

        for row in rows {
            let line = row
                .iter()
                .zip(&widths)
                .map(|(cell, &width)| {
                    let text = cell.as_deref().unwrap_or("-");
                    format!("{text:<width$}")
                })
                .collect::<Vec<_>>()
                .join("  ");
            println!("{}", line.trim_end());
        }
    }
}

/// The matrix as owned strings: column prefixes and one row per link chain.
fn matrix(tree: &Tree) -> (Vec<String>, Vec<Vec<Option<String>>>) {
    let columns = tree
        .documents_depth_first()
        .into_iter()
        .map(|(_, document)| document.prefix().to_string())
        .collect();

    let rows = tree
        .traceability()
        .into_iter()
        .map(|row| {
            row.into_iter()
                .map(|cell| cell.map(ToString::to_string))
                .collect()
        })
        .collect();

    (columns, rows)
}
