use std::{collections::BTreeMap, path::PathBuf, process};

use clap::Parser;
use relish::load_tree;
use tracing::instrument;

use super::terminal::{Colorize, is_narrow};

#[derive(Debug, Parser, Default)]
#[command(about = "Show item counts and tree health")]
pub struct Check {
    /// Output format (table, json)
    #[arg(long, value_name = "FORMAT", default_value = "table")]
    output: OutputFormat,

    /// Suppress headers and format for scripting
    #[arg(long)]
    quiet: bool,
}

#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
enum OutputFormat {
    #[default]
    Table,
    Json,
}

impl Check {
    #[instrument(level = "debug", skip(self))]
    pub fn run(self, root: PathBuf) -> anyhow::Result<()> {
        let tree = load_tree(&root)?;

        if tree.is_empty() {
            println!("No documents found under {}.", root.display());
            return Ok(());
        }

        let mut counts: BTreeMap<String, usize> = BTreeMap::new();
        for document in tree.documents() {
            counts.insert(document.prefix().to_string(), document.items().len());
        }
        let total = tree.item_count();

        let dangling: Vec<(String, String)> = tree
            .dangling_links()
            .into_iter()
            .map(|(child, parent)| (child.to_string(), parent.to_string()))
            .collect();
        let unknown_parents: Vec<(String, String)> = tree
            .unknown_parents()
            .into_iter()
            .map(|(child, parent)| (child.to_string(), parent.to_string()))
            .collect();
        let cycles: Vec<Vec<String>> = tree
            .cycles()
            .iter()
            .map(|cycle| cycle.iter().map(ToString::to_string).collect())
            .collect();

        match self.output {
            OutputFormat::Json => {
                Self::output_json(&counts, total, &dangling, &unknown_parents, &cycles)?;
            }
            OutputFormat::Table => {
                if self.quiet {
                    Self::output_quiet(total, &dangling, &unknown_parents, &cycles);
                } else {
                    Self::output_table(&counts, total, &dangling, &unknown_parents, &cycles);
                }
            }
        }

        // Exit with a non-zero code when the tree needs attention.
        if !dangling.is_empty() || !unknown_parents.is_empty() || !cycles.is_empty() {
            process::exit(2);
        }

        Ok(())
    }

    fn output_json(
        counts: &BTreeMap<String, usize>,
        total: usize,
        dangling: &[(String, String)],
        unknown_parents: &[(String, String)],
        cycles: &[Vec<String>],
    ) -> anyhow::Result<()> {
        use serde_json::json;

        let documents: Vec<_> = counts
            .iter()
            .map(|(prefix, count)| {
                json!({
                    "prefix": prefix,
                    "items": count,
                })
            })
            .collect();

        let output = json!({
            "documents": documents,
            "total": total,
            "dangling_links": {
                "count": dangling.len(),
                "members": dangling,
            },
            "unknown_parents": {
                "count": unknown_parents.len(),
                "members": unknown_parents,
            },
            "cycles": {
                "count": cycles.len(),
                "members": cycles,
            }
        });

        println!("{}", serde_json::to_string_pretty(&output)?);
        Ok(())
    }

    fn output_quiet(
        total: usize,
        dangling: &[(String, String)],
        unknown_parents: &[(String, String)],
        cycles: &[Vec<String>],
    ) {
        println!(
            "total={total} dangling={} unknown_parents={} cycles={}",
            dangling.len(),
            unknown_parents.len(),
            cycles.len()
        );
    }

    fn output_table(
        counts: &BTreeMap<String, usize>,
        total: usize,
        dangling: &[(String, String)],
        unknown_parents: &[(String, String)],
        cycles: &[Vec<String>],
    ) {
        const MAX_DISPLAY: usize = 5;
        let narrow = is_narrow();

        println!("Item counts");
        println!("{}", "──────────────────".dim());

        if narrow {
            // Stacked output for narrow terminals
            for (prefix, count) in counts {
                println!("{prefix}: {count}");
            }
            println!("Total: {total}");
        } else {
            // Table layout
            println!("{:<10} Items", "Document");
            for (prefix, count) in counts {
                println!("{prefix:<10} {count}");
            }
            println!("Total      {total}");
        }

        println!();

        if dangling.is_empty() {
            println!("Dangling links: {} ✅", "0".success());
        } else {
            println!(
                "Dangling links: {} ⚠️",
                dangling.len().to_string().warning()
            );
            for (child, parent) in dangling.iter().take(MAX_DISPLAY) {
                println!("  - {child} -> {parent}");
            }
            if dangling.len() > MAX_DISPLAY {
                println!("  - ... and {} more", dangling.len() - MAX_DISPLAY);
            }
            println!("{}", "Items link to identifiers that do not exist.".dim());
        }

        println!();

        if unknown_parents.is_empty() {
            println!("Unknown parents: {} ✅", "0".success());
        } else {
            println!(
                "Unknown parents: {} ⚠️",
                unknown_parents.len().to_string().warning()
            );
            for (child, parent) in unknown_parents {
                println!("  - {child} -> {parent}");
            }
            println!(
                "{}",
                "Documents name parent prefixes that are not loaded.".dim()
            );
        }

        println!();

        if cycles.is_empty() {
            println!("Cycles: {} ✅", "0".success());
        } else {
            println!("Cycles: {} ⚠️", cycles.len().to_string().warning());
            for cycle in cycles.iter().take(MAX_DISPLAY) {
                println!("  - {}", cycle.join(" -> "));
            }
            if cycles.len() > MAX_DISPLAY {
                println!("  - ... and {} more cycles", cycles.len() - MAX_DISPLAY);
            }
            println!("{}", "Resolve cycles to restore an acyclic link graph.".dim());
        }
    }
}
