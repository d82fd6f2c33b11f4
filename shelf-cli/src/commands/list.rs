//! `shelf list [board] [part] [--json]`

use std::path::Path;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use serde::Serialize;
use shelf_core::{meta, BoardName, EntrySummary, PartName};
use tabled::{settings::Style, Table, Tabled};

use super::open_store;

/// Arguments for `shelf list`.
#[derive(Args, Debug)]
pub struct ListArgs {
    /// List the parts of this board.
    pub board: Option<String>,

    /// List the entries of this part.
    #[arg(requires = "board")]
    pub part: Option<String>,

    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

impl ListArgs {
    pub fn run(self, root: Option<&Path>) -> Result<()> {
        let (store, _config) = open_store(root)?;

        match (self.board, self.part) {
            (Some(board), Some(part)) => {
                let board = BoardName::from(board);
                let part = PartName::from(part);
                let summaries = store
                    .describe(&board, &part)
                    .with_context(|| format!("failed to list {board}/{part}"))?;
                let rows: Vec<EntryRow> = summaries.into_iter().map(EntryRow::from).collect();
                if self.json {
                    print_json(&rows)
                } else {
                    print_entries(&board, &part, rows);
                    Ok(())
                }
            }
            (Some(board), None) => {
                let board = BoardName::from(board);
                let parts = store
                    .list_parts(&board)
                    .with_context(|| format!("failed to list parts of {board}"))?;
                if self.json {
                    return print_json(&parts);
                }
                if parts.is_empty() {
                    println!("No parts under board '{board}'.");
                }
                for part in parts {
                    println!("{part}");
                }
                Ok(())
            }
            (None, _) => {
                let boards = store.list_boards().context("failed to list boards")?;
                if self.json {
                    return print_json(&boards);
                }
                if boards.is_empty() {
                    println!("No boards stored yet.");
                }
                for board in boards {
                    println!("{board}");
                }
                Ok(())
            }
        }
    }
}

#[derive(Debug, Serialize, Tabled)]
struct EntryRow {
    #[tabled(rename = "version")]
    version: u64,
    #[tabled(rename = "name")]
    name: String,
    #[tabled(rename = "timestamp", display_with = "display_opt")]
    timestamp: Option<String>,
    #[tabled(rename = "user", display_with = "display_opt")]
    user: Option<String>,
    #[tabled(rename = "tag", display_with = "display_opt")]
    tag: Option<String>,
    #[tabled(rename = "commit", display_with = "display_opt")]
    commit: Option<String>,
}

impl From<EntrySummary> for EntryRow {
    fn from(summary: EntrySummary) -> Self {
        let metadata = summary.metadata;
        Self {
            version: summary.entry.version,
            name: summary.entry.file_name(),
            timestamp: metadata
                .as_ref()
                .and_then(|m| m.timestamp)
                .map(meta::format_timestamp),
            user: metadata
                .as_ref()
                .map(|m| m.user.clone())
                .filter(|u| !u.is_empty()),
            tag: metadata.as_ref().and_then(|m| m.tag.clone()),
            commit: metadata.and_then(|m| m.commit),
        }
    }
}

fn display_opt(value: &Option<String>) -> String {
    value.clone().unwrap_or_else(|| "-".to_string())
}

fn print_entries(board: &BoardName, part: &PartName, rows: Vec<EntryRow>) {
    println!("{}", format!("{board}/{part}").bold());
    if rows.is_empty() {
        println!("No entries.");
        return;
    }
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{table}");
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!(
        "{}",
        serde_json::to_string_pretty(value).context("failed to serialize listing JSON")?
    );
    Ok(())
}
