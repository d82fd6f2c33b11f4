//! `shelf pull <board> <part> [--version N | --interactive] [--dest DIR | --unpack DIR] [--force]`

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use shelf_core::{BoardName, PartName};
use shelf_store::{Delivered, Delivery, PullReport};

use super::{open_store, prompt::TerminalPrompter, SelectArgs};

/// Arguments for `shelf pull`.
#[derive(Args, Debug)]
pub struct PullArgs {
    pub board: String,

    pub part: String,

    #[command(flatten)]
    pub select: SelectArgs,

    /// Directory to copy the archive into (default: current directory).
    #[arg(long, value_name = "DIR", conflicts_with = "unpack")]
    pub dest: Option<PathBuf>,

    /// Unpack the archive into DIR instead of copying it.
    #[arg(long, value_name = "DIR")]
    pub unpack: Option<PathBuf>,

    /// Overwrite an existing archive file without asking.
    #[arg(long)]
    pub force: bool,
}

impl PullArgs {
    pub fn run(self, root: Option<&Path>) -> Result<()> {
        let (store, _config) = open_store(root)?;
        let board = BoardName::from(self.board);
        let part = PartName::from(self.part);

        let delivery = match self.unpack {
            Some(dest_dir) => Delivery::Unpack { dest_dir },
            None => {
                let dest_dir = match self.dest {
                    Some(dir) => dir,
                    None => std::env::current_dir().context("cannot read current directory")?,
                };
                Delivery::Archive {
                    dest_dir,
                    force: self.force,
                }
            }
        };

        let report = store
            .pull(
                &board,
                &part,
                self.select.selector(),
                &delivery,
                &TerminalPrompter,
            )
            .with_context(|| format!("pull from {board}/{part} failed"))?;
        print_report(&report);
        Ok(())
    }
}

fn print_report(report: &PullReport) {
    if let Some(warning) = &report.integrity {
        eprintln!("{} {warning}", "warning:".yellow().bold());
    }
    match &report.delivered {
        Delivered::Archive { path } => {
            println!("{} {} → {}", "✓".green(), report.entry, path.display())
        }
        Delivered::Unpacked { dir } => {
            println!("{} {} unpacked into {}", "✓".green(), report.entry, dir.display())
        }
        Delivered::Declined { path } => println!("· kept existing {}", path.display()),
    }
}
