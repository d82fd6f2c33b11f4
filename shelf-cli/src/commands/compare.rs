//! `shelf compare <board> <part> <dir> [--version N | --interactive]`

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use shelf_core::{BoardName, PartName};
use shelf_store::{
    compare::{format_gap, source_mtime},
    EntryRepository, Staleness,
};

use super::{open_store, prompt::TerminalPrompter, SelectArgs};

/// Arguments for `shelf compare`.
#[derive(Args, Debug)]
pub struct CompareArgs {
    pub board: String,

    pub part: String,

    /// Source directory the entry was built from.
    pub dir: PathBuf,

    #[command(flatten)]
    pub select: SelectArgs,
}

impl CompareArgs {
    pub fn run(self, root: Option<&Path>) -> Result<()> {
        let (store, _config) = open_store(root)?;
        let board = BoardName::from(self.board);
        let part = PartName::from(self.part);

        let (entry, staleness) = store
            .compare_dir(
                &board,
                &part,
                &self.dir,
                self.select.selector(),
                &TerminalPrompter,
            )
            .with_context(|| format!("compare against {board}/{part} failed"))?;

        println!("{}", staleness_label(staleness));
        println!("  entry: {entry}");
        if staleness != Staleness::InSync {
            let source = source_mtime(&self.dir)?;
            let artifact = store.repository().entry_mtime(&board, &part, &entry)?;
            println!("  gap:   {}", format_gap(source, artifact));
        }
        Ok(())
    }
}

fn staleness_label(staleness: Staleness) -> String {
    let text = staleness.to_string();
    match staleness {
        Staleness::InSync => text.green().to_string(),
        Staleness::SourceNewer => text.yellow().to_string(),
        Staleness::ArtifactNewer => text.cyan().to_string(),
    }
}
