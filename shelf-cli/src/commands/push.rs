//! `shelf push <board> <part> <dir> [--tag T] [--commit C] [--dry-run]`

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use shelf_core::{BoardName, PartName, Provenance};
use shelf_store::PushOutcome;

use super::open_store;

/// Arguments for `shelf push`.
#[derive(Args, Debug)]
pub struct PushArgs {
    pub board: String,

    pub part: String,

    /// Directory to pack and store.
    pub dir: PathBuf,

    /// Free-form label recorded in the entry metadata.
    #[arg(long)]
    pub tag: Option<String>,

    /// Source revision recorded in the entry metadata.
    #[arg(long)]
    pub commit: Option<String>,

    /// Report the entry name a push would produce without writing anything.
    #[arg(long)]
    pub dry_run: bool,
}

impl PushArgs {
    pub fn run(self, root: Option<&Path>) -> Result<()> {
        let (store, config) = open_store(root)?;
        let board = BoardName::from(self.board);
        let part = PartName::from(self.part);

        let mut provenance = Provenance::new(config.resolve_user());
        if let Some(tag) = self.tag {
            provenance = provenance.with_tag(tag);
        }
        if let Some(commit) = self.commit {
            provenance = provenance.with_commit(commit);
        }

        let outcome = store
            .push_dir(&board, &part, &self.dir, Some(provenance), self.dry_run)
            .with_context(|| format!("push of {} to {board}/{part} failed", self.dir.display()))?;
        print_outcome(&board, &part, &outcome);
        Ok(())
    }
}

fn print_outcome(board: &BoardName, part: &PartName, outcome: &PushOutcome) {
    let prefix = if outcome.dry_run { "[dry-run] " } else { "" };
    let name = outcome.name();
    match (outcome.created, outcome.dry_run) {
        (true, false) => println!("{} {board}/{part}/{}", "✓ stored".green(), name.bold()),
        (true, true) => println!("{prefix}would store {board}/{part}/{name}"),
        (false, _) => println!("{prefix}· unchanged, already stored as {board}/{part}/{name}"),
    }
}
