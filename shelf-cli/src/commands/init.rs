//! `shelf init <root> [--user <name>]`

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use shelf_core::config;
use shelf_store::Store;

/// Record the store root in the user configuration.
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Existing directory that holds (or will hold) the store.
    pub root: PathBuf,

    /// Name recorded as `user` in entry metadata.
    #[arg(long)]
    pub user: Option<String>,
}

impl InitArgs {
    pub fn run(self) -> Result<()> {
        let root = self
            .root
            .canonicalize()
            .with_context(|| format!("cannot resolve path '{}'", self.root.display()))?;
        Store::open(&root).with_context(|| format!("cannot use {} as store root", root.display()))?;

        let mut cfg = config::load().context("failed to load existing config")?;
        cfg.root = Some(root.clone());
        if let Some(user) = self.user {
            cfg.user = Some(user);
        }
        config::save(&cfg).context("failed to write config")?;

        println!("✓ Store root set to {}", root.display());
        println!("  Saved to: {}", config::config_path()?.display());
        Ok(())
    }
}
