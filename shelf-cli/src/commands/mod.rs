pub mod compare;
pub mod init;
pub mod list;
pub mod prompt;
pub mod pull;
pub mod push;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use shelf_core::{config, ConfigError, Selector, ShelfConfig};
use shelf_store::Store;

/// `~/.shelf/config.yaml`, or defaults when there is no home directory.
pub(crate) fn load_config() -> Result<ShelfConfig> {
    match config::load() {
        Err(ConfigError::HomeNotFound) => Ok(ShelfConfig::default()),
        other => other.context("failed to load ~/.shelf/config.yaml"),
    }
}

/// `--root` / `SHELF_ROOT` first, then the configured root.
pub(crate) fn resolve_root(flag: Option<&Path>, config: &ShelfConfig) -> Result<PathBuf> {
    flag.map(Path::to_path_buf)
        .or_else(|| config.root.clone())
        .context("no store root configured: pass --root, set SHELF_ROOT, or run `shelf init <root>`")
}

pub(crate) fn open_store(flag: Option<&Path>) -> Result<(Store, ShelfConfig)> {
    let config = load_config()?;
    let root = resolve_root(flag, &config)?;
    let store =
        Store::open(&root).with_context(|| format!("cannot open store at {}", root.display()))?;
    Ok((store, config))
}

/// Entry selection shared by `pull` and `compare`. Defaults to the latest version.
#[derive(Args, Debug, Default)]
pub struct SelectArgs {
    /// Exact version number.
    #[arg(long, value_name = "N", conflicts_with = "interactive")]
    pub version: Option<u64>,

    /// Choose the entry from a list.
    #[arg(long, short = 'i')]
    pub interactive: bool,
}

impl SelectArgs {
    pub fn selector(&self) -> Selector {
        match (self.version, self.interactive) {
            (Some(version), _) => Selector::Version(version),
            (None, true) => Selector::Interactive,
            (None, false) => Selector::Latest,
        }
    }
}
