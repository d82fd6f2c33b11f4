//! Shelf: versioned artifact store CLI.
//!
//! # Usage
//!
//! ```text
//! shelf init <root> [--user <name>]
//! shelf push <board> <part> <dir> [--tag T] [--commit C] [--dry-run]
//! shelf pull <board> <part> [--version N | --interactive] [--dest DIR | --unpack DIR] [--force]
//! shelf compare <board> <part> <dir> [--version N | --interactive]
//! shelf list [board] [part] [--json]
//! ```
//!
//! The store root comes from `--root`, `SHELF_ROOT`, or `~/.shelf/config.yaml`.

mod commands;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{
    compare::CompareArgs, init::InitArgs, list::ListArgs, pull::PullArgs, push::PushArgs,
};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "shelf",
    version,
    about = "Store and retrieve versioned build artifacts per board and part",
    long_about = None,
)]
struct Cli {
    /// Store root directory (overrides the configured root).
    #[arg(long, env = "SHELF_ROOT", global = true, value_name = "DIR")]
    root: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Record the store root (and optionally user) in ~/.shelf/config.yaml.
    Init(InitArgs),

    /// Pack a directory and store it as the next version of a part.
    Push(PushArgs),

    /// Fetch an entry as an archive file or unpacked tree.
    Pull(PullArgs),

    /// Compare a source directory's mtime with a stored entry.
    Compare(CompareArgs),

    /// List boards, parts of a board, or entries of a part.
    List(ListArgs),
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let root = cli.root.as_deref();
    match cli.command {
        Commands::Init(args) => args.run(),
        Commands::Push(args) => args.run(root),
        Commands::Pull(args) => args.run(root),
        Commands::Compare(args) => args.run(root),
        Commands::List(args) => args.run(root),
    }
}

/// Log to stderr; `SHELF_LOG` takes `EnvFilter` directives, default `warn`.
fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_env("SHELF_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
