//! Shelf core library: domain types, content hashing, on-disk naming,
//! `.meta` codec, configuration, errors.
//!
//! Public API surface:
//! - [`types`]: newtypes and domain structs
//! - [`hash`]: [`ContentHash`]
//! - [`naming`]: entry/metadata file names and the per-part directory layout
//! - [`meta`]: `.meta` render / parse
//! - [`config`]: `~/.shelf/config.yaml`
//! - [`error`]: [`StoreError`], [`ConfigError`], [`IntegrityWarning`]

pub mod config;
pub mod error;
pub mod hash;
pub mod meta;
pub mod naming;
pub mod types;

pub use config::ShelfConfig;
pub use error::{ConfigError, IntegrityWarning, StoreError};
pub use hash::ContentHash;
pub use types::{
    BoardName, Candidate, EntryRef, EntrySummary, Metadata, PartName, Provenance, Selector,
};
