//! # shelf-store
//!
//! Versioned, content-addressed artifact storage over a shared directory.
//!
//! Open a [`Store`] on a root directory and call [`Store::push_dir`] /
//! [`Store::pull`] / [`Store::compare_dir`]. The algorithms only talk to the
//! [`EntryRepository`] trait, so they run unchanged against
//! [`MemoryRepository`] in tests.

mod atomic;
pub mod compare;
pub mod lock;
pub mod packager;
pub mod pull;
pub mod push;
pub mod repository;
pub mod select;
mod store;

pub use compare::{compare, Staleness};
pub use lock::PartLock;
pub use packager::{Packager, TarGzPackager};
pub use pull::{Delivered, Delivery, Prompter, PullReport};
pub use push::{PushOutcome, PushRequest};
pub use repository::{EntryRepository, FsRepository, MemoryRepository};
pub use select::{Chooser, NonInteractive};
pub use store::Store;

pub use shelf_core::{
    BoardName, Candidate, ContentHash, EntryRef, EntrySummary, IntegrityWarning, Metadata,
    PartName, Provenance, Selector, StoreError,
};
