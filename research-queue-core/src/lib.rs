//! Core library for Research Queue, a hierarchical backlog of research topics,
//! partitioned by calendar quarter.
//!
//! The primary entry point is [`Session`], which holds the active quarter and
//! its topic forest. Forests are loaded through a [`PersistenceResolver`]
//! (local cache, then published snapshot, then legacy migration) and every
//! mutation is written back to the local cache.
//!
//! Types are re-exported from their respective sub-modules for convenience;
//! consumers should import from the crate root rather than the `core` module.

pub mod core;

// Re-export commonly used types.
#[doc(inline)]
pub use crate::core::{
    debounce::{DebounceHandle, Debouncer},
    error::{ResearchQueueError, Result},
    export::{
        from_imported, read_document, to_snapshot, write_snapshot, DocumentShape, ExportError,
        ImportedDocument, SnapshotDocument,
    },
    quarter::Quarter,
    remote::{DirectorySource, MemorySource, NoRemote, RemoteError, RemoteSource},
    resolver::{PersistenceResolver, QuarterIndex, ResolutionTier},
    session::{FieldPatch, ImportOutcome, Session, EDIT_DEBOUNCE},
    storage::Storage,
    topic::{Forest, Topic, TopicStatus},
    tree::{ForestStats, ParentLookup},
};
#[cfg(feature = "remote-http")]
#[doc(inline)]
pub use crate::core::remote::HttpSource;

/// Tree algorithms over a forest, for callers working outside a [`Session`].
pub use crate::core::tree;
