//! Internal domain modules for the Research Queue core library.
//!
//! All public types from these modules are re-exported at the crate root
//! with `#[doc(inline)]`; import from there in preference to this module.

pub mod debounce;
pub mod error;
pub mod export;
pub mod quarter;
pub mod remote;
pub mod resolver;
pub mod session;
pub mod storage;
pub mod topic;
pub mod tree;

#[doc(inline)]
pub use debounce::{DebounceHandle, Debouncer};
#[doc(inline)]
pub use error::{ResearchQueueError, Result};
#[doc(inline)]
pub use export::{
    from_imported, read_document, to_snapshot, write_snapshot, DocumentShape, ExportError,
    ImportedDocument, SnapshotDocument,
};
#[doc(inline)]
pub use quarter::Quarter;
#[doc(inline)]
pub use remote::{DirectorySource, MemorySource, NoRemote, RemoteError, RemoteSource};
#[cfg(feature = "remote-http")]
#[doc(inline)]
pub use remote::HttpSource;
#[doc(inline)]
pub use resolver::{PersistenceResolver, QuarterIndex, ResolutionTier};
#[doc(inline)]
pub use session::{FieldPatch, ImportOutcome, Session, EDIT_DEBOUNCE};
#[doc(inline)]
pub use storage::Storage;
#[doc(inline)]
pub use topic::{Forest, Topic, TopicStatus};
#[doc(inline)]
pub use tree::{ForestStats, ParentLookup};
