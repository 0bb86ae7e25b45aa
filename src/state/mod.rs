//! Client state stores.
//!
//! Every store is a plain struct mutated through its own operations. Backend calls go
//! through a [`Dispatcher`], which owns the client and the [`MessageBus`].

pub mod cases;
pub mod dispatcher;
pub mod messages;
pub mod metadata;
pub mod root;
pub mod search;
pub mod sources;

// Re-export for convenience
pub use cases::CaseStore;
pub use dispatcher::{Dispatcher, Outcome};
pub use messages::{MessageBus, MessageEntry, DEFAULT_MESSAGE_CAPACITY};
pub use metadata::MetadataStore;
pub use root::RootState;
pub use search::{SearchSettings, SearchState};
pub use sources::{BlindsearchCount, SourceStore};
