//! Domain model for rvt2-analyzer.
//!
//! Pure data types shared by the client, the stores and the command line.

pub mod error;
pub mod identifiers;
pub mod notification;
pub mod query;
pub mod result;

pub use error::{AppError, ClientError, ValidationError};
pub use identifiers::{DocId, IndexName, InvalidDocId, InvalidIndexName};
pub use notification::{Notification, NotificationKind};
pub use query::{QueryType, SearchQuery, Sort, UnknownQueryType};
pub use result::{ResultDoc, SearchHits, SourceFields};
