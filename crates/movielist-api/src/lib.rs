pub mod api;
pub mod auth;
pub mod client;
pub mod dedup;
pub mod error;
pub mod traits;

pub use api::{AddFromDbStatus, RecordOrder, SearchKind, SearchOptions, SearchResponse, SearchResult};
pub use auth::TokenPair;
pub use client::ApiClient;
pub use dedup::RequestDeduplicator;
pub use error::{ApiError, Disposition, ErrorKind, Severity};
pub use traits::RecordsBackend;
