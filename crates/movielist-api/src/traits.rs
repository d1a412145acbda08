use async_trait::async_trait;
use movielist_models::{ListId, Record, RecordOptions};

use crate::api::{AddFromDbStatus, RecordOrder};
use crate::error::ApiError;

/// Backend operations the list pipeline depends on.
#[async_trait]
pub trait RecordsBackend: Send + Sync {
    /// Records of the logged-in user
    async fn fetch_records(&self) -> Result<Vec<Record>, ApiError>;

    /// Public records of another user
    async fn fetch_user_records(&self, username: &str) -> Result<Vec<Record>, ApiError>;

    async fn add_to_list(&self, movie_id: i64, list_id: ListId) -> Result<(), ApiError>;

    /// Add by external movie database id
    async fn add_to_list_from_db(&self, movie_id: i64, list_id: ListId) -> Result<AddFromDbStatus, ApiError>;

    async fn remove_record(&self, record_id: i64) -> Result<(), ApiError>;

    async fn change_rating(&self, record_id: i64, rating: u8) -> Result<(), ApiError>;

    async fn save_options(&self, record_id: i64, options: &RecordOptions) -> Result<(), ApiError>;

    async fn save_comment(&self, record_id: i64, comment: &str) -> Result<(), ApiError>;

    /// Persist the complete custom order of a list
    async fn save_records_order(&self, records: &[RecordOrder]) -> Result<(), ApiError>;
}
