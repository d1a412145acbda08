use movielist_models::{null_as_default, ListId, Record, RecordOptions};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// One `{id, order}` pair of a full custom-order resync.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct RecordOrder {
    pub id: i64,
    pub order: i64,
}

/// Result of adding a movie by its external database id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddFromDbStatus {
    Added,
    NotFound,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SearchKind {
    #[default]
    Movie,
    Person,
}

/// Extra search options, sent JSON-encoded in the `options` query parameter.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct SearchOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    #[serde(default)]
    pub exact_match: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    /// External movie database id, used with add-to-list-from-db
    pub id: i64,
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title_original: String,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub poster: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub overview: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    #[serde(default)]
    pub items: Vec<SearchResult>,
    #[serde(default)]
    pub total_pages: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AddToListRequest {
    pub list_id: ListId,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AddFromDbRequest {
    pub movie_id: i64,
    pub list_id: ListId,
}

#[derive(Debug, Serialize)]
pub(crate) struct RatingRequest {
    pub rating: u8,
}

#[derive(Debug, Serialize)]
pub(crate) struct OptionsRequest<'a> {
    pub options: &'a RecordOptions,
}

#[derive(Debug, Serialize)]
pub(crate) struct CommentRequest<'a> {
    pub comment: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct RecordsOrderRequest<'a> {
    pub records: &'a [RecordOrder],
}

#[derive(Debug, Deserialize)]
struct StatusResponse {
    #[serde(default)]
    status: Option<String>,
}

/// Decode a record list element by element, dropping elements that do not
/// match the record shape instead of failing the whole list.
pub fn decode_records(values: Vec<serde_json::Value>) -> Vec<Record> {
    let total = values.len();
    let records: Vec<Record> = values
        .into_iter()
        .enumerate()
        .filter_map(|(index, value)| match serde_json::from_value::<Record>(value) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!("Dropping malformed record at index {}: {}", index, e);
                None
            }
        })
        .collect();
    debug!("Decoded {} of {} records", records.len(), total);
    records
}

pub(crate) fn decode_add_from_db_status(body: &str) -> AddFromDbStatus {
    match serde_json::from_str::<StatusResponse>(body) {
        Ok(StatusResponse { status: Some(status) }) if status == "not_found" => AddFromDbStatus::NotFound,
        _ => AddFromDbStatus::Added,
    }
}

pub(crate) fn user_records_path(username: &str) -> String {
    format!("users/{}/records/", urlencoding::encode(username))
}
