use chrono::{DateTime, Months, Utc};
use movielist_models::{ListId, ListViewFilters, Movie, Record};
use tracing::warn;

/// Records of `list` that match the search query and the list's filters.
///
/// Invalid records are dropped with a warning. The input is left untouched.
pub fn filter_records(records: &[Record], list: ListId, query: &str, filters: &ListViewFilters) -> Vec<Record> {
    filter_records_at(records, list, query, filters, Utc::now())
}

/// [`filter_records`] with an explicit "now" for the recent-releases filter.
pub fn filter_records_at(
    records: &[Record],
    list: ListId,
    query: &str,
    filters: &ListViewFilters,
    now: DateTime<Utc>,
) -> Vec<Record> {
    let query = normalize(query);

    records
        .iter()
        .filter(|record| {
            if !record.is_valid() {
                warn!(record_id = record.id, "Skipping malformed record");
                return false;
            }
            record.list_id == list
                && matches_normalized(record, &query)
                && passes_list_filters(record, list, filters, now)
        })
        .cloned()
        .collect()
}

/// Case-insensitive substring match against title, original title,
/// director and actors. An empty query matches everything.
pub fn matches_search_query(record: &Record, query: &str) -> bool {
    matches_normalized(record, &normalize(query))
}

/// A 5-star movie not yet seen in its best version, unless the user opted
/// out of rewatch suggestions for it.
pub fn is_rewatch_candidate(record: &Record) -> bool {
    let options = &record.options;
    record.rating == 5 && ((!options.ultra_hd && !options.theatre) || !options.original) && !options.ignore_rewatch
}

/// Released within the six calendar months before `now`.
pub fn is_recent_release(movie: &Movie, now: DateTime<Utc>) -> bool {
    let Some(released) = movie
        .release_date_timestamp
        .and_then(|ts| DateTime::<Utc>::from_timestamp(ts, 0))
    else {
        return false;
    };
    let Some(cutoff) = now.checked_sub_months(Months::new(6)) else {
        return false;
    };
    released >= cutoff && released <= now
}

fn normalize(query: &str) -> String {
    query.trim().to_lowercase()
}

fn matches_normalized(record: &Record, query: &str) -> bool {
    query.is_empty() || record.movie.search_text().to_lowercase().contains(query)
}

fn passes_list_filters(record: &Record, list: ListId, filters: &ListViewFilters, now: DateTime<Utc>) -> bool {
    match list {
        ListId::Watched => !filters.to_rewatch || is_rewatch_candidate(record),
        ListId::ToWatch => {
            (!filters.hide_unreleased || record.movie.is_released)
                && (!filters.recent_releases || is_recent_release(&record.movie, now))
        }
    }
}
