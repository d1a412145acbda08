use movielist_models::{ListId, Record, SortType};
use std::cmp::Ordering;

/// Return a sorted copy of `records`. Sorting is stable: records with equal
/// keys keep their relative order.
///
/// Rating sorts by the user's rating on the watched list and by the IMDb
/// rating on the to-watch list. Records without a release date or IMDb
/// rating sort last.
pub fn sort_records(records: &[Record], sort: SortType, list: ListId) -> Vec<Record> {
    let mut sorted = records.to_vec();
    match sort {
        SortType::AdditionDate => sorted.sort_by(|a, b| b.addition_date.cmp(&a.addition_date)),
        SortType::ReleaseDate => sorted.sort_by(|a, b| {
            let a = a.movie.release_date_timestamp.unwrap_or(i64::MIN);
            let b = b.movie.release_date_timestamp.unwrap_or(i64::MIN);
            b.cmp(&a)
        }),
        SortType::Rating if list == ListId::Watched => sorted.sort_by(|a, b| b.rating.cmp(&a.rating)),
        SortType::Rating => sorted.sort_by(|a, b| imdb_rating_desc(a, b)),
        SortType::Custom => sorted.sort_by_key(|r| r.order),
    }
    sorted
}

fn imdb_rating_desc(a: &Record, b: &Record) -> Ordering {
    let rating = |r: &Record| r.movie.imdb_rating.filter(|v| !v.is_nan());
    match (rating(a), rating(b)) {
        (Some(a), Some(b)) => b.total_cmp(&a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
