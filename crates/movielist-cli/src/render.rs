use comfy_table::{presets, Attribute, Cell, Color, ContentArrangement, Table};
use movielist_api::SearchResult;
use movielist_models::{ListId, Record, RecordOption, ViewMode};

fn new_table(headers: &[&str]) -> Table {
    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL);
    table.apply_modifier(comfy_table::modifiers::UTF8_ROUND_CORNERS);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(
        headers
            .iter()
            .map(|h| Cell::new(h).add_attribute(Attribute::Bold).fg(Color::Cyan)),
    );
    table
}

/// `★★★☆☆`, or `-` when unrated.
pub fn stars(rating: u8) -> String {
    if rating == 0 {
        return "-".to_string();
    }
    let filled = usize::from(rating.min(5));
    format!("{}{}", "★".repeat(filled), "☆".repeat(5 - filled))
}

fn release_year(record: &Record) -> String {
    record
        .movie
        .release_date
        .as_deref()
        .and_then(|d| d.get(..4))
        .unwrap_or("-")
        .to_string()
}

/// Comma-separated names of the options that are set.
pub fn options_summary(record: &Record) -> String {
    let set: Vec<&str> = RecordOption::ALL
        .into_iter()
        .filter(|option| record.options.get(*option))
        .map(|option| option.wire_name())
        .collect();
    set.join(", ")
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(max.saturating_sub(1)).collect();
    cut.push('…');
    cut
}

pub fn records_table(records: &[Record], list: ListId, mode: ViewMode) -> Table {
    match mode {
        ViewMode::Minimal => {
            let mut table = new_table(&["ID", "Title", "Rating"]);
            for r in records {
                table.add_row(vec![r.id.to_string(), r.movie.title.clone(), rating_cell(r, list)]);
            }
            table
        }
        ViewMode::Compact => {
            let mut table = new_table(&["ID", "Title", "Year", "Rating", "IMDb"]);
            for r in records {
                table.add_row(vec![
                    r.id.to_string(),
                    r.movie.title.clone(),
                    release_year(r),
                    rating_cell(r, list),
                    imdb_cell(r),
                ]);
            }
            table
        }
        ViewMode::Gallery => {
            let mut table = new_table(&["ID", "Title", "Poster"]);
            for r in records {
                let poster = r
                    .movie
                    .poster_normal
                    .clone()
                    .or_else(|| r.movie.poster_small.clone())
                    .unwrap_or_default();
                table.add_row(vec![r.id.to_string(), r.movie.title.clone(), poster]);
            }
            table
        }
        ViewMode::Full => {
            let mut table = new_table(&["ID", "Title", "Year", "Director", "Rating", "IMDb", "Options", "Comment"]);
            for r in records {
                let title = if r.movie.title_original.is_empty() || r.movie.title_original == r.movie.title {
                    r.movie.title.clone()
                } else {
                    format!("{}\n{}", r.movie.title, r.movie.title_original)
                };
                table.add_row(vec![
                    r.id.to_string(),
                    title,
                    release_year(r),
                    r.movie.director.clone(),
                    rating_cell(r, list),
                    imdb_cell(r),
                    options_summary(r),
                    truncate(&r.comment, 40),
                ]);
            }
            table
        }
    }
}

/// User stars on the watched list, converted IMDb stars otherwise.
fn rating_cell(record: &Record, list: ListId) -> String {
    match list {
        ListId::Watched => stars(record.rating),
        ListId::ToWatch => record
            .movie
            .imdb_rating_converted()
            .map(|stars| format!("{:.1}★", stars))
            .unwrap_or_else(|| "-".to_string()),
    }
}

fn imdb_cell(record: &Record) -> String {
    record
        .movie
        .imdb_rating
        .map(|rating| format!("{:.1}", rating))
        .unwrap_or_else(|| "-".to_string())
}

pub fn search_table(results: &[SearchResult]) -> Table {
    let mut table = new_table(&["#", "ID", "Title", "Released", "Overview"]);
    for (i, result) in results.iter().enumerate() {
        table.add_row(vec![
            (i + 1).to_string(),
            result.id.to_string(),
            result.title.clone(),
            result.release_date.clone().unwrap_or_default(),
            truncate(&result.overview, 60),
        ]);
    }
    table
}
