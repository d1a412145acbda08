use serde::{Deserialize, Deserializer, Serialize};

/// Movie details embedded in a record. Read-only on the client.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Movie {
    pub id: i64,
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title_original: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_released: bool,
    #[serde(default)]
    pub release_date: Option<String>,
    /// Epoch seconds
    #[serde(default)]
    pub release_date_timestamp: Option<i64>,
    /// IMDb rating as fetched (0-10 scale), absent for unreleased movies
    #[serde(default)]
    pub imdb_rating: Option<f64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub director: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub actors: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub genre: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub overview: String,
    #[serde(default)]
    pub poster_small: Option<String>,
    #[serde(default)]
    pub poster_normal: Option<String>,
    #[serde(default)]
    pub poster_big: Option<String>,
}

impl Movie {
    /// IMDb rating on the 0-5 star scale, rounded to the nearest half star.
    pub fn imdb_rating_converted(&self) -> Option<f64> {
        self.imdb_rating.map(|rating| round_to_half_star(rating / 10.0 * 5.0))
    }

    /// Text the search filter matches against.
    pub fn search_text(&self) -> String {
        format!(
            "{} {} {} {}",
            self.title, self.title_original, self.director, self.actors
        )
    }
}

/// Treat an explicit `null` like a missing field. Use together with
/// `#[serde(default)]`.
pub fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// `round(x * 2) / 2`, with halves rounded away from zero.
pub fn round_to_half_star(value: f64) -> f64 {
    (value * 2.0).round() / 2.0
}
