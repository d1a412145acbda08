use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::list::ListId;
use crate::movie::{null_as_default, Movie};

/// A user's relationship to one movie: list membership, rating, comment and
/// watch-quality options.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    pub id: i64,
    pub list_id: ListId,
    #[serde(default, deserialize_with = "null_as_default")]
    pub order: i64,
    /// User rating 0-5, 0 means unrated
    #[serde(default, deserialize_with = "null_as_default")]
    pub rating: u8,
    /// Last rating confirmed by the server
    #[serde(default, deserialize_with = "null_as_default")]
    pub rating_original: u8,
    #[serde(default, deserialize_with = "null_as_default")]
    pub comment: String,
    /// Whether the comment editor is open. Never persisted.
    #[serde(skip)]
    pub comment_area: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub options: RecordOptions,
    /// Epoch seconds
    #[serde(default, deserialize_with = "null_as_default")]
    pub addition_date: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub provider_records: Vec<ProviderRecord>,
    pub movie: Movie,
}

impl Record {
    /// Structural validity: a record the list pipeline can safely display.
    pub fn is_valid(&self) -> bool {
        self.id != 0 && self.rating <= 5 && !self.movie.title.trim().is_empty()
    }
}

/// Streaming provider availability for a record. Read-only.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ProviderRecord {
    pub provider_id: i64,
    #[serde(default)]
    pub provider_name: String,
    #[serde(default)]
    pub logo: Option<String>,
    #[serde(default)]
    pub tmdb_watch_url: Option<String>,
}

/// Watch-quality flags for a record.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct RecordOptions {
    pub original: bool,
    pub extended: bool,
    pub theatre: bool,
    pub hd: bool,
    pub full_hd: bool,
    pub ultra_hd: bool,
    pub ignore_rewatch: bool,
}

impl RecordOptions {
    pub fn get(&self, option: RecordOption) -> bool {
        match option {
            RecordOption::Original => self.original,
            RecordOption::Extended => self.extended,
            RecordOption::Theatre => self.theatre,
            RecordOption::Hd => self.hd,
            RecordOption::FullHd => self.full_hd,
            RecordOption::UltraHd => self.ultra_hd,
            RecordOption::IgnoreRewatch => self.ignore_rewatch,
        }
    }

    pub fn set(&mut self, option: RecordOption, value: bool) {
        let flag = match option {
            RecordOption::Original => &mut self.original,
            RecordOption::Extended => &mut self.extended,
            RecordOption::Theatre => &mut self.theatre,
            RecordOption::Hd => &mut self.hd,
            RecordOption::FullHd => &mut self.full_hd,
            RecordOption::UltraHd => &mut self.ultra_hd,
            RecordOption::IgnoreRewatch => &mut self.ignore_rewatch,
        };
        *flag = value;
    }
}

/// Names a single flag of [`RecordOptions`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordOption {
    Original,
    Extended,
    Theatre,
    Hd,
    FullHd,
    UltraHd,
    IgnoreRewatch,
}

impl RecordOption {
    pub const ALL: [RecordOption; 7] = [
        RecordOption::Original,
        RecordOption::Extended,
        RecordOption::Theatre,
        RecordOption::Hd,
        RecordOption::FullHd,
        RecordOption::UltraHd,
        RecordOption::IgnoreRewatch,
    ];

    pub fn wire_name(self) -> &'static str {
        match self {
            RecordOption::Original => "original",
            RecordOption::Extended => "extended",
            RecordOption::Theatre => "theatre",
            RecordOption::Hd => "hd",
            RecordOption::FullHd => "fullHd",
            RecordOption::UltraHd => "ultraHd",
            RecordOption::IgnoreRewatch => "ignoreRewatch",
        }
    }
}

impl fmt::Display for RecordOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

impl FromStr for RecordOption {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace(|c: char| c == '-' || c == '_', "");
        RecordOption::ALL
            .into_iter()
            .find(|option| option.wire_name().to_lowercase() == normalized)
            .ok_or_else(|| format!("Unknown record option: {}", s))
    }
}
