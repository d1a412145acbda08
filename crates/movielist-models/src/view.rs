use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default, Hash)]
#[serde(rename_all = "camelCase")]
pub enum SortType {
    #[default]
    AdditionDate,
    ReleaseDate,
    Rating,
    Custom,
}

impl SortType {
    pub fn name(self) -> &'static str {
        match self {
            SortType::AdditionDate => "additionDate",
            SortType::ReleaseDate => "releaseDate",
            SortType::Rating => "rating",
            SortType::Custom => "custom",
        }
    }
}

impl fmt::Display for SortType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SortType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace(|c: char| c == '-' || c == '_', "").as_str() {
            "additiondate" | "added" => Ok(SortType::AdditionDate),
            "releasedate" | "released" => Ok(SortType::ReleaseDate),
            "rating" => Ok(SortType::Rating),
            "custom" => Ok(SortType::Custom),
            _ => Err(format!("Invalid sort type: {}. Use 'addition-date', 'release-date', 'rating', or 'custom'", s)),
        }
    }
}

/// Display density of a list. Has no effect on which records are shown.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default, Hash)]
#[serde(rename_all = "camelCase")]
pub enum ViewMode {
    #[default]
    Full,
    Minimal,
    Gallery,
    Compact,
}

impl FromStr for ViewMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "full" => Ok(ViewMode::Full),
            "minimal" => Ok(ViewMode::Minimal),
            "gallery" => Ok(ViewMode::Gallery),
            "compact" => Ok(ViewMode::Compact),
            _ => Err(format!("Invalid view mode: {}. Use 'full', 'minimal', 'gallery', or 'compact'", s)),
        }
    }
}

/// List-specific boolean filters.
///
/// `to_rewatch` only applies to the watched list; `hide_unreleased` and
/// `recent_releases` only apply to the to-watch list.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default, Hash)]
#[serde(rename_all = "camelCase", default)]
pub struct ListViewFilters {
    pub to_rewatch: bool,
    pub hide_unreleased: bool,
    pub recent_releases: bool,
}

/// User-chosen list view preferences persisted across navigation.
/// The current page is deliberately not part of it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct ViewPreferences {
    pub mode: ViewMode,
    pub sort: SortType,
    pub query: String,
    pub filters: ListViewFilters,
}
