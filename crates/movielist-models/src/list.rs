use serde::{Deserialize, Serialize};
use std::fmt;

/// The two fixed lists every user owns.
///
/// Encoded on the wire as the backend's integer list identifier
/// (watched = 1, to-watch = 2). Any other value fails to decode.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "u8", into = "u8")]
pub enum ListId {
    Watched,
    ToWatch,
}

impl ListId {
    pub fn as_u8(self) -> u8 {
        match self {
            ListId::Watched => 1,
            ListId::ToWatch => 2,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ListId::Watched => "watched",
            ListId::ToWatch => "to-watch",
        }
    }
}

impl fmt::Display for ListId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownListId(pub u8);

impl fmt::Display for UnknownListId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown list id: {}", self.0)
    }
}

impl std::error::Error for UnknownListId {}

impl TryFrom<u8> for ListId {
    type Error = UnknownListId;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(ListId::Watched),
            2 => Ok(ListId::ToWatch),
            other => Err(UnknownListId(other)),
        }
    }
}

impl From<ListId> for u8 {
    fn from(value: ListId) -> Self {
        value.as_u8()
    }
}
