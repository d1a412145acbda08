pub mod list;
pub mod movie;
pub mod record;
pub mod view;

pub use list::{ListId, UnknownListId};
pub use movie::{null_as_default, round_to_half_star, Movie};
pub use record::{ProviderRecord, Record, RecordOption, RecordOptions};
pub use view::{ListViewFilters, SortType, ViewMode, ViewPreferences};
