pub mod filter;
pub mod list_view;
pub mod mutations;
pub mod notify;
pub mod pagination;
pub mod sort;
pub mod store;
pub mod view_state;

#[cfg(test)]
pub(crate) mod testing;

pub use filter::{filter_records, filter_records_at, is_recent_release, is_rewatch_candidate, matches_search_query};
pub use list_view::ListView;
pub use mutations::{MutationOutcome, Mutations};
pub use notify::{
    notification_for_error, report_background_error, LogNotifier, Notification, NotificationLevel, Notifier,
};
pub use pagination::{paginate, total_pages, Page, Paginator, DEFAULT_ITEMS_PER_PAGE};
pub use sort::sort_records;
pub use store::{ListContext, LoadOutcome, RecordStore, StoreSnapshot};
pub use view_state::ViewState;
