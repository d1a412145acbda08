use anyhow::Result;
use movielist_models::{ListId, ListViewFilters, SortType, ViewMode};

use crate::filter::filter_records;
use crate::pagination::{Page, Paginator};
use crate::sort::sort_records;
use crate::store::StoreSnapshot;
use crate::view_state::ViewState;

/// Filter, sort and paginate one list of the record store.
///
/// Derived pages are recomputed from a store snapshot on every render; the
/// paginator cache is dropped whenever the store revision, the list or the
/// preferences change.
pub struct ListView {
    list: ListId,
    state: ViewState,
    paginator: Paginator,
    seen_revision: Option<u64>,
}

impl ListView {
    pub fn new(list: ListId, state: ViewState, items_per_page: usize) -> Self {
        Self {
            list,
            state,
            paginator: Paginator::new(items_per_page),
            seen_revision: None,
        }
    }

    pub fn list(&self) -> ListId {
        self.list
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    pub fn set_list(&mut self, list: ListId) {
        if self.list != list {
            self.list = list;
            self.state.set_page(1);
            self.paginator.invalidate();
        }
    }

    pub fn set_page(&mut self, page: usize) {
        self.state.set_page(page);
    }

    pub fn set_mode(&mut self, mode: ViewMode) -> Result<()> {
        self.state.set_mode(mode)
    }

    pub fn set_sort(&mut self, sort: SortType) -> Result<()> {
        self.paginator.invalidate();
        self.state.set_sort(sort)
    }

    pub fn set_query(&mut self, query: impl Into<String>) -> Result<()> {
        self.paginator.invalidate();
        self.state.set_query(query)
    }

    pub fn set_filters(&mut self, filters: ListViewFilters) -> Result<()> {
        self.paginator.invalidate();
        self.state.set_filters(filters)
    }

    pub fn render(&mut self, snapshot: &StoreSnapshot) -> Page {
        if self.seen_revision != Some(snapshot.revision) {
            self.paginator.invalidate();
            self.seen_revision = Some(snapshot.revision);
        }

        let preferences = self.state.preferences();
        let filtered = filter_records(&snapshot.records, self.list, &preferences.query, &preferences.filters);
        let sorted = sort_records(&filtered, preferences.sort, self.list);
        let page = self.paginator.page(&sorted, self.state.page());

        if page.validated_page != self.state.page() {
            self.state.set_page(page.validated_page);
        }
        page
    }
}
