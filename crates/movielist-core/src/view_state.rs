use anyhow::Result;
use movielist_config::PreferenceStore;
use movielist_models::{ListViewFilters, SortType, ViewMode, ViewPreferences};
use tracing::debug;

/// Current list view preferences plus the page being shown.
///
/// Preferences are written through to the preference store on every change;
/// the page is kept in memory only and goes back to 1 whenever the
/// preferences change.
pub struct ViewState {
    preferences: ViewPreferences,
    page: usize,
    store: Option<PreferenceStore>,
}

impl ViewState {
    /// State that is never persisted.
    pub fn in_memory(preferences: ViewPreferences) -> Self {
        Self {
            preferences,
            page: 1,
            store: None,
        }
    }

    /// Restore preferences from `store`; missing or corrupt data yields the
    /// defaults.
    pub fn load(store: PreferenceStore) -> Self {
        let preferences = store.load_view_preferences();
        debug!(?preferences, "Loaded view preferences");
        Self {
            preferences,
            page: 1,
            store: Some(store),
        }
    }

    pub fn preferences(&self) -> &ViewPreferences {
        &self.preferences
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn set_page(&mut self, page: usize) {
        self.page = page.max(1);
    }

    pub fn set_mode(&mut self, mode: ViewMode) -> Result<()> {
        self.update(|p| p.mode = mode)
    }

    pub fn set_sort(&mut self, sort: SortType) -> Result<()> {
        self.update(|p| p.sort = sort)
    }

    pub fn set_query(&mut self, query: impl Into<String>) -> Result<()> {
        let query = query.into();
        self.update(|p| p.query = query)
    }

    pub fn set_filters(&mut self, filters: ListViewFilters) -> Result<()> {
        self.update(|p| p.filters = filters)
    }

    fn update(&mut self, f: impl FnOnce(&mut ViewPreferences)) -> Result<()> {
        let before = self.preferences.clone();
        f(&mut self.preferences);
        if self.preferences == before {
            return Ok(());
        }

        self.page = 1;
        if let Some(store) = self.store.as_mut() {
            store.save_view_preferences(&self.preferences)?;
        }
        Ok(())
    }
}
