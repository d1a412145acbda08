use chrono::Utc;
use movielist_api::{AddFromDbStatus, ApiError, RecordsBackend, SearchResult};
use movielist_models::{ListId, Movie, Record, RecordOption, RecordOptions};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::notify::{notification_for_error, report_background_error, Notification, Notifier};
use crate::store::{Epoch, ListContext, RecordStore};

/// How an optimistic mutation ended.
#[must_use]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationOutcome {
    /// The backend accepted the change
    Committed,
    /// The backend rejected the change and the local edit was reverted
    RolledBack(ApiError),
    /// The backend call failed and there was nothing to revert
    Failed(ApiError),
    /// Nothing was sent, e.g. the record no longer exists
    Skipped,
}

impl MutationOutcome {
    pub fn is_committed(&self) -> bool {
        matches!(self, MutationOutcome::Committed)
    }

    pub fn error(&self) -> Option<&ApiError> {
        match self {
            MutationOutcome::RolledBack(e) | MutationOutcome::Failed(e) => Some(e),
            MutationOutcome::Committed | MutationOutcome::Skipped => None,
        }
    }
}

/// User edits to the record store.
///
/// Every edit is applied locally first, then sent to the backend. When the
/// backend call fails the local edit is reverted (where there is one to
/// revert) and the user is notified. Failures never escape as errors.
///
/// A revert only touches the collection the edit was made in. If the store
/// switched lists or reloaded in the meantime, the new records are left alone.
#[derive(Clone)]
pub struct Mutations {
    store: RecordStore,
    backend: Arc<dyn RecordsBackend>,
    notifier: Arc<dyn Notifier>,
}

impl Mutations {
    pub fn new(store: RecordStore, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            backend: store.backend(),
            store,
            notifier,
        }
    }

    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    pub async fn change_rating(&self, record_id: i64, rating: u8) -> MutationOutcome {
        if rating > 5 {
            self.notifier
                .notify(Notification::warning(format!("Rating must be between 0 and 5, got {}", rating)));
            return MutationOutcome::Skipped;
        }

        let Some((epoch, previous)) = self
            .store
            .edit(record_id, |r| std::mem::replace(&mut r.rating, rating))
            .await
        else {
            return self.missing(record_id);
        };

        match self.backend.change_rating(record_id, rating).await {
            Ok(()) => {
                self.store.edit_in(epoch, record_id, |r| r.rating_original = rating).await;
                debug!(record_id, rating, "Rating saved");
                MutationOutcome::Committed
            }
            Err(e) => {
                self.store.edit_in(epoch, record_id, |r| r.rating = previous).await;
                self.report(&e, "save the rating");
                MutationOutcome::RolledBack(e)
            }
        }
    }

    /// Persist `option` after the caller has already flipped it locally.
    /// On failure the flag goes back to its value before the flip.
    pub async fn save_options(&self, record_id: i64, option: RecordOption) -> MutationOutcome {
        let Some((epoch, record)) = self.store.lookup(record_id).await else {
            return self.missing(record_id);
        };
        let flipped = record.options.get(option);
        self.send_options(epoch, record_id, option, flipped, record.options).await
    }

    /// Flip `option` locally and persist it.
    pub async fn toggle_option(&self, record_id: i64, option: RecordOption) -> MutationOutcome {
        let Some((epoch, (flipped, options))) = self
            .store
            .edit(record_id, |r| {
                let value = !r.options.get(option);
                r.options.set(option, value);
                (value, r.options)
            })
            .await
        else {
            return self.missing(record_id);
        };
        self.send_options(epoch, record_id, option, flipped, options).await
    }

    async fn send_options(
        &self,
        epoch: Epoch,
        record_id: i64,
        option: RecordOption,
        flipped: bool,
        options: RecordOptions,
    ) -> MutationOutcome {
        match self.backend.save_options(record_id, &options).await {
            Ok(()) => {
                debug!(record_id, %option, value = flipped, "Option saved");
                MutationOutcome::Committed
            }
            Err(e) => {
                self.store.edit_in(epoch, record_id, |r| r.options.set(option, !flipped)).await;
                self.report(&e, "save the watch options");
                MutationOutcome::RolledBack(e)
            }
        }
    }

    /// Edit the comment locally and open the comment editor. Nothing is
    /// sent until [`save_comment`](Self::save_comment).
    pub async fn set_comment(&self, record_id: i64, comment: impl Into<String>) -> bool {
        let comment = comment.into();
        self.store
            .with_record_mut(record_id, |r| {
                r.comment = comment;
                r.comment_area = true;
            })
            .await
            .is_some()
    }

    /// Send the current comment. The text is never reverted; an emptied
    /// comment closes the editor once saved.
    pub async fn save_comment(&self, record_id: i64) -> MutationOutcome {
        let Some(comment) = self.store.get(record_id).await.map(|r| r.comment) else {
            return self.missing(record_id);
        };

        match self.backend.save_comment(record_id, &comment).await {
            Ok(()) => {
                if comment.is_empty() {
                    self.store.with_record_mut(record_id, |r| r.comment_area = false).await;
                }
                debug!(record_id, "Comment saved");
                MutationOutcome::Committed
            }
            Err(e) => {
                self.report(&e, "save the comment");
                MutationOutcome::Failed(e)
            }
        }
    }

    /// Fire-and-forget [`save_comment`](Self::save_comment).
    pub fn spawn_save_comment(&self, record_id: i64) -> JoinHandle<MutationOutcome> {
        let this = self.clone();
        tokio::spawn(async move { this.save_comment(record_id).await })
    }

    pub async fn remove_record(&self, record_id: i64) -> MutationOutcome {
        let Some((epoch, index, record)) = self.store.remove(record_id).await else {
            return self.missing(record_id);
        };

        match self.backend.remove_record(record_id).await {
            Ok(()) => {
                info!(record_id, "Record removed");
                self.notifier
                    .notify(Notification::success(format!("Removed \"{}\"", record.movie.title)));
                MutationOutcome::Committed
            }
            Err(e) => {
                if !self.store.insert_at(epoch, index, record).await {
                    debug!(record_id, "Removed record not restored, the list changed meanwhile");
                }
                self.report(&e, "remove the record");
                MutationOutcome::RolledBack(e)
            }
        }
    }

    /// Add `movie_id` to `list`. When `record_id` names an existing record,
    /// it is moved to `list` locally and its addition date refreshed.
    pub async fn add_to_list(&self, movie_id: i64, list: ListId, record_id: Option<i64>) -> MutationOutcome {
        if let Err(e) = self.backend.add_to_list(movie_id, list).await {
            self.report(&e, "add the movie");
            return MutationOutcome::Failed(e);
        }

        if let Some(record_id) = record_id {
            let now = Utc::now().timestamp();
            let updated = self
                .store
                .with_record_mut(record_id, |r| {
                    r.list_id = list;
                    r.addition_date = now;
                })
                .await;
            if updated.is_none() {
                warn!(record_id, "Record to move was no longer in the store");
            }
        }

        info!(movie_id, %list, "Movie added");
        self.notifier.notify(Notification::success(format!("Added to {}", list)));
        MutationOutcome::Committed
    }

    /// Add a search hit by its external database id.
    pub async fn add_from_search(&self, result: &SearchResult, list: ListId) -> MutationOutcome {
        self.add_from_db(result.id, list, Some(result)).await
    }

    /// Add a movie by external database id. On success a provisional record
    /// is shown right away and the own records are refetched to pick up the
    /// server's version. The refetch never joins a fetch that started before
    /// the add.
    pub async fn add_from_db(&self, movie_id: i64, list: ListId, preview: Option<&SearchResult>) -> MutationOutcome {
        match self.backend.add_to_list_from_db(movie_id, list).await {
            Ok(AddFromDbStatus::Added) => {}
            Ok(AddFromDbStatus::NotFound) => {
                warn!(movie_id, "Movie not found in the movie database");
                self.notifier.notify(Notification::warning("Movie not found"));
                return MutationOutcome::Failed(ApiError::Validation {
                    status: 404,
                    message: "Movie not found".to_string(),
                });
            }
            Err(e) => {
                self.report(&e, "add the movie");
                return MutationOutcome::Failed(e);
            }
        }

        let own = self.store.context().await == Some(ListContext::Own);
        if own {
            if let Some(result) = preview {
                let record = provisional_record(self.store.next_provisional_id().await, list, result);
                self.store.push_to(&ListContext::Own, record).await;
            }
        }

        info!(movie_id, %list, "Movie added from the movie database");
        let title = preview.map(|r| r.title.as_str()).unwrap_or("Movie");
        self.notifier
            .notify(Notification::success(format!("\"{}\" added to {}", title, list)));

        if own {
            if let Err(e) = self.store.refresh(ListContext::Own).await {
                report_background_error(self.notifier.as_ref(), &e, "refresh the list");
            }
        }
        MutationOutcome::Committed
    }

    pub async fn move_to_top(&self, record_id: i64) -> MutationOutcome {
        self.move_record(record_id, true).await
    }

    pub async fn move_to_bottom(&self, record_id: i64) -> MutationOutcome {
        self.move_record(record_id, false).await
    }

    /// Move within the custom order and persist the whole list's order.
    async fn move_record(&self, record_id: i64, to_front: bool) -> MutationOutcome {
        let Some(reorder) = self.store.reorder(record_id, to_front).await else {
            return self.missing(record_id);
        };

        match self.backend.save_records_order(&reorder.orders).await {
            Ok(()) => {
                debug!(record_id, records = reorder.orders.len(), "Order saved");
                MutationOutcome::Committed
            }
            Err(e) => {
                self.store.restore_orders(reorder.epoch, &reorder.previous).await;
                self.report(&e, "save the order");
                MutationOutcome::RolledBack(e)
            }
        }
    }

    fn missing(&self, record_id: i64) -> MutationOutcome {
        warn!(record_id, "Record not found in the store");
        self.notifier
            .notify(Notification::warning(format!("Record {} not found", record_id)));
        MutationOutcome::Skipped
    }

    fn report(&self, err: &ApiError, action: &str) {
        warn!(error = %err, "Could not {}", action);
        self.notifier.notify(notification_for_error(err, action));
    }
}

fn provisional_record(id: i64, list: ListId, result: &SearchResult) -> Record {
    Record {
        id,
        list_id: list,
        order: 0,
        rating: 0,
        rating_original: 0,
        comment: String::new(),
        comment_area: false,
        options: RecordOptions::default(),
        addition_date: Utc::now().timestamp(),
        provider_records: Vec::new(),
        movie: Movie {
            id: result.id,
            title: result.title.clone(),
            title_original: result.title_original.clone(),
            release_date: result.release_date.clone(),
            overview: result.overview.clone(),
            poster_normal: result.poster.clone(),
            ..Movie::default()
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::NotificationLevel;
    use crate::store::LoadOutcome;
    use crate::testing::{record, FakeBackend, RecordingNotifier};
    use std::sync::atomic::Ordering;
    use std::time::Duration;

    fn slow_failing_writes(backend: &FakeBackend) {
        *backend.write_delay.lock().unwrap() = Duration::from_millis(50);
        backend.fail_writes.store(true, Ordering::SeqCst);
    }

    async fn switch_to_bob_after(m: &Mutations, delay_ms: u64) -> LoadOutcome {
        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
        m.store().reload(ListContext::Profile("bob".to_string())).await.unwrap()
    }

    async fn setup(records: Vec<Record>) -> (Arc<FakeBackend>, Arc<RecordingNotifier>, Mutations) {
        let backend = Arc::new(FakeBackend::with_records(records));
        let notifier = Arc::new(RecordingNotifier::default());
        let store = RecordStore::new(backend.clone());
        store.load(ListContext::Own).await.unwrap();
        let mutations = Mutations::new(store, notifier.clone());
        (backend, notifier, mutations)
    }

    fn ids(records: &[Record]) -> Vec<i64> {
        records.iter().map(|r| r.id).collect()
    }

    #[tokio::test]
    async fn test_change_rating_commits() {
        let (backend, notifier, m) = setup(vec![record(1, ListId::Watched)]).await;

        assert_eq!(m.change_rating(1, 4).await, MutationOutcome::Committed);
        let r = m.store().get(1).await.unwrap();
        assert_eq!(r.rating, 4);
        assert_eq!(r.rating_original, 4);
        assert_eq!(backend.calls().last().unwrap(), "change_rating:1:4");
        assert!(notifier.notifications().is_empty());
    }

    #[tokio::test]
    async fn test_change_rating_rolls_back() {
        let mut r = record(1, ListId::Watched);
        r.rating = 3;
        r.rating_original = 3;
        let (backend, notifier, m) = setup(vec![r]).await;
        backend.set_failing(true);

        let outcome = m.change_rating(1, 5).await;
        assert!(matches!(outcome, MutationOutcome::RolledBack(ApiError::Server { status: 500, .. })));

        let r = m.store().get(1).await.unwrap();
        assert_eq!(r.rating, 3);
        assert_eq!(r.rating_original, 3);

        let notifications = notifier.notifications();
        assert_eq!(notifications.len(), 1);
        assert_eq!(notifications[0].level, NotificationLevel::Error);
        assert!(!notifications[0].persistent);
    }

    #[tokio::test]
    async fn test_change_rating_rejects_out_of_range() {
        let (backend, _notifier, m) = setup(vec![record(1, ListId::Watched)]).await;
        assert_eq!(m.change_rating(1, 6).await, MutationOutcome::Skipped);
        assert_eq!(backend.calls(), vec!["fetch_records"]);
    }

    #[tokio::test]
    async fn test_save_options_restores_pre_flip_value() {
        let mut r = record(1, ListId::Watched);
        r.options.theatre = true;
        let (backend, _notifier, m) = setup(vec![r]).await;
        backend.set_failing(true);

        // caller flips to false first
        m.store()
            .with_record_mut(1, |r| r.options.set(RecordOption::Theatre, false))
            .await
            .unwrap();
        let outcome = m.save_options(1, RecordOption::Theatre).await;
        assert!(outcome.error().is_some());
        assert!(m.store().get(1).await.unwrap().options.theatre);
    }

    #[tokio::test]
    async fn test_toggle_option() {
        let (backend, _notifier, m) = setup(vec![record(1, ListId::Watched)]).await;

        assert!(m.toggle_option(1, RecordOption::UltraHd).await.is_committed());
        assert!(m.store().get(1).await.unwrap().options.ultra_hd);

        backend.set_failing(true);
        let outcome = m.toggle_option(1, RecordOption::UltraHd).await;
        assert!(matches!(outcome, MutationOutcome::RolledBack(_)));
        assert!(m.store().get(1).await.unwrap().options.ultra_hd);
    }

    #[tokio::test]
    async fn test_comment_failure_keeps_text() {
        let (backend, notifier, m) = setup(vec![record(1, ListId::Watched)]).await;
        assert!(m.set_comment(1, "great score").await);
        backend.set_failing(true);

        let outcome = m.spawn_save_comment(1).await.unwrap();
        assert!(matches!(outcome, MutationOutcome::Failed(_)));

        let r = m.store().get(1).await.unwrap();
        assert_eq!(r.comment, "great score");
        assert!(r.comment_area);
        assert_eq!(notifier.notifications().len(), 1);
    }

    #[tokio::test]
    async fn test_empty_comment_closes_editor() {
        let (backend, _notifier, m) = setup(vec![record(1, ListId::Watched)]).await;
        m.set_comment(1, "draft").await;
        assert!(m.save_comment(1).await.is_committed());
        assert!(m.store().get(1).await.unwrap().comment_area);

        m.set_comment(1, "").await;
        assert!(m.save_comment(1).await.is_committed());
        assert!(!m.store().get(1).await.unwrap().comment_area);
        assert_eq!(backend.calls().last().unwrap(), "save_comment:1:");
    }

    #[tokio::test]
    async fn test_blank_comment_keeps_editor_open() {
        let (_backend, _notifier, m) = setup(vec![record(1, ListId::Watched)]).await;
        m.set_comment(1, "   ").await;
        assert!(m.save_comment(1).await.is_committed());
        assert!(m.store().get(1).await.unwrap().comment_area);
    }

    #[tokio::test]
    async fn test_remove_record_failure_reinserts_at_index() {
        let records: Vec<Record> = (1..=4).map(|id| record(id, ListId::Watched)).collect();
        let (backend, notifier, m) = setup(records).await;
        backend.set_failing(true);

        let outcome = m.remove_record(2).await;
        assert!(matches!(outcome, MutationOutcome::RolledBack(_)));
        assert_eq!(ids(&m.store().snapshot().await.records), vec![1, 2, 3, 4]);
        assert_eq!(notifier.notifications()[0].level, NotificationLevel::Error);
    }

    #[tokio::test]
    async fn test_remove_rollback_stays_out_of_other_profile() {
        let (backend, notifier, m) = setup(vec![record(1, ListId::Watched)]).await;
        backend
            .user_records
            .lock()
            .unwrap()
            .insert("bob".to_string(), vec![record(50, ListId::Watched)]);
        slow_failing_writes(&backend);

        let (outcome, switched) = tokio::join!(m.remove_record(1), switch_to_bob_after(&m, 10));

        assert!(matches!(outcome, MutationOutcome::RolledBack(_)));
        assert_eq!(switched, LoadOutcome::Loaded(1));
        let snapshot = m.store().snapshot().await;
        assert_eq!(snapshot.context, Some(ListContext::Profile("bob".to_string())));
        assert_eq!(ids(&snapshot.records), vec![50]);
        assert_eq!(notifier.notifications()[0].level, NotificationLevel::Error);
    }

    #[tokio::test]
    async fn test_rating_rollback_leaves_other_profile_alone() {
        let (backend, _notifier, m) = setup(vec![record(1, ListId::Watched)]).await;
        let mut theirs = record(1, ListId::Watched);
        theirs.rating = 2;
        backend.user_records.lock().unwrap().insert("bob".to_string(), vec![theirs]);
        slow_failing_writes(&backend);

        let (outcome, _) = tokio::join!(m.change_rating(1, 5), switch_to_bob_after(&m, 10));

        assert!(matches!(outcome, MutationOutcome::RolledBack(_)));
        assert_eq!(m.store().get(1).await.unwrap().rating, 2);
    }

    #[tokio::test]
    async fn test_order_rollback_leaves_other_profile_alone() {
        let records: Vec<Record> = (1..=3).map(|id| record(id, ListId::ToWatch)).collect();
        let (backend, _notifier, m) = setup(records).await;
        let mut theirs = record(2, ListId::ToWatch);
        theirs.order = 7;
        backend.user_records.lock().unwrap().insert("bob".to_string(), vec![theirs]);
        slow_failing_writes(&backend);

        let (outcome, _) = tokio::join!(m.move_to_top(3), switch_to_bob_after(&m, 10));

        assert!(matches!(outcome, MutationOutcome::RolledBack(_)));
        assert_eq!(m.store().get(2).await.unwrap().order, 7);
    }

    #[tokio::test]
    async fn test_remove_record_success_notifies() {
        let records: Vec<Record> = (1..=3).map(|id| record(id, ListId::Watched)).collect();
        let (_backend, notifier, m) = setup(records).await;

        assert!(m.remove_record(2).await.is_committed());
        assert_eq!(ids(&m.store().snapshot().await.records), vec![1, 3]);
        assert_eq!(notifier.notifications()[0].level, NotificationLevel::Success);
    }

    #[tokio::test]
    async fn test_missing_record_is_skipped() {
        let (backend, _notifier, m) = setup(vec![]).await;
        assert_eq!(m.remove_record(42).await, MutationOutcome::Skipped);
        assert_eq!(backend.calls(), vec!["fetch_records"]);
    }

    #[tokio::test]
    async fn test_add_to_list_moves_record() {
        let mut r = record(1, ListId::ToWatch);
        r.addition_date = 10;
        let (backend, _notifier, m) = setup(vec![r]).await;

        assert!(m.add_to_list(100, ListId::Watched, Some(1)).await.is_committed());
        let r = m.store().get(1).await.unwrap();
        assert_eq!(r.list_id, ListId::Watched);
        assert!(r.addition_date > 10);
        assert_eq!(backend.calls().last().unwrap(), "add_to_list:100:1");
    }

    #[tokio::test]
    async fn test_add_to_list_failure_leaves_record() {
        let (backend, _notifier, m) = setup(vec![record(1, ListId::ToWatch)]).await;
        backend.set_failing(true);

        assert!(matches!(
            m.add_to_list(100, ListId::Watched, Some(1)).await,
            MutationOutcome::Failed(_)
        ));
        assert_eq!(m.store().get(1).await.unwrap().list_id, ListId::ToWatch);
    }

    #[tokio::test]
    async fn test_add_from_search_reloads_store() {
        let (backend, notifier, m) = setup(vec![record(1, ListId::Watched)]).await;
        backend.records.lock().unwrap().push(record(2, ListId::ToWatch));
        let hit = SearchResult {
            id: 603,
            title: "The Matrix".to_string(),
            title_original: "The Matrix".to_string(),
            release_date: Some("1999-03-31".to_string()),
            poster: None,
            overview: String::new(),
        };

        assert!(m.add_from_search(&hit, ListId::ToWatch).await.is_committed());
        assert!(backend.calls().contains(&"add_to_list_from_db:603:2".to_string()));
        // provisional record replaced by the server's version
        let snapshot = m.store().snapshot().await;
        assert_eq!(ids(&snapshot.records), vec![1, 2]);
        assert!(notifier.notifications()[0].message.contains("The Matrix"));
    }

    #[tokio::test]
    async fn test_add_from_search_refetches_despite_running_load() {
        let (backend, _notifier, m) = setup(vec![record(1, ListId::Watched)]).await;
        *backend.fetch_delay.lock().unwrap() = Duration::from_millis(50);
        let hit = SearchResult {
            id: 603,
            title: "The Matrix".to_string(),
            ..SearchResult::default()
        };

        let loading = m.store().reload(ListContext::Own);
        let adding = async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            backend.records.lock().unwrap().push(record(2, ListId::ToWatch));
            m.add_from_search(&hit, ListId::ToWatch).await
        };
        let (loaded, outcome) = tokio::join!(loading, adding);

        assert!(outcome.is_committed());
        assert_eq!(loaded.unwrap(), LoadOutcome::Loaded(1));
        assert_eq!(backend.fetch_count.load(Ordering::SeqCst), 3);
        assert_eq!(ids(&m.store().snapshot().await.records), vec![1, 2]);
    }

    #[tokio::test]
    async fn test_add_from_db_not_found() {
        let (backend, notifier, m) = setup(vec![]).await;
        *backend.add_from_db_status.lock().unwrap() = Some(AddFromDbStatus::NotFound);

        let outcome = m.add_from_db(1, ListId::Watched, None).await;
        assert!(matches!(outcome, MutationOutcome::Failed(ApiError::Validation { status: 404, .. })));
        assert_eq!(notifier.notifications()[0].level, NotificationLevel::Warning);
        assert!(m.store().is_empty().await);
    }

    #[tokio::test]
    async fn test_provisional_record_visible_before_reload() {
        let (backend, _notifier, m) = setup(vec![]).await;
        *backend.fetch_delay.lock().unwrap() = Duration::from_millis(50);
        let hit = SearchResult {
            id: 7,
            title: "Se7en".to_string(),
            ..SearchResult::default()
        };

        let adding = m.add_from_search(&hit, ListId::ToWatch);
        let peek = async {
            tokio::time::sleep(Duration::from_millis(20)).await;
            m.store().snapshot().await
        };
        let (outcome, during) = tokio::join!(adding, peek);

        assert!(outcome.is_committed());
        assert_eq!(during.records.len(), 1);
        assert!(during.records[0].id < 0);
        assert_eq!(during.records[0].movie.title, "Se7en");
        assert!(m.store().is_empty().await);
    }

    #[tokio::test]
    async fn test_move_to_top_persists_full_order() {
        let records: Vec<Record> = (1..=3).map(|id| record(id, ListId::ToWatch)).collect();
        let (backend, _notifier, m) = setup(records).await;

        assert!(m.move_to_top(3).await.is_committed());
        let saved = backend.saved_orders.lock().unwrap().last().cloned().unwrap();
        assert_eq!(saved.iter().map(|o| (o.id, o.order)).collect::<Vec<_>>(), vec![(3, 0), (1, 1), (2, 2)]);
    }

    #[tokio::test]
    async fn test_move_to_bottom_rolls_back_order() {
        let records: Vec<Record> = (1..=3).map(|id| record(id, ListId::ToWatch)).collect();
        let (backend, _notifier, m) = setup(records).await;
        backend.set_failing(true);

        let outcome = m.move_to_bottom(1).await;
        assert!(matches!(outcome, MutationOutcome::RolledBack(_)));
        let orders: Vec<i64> = m.store().snapshot().await.records.iter().map(|r| r.order).collect();
        assert_eq!(orders, vec![1, 2, 3]);
    }
}
