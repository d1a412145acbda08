use movielist_api::{ApiError, RecordOrder, RecordsBackend, RequestDeduplicator};
use movielist_models::{ListId, Record};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// Whose records the store currently holds.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ListContext {
    /// The logged-in user
    Own,
    /// Another user's public profile
    Profile(String),
}

impl ListContext {
    /// Key under which concurrent loads of this context are merged.
    pub fn dedup_key(&self) -> String {
        match self {
            ListContext::Own => "records:own".to_string(),
            ListContext::Profile(username) => format!("records:user:{}", username),
        }
    }
}

impl fmt::Display for ListContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ListContext::Own => f.write_str("own records"),
            ListContext::Profile(username) => write!(f, "records of {}", username),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    Loaded(usize),
    /// The context was already loaded, nothing was fetched
    AlreadyLoaded(usize),
    /// The store switched to another context, or a newer fetch replaced the
    /// records, while the fetch was running; the response was discarded
    Superseded,
}

/// One uninterrupted stretch of a single record collection. Every time the
/// collection is replaced (context switch or applied fetch) a new epoch
/// starts, and rollbacks captured in an older epoch are dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Epoch(u64);

/// Point-in-time copy of the store contents.
#[derive(Debug, Clone, Default)]
pub struct StoreSnapshot {
    pub context: Option<ListContext>,
    pub records: Vec<Record>,
    /// Bumped on every write, used to invalidate derived views
    pub revision: u64,
}

/// Custom order of one list before and after a move.
#[derive(Debug, Clone)]
pub(crate) struct Reorder {
    pub epoch: Epoch,
    pub orders: Vec<RecordOrder>,
    pub previous: Vec<RecordOrder>,
}

#[derive(Debug, Default)]
struct StoreState {
    context: Option<ListContext>,
    records: Vec<Record>,
    loaded: bool,
    revision: u64,
    epoch: u64,
    /// Ticket of the fetch whose records are currently held
    applied_fetch: u64,
    next_provisional_id: i64,
}

impl StoreState {
    fn touch(&mut self) {
        self.revision += 1;
    }

    fn epoch(&self) -> Epoch {
        Epoch(self.epoch)
    }

    fn is_current(&self, epoch: Epoch) -> bool {
        if epoch.0 == self.epoch {
            return true;
        }
        debug!(
            captured = epoch.0,
            current = self.epoch,
            "Records were replaced since the edit, skipping rollback"
        );
        false
    }

    fn position(&self, record_id: i64) -> Option<usize> {
        self.records.iter().position(|r| r.id == record_id)
    }
}

/// The single shared collection of records. Cheap to clone; all clones see
/// the same records.
#[derive(Clone)]
pub struct RecordStore {
    backend: Arc<dyn RecordsBackend>,
    state: Arc<RwLock<StoreState>>,
    requests: RequestDeduplicator<(u64, Vec<Record>), ApiError>,
    fetch_tickets: Arc<AtomicU64>,
}

impl RecordStore {
    pub fn new(backend: Arc<dyn RecordsBackend>) -> Self {
        Self {
            backend,
            state: Arc::new(RwLock::new(StoreState::default())),
            requests: RequestDeduplicator::new(),
            fetch_tickets: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn backend(&self) -> Arc<dyn RecordsBackend> {
        Arc::clone(&self.backend)
    }

    /// Load records for `context` unless they are already present.
    pub async fn load(&self, context: ListContext) -> Result<LoadOutcome, ApiError> {
        {
            let state = self.state.read().await;
            if state.loaded && state.context.as_ref() == Some(&context) {
                debug!("Records for {} already loaded", context);
                return Ok(LoadOutcome::AlreadyLoaded(state.records.len()));
            }
        }
        self.reload(context).await
    }

    /// Fetch records for `context` and replace the local collection. Joins a
    /// fetch of the same context that is already running.
    pub async fn reload(&self, context: ListContext) -> Result<LoadOutcome, ApiError> {
        self.fetch(context, true).await
    }

    /// Like [`reload`](Self::reload), but always starts a new fetch so that
    /// changes made since a running fetch began are picked up.
    pub async fn refresh(&self, context: ListContext) -> Result<LoadOutcome, ApiError> {
        self.fetch(context, false).await
    }

    async fn fetch(&self, context: ListContext, join: bool) -> Result<LoadOutcome, ApiError> {
        let switched = {
            let mut state = self.state.write().await;
            let switched = state.context.as_ref() != Some(&context);
            if switched {
                info!("Switching to {}", context);
                state.context = Some(context.clone());
                state.records.clear();
                state.loaded = false;
                state.epoch += 1;
                state.touch();
            }
            switched
        };

        let backend = Arc::clone(&self.backend);
        let tickets = Arc::clone(&self.fetch_tickets);
        let fetch_context = context.clone();
        let producer = move || {
            let ticket = tickets.fetch_add(1, Ordering::Relaxed) + 1;
            async move {
                let records = match fetch_context {
                    ListContext::Own => backend.fetch_records().await?,
                    ListContext::Profile(username) => backend.fetch_user_records(&username).await?,
                };
                Ok::<_, ApiError>((ticket, records))
            }
        };

        // A fetch started before a switch may belong to an abandoned visit.
        let key = context.dedup_key();
        let (ticket, records) = if join && !switched {
            self.requests.run(&key, producer).await?
        } else {
            self.requests.run_fresh(&key, producer).await?
        };

        let mut state = self.state.write().await;
        if state.context.as_ref() != Some(&context) {
            warn!(
                "Discarding {} records for {}, the list has switched since",
                records.len(),
                context
            );
            return Ok(LoadOutcome::Superseded);
        }
        if ticket < state.applied_fetch {
            debug!(ticket, applied = state.applied_fetch, "Discarding records from an older fetch");
            return Ok(LoadOutcome::Superseded);
        }
        if ticket == state.applied_fetch {
            // another waiter on the same fetch already applied it
            return Ok(LoadOutcome::Loaded(state.records.len()));
        }

        let count = records.len();
        state.records = records;
        state.loaded = true;
        state.applied_fetch = ticket;
        state.epoch += 1;
        state.touch();
        info!("Loaded {} records for {}", count, context);
        Ok(LoadOutcome::Loaded(count))
    }

    pub async fn context(&self) -> Option<ListContext> {
        self.state.read().await.context.clone()
    }

    pub async fn snapshot(&self) -> StoreSnapshot {
        let state = self.state.read().await;
        StoreSnapshot {
            context: state.context.clone(),
            records: state.records.clone(),
            revision: state.revision,
        }
    }

    pub async fn records_for(&self, list: ListId) -> Vec<Record> {
        let state = self.state.read().await;
        state.records.iter().filter(|r| r.list_id == list).cloned().collect()
    }

    pub async fn get(&self, record_id: i64) -> Option<Record> {
        let state = self.state.read().await;
        state.records.iter().find(|r| r.id == record_id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.state.read().await.records.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.state.read().await.records.is_empty()
    }

    pub async fn revision(&self) -> u64 {
        self.state.read().await.revision
    }

    /// Apply `f` to the record in place. `None` when the record is gone.
    pub(crate) async fn with_record_mut<R>(&self, record_id: i64, f: impl FnOnce(&mut Record) -> R) -> Option<R> {
        self.edit(record_id, f).await.map(|(_, result)| result)
    }

    /// Like [`with_record_mut`](Self::with_record_mut), also returning the
    /// epoch the edit was made in.
    pub(crate) async fn edit<R>(&self, record_id: i64, f: impl FnOnce(&mut Record) -> R) -> Option<(Epoch, R)> {
        let mut state = self.state.write().await;
        let index = state.position(record_id)?;
        let result = f(&mut state.records[index]);
        state.touch();
        Some((state.epoch(), result))
    }

    /// Apply `f` only if the collection is still the one from `epoch`.
    pub(crate) async fn edit_in<R>(
        &self,
        epoch: Epoch,
        record_id: i64,
        f: impl FnOnce(&mut Record) -> R,
    ) -> Option<R> {
        let mut state = self.state.write().await;
        if !state.is_current(epoch) {
            return None;
        }
        let index = state.position(record_id)?;
        let result = f(&mut state.records[index]);
        state.touch();
        Some(result)
    }

    pub(crate) async fn lookup(&self, record_id: i64) -> Option<(Epoch, Record)> {
        let state = self.state.read().await;
        let record = state.records.iter().find(|r| r.id == record_id)?.clone();
        Some((state.epoch(), record))
    }

    /// Remove a record, returning it with the index it occupied.
    pub(crate) async fn remove(&self, record_id: i64) -> Option<(Epoch, usize, Record)> {
        let mut state = self.state.write().await;
        let index = state.position(record_id)?;
        let record = state.records.remove(index);
        state.touch();
        Some((state.epoch(), index, record))
    }

    /// Put a removed record back at `index`, or append when the collection
    /// has shrunk below it. Refused when the collection was replaced since
    /// `epoch` or already holds the record again.
    pub(crate) async fn insert_at(&self, epoch: Epoch, index: usize, record: Record) -> bool {
        let mut state = self.state.write().await;
        if !state.is_current(epoch) || state.position(record.id).is_some() {
            return false;
        }
        let index = index.min(state.records.len());
        state.records.insert(index, record);
        state.touch();
        true
    }

    /// Append `record` if the store still shows `context`.
    pub(crate) async fn push_to(&self, context: &ListContext, record: Record) -> bool {
        let mut state = self.state.write().await;
        if state.context.as_ref() != Some(context) {
            return false;
        }
        state.records.push(record);
        state.touch();
        true
    }

    /// Negative id for a record the server has not assigned one to yet.
    pub(crate) async fn next_provisional_id(&self) -> i64 {
        let mut state = self.state.write().await;
        state.next_provisional_id -= 1;
        state.next_provisional_id
    }

    /// Move a record to the front or back of its list's custom order and
    /// renumber the whole list so that `order` equals the position.
    pub(crate) async fn reorder(&self, record_id: i64, to_front: bool) -> Option<Reorder> {
        let mut state = self.state.write().await;
        let list = state.records.iter().find(|r| r.id == record_id)?.list_id;

        let mut ordered: Vec<(i64, i64)> = state
            .records
            .iter()
            .filter(|r| r.list_id == list)
            .map(|r| (r.id, r.order))
            .collect();
        ordered.sort_by_key(|&(_, order)| order);

        let previous = ordered
            .iter()
            .map(|&(id, order)| RecordOrder { id, order })
            .collect();

        let from = ordered.iter().position(|&(id, _)| id == record_id)?;
        let moved = ordered.remove(from);
        if to_front {
            ordered.insert(0, moved);
        } else {
            ordered.push(moved);
        }

        let orders: Vec<RecordOrder> = ordered
            .iter()
            .enumerate()
            .map(|(position, &(id, _))| RecordOrder {
                id,
                order: position as i64,
            })
            .collect();

        apply_orders(&mut state.records, &orders);
        state.touch();
        Some(Reorder {
            epoch: state.epoch(),
            orders,
            previous,
        })
    }

    pub(crate) async fn restore_orders(&self, epoch: Epoch, orders: &[RecordOrder]) -> bool {
        let mut state = self.state.write().await;
        if !state.is_current(epoch) {
            return false;
        }
        apply_orders(&mut state.records, orders);
        state.touch();
        true
    }
}

fn apply_orders(records: &mut [Record], orders: &[RecordOrder]) {
    for record in records.iter_mut() {
        if let Some(entry) = orders.iter().find(|o| o.id == record.id) {
            record.order = entry.order;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{record, FakeBackend};
    use std::time::Duration;

    fn store_with(records: Vec<Record>) -> (Arc<FakeBackend>, RecordStore) {
        let backend = Arc::new(FakeBackend::with_records(records));
        let store = RecordStore::new(backend.clone());
        (backend, store)
    }

    #[test]
    fn test_dedup_keys_include_username() {
        assert_eq!(ListContext::Own.dedup_key(), "records:own");
        assert_eq!(
            ListContext::Profile("alice".to_string()).dedup_key(),
            "records:user:alice"
        );
    }

    #[tokio::test]
    async fn test_load_fetches_once() {
        let (backend, store) = store_with(vec![record(1, ListId::Watched), record(2, ListId::ToWatch)]);

        assert_eq!(store.load(ListContext::Own).await.unwrap(), LoadOutcome::Loaded(2));
        assert_eq!(store.load(ListContext::Own).await.unwrap(), LoadOutcome::AlreadyLoaded(2));
        assert_eq!(backend.fetch_count.load(Ordering::SeqCst), 1);

        assert_eq!(store.records_for(ListId::Watched).await.len(), 1);
        assert_eq!(store.get(2).await.map(|r| r.list_id), Some(ListId::ToWatch));
    }

    #[tokio::test]
    async fn test_concurrent_loads_share_one_fetch() {
        let (backend, store) = store_with(vec![record(1, ListId::Watched)]);
        *backend.fetch_delay.lock().unwrap() = Duration::from_millis(30);

        let (a, b) = tokio::join!(store.reload(ListContext::Own), store.reload(ListContext::Own));
        assert_eq!(a.unwrap(), LoadOutcome::Loaded(1));
        assert_eq!(b.unwrap(), LoadOutcome::Loaded(1));
        assert_eq!(backend.fetch_count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_late_response_for_abandoned_context_is_discarded() {
        let (backend, store) = store_with(vec![record(1, ListId::Watched)]);
        backend
            .user_records
            .lock()
            .unwrap()
            .insert("alice".to_string(), vec![record(7, ListId::Watched), record(8, ListId::Watched)]);
        *backend.user_fetch_delay.lock().unwrap() = Duration::from_millis(50);

        let profile = store.reload(ListContext::Profile("alice".to_string()));
        let own = async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            store.reload(ListContext::Own).await
        };
        let (profile, own) = tokio::join!(profile, own);

        assert_eq!(profile.unwrap(), LoadOutcome::Superseded);
        assert_eq!(own.unwrap(), LoadOutcome::Loaded(1));

        let snapshot = store.snapshot().await;
        assert_eq!(snapshot.context, Some(ListContext::Own));
        assert_eq!(snapshot.records.iter().map(|r| r.id).collect::<Vec<_>>(), vec![1]);
    }

    #[tokio::test]
    async fn test_switching_context_clears_records() {
        let (backend, store) = store_with(vec![record(1, ListId::Watched)]);
        store.load(ListContext::Own).await.unwrap();
        backend.set_failing(true);

        assert!(store.load(ListContext::Profile("bob".to_string())).await.is_err());
        assert!(store.is_empty().await);
        assert_eq!(store.context().await, Some(ListContext::Profile("bob".to_string())));
    }

    #[tokio::test]
    async fn test_failed_load_can_be_retried() {
        let (backend, store) = store_with(vec![record(1, ListId::Watched)]);
        backend.set_failing(true);
        assert!(store.load(ListContext::Own).await.is_err());

        backend.set_failing(false);
        assert_eq!(store.load(ListContext::Own).await.unwrap(), LoadOutcome::Loaded(1));
    }

    #[tokio::test]
    async fn test_reorder_renumbers_whole_list() {
        let mut records = vec![
            record(1, ListId::ToWatch),
            record(2, ListId::ToWatch),
            record(3, ListId::ToWatch),
            record(4, ListId::Watched),
        ];
        records[0].order = 10;
        records[1].order = 20;
        records[2].order = 30;
        let (_backend, store) = store_with(records);
        store.load(ListContext::Own).await.unwrap();

        let reorder = store.reorder(3, true).await.unwrap();
        let ids: Vec<i64> = reorder.orders.iter().map(|o| o.id).collect();
        let orders: Vec<i64> = reorder.orders.iter().map(|o| o.order).collect();
        assert_eq!(ids, vec![3, 1, 2]);
        assert_eq!(orders, vec![0, 1, 2]);
        assert_eq!(reorder.previous.iter().map(|o| o.order).collect::<Vec<_>>(), vec![10, 20, 30]);
        assert_eq!(store.get(3).await.unwrap().order, 0);
        assert_eq!(store.get(4).await.unwrap().order, 4);

        assert!(store.restore_orders(reorder.epoch, &reorder.previous).await);
        assert_eq!(store.get(3).await.unwrap().order, 30);
        assert_eq!(store.get(1).await.unwrap().order, 10);
    }

    #[tokio::test]
    async fn test_writes_bump_revision() {
        let (_backend, store) = store_with(vec![record(1, ListId::Watched)]);
        store.load(ListContext::Own).await.unwrap();
        let before = store.revision().await;

        store.with_record_mut(1, |r| r.rating = 3).await.unwrap();
        assert!(store.revision().await > before);
        assert!(store.with_record_mut(99, |r| r.rating = 3).await.is_none());
    }

    fn ids(snapshot: &StoreSnapshot) -> Vec<i64> {
        snapshot.records.iter().map(|r| r.id).collect()
    }

    #[tokio::test]
    async fn test_insert_at_clamps_index() {
        let records = (1..=3).map(|id| record(id, ListId::Watched)).collect();
        let (_backend, store) = store_with(records);
        store.load(ListContext::Own).await.unwrap();

        let (epoch, index, third) = store.remove(3).await.unwrap();
        assert_eq!(index, 2);
        store.remove(2).await.unwrap();
        assert!(store.insert_at(epoch, index, third).await);
        assert_eq!(ids(&store.snapshot().await), vec![1, 3]);
    }

    #[tokio::test]
    async fn test_insert_at_refuses_duplicates() {
        let (_backend, store) = store_with(vec![record(1, ListId::Watched)]);
        store.load(ListContext::Own).await.unwrap();

        let (epoch, index, removed) = store.remove(1).await.unwrap();
        assert!(store.insert_at(epoch, index, removed.clone()).await);
        assert!(!store.insert_at(epoch, index, removed).await);
        assert_eq!(ids(&store.snapshot().await), vec![1]);
    }

    #[tokio::test]
    async fn test_rollbacks_dropped_after_context_switch() {
        let (backend, store) = store_with(vec![record(1, ListId::Watched), record(2, ListId::ToWatch)]);
        backend
            .user_records
            .lock()
            .unwrap()
            .insert("bob".to_string(), vec![record(50, ListId::Watched)]);
        store.load(ListContext::Own).await.unwrap();

        let (epoch, index, removed) = store.remove(1).await.unwrap();
        let reorder = store.reorder(2, false).await.unwrap();
        store.load(ListContext::Profile("bob".to_string())).await.unwrap();

        assert!(!store.insert_at(epoch, index, removed).await);
        assert!(!store.restore_orders(reorder.epoch, &reorder.previous).await);
        assert!(store.edit_in(epoch, 50, |r| r.rating = 5).await.is_none());
        assert_eq!(ids(&store.snapshot().await), vec![50]);
        assert_eq!(store.get(50).await.unwrap().rating, 0);
    }

    #[tokio::test]
    async fn test_refresh_does_not_join_running_fetch() {
        let (backend, store) = store_with(vec![record(1, ListId::Watched)]);
        *backend.fetch_delay.lock().unwrap() = Duration::from_millis(50);

        let slow = store.reload(ListContext::Own);
        let fresh = async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            *backend.fetch_delay.lock().unwrap() = Duration::ZERO;
            backend.records.lock().unwrap().push(record(2, ListId::ToWatch));
            store.refresh(ListContext::Own).await
        };
        let (slow, fresh) = tokio::join!(slow, fresh);

        assert_eq!(fresh.unwrap(), LoadOutcome::Loaded(2));
        // the older response arrives last and must not win
        assert_eq!(slow.unwrap(), LoadOutcome::Superseded);
        assert_eq!(backend.fetch_count.load(Ordering::SeqCst), 2);
        assert_eq!(ids(&store.snapshot().await), vec![1, 2]);
    }
}
