//! In-memory backend and notifier used by the core tests.

use async_trait::async_trait;
use movielist_api::{AddFromDbStatus, ApiError, RecordOrder, RecordsBackend};
use movielist_models::{ListId, Movie, Record, RecordOptions};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use crate::notify::{Notification, Notifier};

pub(crate) fn movie(id: i64, title: &str) -> Movie {
    Movie {
        id,
        title: title.to_string(),
        ..Movie::default()
    }
}

pub(crate) fn record(id: i64, list_id: ListId) -> Record {
    Record {
        id,
        list_id,
        order: id,
        rating: 0,
        rating_original: 0,
        comment: String::new(),
        comment_area: false,
        options: RecordOptions::default(),
        addition_date: 1_600_000_000 + id,
        provider_records: Vec::new(),
        movie: movie(id * 100, &format!("Movie {}", id)),
    }
}

#[derive(Default)]
pub(crate) struct FakeBackend {
    pub records: Mutex<Vec<Record>>,
    pub user_records: Mutex<HashMap<String, Vec<Record>>>,
    pub fail: AtomicBool,
    /// Fail only the write calls, fetches keep working
    pub fail_writes: AtomicBool,
    pub fetch_delay: Mutex<Duration>,
    pub write_delay: Mutex<Duration>,
    pub user_fetch_delay: Mutex<Duration>,
    pub fetch_count: AtomicUsize,
    pub calls: Mutex<Vec<String>>,
    pub saved_orders: Mutex<Vec<Vec<RecordOrder>>>,
    pub add_from_db_status: Mutex<Option<AddFromDbStatus>>,
}

impl FakeBackend {
    pub fn with_records(records: Vec<Record>) -> Self {
        let backend = Self::default();
        *backend.records.lock().unwrap() = records;
        backend
    }

    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record_call(&self, call: String) -> Result<(), ApiError> {
        self.calls.lock().unwrap().push(call);
        if self.fail.load(Ordering::SeqCst) {
            return Err(simulated_failure());
        }
        Ok(())
    }

    async fn write_call(&self, call: String) -> Result<(), ApiError> {
        let delay = *self.write_delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        self.record_call(call)?;
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(simulated_failure());
        }
        Ok(())
    }
}

fn simulated_failure() -> ApiError {
    ApiError::Server {
        status: 500,
        message: "simulated failure".to_string(),
    }
}

#[async_trait]
impl RecordsBackend for FakeBackend {
    async fn fetch_records(&self) -> Result<Vec<Record>, ApiError> {
        self.fetch_count.fetch_add(1, Ordering::SeqCst);
        // the server answers with its state at request time
        let records = self.records.lock().unwrap().clone();
        let delay = *self.fetch_delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        self.record_call("fetch_records".to_string())?;
        Ok(records)
    }

    async fn fetch_user_records(&self, username: &str) -> Result<Vec<Record>, ApiError> {
        self.fetch_count.fetch_add(1, Ordering::SeqCst);
        let delay = *self.user_fetch_delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        self.record_call(format!("fetch_user_records:{}", username))?;
        Ok(self
            .user_records
            .lock()
            .unwrap()
            .get(username)
            .cloned()
            .unwrap_or_default())
    }

    async fn add_to_list(&self, movie_id: i64, list_id: ListId) -> Result<(), ApiError> {
        self.write_call(format!("add_to_list:{}:{}", movie_id, list_id.as_u8())).await
    }

    async fn add_to_list_from_db(&self, movie_id: i64, list_id: ListId) -> Result<AddFromDbStatus, ApiError> {
        self.write_call(format!("add_to_list_from_db:{}:{}", movie_id, list_id.as_u8()))
            .await?;
        Ok(self.add_from_db_status.lock().unwrap().unwrap_or(AddFromDbStatus::Added))
    }

    async fn remove_record(&self, record_id: i64) -> Result<(), ApiError> {
        self.write_call(format!("remove_record:{}", record_id)).await
    }

    async fn change_rating(&self, record_id: i64, rating: u8) -> Result<(), ApiError> {
        self.write_call(format!("change_rating:{}:{}", record_id, rating)).await
    }

    async fn save_options(&self, record_id: i64, _options: &RecordOptions) -> Result<(), ApiError> {
        self.write_call(format!("save_options:{}", record_id)).await
    }

    async fn save_comment(&self, record_id: i64, comment: &str) -> Result<(), ApiError> {
        self.write_call(format!("save_comment:{}:{}", record_id, comment)).await
    }

    async fn save_records_order(&self, records: &[RecordOrder]) -> Result<(), ApiError> {
        self.saved_orders.lock().unwrap().push(records.to_vec());
        self.write_call("save_records_order".to_string()).await
    }
}

#[derive(Default)]
pub(crate) struct RecordingNotifier {
    notifications: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn notifications(&self) -> Vec<Notification> {
        self.notifications.lock().unwrap().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notification: Notification) {
        self.notifications.lock().unwrap().push(notification);
    }
}
