use futures::future::{BoxFuture, FutureExt, Shared};
use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, trace};

type SharedRequest<T, E> = Shared<BoxFuture<'static, Result<T, E>>>;

struct InFlight<T, E> {
    generation: u64,
    request: SharedRequest<T, E>,
}

/// At most one in-flight request per key.
///
/// Concurrent callers using the same key share a single invocation of the
/// producer and all receive a clone of its result, errors included. The key
/// is evicted as soon as the request settles, so the next call starts a
/// fresh request.
pub struct RequestDeduplicator<T, E> {
    pending: Arc<Mutex<HashMap<String, InFlight<T, E>>>>,
    next_generation: Arc<AtomicU64>,
}

impl<T, E> Clone for RequestDeduplicator<T, E> {
    fn clone(&self) -> Self {
        Self {
            pending: Arc::clone(&self.pending),
            next_generation: Arc::clone(&self.next_generation),
        }
    }
}

impl<T, E> Default for RequestDeduplicator<T, E>
where
    T: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T, E> RequestDeduplicator<T, E>
where
    T: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self {
            pending: Arc::new(Mutex::new(HashMap::new())),
            next_generation: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Run `producer` unless a request for `key` is already pending, in which
    /// case wait for that one instead. `producer` is only called when a new
    /// request is started.
    pub async fn run<F, Fut>(&self, key: &str, producer: F) -> Result<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        self.run_inner(key, producer, true).await
    }

    /// Always start a new request for `key`. Callers already waiting on an
    /// older request keep waiting on it; later [`run`](Self::run) calls join
    /// this one.
    pub async fn run_fresh<F, Fut>(&self, key: &str, producer: F) -> Result<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        self.run_inner(key, producer, false).await
    }

    async fn run_inner<F, Fut>(&self, key: &str, producer: F, join: bool) -> Result<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        let (generation, request) = {
            let mut pending = self.pending.lock().await;
            match pending.get(key).filter(|_| join) {
                Some(in_flight) => {
                    debug!(key, "Joining in-flight request");
                    (in_flight.generation, in_flight.request.clone())
                }
                None => {
                    let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
                    let request = producer().boxed().shared();
                    pending.insert(
                        key.to_string(),
                        InFlight {
                            generation,
                            request: request.clone(),
                        },
                    );
                    trace!(key, generation, "Started request");
                    (generation, request)
                }
            }
        };

        let result = request.await;

        // A newer request may already have taken the key; only evict our own.
        let mut pending = self.pending.lock().await;
        if pending
            .get(key)
            .is_some_and(|in_flight| in_flight.generation == generation)
        {
            pending.remove(key);
            trace!(key, generation, "Evicted settled request");
        }

        result
    }

    pub async fn is_pending(&self, key: &str) -> bool {
        self.pending.lock().await.contains_key(key)
    }

    /// Keys with a request currently in flight.
    pub async fn in_flight(&self) -> Vec<String> {
        let pending = self.pending.lock().await;
        let mut keys: Vec<String> = pending.keys().cloned().collect();
        keys.sort();
        keys
    }
}
