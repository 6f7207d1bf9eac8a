use std::any::Any;
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio_util::sync::CancellationToken;

use dashboard_http_error::ApiError;

use crate::{Query, QueryKey, QueryOptions};

pub(crate) type AnyData = Arc<dyn Any + Send + Sync>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QueryStatus {
    /// Never fetched.
    Idle,
    Loading,
    Success,
    Error,
}

/// Snapshot of one cache entry.
#[derive(Debug)]
pub struct QueryState<T> {
    pub status: QueryStatus,
    /// The last successfully fetched data, kept across errors and refetches.
    pub data: Option<Arc<T>>,
    pub error: Option<ApiError>,
    /// Invalidated since the data was fetched.
    pub stale: bool,
}

impl<T> QueryState<T> {
    pub fn idle() -> Self {
        Self {
            status: QueryStatus::Idle,
            data: None,
            error: None,
            stale: false,
        }
    }

    pub fn is_loading(&self) -> bool {
        self.status == QueryStatus::Loading
    }

    pub fn is_success(&self) -> bool {
        self.status == QueryStatus::Success
    }

    pub fn is_error(&self) -> bool {
        self.status == QueryStatus::Error
    }
}

impl<T> Clone for QueryState<T> {
    fn clone(&self) -> Self {
        Self {
            status: self.status,
            data: self.data.clone(),
            error: self.error.clone(),
            stale: self.stale,
        }
    }
}

impl<T> Default for QueryState<T> {
    fn default() -> Self {
        Self::idle()
    }
}

struct Entry {
    status: QueryStatus,
    data: Option<AnyData>,
    error: Option<ApiError>,
    stale: bool,
    subscribers: usize,
    generation: u64,
    cancel: Option<CancellationToken>,
}

impl Entry {
    fn new(subscribers: usize) -> Self {
        Self {
            status: QueryStatus::Idle,
            data: None,
            error: None,
            stale: false,
            subscribers,
            generation: 0,
            cancel: None,
        }
    }

    /// Drop the in-flight fetch, its response will not be applied anymore.
    fn abort_fetch(&mut self) {
        if let Some(token) = self.cancel.take() {
            token.cancel();
        }
        self.generation += 1;

        if self.status == QueryStatus::Loading {
            self.status = if self.error.is_some() {
                QueryStatus::Error
            } else if self.data.is_some() {
                QueryStatus::Success
            } else {
                QueryStatus::Idle
            };
        }
    }
}

/// The process wide query cache.
///
/// Create one at application start and hand clones to whatever needs it, all clones share the
/// same entries. Entries live as long as at least one [`Query`] subscribes to their key.
#[derive(Clone, Default)]
pub struct QueryClient {
    entries: Arc<Mutex<HashMap<QueryKey, Entry>>>,
}

impl QueryClient {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<QueryKey, Entry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Subscribe to `key`, fetching through `fetcher`.
    ///
    /// Nothing is fetched until [`Query::fetch`] or [`Query::ensure`] is called.
    pub fn query<T, F, Fut>(&self, key: QueryKey, fetcher: F, options: QueryOptions) -> Query<T>
    where
        T: Send + Sync + 'static,
        F: Fn() -> Fut + 'static,
        Fut: Future<Output = Result<T, ApiError>> + 'static,
    {
        self.subscribe(&key);
        Query::new(self.clone(), key, fetcher, options)
    }

    /// Mark an entry as stale, the next [`Query::ensure`] refetches it.
    ///
    /// A fetch in flight is cancelled, it may have been answered before the change which caused
    /// the invalidation. Returns `false` if nothing is cached for `key`.
    pub fn invalidate(&self, key: &QueryKey) -> bool {
        let mut entries = self.lock();
        match entries.get_mut(key) {
            Some(entry) => {
                tracing::debug!("invalidate query {key}");
                entry.stale = true;
                entry.abort_fetch();
                true
            }
            None => false,
        }
    }

    /// Invalidate all entries whose key starts with `prefix`, returns how many were marked.
    pub fn invalidate_prefix(&self, prefix: &QueryKey) -> usize {
        let mut entries = self.lock();
        let mut count = 0;
        for (key, entry) in entries.iter_mut() {
            if prefix.is_prefix_of(key) {
                entry.stale = true;
                entry.abort_fetch();
                count += 1;
            }
        }
        tracing::debug!("invalidate queries below {prefix}: {count} entries");
        count
    }

    /// The current state of `key`, `None` if nothing is cached.
    ///
    /// Cached data of another type than `T` is reported as missing.
    pub fn state<T>(&self, key: &QueryKey) -> Option<QueryState<T>>
    where
        T: Send + Sync + 'static,
    {
        let entries = self.lock();
        let entry = entries.get(key)?;

        let data = match entry.data.clone().map(|data| data.downcast::<T>()) {
            Some(Ok(data)) => Some(data),
            Some(Err(_)) => {
                tracing::warn!("query {key} holds data of another type");
                None
            }
            None => None,
        };

        Some(QueryState {
            status: entry.status,
            data,
            error: entry.error.clone(),
            stale: entry.stale,
        })
    }

    /// Put an entry into the error state, e.g. after a failure detected outside of its fetcher.
    ///
    /// Cancels a fetch in flight and keeps the previous data.
    pub fn set_error(&self, key: &QueryKey, error: ApiError) -> bool {
        let mut entries = self.lock();
        match entries.get_mut(key) {
            Some(entry) => {
                entry.abort_fetch();
                entry.error = Some(error);
                entry.status = QueryStatus::Error;
                true
            }
            None => false,
        }
    }

    /// Drop all cached data and cancel all fetches. Subscriptions stay intact.
    pub fn clear(&self) {
        let mut entries = self.lock();
        for entry in entries.values_mut() {
            if let Some(token) = entry.cancel.take() {
                token.cancel();
            }
        }
        entries.retain(|_, entry| entry.subscribers > 0);
        for entry in entries.values_mut() {
            // keep the generation moving so responses of cancelled fetches stay ignored
            let generation = entry.generation + 1;
            *entry = Entry::new(entry.subscribers);
            entry.generation = generation;
        }
        tracing::debug!("query cache cleared");
    }

    pub fn subscriber_count(&self, key: &QueryKey) -> usize {
        self.lock()
            .get(key)
            .map(|entry| entry.subscribers)
            .unwrap_or(0)
    }

    pub fn is_cached(&self, key: &QueryKey) -> bool {
        self.lock().contains_key(key)
    }

    pub(crate) fn subscribe(&self, key: &QueryKey) {
        self.lock()
            .entry(key.clone())
            .or_insert_with(|| Entry::new(0))
            .subscribers += 1;
    }

    /// Drop one subscription, the last one removes the entry and cancels its fetch.
    pub(crate) fn unsubscribe(&self, key: &QueryKey) {
        let mut entries = self.lock();
        let Some(entry) = entries.get_mut(key) else {
            return;
        };

        entry.subscribers = entry.subscribers.saturating_sub(1);
        if entry.subscribers == 0 {
            if let Some(token) = entry.cancel.take() {
                token.cancel();
            }
            entries.remove(key);
            tracing::trace!("dropped query {key}");
        }
    }

    /// Start a new fetch for `key`, superseding any fetch still in flight.
    pub(crate) fn begin_fetch(&self, key: &QueryKey) -> (u64, CancellationToken) {
        let mut entries = self.lock();
        let entry = entries
            .entry(key.clone())
            .or_insert_with(|| Entry::new(0));

        if let Some(previous) = entry.cancel.take() {
            previous.cancel();
        }
        entry.generation += 1;
        entry.status = QueryStatus::Loading;

        let token = CancellationToken::new();
        entry.cancel = Some(token.clone());
        (entry.generation, token)
    }

    /// Apply the outcome of a fetch, unless a newer fetch, an invalidation or a cancellation
    /// happened in between. Returns whether it was applied.
    pub(crate) fn complete_fetch(
        &self,
        key: &QueryKey,
        generation: u64,
        result: Result<AnyData, ApiError>,
    ) -> bool {
        let mut entries = self.lock();
        let Some(entry) = entries.get_mut(key) else {
            return false;
        };
        if entry.generation != generation {
            tracing::debug!("discarding outdated response for query {key}");
            return false;
        }

        entry.cancel = None;
        entry.stale = false;
        match result {
            Ok(data) => {
                entry.data = Some(data);
                entry.error = None;
                entry.status = QueryStatus::Success;
            }
            Err(err) => {
                entry.error = Some(err);
                entry.status = QueryStatus::Error;
            }
        }
        true
    }

    /// Cancel the fetch in flight for `key`, the entry falls back to its previous status.
    pub(crate) fn cancel(&self, key: &QueryKey) {
        if let Some(entry) = self.lock().get_mut(key) {
            if entry.cancel.is_some() {
                tracing::debug!("cancel fetch of query {key}");
            }
            entry.abort_fetch();
        }
    }

    /// Abort the fetch of `generation` if it is still the current one for `key`.
    ///
    /// Used when a fetch future is dropped before it completed. Returns whether it was aborted.
    pub(crate) fn abort_if_current(&self, key: &QueryKey, generation: u64) -> bool {
        match self.lock().get_mut(key) {
            Some(entry) if entry.generation == generation => {
                tracing::debug!("fetch of query {key} abandoned");
                entry.abort_fetch();
                true
            }
            _ => false,
        }
    }
}
