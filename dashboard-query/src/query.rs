use std::future::Future;
use std::marker::PhantomData;
use std::rc::Rc;
use std::sync::Arc;

use futures::future::LocalBoxFuture;
use futures::FutureExt;

use dashboard_http_error::ApiError;

use crate::client::AnyData;
use crate::{QueryClient, QueryKey, QueryState, QueryStatus};

type Fetcher<T> = Rc<dyn Fn() -> LocalBoxFuture<'static, Result<T, ApiError>>>;

/// Per query options.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct QueryOptions {
    /// How often a failed fetch is repeated. Only transport errors and server errors (5xx) are
    /// retried, an answer rejecting the request never is.
    pub retry: u32,
}

impl QueryOptions {
    pub fn retry(retry: u32) -> Self {
        Self { retry }
    }
}

/// A subscription to one cache entry plus the means to (re)fetch it.
///
/// Dropping the last `Query` of a key removes the entry and cancels its fetch.
pub struct Query<T> {
    client: QueryClient,
    key: QueryKey,
    fetcher: Fetcher<T>,
    options: QueryOptions,
    _data: PhantomData<fn() -> T>,
}

impl<T> Query<T>
where
    T: Send + Sync + 'static,
{
    pub(crate) fn new<F, Fut>(
        client: QueryClient,
        key: QueryKey,
        fetcher: F,
        options: QueryOptions,
    ) -> Self
    where
        F: Fn() -> Fut + 'static,
        Fut: Future<Output = Result<T, ApiError>> + 'static,
    {
        Self {
            client,
            key,
            fetcher: Rc::new(move || fetcher().boxed_local()),
            options,
            _data: PhantomData,
        }
    }

    pub fn key(&self) -> &QueryKey {
        &self.key
    }

    pub fn state(&self) -> QueryState<T> {
        self.client.state(&self.key).unwrap_or_default()
    }

    /// The last fetched data, if any.
    pub fn data(&self) -> Option<Arc<T>> {
        self.state().data
    }

    /// Fetch now, superseding a fetch still in flight for the same key.
    ///
    /// Returns the entry state after the fetch. If this fetch got superseded or cancelled its
    /// response is dropped and the state reflects whatever happened instead.
    pub async fn fetch(&self) -> QueryState<T> {
        let (generation, token) = self.client.begin_fetch(&self.key);
        tracing::debug!("fetch query {}", self.key);
        let mut pending = PendingFetch {
            client: &self.client,
            key: &self.key,
            generation,
            done: false,
        };

        let mut attempt = 0;
        let result = loop {
            let outcome = tokio::select! {
                _ = token.cancelled() => None,
                result = (self.fetcher)() => Some(result),
            };

            match outcome {
                None => {
                    tracing::debug!("fetch of query {} cancelled", self.key);
                    pending.done = true;
                    return self.state();
                }
                Some(Err(err)) if err.is_retryable() && attempt < self.options.retry => {
                    attempt += 1;
                    tracing::debug!(
                        "fetch of query {} failed ({err}), retry {attempt}/{}",
                        self.key,
                        self.options.retry
                    );
                }
                Some(result) => break result,
            }
        };

        let result = result.map(|data| Arc::new(data) as AnyData);
        self.client.complete_fetch(&self.key, generation, result);
        pending.done = true;
        self.state()
    }

    /// Fetch if nothing was fetched yet or the entry got invalidated.
    ///
    /// This is what a screen calls on every render. An errored entry is not fetched again, use
    /// [`fetch`](Self::fetch) to retry explicitly.
    pub async fn ensure(&self) -> QueryState<T> {
        let state = self.state();
        match state.status {
            QueryStatus::Idle => self.fetch().await,
            QueryStatus::Loading => state,
            QueryStatus::Success | QueryStatus::Error if state.stale => self.fetch().await,
            QueryStatus::Success | QueryStatus::Error => state,
        }
    }

    /// Cancel the fetch in flight, if any.
    pub fn cancel(&self) {
        self.client.cancel(&self.key);
    }
}

/// Puts the entry back out of `Loading` if a fetch future is dropped before it completed.
struct PendingFetch<'a> {
    client: &'a QueryClient,
    key: &'a QueryKey,
    generation: u64,
    done: bool,
}

impl Drop for PendingFetch<'_> {
    fn drop(&mut self) {
        if !self.done {
            self.client.abort_if_current(self.key, self.generation);
        }
    }
}

impl<T> Drop for Query<T> {
    fn drop(&mut self) {
        self.client.unsubscribe(&self.key);
    }
}
