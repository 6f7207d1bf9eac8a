use std::cell::{Cell, RefCell};
use std::future::Future;
use std::rc::Rc;

use futures::future::LocalBoxFuture;
use futures::FutureExt;

use dashboard_http_error::ApiError;

use crate::{QueryClient, QueryKey};

type MutateFn<I, O> = Rc<dyn Fn(I) -> LocalBoxFuture<'static, Result<O, ApiError>>>;
type KeyFn<I> = Rc<dyn Fn(&I) -> Vec<QueryKey>>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MutationStatus {
    Idle,
    Loading,
    Success,
    Error,
}

/// A write operation which invalidates cache entries when it succeeds.
///
/// Mutations are never retried. A failed mutation leaves the cache untouched and hands the error
/// to the caller.
pub struct Mutation<I, O> {
    client: QueryClient,
    mutate_fn: MutateFn<I, O>,
    invalidates: Vec<QueryKey>,
    invalidates_for: Vec<KeyFn<I>>,
    status: Cell<MutationStatus>,
    error: RefCell<Option<ApiError>>,
}

impl<I, O> Mutation<I, O>
where
    I: 'static,
    O: 'static,
{
    pub fn new<F, Fut>(client: &QueryClient, mutate_fn: F) -> Self
    where
        F: Fn(I) -> Fut + 'static,
        Fut: Future<Output = Result<O, ApiError>> + 'static,
    {
        Self {
            client: client.clone(),
            mutate_fn: Rc::new(move |input| mutate_fn(input).boxed_local()),
            invalidates: Vec::new(),
            invalidates_for: Vec::new(),
            status: Cell::new(MutationStatus::Idle),
            error: RefCell::new(None),
        }
    }

    /// Invalidate every entry below `prefix` after a successful mutation.
    pub fn invalidates(mut self, prefix: QueryKey) -> Self {
        self.invalidates.push(prefix);
        self
    }

    /// Invalidate keys derived from the input, e.g. the detail entry of an updated id.
    pub fn invalidates_with<F>(mut self, keys: F) -> Self
    where
        F: Fn(&I) -> Vec<QueryKey> + 'static,
    {
        self.invalidates_for.push(Rc::new(keys));
        self
    }

    pub fn status(&self) -> MutationStatus {
        self.status.get()
    }

    pub fn is_loading(&self) -> bool {
        self.status() == MutationStatus::Loading
    }

    /// The error of the last run, if it failed.
    pub fn error(&self) -> Option<ApiError> {
        self.error.borrow().clone()
    }

    /// Back to `Idle`, forgetting the last error.
    pub fn reset(&self) {
        self.status.set(MutationStatus::Idle);
        self.error.replace(None);
    }

    pub async fn mutate(&self, input: I) -> Result<O, ApiError> {
        let mut keys = self.invalidates.clone();
        for key_fn in &self.invalidates_for {
            keys.extend(key_fn(&input));
        }

        self.status.set(MutationStatus::Loading);
        self.error.replace(None);

        match (self.mutate_fn)(input).await {
            Ok(output) => {
                for key in &keys {
                    self.client.invalidate_prefix(key);
                }
                self.status.set(MutationStatus::Success);
                Ok(output)
            }
            Err(err) => {
                tracing::debug!("mutation failed: {err}");
                self.status.set(MutationStatus::Error);
                self.error.replace(Some(err.clone()));
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{QueryOptions, QueryStatus};

    #[tokio::test]
    async fn success_invalidates_configured_keys() {
        let client = QueryClient::new();
        let list = client.query(
            QueryKey::list("courses"),
            || async { Ok(vec![1u32]) },
            QueryOptions::default(),
        );
        let detail = client.query(
            QueryKey::detail("courses", "c1"),
            || async { Ok(1u32) },
            QueryOptions::default(),
        );
        let other = client.query(
            QueryKey::detail("courses", "c2"),
            || async { Ok(2u32) },
            QueryOptions::default(),
        );
        list.fetch().await;
        detail.fetch().await;
        other.fetch().await;

        let update = Mutation::new(&client, |(id, title): (String, String)| async move {
            Ok(format!("{id}: {title}"))
        })
        .invalidates(QueryKey::list("courses"))
        .invalidates_with(|(id, _): &(String, String)| vec![QueryKey::detail("courses", id)]);

        let output = update
            .mutate(("c1".to_string(), "Rust".to_string()))
            .await
            .unwrap();
        assert_eq!(output, "c1: Rust");
        assert_eq!(update.status(), MutationStatus::Success);

        assert!(list.state().stale);
        assert!(detail.state().stale);
        assert!(!other.state().stale);
    }

    #[tokio::test]
    async fn failure_leaves_cache_alone() {
        let client = QueryClient::new();
        let list = client.query(
            QueryKey::list("articles"),
            || async { Ok(3u32) },
            QueryOptions::default(),
        );
        list.fetch().await;

        let calls = Rc::new(Cell::new(0));
        let counter = Rc::clone(&calls);
        let delete = Mutation::new(&client, move |_id: String| {
            counter.set(counter.get() + 1);
            async { Err::<(), _>(ApiError::new(503, "Service Unavailable")) }
        })
        .invalidates(QueryKey::list("articles"));

        let err = delete.mutate("a1".into()).await.unwrap_err();
        assert_eq!(err.status, 503);
        assert_eq!(calls.get(), 1);
        assert_eq!(delete.status(), MutationStatus::Error);
        assert_eq!(delete.error(), Some(err));

        let state = list.state();
        assert_eq!(state.status, QueryStatus::Success);
        assert!(!state.stale);

        delete.reset();
        assert_eq!(delete.status(), MutationStatus::Idle);
        assert!(delete.error().is_none());
    }
}
