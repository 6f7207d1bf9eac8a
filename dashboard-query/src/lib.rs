//! Cached reads and invalidating writes on top of [`dashboard_client`].
//!
//! A [`QueryClient`] is created once at application start and passed to every screen. Screens
//! subscribe to cache entries through [`Query`] handles (usually obtained from a [`Resource`])
//! and call [`Query::ensure`] whenever they render, which fetches only when nothing is cached
//! yet or the entry was invalidated. Writes go through [`Mutation`]s which, on success,
//! invalidate the affected entries instead of editing the cache, so the backend stays the only
//! source of truth.
//!
//! The handles are meant for a single threaded UI: fetchers and mutation functions are not
//! required to be `Send`, only the cached data is shared.

mod client;
pub use client::{QueryClient, QueryState, QueryStatus};

mod key;
pub use key::QueryKey;

mod mutation;
pub use mutation::{Mutation, MutationStatus};

pub mod notify;
pub use notify::{notify, Feedback, LogNotifier, Notifier, RecordingNotifier};

mod query;
pub use query::{Query, QueryOptions};

mod resource;
pub use resource::Resource;
