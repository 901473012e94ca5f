//! Screen data controllers.
//!
//! A controller owns the in-memory projection one screen shows (the
//! category list, or the dish list of one category) and decides where it
//! comes from:
//!
//! 1. Ask the `NetworkMonitor` whether the network is usable.
//! 2. Online: fetch, upsert into the `RecordStore`, publish the fresh list.
//! 3. Offline or the fetch failed: publish what the store holds.
//! 4. Nothing cached either: publish an error.
//!
//! Every operation that touches the projection takes `&mut self`, so a
//! filter can never observe the store in the middle of a fetch's upsert.
//! Dropping an operation's future cancels the request; nothing is written
//! for a response that never arrived.

pub mod category;
pub mod dish;

use std::future::Future;
use std::sync::Arc;

use indexmap::IndexMap;
use thiserror::Error;
use tracing::{debug, warn};

use crate::api::FetchError;
use crate::cache::{RecordStore, StoreError, Stored};
use crate::connectivity::NetworkMonitor;
use crate::models::{Category, Dish, Locale, ValidationError};

pub use category::CategoryController;
pub use dish::DishController;

/// Message shown when the network is gone (also the empty-cache error).
pub const NO_NETWORK_MESSAGE: &str = "There is no access to the Internet.";

/// Message shown when the network works but the backend failed.
pub const SERVER_UNAVAILABLE_MESSAGE: &str = "The server is unavailable.";

#[derive(Error, Debug)]
pub enum DataError {
    #[error("There is no access to the Internet.")]
    NoCachedData,

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("Cached data could not be read: {0}")]
    Store(#[from] StoreError),
}

/// Where a screen's data is in its load cycle.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LoadState {
    #[default]
    Idle,
    Loading,
    Loaded,
    LoadedFromCache,
    /// Display text of the error
    Failed(String),
}

impl LoadState {
    pub fn is_loading(&self) -> bool {
        matches!(self, LoadState::Loading)
    }
}

/// Navigation collaborator; screens are pushed by the caller's UI layer.
pub trait CatalogNavigator: Send + Sync {
    fn show_dish_list(&self, category: &Category);

    fn show_dish_detail(&self, dish: &Dish);
}

/// Dependencies shared by both controllers of a session.
pub struct CatalogDeps<A> {
    pub api: Arc<A>,
    pub store: Arc<RecordStore>,
    pub monitor: Arc<NetworkMonitor>,
    pub navigator: Arc<dyn CatalogNavigator>,
    pub locale: Locale,
}

impl<A> Clone for CatalogDeps<A> {
    fn clone(&self) -> Self {
        Self {
            api: Arc::clone(&self.api),
            store: Arc::clone(&self.store),
            monitor: Arc::clone(&self.monitor),
            navigator: Arc::clone(&self.navigator),
            locale: self.locale,
        }
    }
}

/// Why a list came from the store instead of the network.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Fallback {
    /// No network path, or the request never reached the server
    Offline,
    /// The server answered with an error or an unreadable payload
    ServerFailure,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Source {
    Network,
    Cache(Fallback),
}

struct Loaded<R> {
    records: Vec<R>,
    source: Source,
}

impl<R> Loaded<R> {
    fn state(&self) -> LoadState {
        match self.source {
            Source::Network => LoadState::Loaded,
            Source::Cache(_) => LoadState::LoadedFromCache,
        }
    }

    fn fallback(&self) -> Option<Fallback> {
        match self.source {
            Source::Network => None,
            Source::Cache(reason) => Some(reason),
        }
    }
}

/// Map wire records to domain records, logging and skipping rejects.
fn map_records<T, R>(raw: Vec<T>) -> Vec<R>
where
    R: Stored + TryFrom<T, Error = ValidationError>,
{
    raw.into_iter()
        .filter_map(|item| match R::try_from(item) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!(kind = %R::KIND, error = %e, "Skipping invalid record");
                None
            }
        })
        .collect()
}

/// Collapse repeated keys the way the store does: the last value wins and
/// keeps the position of the first occurrence.
fn dedupe_by_key<R: Stored>(records: Vec<R>) -> Vec<R> {
    let received = records.len();
    let mut rows = IndexMap::with_capacity(received);
    for record in records {
        rows.insert(record.key(), record);
    }
    if rows.len() < received {
        warn!(
            kind = %R::KIND,
            received,
            unique = rows.len(),
            "Response repeats record ids, keeping the last of each"
        );
    }
    rows.into_values().collect()
}

/// The fetch-or-cache cycle shared by both screens.
async fn load_or_fallback<T, R, Fut>(
    monitor: &NetworkMonitor,
    store: &RecordStore,
    fetch: impl FnOnce() -> Fut,
) -> Result<Loaded<R>, DataError>
where
    R: Stored + TryFrom<T, Error = ValidationError>,
    Fut: Future<Output = Result<Vec<T>, FetchError>>,
{
    let failure = if monitor.check_availability().await {
        match fetch().await {
            Ok(raw) => {
                let records: Vec<R> = dedupe_by_key(map_records(raw));
                // Cache writes may fail silently; the fresh list is still shown
                if let Err(e) = store.upsert(&records) {
                    warn!(kind = %R::KIND, error = %e, "Failed to cache records");
                }
                return Ok(Loaded {
                    records,
                    source: Source::Network,
                });
            }
            Err(e) => {
                warn!(kind = %R::KIND, error = %e, "Fetch failed, falling back to cache");
                Some(e)
            }
        }
    } else {
        debug!(kind = %R::KIND, "Network unavailable, reading cache");
        None
    };

    let reason = match &failure {
        Some(e) if !e.is_connection() => Fallback::ServerFailure,
        _ => Fallback::Offline,
    };
    let cached: Vec<R> = store.fetch_all()?;
    if !cached.is_empty() {
        debug!(kind = %R::KIND, count = cached.len(), reason = ?reason, "Serving cached records");
        return Ok(Loaded {
            records: cached,
            source: Source::Cache(reason),
        });
    }

    match failure {
        Some(e) if !e.is_connection() => Err(DataError::Fetch(e)),
        _ => Err(DataError::NoCachedData),
    }
}

/// Notice shown above a list served from cache.
fn offline_notice(reason: Fallback, age: Option<String>) -> String {
    let headline = match reason {
        Fallback::Offline => NO_NETWORK_MESSAGE,
        Fallback::ServerFailure => SERVER_UNAVAILABLE_MESSAGE,
    };
    match age {
        Some(age) => format!("{} Showing data saved {}.", headline, age),
        None => format!("{} Showing saved data.", headline),
    }
}
