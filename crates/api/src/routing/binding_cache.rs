//! Process-wide binding cache
//!
//! Holds the materialized binding set until it is explicitly invalidated. There is no
//! TTL: bindings change only when an operator saves them, and that save calls
//! [`BindingCache::invalidate`].

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use multisite_shared::{BindingSet, Operator};
use tokio::sync::Mutex;

use super::{BindingStore, HostResolutionCache};
use crate::notices::{Notice, OperatorNotices};

/// Message queued for operators when bindings cannot be loaded
pub const STORE_UNAVAILABLE_NOTICE: &str =
    "Multisite bindings could not be loaded from the database. Domain themes and backend protection are disabled until it recovers.";

/// Outcome of a binding lookup
#[derive(Debug, Clone)]
pub enum CachedBindings {
    Ready {
        set: Arc<BindingSet>,
        /// Cache generation the set was loaded under
        generation: u64,
    },
    /// The store failed; callers must skip protection and theme selection
    Unavailable,
}

impl CachedBindings {
    pub fn ready(&self) -> Option<&Arc<BindingSet>> {
        match self {
            CachedBindings::Ready { set, .. } => Some(set),
            CachedBindings::Unavailable => None,
        }
    }
}

/// Binding cache with single-flight population
pub struct BindingCache {
    store: Arc<dyn BindingStore>,
    bindings: RwLock<Option<(Arc<BindingSet>, u64)>>,
    /// Serializes cold-cache population. Holds the number of the last store fetch
    /// that failed, so requests queued behind it share the failure.
    fill: Mutex<Option<u64>>,
    /// Completed store fetches
    flights: AtomicU64,
    /// Also owns the cache generation, advanced by every invalidation
    hosts: Arc<HostResolutionCache>,
    notices: Arc<OperatorNotices>,
}

impl BindingCache {
    pub fn new(store: Arc<dyn BindingStore>, notices: Arc<OperatorNotices>) -> Self {
        Self {
            store,
            bindings: RwLock::new(None),
            fill: Mutex::new(None),
            flights: AtomicU64::new(0),
            hosts: Arc::new(HostResolutionCache::new()),
            notices,
        }
    }

    /// Get the binding set, loading it from the store on a cold cache.
    ///
    /// Concurrent cold calls share one store fetch, whether it succeeds or fails.
    /// Store failures never escape: they are logged, reported to `actor` when it is an
    /// authenticated operator, and turned into [`CachedBindings::Unavailable`]. Nothing
    /// is cached on failure, so the next request after it tries the store again.
    pub async fn get_bindings(&self, actor: Option<&Operator>) -> CachedBindings {
        let seen = self.flights.load(Ordering::SeqCst);
        if let Some(ready) = self.current() {
            return ready;
        }

        let mut last_failure = self.fill.lock().await;

        // Another request may have populated the cache while we waited
        if let Some(ready) = self.current() {
            return ready;
        }
        if last_failure.is_some_and(|flight| flight > seen) {
            tracing::debug!("Sharing failed binding fetch with queued request");
            self.notify_unavailable(actor);
            return CachedBindings::Unavailable;
        }

        let generation = self.hosts.generation();
        let result = self.store.list_bindings().await;
        let flight = self.flights.fetch_add(1, Ordering::SeqCst) + 1;

        match result {
            Ok(rows) => {
                let set = Arc::new(BindingSet::from_bindings(rows));

                if let Ok(mut slot) = self.bindings.write() {
                    if self.hosts.generation() == generation {
                        *slot = Some((Arc::clone(&set), generation));
                        tracing::info!(bindings = set.len(), "Binding cache populated");
                    } else {
                        tracing::debug!("Binding cache invalidated during fetch, result not stored");
                    }
                }

                CachedBindings::Ready { set, generation }
            }
            Err(e) => {
                *last_failure = Some(flight);
                tracing::warn!(
                    error = %e,
                    "Binding store unavailable, skipping multisite handling"
                );
                self.notify_unavailable(actor);
                CachedBindings::Unavailable
            }
        }
    }

    /// Drop the cached binding set and every host resolution.
    /// Returns the number of host entries cleared.
    pub fn invalidate(&self) -> usize {
        // Advance the generation before emptying the slot so an in-flight fetch
        // cannot store its result afterwards
        let hosts = self.hosts.clear();
        if let Ok(mut slot) = self.bindings.write() {
            *slot = None;
        }

        tracing::info!(cleared_hosts = hosts, "Binding cache invalidated");
        hosts
    }

    /// Whether a binding set is currently cached
    pub fn is_warm(&self) -> bool {
        self.current().is_some()
    }

    /// Host resolution cache tied to this binding cache's lifetime
    pub fn hosts(&self) -> &HostResolutionCache {
        &self.hosts
    }

    /// Underlying store, for health checks
    pub fn store(&self) -> &Arc<dyn BindingStore> {
        &self.store
    }

    fn current(&self) -> Option<CachedBindings> {
        let slot = self.bindings.read().ok()?;
        slot.as_ref().map(|(set, generation)| CachedBindings::Ready {
            set: Arc::clone(set),
            generation: *generation,
        })
    }

    fn notify_unavailable(&self, actor: Option<&Operator>) {
        if let Some(operator) = actor {
            self.notices
                .push(operator.id, Notice::error(STORE_UNAVAILABLE_NOTICE));
        }
    }
}
