//! In-memory host resolution cache
//!
//! Caches host-to-binding lookups so that a host is matched against the binding set
//! only once. Entries never expire; the whole cache is cleared together with the
//! binding cache.
//!
//! Keys come from the request's Host header, so the number of entries is capped. Once
//! the cap is reached, new hosts are resolved against the binding set on every request
//! instead of being cached.

use std::collections::HashMap;
use std::sync::RwLock;

use multisite_shared::Binding;

/// Default maximum number of cached hosts
const DEFAULT_MAX_ENTRIES: usize = 10_000;

#[derive(Default)]
struct HostEntries {
    /// Bumped by every clear; writes tagged with an older generation are dropped
    generation: u64,
    /// Maps host key -> binding (None means the host matched no binding)
    hosts: HashMap<String, Option<Binding>>,
}

/// Thread-safe host resolution cache
pub struct HostResolutionCache {
    entries: RwLock<HostEntries>,
    max_entries: usize,
}

impl Default for HostResolutionCache {
    fn default() -> Self {
        Self::new()
    }
}

impl HostResolutionCache {
    /// Create a new cache with the default entry limit
    pub fn new() -> Self {
        Self::with_max_entries(DEFAULT_MAX_ENTRIES)
    }

    /// Create a new cache holding at most `max_entries` hosts
    pub fn with_max_entries(max_entries: usize) -> Self {
        Self {
            entries: RwLock::new(HostEntries::default()),
            max_entries,
        }
    }

    /// Get the cached binding for a host key
    /// Returns Some(Some(binding)) if the host matched a binding
    /// Returns Some(None) if the host was cached as matching nothing
    /// Returns None if the host has not been resolved yet
    pub fn get(&self, key: &str) -> Option<Option<Binding>> {
        let entries = self.entries.read().ok()?;
        entries.hosts.get(key).cloned()
    }

    /// Current generation, advanced by every [`clear`](Self::clear)
    pub fn generation(&self) -> u64 {
        self.entries.read().map(|e| e.generation).unwrap_or(0)
    }

    /// Cache a host key -> binding mapping resolved against the binding set of
    /// `generation`.
    ///
    /// Returns false when nothing was stored: the generation has been cleared since,
    /// or the cache is full and the key is new.
    pub fn set(&self, key: &str, binding: Option<Binding>, generation: u64) -> bool {
        let Ok(mut entries) = self.entries.write() else {
            return false;
        };

        if entries.generation != generation {
            tracing::debug!(
                key = %key,
                generation,
                current = entries.generation,
                "Host resolution from a cleared binding set dropped"
            );
            return false;
        }

        if entries.hosts.len() >= self.max_entries && !entries.hosts.contains_key(key) {
            tracing::debug!(
                key = %key,
                max_entries = self.max_entries,
                "Host resolution cache full, not caching host"
            );
            return false;
        }

        entries.hosts.insert(key.to_string(), binding);
        true
    }

    /// Drop every entry and start a new generation, returning how many entries were
    /// removed
    pub fn clear(&self) -> usize {
        match self.entries.write() {
            Ok(mut entries) => {
                let removed = entries.hosts.len();
                entries.hosts.clear();
                entries.generation += 1;
                removed
            }
            Err(_) => 0,
        }
    }

    /// Get cache statistics
    pub fn stats(&self) -> CacheStats {
        if let Ok(entries) = self.entries.read() {
            let total = entries.hosts.len();
            let unmatched = entries.hosts.values().filter(|e| e.is_none()).count();
            CacheStats {
                total_entries: total,
                matched_entries: total - unmatched,
                unmatched_entries: unmatched,
            }
        } else {
            CacheStats::default()
        }
    }
}

/// Cache statistics
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct CacheStats {
    pub total_entries: usize,
    pub matched_entries: usize,
    pub unmatched_entries: usize,
}
