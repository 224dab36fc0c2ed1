//! Binding store adapters
//!
//! The store is a plain read API: it lists every domain-to-theme binding and has no
//! caching or matching logic of its own.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::RwLock;
use std::time::Duration;

use async_trait::async_trait;
use multisite_shared::{Binding, SiteId, StoreError};
use sqlx::PgPool;
use tokio_retry::strategy::{jitter, ExponentialBackoff};
use tokio_retry::Retry;

/// Initial backoff between store retries (50ms)
const RETRY_BASE_DELAY_MS: u64 = 50;

/// Maximum backoff between store retries (1 second)
const RETRY_MAX_DELAY: Duration = Duration::from_secs(1);

/// Source of domain-to-theme bindings
#[async_trait]
pub trait BindingStore: Send + Sync {
    /// List all bindings in store order
    async fn list_bindings(&self) -> Result<Vec<Binding>, StoreError>;

    /// Check that the store is reachable
    async fn ping(&self) -> Result<(), StoreError> {
        self.list_bindings().await.map(|_| ())
    }
}

/// Database row for a binding
#[derive(Debug, sqlx::FromRow)]
struct BindingRow {
    site_id: i64,
    domain: String,
    theme: String,
    is_protected: bool,
}

impl From<BindingRow> for Binding {
    fn from(row: BindingRow) -> Self {
        Binding {
            site_id: SiteId(row.site_id),
            domain: row.domain,
            theme: row.theme,
            is_protected: row.is_protected,
        }
    }
}

/// Postgres-backed binding store
#[derive(Clone)]
pub struct PgBindingStore {
    pool: PgPool,
    timeout: Duration,
    retry_attempts: usize,
}

impl PgBindingStore {
    pub fn new(pool: PgPool, timeout: Duration, retry_attempts: usize) -> Self {
        Self {
            pool,
            timeout,
            retry_attempts,
        }
    }

    async fn fetch_once(&self) -> Result<Vec<Binding>, StoreError> {
        let query = sqlx::query_as::<_, BindingRow>(
            r#"
            SELECT site_id, domain, theme, is_protected
            FROM multisite_bindings
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool);

        let rows = tokio::time::timeout(self.timeout, query)
            .await
            .map_err(|_| StoreError::Timeout(self.timeout))??;

        Ok(rows.into_iter().map(Binding::from).collect())
    }
}

#[async_trait]
impl BindingStore for PgBindingStore {
    async fn list_bindings(&self) -> Result<Vec<Binding>, StoreError> {
        let strategy = ExponentialBackoff::from_millis(RETRY_BASE_DELAY_MS)
            .max_delay(RETRY_MAX_DELAY)
            .map(jitter)
            .take(self.retry_attempts);

        Retry::spawn(strategy, || async {
            self.fetch_once().await.map_err(|e| {
                tracing::debug!(error = %e, "Binding store fetch failed");
                e
            })
        })
        .await
    }

    async fn ping(&self) -> Result<(), StoreError> {
        let check = sqlx::query("SELECT 1").execute(&self.pool);
        tokio::time::timeout(self.timeout, check)
            .await
            .map_err(|_| StoreError::Timeout(self.timeout))??;
        Ok(())
    }
}

/// In-memory binding store.
///
/// Used for embedding without a database and in tests; it counts fetches and can be
/// switched into a failing or slow state to simulate an outage.
#[derive(Default)]
pub struct StaticBindingStore {
    bindings: RwLock<Vec<Binding>>,
    unavailable: RwLock<Option<String>>,
    fetches: AtomicUsize,
    latency_ms: AtomicU64,
}

impl StaticBindingStore {
    pub fn new(bindings: Vec<Binding>) -> Self {
        Self {
            bindings: RwLock::new(bindings),
            ..Default::default()
        }
    }

    /// Replace the stored bindings
    pub fn set_bindings(&self, bindings: Vec<Binding>) {
        if let Ok(mut current) = self.bindings.write() {
            *current = bindings;
        }
    }

    /// Make every subsequent fetch fail with the given reason (`None` restores service)
    pub fn set_unavailable(&self, reason: Option<&str>) {
        if let Ok(mut current) = self.unavailable.write() {
            *current = reason.map(str::to_string);
        }
    }

    /// Delay every fetch by `latency`. The result is read before the delay.
    pub fn set_latency(&self, latency: Duration) {
        self.latency_ms.store(latency.as_millis() as u64, Ordering::SeqCst);
    }

    /// Number of times `list_bindings` has been called
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    fn snapshot(&self) -> Result<Vec<Binding>, StoreError> {
        let outage = self
            .unavailable
            .read()
            .map_err(|_| StoreError::Unavailable("store lock poisoned".to_string()))?
            .clone();
        if let Some(reason) = outage {
            return Err(StoreError::Unavailable(reason));
        }

        self.bindings
            .read()
            .map(|b| b.clone())
            .map_err(|_| StoreError::Unavailable("store lock poisoned".to_string()))
    }
}

#[async_trait]
impl BindingStore for StaticBindingStore {
    async fn list_bindings(&self) -> Result<Vec<Binding>, StoreError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);

        let result = self.snapshot();

        let latency = self.latency_ms.load(Ordering::SeqCst);
        if latency > 0 {
            tokio::time::sleep(Duration::from_millis(latency)).await;
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_store_lists_bindings() {
        let store = StaticBindingStore::new(vec![Binding::new(1, "a.example.com", "t1", true)]);

        let bindings = store.list_bindings().await.unwrap();
        assert_eq!(bindings.len(), 1);
        assert_eq!(bindings[0].theme, "t1");
        assert_eq!(store.fetch_count(), 1);
    }

    #[tokio::test]
    async fn test_static_store_outage() {
        let store = StaticBindingStore::new(vec![]);
        store.set_unavailable(Some("connection refused"));

        assert!(matches!(
            store.list_bindings().await,
            Err(StoreError::Unavailable(_))
        ));
        assert!(store.ping().await.is_err());

        store.set_unavailable(None);
        assert!(store.ping().await.is_ok());
    }

    #[test]
    fn test_row_conversion() {
        let row = BindingRow {
            site_id: 464,
            domain: "https://lokasi.example.com".to_string(),
            theme: "lokasi".to_string(),
            is_protected: false,
        };

        let binding = Binding::from(row);
        assert_eq!(binding.site_id, SiteId(464));
        assert_eq!(binding.domain, "https://lokasi.example.com");
    }
}
