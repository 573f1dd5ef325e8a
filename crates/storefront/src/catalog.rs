//! Product catalog loader.
//!
//! Holds the last successfully fetched product list. The home view calls
//! [`CatalogLoader::refresh`]; everything else reads the snapshot.
//!
//! - A failed fetch is logged and the previous snapshot is kept (possibly
//!   empty). There is no retry and no partial merge.
//! - Concurrent refreshes share one backend request through a `moka`
//!   cache; with a TTL, bursts of home views also reuse the result.
//! - The fetch runs inside the caller's future, so a disconnected client
//!   drops it, and the backend client's timeout bounds it.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use tokio::sync::RwLock;
use tracing::instrument;

use carrito_core::{Product, ProductId};

use crate::api::{ApiError, BackendClient};

/// A shared, immutable catalog.
pub type Snapshot = Arc<Vec<Product>>;

/// Loads and holds the product catalog.
#[derive(Clone)]
pub struct CatalogLoader {
    inner: Arc<CatalogLoaderInner>,
}

struct CatalogLoaderInner {
    backend: BackendClient,
    snapshot: RwLock<Snapshot>,
    /// Single-key cache used to coalesce fetches; `None` when disabled.
    cache: Option<Cache<(), Snapshot>>,
}

impl CatalogLoader {
    /// Create a loader with an empty snapshot.
    ///
    /// `ttl` is how long a fetched list is reused. `None` fetches on every
    /// refresh.
    #[must_use]
    pub fn new(backend: BackendClient, ttl: Option<Duration>) -> Self {
        let cache = ttl.map(|ttl| Cache::builder().max_capacity(1).time_to_live(ttl).build());

        Self {
            inner: Arc::new(CatalogLoaderInner {
                backend,
                snapshot: RwLock::new(Arc::new(Vec::new())),
                cache,
            }),
        }
    }

    /// Fetch the catalog and replace the snapshot.
    ///
    /// Always returns a catalog: the fresh one on success, the previous one
    /// when the fetch fails.
    #[instrument(skip(self))]
    pub async fn refresh(&self) -> Snapshot {
        let result = match &self.inner.cache {
            Some(cache) => cache.try_get_with((), self.fetch()).await,
            None => self.fetch().await.map_err(Arc::new),
        };

        match result {
            Ok(products) => {
                *self.inner.snapshot.write().await = Arc::clone(&products);
                products
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to load catalog, keeping previous snapshot");
                self.snapshot().await
            }
        }
    }

    async fn fetch(&self) -> Result<Snapshot, ApiError> {
        let products = self.inner.backend.list_products().await?;
        tracing::info!(count = products.len(), "Catalog loaded");
        Ok(Arc::new(products))
    }

    /// The last successfully loaded catalog.
    pub async fn snapshot(&self) -> Snapshot {
        Arc::clone(&*self.inner.snapshot.read().await)
    }

    /// Look up a product in the current snapshot.
    pub async fn find(&self, id: &ProductId) -> Option<Product> {
        self.inner
            .snapshot
            .read()
            .await
            .iter()
            .find(|product| &product.id == id)
            .cloned()
    }

    /// Drop the cached list so the next refresh goes to the backend.
    ///
    /// The snapshot itself is kept.
    pub async fn invalidate(&self) {
        if let Some(cache) = &self.inner.cache {
            cache.invalidate_all();
            cache.run_pending_tasks().await;
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    use axum::{Json, Router, extract::State, http::StatusCode, routing::get};
    use carrito_core::Price;
    use serde_json::{Value, json};

    use super::*;
    use crate::config::BackendConfig;

    #[derive(Clone, Default)]
    struct Stub {
        hits: Arc<AtomicUsize>,
        failing: Arc<AtomicBool>,
    }

    async fn productos(State(stub): State<Stub>) -> Result<Json<Value>, StatusCode> {
        stub.hits.fetch_add(1, Ordering::SeqCst);
        if stub.failing.load(Ordering::SeqCst) {
            return Err(StatusCode::INTERNAL_SERVER_ERROR);
        }
        Ok(Json(json!([
            {"_id": "p1", "nombre": "Widget", "precio": 9.99, "imagen": "w.png"},
            {"_id": "p2", "nombre": "Gadget", "precio": 5, "imagen": "g.png"}
        ])))
    }

    async fn spawn_stub(stub: Stub) -> String {
        let app = Router::new()
            .route("/api/productos", get(productos))
            .with_state(stub);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}/api")
    }

    fn loader(api_url: String, ttl: Option<Duration>) -> CatalogLoader {
        let backend = BackendClient::new(&BackendConfig {
            api_url,
            timeout: Duration::from_secs(5),
        })
        .unwrap();
        CatalogLoader::new(backend, ttl)
    }

    #[tokio::test]
    async fn test_refresh_replaces_snapshot() {
        let stub = Stub::default();
        let catalog = loader(spawn_stub(stub.clone()).await, None);

        assert!(catalog.snapshot().await.is_empty());

        let products = catalog.refresh().await;
        assert_eq!(products.len(), 2);
        assert_eq!(
            products[0],
            Product::new("p1", "Widget", Price::from_cents(999), "w.png")
        );
        assert_eq!(catalog.snapshot().await.len(), 2);
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_previous_snapshot() {
        let stub = Stub::default();
        let catalog = loader(spawn_stub(stub.clone()).await, None);

        catalog.refresh().await;
        stub.failing.store(true, Ordering::SeqCst);

        let products = catalog.refresh().await;
        assert_eq!(products.len(), 2);
        assert_eq!(stub.hits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_unreachable_backend_leaves_empty_snapshot() {
        let catalog = loader("http://127.0.0.1:9/api".to_string(), None);
        assert!(catalog.refresh().await.is_empty());
    }

    #[tokio::test]
    async fn test_ttl_shares_one_fetch() {
        let stub = Stub::default();
        let catalog = loader(spawn_stub(stub.clone()).await, Some(Duration::from_secs(60)));

        let (a, b) = tokio::join!(catalog.refresh(), catalog.refresh());
        catalog.refresh().await;

        assert_eq!(a, b);
        assert_eq!(stub.hits.load(Ordering::SeqCst), 1);

        catalog.invalidate().await;
        catalog.refresh().await;
        assert_eq!(stub.hits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_find_uses_snapshot() {
        let stub = Stub::default();
        let catalog = loader(spawn_stub(stub).await, None);

        assert!(catalog.find(&ProductId::new("p1")).await.is_none());
        catalog.refresh().await;

        let found = catalog.find(&ProductId::new("p2")).await.unwrap();
        assert_eq!(found.name, "Gadget");
        assert!(catalog.find(&ProductId::new("nope")).await.is_none());
    }
}
