//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::api::{ApiError, BackendClient};
use crate::catalog::CatalogLoader;
use crate::config::StorefrontConfig;
use crate::session::events::SessionEvents;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to the
/// backend client, the catalog snapshot and the session-change channel.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    pool: Option<PgPool>,
    backend: BackendClient,
    catalog: CatalogLoader,
    events: SessionEvents,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Arguments
    ///
    /// * `config` - Storefront configuration
    /// * `pool` - `PostgreSQL` pool backing the session store, if configured
    ///
    /// # Errors
    ///
    /// Returns an error if the backend HTTP client cannot be built.
    pub fn new(config: StorefrontConfig, pool: Option<PgPool>) -> Result<Self, ApiError> {
        let backend = BackendClient::new(&config.backend)?;
        let catalog = CatalogLoader::new(backend.clone(), config.catalog_ttl);

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                backend,
                catalog,
                events: SessionEvents::new(),
            }),
        })
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get the session store's connection pool, if sessions are persistent.
    #[must_use]
    pub fn pool(&self) -> Option<&PgPool> {
        self.inner.pool.as_ref()
    }

    /// Get a reference to the backend API client.
    #[must_use]
    pub fn backend(&self) -> &BackendClient {
        &self.inner.backend
    }

    /// Get a reference to the product catalog.
    #[must_use]
    pub fn catalog(&self) -> &CatalogLoader {
        &self.inner.catalog
    }

    /// Get a reference to the session-change channel.
    #[must_use]
    pub fn events(&self) -> &SessionEvents {
        &self.inner.events
    }
}
