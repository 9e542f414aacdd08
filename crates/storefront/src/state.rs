//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::StorefrontConfig;
use crate::services::auth::SessionKeys;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like database connections and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    pool: PgPool,
    session_keys: SessionKeys,
}

impl AppState {
    /// Create a new application state.
    ///
    /// Session signing keys are derived from the configured secret.
    #[must_use]
    pub fn new(config: StorefrontConfig, pool: PgPool) -> Self {
        let session_keys = SessionKeys::new(&config.session_secret, config.session_max_age);

        Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                session_keys,
            }),
        }
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Get the session token keys.
    #[must_use]
    pub fn session_keys(&self) -> &SessionKeys {
        &self.inner.session_keys
    }
}
