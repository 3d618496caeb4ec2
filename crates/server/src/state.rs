//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::ServerConfig;
use crate::notify::Notifiers;
use crate::registry::UserRegistry;
use crate::store::ShiftStore;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc`. The store and notifiers are
/// picked once at startup and never re-evaluated per request.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ServerConfig,
    store: Arc<dyn ShiftStore>,
    registry: UserRegistry,
    notifiers: Notifiers,
}

impl AppState {
    /// Create a new application state with an empty user registry.
    #[must_use]
    pub fn new(config: ServerConfig, store: Arc<dyn ShiftStore>, notifiers: Notifiers) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                store,
                registry: UserRegistry::new(),
                notifiers,
            }),
        }
    }

    /// Get a reference to the server configuration.
    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.inner.config
    }

    /// Get the shift store.
    #[must_use]
    pub fn store(&self) -> &dyn ShiftStore {
        self.inner.store.as_ref()
    }

    /// Get the user registry.
    #[must_use]
    pub fn registry(&self) -> &UserRegistry {
        &self.inner.registry
    }

    /// Get the notification dispatchers.
    #[must_use]
    pub fn notifiers(&self) -> &Notifiers {
        &self.inner.notifiers
    }
}
