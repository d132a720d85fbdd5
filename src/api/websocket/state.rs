//! Shared application state

use std::sync::Arc;

use crate::config::Config;
use crate::relay::{EventRouter, PresenceManager};

/// State injected into every handler.
///
/// Handlers reach the relay only through this value; there is no global
/// socket or broadcaster.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Connection registry owner and roster publisher
    pub presence: Arc<PresenceManager>,

    /// Message and notification fan-out
    pub router: EventRouter,

    pub config: Arc<Config>,
}

impl AppState {
    /// Create state with a fresh, empty registry
    pub fn new(config: Config) -> Self {
        let presence = Arc::new(PresenceManager::new());
        Self {
            router: EventRouter::new(Arc::clone(&presence)),
            presence,
            config: Arc::new(config),
        }
    }

    /// Current roster version, for cache invalidation on the HTTP side
    pub fn roster_version(&self) -> u64 {
        self.presence.roster_version()
    }
}
