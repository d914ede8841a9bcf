//! Shared request-handler state.

use std::sync::Arc;

use crate::config::ShareConfig;

/// Immutable configuration handed to every handler. Cloning is an `Arc`
/// bump; nothing behind it can be mutated after startup.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ShareConfig>,
}

impl AppState {
    pub fn new(config: ShareConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    pub fn token(&self) -> &str {
        &self.config.token
    }
}
