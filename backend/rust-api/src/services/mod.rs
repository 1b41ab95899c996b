use std::sync::Arc;

use crate::config::Config;
use crate::store::DataStore;

pub mod achievement_service;
pub mod auth_service;
pub mod progression;

/// Shared application state: configuration plus the injected persistence
/// handle. Constructed once at startup (or per test) and shared by
/// reference; there is no global client.
pub struct AppState {
    pub config: Config,
    pub store: Arc<dyn DataStore>,
}

impl AppState {
    pub fn new(config: Config, store: Arc<dyn DataStore>) -> Self {
        Self { config, store }
    }
}
