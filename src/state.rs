use std::sync::Arc;

use crate::config::AppConfig;
use crate::database::Repository;
use crate::storage::PhotoStorage;

/// Shared application state, built once in `main` and handed to every handler
/// through the router. Replaces any init-on-first-use globals: construction
/// order is explicit and tests can substitute pieces.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub repository: Repository,
    pub photos: Arc<dyn PhotoStorage>,
}

impl AppState {
    pub fn new(config: AppConfig, repository: Repository, photos: Arc<dyn PhotoStorage>) -> Self {
        Self {
            config: Arc::new(config),
            repository,
            photos,
        }
    }
}
