//! Shared application state handed to every handler.

use crate::config::AppConfig;
use brands_core::BrandService;
use std::sync::Arc;

/// Per-process state. Cloned into each request; clones share the pool.
#[derive(Clone)]
pub struct AppState {
    pub brands: BrandService,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(brands: BrandService, config: AppConfig) -> Self {
        Self {
            brands,
            config: Arc::new(config),
        }
    }
}
