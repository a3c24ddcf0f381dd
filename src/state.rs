use std::sync::Arc;

use crate::config::AppConfig;
use crate::storage::{DocumentStore, LocalDocumentStore};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn DocumentStore>,
}

impl AppState {
    pub fn new(config: &AppConfig) -> Self {
        let store = LocalDocumentStore::new(config.storage_dir.clone());
        Self::with_store(Arc::new(store))
    }

    pub fn with_store(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }
}
