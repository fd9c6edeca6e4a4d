use std::sync::Arc;

use crate::services::images::ImageStore;
use crate::store::Store;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub images: Arc<dyn ImageStore>,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, images: Arc<dyn ImageStore>) -> Self {
        Self { store, images }
    }
}
