use crate::services::proxy::ProxyService;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub proxy: Arc<ProxyService>,
}

impl AppState {
    pub fn new(proxy: Arc<ProxyService>) -> Self {
        Self { proxy }
    }
}
