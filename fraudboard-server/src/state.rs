//! Application state shared across handlers

use std::sync::Arc;

use fraudboard_core::Dashboard;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    dashboard: Dashboard,
}

impl AppState {
    pub fn new(dashboard: Dashboard) -> Self {
        Self {
            inner: Arc::new(AppStateInner { dashboard }),
        }
    }

    pub fn dashboard(&self) -> &Dashboard {
        &self.inner.dashboard
    }
}
