use std::sync::Arc;
use turnos_core::{
    Backend, BoardLimits, Config, QueueRefresher, RefreshSummary, SanitizedConfig, SharedCache,
};

use crate::api::WsBroadcaster;

/// Shared application state
pub struct AppState {
    config: Config,
    backend: Arc<dyn Backend>,
    refresher: QueueRefresher,
    ws_broadcaster: WsBroadcaster,
}

impl AppState {
    pub fn new(
        config: Config,
        backend: Arc<dyn Backend>,
        refresher: QueueRefresher,
        ws_broadcaster: WsBroadcaster,
    ) -> Self {
        // Every successful refresh is pushed to connected boards.
        let broadcaster = ws_broadcaster.clone();
        let refresher = refresher.with_callback(Arc::new(move |summary: &RefreshSummary| {
            broadcaster.snapshot_refreshed(summary)
        }));

        Self {
            config,
            backend,
            refresher,
            ws_broadcaster,
        }
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    pub fn board_limits(&self) -> &BoardLimits {
        &self.config.boards
    }

    pub fn backend(&self) -> &dyn Backend {
        self.backend.as_ref()
    }

    /// Queue cache, shared with the refresher.
    pub fn cache(&self) -> &SharedCache {
        self.refresher.cache()
    }

    pub fn refresher(&self) -> &QueueRefresher {
        &self.refresher
    }

    pub fn ws_broadcaster(&self) -> &WsBroadcaster {
        &self.ws_broadcaster
    }
}
