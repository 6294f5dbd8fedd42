//! Background polling that keeps the queue cache close to the backend.
//!
//! Each refresh fetches tickets, tables and service types concurrently and
//! swaps them into the cache as one snapshot. A failed refresh keeps the
//! previous snapshot and records the error; the loop carries on.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, info, warn};

use crate::backend::{Backend, BackendError, TicketQuery};
use crate::cache::{QueueCache, QueueSnapshot};
use crate::config::RefreshConfig;
use crate::metrics;

/// Cache shared between the refresher and request handlers.
pub type SharedCache = Arc<RwLock<QueueCache>>;

/// Called after every successful refresh.
pub type RefreshCallback = Arc<dyn Fn(&RefreshSummary) + Send + Sync>;

/// What a successful refresh loaded.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct RefreshSummary {
    pub tickets: usize,
    pub tables: usize,
    pub service_types: usize,
    pub refreshed_at: DateTime<Utc>,
}

/// Refresher status for the health endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct RefreshStatus {
    pub running: bool,
    pub interval_ms: u64,
    pub last_refreshed_at: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
}

/// Polls the backend and replaces the cache snapshot.
#[derive(Clone)]
pub struct QueueRefresher {
    config: RefreshConfig,
    backend: Arc<dyn Backend>,
    cache: SharedCache,
    on_refresh: Option<RefreshCallback>,

    // Runtime state
    running: Arc<AtomicBool>,
    shutdown_tx: broadcast::Sender<()>,
}

impl QueueRefresher {
    pub fn new(config: RefreshConfig, backend: Arc<dyn Backend>, cache: SharedCache) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);

        Self {
            config,
            backend,
            cache,
            on_refresh: None,
            running: Arc::new(AtomicBool::new(false)),
            shutdown_tx,
        }
    }

    /// Register a callback run after each successful refresh.
    pub fn with_callback(mut self, callback: RefreshCallback) -> Self {
        self.on_refresh = Some(callback);
        self
    }

    pub fn cache(&self) -> &SharedCache {
        &self.cache
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    pub async fn status(&self) -> RefreshStatus {
        let cache = self.cache.read().await;
        RefreshStatus {
            running: self.is_running(),
            interval_ms: self.config.interval_ms,
            last_refreshed_at: cache.last_refreshed_at(),
            last_error: cache.last_error().map(str::to_string),
        }
    }

    /// Fetch a fresh snapshot now.
    pub async fn refresh_once(&self) -> Result<RefreshSummary, BackendError> {
        Self::refresh(&self.backend, &self.cache, self.on_refresh.as_ref()).await
    }

    /// Start polling in the background. The first refresh runs immediately.
    pub fn start(&self) {
        if self.running.swap(true, Ordering::SeqCst) {
            warn!("Queue refresher already running");
            return;
        }

        info!(
            interval_ms = self.config.interval_ms,
            backend = self.backend.name(),
            "Starting queue refresher"
        );
        self.spawn_refresh_loop();
    }

    /// Stop polling.
    pub fn stop(&self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            warn!("Queue refresher not running");
            return;
        }

        info!("Stopping queue refresher");
        let _ = self.shutdown_tx.send(());
    }

    fn spawn_refresh_loop(&self) {
        let running = Arc::clone(&self.running);
        let backend = Arc::clone(&self.backend);
        let cache = Arc::clone(&self.cache);
        let on_refresh = self.on_refresh.clone();
        let interval = Duration::from_millis(self.config.interval_ms);
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        tokio::spawn(async move {
            info!("Refresh loop started");
            let _ = Self::refresh(&backend, &cache, on_refresh.as_ref()).await;
            loop {
                tokio::select! {
                    _ = shutdown_rx.recv() => {
                        info!("Refresh loop received shutdown signal");
                        break;
                    }
                    _ = tokio::time::sleep(interval) => {
                        if !running.load(Ordering::Relaxed) {
                            break;
                        }
                        let _ = Self::refresh(&backend, &cache, on_refresh.as_ref()).await;
                    }
                }
            }
            info!("Refresh loop stopped");
        });
    }

    async fn refresh(
        backend: &Arc<dyn Backend>,
        cache: &SharedCache,
        on_refresh: Option<&RefreshCallback>,
    ) -> Result<RefreshSummary, BackendError> {
        let start = Instant::now();
        let query = TicketQuery::new();

        let fetched = futures::try_join!(
            backend.list_tickets(&query),
            backend.list_tables(),
            backend.list_service_types(),
        );

        let result = match fetched {
            Ok((tickets, tables, service_types)) => {
                let summary = RefreshSummary {
                    tickets: tickets.len(),
                    tables: tables.len(),
                    service_types: service_types.len(),
                    refreshed_at: Utc::now(),
                };
                let snapshot = QueueSnapshot {
                    tickets,
                    tables,
                    service_types,
                };
                cache
                    .write()
                    .await
                    .replace_snapshot(snapshot, summary.refreshed_at);
                debug!(
                    tickets = summary.tickets,
                    tables = summary.tables,
                    "Queue snapshot refreshed"
                );
                Ok(summary)
            }
            Err(e) => {
                warn!(error = %e, "Queue refresh failed, keeping previous snapshot");
                cache.write().await.record_error(e.to_string());
                Err(e)
            }
        };

        let label = if result.is_ok() { "success" } else { "error" };
        metrics::REFRESHES_TOTAL.with_label_values(&[label]).inc();
        metrics::REFRESH_DURATION
            .with_label_values(&[label])
            .observe(start.elapsed().as_secs_f64());

        if let (Ok(summary), Some(callback)) = (&result, on_refresh) {
            callback(summary);
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{fixtures, MockBackend};
    use std::sync::atomic::AtomicUsize;

    async fn seeded_backend() -> Arc<MockBackend> {
        let backend = Arc::new(MockBackend::new());
        let caja = fixtures::service_type("Caja", "CAJ");
        backend
            .set_tickets(vec![
                fixtures::waiting_ticket("t1", "CAJ-001", &caja.id, 10),
                fixtures::waiting_ticket("t2", "CAJ-002", &caja.id, 5),
            ])
            .await;
        backend.set_tables(vec![fixtures::table("m1", 1)]).await;
        backend.set_service_types(vec![caja]).await;
        backend
    }

    fn refresher(backend: Arc<MockBackend>, interval_ms: u64) -> QueueRefresher {
        let config = RefreshConfig {
            enabled: true,
            interval_ms,
        };
        QueueRefresher::new(config, backend, Arc::new(RwLock::new(QueueCache::new())))
    }

    #[tokio::test]
    async fn test_refresh_once_replaces_snapshot() {
        let backend = seeded_backend().await;
        let refresher = refresher(backend, 5000);

        let summary = refresher.refresh_once().await.unwrap();
        assert_eq!(summary.tickets, 2);
        assert_eq!(summary.tables, 1);
        assert_eq!(summary.service_types, 1);

        let cache = refresher.cache().read().await;
        assert_eq!(cache.tickets().len(), 2);
        assert_eq!(cache.last_refreshed_at(), Some(summary.refreshed_at));
        assert!(cache.last_error().is_none());
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_previous_snapshot() {
        let backend = seeded_backend().await;
        let refresher = refresher(Arc::clone(&backend), 5000);
        refresher.refresh_once().await.unwrap();

        backend
            .set_outage(Some(BackendError::ConnectionFailed("refused".into())))
            .await;
        assert!(refresher.refresh_once().await.is_err());

        {
            let cache = refresher.cache().read().await;
            assert_eq!(cache.tickets().len(), 2);
            assert!(cache.last_error().unwrap().contains("refused"));
        }

        backend.set_outage(None).await;
        refresher.refresh_once().await.unwrap();
        assert!(refresher.cache().read().await.last_error().is_none());
    }

    #[tokio::test]
    async fn test_callback_runs_on_success_only() {
        let backend = seeded_backend().await;
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let refresher = refresher(Arc::clone(&backend), 5000).with_callback(Arc::new(
            move |_summary: &RefreshSummary| {
                counter.fetch_add(1, Ordering::SeqCst);
            },
        ));

        refresher.refresh_once().await.unwrap();
        backend.fail_next(BackendError::Timeout).await;
        let _ = refresher.refresh_once().await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_start_polls_until_stopped() {
        let backend = seeded_backend().await;
        let refresher = refresher(Arc::clone(&backend), 20);

        refresher.start();
        assert!(refresher.is_running());
        tokio::time::sleep(Duration::from_millis(150)).await;
        refresher.stop();
        assert!(!refresher.is_running());

        let polls = backend.call_count("list_tickets").await;
        assert!(polls >= 2, "expected repeated polling, got {}", polls);

        tokio::time::sleep(Duration::from_millis(100)).await;
        let after_stop = backend.call_count("list_tickets").await;
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(backend.call_count("list_tickets").await, after_stop);
    }

    #[tokio::test]
    async fn test_status_reports_last_error() {
        let backend = seeded_backend().await;
        backend.set_outage(Some(BackendError::Timeout)).await;
        let refresher = refresher(backend, 5000);
        let _ = refresher.refresh_once().await;

        let status = refresher.status().await;
        assert!(!status.running);
        assert_eq!(status.interval_ms, 5000);
        assert!(status.last_refreshed_at.is_none());
        assert!(status.last_error.is_some());
    }
}
