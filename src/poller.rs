//! Background sync status poller and manual sync trigger.
//!
//! The poller re-reads aggregate counts on a fixed interval and whenever a
//! manual sync wakes it. Status transitions all go through `SyncStatus::apply`.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use thiserror::Error;
use tokio::sync::Notify;

use crate::api::MailApi;
use crate::error::ApiError;
use crate::sync::{InvalidTransition, SyncEvent, SyncRequest, SyncStatus, SyncSummary};
use crate::types::SyncStats;

#[derive(Debug, Error)]
pub enum SyncTriggerError {
    #[error("A sync is already running")]
    SyncAlreadyRunning,

    #[error("Sync failed: {0}")]
    Failed(String),

    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Shared sync state for the banner.
pub struct SyncMonitor {
    status: Mutex<SyncStatus>,
    stats: Mutex<Option<SyncStats>>,
    /// Bumped on every `Started`; a pending revert only fires if it still matches.
    generation: AtomicU64,
    restored: AtomicBool,
    wake: Notify,
}

impl Default for SyncMonitor {
    fn default() -> Self {
        Self::new()
    }
}

impl SyncMonitor {
    pub fn new() -> Self {
        Self {
            status: Mutex::new(SyncStatus::NeverSynced),
            stats: Mutex::new(None),
            generation: AtomicU64::new(0),
            restored: AtomicBool::new(false),
            wake: Notify::new(),
        }
    }

    pub fn status(&self) -> SyncStatus {
        self.status.lock().clone()
    }

    pub fn stats(&self) -> Option<SyncStats> {
        self.stats.lock().clone()
    }

    /// Wake the poller for an immediate refresh.
    pub fn wake(&self) {
        self.wake.notify_one();
    }

    fn apply(&self, event: SyncEvent) -> Result<SyncStatus, InvalidTransition> {
        let mut status = self.status.lock();
        let next = status.apply(event)?;
        *status = next.clone();
        Ok(next)
    }

    /// Mark a sync as started. Returns its generation.
    fn begin(&self) -> Result<u64, SyncTriggerError> {
        let mut status = self.status.lock();
        *status = status
            .apply(SyncEvent::Started)
            .map_err(|_| SyncTriggerError::SyncAlreadyRunning)?;
        Ok(self.generation.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// The generation is compared under the status lock, the same lock
    /// `begin` bumps it under.
    fn revert_if_current(&self, generation: u64) {
        let mut status = self.status.lock();
        if self.generation.load(Ordering::SeqCst) != generation {
            log::debug!("Sync poller: dropping stale revert for generation {}", generation);
            return;
        }
        match status.apply(SyncEvent::Reverted) {
            Ok(next) => *status = next,
            Err(e) => log::debug!("Sync poller: revert skipped: {}", e),
        }
    }

    /// Fetch aggregate counts. On the first successful fetch the banner state
    /// is restored from the latest sync log row.
    pub async fn refresh_stats(&self, api: &dyn MailApi) -> Result<(), ApiError> {
        let stats = api.sync_stats().await?;

        if !self.restored.swap(true, Ordering::SeqCst) {
            let mut status = self.status.lock();
            if *status == SyncStatus::NeverSynced {
                *status = SyncStatus::from_last_log(stats.last_sync.as_ref());
            }
        }

        *self.stats.lock() = Some(stats);
        Ok(())
    }
}

/// Run one manual sync.
///
/// Rejected while another sync is in flight. After success the banner reverts
/// to idle once `revert_after` has passed, unless a newer sync started.
pub async fn trigger_sync(
    monitor: Arc<SyncMonitor>,
    api: &dyn MailApi,
    request: &SyncRequest,
    revert_after: Duration,
) -> Result<SyncSummary, SyncTriggerError> {
    let generation = monitor.begin()?;
    log::info!("Sync poller: manual sync started (generation {})", generation);

    let result = match api.sync_emails(request).await {
        Ok(response) => match response.error.clone() {
            Some(message) => Err(SyncTriggerError::Failed(message)),
            None => Ok(SyncSummary::from_response(&response)),
        },
        Err(e) => Err(SyncTriggerError::Api(e)),
    };

    let event = match &result {
        Ok(summary) => SyncEvent::Completed(summary.clone()),
        Err(SyncTriggerError::Failed(message)) => SyncEvent::Failed(message.clone()),
        Err(e) => SyncEvent::Failed(e.to_string()),
    };
    if let Err(e) = monitor.apply(event) {
        log::warn!("Sync poller: {}", e);
    }
    monitor.wake();

    match &result {
        Ok(summary) => {
            log::info!("Sync poller: {}", summary.message());
            let monitor = Arc::clone(&monitor);
            tokio::spawn(async move {
                tokio::time::sleep(revert_after).await;
                monitor.revert_if_current(generation);
            });
        }
        Err(e) => log::warn!("Sync poller: manual sync failed: {}", e),
    }

    result
}

/// Refresh sync counts forever. Spawn once per session.
pub async fn run_sync_poller(monitor: Arc<SyncMonitor>, api: Arc<dyn MailApi>, interval: Duration) {
    loop {
        if let Err(e) = monitor.refresh_stats(api.as_ref()).await {
            log::warn!("Sync poller: failed to fetch sync status: {}", e);
        }

        // Sleep until next poll or manual wake
        tokio::select! {
            _ = tokio::time::sleep(interval) => {},
            _ = monitor.wake.notified() => {
                log::debug!("Sync poller: woken by manual sync");
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    use crate::api::test_utils::FakeMailApi;
    use crate::sync::{SyncAnalysis, SyncResponse, SyncTotals};
    use crate::types::{SyncLog, SyncLogStatus};

    const REVERT: Duration = Duration::from_secs(4);

    fn response(created: u32, analyzed: u32, actions: u32) -> SyncResponse {
        SyncResponse {
            totals: SyncTotals {
                total_created: created,
                ..Default::default()
            },
            analysis: SyncAnalysis {
                success_count: analyzed,
                actions_created: actions,
                ..Default::default()
            },
            error: None,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_then_revert() {
        let monitor = Arc::new(SyncMonitor::new());
        let api = FakeMailApi::default();
        api.set_sync_response(response(5, 3, 2));

        let summary = trigger_sync(monitor.clone(), &api, &SyncRequest::default(), REVERT)
            .await
            .unwrap();
        assert_eq!(summary.message(), "5 new emails, 3 analyzed, 2 actions found");
        assert_eq!(
            monitor.status().message().as_deref(),
            Some("5 new emails, 3 analyzed, 2 actions found")
        );

        tokio::time::sleep(Duration::from_millis(3_900)).await;
        assert!(matches!(monitor.status(), SyncStatus::Success(_)));
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(monitor.status(), SyncStatus::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_sets_error_without_revert() {
        let monitor = Arc::new(SyncMonitor::new());
        let api = FakeMailApi::default();
        api.fail_sync(500, "Gmail quota exceeded");

        let err = trigger_sync(monitor.clone(), &api, &SyncRequest::default(), REVERT)
            .await
            .unwrap_err();
        assert!(matches!(err, SyncTriggerError::Api(_)));
        assert_eq!(
            monitor.status(),
            SyncStatus::Error("Server error 500: Gmail quota exceeded".to_string())
        );

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert!(matches!(monitor.status(), SyncStatus::Error(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_error_in_response_body() {
        let monitor = Arc::new(SyncMonitor::new());
        let api = FakeMailApi::default();
        let mut body = response(0, 0, 0);
        body.error = Some("Gmail not connected".to_string());
        api.set_sync_response(body);

        let err = trigger_sync(monitor.clone(), &api, &SyncRequest::default(), REVERT)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Sync failed: Gmail not connected");
        assert_eq!(monitor.status(), SyncStatus::Error("Gmail not connected".to_string()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_trigger_rejected_while_syncing() {
        let monitor = Arc::new(SyncMonitor::new());
        let api = Arc::new(FakeMailApi::default());
        api.set_sync_delay(Duration::from_secs(10));

        let first = {
            let monitor = monitor.clone();
            let api = api.clone();
            tokio::spawn(async move {
                trigger_sync(monitor, api.as_ref(), &SyncRequest::default(), REVERT).await
            })
        };
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(monitor.status(), SyncStatus::Syncing);

        let err = trigger_sync(monitor.clone(), api.as_ref(), &SyncRequest::default(), REVERT)
            .await
            .unwrap_err();
        assert!(matches!(err, SyncTriggerError::SyncAlreadyRunning));

        first.await.unwrap().unwrap();
        assert_eq!(api.sync_calls(), 1);
        assert_eq!(monitor.status().message().as_deref(), Some("No new emails"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_revert_does_not_clobber_newer_sync() {
        let monitor = Arc::new(SyncMonitor::new());
        let api = FakeMailApi::default();
        api.set_sync_response(response(1, 0, 0));
        trigger_sync(monitor.clone(), &api, &SyncRequest::default(), REVERT)
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_secs(2)).await;
        api.set_sync_response(response(2, 0, 0));
        trigger_sync(monitor.clone(), &api, &SyncRequest::default(), REVERT)
            .await
            .unwrap();

        // First sync's revert is due at 4s; the second one's at 6s.
        tokio::time::sleep(Duration::from_millis(2_500)).await;
        assert_eq!(
            monitor.status().message().as_deref(),
            Some("2 new emails, 0 analyzed, 0 actions found")
        );
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(monitor.status(), SyncStatus::Idle);
    }

    #[test]
    fn test_revert_only_applies_to_latest_generation() {
        let monitor = SyncMonitor::new();
        let first = monitor.begin().unwrap();
        monitor.apply(SyncEvent::Completed(SyncSummary::default())).unwrap();
        let second = monitor.begin().unwrap();
        assert_eq!(second, first + 1);
        monitor
            .apply(SyncEvent::Completed(SyncSummary {
                new_emails: 2,
                ..Default::default()
            }))
            .unwrap();

        monitor.revert_if_current(first);
        assert!(matches!(monitor.status(), SyncStatus::Success(ref s) if s.new_emails == 2));

        monitor.revert_if_current(second);
        assert_eq!(monitor.status(), SyncStatus::Idle);

        // Nothing to revert once idle.
        monitor.revert_if_current(second);
        assert_eq!(monitor.status(), SyncStatus::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_poller_refreshes_on_interval_and_wake() {
        let monitor = Arc::new(SyncMonitor::new());
        let api = Arc::new(FakeMailApi::default());
        api.set_stats(SyncStats {
            total_emails: 10,
            ..Default::default()
        });

        let handle = tokio::spawn(run_sync_poller(
            monitor.clone(),
            api.clone(),
            Duration::from_secs(30),
        ));
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(monitor.stats().map(|s| s.total_emails), Some(10));

        api.set_stats(SyncStats {
            total_emails: 20,
            ..Default::default()
        });
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(monitor.stats().map(|s| s.total_emails), Some(20));

        api.set_stats(SyncStats {
            total_emails: 30,
            ..Default::default()
        });
        monitor.wake();
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(monitor.stats().map(|s| s.total_emails), Some(30));

        handle.abort();
    }

    #[tokio::test]
    async fn test_restore_from_failed_log() {
        let monitor = SyncMonitor::new();
        let api = FakeMailApi::default();
        api.set_stats(SyncStats {
            last_sync: Some(SyncLog {
                id: Uuid::new_v4(),
                status: SyncLogStatus::Failed,
                started_at: Utc::now(),
                completed_at: None,
                emails_fetched: 0,
                emails_created: 0,
                error_message: Some("Token revoked".to_string()),
            }),
            ..Default::default()
        });

        monitor.refresh_stats(&api).await.unwrap();
        assert_eq!(monitor.status(), SyncStatus::Error("Token revoked".to_string()));

        // Later refreshes leave the live status alone.
        api.set_stats(SyncStats::default());
        monitor.refresh_stats(&api).await.unwrap();
        assert_eq!(monitor.status(), SyncStatus::Error("Token revoked".to_string()));
    }

    #[tokio::test]
    async fn test_never_synced_stays_without_log() {
        let monitor = SyncMonitor::new();
        let api = FakeMailApi::default();
        monitor.refresh_stats(&api).await.unwrap();
        assert_eq!(monitor.status(), SyncStatus::NeverSynced);
        assert_eq!(monitor.status().message().as_deref(), Some("Not synced yet"));
    }
}
