pub mod analysis;
pub mod api;
pub mod config;
pub mod contacts;
pub mod dashboard;
pub mod error;
pub mod events;
pub mod onboarding;
pub mod poller;
pub mod sync;
pub mod timeline;
pub mod types;
pub mod util;
pub mod vip;

use std::sync::Arc;

use api::{HttpMailApi, MailApi};
use config::Config;
use dashboard::HomeSummary;
use poller::SyncMonitor;
use timeline::{group_dates, DateQuery, GroupOptions};

/// Headless session: print the home summary and timeline, then keep the sync
/// poller running until Ctrl-C.
pub async fn run(config: Config) -> Result<(), String> {
    let api: Arc<dyn MailApi> =
        Arc::new(HttpMailApi::from_config(&config).map_err(|e| e.to_string())?);
    let monitor = Arc::new(SyncMonitor::new());

    match HomeSummary::load(api.as_ref(), &config).await {
        Ok(summary) => log::info!(
            "{} emails ({} unanalyzed), {} pending actions, {} overdue, {} today, {} VIPs",
            summary.total_emails,
            summary.unanalyzed_emails,
            summary.pending_actions,
            summary.overdue_count,
            summary.today_count,
            summary.vip_count
        ),
        Err(e) => log::warn!("Home summary unavailable: {} ({})", e, e.recovery_suggestion()),
    }

    let today = config.today();
    let options = GroupOptions::from(&config.timeline);
    match api.list_dates(&DateQuery::for_timeline(today, &options)).await {
        Ok(dates) => {
            for group in group_dates(&dates, today, &options) {
                log::info!("{} ({})", group.label, group.items.len());
                for item in &group.items {
                    log::info!("  {} {} [{}]", item.date, item.title, item.date_type.label());
                }
            }
        }
        Err(e) => log::warn!("Timeline unavailable: {}", e),
    }

    // Spawn sync status poller
    let poller = tokio::spawn(poller::run_sync_poller(
        monitor.clone(),
        api.clone(),
        config.sync.poll_interval(),
    ));

    tokio::signal::ctrl_c()
        .await
        .map_err(|e| format!("Failed to listen for Ctrl-C: {}", e))?;
    poller.abort();
    if let Some(message) = monitor.status().message() {
        log::info!("Sync status at exit: {}", message);
    }
    Ok(())
}
