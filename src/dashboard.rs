//! Home page summary.

use chrono::NaiveDate;
use serde::Serialize;

use crate::api::MailApi;
use crate::config::Config;
use crate::contacts::ContactQueryOptions;
use crate::error::ApiError;
use crate::timeline::{classify, sort_dates, DateQuery, GroupOptions, TimelineGroup};
use crate::types::{ContactPage, ExtractedDate, SyncStats};

const UPCOMING_LIMIT: usize = 5;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HomeSummary {
    pub total_emails: u64,
    pub analyzed_emails: u64,
    pub unanalyzed_emails: u64,
    pub pending_actions: u64,
    pub overdue_count: usize,
    pub today_count: usize,
    pub vip_count: u64,
    /// Next dates from today on, soonest first.
    pub upcoming: Vec<ExtractedDate>,
}

impl HomeSummary {
    /// `vips` is a page of the VIP-only contact query; its `total` is the count.
    pub fn build(
        stats: &SyncStats,
        dates: &[ExtractedDate],
        vips: &ContactPage,
        today: NaiveDate,
        options: &GroupOptions,
    ) -> Self {
        let mut overdue_count = 0;
        let mut today_count = 0;
        let mut upcoming = Vec::new();

        for item in dates {
            match classify(item, today, options) {
                Some(TimelineGroup::Overdue) => overdue_count += 1,
                Some(TimelineGroup::Today) => {
                    today_count += 1;
                    upcoming.push(item.clone());
                }
                Some(TimelineGroup::Done) | None => {}
                Some(_) => upcoming.push(item.clone()),
            }
        }
        sort_dates(&mut upcoming);
        upcoming.truncate(UPCOMING_LIMIT);

        Self {
            total_emails: stats.total_emails,
            analyzed_emails: stats.analyzed_emails,
            unanalyzed_emails: stats.unanalyzed_emails(),
            pending_actions: stats.pending_actions,
            overdue_count,
            today_count,
            vip_count: vips
                .total
                .max(vips.contacts.iter().filter(|c| c.is_vip).count() as u64),
            upcoming,
        }
    }

    /// Fetch everything the home page needs and summarize it.
    pub async fn load(api: &dyn MailApi, config: &Config) -> Result<Self, ApiError> {
        let options = GroupOptions::from(&config.timeline);
        let today = config.today();

        let stats = api.sync_stats().await?;
        let dates = api.list_dates(&DateQuery::for_timeline(today, &options)).await?;
        let vips = api
            .list_contacts(&ContactQueryOptions {
                is_vip: Some(true),
                limit: 1,
                ..Default::default()
            })
            .await?;

        Ok(Self::build(&stats, &dates, &vips, today, &options))
    }
}
