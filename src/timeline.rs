//! Timeline grouping for extracted dates.
//!
//! Partitions dates into ordered buckets relative to "today". Weeks run
//! Monday..Sunday. Each visible item lands in exactly one bucket; acknowledged,
//! hidden, snoozed and far-future items are left out.

use chrono::{Datelike, Duration, NaiveDate};
use serde::Serialize;

use crate::types::{DateType, ExtractedDate};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TimelineGroup {
    Overdue,
    Today,
    Tomorrow,
    ThisWeek,
    NextWeek,
    Later,
    /// Acknowledged items dated before today (only with `show_done`).
    Done,
}

impl TimelineGroup {
    pub const ORDER: [TimelineGroup; 7] = [
        TimelineGroup::Overdue,
        TimelineGroup::Today,
        TimelineGroup::Tomorrow,
        TimelineGroup::ThisWeek,
        TimelineGroup::NextWeek,
        TimelineGroup::Later,
        TimelineGroup::Done,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            TimelineGroup::Overdue => "Overdue",
            TimelineGroup::Today => "Today",
            TimelineGroup::Tomorrow => "Tomorrow",
            TimelineGroup::ThisWeek => "This Week",
            TimelineGroup::NextWeek => "Next Week",
            TimelineGroup::Later => "Later",
            TimelineGroup::Done => "Done",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroupOptions {
    pub show_done: bool,
    /// Days after today beyond which items are dropped. `None` keeps everything.
    pub horizon_days: Option<i64>,
}

impl Default for GroupOptions {
    fn default() -> Self {
        Self {
            show_done: false,
            horizon_days: Some(90),
        }
    }
}

impl From<&crate::config::TimelineConfig> for GroupOptions {
    fn from(config: &crate::config::TimelineConfig) -> Self {
        Self {
            show_done: config.show_done,
            horizon_days: config.horizon_days,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DateGroup {
    pub group: TimelineGroup,
    pub label: &'static str,
    pub items: Vec<ExtractedDate>,
}

/// Sunday of the week containing `day`.
pub fn end_of_week(day: NaiveDate) -> NaiveDate {
    day + Duration::days(6 - day.weekday().num_days_from_monday() as i64)
}

/// Bucket for a single item, or `None` when it is not shown.
pub fn classify(item: &ExtractedDate, today: NaiveDate, options: &GroupOptions) -> Option<TimelineGroup> {
    if item.is_hidden {
        return None;
    }
    if item.snoozed_until.is_some_and(|until| until > today) {
        return None;
    }
    if item.is_acknowledged && !options.show_done {
        return None;
    }

    let date = item.date;
    if date < today {
        return Some(if item.is_acknowledged {
            TimelineGroup::Done
        } else {
            TimelineGroup::Overdue
        });
    }

    if let Some(horizon) = options.horizon_days {
        if (date - today).num_days() > horizon {
            return None;
        }
    }

    let week_end = end_of_week(today);
    let group = if date == today {
        TimelineGroup::Today
    } else if date == today + Duration::days(1) {
        TimelineGroup::Tomorrow
    } else if date <= week_end {
        TimelineGroup::ThisWeek
    } else if date <= week_end + Duration::days(7) {
        TimelineGroup::NextWeek
    } else {
        TimelineGroup::Later
    };
    Some(group)
}

/// Ascending by date, then time with all-day items last, then title.
pub fn sort_dates(items: &mut [ExtractedDate]) {
    items.sort_by(|a, b| {
        a.date
            .cmp(&b.date)
            .then_with(|| {
                let (ta, tb) = (a.start_time(), b.start_time());
                ta.is_none().cmp(&tb.is_none()).then(ta.cmp(&tb))
            })
            .then_with(|| a.title.cmp(&b.title))
    });
}

/// Partition dates into ordered, non-empty timeline groups.
pub fn group_dates(dates: &[ExtractedDate], today: NaiveDate, options: &GroupOptions) -> Vec<DateGroup> {
    let mut buckets: Vec<Vec<ExtractedDate>> = vec![Vec::new(); TimelineGroup::ORDER.len()];

    for item in dates {
        if let Some(group) = classify(item, today, options) {
            buckets[group as usize].push(item.clone());
        }
    }

    TimelineGroup::ORDER
        .iter()
        .zip(buckets)
        .filter(|(_, items)| !items.is_empty())
        .map(|(group, mut items)| {
            sort_dates(&mut items);
            DateGroup {
                group: *group,
                label: group.label(),
                items,
            }
        })
        .collect()
}

/// Count of visible items per group, in display order (zeros included).
pub fn group_counts(
    dates: &[ExtractedDate],
    today: NaiveDate,
    options: &GroupOptions,
) -> Vec<(TimelineGroup, usize)> {
    let mut counts = [0usize; TimelineGroup::ORDER.len()];
    for item in dates {
        if let Some(group) = classify(item, today, options) {
            counts[group as usize] += 1;
        }
    }
    TimelineGroup::ORDER.iter().copied().zip(counts).collect()
}

// ---------------------------------------------------------------------------
// User actions
// ---------------------------------------------------------------------------

/// Flag change sent as `PATCH /api/dates/:id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum DateAction {
    Acknowledge,
    Snooze { until: NaiveDate },
    Hide,
}

impl DateAction {
    /// Apply the action locally, returning the updated row.
    pub fn apply(&self, item: &ExtractedDate) -> ExtractedDate {
        let mut next = item.clone();
        match self {
            DateAction::Acknowledge => next.is_acknowledged = true,
            DateAction::Snooze { until } => next.snoozed_until = Some(*until),
            DateAction::Hide => next.is_hidden = true,
        }
        next
    }
}

// ---------------------------------------------------------------------------
// GET /api/dates query
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DateQuery {
    pub date_type: Option<DateType>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub include_acknowledged: bool,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl DateQuery {
    /// Window used by the timeline page: everything overdue plus the horizon.
    pub fn for_timeline(today: NaiveDate, options: &GroupOptions) -> Self {
        Self {
            to: options
                .horizon_days
                .and_then(Duration::try_days)
                .and_then(|horizon| today.checked_add_signed(horizon)),
            include_acknowledged: options.show_done,
            ..Default::default()
        }
    }

    pub fn to_query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(t) = self.date_type {
            pairs.push(("type", t.as_str().to_string()));
        }
        if let Some(from) = self.from {
            pairs.push(("from", from.to_string()));
        }
        if let Some(to) = self.to {
            pairs.push(("to", to.to_string()));
        }
        if self.include_acknowledged {
            pairs.push(("include_acknowledged", "true".to_string()));
        }
        if let Some(page) = self.page {
            pairs.push(("page", page.max(1).to_string()));
        }
        if let Some(limit) = self.limit {
            pairs.push(("limit", limit.to_string()));
        }
        pairs
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::{make_date, ymd};
    use super::*;

    // 2026-10-14 is a Wednesday; its week ends Sunday 2026-10-18.
    fn wednesday() -> NaiveDate {
        ymd(2026, 10, 14)
    }

    fn titles(group: &DateGroup) -> Vec<&str> {
        group.items.iter().map(|d| d.title.as_str()).collect()
    }

    #[test]
    fn test_end_of_week() {
        assert_eq!(end_of_week(wednesday()), ymd(2026, 10, 18));
        assert_eq!(end_of_week(ymd(2026, 10, 18)), ymd(2026, 10, 18));
        assert_eq!(end_of_week(ymd(2026, 10, 19)), ymd(2026, 10, 25));
    }

    #[test]
    fn test_buckets_in_order() {
        let today = wednesday();
        let dates = vec![
            make_date("later", ymd(2026, 11, 20), None),
            make_date("next week", ymd(2026, 10, 21), None),
            make_date("this week", ymd(2026, 10, 17), None),
            make_date("tomorrow", ymd(2026, 10, 15), None),
            make_date("today", today, None),
            make_date("overdue", ymd(2026, 10, 1), None),
        ];
        let groups = group_dates(&dates, today, &GroupOptions::default());
        let order: Vec<TimelineGroup> = groups.iter().map(|g| g.group).collect();
        assert_eq!(
            order,
            vec![
                TimelineGroup::Overdue,
                TimelineGroup::Today,
                TimelineGroup::Tomorrow,
                TimelineGroup::ThisWeek,
                TimelineGroup::NextWeek,
                TimelineGroup::Later,
            ]
        );
        assert_eq!(groups[3].label, "This Week");
        assert_eq!(titles(&groups[4]), vec!["next week"]);
    }

    #[test]
    fn test_every_item_lands_in_exactly_one_bucket() {
        let today = wednesday();
        let mut dates = Vec::new();
        for offset in -10..40 {
            let mut d = make_date(&format!("d{}", offset), today + Duration::days(offset), None);
            d.is_acknowledged = offset % 7 == 0;
            dates.push(d);
        }
        let options = GroupOptions::default();
        let groups = group_dates(&dates, today, &options);

        let shown: usize = groups.iter().map(|g| g.items.len()).sum();
        let acknowledged = dates.iter().filter(|d| d.is_acknowledged).count();
        assert_eq!(shown, dates.len() - acknowledged);

        let mut seen = std::collections::HashSet::new();
        for group in &groups {
            for item in &group.items {
                assert!(seen.insert(item.id), "{} appears twice", item.title);
            }
        }
    }

    #[test]
    fn test_show_done_places_acknowledged_items() {
        let today = wednesday();
        let mut past = make_date("paid", ymd(2026, 10, 10), None);
        past.is_acknowledged = true;
        let mut upcoming = make_date("confirmed", ymd(2026, 10, 15), None);
        upcoming.is_acknowledged = true;
        let dates = vec![past, upcoming];

        assert!(group_dates(&dates, today, &GroupOptions::default()).is_empty());

        let options = GroupOptions {
            show_done: true,
            ..Default::default()
        };
        let groups = group_dates(&dates, today, &options);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].group, TimelineGroup::Tomorrow);
        assert_eq!(groups[1].group, TimelineGroup::Done);
    }

    #[test]
    fn test_overdue_requires_unacknowledged() {
        let today = wednesday();
        let mut item = make_date("late", ymd(2026, 10, 13), None);
        assert_eq!(classify(&item, today, &GroupOptions::default()), Some(TimelineGroup::Overdue));
        item.is_acknowledged = true;
        assert_eq!(classify(&item, today, &GroupOptions::default()), None);
    }

    #[test]
    fn test_hidden_snoozed_and_far_future_excluded() {
        let today = wednesday();
        let options = GroupOptions::default();

        let mut hidden = make_date("hidden", today, None);
        hidden.is_hidden = true;
        assert_eq!(classify(&hidden, today, &options), None);

        let mut snoozed = make_date("snoozed", today, None);
        snoozed.snoozed_until = Some(ymd(2026, 10, 16));
        assert_eq!(classify(&snoozed, today, &options), None);
        snoozed.snoozed_until = Some(today);
        assert_eq!(classify(&snoozed, today, &options), Some(TimelineGroup::Today));

        let far = make_date("far", today + Duration::days(91), None);
        assert_eq!(classify(&far, today, &options), None);
        let edge = make_date("edge", today + Duration::days(90), None);
        assert_eq!(classify(&edge, today, &options), Some(TimelineGroup::Later));
        let no_horizon = GroupOptions {
            horizon_days: None,
            ..Default::default()
        };
        assert_eq!(classify(&far, today, &no_horizon), Some(TimelineGroup::Later));
    }

    #[test]
    fn test_saturday_has_no_this_week_bucket() {
        let saturday = ymd(2026, 10, 17);
        let options = GroupOptions::default();
        let sunday = make_date("sun", ymd(2026, 10, 18), None);
        let monday = make_date("mon", ymd(2026, 10, 19), None);
        assert_eq!(classify(&sunday, saturday, &options), Some(TimelineGroup::Tomorrow));
        assert_eq!(classify(&monday, saturday, &options), Some(TimelineGroup::NextWeek));
    }

    #[test]
    fn test_sunday_tomorrow_wins_over_next_week() {
        let sunday = ymd(2026, 10, 18);
        let options = GroupOptions::default();
        let monday = make_date("mon", ymd(2026, 10, 19), None);
        let tuesday = make_date("tue", ymd(2026, 10, 20), None);
        let following_monday = make_date("mon2", ymd(2026, 10, 26), None);
        assert_eq!(classify(&monday, sunday, &options), Some(TimelineGroup::Tomorrow));
        assert_eq!(classify(&tuesday, sunday, &options), Some(TimelineGroup::NextWeek));
        assert_eq!(classify(&following_monday, sunday, &options), Some(TimelineGroup::Later));
    }

    #[test]
    fn test_sort_timed_before_all_day() {
        let today = wednesday();
        let dates = vec![
            make_date("all day", today, None),
            make_date("afternoon", today, Some("15:00")),
            make_date("morning", today, Some("09:30:00")),
        ];
        let groups = group_dates(&dates, today, &GroupOptions::default());
        assert_eq!(titles(&groups[0]), vec!["morning", "afternoon", "all day"]);
    }

    #[test]
    fn test_sort_by_date_before_time() {
        let today = wednesday();
        let dates = vec![
            make_date("b", ymd(2026, 10, 17), Some("08:00")),
            make_date("a", ymd(2026, 10, 16), None),
        ];
        let groups = group_dates(&dates, today, &GroupOptions::default());
        assert_eq!(titles(&groups[0]), vec!["a", "b"]);
    }

    #[test]
    fn test_group_counts_include_zeros() {
        let today = wednesday();
        let dates = vec![
            make_date("x", ymd(2026, 10, 1), None),
            make_date("y", ymd(2026, 10, 2), None),
            make_date("z", today, None),
        ];
        let counts = group_counts(&dates, today, &GroupOptions::default());
        assert_eq!(counts.len(), 7);
        assert_eq!(counts[0], (TimelineGroup::Overdue, 2));
        assert_eq!(counts[1], (TimelineGroup::Today, 1));
        assert_eq!(counts[5], (TimelineGroup::Later, 0));
    }

    #[test]
    fn test_date_actions() {
        let today = wednesday();
        let item = make_date("bill", today, None);
        assert!(DateAction::Acknowledge.apply(&item).is_acknowledged);
        assert!(DateAction::Hide.apply(&item).is_hidden);
        let snoozed = DateAction::Snooze { until: ymd(2026, 10, 20) }.apply(&item);
        assert_eq!(snoozed.snoozed_until, Some(ymd(2026, 10, 20)));
        assert!(!item.is_acknowledged, "original is untouched");

        let body = serde_json::to_value(DateAction::Snooze { until: ymd(2026, 10, 20) }).unwrap();
        assert_eq!(body, serde_json::json!({"action": "snooze", "until": "2026-10-20"}));
    }

    #[test]
    fn test_date_query_pairs() {
        let query = DateQuery {
            date_type: Some(DateType::PaymentDue),
            from: Some(ymd(2026, 10, 1)),
            page: Some(0),
            limit: Some(20),
            ..Default::default()
        };
        assert_eq!(
            query.to_query_pairs(),
            vec![
                ("type", "payment_due".to_string()),
                ("from", "2026-10-01".to_string()),
                ("page", "1".to_string()),
                ("limit", "20".to_string()),
            ]
        );

        let timeline = DateQuery::for_timeline(wednesday(), &GroupOptions::default());
        assert_eq!(timeline.to, Some(ymd(2027, 1, 12)));
        assert!(!timeline.include_acknowledged);
    }

    #[test]
    fn test_timeline_query_with_huge_horizon_has_no_upper_bound() {
        let options = GroupOptions {
            show_done: false,
            horizon_days: Some(200_000_000),
        };
        assert_eq!(DateQuery::for_timeline(wednesday(), &options).to, None);

        let late = make_date("Far", ymd(2200, 1, 1), None);
        assert_eq!(classify(&late, wednesday(), &options), Some(TimelineGroup::Later));
    }
}
