//! Event display formatting and calendar links.
//!
//! Everything here is presentation: day offsets and urgency levels only pick
//! labels and color tokens, they never drive scheduling.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime};
use serde::Serialize;

const GOOGLE_CALENDAR_RENDER_URL: &str = "https://calendar.google.com/calendar/render";

/// When an event happens. `start_time == None` means all day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventSchedule {
    pub date: NaiveDate,
    pub start_time: Option<NaiveTime>,
    pub end_date: Option<NaiveDate>,
    pub end_time: Option<NaiveTime>,
}

impl EventSchedule {
    pub fn on(date: NaiveDate) -> Self {
        Self {
            date,
            start_time: None,
            end_date: None,
            end_time: None,
        }
    }

    pub fn is_multi_day(&self) -> bool {
        self.end_date.is_some_and(|end| end != self.date)
    }

    pub fn last_day(&self) -> NaiveDate {
        self.end_date.unwrap_or(self.date).max(self.date)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventDisplay {
    pub date_display: String,
    pub time_display: String,
    pub relative_date: String,
}

/// "Sat, Oct 17", with the year when it differs from `today`'s.
pub fn format_date(date: NaiveDate, today: NaiveDate) -> String {
    if date.year() == today.year() {
        date.format("%a, %b %-d").to_string()
    } else {
        date.format("%a, %b %-d, %Y").to_string()
    }
}

/// "2:30 PM"
pub fn format_time(time: NaiveTime) -> String {
    time.format("%-I:%M %p").to_string()
}

pub fn format_event_display(schedule: &EventSchedule, today: NaiveDate) -> EventDisplay {
    let date_display = if schedule.is_multi_day() {
        format!(
            "{} - {}",
            format_date(schedule.date, today),
            format_date(schedule.last_day(), today)
        )
    } else {
        format_date(schedule.date, today)
    };

    let time_display = match (schedule.start_time, schedule.end_time) {
        (Some(start), Some(end)) => format!("{} - {}", format_time(start), format_time(end)),
        (Some(start), None) => format_time(start),
        (None, _) => "All day".to_string(),
    };

    let relative_date = if schedule.is_multi_day()
        && schedule.date < today
        && schedule.last_day() >= today
    {
        "Happening now".to_string()
    } else {
        relative_label(days_between(schedule.date, today))
    };

    EventDisplay {
        date_display,
        time_display,
        relative_date,
    }
}

/// "Today", "Tomorrow", "In 3 days", "2 days ago".
pub fn relative_label(days: i64) -> String {
    match days {
        0 => "Today".to_string(),
        1 => "Tomorrow".to_string(),
        -1 => "Yesterday".to_string(),
        d if d > 1 => format!("In {} days", d),
        d => format!("{} days ago", -d),
    }
}

/// Signed day offset of `date` relative to `today`.
pub fn days_between(date: NaiveDate, today: NaiveDate) -> i64 {
    (date - today).num_days()
}

/// Parse a `YYYY-MM-DD` string (a trailing time part is ignored).
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    let day = value.get(..10).unwrap_or(value);
    NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
}

pub fn calculate_days_from(date: &str, today: NaiveDate) -> Option<i64> {
    parse_date(date).map(|d| days_between(d, today))
}

/// Day offset from the local calendar date. `None` for unparseable input.
pub fn calculate_days_from_now(date: &str) -> Option<i64> {
    calculate_days_from(date, chrono::Local::now().date_naive())
}

// ---------------------------------------------------------------------------
// Deadline urgency
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UrgencyLevel {
    Past,
    Critical,
    Urgent,
    Normal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeadlineUrgency {
    pub level: UrgencyLevel,
    pub color: &'static str,
    pub label: String,
}

pub fn get_deadline_urgency(days: i64) -> DeadlineUrgency {
    match days {
        d if d < 0 => DeadlineUrgency {
            level: UrgencyLevel::Past,
            color: "gray",
            label: "Past due".to_string(),
        },
        0 => DeadlineUrgency {
            level: UrgencyLevel::Critical,
            color: "red",
            label: "Due today".to_string(),
        },
        1 => DeadlineUrgency {
            level: UrgencyLevel::Urgent,
            color: "orange",
            label: "Due tomorrow".to_string(),
        },
        2..=3 => DeadlineUrgency {
            level: UrgencyLevel::Urgent,
            color: "orange",
            label: format!("Due in {} days", days),
        },
        _ => DeadlineUrgency {
            level: UrgencyLevel::Normal,
            color: "blue",
            label: format!("Due in {} days", days),
        },
    }
}

// ---------------------------------------------------------------------------
// Google Calendar link
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct CalendarLink<'a> {
    pub title: &'a str,
    pub schedule: EventSchedule,
    pub location: Option<&'a str>,
    pub details: Option<&'a str>,
    /// IANA timezone for timed events (`ctz` parameter).
    pub timezone: Option<&'a str>,
}

/// `dates` parameter: `YYYYMMDDTHHMMSS/YYYYMMDDTHHMMSS`, or `YYYYMMDD/YYYYMMDD`
/// with an exclusive end for all-day events.
pub fn calendar_dates_param(schedule: &EventSchedule) -> String {
    match schedule.start_time {
        None => {
            let end = schedule.last_day() + Duration::days(1);
            format!("{}/{}", schedule.date.format("%Y%m%d"), end.format("%Y%m%d"))
        }
        Some(start_time) => {
            let start = NaiveDateTime::new(schedule.date, start_time);
            let end = schedule
                .end_time
                .map(|t| NaiveDateTime::new(schedule.last_day(), t))
                .filter(|end| *end > start)
                .unwrap_or(start + Duration::hours(1));
            format!(
                "{}/{}",
                start.format("%Y%m%dT%H%M%S"),
                end.format("%Y%m%dT%H%M%S")
            )
        }
    }
}

pub fn google_calendar_url(link: &CalendarLink<'_>) -> String {
    let mut query = url::form_urlencoded::Serializer::new(String::new());
    query.append_pair("action", "TEMPLATE");
    query.append_pair("text", link.title);
    query.append_pair("dates", &calendar_dates_param(&link.schedule));
    if let Some(location) = link.location.filter(|l| !l.trim().is_empty()) {
        query.append_pair("location", location);
    }
    if let Some(details) = link.details.filter(|d| !d.trim().is_empty()) {
        query.append_pair("details", details);
    }
    if link.schedule.start_time.is_some() {
        if let Some(tz) = link.timezone {
            query.append_pair("ctz", tz);
        }
    }
    format!("{}?{}", GOOGLE_CALENDAR_RENDER_URL, query.finish())
}
