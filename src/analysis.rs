//! AI analysis normalization.
//!
//! The analysis service stores one JSON blob per email. This module is the
//! only place that blob is read: `EmailAnalysis::parse` turns it into typed
//! results, and anything malformed fails here with the section and field
//! named instead of surfacing as a blank card somewhere in the UI.
//!
//! Section and field keys are accepted in snake_case or camelCase. A missing
//! (or `null`) section is simply absent; a present section must be valid.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use uuid::Uuid;

use crate::events::{parse_date, CalendarLink, EventSchedule};
use crate::types::{DateType, ExtractedDate, SignalStrength};
use crate::util::parse_clock_time;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum AnalysisError {
    #[error("analysis is not a JSON object")]
    NotAnObject,
    #[error("{section}: {message}")]
    Malformed {
        section: &'static str,
        message: String,
    },
    #[error("{section}.{field}: {message}")]
    InvalidField {
        section: &'static str,
        field: &'static str,
        message: String,
    },
}

fn invalid(section: &'static str, field: &'static str, message: impl Into<String>) -> AnalysisError {
    AnalysisError::InvalidField {
        section,
        field,
        message: message.into(),
    }
}

// ============================================================================
// Public types
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplyWorthiness {
    MustReply,
    ShouldReply,
    OptionalReply,
    NoReply,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Categorization {
    pub category: String,
    pub signal_strength: Option<SignalStrength>,
    pub reply_worthiness: Option<ReplyWorthiness>,
    pub summary: Option<String>,
    pub labels: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtractedAction {
    pub title: String,
    pub action_type: Option<String>,
    /// 1 (low) ..= 10 (drop everything)
    pub urgency: Option<u8>,
    pub deadline: Option<NaiveDate>,
    pub estimated_minutes: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocationType {
    InPerson,
    Virtual,
    Hybrid,
    #[default]
    #[serde(other)]
    Unknown,
}

/// Where the event is relative to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventLocality {
    Local,
    OutOfTown,
    Virtual,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum EventCost {
    Free,
    Amount(f64),
    Text(String),
}

impl EventCost {
    fn from_value(value: &Value) -> Result<Option<Self>, AnalysisError> {
        match value {
            Value::Null => Ok(None),
            Value::Number(n) => match n.as_f64() {
                Some(v) if v < 0.0 => Err(invalid("event_detection", "cost", "negative amount")),
                Some(v) if v == 0.0 => Ok(Some(EventCost::Free)),
                Some(v) => Ok(Some(EventCost::Amount(v))),
                None => Err(invalid("event_detection", "cost", "not a finite number")),
            },
            Value::String(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    return Ok(None);
                }
                if trimmed.eq_ignore_ascii_case("free") {
                    return Ok(Some(EventCost::Free));
                }
                let numeric = trimmed.trim_start_matches('$').replace(',', "");
                match numeric.parse::<f64>() {
                    Ok(v) if v == 0.0 => Ok(Some(EventCost::Free)),
                    Ok(v) if v > 0.0 => Ok(Some(EventCost::Amount(v))),
                    _ => Ok(Some(EventCost::Text(trimmed.to_string()))),
                }
            }
            other => Err(invalid(
                "event_detection",
                "cost",
                format!("expected number or string, got {}", other),
            )),
        }
    }
}

/// One event detected in an email. Derived on every read, never stored.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventDetectionResult {
    pub title: String,
    pub date: NaiveDate,
    pub start_time: Option<NaiveTime>,
    pub end_date: Option<NaiveDate>,
    pub end_time: Option<NaiveTime>,
    pub location: Option<String>,
    pub location_type: LocationType,
    pub locality: Option<EventLocality>,
    pub rsvp_required: bool,
    pub rsvp_deadline: Option<NaiveDate>,
    pub cost: Option<EventCost>,
    pub registration_url: Option<String>,
    pub description: Option<String>,
    pub confidence: Option<f64>,
}

impl EventDetectionResult {
    pub fn schedule(&self) -> EventSchedule {
        EventSchedule {
            date: self.date,
            start_time: self.start_time,
            end_date: self.end_date,
            end_time: self.end_time,
        }
    }

    pub fn calendar_link<'a>(&'a self, timezone: Option<&'a str>) -> CalendarLink<'a> {
        CalendarLink {
            title: &self.title,
            schedule: self.schedule(),
            location: self.location.as_deref(),
            details: self.description.as_deref(),
            timezone,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EventDetection {
    NoEvent,
    Event(EventDetectionResult),
}

impl EventDetection {
    pub fn event(&self) -> Option<&EventDetectionResult> {
        match self {
            EventDetection::Event(e) => Some(e),
            EventDetection::NoEvent => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DateCandidate {
    pub date_type: DateType,
    pub date: NaiveDate,
    pub time: Option<NaiveTime>,
    pub title: String,
    pub description: Option<String>,
    pub is_recurring: bool,
    pub recurrence_pattern: Option<String>,
    pub confidence: Option<f64>,
}

impl DateCandidate {
    /// Unsaved timeline row for previewing what extraction would add.
    pub fn to_extracted_date(&self, email_id: Option<Uuid>) -> ExtractedDate {
        ExtractedDate {
            id: Uuid::new_v4(),
            date_type: self.date_type,
            date: self.date,
            time: self.time.map(|t| t.format("%H:%M:%S").to_string()),
            title: self.title.clone(),
            description: self.description.clone(),
            is_acknowledged: false,
            is_recurring: self.is_recurring,
            recurrence_pattern: self.recurrence_pattern.clone(),
            email_id,
            contact: None,
            is_hidden: false,
            snoozed_until: None,
            confidence: self.confidence,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct DateExtractionResult {
    pub dates: Vec<DateCandidate>,
}

/// Typed view of an email's analysis blob.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct EmailAnalysis {
    pub categorization: Option<Categorization>,
    pub actions: Option<Vec<ExtractedAction>>,
    pub event: Option<EventDetection>,
    pub dates: Option<DateExtractionResult>,
}

impl EmailAnalysis {
    pub fn parse(value: &Value) -> Result<Self, AnalysisError> {
        let obj = value.as_object().ok_or(AnalysisError::NotAnObject)?;

        let categorization = section::<RawCategorization>(obj, "categorization", &["categorization"])?
            .map(normalize_categorization)
            .transpose()?;
        let actions = section::<RawActionExtraction>(
            obj,
            "action_extraction",
            &["action_extraction", "actionExtraction"],
        )?
        .map(normalize_actions)
        .transpose()?;
        let event = section::<RawEventDetection>(
            obj,
            "event_detection",
            &["event_detection", "eventDetection"],
        )?
        .map(normalize_event)
        .transpose()?;
        let dates = section::<RawDateExtraction>(
            obj,
            "date_extraction",
            &["date_extraction", "dateExtraction"],
        )?
        .map(normalize_dates)
        .transpose()?;

        Ok(Self {
            categorization,
            actions,
            event,
            dates,
        })
    }

    pub fn detected_event(&self) -> Option<&EventDetectionResult> {
        self.event.as_ref().and_then(EventDetection::event)
    }
}

// ============================================================================
// Raw shapes (as emitted by the model)
// ============================================================================

fn section<T: serde::de::DeserializeOwned>(
    obj: &Map<String, Value>,
    name: &'static str,
    keys: &[&str],
) -> Result<Option<T>, AnalysisError> {
    let Some(raw) = keys.iter().find_map(|k| obj.get(*k)) else {
        return Ok(None);
    };
    if raw.is_null() {
        return Ok(None);
    }
    if !raw.is_object() {
        return Err(AnalysisError::Malformed {
            section: name,
            message: format!("expected an object, got {}", raw),
        });
    }
    serde_json::from_value(raw.clone())
        .map(Some)
        .map_err(|e| AnalysisError::Malformed {
            section: name,
            message: e.to_string(),
        })
}

#[derive(Debug, Deserialize)]
struct RawCategorization {
    #[serde(default)]
    category: Option<String>,
    #[serde(default, alias = "signalStrength")]
    signal_strength: Option<String>,
    #[serde(default, alias = "replyWorthiness")]
    reply_worthiness: Option<String>,
    #[serde(default)]
    summary: Option<String>,
    #[serde(default)]
    labels: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RawActionExtraction {
    #[serde(default, alias = "hasAction")]
    has_action: bool,
    #[serde(default)]
    actions: Vec<RawAction>,
}

#[derive(Debug, Deserialize)]
struct RawAction {
    #[serde(default)]
    title: Option<String>,
    #[serde(default, rename = "type", alias = "action_type", alias = "actionType")]
    action_type: Option<String>,
    #[serde(default, alias = "urgencyScore", alias = "urgency_score")]
    urgency: Option<i64>,
    #[serde(default)]
    deadline: Option<String>,
    #[serde(default, alias = "estimatedMinutes")]
    estimated_minutes: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct RawEventDetection {
    #[serde(default, alias = "hasEvent")]
    has_event: bool,
    #[serde(default, alias = "eventTitle")]
    event_title: Option<String>,
    #[serde(default, alias = "eventDate")]
    event_date: Option<String>,
    #[serde(default, alias = "eventTime")]
    event_time: Option<String>,
    #[serde(default, alias = "eventEndDate")]
    event_end_date: Option<String>,
    #[serde(default, alias = "eventEndTime")]
    event_end_time: Option<String>,
    #[serde(default)]
    location: Option<String>,
    #[serde(default, alias = "locationType")]
    location_type: Option<LocationType>,
    #[serde(default, alias = "eventLocality")]
    event_locality: Option<String>,
    #[serde(default, alias = "rsvpRequired")]
    rsvp_required: bool,
    #[serde(default, alias = "rsvpDeadline")]
    rsvp_deadline: Option<String>,
    #[serde(default)]
    cost: Value,
    #[serde(default, alias = "registrationUrl")]
    registration_url: Option<String>,
    #[serde(default, alias = "eventSummary")]
    description: Option<String>,
    #[serde(default)]
    confidence: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct RawDateExtraction {
    #[serde(default, alias = "hasDates")]
    has_dates: bool,
    #[serde(default)]
    dates: Vec<RawDate>,
}

#[derive(Debug, Deserialize)]
struct RawDate {
    #[serde(default, alias = "dateType")]
    date_type: Option<String>,
    #[serde(default)]
    date: Option<String>,
    #[serde(default)]
    time: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default, alias = "isRecurring")]
    is_recurring: bool,
    #[serde(default, alias = "recurrencePattern")]
    recurrence_pattern: Option<String>,
    #[serde(default)]
    confidence: Option<f64>,
}

// ============================================================================
// Normalization
// ============================================================================

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

fn required_date(section: &'static str, field: &'static str, value: Option<String>) -> Result<NaiveDate, AnalysisError> {
    let raw = non_empty(value).ok_or_else(|| invalid(section, field, "missing"))?;
    parse_date(&raw).ok_or_else(|| invalid(section, field, format!("'{}' is not YYYY-MM-DD", raw)))
}

fn optional_date(section: &'static str, field: &'static str, value: Option<String>) -> Result<Option<NaiveDate>, AnalysisError> {
    match non_empty(value) {
        None => Ok(None),
        Some(raw) => parse_date(&raw)
            .map(Some)
            .ok_or_else(|| invalid(section, field, format!("'{}' is not YYYY-MM-DD", raw))),
    }
}

/// `14:30`, `14:30:00`, or `2:30 PM`.
fn optional_time(section: &'static str, field: &'static str, value: Option<String>) -> Result<Option<NaiveTime>, AnalysisError> {
    match non_empty(value) {
        None => Ok(None),
        Some(raw) => parse_clock_time(&raw)
            .or_else(|| NaiveTime::parse_from_str(&raw.to_uppercase(), "%I:%M %p").ok())
            .map(Some)
            .ok_or_else(|| invalid(section, field, format!("'{}' is not a time", raw))),
    }
}

fn check_confidence(section: &'static str, value: Option<f64>) -> Result<Option<f64>, AnalysisError> {
    match value {
        Some(c) if !(0.0..=1.0).contains(&c) => {
            Err(invalid(section, "confidence", format!("{} is outside 0..1", c)))
        }
        other => Ok(other),
    }
}

fn normalize_categorization(raw: RawCategorization) -> Result<Categorization, AnalysisError> {
    const SECTION: &str = "categorization";

    let signal_strength = match non_empty(raw.signal_strength) {
        None => None,
        Some(s) => Some(
            serde_json::from_value::<SignalStrength>(Value::String(s.to_lowercase()))
                .map_err(|_| invalid(SECTION, "signal_strength", format!("unknown tier '{}'", s)))?,
        ),
    };
    let reply_worthiness = match non_empty(raw.reply_worthiness) {
        None => None,
        Some(s) => Some(
            serde_json::from_value::<ReplyWorthiness>(Value::String(s.to_lowercase()))
                .map_err(|_| invalid(SECTION, "reply_worthiness", format!("unknown value '{}'", s)))?,
        ),
    };

    Ok(Categorization {
        category: non_empty(raw.category).unwrap_or_else(|| "uncategorized".to_string()),
        signal_strength,
        reply_worthiness,
        summary: non_empty(raw.summary),
        labels: raw
            .labels
            .into_iter()
            .map(|l| l.trim().to_lowercase())
            .filter(|l| !l.is_empty())
            .collect(),
    })
}

fn normalize_actions(raw: RawActionExtraction) -> Result<Vec<ExtractedAction>, AnalysisError> {
    const SECTION: &str = "action_extraction";
    if !raw.has_action {
        return Ok(Vec::new());
    }

    raw.actions
        .into_iter()
        .map(|a| -> Result<ExtractedAction, AnalysisError> {
            let title = non_empty(a.title).ok_or_else(|| invalid(SECTION, "title", "missing"))?;
            let urgency = match a.urgency {
                None => None,
                Some(u) if (1..=10).contains(&u) => Some(u as u8),
                Some(u) => return Err(invalid(SECTION, "urgency", format!("{} is outside 1..10", u))),
            };
            Ok(ExtractedAction {
                title,
                action_type: non_empty(a.action_type),
                urgency,
                deadline: optional_date(SECTION, "deadline", a.deadline)?,
                estimated_minutes: a.estimated_minutes,
            })
        })
        .collect()
}

fn normalize_event(raw: RawEventDetection) -> Result<EventDetection, AnalysisError> {
    const SECTION: &str = "event_detection";
    if !raw.has_event {
        return Ok(EventDetection::NoEvent);
    }

    let title = non_empty(raw.event_title).ok_or_else(|| invalid(SECTION, "event_title", "missing"))?;
    let date = required_date(SECTION, "event_date", raw.event_date)?;
    let end_date = optional_date(SECTION, "event_end_date", raw.event_end_date)?;
    if let Some(end) = end_date {
        if end < date {
            return Err(invalid(
                SECTION,
                "event_end_date",
                format!("{} is before start {}", end, date),
            ));
        }
    }

    let locality = match non_empty(raw.event_locality) {
        None => None,
        Some(s) => Some(
            serde_json::from_value::<EventLocality>(Value::String(s.to_lowercase()))
                .map_err(|_| invalid(SECTION, "event_locality", format!("unknown locality '{}'", s)))?,
        ),
    };

    Ok(EventDetection::Event(EventDetectionResult {
        title,
        date,
        start_time: optional_time(SECTION, "event_time", raw.event_time)?,
        end_date,
        end_time: optional_time(SECTION, "event_end_time", raw.event_end_time)?,
        location: non_empty(raw.location),
        location_type: raw.location_type.unwrap_or_default(),
        locality,
        rsvp_required: raw.rsvp_required,
        rsvp_deadline: optional_date(SECTION, "rsvp_deadline", raw.rsvp_deadline)?,
        cost: EventCost::from_value(&raw.cost)?,
        registration_url: non_empty(raw.registration_url),
        description: non_empty(raw.description),
        confidence: check_confidence(SECTION, raw.confidence)?,
    }))
}

fn normalize_dates(raw: RawDateExtraction) -> Result<DateExtractionResult, AnalysisError> {
    const SECTION: &str = "date_extraction";
    if !raw.has_dates {
        return Ok(DateExtractionResult::default());
    }

    let dates = raw
        .dates
        .into_iter()
        .map(|d| -> Result<DateCandidate, AnalysisError> {
            Ok(DateCandidate {
                date_type: d
                    .date_type
                    .as_deref()
                    .map(DateType::from_str_lossy)
                    .unwrap_or(DateType::Other),
                date: required_date(SECTION, "date", d.date)?,
                time: optional_time(SECTION, "time", d.time)?,
                title: non_empty(d.title).ok_or_else(|| invalid(SECTION, "title", "missing"))?,
                description: non_empty(d.description),
                is_recurring: d.is_recurring,
                recurrence_pattern: non_empty(d.recurrence_pattern),
                confidence: check_confidence(SECTION, d.confidence)?,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(DateExtractionResult { dates })
}
