use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::util::parse_clock_time;

// ============================================================================
// Extracted dates
// ============================================================================

/// Kind of date the extraction pipeline found in an email.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateType {
    Deadline,
    Event,
    PaymentDue,
    Birthday,
    Anniversary,
    Expiration,
    Appointment,
    FollowUp,
    Reminder,
    Recurring,
    #[serde(other)]
    Other,
}

impl DateType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DateType::Deadline => "deadline",
            DateType::Event => "event",
            DateType::PaymentDue => "payment_due",
            DateType::Birthday => "birthday",
            DateType::Anniversary => "anniversary",
            DateType::Expiration => "expiration",
            DateType::Appointment => "appointment",
            DateType::FollowUp => "follow_up",
            DateType::Reminder => "reminder",
            DateType::Recurring => "recurring",
            DateType::Other => "other",
        }
    }

    /// Lenient parse used for model output. Unknown kinds become `Other`.
    pub fn from_str_lossy(value: &str) -> Self {
        match value.trim().to_lowercase().replace(['-', ' '], "_").as_str() {
            "deadline" => DateType::Deadline,
            "event" => DateType::Event,
            "payment_due" | "payment" => DateType::PaymentDue,
            "birthday" => DateType::Birthday,
            "anniversary" => DateType::Anniversary,
            "expiration" | "expiry" => DateType::Expiration,
            "appointment" => DateType::Appointment,
            "follow_up" | "followup" => DateType::FollowUp,
            "reminder" => DateType::Reminder,
            "recurring" => DateType::Recurring,
            _ => DateType::Other,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            DateType::Deadline => "Deadline",
            DateType::Event => "Event",
            DateType::PaymentDue => "Payment due",
            DateType::Birthday => "Birthday",
            DateType::Anniversary => "Anniversary",
            DateType::Expiration => "Expires",
            DateType::Appointment => "Appointment",
            DateType::FollowUp => "Follow up",
            DateType::Reminder => "Reminder",
            DateType::Recurring => "Recurring",
            DateType::Other => "Date",
        }
    }
}

/// Minimal contact reference embedded in other rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContactRef {
    pub id: Uuid,
    #[serde(default)]
    pub name: Option<String>,
    pub email: String,
}

/// A date/deadline/event inferred from email content.
///
/// Rows are never deleted; user actions only flip `is_acknowledged`,
/// `is_hidden` or `snoozed_until`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedDate {
    pub id: Uuid,
    pub date_type: DateType,
    pub date: NaiveDate,
    /// Wall-clock time as stored (`HH:MM` or `HH:MM:SS`). `None` = all day.
    #[serde(default)]
    pub time: Option<String>,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub is_acknowledged: bool,
    #[serde(default)]
    pub is_recurring: bool,
    #[serde(default)]
    pub recurrence_pattern: Option<String>,
    #[serde(default)]
    pub email_id: Option<Uuid>,
    #[serde(default)]
    pub contact: Option<ContactRef>,
    #[serde(default)]
    pub is_hidden: bool,
    #[serde(default)]
    pub snoozed_until: Option<NaiveDate>,
    #[serde(default)]
    pub confidence: Option<f64>,
}

impl ExtractedDate {
    /// Parsed start time. Unparseable strings count as all-day.
    pub fn start_time(&self) -> Option<NaiveTime> {
        self.time.as_deref().and_then(parse_clock_time)
    }
}

// ============================================================================
// Contacts
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationshipType {
    Client,
    Colleague,
    Vendor,
    Friend,
    Family,
    Recruiter,
    Service,
    Networking,
    #[default]
    #[serde(other)]
    Unknown,
}

/// How a sender reaches the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SenderType {
    Direct,
    Broadcast,
    ColdOutreach,
    Opportunity,
    #[default]
    #[serde(other)]
    Unknown,
}

impl SenderType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SenderType::Direct => "direct",
            SenderType::Broadcast => "broadcast",
            SenderType::ColdOutreach => "cold_outreach",
            SenderType::Opportunity => "opportunity",
            SenderType::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClientStatus {
    Active,
    Inactive,
    Archived,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClientPriority {
    Vip,
    High,
    Medium,
    Low,
}

/// A sender the user has received mail from. Email is unique per user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    pub id: Uuid,
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub job_title: Option<String>,
    #[serde(default)]
    pub relationship_type: RelationshipType,
    #[serde(default)]
    pub is_vip: bool,
    #[serde(default)]
    pub is_muted: bool,
    #[serde(default)]
    pub email_count: u32,
    #[serde(default)]
    pub last_seen_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub sender_type: SenderType,
    #[serde(default)]
    pub is_client: bool,
    #[serde(default)]
    pub client_status: Option<ClientStatus>,
    #[serde(default)]
    pub client_priority: Option<ClientPriority>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Body of `PUT /api/contacts/:id`. Only set fields are sent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContactUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_vip: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_muted: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relationship_type: Option<RelationshipType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_client: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_status: Option<ClientStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_priority: Option<ClientPriority>,
}

/// One page of `GET /api/contacts`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContactPage {
    pub contacts: Vec<Contact>,
    #[serde(default)]
    pub total: u64,
}

// ============================================================================
// Emails, sync, actions
// ============================================================================

/// AI-assigned importance tier of an email.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalStrength {
    High,
    Medium,
    Low,
    Noise,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncLogStatus {
    Started,
    InProgress,
    Completed,
    Failed,
    #[serde(other)]
    Unknown,
}

/// Latest row of the persisted sync log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncLog {
    pub id: Uuid,
    pub status: SyncLogStatus,
    pub started_at: DateTime<Utc>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub emails_fetched: u32,
    #[serde(default)]
    pub emails_created: u32,
    #[serde(default)]
    pub error_message: Option<String>,
}

/// Aggregate counts shown by the sync banner and home page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SyncStats {
    #[serde(default)]
    pub total_emails: u64,
    #[serde(default)]
    pub analyzed_emails: u64,
    #[serde(default)]
    pub pending_actions: u64,
    #[serde(default)]
    pub last_sync: Option<SyncLog>,
}

impl SyncStats {
    pub fn unanalyzed_emails(&self) -> u64 {
        self.total_emails.saturating_sub(self.analyzed_emails)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingAction {
    pub id: Uuid,
    pub title: String,
    #[serde(default)]
    pub action_type: Option<String>,
    #[serde(default)]
    pub urgency_score: Option<u8>,
    #[serde(default)]
    pub deadline: Option<NaiveDate>,
    #[serde(default = "default_action_status")]
    pub status: String,
}

fn default_action_status() -> String {
    "pending".to_string()
}

/// Body of `POST /api/ideas`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Idea {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub idea_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_email_id: Option<Uuid>,
}

// ============================================================================
// Profile
// ============================================================================

/// User profile plus the onboarding context collected by the wizard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: Uuid,
    pub email: String,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub timezone: Option<String>,
    #[serde(default)]
    pub onboarding_completed: bool,
    #[serde(default)]
    pub onboarding_step: Option<String>,
    #[serde(default)]
    pub connected_accounts: Vec<String>,
    #[serde(default)]
    pub vip_emails: Vec<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub priorities: Vec<String>,
    #[serde(default)]
    pub projects: Vec<String>,
    #[serde(default)]
    pub work_hours_start: Option<String>,
    #[serde(default)]
    pub work_hours_end: Option<String>,
    /// 0 = Sunday .. 6 = Saturday
    #[serde(default)]
    pub work_days: Vec<u8>,
}

/// Body of `PATCH /api/profile`. Only set fields are sent.
///
/// Clearable text fields are `Option<Option<_>>`: `None` leaves the stored
/// value alone, `Some(None)` sends `null` and clears it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfilePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub onboarding_step: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub onboarding_completed: Option<bool>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_present"
    )]
    pub timezone: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vip_emails: Option<Vec<String>>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_present"
    )]
    pub role: Option<Option<String>>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_present"
    )]
    pub company: Option<Option<String>>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_present"
    )]
    pub location: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priorities: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub projects: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub work_hours_start: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub work_hours_end: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub work_days: Option<Vec<u8>>,
}

/// Distinguishes an explicit `null` (`Some(None)`) from a missing field (`None`).
fn deserialize_present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
