//! Sync status machine.
//!
//! ```text
//! NeverSynced ─┐
//! Idle ────────┼─ Started ─▶ Syncing ─ Completed ─▶ Success ─ Reverted ─▶ Idle
//! Error ───────┤                     └─ Failed ───▶ Error
//! Success ─────┘
//! ```
//!
//! All changes go through `SyncStatus::apply`. Anything not drawn above is an
//! `InvalidTransition`, so a late revert cannot clobber a sync that started
//! after the success banner went up.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{SyncLog, SyncLogStatus};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "detail", rename_all = "snake_case")]
pub enum SyncStatus {
    NeverSynced,
    Idle,
    Syncing,
    Success(SyncSummary),
    Error(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncEvent {
    Started,
    Completed(SyncSummary),
    Failed(String),
    Reverted,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot apply {event} while {from}")]
pub struct InvalidTransition {
    pub from: &'static str,
    pub event: &'static str,
}

impl SyncStatus {
    pub fn name(&self) -> &'static str {
        match self {
            SyncStatus::NeverSynced => "never_synced",
            SyncStatus::Idle => "idle",
            SyncStatus::Syncing => "syncing",
            SyncStatus::Success(_) => "success",
            SyncStatus::Error(_) => "error",
        }
    }

    pub fn is_syncing(&self) -> bool {
        matches!(self, SyncStatus::Syncing)
    }

    pub fn apply(&self, event: SyncEvent) -> Result<SyncStatus, InvalidTransition> {
        match (self, event) {
            (
                SyncStatus::NeverSynced
                | SyncStatus::Idle
                | SyncStatus::Success(_)
                | SyncStatus::Error(_),
                SyncEvent::Started,
            ) => Ok(SyncStatus::Syncing),
            (SyncStatus::Syncing, SyncEvent::Completed(summary)) => Ok(SyncStatus::Success(summary)),
            (SyncStatus::Syncing, SyncEvent::Failed(message)) => Ok(SyncStatus::Error(message)),
            (SyncStatus::Success(_), SyncEvent::Reverted) => Ok(SyncStatus::Idle),
            (from, event) => Err(InvalidTransition {
                from: from.name(),
                event: event.name(),
            }),
        }
    }

    /// Re-derive the banner state after a reload from the last persisted log row.
    ///
    /// Transient states are not persisted: an interrupted or running sync
    /// shows as idle.
    pub fn from_last_log(log: Option<&SyncLog>) -> SyncStatus {
        match log {
            None => SyncStatus::NeverSynced,
            Some(row) if row.status == SyncLogStatus::Failed => SyncStatus::Error(
                row.error_message
                    .clone()
                    .filter(|m| !m.trim().is_empty())
                    .unwrap_or_else(|| "Sync failed".to_string()),
            ),
            Some(_) => SyncStatus::Idle,
        }
    }

    /// Banner text, if the state shows one.
    pub fn message(&self) -> Option<String> {
        match self {
            SyncStatus::NeverSynced => Some("Not synced yet".to_string()),
            SyncStatus::Idle => None,
            SyncStatus::Syncing => Some("Syncing…".to_string()),
            SyncStatus::Success(summary) => Some(summary.message()),
            SyncStatus::Error(message) => Some(message.clone()),
        }
    }
}

impl SyncEvent {
    pub fn name(&self) -> &'static str {
        match self {
            SyncEvent::Started => "started",
            SyncEvent::Completed(_) => "completed",
            SyncEvent::Failed(_) => "failed",
            SyncEvent::Reverted => "reverted",
        }
    }
}

// ---------------------------------------------------------------------------
// POST /api/emails/sync response
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncTotals {
    #[serde(default)]
    pub total_fetched: u32,
    #[serde(default)]
    pub total_created: u32,
    #[serde(default)]
    pub total_skipped: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncAnalysis {
    #[serde(default)]
    pub success_count: u32,
    #[serde(default)]
    pub failure_count: u32,
    #[serde(default)]
    pub actions_created: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncResponse {
    #[serde(default)]
    pub totals: SyncTotals,
    #[serde(default)]
    pub analysis: SyncAnalysis,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Body of `POST /api/emails/sync`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_results: Option<u32>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub full_sync: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncSummary {
    pub new_emails: u32,
    pub analyzed: u32,
    pub actions_found: u32,
}

impl SyncSummary {
    pub fn from_response(response: &SyncResponse) -> Self {
        Self {
            new_emails: response.totals.total_created,
            analyzed: response.analysis.success_count,
            actions_found: response.analysis.actions_created,
        }
    }

    /// "5 new emails, 3 analyzed, 2 actions found"
    pub fn message(&self) -> String {
        if self.new_emails == 0 && self.analyzed == 0 && self.actions_found == 0 {
            return "No new emails".to_string();
        }
        format!(
            "{} new {}, {} analyzed, {} {} found",
            self.new_emails,
            plural(self.new_emails, "email", "emails"),
            self.analyzed,
            self.actions_found,
            plural(self.actions_found, "action", "actions"),
        )
    }
}

fn plural<'a>(n: u32, one: &'a str, many: &'a str) -> &'a str {
    if n == 1 {
        one
    } else {
        many
    }
}
