//! Mail API surface.
//!
//! The web app's route handlers are the only backend this crate talks to.
//! `MailApi` is the seam: `client::HttpMailApi` speaks HTTP, tests use the
//! in-memory fake in `test_utils`.
//!
//! Conventions: JSON in and out, session cookie auth, errors as
//! `{"error": "..."}` with a status code. List endpoints wrap their rows
//! (`{"contacts": [...]}`), single-row endpoints return the row itself.

pub mod client;
#[cfg(test)]
pub mod test_utils;

use async_trait::async_trait;
use uuid::Uuid;

use crate::analysis::EmailAnalysis;
use crate::contacts::ContactQueryOptions;
use crate::error::ApiError;
use crate::sync::{SyncRequest, SyncResponse};
use crate::timeline::{DateAction, DateQuery};
use crate::types::{
    Contact, ContactPage, ContactUpdate, ExtractedDate, Idea, ProfilePatch, SyncStats, UserProfile,
};

pub use client::HttpMailApi;

#[async_trait]
pub trait MailApi: Send + Sync {
    /// `GET /api/contacts?…`
    async fn list_contacts(&self, query: &ContactQueryOptions) -> Result<ContactPage, ApiError>;

    /// `GET /api/contacts/:id`
    async fn get_contact(&self, id: Uuid) -> Result<Contact, ApiError>;

    /// `PUT /api/contacts/:id`
    async fn update_contact(&self, id: Uuid, update: &ContactUpdate) -> Result<Contact, ApiError>;

    /// `POST /api/contacts/mark-vip`. Returns how many contacts were flagged.
    async fn mark_vip(&self, emails: &[String]) -> Result<u32, ApiError>;

    /// `GET /api/profile`
    async fn get_profile(&self) -> Result<UserProfile, ApiError>;

    /// `PATCH /api/profile`
    async fn update_profile(&self, patch: &ProfilePatch) -> Result<UserProfile, ApiError>;

    /// `POST /api/emails/sync`
    async fn sync_emails(&self, request: &SyncRequest) -> Result<SyncResponse, ApiError>;

    /// `GET /api/emails/sync/status`: aggregate counts and the latest sync log row.
    async fn sync_stats(&self) -> Result<SyncStats, ApiError>;

    /// `POST /api/emails/:id/analyze`
    async fn analyze_email(&self, email_id: Uuid) -> Result<EmailAnalysis, ApiError>;

    /// `GET /api/dates?…`
    async fn list_dates(&self, query: &DateQuery) -> Result<Vec<ExtractedDate>, ApiError>;

    /// `PATCH /api/dates/:id`
    async fn update_date(&self, id: Uuid, action: DateAction) -> Result<ExtractedDate, ApiError>;

    /// `POST /api/ideas`. Returns the new idea's id.
    async fn create_idea(&self, idea: &Idea) -> Result<Uuid, ApiError>;
}
