//! In-memory `MailApi` for unit tests.

use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use uuid::Uuid;

use super::MailApi;
use crate::analysis::EmailAnalysis;
use crate::contacts::ContactQueryOptions;
use crate::error::ApiError;
use crate::sync::{SyncRequest, SyncResponse};
use crate::timeline::{DateAction, DateQuery};
use crate::types::{
    Contact, ContactPage, ContactUpdate, ExtractedDate, Idea, ProfilePatch, RelationshipType,
    SenderType, SyncStats, UserProfile,
};

pub fn make_contact(email: &str) -> Contact {
    Contact {
        id: Uuid::new_v4(),
        email: email.to_string(),
        name: None,
        company: None,
        job_title: None,
        relationship_type: RelationshipType::Unknown,
        is_vip: false,
        is_muted: false,
        email_count: 1,
        last_seen_at: None,
        sender_type: SenderType::Direct,
        is_client: false,
        client_status: None,
        client_priority: None,
        notes: None,
    }
}

pub fn make_profile() -> UserProfile {
    UserProfile {
        id: Uuid::new_v4(),
        email: "me@example.com".to_string(),
        full_name: Some("Sam Rivera".to_string()),
        timezone: None,
        onboarding_completed: false,
        onboarding_step: None,
        connected_accounts: Vec::new(),
        vip_emails: Vec::new(),
        role: None,
        company: None,
        location: None,
        priorities: Vec::new(),
        projects: Vec::new(),
        work_hours_start: None,
        work_hours_end: None,
        work_days: Vec::new(),
    }
}

#[derive(Default)]
struct FakeState {
    contacts: Vec<Contact>,
    contact_update_failure: Option<(u16, String)>,
    updates: Vec<(Uuid, ContactUpdate)>,
    marked_vip: Vec<Vec<String>>,
    profile: Option<UserProfile>,
    profile_patches: Vec<ProfilePatch>,
    sync_result: Option<Result<SyncResponse, (u16, String)>>,
    sync_delay: Duration,
    sync_calls: u32,
    stats: SyncStats,
    dates: Vec<ExtractedDate>,
    date_queries: Vec<DateQuery>,
    ideas: Vec<Idea>,
}

#[derive(Default)]
pub struct FakeMailApi {
    state: Mutex<FakeState>,
}

impl FakeMailApi {
    pub fn with_contacts(contacts: Vec<Contact>) -> Self {
        let api = Self::default();
        api.state.lock().contacts = contacts;
        api
    }

    pub fn with_profile(profile: UserProfile) -> Self {
        let api = Self::default();
        api.state.lock().profile = Some(profile);
        api
    }

    pub fn with_dates(dates: Vec<ExtractedDate>) -> Self {
        let api = Self::default();
        api.state.lock().dates = dates;
        api
    }

    pub fn fail_contact_updates(&self, status: u16, message: &str) {
        self.state.lock().contact_update_failure = Some((status, message.to_string()));
    }

    pub fn set_sync_response(&self, response: SyncResponse) {
        self.state.lock().sync_result = Some(Ok(response));
    }

    pub fn fail_sync(&self, status: u16, message: &str) {
        self.state.lock().sync_result = Some(Err((status, message.to_string())));
    }

    /// Make `sync_emails` take this long (use with paused tokio time).
    pub fn set_sync_delay(&self, delay: Duration) {
        self.state.lock().sync_delay = delay;
    }

    pub fn set_stats(&self, stats: SyncStats) {
        self.state.lock().stats = stats;
    }

    pub fn updates(&self) -> Vec<(Uuid, ContactUpdate)> {
        self.state.lock().updates.clone()
    }

    pub fn marked_vip(&self) -> Vec<Vec<String>> {
        self.state.lock().marked_vip.clone()
    }

    pub fn profile_patches(&self) -> Vec<ProfilePatch> {
        self.state.lock().profile_patches.clone()
    }

    pub fn profile(&self) -> Option<UserProfile> {
        self.state.lock().profile.clone()
    }

    pub fn sync_calls(&self) -> u32 {
        self.state.lock().sync_calls
    }

    pub fn date_queries(&self) -> Vec<DateQuery> {
        self.state.lock().date_queries.clone()
    }

    pub fn ideas(&self) -> Vec<Idea> {
        self.state.lock().ideas.clone()
    }
}

fn error_body(message: &str) -> String {
    serde_json::json!({ "error": message }).to_string()
}

fn apply_update(contact: &mut Contact, update: &ContactUpdate) {
    if let Some(v) = update.is_vip {
        contact.is_vip = v;
    }
    if let Some(v) = update.is_muted {
        contact.is_muted = v;
    }
    if let Some(ref v) = update.notes {
        contact.notes = Some(v.clone());
    }
    if let Some(ref v) = update.name {
        contact.name = Some(v.clone());
    }
    if let Some(ref v) = update.company {
        contact.company = Some(v.clone());
    }
    if let Some(ref v) = update.job_title {
        contact.job_title = Some(v.clone());
    }
    if let Some(v) = update.relationship_type {
        contact.relationship_type = v;
    }
    if let Some(v) = update.is_client {
        contact.is_client = v;
    }
    if let Some(v) = update.client_status {
        contact.client_status = Some(v);
    }
    if let Some(v) = update.client_priority {
        contact.client_priority = Some(v);
    }
}

fn apply_patch(profile: &mut UserProfile, patch: &ProfilePatch) {
    if let Some(ref v) = patch.onboarding_step {
        profile.onboarding_step = Some(v.clone());
    }
    if let Some(v) = patch.onboarding_completed {
        profile.onboarding_completed = v;
    }
    if let Some(ref v) = patch.timezone {
        profile.timezone = v.clone();
    }
    if let Some(ref v) = patch.vip_emails {
        profile.vip_emails = v.clone();
    }
    if let Some(ref v) = patch.role {
        profile.role = v.clone();
    }
    if let Some(ref v) = patch.company {
        profile.company = v.clone();
    }
    if let Some(ref v) = patch.location {
        profile.location = v.clone();
    }
    if let Some(ref v) = patch.priorities {
        profile.priorities = v.clone();
    }
    if let Some(ref v) = patch.projects {
        profile.projects = v.clone();
    }
    if let Some(ref v) = patch.work_hours_start {
        profile.work_hours_start = Some(v.clone());
    }
    if let Some(ref v) = patch.work_hours_end {
        profile.work_hours_end = Some(v.clone());
    }
    if let Some(ref v) = patch.work_days {
        profile.work_days = v.clone();
    }
}

#[async_trait]
impl MailApi for FakeMailApi {
    async fn list_contacts(&self, query: &ContactQueryOptions) -> Result<ContactPage, ApiError> {
        let state = self.state.lock();
        let search = query.search.as_deref().map(str::to_lowercase);
        let matching: Vec<Contact> = state
            .contacts
            .iter()
            .filter(|c| query.is_vip.map_or(true, |v| c.is_vip == v))
            .filter(|c| query.is_muted.map_or(true, |v| c.is_muted == v))
            .filter(|c| query.is_client.map_or(true, |v| c.is_client == v))
            .filter(|c| query.sender_type.map_or(true, |t| c.sender_type == t))
            .filter(|c| {
                search.as_deref().map_or(true, |s| {
                    c.email.to_lowercase().contains(s)
                        || c.name.as_deref().unwrap_or_default().to_lowercase().contains(s)
                })
            })
            .cloned()
            .collect();
        let total = matching.len() as u64;
        let contacts = matching
            .into_iter()
            .skip(query.offset as usize)
            .take(if query.limit == 0 { usize::MAX } else { query.limit as usize })
            .collect();
        Ok(ContactPage { contacts, total })
    }

    async fn get_contact(&self, id: Uuid) -> Result<Contact, ApiError> {
        self.state
            .lock()
            .contacts
            .iter()
            .find(|c| c.id == id)
            .cloned()
            .ok_or_else(|| ApiError::from_status(404, &error_body("Contact not found")))
    }

    async fn update_contact(&self, id: Uuid, update: &ContactUpdate) -> Result<Contact, ApiError> {
        let mut state = self.state.lock();
        state.updates.push((id, update.clone()));
        if let Some((status, ref message)) = state.contact_update_failure {
            return Err(ApiError::from_status(status, &error_body(message)));
        }
        let contact = state
            .contacts
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| ApiError::from_status(404, &error_body("Contact not found")))?;
        apply_update(contact, update);
        Ok(contact.clone())
    }

    async fn mark_vip(&self, emails: &[String]) -> Result<u32, ApiError> {
        let mut state = self.state.lock();
        state.marked_vip.push(emails.to_vec());
        let mut updated = 0;
        for contact in state.contacts.iter_mut() {
            if emails.iter().any(|e| e.eq_ignore_ascii_case(&contact.email)) {
                contact.is_vip = true;
                updated += 1;
            }
        }
        Ok(updated)
    }

    async fn get_profile(&self) -> Result<UserProfile, ApiError> {
        self.state
            .lock()
            .profile
            .clone()
            .ok_or(ApiError::Unauthorized)
    }

    async fn update_profile(&self, patch: &ProfilePatch) -> Result<UserProfile, ApiError> {
        let mut state = self.state.lock();
        state.profile_patches.push(patch.clone());
        let profile = state.profile.as_mut().ok_or(ApiError::Unauthorized)?;
        apply_patch(profile, patch);
        Ok(profile.clone())
    }

    async fn sync_emails(&self, _request: &SyncRequest) -> Result<SyncResponse, ApiError> {
        let delay = {
            let mut state = self.state.lock();
            state.sync_calls += 1;
            state.sync_delay
        };
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        match self.state.lock().sync_result.clone() {
            Some(Ok(response)) => Ok(response),
            Some(Err((status, message))) => Err(ApiError::from_status(status, &error_body(&message))),
            None => Ok(SyncResponse::default()),
        }
    }

    async fn sync_stats(&self) -> Result<SyncStats, ApiError> {
        Ok(self.state.lock().stats.clone())
    }

    async fn analyze_email(&self, _email_id: Uuid) -> Result<EmailAnalysis, ApiError> {
        Ok(EmailAnalysis::default())
    }

    async fn list_dates(&self, query: &DateQuery) -> Result<Vec<ExtractedDate>, ApiError> {
        let mut state = self.state.lock();
        state.date_queries.push(query.clone());
        Ok(state.dates.clone())
    }

    async fn update_date(&self, id: Uuid, action: DateAction) -> Result<ExtractedDate, ApiError> {
        let mut state = self.state.lock();
        let row = state
            .dates
            .iter_mut()
            .find(|d| d.id == id)
            .ok_or_else(|| ApiError::from_status(404, &error_body("Date not found")))?;
        *row = action.apply(row);
        Ok(row.clone())
    }

    async fn create_idea(&self, idea: &Idea) -> Result<Uuid, ApiError> {
        self.state.lock().ideas.push(idea.clone());
        Ok(Uuid::new_v4())
    }
}
