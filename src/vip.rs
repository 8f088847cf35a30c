//! VIP sender list edited during onboarding and from settings.

use thiserror::Error;

use crate::api::MailApi;
use crate::error::ApiError;
use crate::types::{Contact, SenderType};
use crate::util::{is_valid_email, normalize_email};

pub const DEFAULT_VIP_LIMIT: usize = 25;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VipError {
    #[error("Enter a valid email address")]
    InvalidEmail,

    #[error("{0} is already a VIP")]
    Duplicate(String),

    #[error("You can add up to {0} VIPs")]
    LimitReached(usize),
}

/// Ordered list of normalized VIP addresses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VipList {
    emails: Vec<String>,
    limit: usize,
}

impl Default for VipList {
    fn default() -> Self {
        Self::new(DEFAULT_VIP_LIMIT)
    }
}

impl VipList {
    pub fn new(limit: usize) -> Self {
        Self {
            emails: Vec::new(),
            limit,
        }
    }

    /// Rebuild from stored addresses. Invalid and duplicate entries are dropped;
    /// the limit is not enforced on load.
    pub fn from_saved(saved: &[String], limit: usize) -> Self {
        let mut list = Self::new(limit);
        for raw in saved {
            let email = normalize_email(raw);
            if is_valid_email(&email) && !list.contains(&email) {
                list.emails.push(email);
            }
        }
        list
    }

    pub fn emails(&self) -> &[String] {
        &self.emails
    }

    pub fn len(&self) -> usize {
        self.emails.len()
    }

    pub fn is_empty(&self) -> bool {
        self.emails.is_empty()
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn contains(&self, email: &str) -> bool {
        let email = normalize_email(email);
        self.emails.iter().any(|e| *e == email)
    }

    /// Add an address, returning its normalized form.
    pub fn add(&mut self, raw: &str) -> Result<String, VipError> {
        let email = normalize_email(raw);
        if !is_valid_email(&email) {
            return Err(VipError::InvalidEmail);
        }
        if self.contains(&email) {
            return Err(VipError::Duplicate(email));
        }
        if self.emails.len() >= self.limit {
            return Err(VipError::LimitReached(self.limit));
        }
        self.emails.push(email.clone());
        Ok(email)
    }

    /// Returns false when the address was not in the list.
    pub fn remove(&mut self, raw: &str) -> bool {
        let email = normalize_email(raw);
        let before = self.emails.len();
        self.emails.retain(|e| *e != email);
        self.emails.len() != before
    }

    /// Flag every listed address as VIP on the server.
    pub async fn persist(&self, api: &dyn MailApi) -> Result<u32, ApiError> {
        if self.emails.is_empty() {
            return Ok(0);
        }
        let updated = api.mark_vip(&self.emails).await?;
        log::info!("Marked {} of {} VIP addresses", updated, self.emails.len());
        Ok(updated)
    }
}

/// Contacts worth proposing as VIPs: people who write directly, most active first.
pub fn suggest_vips<'a>(contacts: &'a [Contact], list: &VipList, limit: usize) -> Vec<&'a Contact> {
    let mut candidates: Vec<&Contact> = contacts
        .iter()
        .filter(|c| !c.is_vip && !c.is_muted)
        .filter(|c| c.sender_type != SenderType::Broadcast)
        .filter(|c| !list.contains(&c.email))
        .collect();
    candidates.sort_by(|a, b| {
        b.email_count
            .cmp(&a.email_count)
            .then_with(|| b.last_seen_at.cmp(&a.last_seen_at))
            .then_with(|| a.email.cmp(&b.email))
    });
    candidates.truncate(limit);
    candidates
}
