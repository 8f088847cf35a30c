//! Contacts list: filter state → query options, and optimistic flag toggles.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::MailApi;
use crate::error::{ApiError, UiError};
use crate::types::{Contact, ContactUpdate, SenderType};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContactTab {
    #[default]
    All,
    Vip,
    Muted,
    Clients,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContactSortField {
    #[default]
    LastSeenAt,
    EmailCount,
    Name,
    Company,
}

impl ContactSortField {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContactSortField::LastSeenAt => "last_seen_at",
            ContactSortField::EmailCount => "email_count",
            ContactSortField::Name => "name",
            ContactSortField::Company => "company",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

/// What the contacts page currently shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactFilterState {
    pub tab: ContactTab,
    pub search: String,
    pub sort_by: ContactSortField,
    pub sort_order: SortOrder,
    /// 1-based
    pub page: u32,
    pub page_size: u32,
    pub sender_type: Option<SenderType>,
    pub is_client: Option<bool>,
}

impl Default for ContactFilterState {
    fn default() -> Self {
        Self {
            tab: ContactTab::All,
            search: String::new(),
            sort_by: ContactSortField::default(),
            sort_order: SortOrder::default(),
            page: 1,
            page_size: 50,
            sender_type: None,
            is_client: None,
        }
    }
}

/// Options handed to the contacts fetch. Filtering happens server-side.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ContactQueryOptions {
    pub is_vip: Option<bool>,
    pub is_muted: Option<bool>,
    pub is_client: Option<bool>,
    pub search: Option<String>,
    pub sender_type: Option<SenderType>,
    pub sort_by: ContactSortField,
    pub sort_order: SortOrder,
    pub limit: u32,
    pub offset: u32,
}

pub fn build_query_options(state: &ContactFilterState) -> ContactQueryOptions {
    let search = Some(state.search.trim().to_string()).filter(|s| !s.is_empty());
    let page = state.page.max(1);

    let mut options = ContactQueryOptions {
        is_vip: None,
        is_muted: None,
        is_client: state.is_client,
        search,
        sender_type: state.sender_type,
        sort_by: state.sort_by,
        sort_order: state.sort_order,
        limit: state.page_size,
        offset: (page - 1).saturating_mul(state.page_size),
    };

    match state.tab {
        ContactTab::All => {}
        ContactTab::Vip => options.is_vip = Some(true),
        ContactTab::Muted => options.is_muted = Some(true),
        ContactTab::Clients => options.is_client = Some(true),
    }

    options
}

impl ContactQueryOptions {
    pub fn to_query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(v) = self.is_vip {
            pairs.push(("is_vip", v.to_string()));
        }
        if let Some(v) = self.is_muted {
            pairs.push(("is_muted", v.to_string()));
        }
        if let Some(v) = self.is_client {
            pairs.push(("is_client", v.to_string()));
        }
        if let Some(ref s) = self.search {
            pairs.push(("search", s.clone()));
        }
        if let Some(t) = self.sender_type {
            pairs.push(("sender_type", t.as_str().to_string()));
        }
        pairs.push(("sort_by", self.sort_by.as_str().to_string()));
        pairs.push(("sort_order", self.sort_order.as_str().to_string()));
        pairs.push(("limit", self.limit.to_string()));
        pairs.push(("offset", self.offset.to_string()));
        pairs
    }
}

// ---------------------------------------------------------------------------
// Optimistic flag toggles
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactFlag {
    Vip,
    Muted,
}

impl ContactFlag {
    fn get(&self, contact: &Contact) -> bool {
        match self {
            ContactFlag::Vip => contact.is_vip,
            ContactFlag::Muted => contact.is_muted,
        }
    }

    fn set(&self, contact: &mut Contact, value: bool) {
        match self {
            ContactFlag::Vip => contact.is_vip = value,
            ContactFlag::Muted => contact.is_muted = value,
        }
    }

    fn update(&self, value: bool) -> ContactUpdate {
        match self {
            ContactFlag::Vip => ContactUpdate {
                is_vip: Some(value),
                ..Default::default()
            },
            ContactFlag::Muted => ContactUpdate {
                is_muted: Some(value),
                ..Default::default()
            },
        }
    }

    fn noun(&self) -> &'static str {
        match self {
            ContactFlag::Vip => "VIP status",
            ContactFlag::Muted => "mute setting",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ToastLevel {
    Success,
    Error,
}

/// Transient notification shown after a user action.
#[derive(Debug, Clone, Serialize)]
pub struct Toast {
    pub level: ToastLevel,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<UiError>,
}

impl Toast {
    fn error(message: String, err: Option<&ApiError>) -> Self {
        Self {
            level: ToastLevel::Error,
            message,
            error: err.map(UiError::from),
        }
    }
}

/// The contacts currently loaded in the list view.
#[derive(Debug, Clone, Default)]
pub struct ContactBook {
    contacts: Vec<Contact>,
    total: u64,
}

impl ContactBook {
    pub fn new(contacts: Vec<Contact>) -> Self {
        let total = contacts.len() as u64;
        Self { contacts, total }
    }

    /// Load one page through the API.
    pub async fn fetch(api: &dyn MailApi, state: &ContactFilterState) -> Result<Self, ApiError> {
        let page = api.list_contacts(&build_query_options(state)).await?;
        Ok(Self {
            contacts: page.contacts,
            total: page.total,
        })
    }

    pub fn contacts(&self) -> &[Contact] {
        &self.contacts
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn get(&self, id: Uuid) -> Option<&Contact> {
        self.contacts.iter().find(|c| c.id == id)
    }

    /// Flip a flag locally, then persist it. On failure the prior value is
    /// restored and an error toast is returned. Returns the new value.
    pub async fn toggle_flag(
        &mut self,
        api: &dyn MailApi,
        id: Uuid,
        flag: ContactFlag,
    ) -> Result<bool, Toast> {
        let contact = self
            .contacts
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| Toast::error("Contact is no longer in this list".to_string(), None))?;
        let prior = flag.get(contact);
        let next = !prior;
        flag.set(contact, next);

        match api.update_contact(id, &flag.update(next)).await {
            Ok(saved) => {
                if let Some(c) = self.contacts.iter_mut().find(|c| c.id == id) {
                    *c = saved;
                }
                Ok(next)
            }
            Err(e) => {
                log::warn!("Reverting {} for contact {}: {}", flag.noun(), id, e);
                if let Some(c) = self.contacts.iter_mut().find(|c| c.id == id) {
                    flag.set(c, prior);
                }
                Err(Toast::error(format!("Couldn't update {}", flag.noun()), Some(&e)))
            }
        }
    }

    /// Replace a contact's notes. Not optimistic: the list updates on success only.
    pub async fn save_notes(&mut self, api: &dyn MailApi, id: Uuid, notes: &str) -> Result<(), Toast> {
        let update = ContactUpdate {
            notes: Some(notes.trim().to_string()),
            ..Default::default()
        };
        match api.update_contact(id, &update).await {
            Ok(saved) => {
                if let Some(c) = self.contacts.iter_mut().find(|c| c.id == id) {
                    *c = saved;
                }
                Ok(())
            }
            Err(e) => Err(Toast::error("Couldn't save notes".to_string(), Some(&e))),
        }
    }
}
