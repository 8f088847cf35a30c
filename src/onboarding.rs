//! Onboarding wizard.
//!
//! `Wizard::dispatch` is the only mutation path. Field actions are accepted
//! only on the step that owns the field; `Next` validates the current step and
//! hands back the `ProfilePatch` to persist, so progress survives a reload.

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::api::MailApi;
use crate::error::ApiError;
use crate::types::{ProfilePatch, UserProfile};
use crate::util::parse_clock_time;
use crate::vip::{VipError, VipList};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WizardStep {
    Welcome,
    ConnectAccount,
    VipContacts,
    AboutYou,
    Priorities,
    WorkHours,
    Complete,
}

impl WizardStep {
    pub const ORDER: [WizardStep; 7] = [
        WizardStep::Welcome,
        WizardStep::ConnectAccount,
        WizardStep::VipContacts,
        WizardStep::AboutYou,
        WizardStep::Priorities,
        WizardStep::WorkHours,
        WizardStep::Complete,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            WizardStep::Welcome => "welcome",
            WizardStep::ConnectAccount => "connect_account",
            WizardStep::VipContacts => "vip_contacts",
            WizardStep::AboutYou => "about_you",
            WizardStep::Priorities => "priorities",
            WizardStep::WorkHours => "work_hours",
            WizardStep::Complete => "complete",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ORDER.into_iter().find(|s| s.as_str() == value.trim())
    }

    pub fn index(&self) -> usize {
        Self::ORDER.iter().position(|s| s == self).unwrap_or(0)
    }

    pub fn next(&self) -> Option<Self> {
        Self::ORDER.get(self.index() + 1).copied()
    }

    pub fn prev(&self) -> Option<Self> {
        self.index().checked_sub(1).map(|i| Self::ORDER[i])
    }

    pub fn title(&self) -> &'static str {
        match self {
            WizardStep::Welcome => "Welcome",
            WizardStep::ConnectAccount => "Connect your email",
            WizardStep::VipContacts => "Who matters most?",
            WizardStep::AboutYou => "About you",
            WizardStep::Priorities => "Your priorities",
            WizardStep::WorkHours => "Work hours",
            WizardStep::Complete => "You're all set",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WizardAction {
    AccountConnected(String),
    AddVip(String),
    RemoveVip(String),
    SetRole(String),
    SetCompany(String),
    SetLocation(String),
    AddPriority(String),
    RemovePriority(String),
    AddProject(String),
    RemoveProject(String),
    SetWorkHours { start: NaiveTime, end: NaiveTime },
    /// 0 = Sunday .. 6 = Saturday
    ToggleWorkDay(u8),
    SetTimezone(String),
    Next,
    Back,
}

impl WizardAction {
    /// Step that owns the field this action edits. `None` for navigation.
    fn owner(&self) -> Option<WizardStep> {
        match self {
            WizardAction::AccountConnected(_) => Some(WizardStep::ConnectAccount),
            WizardAction::AddVip(_) | WizardAction::RemoveVip(_) => Some(WizardStep::VipContacts),
            WizardAction::SetRole(_) | WizardAction::SetCompany(_) | WizardAction::SetLocation(_) => {
                Some(WizardStep::AboutYou)
            }
            WizardAction::AddPriority(_)
            | WizardAction::RemovePriority(_)
            | WizardAction::AddProject(_)
            | WizardAction::RemoveProject(_) => Some(WizardStep::Priorities),
            WizardAction::SetWorkHours { .. }
            | WizardAction::ToggleWorkDay(_)
            | WizardAction::SetTimezone(_) => Some(WizardStep::WorkHours),
            WizardAction::Next | WizardAction::Back => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum WizardError {
    #[error("That change belongs to the {expected:?} step, not {current:?}")]
    WrongStep {
        expected: WizardStep,
        current: WizardStep,
    },

    #[error("Connect at least one email account to continue")]
    NoConnectedAccount,

    #[error("Work hours must end after they start")]
    InvalidWorkHours,

    #[error("Pick at least one work day")]
    NoWorkDays,

    #[error("Invalid weekday {0}")]
    InvalidWorkDay(u8),

    #[error("Value cannot be empty")]
    EmptyValue,

    #[error("Onboarding is already complete")]
    AlreadyComplete,

    #[error("Already at the first step")]
    AtFirstStep,

    #[error(transparent)]
    Vip(#[from] VipError),

    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Values collected so far.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WizardDraft {
    pub connected_accounts: Vec<String>,
    pub vips: VipList,
    pub role: Option<String>,
    pub company: Option<String>,
    pub location: Option<String>,
    pub priorities: Vec<String>,
    pub projects: Vec<String>,
    pub work_hours_start: NaiveTime,
    pub work_hours_end: NaiveTime,
    pub work_days: Vec<u8>,
    pub timezone: Option<String>,
}

fn default_start() -> NaiveTime {
    NaiveTime::from_hms_opt(9, 0, 0).unwrap_or(NaiveTime::MIN)
}

fn default_end() -> NaiveTime {
    NaiveTime::from_hms_opt(17, 0, 0).unwrap_or(NaiveTime::MIN)
}

impl WizardDraft {
    pub fn new(vip_limit: usize) -> Self {
        Self {
            connected_accounts: Vec::new(),
            vips: VipList::new(vip_limit),
            role: None,
            company: None,
            location: None,
            priorities: Vec::new(),
            projects: Vec::new(),
            work_hours_start: default_start(),
            work_hours_end: default_end(),
            work_days: vec![1, 2, 3, 4, 5],
            timezone: None,
        }
    }

    fn from_profile(profile: &UserProfile, vip_limit: usize) -> Self {
        let mut draft = Self::new(vip_limit);
        draft.connected_accounts = profile.connected_accounts.clone();
        draft.vips = VipList::from_saved(&profile.vip_emails, vip_limit);
        draft.role = profile.role.clone();
        draft.company = profile.company.clone();
        draft.location = profile.location.clone();
        draft.priorities = profile.priorities.clone();
        draft.projects = profile.projects.clone();
        if let Some(t) = profile.work_hours_start.as_deref().and_then(parse_clock_time) {
            draft.work_hours_start = t;
        }
        if let Some(t) = profile.work_hours_end.as_deref().and_then(parse_clock_time) {
            draft.work_hours_end = t;
        }
        if !profile.work_days.is_empty() {
            draft.work_days = profile.work_days.clone();
        }
        draft.timezone = profile.timezone.clone();
        draft
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Wizard {
    step: WizardStep,
    draft: WizardDraft,
}

impl Wizard {
    pub fn new(vip_limit: usize) -> Self {
        Self {
            step: WizardStep::Welcome,
            draft: WizardDraft::new(vip_limit),
        }
    }

    /// Pick up where the user left off.
    pub fn resume(profile: &UserProfile, vip_limit: usize) -> Self {
        let step = if profile.onboarding_completed {
            WizardStep::Complete
        } else {
            profile
                .onboarding_step
                .as_deref()
                .and_then(WizardStep::parse)
                .unwrap_or(WizardStep::Welcome)
        };
        Self {
            step,
            draft: WizardDraft::from_profile(profile, vip_limit),
        }
    }

    pub fn step(&self) -> WizardStep {
        self.step
    }

    pub fn draft(&self) -> &WizardDraft {
        &self.draft
    }

    pub fn is_complete(&self) -> bool {
        self.step == WizardStep::Complete
    }

    /// 0.0 on the first step, 1.0 when complete.
    pub fn progress(&self) -> f32 {
        self.step.index() as f32 / (WizardStep::ORDER.len() - 1) as f32
    }

    /// Apply one action. Returns the patch to persist when the step advanced.
    pub fn dispatch(&mut self, action: WizardAction) -> Result<Option<ProfilePatch>, WizardError> {
        if let Some(expected) = action.owner() {
            if expected != self.step {
                return Err(WizardError::WrongStep {
                    expected,
                    current: self.step,
                });
            }
        }

        let draft = &mut self.draft;
        match action {
            WizardAction::AccountConnected(email) => {
                let email = non_empty(&email)?.to_lowercase();
                if !draft.connected_accounts.contains(&email) {
                    draft.connected_accounts.push(email);
                }
            }
            WizardAction::AddVip(email) => {
                draft.vips.add(&email)?;
            }
            WizardAction::RemoveVip(email) => {
                draft.vips.remove(&email);
            }
            WizardAction::SetRole(v) => draft.role = optional(&v),
            WizardAction::SetCompany(v) => draft.company = optional(&v),
            WizardAction::SetLocation(v) => draft.location = optional(&v),
            WizardAction::AddPriority(v) => push_unique(&mut draft.priorities, non_empty(&v)?),
            WizardAction::RemovePriority(v) => draft.priorities.retain(|p| p != v.trim()),
            WizardAction::AddProject(v) => push_unique(&mut draft.projects, non_empty(&v)?),
            WizardAction::RemoveProject(v) => draft.projects.retain(|p| p != v.trim()),
            WizardAction::SetWorkHours { start, end } => {
                if end <= start {
                    return Err(WizardError::InvalidWorkHours);
                }
                draft.work_hours_start = start;
                draft.work_hours_end = end;
            }
            WizardAction::ToggleWorkDay(day) => {
                if day > 6 {
                    return Err(WizardError::InvalidWorkDay(day));
                }
                if let Some(pos) = draft.work_days.iter().position(|d| *d == day) {
                    draft.work_days.remove(pos);
                } else {
                    draft.work_days.push(day);
                    draft.work_days.sort_unstable();
                }
            }
            WizardAction::SetTimezone(tz) => draft.timezone = optional(&tz),
            WizardAction::Next => return self.advance().map(Some),
            WizardAction::Back => {
                self.step = self.step.prev().ok_or(WizardError::AtFirstStep)?;
            }
        }
        Ok(None)
    }

    /// Dispatch and persist the resulting patch. The wizard only changes once
    /// the server accepted the patch.
    pub async fn dispatch_and_save(
        &mut self,
        api: &dyn MailApi,
        action: WizardAction,
    ) -> Result<(), WizardError> {
        let leaving = self.step;
        let mut next = self.clone();
        if let Some(patch) = next.dispatch(action)? {
            if leaving == WizardStep::VipContacts {
                next.draft.vips.persist(api).await?;
            }
            api.update_profile(&patch).await?;
            log::info!("Onboarding: {} → {}", leaving.as_str(), next.step.as_str());
        }
        *self = next;
        Ok(())
    }

    fn advance(&mut self) -> Result<ProfilePatch, WizardError> {
        let next = self.step.next().ok_or(WizardError::AlreadyComplete)?;
        self.validate_current()?;

        let mut patch = self.step_patch();
        patch.onboarding_step = Some(next.as_str().to_string());
        if next == WizardStep::Complete {
            patch.onboarding_completed = Some(true);
        }
        self.step = next;
        Ok(patch)
    }

    fn validate_current(&self) -> Result<(), WizardError> {
        match self.step {
            WizardStep::ConnectAccount if self.draft.connected_accounts.is_empty() => {
                Err(WizardError::NoConnectedAccount)
            }
            WizardStep::WorkHours => {
                if self.draft.work_hours_end <= self.draft.work_hours_start {
                    Err(WizardError::InvalidWorkHours)
                } else if self.draft.work_days.is_empty() {
                    Err(WizardError::NoWorkDays)
                } else {
                    Ok(())
                }
            }
            _ => Ok(()),
        }
    }

    /// Fields owned by the current step.
    fn step_patch(&self) -> ProfilePatch {
        let d = &self.draft;
        match self.step {
            WizardStep::VipContacts => ProfilePatch {
                vip_emails: Some(d.vips.emails().to_vec()),
                ..Default::default()
            },
            WizardStep::AboutYou => ProfilePatch {
                role: Some(d.role.clone()),
                company: Some(d.company.clone()),
                location: Some(d.location.clone()),
                ..Default::default()
            },
            WizardStep::Priorities => ProfilePatch {
                priorities: Some(d.priorities.clone()),
                projects: Some(d.projects.clone()),
                ..Default::default()
            },
            WizardStep::WorkHours => ProfilePatch {
                work_hours_start: Some(d.work_hours_start.format("%H:%M").to_string()),
                work_hours_end: Some(d.work_hours_end.format("%H:%M").to_string()),
                work_days: Some(d.work_days.clone()),
                timezone: Some(d.timezone.clone()),
                ..Default::default()
            },
            WizardStep::Welcome | WizardStep::ConnectAccount | WizardStep::Complete => {
                ProfilePatch::default()
            }
        }
    }
}

fn non_empty(value: &str) -> Result<&str, WizardError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(WizardError::EmptyValue)
    } else {
        Ok(trimmed)
    }
}

fn optional(value: &str) -> Option<String> {
    Some(value.trim().to_string()).filter(|s| !s.is_empty())
}

fn push_unique(list: &mut Vec<String>, value: &str) {
    if !list.iter().any(|v| v.eq_ignore_ascii_case(value)) {
        list.push(value.to_string());
    }
}
