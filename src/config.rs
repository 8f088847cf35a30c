//! Client configuration loaded from `~/.mailbrief/config.json`.

use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use chrono::NaiveDate;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    pub api_base_url: String,
    /// Session cookie sent with every request (`name=value`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_cookie: Option<String>,
    /// IANA timezone used to decide what "today" is.
    #[serde(default = "default_timezone")]
    pub timezone: String,
    #[serde(default)]
    pub sync: SyncConfig,
    #[serde(default)]
    pub timeline: TimelineConfig,
    #[serde(default)]
    pub contacts: ContactsConfig,
    #[serde(default = "default_vip_limit")]
    pub vip_limit: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncConfig {
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    /// How long the success banner stays up before reverting to idle.
    #[serde(default = "default_success_revert_secs")]
    pub success_revert_secs: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval_secs(),
            success_revert_secs: default_success_revert_secs(),
        }
    }
}

impl SyncConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs.max(1))
    }

    pub fn success_revert(&self) -> Duration {
        Duration::from_secs(self.success_revert_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineConfig {
    /// Dates further out than this are left off the timeline. `null` disables the cutoff.
    #[serde(default = "default_horizon_days")]
    pub horizon_days: Option<i64>,
    #[serde(default)]
    pub show_done: bool,
}

impl Default for TimelineConfig {
    fn default() -> Self {
        Self {
            horizon_days: default_horizon_days(),
            show_done: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactsConfig {
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

impl Default for ContactsConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
        }
    }
}

/// Upper bound for `timeline.horizonDays` (about a century).
pub const MAX_HORIZON_DAYS: i64 = 36_500;

fn default_timezone() -> String {
    "UTC".to_string()
}

fn default_poll_interval_secs() -> u64 {
    30
}

fn default_success_revert_secs() -> u64 {
    4
}

fn default_horizon_days() -> Option<i64> {
    Some(90)
}

fn default_page_size() -> u32 {
    50
}

fn default_vip_limit() -> usize {
    25
}

impl Config {
    pub fn new(api_base_url: &str) -> Self {
        Self {
            api_base_url: api_base_url.to_string(),
            session_cookie: None,
            timezone: default_timezone(),
            sync: SyncConfig::default(),
            timeline: TimelineConfig::default(),
            contacts: ContactsConfig::default(),
            vip_limit: default_vip_limit(),
        }
    }

    /// Resolve the configured timezone, falling back to UTC.
    pub fn tz(&self) -> Tz {
        match Tz::from_str(&self.timezone) {
            Ok(tz) => tz,
            Err(_) => {
                log::warn!("Unknown timezone '{}', using UTC", self.timezone);
                Tz::UTC
            }
        }
    }

    /// Today's date in the user's timezone.
    pub fn today(&self) -> NaiveDate {
        chrono::Utc::now().with_timezone(&self.tz()).date_naive()
    }
}

/// Default config location: `~/.mailbrief/config.json`.
pub fn config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".mailbrief").join("config.json"))
}

pub fn load_config() -> Result<Config, String> {
    let path = config_path().ok_or("Could not find home directory")?;
    if !path.exists() {
        return Err(format!(
            "Config file not found at {}. Create it with: {{ \"apiBaseUrl\": \"https://app.example.com\" }}",
            path.display()
        ));
    }
    load_config_from(&path)
}

pub fn load_config_from(path: &Path) -> Result<Config, String> {
    let content =
        fs::read_to_string(path).map_err(|e| format!("Failed to read config: {}", e))?;
    let config: Config =
        serde_json::from_str(&content).map_err(|e| format!("Failed to parse config: {}", e))?;

    url::Url::parse(&config.api_base_url)
        .map_err(|e| format!("Invalid apiBaseUrl '{}': {}", config.api_base_url, e))?;

    if let Some(days) = config.timeline.horizon_days {
        if !(0..=MAX_HORIZON_DAYS).contains(&days) {
            return Err(format!(
                "Invalid timeline.horizonDays {}: must be between 0 and {} (or null)",
                days, MAX_HORIZON_DAYS
            ));
        }
    }

    Ok(config)
}
