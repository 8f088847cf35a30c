use std::sync::OnceLock;

use chrono::NaiveTime;
use regex::Regex;

use crate::types::Contact;

fn email_re() -> &'static Regex {
    static EMAIL_RE: OnceLock<Regex> = OnceLock::new();
    EMAIL_RE.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9._%+\-']+@[A-Za-z0-9\-]+(\.[A-Za-z0-9\-]+)*\.[A-Za-z]{2,}$")
            .expect("static email regex")
    })
}

/// Canonical form used for comparisons: trimmed + lowercase.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Loose address check; the server remains the source of truth.
pub fn is_valid_email(email: &str) -> bool {
    email_re().is_match(email.trim())
}

/// Parse a wall-clock time as stored by the API or emitted by the model.
///
/// Accepts `HH:MM`, `HH:MM:SS` and `HH:MM:SS.fff`.
pub fn parse_clock_time(value: &str) -> Option<NaiveTime> {
    let value = value.trim();
    NaiveTime::parse_from_str(value, "%H:%M:%S%.f")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M"))
        .ok()
}

/// Derive a display name from an email address (best-effort).
///
/// Example: "sarah.chen@acme.com" → "Sarah Chen"
pub fn name_from_email(email: &str) -> String {
    let local = email.split('@').next().unwrap_or(email);
    local
        .split(['.', '_', '-', '+'])
        .filter(|s| !s.is_empty())
        .map(capitalize)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Derive a company name from an email domain.
///
/// Free-mail providers yield `None`. Example: "sarah@acme.com" → "Acme"
pub fn company_from_email(email: &str) -> Option<String> {
    const PERSONAL_DOMAINS: &[&str] = &[
        "gmail.com", "googlemail.com", "yahoo.com", "hotmail.com", "outlook.com",
        "icloud.com", "me.com", "aol.com", "proton.me", "protonmail.com",
    ];

    let domain = email.rsplit_once('@').map(|(_, d)| d.to_lowercase())?;
    if PERSONAL_DOMAINS.contains(&domain.as_str()) {
        return None;
    }
    let org = domain.split('.').next().filter(|s| !s.is_empty())?;
    Some(capitalize(org))
}

/// Name to show for a contact: stored name, else one derived from the address.
pub fn contact_display_name(contact: &Contact) -> String {
    match contact.name.as_deref().map(str::trim) {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => name_from_email(&contact.email),
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(c) => c.to_uppercase().to_string() + chars.as_str(),
        None => String::new(),
    }
}
