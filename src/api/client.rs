//! HTTP implementation of `MailApi` over reqwest.
//!
//! No automatic retries: every retry in the UI is a button press.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::COOKIE;
use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use url::Url;
use uuid::Uuid;

use super::MailApi;
use crate::analysis::EmailAnalysis;
use crate::config::Config;
use crate::contacts::ContactQueryOptions;
use crate::error::ApiError;
use crate::sync::{SyncRequest, SyncResponse};
use crate::timeline::{DateAction, DateQuery};
use crate::types::{
    Contact, ContactPage, ContactUpdate, ExtractedDate, Idea, ProfilePatch, SyncStats, UserProfile,
};

const REQUEST_TIMEOUT_SECS: u64 = 60;

pub struct HttpMailApi {
    client: reqwest::Client,
    base_url: Url,
    session_cookie: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DatesEnvelope {
    #[serde(default)]
    dates: Vec<ExtractedDate>,
}

#[derive(Debug, Deserialize)]
struct MarkVipResponse {
    #[serde(default)]
    updated: u32,
}

#[derive(Debug, Deserialize)]
struct CreatedResponse {
    id: Uuid,
}

#[derive(Debug, Deserialize)]
struct AnalyzeResponse {
    analysis: serde_json::Value,
}

impl HttpMailApi {
    pub fn new(base_url: &str, session_cookie: Option<String>) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;
        Ok(Self {
            client,
            base_url: Url::parse(base_url)?,
            session_cookie,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, ApiError> {
        Self::new(&config.api_base_url, config.session_cookie.clone())
    }

    /// Absolute URL for an API path such as `/api/contacts`.
    pub fn url(&self, path: &str) -> Result<Url, ApiError> {
        Ok(self.base_url.join(path)?)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let mut builder = self.client.request(method, url);
        if let Some(cookie) = self.session_cookie.as_deref() {
            builder = builder.header(COOKIE, cookie);
        }
        builder
    }

    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, ApiError> {
        let resp = builder.send().await?;
        let status = resp.status();
        let url = resp.url().path().to_string();

        let body = if status.is_success() {
            resp.text().await?
        } else {
            resp.text().await.unwrap_or_default()
        };
        decode_response(status.as_u16(), &body).map_err(|err| {
            log::warn!("mail api {} failed with {}: {}", url, status, err);
            err
        })
    }
}

/// Map a raw response to the typed body or to the error the status implies.
fn decode_response<T: DeserializeOwned>(status: u16, body: &str) -> Result<T, ApiError> {
    if !(200..300).contains(&status) {
        return Err(ApiError::from_status(status, body));
    }
    Ok(serde_json::from_str(body)?)
}

#[async_trait]
impl MailApi for HttpMailApi {
    async fn list_contacts(&self, query: &ContactQueryOptions) -> Result<ContactPage, ApiError> {
        let mut url = self.url("/api/contacts")?;
        url.query_pairs_mut().extend_pairs(query.to_query_pairs());
        self.send(self.request(Method::GET, url)).await
    }

    async fn get_contact(&self, id: Uuid) -> Result<Contact, ApiError> {
        let url = self.url(&format!("/api/contacts/{}", id))?;
        self.send(self.request(Method::GET, url)).await
    }

    async fn update_contact(&self, id: Uuid, update: &ContactUpdate) -> Result<Contact, ApiError> {
        let url = self.url(&format!("/api/contacts/{}", id))?;
        self.send(self.request(Method::PUT, url).json(update)).await
    }

    async fn mark_vip(&self, emails: &[String]) -> Result<u32, ApiError> {
        let url = self.url("/api/contacts/mark-vip")?;
        let body = serde_json::json!({ "emails": emails });
        let resp: MarkVipResponse = self.send(self.request(Method::POST, url).json(&body)).await?;
        Ok(resp.updated)
    }

    async fn get_profile(&self) -> Result<UserProfile, ApiError> {
        let url = self.url("/api/profile")?;
        self.send(self.request(Method::GET, url)).await
    }

    async fn update_profile(&self, patch: &ProfilePatch) -> Result<UserProfile, ApiError> {
        let url = self.url("/api/profile")?;
        self.send(self.request(Method::PATCH, url).json(patch)).await
    }

    async fn sync_emails(&self, request: &SyncRequest) -> Result<SyncResponse, ApiError> {
        let url = self.url("/api/emails/sync")?;
        log::info!("mail api: starting email sync");
        self.send(self.request(Method::POST, url).json(request)).await
    }

    async fn sync_stats(&self) -> Result<SyncStats, ApiError> {
        let url = self.url("/api/emails/sync/status")?;
        self.send(self.request(Method::GET, url)).await
    }

    async fn analyze_email(&self, email_id: Uuid) -> Result<EmailAnalysis, ApiError> {
        let url = self.url(&format!("/api/emails/{}/analyze", email_id))?;
        let resp: AnalyzeResponse = self.send(self.request(Method::POST, url)).await?;
        Ok(EmailAnalysis::parse(&resp.analysis)?)
    }

    async fn list_dates(&self, query: &DateQuery) -> Result<Vec<ExtractedDate>, ApiError> {
        let mut url = self.url("/api/dates")?;
        url.query_pairs_mut().extend_pairs(query.to_query_pairs());
        let resp: DatesEnvelope = self.send(self.request(Method::GET, url)).await?;
        Ok(resp.dates)
    }

    async fn update_date(&self, id: Uuid, action: DateAction) -> Result<ExtractedDate, ApiError> {
        let url = self.url(&format!("/api/dates/{}", id))?;
        self.send(self.request(Method::PATCH, url).json(&action)).await
    }

    async fn create_idea(&self, idea: &Idea) -> Result<Uuid, ApiError> {
        let url = self.url("/api/ideas")?;
        let resp: CreatedResponse = self.send(self.request(Method::POST, url).json(idea)).await?;
        Ok(resp.id)
    }
}
