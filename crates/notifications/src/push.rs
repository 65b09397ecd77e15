//! Push delivery through a hosted notification REST API.
//!
//! Every payload is POSTed as JSON with the configured `app_id` merged in and
//! the REST key sent as `Authorization: Basic <key>`.

use async_trait::async_trait;
use reseller_core::config::PushConfig;
use reseller_core::{ResellerError, ResellerResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocalizedText {
    pub en: String,
}

impl From<&str> for LocalizedText {
    fn from(s: &str) -> Self {
        Self { en: s.to_string() }
    }
}

impl From<String> for LocalizedText {
    fn from(en: String) -> Self {
        Self { en }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationPayload {
    pub headings: LocalizedText,
    pub contents: LocalizedText,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub included_segments: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub data: BTreeMap<String, serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl NotificationPayload {
    /// Broadcast to every subscriber, tagged with `data.type = kind`.
    pub fn broadcast(kind: &str, heading: impl Into<LocalizedText>, content: impl Into<LocalizedText>) -> Self {
        let mut data = BTreeMap::new();
        data.insert("type".to_string(), serde_json::Value::from(kind));
        Self {
            headings: heading.into(),
            contents: content.into(),
            included_segments: Some(vec!["All".to_string()]),
            data,
            url: None,
        }
    }

    pub fn with_data(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
        self.data.insert(key.to_string(), value.into());
        self
    }

    pub fn kind(&self) -> Option<&str> {
        self.data.get("type").and_then(|v| v.as_str())
    }
}

/// Delivery seam; the service only ever talks to this.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, payload: &NotificationPayload) -> ResellerResult<()>;

    fn name(&self) -> &'static str;
}

/// Used when push is switched off or missing credentials.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopNotifier;

#[async_trait]
impl Notifier for NoopNotifier {
    async fn send(&self, payload: &NotificationPayload) -> ResellerResult<()> {
        debug!(heading = %payload.headings.en, "push disabled, dropping notification");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "noop"
    }
}

/// Keeps every payload in memory. Handy for wiring tests.
#[derive(Debug, Default)]
pub struct MemoryNotifier {
    sent: Mutex<Vec<NotificationPayload>>,
}

impl MemoryNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn sent(&self) -> Vec<NotificationPayload> {
        self.sent.lock().await.clone()
    }
}

#[async_trait]
impl Notifier for MemoryNotifier {
    async fn send(&self, payload: &NotificationPayload) -> ResellerResult<()> {
        self.sent.lock().await.push(payload.clone());
        Ok(())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

pub struct PushClient {
    http: reqwest::Client,
    api_url: String,
    app_id: String,
    rest_api_key: String,
}

impl PushClient {
    pub fn new(config: &PushConfig) -> ResellerResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| ResellerError::Config(format!("push client: {e}")))?;
        Ok(Self {
            http,
            api_url: config.api_url.clone(),
            app_id: config.app_id.clone(),
            rest_api_key: config.rest_api_key.clone(),
        })
    }

    /// JSON body actually sent: the payload with `app_id` added at the top level.
    pub fn request_body(&self, payload: &NotificationPayload) -> ResellerResult<serde_json::Value> {
        let mut body = serde_json::to_value(payload)?;
        if let Some(object) = body.as_object_mut() {
            object.insert("app_id".to_string(), serde_json::Value::from(self.app_id.as_str()));
        }
        Ok(body)
    }
}

#[async_trait]
impl Notifier for PushClient {
    async fn send(&self, payload: &NotificationPayload) -> ResellerResult<()> {
        let body = self.request_body(payload)?;
        let response = self
            .http
            .post(&self.api_url)
            .header(reqwest::header::AUTHORIZATION, format!("Basic {}", self.rest_api_key))
            .json(&body)
            .send()
            .await
            .map_err(|e| ResellerError::Notification(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            debug!(status = status.as_u16(), heading = %payload.headings.en, "push accepted");
            return Ok(());
        }

        let detail = response.text().await.unwrap_or_default();
        warn!(status = status.as_u16(), detail = %detail, "push rejected");
        Err(ResellerError::Notification(format!(
            "push API returned {status}: {detail}"
        )))
    }

    fn name(&self) -> &'static str {
        "push"
    }
}
