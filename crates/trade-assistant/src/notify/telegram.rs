//! Telegram Bot API client

use super::ChatTransport;
use crate::error::{AssistantError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const TELEGRAM_API_BASE: &str = "https://api.telegram.org";
const SERVICE: &str = "telegram";

/// One inbound update
#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<IncomingMessage>,
}

/// Inbound chat message
#[derive(Debug, Clone, Deserialize)]
pub struct IncomingMessage {
    pub chat: Chat,
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
}

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

#[derive(Debug, Serialize)]
struct SendMessageRequest<'a> {
    chat_id: &'a str,
    text: &'a str,
}

/// Telegram Bot API client
#[derive(Debug, Clone)]
pub struct TelegramClient {
    http: Client,
    token: String,
    api_base: String,
}

impl TelegramClient {
    pub fn new(token: impl Into<String>) -> Result<Self> {
        // Long polls hold the connection for up to 30s
        let http = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| AssistantError::upstream(SERVICE, e))?;
        Ok(Self {
            http,
            token: token.into(),
            api_base: TELEGRAM_API_BASE.to_string(),
        })
    }

    /// Point the client at a different API base (tests)
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    fn url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.api_base, self.token, method)
    }

    async fn decode<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<Option<T>> {
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AssistantError::upstream(SERVICE, e))?;
        if !status.is_success() {
            return Err(AssistantError::upstream(
                SERVICE,
                format!("HTTP {}: {}", status.as_u16(), body),
            ));
        }

        let parsed: ApiResponse<T> = serde_json::from_str(&body)
            .map_err(|e| AssistantError::upstream(SERVICE, format!("bad response: {e}")))?;
        if !parsed.ok {
            return Err(AssistantError::upstream(
                SERVICE,
                parsed.description.unwrap_or_else(|| "request failed".into()),
            ));
        }
        Ok(parsed.result)
    }

    /// Long-poll for updates after `offset`
    pub async fn get_updates(&self, offset: i64, timeout_secs: u64) -> Result<Vec<Update>> {
        let response = self
            .http
            .get(self.url("getUpdates"))
            .query(&[("offset", offset.to_string()), ("timeout", timeout_secs.to_string())])
            .send()
            .await
            .map_err(|e| AssistantError::upstream(SERVICE, e))?;

        Ok(Self::decode::<Vec<Update>>(response).await?.unwrap_or_default())
    }
}

#[async_trait]
impl ChatTransport for TelegramClient {
    #[tracing::instrument(skip(self, text), fields(len = text.len()))]
    async fn send(&self, chat_id: &str, text: &str) -> Result<()> {
        let response = self
            .http
            .post(self.url("sendMessage"))
            .json(&SendMessageRequest { chat_id, text })
            .send()
            .await
            .map_err(|e| AssistantError::upstream(SERVICE, e))?;

        Self::decode::<serde_json::Value>(response).await?;
        Ok(())
    }
}
