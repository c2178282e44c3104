use crate::domain::model::{VoiceCommandPayload, WebhookResponse};
use crate::utils::error::{ProbeError, Result};
use crate::utils::validation::validate_url;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::{Client, RequestBuilder};
use serde_json::Value;
use std::time::Duration;

const PREVIEW_LIMIT: usize = 200;

/// 工作流實例的 webhook 客戶端，所有請求共用同一個連線池
#[derive(Debug, Clone)]
pub struct WebhookClient {
    base_url: String,
    client: Client,
}

impl WebhookClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        validate_url("base_url", base_url)?;

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn endpoint(&self, name: &str) -> String {
        format!("{}/webhook/{}", self.base_url, name)
    }

    pub async fn post_voice_command(&self, payload: &VoiceCommandPayload) -> Result<WebhookResponse> {
        let url = self.endpoint("voice-command");
        tracing::debug!("POST {} (audio_url: {:?})", url, payload.audio_url);
        self.execute(url.clone(), self.client.post(&url).json(payload))
            .await
    }

    /// 原樣送出任意 JSON，用於錯誤情境
    pub async fn post_payload(&self, payload: &Value) -> Result<WebhookResponse> {
        let url = self.endpoint("voice-command");
        tracing::debug!("POST {} with raw payload: {}", url, payload);
        self.execute(url.clone(), self.client.post(&url).json(payload))
            .await
    }

    pub async fn get_balance(&self, exchange: &str) -> Result<WebhookResponse> {
        self.get_with_exchange("balance", exchange).await
    }

    pub async fn get_orders(&self, exchange: &str) -> Result<WebhookResponse> {
        self.get_with_exchange("orders", exchange).await
    }

    async fn get_with_exchange(&self, name: &str, exchange: &str) -> Result<WebhookResponse> {
        let url = self.endpoint(name);
        tracing::debug!("GET {}?exchange={}", url, exchange);
        self.execute(
            url.clone(),
            self.client.get(&url).query(&[("exchange", exchange)]),
        )
        .await
    }

    async fn execute(&self, url: String, request: RequestBuilder) -> Result<WebhookResponse> {
        let response = request.send().await?;
        let status = response.status().as_u16();
        tracing::debug!("Webhook response status: {}", status);

        // 非 2xx 不視為錯誤，狀態碼與內容交給探測判讀
        let text = response.text().await?;
        let body = serde_json::from_str::<Value>(&text).map_err(|_| {
            tracing::warn!("⚠️ Non-JSON body from {} (status {})", url, status);
            ProbeError::InvalidResponse {
                status,
                preview: preview(&text),
            }
        })?;

        Ok(WebhookResponse { url, status, body })
    }
}

fn preview(text: &str) -> String {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return "<empty body>".to_string();
    }
    match trimmed.char_indices().nth(PREVIEW_LIMIT) {
        Some((idx, _)) => format!("{}...", &trimmed[..idx]),
        None => trimmed.to_string(),
    }
}
