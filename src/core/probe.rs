use crate::core::client::WebhookClient;
use crate::domain::model::{
    display_value, is_truthy, OrderResult, ProbeKind, ProbeOutcome, VoiceCommandPayload, WebhookResponse,
};
use crate::domain::ports::Probe;
use crate::utils::error::Result;
use async_trait::async_trait;
use serde_json::Value;

const DEFAULT_TRADE_SUMMARY: &str = "Command processed";
const UNKNOWN_ERROR: &str = "Unknown error";

/// 送出語音檔 URL，預期工作流完成轉錄並下單
#[derive(Debug, Clone)]
pub struct VoiceCommandProbe {
    name: String,
    payload: VoiceCommandPayload,
    expected_transcription: String,
    enabled: bool,
}

impl VoiceCommandProbe {
    pub fn new(
        name: impl Into<String>,
        audio_url: impl Into<String>,
        user_id: impl Into<String>,
        expected_transcription: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            payload: VoiceCommandPayload::new(audio_url, user_id),
            expected_transcription: expected_transcription.into(),
            enabled: true,
        }
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }
}

#[async_trait]
impl Probe for VoiceCommandProbe {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> ProbeKind {
        ProbeKind::VoiceCommand
    }

    fn expectation(&self) -> &str {
        &self.expected_transcription
    }

    fn describe_request(&self) -> String {
        let body = serde_json::to_string(&self.payload).unwrap_or_default();
        format!("POST /webhook/voice-command {}", body)
    }

    fn announce(&self) -> Vec<String> {
        let audio_url = self.payload.audio_url.as_deref().unwrap_or_default();
        vec![format!("Testing voice command with audio: {}", audio_url)]
    }

    async fn send(&self, client: &WebhookClient) -> Result<WebhookResponse> {
        client.post_voice_command(&self.payload).await
    }

    fn evaluate(&self, response: &WebhookResponse) -> ProbeOutcome {
        classify_voice_response(response)
    }

    fn should_execute(&self) -> bool {
        self.enabled
    }
}

/// 送出刻意錯誤的內容，預期工作流走錯誤分支
#[derive(Debug, Clone)]
pub struct ErrorScenarioProbe {
    name: String,
    payload: Value,
    expected_error: String,
    enabled: bool,
}

impl ErrorScenarioProbe {
    pub fn new(name: impl Into<String>, payload: Value, expected_error: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            payload,
            expected_error: expected_error.into(),
            enabled: true,
        }
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }
}

#[async_trait]
impl Probe for ErrorScenarioProbe {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> ProbeKind {
        ProbeKind::ErrorScenario
    }

    fn expectation(&self) -> &str {
        &self.expected_error
    }

    fn describe_request(&self) -> String {
        format!("POST /webhook/voice-command {}", self.payload)
    }

    fn announce(&self) -> Vec<String> {
        announce_error_payload(&self.payload)
    }

    async fn send(&self, client: &WebhookClient) -> Result<WebhookResponse> {
        client.post_payload(&self.payload).await
    }

    fn evaluate(&self, response: &WebhookResponse) -> ProbeOutcome {
        classify_error_response(response)
    }

    fn should_execute(&self) -> bool {
        self.enabled
    }
}

/// 餘額或訂單查詢，只記錄回應
#[derive(Debug, Clone)]
pub struct AccountQueryProbe {
    name: String,
    kind: ProbeKind,
    exchange: String,
    expectation: String,
    enabled: bool,
}

impl AccountQueryProbe {
    pub fn balance(exchange: impl Into<String>) -> Self {
        let exchange = exchange.into();
        Self {
            name: format!("Balance ({})", exchange),
            kind: ProbeKind::Balance,
            expectation: format!("Balance retrieval for {}", exchange),
            exchange,
            enabled: true,
        }
    }

    pub fn orders(exchange: impl Into<String>) -> Self {
        let exchange = exchange.into();
        Self {
            name: format!("Orders ({})", exchange),
            kind: ProbeKind::Orders,
            expectation: format!("Orders retrieval for {}", exchange),
            exchange,
            enabled: true,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }
}

#[async_trait]
impl Probe for AccountQueryProbe {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> ProbeKind {
        self.kind
    }

    fn expectation(&self) -> &str {
        &self.expectation
    }

    fn describe_request(&self) -> String {
        let path = match self.kind {
            ProbeKind::Orders => "orders",
            _ => "balance",
        };
        format!("GET /webhook/{}?exchange={}", path, self.exchange)
    }

    fn announce(&self) -> Vec<String> {
        let what = match self.kind {
            ProbeKind::Orders => "orders",
            _ => "balance",
        };
        vec![format!("Testing {} retrieval for {}", what, self.exchange)]
    }

    async fn send(&self, client: &WebhookClient) -> Result<WebhookResponse> {
        match self.kind {
            ProbeKind::Orders => client.get_orders(&self.exchange).await,
            _ => client.get_balance(&self.exchange).await,
        }
    }

    fn evaluate(&self, _response: &WebhookResponse) -> ProbeOutcome {
        ProbeOutcome::Observed
    }

    fn should_execute(&self) -> bool {
        self.enabled
    }
}

/// 依錯誤內容的形狀描述要測試的分支
fn announce_error_payload(payload: &Value) -> Vec<String> {
    match payload.get("audio_url") {
        Some(Value::String(url)) if !url.is_empty() => vec![
            "Testing voice command that should trigger error response".to_string(),
            "Note: This tests the workflow's error handling paths".to_string(),
        ],
        Some(_) => vec!["Testing voice command with empty audio URL".to_string()],
        None if payload.get("user_id").is_some() => {
            vec!["Testing voice command with no audio input".to_string()]
        }
        None => vec!["Testing voice command with malformed request".to_string()],
    }
}

pub fn classify_voice_response(response: &WebhookResponse) -> ProbeOutcome {
    let succeeded = response.field("success").map(is_truthy).unwrap_or(false);

    if succeeded {
        let trade_summary = response
            .text_field("trade_summary")
            .unwrap_or_else(|| DEFAULT_TRADE_SUMMARY.to_string());
        let order = response.field("order_result").and_then(OrderResult::from_value);
        ProbeOutcome::Accepted {
            trade_summary,
            order,
        }
    } else {
        ProbeOutcome::Rejected {
            error: response
                .text_field("error")
                .unwrap_or_else(|| UNKNOWN_ERROR.to_string()),
        }
    }
}

/// `error` 欄位優先；其次是值為假的 `success`
pub fn classify_error_response(response: &WebhookResponse) -> ProbeOutcome {
    if let Some(error) = response.field("error") {
        let error = if error.is_null() {
            UNKNOWN_ERROR.to_string()
        } else {
            display_value(error)
        };
        return ProbeOutcome::ErrorCaught {
            error,
            message: response.text_field("message"),
        };
    }

    if let Some(success) = response.field("success") {
        if !is_truthy(success) {
            return ProbeOutcome::ErrorHandled {
                message: response
                    .text_field("message")
                    .unwrap_or_else(|| UNKNOWN_ERROR.to_string()),
            };
        }
    }

    ProbeOutcome::Unexpected {
        body: response.body.clone(),
    }
}
