use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::time::Duration;

/// 語音指令 webhook 的請求內容
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VoiceCommandPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

impl VoiceCommandPayload {
    pub fn new(audio_url: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            audio_url: Some(audio_url.into()),
            user_id: Some(user_id.into()),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct WebhookResponse {
    pub url: String,
    pub status: u16,
    pub body: Value,
}

impl WebhookResponse {
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.body.as_object().and_then(|obj| obj.get(key))
    }

    pub fn has_field(&self, key: &str) -> bool {
        self.field(key).is_some()
    }

    /// 取得字串欄位；`null` 視為缺少，其他非字串值以 JSON 形式呈現
    pub fn text_field(&self, key: &str) -> Option<String> {
        self.field(key)
            .filter(|value| !value.is_null())
            .map(display_value)
    }
}

/// 下單結果，欄位型別由外部工作流決定，數字或字串皆可能
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrderResult {
    #[serde(default)]
    pub side: Option<Value>,
    #[serde(default)]
    pub quantity: Option<Value>,
    #[serde(default)]
    pub symbol: Option<Value>,
    #[serde(default)]
    pub price: Option<Value>,
}

impl OrderResult {
    pub fn from_value(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;
        Some(Self {
            side: obj.get("side").cloned(),
            quantity: obj.get("quantity").cloned(),
            symbol: obj.get("symbol").cloned(),
            price: obj.get("price").cloned(),
        })
    }
}

impl fmt::Display for OrderResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let part = |v: &Option<Value>| {
            v.as_ref()
                .filter(|v| !v.is_null())
                .map(display_value)
                .unwrap_or_else(|| "?".to_string())
        };
        write!(
            f,
            "{} {} {} @ {}",
            part(&self.side),
            part(&self.quantity),
            part(&self.symbol),
            part(&self.price)
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProbeKind {
    VoiceCommand,
    ErrorScenario,
    Balance,
    Orders,
}

impl ProbeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProbeKind::VoiceCommand => "voice_command",
            ProbeKind::ErrorScenario => "error_scenario",
            ProbeKind::Balance => "balance",
            ProbeKind::Orders => "orders",
        }
    }
}

impl fmt::Display for ProbeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ProbeOutcome {
    Accepted {
        trade_summary: String,
        order: Option<OrderResult>,
    },
    Rejected {
        error: String,
    },
    ErrorCaught {
        error: String,
        message: Option<String>,
    },
    ErrorHandled {
        message: String,
    },
    Unexpected {
        body: Value,
    },
    Observed,
    Exception {
        reason: String,
    },
}

impl ProbeOutcome {
    pub fn passed(&self) -> bool {
        matches!(
            self,
            ProbeOutcome::Accepted { .. }
                | ProbeOutcome::ErrorCaught { .. }
                | ProbeOutcome::ErrorHandled { .. }
                | ProbeOutcome::Observed
        )
    }

    pub fn label(&self) -> &'static str {
        match self {
            ProbeOutcome::Accepted { .. } => "accepted",
            ProbeOutcome::Rejected { .. } => "rejected",
            ProbeOutcome::ErrorCaught { .. } => "error_caught",
            ProbeOutcome::ErrorHandled { .. } => "error_handled",
            ProbeOutcome::Unexpected { .. } => "unexpected",
            ProbeOutcome::Observed => "observed",
            ProbeOutcome::Exception { .. } => "exception",
        }
    }

    /// 報表用的單行描述
    pub fn detail(&self) -> String {
        match self {
            ProbeOutcome::Accepted { trade_summary, order } => match order {
                Some(order) => format!("{} ({})", trade_summary, order),
                None => trade_summary.clone(),
            },
            ProbeOutcome::Rejected { error } => error.clone(),
            ProbeOutcome::ErrorCaught { error, message } => match message {
                Some(message) => format!("{}: {}", error, message),
                None => error.clone(),
            },
            ProbeOutcome::ErrorHandled { message } => message.clone(),
            ProbeOutcome::Unexpected { body } => body.to_string(),
            ProbeOutcome::Observed => String::new(),
            ProbeOutcome::Exception { reason } => reason.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ProbeResult {
    pub probe_name: String,
    pub kind: ProbeKind,
    pub expectation: String,
    pub status: Option<u16>,
    pub response: Option<Value>,
    pub outcome: ProbeOutcome,
    pub started_at: DateTime<Utc>,
    #[serde(rename = "duration_ms", serialize_with = "serialize_duration_ms")]
    pub duration: Duration,
}

impl ProbeResult {
    pub fn passed(&self) -> bool {
        self.outcome.passed()
    }
}

fn serialize_duration_ms<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_u64(duration.as_millis() as u64)
}

/// JSON 寬鬆真值：false、null、0、空字串、空陣列、空物件為假
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

pub fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_payload_omits_missing_fields() {
        let payload = VoiceCommandPayload {
            audio_url: None,
            user_id: Some("test_user".to_string()),
        };
        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(value, json!({ "user_id": "test_user" }));
    }

    #[test]
    fn test_truthiness() {
        assert!(is_truthy(&json!(true)));
        assert!(is_truthy(&json!(1)));
        assert!(is_truthy(&json!("yes")));
        assert!(!is_truthy(&json!(false)));
        assert!(!is_truthy(&json!(null)));
        assert!(!is_truthy(&json!(0)));
        assert!(!is_truthy(&json!("")));
        assert!(!is_truthy(&json!([])));
        assert!(!is_truthy(&json!({})));
    }

    #[test]
    fn test_order_result_display() {
        let order = OrderResult::from_value(&json!({
            "side": "buy",
            "quantity": 0.5,
            "symbol": "BTCUSDT",
            "price": "market"
        }))
        .unwrap();
        assert_eq!(order.to_string(), "buy 0.5 BTCUSDT @ market");

        let partial = OrderResult::from_value(&json!({ "side": "sell", "price": null })).unwrap();
        assert_eq!(partial.to_string(), "sell ? ? @ ?");

        assert!(OrderResult::from_value(&json!("not an order")).is_none());
    }

    #[test]
    fn test_outcome_passed() {
        assert!(ProbeOutcome::Observed.passed());
        assert!(ProbeOutcome::ErrorHandled {
            message: "No audio input provided".to_string()
        }
        .passed());
        assert!(!ProbeOutcome::Rejected {
            error: "Unknown error".to_string()
        }
        .passed());
        assert!(!ProbeOutcome::Exception {
            reason: "timeout".to_string()
        }
        .passed());
    }

    #[test]
    fn test_response_field_access_on_non_object() {
        let response = WebhookResponse {
            url: "http://localhost/webhook/orders".to_string(),
            status: 200,
            body: json!([1, 2, 3]),
        };
        assert!(!response.has_field("error"));
        assert!(response.text_field("success").is_none());
    }

    #[test]
    fn test_null_text_field_is_absent() {
        let response = WebhookResponse {
            url: "http://localhost/webhook/voice-command".to_string(),
            status: 200,
            body: json!({ "error": null, "code": 42 }),
        };
        assert!(response.has_field("error"));
        assert_eq!(response.text_field("error"), None);
        assert_eq!(response.text_field("code").as_deref(), Some("42"));
    }
}
