use crate::core::client::WebhookClient;
use crate::core::report::{
    render_announcement, render_exchange, render_heading, render_outcome, render_status,
};
use crate::domain::model::{ProbeOutcome, ProbeResult};
use crate::domain::ports::Probe;
use crate::utils::error::{ProbeError, Result};
use chrono::Utc;
use std::collections::HashMap;
use std::time::{Duration, Instant};

pub const DEFAULT_DELAY: Duration = Duration::from_secs(1);

/// 依序執行探測；單一探測失敗不會中斷整個序列
pub struct ProbeSuite {
    probes: Vec<Box<dyn Probe>>,
    client: WebhookClient,
    delay: Duration,
    execution_id: String,
    echo: bool,
}

impl ProbeSuite {
    pub fn new(execution_id: String, client: WebhookClient) -> Self {
        Self {
            probes: Vec::new(),
            client,
            delay: DEFAULT_DELAY,
            execution_id,
            echo: true,
        }
    }

    /// 兩次請求之間的間隔
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// 關閉時不輸出到 stdout，只記錄結果
    pub fn with_echo(mut self, echo: bool) -> Self {
        self.echo = echo;
        self
    }

    pub fn add_probe(&mut self, probe: Box<dyn Probe>) {
        self.probes.push(probe);
    }

    pub fn execution_id(&self) -> &str {
        &self.execution_id
    }

    pub async fn run_all(&self) -> Result<Vec<ProbeResult>> {
        let mut results = Vec::new();
        tracing::info!(
            "🚀 Starting probe run {} ({} probes) against {}",
            self.execution_id,
            self.probes.len(),
            self.client.base_url()
        );

        let mut index = 0;
        for probe in &self.probes {
            if !probe.should_execute() {
                tracing::info!("⏭️ Skipping probe: {} (disabled)", probe.name());
                continue;
            }

            if index > 0 && !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            index += 1;

            self.echo(render_heading(
                index,
                probe.name(),
                probe.kind(),
                probe.expectation(),
            ));

            let result = self.execute_probe(probe.as_ref()).await;
            for line in render_outcome(&result.outcome) {
                self.echo(line);
            }

            tracing::info!(
                "{} Probe finished: {} ({}, {:?})",
                if result.passed() { "✅" } else { "❌" },
                result.probe_name,
                result.outcome.label(),
                result.duration
            );
            results.push(result);
        }

        Ok(results)
    }

    async fn execute_probe(&self, probe: &dyn Probe) -> ProbeResult {
        if let Some(announcement) = render_announcement(&probe.announce()) {
            self.echo(announcement);
        }

        let started_at = Utc::now();
        let start_time = Instant::now();

        let (status, response, outcome) = match probe.send(&self.client).await {
            Ok(response) => {
                self.echo(render_exchange(&response));
                let outcome = probe.evaluate(&response);
                (Some(response.status), Some(response.body), outcome)
            }
            Err(e) => {
                tracing::error!(
                    "❌ Probe {} failed: {} (Category: {:?}, Severity: {:?})",
                    probe.name(),
                    e,
                    e.category(),
                    e.severity()
                );
                tracing::debug!("💡 Recovery suggestion: {}", e.recovery_suggestion());
                // 回應已送達但內容不是 JSON 時仍保留狀態碼
                let status = match &e {
                    ProbeError::InvalidResponse { status, .. } => {
                        self.echo(render_status(*status));
                        Some(*status)
                    }
                    _ => None,
                };
                (
                    status,
                    None,
                    ProbeOutcome::Exception {
                        reason: e.user_friendly_message(),
                    },
                )
            }
        };

        ProbeResult {
            probe_name: probe.name().to_string(),
            kind: probe.kind(),
            expectation: probe.expectation().to_string(),
            status,
            response,
            outcome,
            started_at,
            duration: start_time.elapsed(),
        }
    }

    fn echo(&self, text: String) {
        if self.echo {
            println!("{}", text);
        }
    }

    /// 獲取執行摘要
    pub fn execution_summary(results: &[ProbeResult]) -> HashMap<String, serde_json::Value> {
        let mut summary = HashMap::new();

        let total_probes = results.len();
        let passed = results.iter().filter(|r| r.passed()).count();
        let total_duration: Duration = results.iter().map(|r| r.duration).sum();

        summary.insert("total_probes".to_string(), serde_json::Value::Number(total_probes.into()));
        summary.insert("passed".to_string(), serde_json::Value::Number(passed.into()));
        summary.insert(
            "failed".to_string(),
            serde_json::Value::Number((total_probes - passed).into()),
        );
        summary.insert(
            "total_duration_ms".to_string(),
            serde_json::Value::Number((total_duration.as_millis() as u64).into()),
        );

        let probe_names: Vec<serde_json::Value> = results
            .iter()
            .map(|r| serde_json::Value::String(r.probe_name.clone()))
            .collect();
        summary.insert("executed_probes".to_string(), serde_json::Value::Array(probe_names));

        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{ProbeKind, WebhookResponse};
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct MockProbe {
        name: String,
        enabled: bool,
        reply: Option<serde_json::Value>,
        calls: Arc<AtomicUsize>,
    }

    impl MockProbe {
        fn new(name: &str, reply: Option<serde_json::Value>) -> Self {
            Self {
                name: name.to_string(),
                enabled: true,
                reply,
                calls: Arc::new(AtomicUsize::new(0)),
            }
        }

        fn disabled(mut self) -> Self {
            self.enabled = false;
            self
        }
    }

    #[async_trait::async_trait]
    impl Probe for MockProbe {
        fn name(&self) -> &str {
            &self.name
        }

        fn kind(&self) -> ProbeKind {
            ProbeKind::ErrorScenario
        }

        fn expectation(&self) -> &str {
            "anything"
        }

        fn describe_request(&self) -> String {
            format!("MOCK {}", self.name)
        }

        async fn send(&self, client: &WebhookClient) -> Result<WebhookResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.reply {
                Some(body) => Ok(WebhookResponse {
                    url: client.endpoint("voice-command"),
                    status: 200,
                    body: body.clone(),
                }),
                None => Err(ProbeError::InvalidResponse {
                    status: 502,
                    preview: "Bad Gateway".to_string(),
                }),
            }
        }

        fn evaluate(&self, response: &WebhookResponse) -> ProbeOutcome {
            crate::core::probe::classify_error_response(response)
        }

        fn should_execute(&self) -> bool {
            self.enabled
        }
    }

    fn suite() -> ProbeSuite {
        let client = WebhookClient::new("http://localhost:5678", Duration::from_secs(1)).unwrap();
        ProbeSuite::new("test_run".to_string(), client)
            .with_delay(Duration::ZERO)
            .with_echo(false)
    }

    #[tokio::test]
    async fn test_failures_do_not_stop_the_run() {
        let mut suite = suite();
        suite.add_probe(Box::new(MockProbe::new("broken", None)));
        suite.add_probe(Box::new(MockProbe::new(
            "handled",
            Some(json!({ "success": false, "message": "No audio input provided" })),
        )));

        let results = suite.run_all().await.unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].probe_name, "broken");
        assert!(matches!(results[0].outcome, ProbeOutcome::Exception { .. }));
        assert_eq!(results[0].status, Some(502));
        assert_eq!(results[1].status, Some(200));
        assert!(results[1].passed());
    }

    #[tokio::test]
    async fn test_disabled_probes_are_skipped() {
        let mut suite = suite();
        let skipped = MockProbe::new("skipped", Some(json!({}))).disabled();
        let calls = skipped.calls.clone();
        suite.add_probe(Box::new(skipped));
        suite.add_probe(Box::new(MockProbe::new("ran", Some(json!({ "error": "x" })))));

        let results = suite.run_all().await.unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].probe_name, "ran");
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_delay_is_applied_between_probes() {
        let client = WebhookClient::new("http://localhost:5678", Duration::from_secs(1)).unwrap();
        let mut suite = ProbeSuite::new("delayed".to_string(), client)
            .with_delay(Duration::from_millis(50))
            .with_echo(false);
        suite.add_probe(Box::new(MockProbe::new("first", Some(json!({ "error": "a" })))));
        suite.add_probe(Box::new(MockProbe::new("second", Some(json!({ "error": "b" })))));
        suite.add_probe(Box::new(MockProbe::new("third", Some(json!({ "error": "c" })))));

        let start = Instant::now();
        suite.run_all().await.unwrap();
        assert!(start.elapsed() >= Duration::from_millis(100));
    }

    #[test]
    fn test_execution_summary() {
        let result = |name: &str, outcome: ProbeOutcome, ms: u64| ProbeResult {
            probe_name: name.to_string(),
            kind: ProbeKind::VoiceCommand,
            expectation: String::new(),
            status: Some(200),
            response: None,
            outcome,
            started_at: Utc::now(),
            duration: Duration::from_millis(ms),
        };
        let results = vec![
            result(
                "buy",
                ProbeOutcome::Accepted {
                    trade_summary: "ok".to_string(),
                    order: None,
                },
                100,
            ),
            result(
                "sell",
                ProbeOutcome::Rejected {
                    error: "Unknown error".to_string(),
                },
                200,
            ),
        ];

        let summary = ProbeSuite::execution_summary(&results);

        assert_eq!(summary.get("total_probes").unwrap(), &serde_json::Value::Number(2.into()));
        assert_eq!(summary.get("passed").unwrap(), &serde_json::Value::Number(1.into()));
        assert_eq!(summary.get("failed").unwrap(), &serde_json::Value::Number(1.into()));
        assert_eq!(summary.get("total_duration_ms").unwrap(), &serde_json::Value::Number(300.into()));

        let executed = summary.get("executed_probes").unwrap().as_array().unwrap();
        assert_eq!(executed, &vec![json!("buy"), json!("sell")]);
    }
}
