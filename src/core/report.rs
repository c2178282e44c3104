use crate::domain::model::{ProbeKind, ProbeOutcome, ProbeResult, WebhookResponse};
use crate::domain::ports::ReportStorage;
use crate::utils::error::{ProbeError, Result};
use chrono::Utc;
use serde_json::{json, Value};
use std::collections::HashMap;

pub const SEPARATOR_WIDTH: usize = 50;
pub const REPORT_FORMATS: [&str; 2] = ["json", "csv"];
pub const JSON_REPORT_FILE: &str = "probe_report.json";
pub const CSV_REPORT_FILE: &str = "probe_report.csv";

/// 送出請求前的說明行，每行一個
pub fn render_announcement(lines: &[String]) -> Option<String> {
    if lines.is_empty() {
        None
    } else {
        Some(lines.join("\n"))
    }
}

pub fn render_status(status: u16) -> String {
    format!("Status Code: {}", status)
}

/// 狀態碼、格式化後的 JSON 與分隔線
pub fn render_exchange(response: &WebhookResponse) -> String {
    let pretty =
        serde_json::to_string_pretty(&response.body).unwrap_or_else(|_| response.body.to_string());
    format!(
        "{}\nResponse: {}\n{}",
        render_status(response.status),
        pretty,
        "-".repeat(SEPARATOR_WIDTH)
    )
}

pub fn render_outcome(outcome: &ProbeOutcome) -> Vec<String> {
    match outcome {
        ProbeOutcome::Accepted {
            trade_summary,
            order,
        } => {
            let mut lines = vec![format!("   ✅ Success: {}", trade_summary)];
            if let Some(order) = order {
                lines.push(format!("   📊 Order: {}", order));
            }
            lines
        }
        ProbeOutcome::Rejected { error } => vec![format!("   ❌ Error: {}", error)],
        ProbeOutcome::ErrorCaught { error, message } => {
            let mut lines = vec![format!("   ✅ Error Caught: {}", error)];
            if let Some(message) = message {
                lines.push(format!("   📝 Message: {}", message));
            }
            lines
        }
        ProbeOutcome::ErrorHandled { message } => vec![format!("   ✅ Error Handled: {}", message)],
        ProbeOutcome::Unexpected { body } => vec![format!("   ⚠️ Unexpected Response: {}", body)],
        ProbeOutcome::Observed => Vec::new(),
        ProbeOutcome::Exception { reason } => vec![format!("   ❌ Exception: {}", reason)],
    }
}

pub fn render_heading(index: usize, name: &str, kind: ProbeKind, expectation: &str) -> String {
    match kind {
        // 語音指令的預期內容是轉錄文字，加上引號
        ProbeKind::VoiceCommand => format!("\n{}. {}\n   Expected: '{}'", index, name, expectation),
        _ => format!("\n{}. {}\n   Expected: {}", index, name, expectation),
    }
}

pub fn render_summary(summary: &HashMap<String, Value>) -> String {
    let number = |key: &str| summary.get(key).and_then(Value::as_u64).unwrap_or(0);
    format!(
        "📈 Total: {} probes, {} passed, {} failed, {} ms",
        number("total_probes"),
        number("passed"),
        number("failed"),
        number("total_duration_ms")
    )
}

pub fn build_json_report(
    execution_id: &str,
    results: &[ProbeResult],
    summary: &HashMap<String, Value>,
) -> Result<Vec<u8>> {
    let report = json!({
        "execution_id": execution_id,
        "generated_at": Utc::now().to_rfc3339(),
        "summary": summary,
        "results": results,
    });
    Ok(serde_json::to_vec_pretty(&report)?)
}

pub fn build_csv_report(results: &[ProbeResult]) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record([
        "probe_name",
        "kind",
        "status",
        "outcome",
        "passed",
        "detail",
        "duration_ms",
        "started_at",
    ])?;

    for result in results {
        writer.write_record([
            result.probe_name.clone(),
            result.kind.to_string(),
            result.status.map(|s| s.to_string()).unwrap_or_default(),
            result.outcome.label().to_string(),
            result.passed().to_string(),
            result.outcome.detail(),
            (result.duration.as_millis() as u64).to_string(),
            result.started_at.to_rfc3339(),
        ])?;
    }

    writer
        .into_inner()
        .map_err(|e| ProbeError::ReportError {
            message: format!("Failed to flush CSV report: {}", e),
        })
}

/// 依設定的格式把結果寫入儲存空間
pub struct ReportWriter<S: ReportStorage> {
    storage: S,
    base_path: String,
    formats: Vec<String>,
}

impl<S: ReportStorage> ReportWriter<S> {
    pub fn new(storage: S, base_path: impl Into<String>, formats: Vec<String>) -> Self {
        Self {
            storage,
            base_path: base_path.into(),
            formats,
        }
    }

    pub async fn write(
        &self,
        execution_id: &str,
        results: &[ProbeResult],
        summary: &HashMap<String, Value>,
    ) -> Result<Vec<String>> {
        let mut written = Vec::new();

        for format in &self.formats {
            let (filename, data) = match format.as_str() {
                "json" => (JSON_REPORT_FILE, build_json_report(execution_id, results, summary)?),
                "csv" => (CSV_REPORT_FILE, build_csv_report(results)?),
                other => {
                    return Err(ProbeError::InvalidConfigValueError {
                        field: "report.output_formats".to_string(),
                        value: other.to_string(),
                        reason: format!("Valid formats: {}", REPORT_FORMATS.join(", ")),
                    })
                }
            };

            tracing::debug!("Writing {} report ({} bytes)", format, data.len());
            self.storage.write_file(filename, &data).await?;
            written.push(format!("{}/{}", self.base_path.trim_end_matches('/'), filename));
        }

        Ok(written)
    }
}
