use anyhow::Result;
use httpmock::prelude::*;
use serde_json::json;
use tempfile::TempDir;
use voice_trade_probe::core::ConfigProvider;
use voice_trade_probe::utils::validation::Validate;
use voice_trade_probe::{ProbeEngine, ProbeSelection, ScenarioConfig, TargetOverrides};

/// 從 TOML 情境檔執行完整序列，包含報表輸出
#[tokio::test]
async fn test_scenario_file_end_to_end() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let temp_path = temp_dir.path().to_str().unwrap();
    let normalized_path = temp_path.replace('\\', "/");

    let server = MockServer::start();

    let config_content = format!(
        r#"
[scenario]
name = "mock-run"

[target]
base_url = "{}"
user_id = "desk_7"
delay_ms = 0

[[voice_commands]]
name = "Buy Bitcoin Limit Order"
audio_url = "https://files.example.com/buy_btc_limit.m4a"
expected_transcription = "Place a limit order to buy 1 BTC at $45,000 on Binance"

[[error_scenarios]]
name = "Empty Audio URL"
payload = {{ audio_url = "", user_id = "desk_7" }}
expected_error = "No audio input provided"

[[queries]]
kind = "balance"
exchange = "coinbase"

[[queries]]
name = "Disabled orders"
kind = "orders"
enabled = false

[report]
output_path = "{}"
output_formats = ["json", "csv"]
"#,
        server.base_url(),
        normalized_path
    );

    let config_path = format!("{}/scenarios.toml", temp_path);
    tokio::fs::write(&config_path, config_content).await?;
    let config = ScenarioConfig::from_file(&config_path)?;
    config.validate()?;

    let voice_mock = server.mock(|when, then| {
        when.method(POST)
            .path("/webhook/voice-command")
            .json_body(json!({
                "audio_url": "https://files.example.com/buy_btc_limit.m4a",
                "user_id": "desk_7"
            }));
        then.status(200).json_body(json!({
            "success": true,
            "trade_summary": "Limit buy 1 BTC @ 45000 on Binance"
        }));
    });
    let empty_audio_mock = server.mock(|when, then| {
        when.method(POST)
            .path("/webhook/voice-command")
            .json_body(json!({ "audio_url": "", "user_id": "desk_7" }));
        then.status(400)
            .json_body(json!({ "error": "No audio input provided" }));
    });
    let balance_mock = server.mock(|when, then| {
        when.method(GET)
            .path("/webhook/balance")
            .query_param("exchange", "coinbase");
        then.status(200).json_body(json!({ "ETH": 12.5, "USD": 1000 }));
    });
    let orders_mock = server.mock(|when, then| {
        when.method(GET).path("/webhook/orders");
        then.status(200).json_body(json!({ "orders": [] }));
    });

    let probes = config.probes_for(ProbeSelection::All);
    assert_eq!(probes.len(), 4);

    let engine = ProbeEngine::from_config(&config, "mock-run-1".to_string(), probes)?;
    let outcome = engine.run().await?;

    voice_mock.assert();
    empty_audio_mock.assert();
    balance_mock.assert();
    orders_mock.assert_hits(0);

    assert_eq!(outcome.results.len(), 3);
    assert!(outcome.all_passed());
    assert_eq!(outcome.summary["total_probes"], json!(3));
    assert_eq!(outcome.report_files.len(), 2);
    assert!(temp_dir.path().join("probe_report.json").exists());
    assert!(temp_dir.path().join("probe_report.csv").exists());

    Ok(())
}

#[tokio::test]
async fn test_builtin_catalogue_with_base_url_override() -> Result<()> {
    let server = MockServer::start();
    let voice_mock = server.mock(|when, then| {
        when.method(POST).path("/webhook/voice-command");
        then.status(200).json_body(json!({ "success": true }));
    });

    let mut config = ScenarioConfig::builtin("https://unused.example.com");
    config.apply_overrides(&TargetOverrides {
        base_url: Some(format!("{}/", server.base_url())),
        delay_ms: Some(0),
        ..Default::default()
    });
    config.validate()?;
    assert_eq!(config.report_path(), None);

    let probes = config.probes_for(ProbeSelection::VoiceCommands);
    let engine = ProbeEngine::from_config(&config, "builtin".to_string(), probes)?;
    let outcome = engine.run().await?;

    voice_mock.assert_hits(3);
    assert_eq!(outcome.results.len(), 3);
    assert!(outcome.all_passed());
    assert!(outcome.report_files.is_empty());

    Ok(())
}
