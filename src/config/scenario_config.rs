use crate::core::probe::{AccountQueryProbe, ErrorScenarioProbe, VoiceCommandProbe};
use crate::core::report::REPORT_FORMATS;
use crate::domain::ports::{ConfigProvider, Probe};
use crate::utils::error::{ProbeError, Result};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://tigrann.app.n8n.cloud";
pub const DEFAULT_USER_ID: &str = "test_user";
pub const DEFAULT_EXCHANGE: &str = "binance";
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 30;
pub const DEFAULT_DELAY_MS: u64 = 1000;

const TEST_FILES_URL: &str =
    "https://github.com/TigranGalstyan/molecula_test_files/raw/refs/heads/main";
const NO_AUDIO_ERROR: &str = "No audio input provided";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioConfig {
    pub scenario: Option<ScenarioInfo>,
    pub target: TargetConfig,
    #[serde(default)]
    pub voice_commands: Vec<VoiceCommandDefinition>,
    #[serde(default)]
    pub error_scenarios: Vec<ErrorScenarioDefinition>,
    #[serde(default)]
    pub queries: Vec<QueryDefinition>,
    pub report: Option<ReportConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioInfo {
    pub name: String,
    pub description: Option<String>,
    pub version: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetConfig {
    pub base_url: String,
    pub user_id: Option<String>,
    pub timeout_seconds: Option<u64>,
    pub delay_ms: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoiceCommandDefinition {
    pub name: String,
    pub audio_url: String,
    pub user_id: Option<String>,
    pub expected_transcription: Option<String>,
    pub enabled: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorScenarioDefinition {
    pub name: String,
    /// 原樣送到語音指令 webhook 的內容
    pub payload: serde_json::Value,
    pub expected_error: Option<String>,
    pub enabled: Option<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryKind {
    Balance,
    Orders,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryDefinition {
    pub name: Option<String>,
    pub kind: QueryKind,
    pub exchange: Option<String>,
    pub enabled: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    pub output_path: String,
    pub output_formats: Option<Vec<String>>,
}

/// 命令列對目標設定的覆蓋值
#[derive(Debug, Clone, Default)]
pub struct TargetOverrides {
    pub base_url: Option<String>,
    pub user_id: Option<String>,
    pub timeout_seconds: Option<u64>,
    pub delay_ms: Option<u64>,
    pub report_path: Option<String>,
    pub report_formats: Option<Vec<String>>,
}

/// 要執行的探測群組
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeSelection {
    VoiceCommands,
    ErrorScenarios,
    Queries,
    All,
}

impl ScenarioConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(ProbeError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| ProbeError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${N8N_BASE_URL})，未設定的變數保留原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| ProbeError::ConfigValidationError {
            field: "env_substitution".to_string(),
            message: e.to_string(),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    /// 內建的示範情境：三個語音指令、四個錯誤情境與 binance 查詢
    pub fn builtin(base_url: &str) -> Self {
        let voice = |name: &str, file: &str, transcription: &str| VoiceCommandDefinition {
            name: name.to_string(),
            audio_url: format!("{}/{}", TEST_FILES_URL, file),
            user_id: None,
            expected_transcription: Some(transcription.to_string()),
            enabled: None,
        };
        let error = |name: &str, payload: serde_json::Value, expected: &str| ErrorScenarioDefinition {
            name: name.to_string(),
            payload,
            expected_error: Some(expected.to_string()),
            enabled: None,
        };

        Self {
            scenario: Some(ScenarioInfo {
                name: "voice-trading-demo".to_string(),
                description: Some("n8n Voice-Activated Trading System demo".to_string()),
                version: None,
            }),
            target: TargetConfig {
                base_url: base_url.to_string(),
                user_id: None,
                timeout_seconds: None,
                delay_ms: None,
            },
            voice_commands: vec![
                voice(
                    "Buy Bitcoin Market Order",
                    "buy_btc_binance.m4a",
                    "Buy 0.5 Bitcoin on Binance at market price",
                ),
                voice(
                    "Sell Ethereum Limit Order",
                    "sell_eth.m4a",
                    "Sell 10 ETH at $3,200 on Coinbase",
                ),
                voice(
                    "Buy Bitcoin Limit Order",
                    "buy_btc_limit.m4a",
                    "Place a limit order to buy 1 BTC at $45,000 on Binance",
                ),
            ],
            error_scenarios: vec![
                error(
                    "No Audio Input",
                    json!({ "user_id": DEFAULT_USER_ID }),
                    NO_AUDIO_ERROR,
                ),
                error(
                    "Empty Audio URL",
                    json!({ "audio_url": "", "user_id": DEFAULT_USER_ID }),
                    NO_AUDIO_ERROR,
                ),
                error(
                    "Malformed Request",
                    json!({ "invalid_field": "invalid_value", "another_invalid": 123 }),
                    NO_AUDIO_ERROR,
                ),
                error(
                    "Passing Error Response",
                    json!({
                        "audio_url": format!("{}/non_trade.m4a", TEST_FILES_URL),
                        "user_id": DEFAULT_USER_ID
                    }),
                    "Various error responses",
                ),
            ],
            queries: vec![
                QueryDefinition {
                    name: None,
                    kind: QueryKind::Balance,
                    exchange: None,
                    enabled: None,
                },
                QueryDefinition {
                    name: None,
                    kind: QueryKind::Orders,
                    exchange: None,
                    enabled: None,
                },
            ],
            report: None,
        }
    }

    pub fn apply_overrides(&mut self, overrides: &TargetOverrides) {
        if let Some(base_url) = &overrides.base_url {
            tracing::info!("🔧 Base URL overridden to: {}", base_url);
            self.target.base_url = base_url.clone();
        }
        if let Some(user_id) = &overrides.user_id {
            self.target.user_id = Some(user_id.clone());
        }
        if let Some(timeout) = overrides.timeout_seconds {
            self.target.timeout_seconds = Some(timeout);
        }
        if let Some(delay) = overrides.delay_ms {
            self.target.delay_ms = Some(delay);
        }
        if let Some(path) = &overrides.report_path {
            let output_formats = overrides
                .report_formats
                .clone()
                .or_else(|| self.report.as_ref().and_then(|r| r.output_formats.clone()));
            self.report = Some(ReportConfig {
                output_path: path.clone(),
                output_formats,
            });
        } else if let (Some(report), Some(formats)) = (&mut self.report, &overrides.report_formats) {
            report.output_formats = Some(formats.clone());
        }
    }

    /// 驗證配置的合理性
    pub fn validate_config(&self) -> Result<()> {
        validation::validate_url("target.base_url", &self.target.base_url)?;
        validation::validate_non_empty_string("target.user_id", self.user_id())?;

        if let Some(timeout) = self.target.timeout_seconds {
            validation::validate_positive_number("target.timeout_seconds", timeout, 1)?;
        }

        for command in &self.voice_commands {
            validation::validate_non_empty_string("voice_commands.name", &command.name)?;
            validation::validate_url("voice_commands.audio_url", &command.audio_url)?;
        }

        for scenario in &self.error_scenarios {
            validation::validate_non_empty_string("error_scenarios.name", &scenario.name)?;
        }

        for query in &self.queries {
            if let Some(exchange) = &query.exchange {
                validation::validate_non_empty_string("queries.exchange", exchange)?;
            }
        }

        let names = self
            .voice_commands
            .iter()
            .map(|c| c.name.clone())
            .chain(self.error_scenarios.iter().map(|s| s.name.clone()))
            .chain(self.queries.iter().map(query_name))
            .collect::<Vec<_>>();
        validation::validate_unique_names("probes", names.iter().map(String::as_str))?;

        if let Some(report) = &self.report {
            validation::validate_path("report.output_path", &report.output_path)?;
            validation::validate_formats(
                "report.output_formats",
                self.report_formats(),
                &REPORT_FORMATS,
            )?;
        }

        Ok(())
    }

    pub fn voice_probes(&self) -> Vec<Box<dyn Probe>> {
        self.voice_commands
            .iter()
            .map(|command| {
                let probe = VoiceCommandProbe::new(
                    command.name.clone(),
                    command.audio_url.clone(),
                    command
                        .user_id
                        .clone()
                        .unwrap_or_else(|| self.user_id().to_string()),
                    command
                        .expected_transcription
                        .clone()
                        .unwrap_or_else(|| "Order placed".to_string()),
                )
                .with_enabled(command.enabled.unwrap_or(true));
                Box::new(probe) as Box<dyn Probe>
            })
            .collect()
    }

    pub fn error_probes(&self) -> Vec<Box<dyn Probe>> {
        self.error_scenarios
            .iter()
            .map(|scenario| {
                let probe = ErrorScenarioProbe::new(
                    scenario.name.clone(),
                    scenario.payload.clone(),
                    scenario
                        .expected_error
                        .clone()
                        .unwrap_or_else(|| "An error response".to_string()),
                )
                .with_enabled(scenario.enabled.unwrap_or(true));
                Box::new(probe) as Box<dyn Probe>
            })
            .collect()
    }

    pub fn query_probes(&self) -> Vec<Box<dyn Probe>> {
        self.queries
            .iter()
            .map(|query| {
                let exchange = query.exchange.as_deref().unwrap_or(DEFAULT_EXCHANGE);
                let probe = match query.kind {
                    QueryKind::Balance => AccountQueryProbe::balance(exchange),
                    QueryKind::Orders => AccountQueryProbe::orders(exchange),
                };
                let probe = match &query.name {
                    Some(name) => probe.with_name(name.clone()),
                    None => probe,
                };
                Box::new(probe.with_enabled(query.enabled.unwrap_or(true))) as Box<dyn Probe>
            })
            .collect()
    }

    pub fn probes_for(&self, selection: ProbeSelection) -> Vec<Box<dyn Probe>> {
        match selection {
            ProbeSelection::VoiceCommands => self.voice_probes(),
            ProbeSelection::ErrorScenarios => self.error_probes(),
            ProbeSelection::Queries => self.query_probes(),
            ProbeSelection::All => {
                let mut probes = self.voice_probes();
                probes.extend(self.error_probes());
                probes.extend(self.query_probes());
                probes
            }
        }
    }

    pub fn name(&self) -> &str {
        self.scenario
            .as_ref()
            .map(|s| s.name.as_str())
            .unwrap_or("voice-trade-probe")
    }
}

/// 查詢未命名時以種類與交易所組成名稱，與探測名稱一致
fn query_name(query: &QueryDefinition) -> String {
    if let Some(name) = &query.name {
        return name.clone();
    }
    let exchange = query.exchange.as_deref().unwrap_or(DEFAULT_EXCHANGE);
    match query.kind {
        QueryKind::Balance => format!("Balance ({})", exchange),
        QueryKind::Orders => format!("Orders ({})", exchange),
    }
}

impl ConfigProvider for ScenarioConfig {
    fn base_url(&self) -> &str {
        &self.target.base_url
    }

    fn user_id(&self) -> &str {
        self.target.user_id.as_deref().unwrap_or(DEFAULT_USER_ID)
    }

    fn timeout(&self) -> Duration {
        Duration::from_secs(self.target.timeout_seconds.unwrap_or(DEFAULT_TIMEOUT_SECONDS))
    }

    fn delay(&self) -> Duration {
        Duration::from_millis(self.target.delay_ms.unwrap_or(DEFAULT_DELAY_MS))
    }

    fn report_path(&self) -> Option<&str> {
        self.report.as_ref().map(|r| r.output_path.as_str())
    }

    fn report_formats(&self) -> &[String] {
        static DEFAULT_FORMATS: std::sync::OnceLock<Vec<String>> = std::sync::OnceLock::new();
        match self.report.as_ref().and_then(|r| r.output_formats.as_ref()) {
            Some(formats) => formats.as_slice(),
            None => DEFAULT_FORMATS
                .get_or_init(|| REPORT_FORMATS.iter().map(|f| f.to_string()).collect())
                .as_slice(),
        }
    }
}

impl Validate for ScenarioConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
