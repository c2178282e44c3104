pub mod cli;
pub mod scenario_config;

#[cfg(feature = "cli")]
use clap::{Parser, Subcommand};
#[cfg(feature = "cli")]
use scenario_config::{ProbeSelection, TargetOverrides};

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Parser)]
#[command(name = "voice-trade-probe")]
#[command(about = "Exercise the voice-to-trade webhooks of an n8n workflow instance")]
pub struct CliConfig {
    /// Base URL of the n8n instance
    #[arg(long, env = "N8N_BASE_URL", global = true)]
    pub base_url: Option<String>,

    /// Path to a TOML scenario file (built-in demo catalogue when omitted)
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[arg(long, global = true)]
    pub user_id: Option<String>,

    #[arg(long, global = true)]
    pub timeout_seconds: Option<u64>,

    /// Pause between consecutive requests
    #[arg(long, global = true)]
    pub delay_ms: Option<u64>,

    /// Directory to write probe_report.json / probe_report.csv into
    #[arg(long, global = true)]
    pub report: Option<String>,

    #[arg(long, value_delimiter = ',', global = true)]
    pub formats: Option<Vec<String>>,

    #[arg(short, long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, global = true, help = "Emit logs as JSON")]
    pub json_logs: bool,

    /// Exit with status 2 when any probe does not pass
    #[arg(long, global = true)]
    pub strict: bool,

    /// Show what would be sent without calling the webhooks
    #[arg(long, global = true)]
    pub dry_run: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Send voice commands (the catalogue, or a single --audio-url)
    Voice {
        #[arg(long)]
        audio_url: Option<String>,

        #[arg(long, requires = "audio_url")]
        expected: Option<String>,
    },
    /// Send payloads that should take the workflow's error paths
    Errors,
    /// Query the balance webhook
    Balance {
        #[arg(long, default_value = "binance")]
        exchange: String,
    },
    /// Query the orders webhook
    Orders {
        #[arg(long, default_value = "binance")]
        exchange: String,
    },
    /// Run every configured balance and orders query
    Queries,
    /// Voice commands, error scenarios and account queries in one run
    All,
    /// Interactive menu
    Menu,
}

#[cfg(feature = "cli")]
impl CliConfig {
    pub fn overrides(&self) -> TargetOverrides {
        TargetOverrides {
            base_url: self.base_url.clone(),
            user_id: self.user_id.clone(),
            timeout_seconds: self.timeout_seconds,
            delay_ms: self.delay_ms,
            report_path: self.report.clone(),
            report_formats: self.formats.clone(),
        }
    }
}

#[cfg(feature = "cli")]
impl Command {
    /// 對應到情境檔中的探測群組；單一請求的子命令回傳 None
    pub fn selection(&self) -> Option<ProbeSelection> {
        match self {
            Command::Voice { audio_url: None, .. } => Some(ProbeSelection::VoiceCommands),
            Command::Errors => Some(ProbeSelection::ErrorScenarios),
            Command::Queries => Some(ProbeSelection::Queries),
            Command::All => Some(ProbeSelection::All),
            _ => None,
        }
    }
}

/// 互動選單：1 為語音指令，2 為錯誤情境，其他輸入只顯示說明
pub fn parse_menu_choice(input: &str) -> Option<scenario_config::ProbeSelection> {
    match input.trim() {
        "1" => Some(scenario_config::ProbeSelection::VoiceCommands),
        "2" => Some(scenario_config::ProbeSelection::ErrorScenarios),
        _ => None,
    }
}

#[cfg(all(test, feature = "cli"))]
mod tests {
    use super::*;

    #[test]
    fn test_parse_subcommand_with_global_flags() {
        let cli = CliConfig::try_parse_from([
            "voice-trade-probe",
            "balance",
            "--exchange",
            "coinbase",
            "--base-url",
            "http://localhost:5678",
            "--delay-ms",
            "0",
        ])
        .unwrap();

        assert_eq!(cli.base_url.as_deref(), Some("http://localhost:5678"));
        assert_eq!(cli.delay_ms, Some(0));
        match cli.command {
            Some(Command::Balance { exchange }) => assert_eq!(exchange, "coinbase"),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_selection() {
        let cli = CliConfig::try_parse_from(["voice-trade-probe", "voice"]).unwrap();
        assert_eq!(
            cli.command.unwrap().selection(),
            Some(ProbeSelection::VoiceCommands)
        );

        let cli = CliConfig::try_parse_from([
            "voice-trade-probe",
            "voice",
            "--audio-url",
            "https://files.example.com/a.m4a",
        ])
        .unwrap();
        assert_eq!(cli.command.unwrap().selection(), None);

        let cli = CliConfig::try_parse_from(["voice-trade-probe", "queries"]).unwrap();
        assert_eq!(cli.command.unwrap().selection(), Some(ProbeSelection::Queries));
    }

    #[test]
    fn test_parse_menu_choice() {
        assert_eq!(parse_menu_choice(" 1\n"), Some(ProbeSelection::VoiceCommands));
        assert_eq!(parse_menu_choice("2"), Some(ProbeSelection::ErrorScenarios));
        assert_eq!(parse_menu_choice(""), None);
        assert_eq!(parse_menu_choice("3"), None);
    }

    #[test]
    fn test_formats_are_comma_separated() {
        let cli = CliConfig::try_parse_from([
            "voice-trade-probe",
            "--report",
            "./out",
            "--formats",
            "csv,json",
        ])
        .unwrap();

        let overrides = cli.overrides();
        assert_eq!(overrides.report_path.as_deref(), Some("./out"));
        assert_eq!(
            overrides.report_formats,
            Some(vec!["csv".to_string(), "json".to_string()])
        );
        assert!(cli.command.is_none());
    }
}
