use clap::Parser;
use std::io::Write;
use voice_trade_probe::config::parse_menu_choice;
use voice_trade_probe::config::scenario_config::DEFAULT_BASE_URL;
use voice_trade_probe::core::probe::{AccountQueryProbe, VoiceCommandProbe};
use voice_trade_probe::core::{ConfigProvider, Probe};
use voice_trade_probe::utils::error::{ErrorCategory, ProbeError};
use voice_trade_probe::utils::{logger, validation::Validate};
use voice_trade_probe::{CliConfig, Command, ProbeEngine, ProbeSelection, ScenarioConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    // 初始化日誌
    if cli.json_logs {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::info!("Starting voice-trade-probe");
    if cli.verbose {
        tracing::debug!("CLI config: {:?}", cli);
    }

    // 載入情境：未指定檔案時使用內建示範
    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("📁 Loading scenarios from: {}", path);
            match ScenarioConfig::from_file(path) {
                Ok(config) => config,
                Err(e) => {
                    eprintln!("❌ Failed to load scenario file '{}': {}", path, e);
                    eprintln!("💡 Make sure the file exists and is valid TOML format");
                    std::process::exit(1);
                }
            }
        }
        None => ScenarioConfig::builtin(DEFAULT_BASE_URL),
    };
    config.apply_overrides(&cli.overrides());

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    let command = cli.command.clone().unwrap_or(Command::Menu);
    let probes = match resolve_probes(&command, &config)? {
        Some(probes) => probes,
        None => return Ok(()),
    };

    if probes.is_empty() {
        println!("⚠️ No probes configured for this command");
        return Ok(());
    }

    if cli.dry_run {
        perform_dry_run(&config, &probes);
        return Ok(());
    }

    let execution_id = format!(
        "{}-{}",
        config.name(),
        chrono::Utc::now().format("%Y%m%d%H%M%S")
    );
    let engine = match ProbeEngine::from_config(&config, execution_id, probes) {
        Ok(engine) => engine,
        Err(e) => exit_with(e),
    };

    match engine.run().await {
        Ok(outcome) => {
            println!();
            println!(
                "{}",
                voice_trade_probe::core::report::render_summary(&outcome.summary)
            );
            for file in &outcome.report_files {
                println!("📁 Report saved to: {}", file);
            }
            println!("\n✅ {} completed!", run_label(&command));

            if cli.strict && !outcome.all_passed() {
                eprintln!("❌ {} probe(s) did not pass", outcome.failed());
                std::process::exit(2);
            }
        }
        Err(e) => exit_with(e),
    }

    Ok(())
}

/// None 表示只顯示說明，不送出任何請求
fn resolve_probes(
    command: &Command,
    config: &ScenarioConfig,
) -> anyhow::Result<Option<Vec<Box<dyn Probe>>>> {
    let probes: Vec<Box<dyn Probe>> = match command {
        Command::Voice {
            audio_url: Some(audio_url),
            expected,
        } => vec![Box::new(VoiceCommandProbe::new(
            "Custom Voice Command",
            audio_url.clone(),
            config.user_id(),
            expected.clone().unwrap_or_else(|| "Order placed".to_string()),
        ))],
        Command::Balance { exchange } => vec![Box::new(AccountQueryProbe::balance(exchange.clone()))],
        Command::Orders { exchange } => vec![Box::new(AccountQueryProbe::orders(exchange.clone()))],
        Command::Menu => match prompt_menu()? {
            Some(selection) => {
                print_section_banner(selection);
                config.probes_for(selection)
            }
            None => {
                print_usage_info();
                return Ok(None);
            }
        },
        other => {
            let selection = other.selection().unwrap_or(ProbeSelection::All);
            print_section_banner(selection);
            config.probes_for(selection)
        }
    };

    Ok(Some(probes))
}

fn prompt_menu() -> anyhow::Result<Option<ProbeSelection>> {
    println!("🎯 n8n Voice-Activated Trading System - Test Suite");
    println!("{}", "=".repeat(60));
    println!(
        "Timestamp: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );

    println!("\n🧪 Testing Options:");
    println!("1. Run voice command tests (requires n8n instance)");
    println!("2. Run error scenario tests");

    print!("\nSelect option (1-2) or press Enter to show info: ");
    std::io::stdout().flush()?;

    let mut input = String::new();
    std::io::stdin().read_line(&mut input)?;
    Ok(parse_menu_choice(&input))
}

fn print_section_banner(selection: ProbeSelection) {
    match selection {
        ProbeSelection::VoiceCommands => {
            println!("🎤 Voice-Activated Trading System - n8n Demo");
            println!("{}", "=".repeat(60));
            println!("\n📝 Testing Voice Commands");
            println!("{}", "-".repeat(30));
        }
        ProbeSelection::ErrorScenarios => {
            println!("\n🚨 Testing Error Scenarios");
            println!("{}", "=".repeat(40));
        }
        ProbeSelection::Queries => {
            println!("\n📊 Testing Account Queries");
            println!("{}", "=".repeat(40));
        }
        ProbeSelection::All => {
            println!("🎯 n8n Voice-Activated Trading System - Full Run");
            println!("{}", "=".repeat(60));
        }
    }
}

fn print_usage_info() {
    println!("\n{}", "=".repeat(60));
    println!("To run the actual voice command and error tests:");
    println!("1. Point the tool at your instance with --base-url or N8N_BASE_URL");
    println!("2. Optionally describe your own scenarios in a TOML file (--config)");
    println!("3. Run: voice-trade-probe voice | errors | balance | orders | queries | all");
}

fn run_label(command: &Command) -> &'static str {
    match command {
        Command::Voice { .. } => "Voice command testing",
        Command::Errors => "Error scenario testing",
        Command::Balance { .. } | Command::Orders { .. } | Command::Queries => "Account query",
        Command::All | Command::Menu => "Probe run",
    }
}

fn perform_dry_run(config: &ScenarioConfig, probes: &[Box<dyn Probe>]) {
    println!("🔍 Dry Run Analysis:");
    println!();
    println!("📡 Target: {}", config.base_url().trim_end_matches('/'));
    println!("  User: {}", config.user_id());
    println!("  Timeout: {:?}", config.timeout());
    println!("  Delay between requests: {:?}", config.delay());

    println!();
    println!("🧪 Probes:");
    for (i, probe) in probes.iter().enumerate() {
        let marker = if probe.should_execute() { "" } else { " (disabled)" };
        println!("  {}. {}{}", i + 1, probe.name(), marker);
        println!("     {}", probe.describe_request());
        println!("     Expected: {}", probe.expectation());
    }

    if let Some(path) = config.report_path() {
        println!();
        println!("💾 Report: {} ({})", path, config.report_formats().join(", "));
    }

    println!();
    println!("✅ Dry run analysis complete. No requests were sent.");
}

fn exit_with(e: ProbeError) -> ! {
    tracing::error!(
        "❌ Probe run failed: {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 Suggestion: {}", e.recovery_suggestion());

    // 報表寫入失敗時探測本身已完成，與設定錯誤分開
    let exit_code = match e.category() {
        ErrorCategory::Storage => 3,
        _ => 1,
    };
    std::process::exit(exit_code);
}
