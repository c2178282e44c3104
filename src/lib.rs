pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use crate::config::{Command, CliConfig};

pub use crate::config::cli::LocalStorage;
pub use crate::config::scenario_config::{ProbeSelection, ScenarioConfig, TargetOverrides};
pub use crate::core::{
    client::WebhookClient,
    engine::{ProbeEngine, RunOutcome},
    suite::ProbeSuite,
};
pub use crate::utils::error::{ProbeError, Result};
