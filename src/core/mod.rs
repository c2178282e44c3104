pub mod client;
pub mod engine;
pub mod probe;
pub mod report;
pub mod suite;

pub use crate::domain::model::{ProbeKind, ProbeOutcome, ProbeResult, WebhookResponse};
pub use crate::domain::ports::{ConfigProvider, Probe, ReportStorage};
pub use crate::utils::error::Result;
