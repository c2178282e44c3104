use crate::config::cli::LocalStorage;
use crate::core::client::WebhookClient;
use crate::core::report::{render_summary, ReportWriter};
use crate::core::suite::ProbeSuite;
use crate::core::{ConfigProvider, Probe, ProbeResult, ReportStorage};
use crate::utils::error::Result;
use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub execution_id: String,
    pub results: Vec<ProbeResult>,
    pub summary: HashMap<String, serde_json::Value>,
    pub report_files: Vec<String>,
}

impl RunOutcome {
    pub fn all_passed(&self) -> bool {
        self.results.iter().all(|r| r.passed())
    }

    pub fn failed(&self) -> usize {
        self.results.iter().filter(|r| !r.passed()).count()
    }
}

pub struct ProbeEngine<S: ReportStorage> {
    suite: ProbeSuite,
    reporter: Option<ReportWriter<S>>,
}

impl ProbeEngine<LocalStorage> {
    /// 依設定建立客戶端、探測序列與（選用的）報表輸出
    pub fn from_config<C: ConfigProvider>(
        config: &C,
        execution_id: String,
        probes: Vec<Box<dyn Probe>>,
    ) -> Result<Self> {
        let client = WebhookClient::new(config.base_url(), config.timeout())?;
        let mut suite = ProbeSuite::new(execution_id, client).with_delay(config.delay());
        for probe in probes {
            suite.add_probe(probe);
        }

        let reporter = config.report_path().map(|path| {
            ReportWriter::new(
                LocalStorage::new(path.to_string()),
                path,
                config.report_formats().to_vec(),
            )
        });

        Ok(Self { suite, reporter })
    }
}

impl<S: ReportStorage> ProbeEngine<S> {
    pub fn new(suite: ProbeSuite) -> Self {
        Self {
            suite,
            reporter: None,
        }
    }

    pub fn with_reporter(mut self, reporter: ReportWriter<S>) -> Self {
        self.reporter = Some(reporter);
        self
    }

    pub fn suite(&self) -> &ProbeSuite {
        &self.suite
    }

    pub async fn run(&self) -> Result<RunOutcome> {
        let results = self.suite.run_all().await?;
        let summary = ProbeSuite::execution_summary(&results);
        tracing::info!("{}", render_summary(&summary));

        let report_files = match &self.reporter {
            Some(reporter) => {
                let files = reporter
                    .write(self.suite.execution_id(), &results, &summary)
                    .await?;
                for file in &files {
                    tracing::info!("📁 Report saved to: {}", file);
                }
                files
            }
            None => Vec::new(),
        };

        Ok(RunOutcome {
            execution_id: self.suite.execution_id().to_string(),
            results,
            summary,
            report_files,
        })
    }
}
