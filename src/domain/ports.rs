use crate::core::client::WebhookClient;
use crate::domain::model::{ProbeKind, ProbeOutcome, WebhookResponse};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::time::Duration;

pub trait ReportStorage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn base_url(&self) -> &str;
    fn user_id(&self) -> &str;
    fn timeout(&self) -> Duration;
    fn delay(&self) -> Duration;
    fn report_path(&self) -> Option<&str>;
    fn report_formats(&self) -> &[String];
}

/// 對 webhook 發出一次請求並判讀回應
#[async_trait]
pub trait Probe: Send + Sync {
    fn name(&self) -> &str;
    fn kind(&self) -> ProbeKind;
    fn expectation(&self) -> &str;

    /// 請求的方法、路徑與內容，供 dry run 顯示
    fn describe_request(&self) -> String;

    /// 送出前輸出的說明行
    fn announce(&self) -> Vec<String> {
        Vec::new()
    }

    async fn send(&self, client: &WebhookClient) -> Result<WebhookResponse>;

    fn evaluate(&self, response: &WebhookResponse) -> ProbeOutcome;

    fn should_execute(&self) -> bool {
        true
    }
}
