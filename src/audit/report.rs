//! Change report delivery.
//!
//! Delivery is the one step whose failure stops a print: edited values are
//! never printed without a recorded justification.

use async_trait::async_trait;
use std::sync::Mutex;
use std::time::Duration;
use tracing::{error, info};

use super::ChangeReport;
use crate::error::CartelError;

/// Notification service accepting change reports.
#[async_trait]
pub trait ReportSender: Send + Sync {
    async fn send(&self, report: &ChangeReport) -> Result<(), CartelError>;
}

/// Send a report, failing with `ReportSendFailed` after `timeout`.
pub async fn send_with_timeout(
    sender: &dyn ReportSender,
    report: &ChangeReport,
    timeout: Duration,
) -> Result<(), CartelError> {
    let result = match tokio::time::timeout(timeout, sender.send(report)).await {
        Ok(Ok(())) => Ok(()),
        Ok(Err(CartelError::ReportSendFailed(msg))) => Err(CartelError::ReportSendFailed(msg)),
        Ok(Err(e)) => Err(CartelError::ReportSendFailed(e.to_string())),
        Err(_) => Err(CartelError::ReportSendFailed(format!(
            "no answer within {} ms",
            timeout.as_millis()
        ))),
    };

    match &result {
        Ok(()) => info!(
            report = %report.id,
            products = report.edited_products.len(),
            changes = report.change_count(),
            "change report sent"
        ),
        Err(e) => error!(report = %report.id, error = %e, "change report failed"),
    }
    result
}

/// Records reports in the log and always succeeds.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogReportSender;

#[async_trait]
impl ReportSender for LogReportSender {
    async fn send(&self, report: &ChangeReport) -> Result<(), CartelError> {
        info!(
            report = %report.id,
            family = %report.family,
            variant = %report.variant,
            justification = %report.justification,
            "{}",
            report.summary()
        );
        Ok(())
    }
}

/// POSTs reports as JSON to a webhook.
#[derive(Debug, Clone)]
pub struct WebhookReportSender {
    client: reqwest::Client,
    url: String,
}

impl WebhookReportSender {
    pub fn new(url: impl Into<String>) -> Result<Self, CartelError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("carteles/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| CartelError::Config(format!("HTTP client error: {}", e)))?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl ReportSender for WebhookReportSender {
    async fn send(&self, report: &ChangeReport) -> Result<(), CartelError> {
        let response = self
            .client
            .post(&self.url)
            .json(report)
            .send()
            .await
            .map_err(|e| CartelError::ReportSendFailed(format!("POST {}: {}", self.url, e)))?;
        if !response.status().is_success() {
            return Err(CartelError::ReportSendFailed(format!(
                "POST {}: HTTP {}",
                self.url,
                response.status()
            )));
        }
        Ok(())
    }
}

/// Keeps every report it is given. Can be told to fail or to stall.
#[derive(Debug, Default)]
pub struct RecordingReportSender {
    sent: Mutex<Vec<ChangeReport>>,
    failure: Option<String>,
    delay: Option<Duration>,
}

impl RecordingReportSender {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject every report with this message.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            failure: Some(message.into()),
            ..Self::default()
        }
    }

    /// Wait this long before answering.
    pub fn stalling(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    pub fn sent(&self) -> Vec<ChangeReport> {
        self.sent.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl ReportSender for RecordingReportSender {
    async fn send(&self, report: &ChangeReport) -> Result<(), CartelError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(msg) = &self.failure {
            return Err(CartelError::ReportSendFailed(msg.clone()));
        }
        if let Ok(mut sent) = self.sent.lock() {
            sent.push(report.clone());
        }
        Ok(())
    }
}
