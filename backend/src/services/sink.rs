// src/services/sink.rs

use std::time::Duration;

use async_trait::async_trait;
use url::Url;

use crate::{
    error::AppError,
    models::response::{ResponseRecord, SinkPayload},
};

/// External system that receives a copy of every finalized answer.
#[async_trait]
pub trait ResponseSink: Send + Sync {
    async fn push(&self, record: &ResponseRecord) -> Result<(), AppError>;
}

/// Posts each answer as JSON to a configured endpoint (e.g. a spreadsheet
/// web app).
pub struct WebhookSink {
    client: reqwest::Client,
    endpoint: Url,
}

impl WebhookSink {
    pub fn new(endpoint: Url, timeout: Duration) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()?;
        Ok(Self { client, endpoint })
    }
}

#[async_trait]
impl ResponseSink for WebhookSink {
    async fn push(&self, record: &ResponseRecord) -> Result<(), AppError> {
        self.client
            .post(self.endpoint.clone())
            .json(&SinkPayload::from(record))
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}

/// Offers every record to `sink`, logging failures instead of returning them.
///
/// Returns how many records were accepted.
pub async fn deliver(sink: &dyn ResponseSink, records: &[ResponseRecord]) -> usize {
    let mut delivered = 0;
    for record in records {
        match sink.push(record).await {
            Ok(()) => delivered += 1,
            Err(e) => tracing::warn!(
                "Could not push answer for question {} of {} to sink: {}",
                record.question_id,
                record.candidate_email,
                e
            ),
        }
    }
    delivered
}
