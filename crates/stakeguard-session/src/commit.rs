//! Commit boundary: hands a reviewed, staked invoice to the system of record

use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use stakeguard_invoice::{ExtractedInvoice, deadline::deadline_timestamp};
use thiserror::Error;

/// What the system of record receives when an invoice is committed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitRequest {
    pub title: String,
    pub description: String,
    pub amount: f64,
    /// Deadline token as extracted
    pub deadline: String,
    /// UTC midnight of the deadline, when the token can be resolved
    pub deadline_timestamp: Option<i64>,
    pub stake_value: f64,
}

impl CommitRequest {
    /// Build a request from reviewed fields and a validated stake
    pub fn new(extracted: &ExtractedInvoice, stake_value: f64, today: NaiveDate) -> Self {
        let deadline = extracted.deadline.clone().unwrap_or_default();
        Self {
            title: extracted.title.clone(),
            description: extracted.description.clone(),
            amount: extracted.amount.unwrap_or_default(),
            deadline_timestamp: deadline_timestamp(&deadline, today),
            deadline,
            stake_value,
        }
    }
}

/// Opaque proof of a successful commit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitReceipt {
    pub reference: String,
}

/// A rejected commit; `reason` is shown to the user verbatim
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{reason}")]
pub struct CommitError {
    pub reason: String,
}

impl CommitError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// Capability that finalizes an invoice with its stake.
///
/// Once called the commit runs to completion; there is no cancellation.
#[async_trait]
pub trait CommitBoundary: Send + Sync {
    async fn commit(&self, request: &CommitRequest) -> Result<CommitReceipt, CommitError>;
}

/// Pretends to submit a transaction: waits, then always succeeds
#[derive(Debug, Clone)]
pub struct SimulatedCommit {
    delay: Duration,
}

impl SimulatedCommit {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

impl Default for SimulatedCommit {
    fn default() -> Self {
        Self::new(Duration::from_secs(2))
    }
}

#[async_trait]
impl CommitBoundary for SimulatedCommit {
    async fn commit(&self, request: &CommitRequest) -> Result<CommitReceipt, CommitError> {
        tracing::debug!(
            "Simulating commit of '{}' with stake {}",
            request.title,
            request.stake_value
        );
        tokio::time::sleep(self.delay).await;
        Ok(CommitReceipt {
            reference: format!("sim-{}", uuid::Uuid::new_v4()),
        })
    }
}

/// Posts the commit request as JSON to an HTTP endpoint.
///
/// A 2xx response is a success; its `reference` field (if any) becomes the
/// receipt. Any other status fails with the body's `error` field, or the raw
/// body when there is none.
pub struct HttpCommitBoundary {
    client: reqwest::Client,
    url: String,
}

impl HttpCommitBoundary {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
        }
    }
}

#[async_trait]
impl CommitBoundary for HttpCommitBoundary {
    async fn commit(&self, request: &CommitRequest) -> Result<CommitReceipt, CommitError> {
        let response = self
            .client
            .post(&self.url)
            .json(request)
            .send()
            .await
            .map_err(|e| CommitError::new(e.to_string()))?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        let parsed = serde_json::from_str::<Value>(&body).ok();
        let field = |name: &str| {
            parsed
                .as_ref()
                .and_then(|v| v.get(name))
                .and_then(Value::as_str)
                .map(str::to_string)
        };

        if !status.is_success() {
            let reason = field("error").unwrap_or_else(|| {
                if body.trim().is_empty() {
                    format!("commit endpoint returned {}", status)
                } else {
                    body.trim().to_string()
                }
            });
            return Err(CommitError::new(reason));
        }

        Ok(CommitReceipt {
            reference: field("reference").unwrap_or_else(|| format!("http-{}", status.as_u16())),
        })
    }
}
