//! Thin request/response caller to the scoring collaborator.
//!
//! One POST per task over a pooled client with a bounded timeout. Failures
//! are reported to the caller as-is and never retried here; concurrent
//! calls are fully independent.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use judgewire_core::error::{JudgewireError, Result};
use judgewire_core::protocol::TaskKind;

/// Dispatch-facing seam; tests substitute a stub backend.
#[async_trait]
pub trait ScoringBackend: Send + Sync {
    /// One scoring call. No retry, no ordering guarantee between calls.
    async fn score(&self, task: TaskKind, request: Value) -> Result<Value>;
}

/// HTTP implementation over a pooled `reqwest` client.
pub struct ScoringClient {
    http: reqwest::Client,
    base_url: String,
}

impl ScoringClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| JudgewireError::Internal(format!("http client build failed: {e}")))?;
        Ok(Self {
            http,
            base_url: base_url.into(),
        })
    }
}

#[async_trait]
impl ScoringBackend for ScoringClient {
    async fn score(&self, task: TaskKind, request: Value) -> Result<Value> {
        let url = format!("{}{}", self.base_url, task.endpoint());
        let resp = self.http.post(&url).json(&request).send().await.map_err(|e| {
            if e.is_timeout() {
                JudgewireError::ScoringTimeout
            } else {
                JudgewireError::ScoringFailed(format!("request failed: {e}"))
            }
        })?;

        let status = resp.status();
        if !status.is_success() {
            return Err(JudgewireError::ScoringStatus(status.as_u16()));
        }

        resp.json::<Value>()
            .await
            .map_err(|e| JudgewireError::ScoringFailed(format!("invalid response body: {e}")))
    }
}
