//! Work providers: the external work service and the local generator.

use std::time::Duration;

use async_trait::async_trait;
use relay_types::BlockHash;
use serde::Deserialize;

use crate::thresholds::format_difficulty;
use crate::validator::{validate_work, work_value};
use crate::{WorkError, WorkGenerator, WorkNonce};

/// Obtains a proof-of-work solution for a block root.
///
/// A failure is fatal to the current block: callers surface it and never retry.
#[async_trait]
pub trait WorkProvider: Send + Sync {
    async fn generate_work(&self, root: &BlockHash, difficulty: u64)
        -> Result<WorkNonce, WorkError>;
}

#[async_trait]
impl<T: WorkProvider + ?Sized> WorkProvider for std::sync::Arc<T> {
    async fn generate_work(
        &self,
        root: &BlockHash,
        difficulty: u64,
    ) -> Result<WorkNonce, WorkError> {
        (**self).generate_work(root, difficulty).await
    }
}

// ── Local ───────────────────────────────────────────────────────────────

/// Generates work on this machine, off the async runtime's worker threads.
#[derive(Clone, Copy, Debug, Default)]
pub struct LocalWorkProvider {
    generator: WorkGenerator,
}

impl LocalWorkProvider {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl WorkProvider for LocalWorkProvider {
    async fn generate_work(
        &self,
        root: &BlockHash,
        difficulty: u64,
    ) -> Result<WorkNonce, WorkError> {
        let generator = self.generator;
        let root = *root;
        let started = std::time::Instant::now();
        let nonce = tokio::task::spawn_blocking(move || generator.generate(&root, difficulty))
            .await
            .map_err(|e| WorkError::GenerationFailed(format!("work task failed: {e}")))??;
        tracing::debug!(
            root = %root,
            work = %nonce,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "generated work locally"
        );
        Ok(nonce)
    }
}

// ── HTTP ────────────────────────────────────────────────────────────────

/// Client for a `work_generate` service reachable over the local network.
#[derive(Clone)]
pub struct HttpWorkProvider {
    http: reqwest::Client,
    url: String,
}

#[derive(Debug, Deserialize)]
struct WorkGenerateResponse {
    #[serde(default)]
    work: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

impl HttpWorkProvider {
    /// Create a client for the given work service URL (e.g. `http://127.0.0.1:7076`).
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, WorkError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| WorkError::GenerationFailed(format!("failed to create HTTP client: {e}")))?;
        Ok(Self {
            http,
            url: url.into(),
        })
    }

    /// The configured service URL.
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl WorkProvider for HttpWorkProvider {
    async fn generate_work(
        &self,
        root: &BlockHash,
        difficulty: u64,
    ) -> Result<WorkNonce, WorkError> {
        let body = serde_json::json!({
            "action": "work_generate",
            "hash": root.to_string(),
            "difficulty": format_difficulty(difficulty),
        });

        let response = self
            .http
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(|e| WorkError::GenerationFailed(format!("request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(WorkError::GenerationFailed(format!(
                "work service returned HTTP {}",
                response.status()
            )));
        }

        let reply: WorkGenerateResponse = response
            .json()
            .await
            .map_err(|e| WorkError::GenerationFailed(format!("invalid JSON response: {e}")))?;

        if let Some(err) = reply.error {
            return Err(WorkError::GenerationFailed(err));
        }
        let work = reply
            .work
            .ok_or_else(|| WorkError::GenerationFailed("response has no work field".into()))?;
        let nonce: WorkNonce = work.parse()?;

        // The node would reject it anyway; catching it here names the culprit.
        if !validate_work(root, nonce.0, difficulty) {
            return Err(WorkError::InsufficientDifficulty {
                actual: work_value(root, nonce.0),
                minimum: difficulty,
            });
        }
        Ok(nonce)
    }
}
