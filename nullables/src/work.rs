//! Nullable work provider: instant, recorded proof-of-work.

use std::sync::Mutex;

use async_trait::async_trait;
use relay_types::BlockHash;
use relay_work::{WorkError, WorkNonce, WorkProvider};

use crate::lock;

/// Returns a fixed nonce without doing any work, recording each request.
#[derive(Debug, Default)]
pub struct NullWorkProvider {
    requests: Mutex<Vec<(BlockHash, u64)>>,
    failure: Mutex<Option<String>>,
}

impl NullWorkProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every later request fail with `reason`.
    pub fn fail_with(&self, reason: impl Into<String>) {
        *lock(&self.failure) = Some(reason.into());
    }

    /// Every `(root, difficulty)` asked for so far, in order.
    pub fn requests(&self) -> Vec<(BlockHash, u64)> {
        lock(&self.requests).clone()
    }

    /// Just the roots.
    pub fn roots(&self) -> Vec<BlockHash> {
        lock(&self.requests).iter().map(|(root, _)| *root).collect()
    }
}

#[async_trait]
impl WorkProvider for NullWorkProvider {
    async fn generate_work(
        &self,
        root: &BlockHash,
        difficulty: u64,
    ) -> Result<WorkNonce, WorkError> {
        lock(&self.requests).push((*root, difficulty));
        match lock(&self.failure).as_ref() {
            Some(reason) => Err(WorkError::GenerationFailed(reason.clone())),
            None => Ok(WorkNonce(1)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn records_requests_and_fails_on_demand() {
        let work = NullWorkProvider::new();
        let root = BlockHash::new([3u8; 32]);
        work.generate_work(&root, 5).await.unwrap();
        work.fail_with("service down");
        let err = work.generate_work(&root, 6).await.unwrap_err();
        assert!(matches!(err, WorkError::GenerationFailed(reason) if reason == "service down"));
        assert_eq!(work.requests(), vec![(root, 5), (root, 6)]);
    }
}
