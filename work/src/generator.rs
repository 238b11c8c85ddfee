//! PoW generation (multi-threaded CPU).

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use rayon::prelude::*;

use crate::validator::work_value;
use crate::{WorkError, WorkNonce};
use relay_types::BlockHash;

/// Generates proof-of-work for a root using all available CPU cores.
#[derive(Clone, Copy, Debug, Default)]
pub struct WorkGenerator;

/// Batch size per thread before checking the stop flag.
const BATCH_SIZE: u64 = 4096;

impl WorkGenerator {
    /// Generate a work nonce that meets the minimum difficulty.
    ///
    /// Splits the nonce space across all available CPU cores via rayon.
    /// The first thread to find a valid nonce signals the others to stop.
    pub fn generate(&self, root: &BlockHash, min_difficulty: u64) -> Result<WorkNonce, WorkError> {
        self.generate_until(root, min_difficulty, &AtomicBool::new(false))
    }

    /// Like [`generate`](Self::generate) but abandons the search once `cancel` is set.
    pub fn generate_until(
        &self,
        root: &BlockHash,
        min_difficulty: u64,
        cancel: &AtomicBool,
    ) -> Result<WorkNonce, WorkError> {
        if min_difficulty == 0 {
            return Ok(WorkNonce(0));
        }

        let found = AtomicU64::new(u64::MAX);
        let done = AtomicBool::new(false);
        let num_threads = rayon::current_num_threads().max(1);

        (0..num_threads).into_par_iter().for_each(|thread_id| {
            let stride = num_threads as u64;
            let mut nonce = thread_id as u64;

            loop {
                if done.load(Ordering::Relaxed) || cancel.load(Ordering::Relaxed) {
                    return;
                }

                for _ in 0..BATCH_SIZE {
                    if work_value(root, nonce) >= min_difficulty {
                        found.store(nonce, Ordering::Relaxed);
                        done.store(true, Ordering::Relaxed);
                        return;
                    }
                    nonce = nonce.wrapping_add(stride);
                }
            }
        });

        if done.load(Ordering::Relaxed) {
            Ok(WorkNonce(found.load(Ordering::Relaxed)))
        } else {
            Err(WorkError::Cancelled)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validate_work;

    #[test]
    fn test_generate_work() {
        let root = BlockHash::new([0x42; 32]);
        let min_difficulty = 0xff00_0000_0000_0000;

        let nonce = WorkGenerator.generate(&root, min_difficulty).unwrap();

        assert!(validate_work(&root, nonce.0, min_difficulty));
    }

    #[test]
    fn test_zero_difficulty() {
        let root = BlockHash::new([0u8; 32]);
        let nonce = WorkGenerator.generate(&root, 0).unwrap();
        assert_eq!(nonce.0, 0);
    }

    #[test]
    fn test_cancelled_before_start() {
        let root = BlockHash::new([0x42; 32]);
        let cancel = AtomicBool::new(true);
        let result = WorkGenerator.generate_until(&root, u64::MAX, &cancel);
        assert!(matches!(result, Err(WorkError::Cancelled)));
    }
}
