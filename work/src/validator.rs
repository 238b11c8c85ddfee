//! PoW validation.

use relay_crypto::blake2b_64_multi;
use relay_types::BlockHash;

/// The work value of `nonce` against `root`: Blake2b-64(nonce_le || root), read little-endian.
pub fn work_value(root: &BlockHash, nonce: u64) -> u64 {
    let digest = blake2b_64_multi(&[&nonce.to_le_bytes(), root.as_bytes()]);
    u64::from_le_bytes(digest)
}

/// Validate that a work nonce meets the minimum difficulty for a given root.
pub fn validate_work(root: &BlockHash, nonce: u64, min_difficulty: u64) -> bool {
    work_value(root, nonce) >= min_difficulty
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_difficulty_always_passes() {
        assert!(validate_work(&BlockHash::new([1; 32]), 0, 0));
    }

    #[test]
    fn value_is_its_own_threshold() {
        let root = BlockHash::new([0xAA; 32]);
        let value = work_value(&root, 12345);
        assert!(validate_work(&root, 12345, value));
        if value < u64::MAX {
            assert!(!validate_work(&root, 12345, value + 1));
        }
    }

    #[test]
    fn work_value_matches_reference_vector() {
        let root: BlockHash = "718CC2121C3E641059BC1C2CFC45666C99E8AE922F7A807B7D07B62C995D79E2"
            .parse()
            .unwrap();
        let value = work_value(&root, 0x2b3d_689b_bcb2_1dca);
        assert_eq!(format!("{value:016x}"), "fffffff93c41ec94");
        assert!(validate_work(&root, 0x2b3d_689b_bcb2_1dca, 0xffff_fff8_0000_0000));
    }

    #[test]
    fn root_matters() {
        let a = work_value(&BlockHash::new([1; 32]), 7);
        let b = work_value(&BlockHash::new([2; 32]), 7);
        assert_ne!(a, b);
    }
}
