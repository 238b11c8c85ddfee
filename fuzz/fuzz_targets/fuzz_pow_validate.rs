#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // 32 bytes of root and 8 of nonce, optionally 8 more of difficulty.
    if data.len() >= 40 {
        let mut root = [0u8; 32];
        root.copy_from_slice(&data[..32]);
        let mut nonce = [0u8; 8];
        nonce.copy_from_slice(&data[32..40]);
        let nonce = u64::from_le_bytes(nonce);
        let root = relay_types::BlockHash::new(root);

        let difficulty = match data.get(40..48) {
            Some(bytes) => {
                let mut d = [0u8; 8];
                d.copy_from_slice(bytes);
                u64::from_le_bytes(d)
            }
            None => relay_work::WorkThresholds::new().receive,
        };

        let value = relay_work::work_value(&root, nonce);
        assert_eq!(
            relay_work::validate_work(&root, nonce, difficulty),
            value >= difficulty
        );
    }
});
