#![no_main]

use libfuzzer_sys::fuzz_target;
use relay_ledger::StateBlock;

// Blocks arrive as node JSON; parsing and hashing them must never panic.
fuzz_target!(|data: &[u8]| {
    if let Ok(block) = serde_json::from_slice::<StateBlock>(data) {
        let _ = block.compute_hash();
        let _ = block.verify_signature();
        let _ = block.link_as_account();
        if let Ok(json) = serde_json::to_vec(&block) {
            let again: StateBlock = serde_json::from_slice(&json).expect("serialized block must parse");
            assert_eq!(again, block);
        }
    }
});
