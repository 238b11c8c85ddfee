#![no_main]

use libfuzzer_sys::fuzz_target;
use relay_crypto::{decode_address, derive_address};
use relay_types::PublicKey;

fuzz_target!(|data: &[u8]| {
    if let Ok(text) = std::str::from_utf8(data) {
        // A decodable address must re-derive to a spelling that decodes to the same key.
        if let Some(key) = decode_address(text) {
            let canonical = derive_address(&key);
            assert_eq!(decode_address(canonical.as_str()), Some(key));
        }
    }

    if data.len() >= 32 {
        let mut key = [0u8; 32];
        key.copy_from_slice(&data[..32]);
        let address = derive_address(&PublicKey(key));
        assert_eq!(decode_address(address.as_str()), Some(PublicKey(key)));
    }
});
