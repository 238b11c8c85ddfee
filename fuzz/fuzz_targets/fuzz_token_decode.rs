#![no_main]

use libfuzzer_sys::fuzz_target;
use relay_core::{decode, encode, RelayToken};

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };

    // Decoding arbitrary text must never panic.
    let _ = RelayToken::decode(text);

    // Whatever decodes must encode back to something that decodes the same.
    if let Ok((a, b, c)) = decode(text) {
        let again = decode(&encode(&a, &b, &c)).expect("re-encoded token must decode");
        assert_eq!(again, (a, b, c));
    }

    // Any text split three ways survives a round trip.
    let third = text.len() / 3;
    if let (Some(a), Some(b), Some(c)) = (
        text.get(..third),
        text.get(third..2 * third),
        text.get(2 * third..),
    ) {
        let decoded = decode(&encode(a, b, c)).expect("encoded fields must decode");
        assert_eq!(decoded, (a.to_string(), b.to_string(), c.to_string()));
    }
});
