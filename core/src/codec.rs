//! Relay tokens and message sealing.
//!
//! A token is three comma-separated fields: the secondary address, the hex
//! seed hash of the secondary secret, and the hex ciphertext. Inside a field
//! `%` is written `%25` and `,` is written `%2C`, so any field content
//! survives the round trip.

use std::fmt;
use std::str::FromStr;

use relay_crypto::{decrypt_message, encrypt_message, message_key, parse_account, CipherError};
use relay_types::Account;

use crate::error::CodecError;

const SEPARATOR: char = ',';

/// Join three fields into a token.
pub fn encode(a: &str, b: &str, c: &str) -> String {
    [a, b, c].map(escape).join(",")
}

/// Split a token back into its three fields.
pub fn decode(token: &str) -> Result<(String, String, String), CodecError> {
    let parts: Vec<&str> = token.split(SEPARATOR).collect();
    let [a, b, c] = parts.as_slice() else {
        return Err(CodecError::MalformedToken(format!(
            "expected 3 fields, found {}",
            parts.len()
        )));
    };
    Ok((unescape(a)?, unescape(b)?, unescape(c)?))
}

fn escape(field: &str) -> String {
    let mut out = String::with_capacity(field.len());
    for ch in field.chars() {
        match ch {
            '%' => out.push_str("%25"),
            SEPARATOR => out.push_str("%2C"),
            other => out.push(other),
        }
    }
    out
}

fn unescape(field: &str) -> Result<String, CodecError> {
    let mut out = String::with_capacity(field.len());
    let mut rest = field;
    while let Some(at) = rest.find('%') {
        out.push_str(&rest[..at]);
        let code = rest.get(at + 1..at + 3).unwrap_or_default();
        match code {
            "25" => out.push('%'),
            "2C" | "2c" => out.push(SEPARATOR),
            _ => {
                return Err(CodecError::MalformedToken(format!(
                    "bad escape '%{code}'"
                )))
            }
        }
        rest = &rest[at + 3..];
    }
    out.push_str(rest);
    Ok(out)
}

/// Seal `message` for `recipient` under `secret`; returns hex.
pub fn encrypt(message: &str, recipient: &Account, secret: &[u8]) -> Result<String, CodecError> {
    let key = message_key(recipient, secret);
    let sealed = encrypt_message(message.as_bytes(), &key).map_err(CodecError::Encryption)?;
    Ok(hex::encode(sealed))
}

/// Open a hex ciphertext produced by [`encrypt`] with the same recipient and secret.
pub fn decrypt(ciphertext: &str, recipient: &Account, secret: &[u8]) -> Result<String, CodecError> {
    let sealed = hex::decode(ciphertext)
        .map_err(|e| CodecError::MalformedToken(format!("ciphertext: {e}")))?;
    let key = message_key(recipient, secret);
    let plain = decrypt_message(&sealed, &key).map_err(|e| match e {
        CipherError::Encryption => CodecError::Encryption(e),
        CipherError::Truncated(_) | CipherError::Authentication => CodecError::DecryptionFailed,
    })?;
    String::from_utf8(plain).map_err(|_| CodecError::DecryptionFailed)
}

/// The transport artifact of a finished relay.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RelayToken {
    pub secondary: Account,
    /// Fingerprint of the secondary secret; the message key material.
    pub seed_hash: [u8; 32],
    /// Hex ciphertext from [`encrypt`].
    pub ciphertext: String,
}

impl RelayToken {
    pub fn encode(&self) -> String {
        encode(
            self.secondary.as_str(),
            &hex::encode(self.seed_hash),
            &self.ciphertext,
        )
    }

    pub fn decode(token: &str) -> Result<Self, CodecError> {
        let (secondary, seed_hash, ciphertext) = decode(token.trim())?;
        let secondary = parse_account(&secondary)?;
        let mut hash = [0u8; 32];
        hex::decode_to_slice(&seed_hash, &mut hash)
            .map_err(|e| CodecError::MalformedToken(format!("seed hash: {e}")))?;
        Ok(Self {
            secondary,
            seed_hash: hash,
            ciphertext,
        })
    }

    /// Open the carried message; `recipient` is the account the relay returned to.
    pub fn open(&self, recipient: &Account) -> Result<String, CodecError> {
        decrypt(&self.ciphertext, recipient, &self.seed_hash)
    }
}

impl fmt::Display for RelayToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

impl FromStr for RelayToken {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::decode(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use relay_crypto::derive_address;
    use relay_types::PublicKey;

    fn account(byte: u8) -> Account {
        derive_address(&PublicKey([byte; 32]))
    }

    #[test]
    fn fields_with_commas_roundtrip() {
        let token = encode("a,b", "100%", "%2C,");
        assert_eq!(token.matches(',').count(), 2);
        assert_eq!(
            decode(&token).unwrap(),
            ("a,b".into(), "100%".into(), "%2C,".into())
        );
    }

    #[test]
    fn empty_fields_roundtrip() {
        assert_eq!(decode(",,").unwrap(), (String::new(), String::new(), String::new()));
    }

    #[test]
    fn wrong_field_count_is_malformed() {
        for token in ["", "one", "one,two", "a,b,c,d"] {
            assert!(matches!(decode(token), Err(CodecError::MalformedToken(_))), "{token}");
        }
    }

    #[test]
    fn bad_escape_is_malformed() {
        assert!(matches!(decode("a%zz,b,c"), Err(CodecError::MalformedToken(_))));
        assert!(matches!(decode("a,b,c%2"), Err(CodecError::MalformedToken(_))));
        assert!(matches!(decode("a,b,c%"), Err(CodecError::MalformedToken(_))));
    }

    #[test]
    fn encrypt_then_decrypt() {
        let recipient = account(1);
        let sealed = encrypt("meet at noon, bring snacks", &recipient, b"secret").unwrap();
        assert_eq!(
            decrypt(&sealed, &recipient, b"secret").unwrap(),
            "meet at noon, bring snacks"
        );
    }

    #[test]
    fn wrong_recipient_or_secret_fails() {
        let sealed = encrypt("hi", &account(1), b"secret").unwrap();
        assert!(matches!(
            decrypt(&sealed, &account(2), b"secret"),
            Err(CodecError::DecryptionFailed)
        ));
        assert!(matches!(
            decrypt(&sealed, &account(1), b"other"),
            Err(CodecError::DecryptionFailed)
        ));
    }

    #[test]
    fn token_roundtrip_and_open() {
        let recipient = account(1);
        let seed_hash = [7u8; 32];
        let token = RelayToken {
            secondary: account(2),
            seed_hash,
            ciphertext: encrypt("hello", &recipient, &seed_hash).unwrap(),
        };
        let parsed: RelayToken = token.to_string().parse().unwrap();
        assert_eq!(parsed, token);
        assert_eq!(parsed.open(&recipient).unwrap(), "hello");
    }

    #[test]
    fn token_with_bad_address_is_rejected() {
        let token = encode("nano_nothing", &hex::encode([0u8; 32]), "00");
        assert!(matches!(
            RelayToken::decode(&token),
            Err(CodecError::InvalidAddress(_))
        ));
    }

    #[test]
    fn token_with_short_seed_hash_is_malformed() {
        let token = encode(account(2).as_str(), "abcd", "00");
        assert!(matches!(
            RelayToken::decode(&token),
            Err(CodecError::MalformedToken(_))
        ));
    }
}
