//! Account address derivation from public keys.
//!
//! Address format: `nano_` + base32(public_key, 52 chars) + base32(checksum, 8 chars)
//!
//! The public key is encoded as a 260-bit number (four zero bits in front of
//! the 256 key bits) so it fills exactly 52 characters. The checksum is the
//! byte-reversed Blake2b-40 digest of the public key.
//! Base32 alphabet: `13456789abcdefghijkmnopqrstuwxyz` (avoids ambiguous chars).
//! Total address length: 5 (prefix) + 52 + 8 = 65 characters.

use relay_types::{Account, PublicKey};

use crate::error::KeyError;

/// Base32 alphabet (32 chars, avoids visually ambiguous 0/O, 2/Z, l/I, v).
const BASE32_ALPHABET: &[u8; 32] = b"13456789abcdefghijkmnopqrstuwxyz";

/// Reverse lookup table: ASCII byte → 5-bit value (0xFF = invalid).
const BASE32_DECODE: [u8; 128] = {
    let mut table = [0xFFu8; 128];
    let alpha = BASE32_ALPHABET;
    let mut i = 0;
    while i < 32 {
        table[alpha[i] as usize] = i as u8;
        i += 1;
    }
    table
};

/// Expected length of the encoded part (after the prefix): 52 pubkey + 8 checksum.
const ENCODED_LEN: usize = 60;
/// Number of base32 characters for the public key (260 bits / 5).
const PUBKEY_CHARS: usize = 52;

/// Encode bytes as base32, left-padding with zero bits to a multiple of five.
fn encode_base32(bytes: &[u8]) -> String {
    let total_bits = bytes.len() * 8;
    let pad_bits = (5 - total_bits % 5) % 5;
    let mut result = String::with_capacity((total_bits + pad_bits) / 5);

    let mut buffer: u64 = 0;
    let mut bits_in_buffer = pad_bits;

    for &byte in bytes {
        buffer = (buffer << 8) | byte as u64;
        bits_in_buffer += 8;
        while bits_in_buffer >= 5 {
            bits_in_buffer -= 5;
            let idx = ((buffer >> bits_in_buffer) & 0x1F) as usize;
            result.push(BASE32_ALPHABET[idx] as char);
        }
        buffer &= (1u64 << bits_in_buffer) - 1;
    }

    result
}

/// Decode a left-padded base32 string into a fixed-size byte array.
///
/// Returns `None` on invalid characters, wrong length, or non-zero pad bits.
fn decode_base32_fixed<const N: usize>(s: &str) -> Option<[u8; N]> {
    let total_bits = s.len() * 5;
    if total_bits < N * 8 || total_bits - N * 8 >= 5 {
        return None;
    }
    let pad_bits = total_bits - N * 8;

    let mut buffer: u64 = 0;
    let mut bits_in_buffer = 0usize;
    let mut result = [0u8; N];
    let mut pos = 0;

    for (i, c) in s.bytes().enumerate() {
        if c >= 128 {
            return None;
        }
        let val = BASE32_DECODE[c as usize];
        if val == 0xFF {
            return None;
        }
        buffer = (buffer << 5) | val as u64;
        bits_in_buffer += 5;
        if i == 0 {
            if (val as u64) >> (5 - pad_bits) != 0 {
                return None;
            }
            bits_in_buffer -= pad_bits;
            buffer &= (1u64 << bits_in_buffer) - 1;
        }
        while bits_in_buffer >= 8 {
            bits_in_buffer -= 8;
            result[pos] = (buffer >> bits_in_buffer) as u8;
            pos += 1;
            buffer &= (1u64 << bits_in_buffer) - 1;
        }
    }

    Some(result)
}

/// Derive a `nano_`-prefixed account address from a public key.
pub fn derive_address(public_key: &PublicKey) -> Account {
    let pubkey_encoded = encode_base32(public_key.as_bytes());
    let checksum_encoded = encode_base32(&crate::address_checksum(public_key.as_bytes()));
    Account::new_unchecked(format!(
        "{}{}{}",
        Account::PREFIX,
        pubkey_encoded,
        checksum_encoded
    ))
}

/// Extract the public key from a valid address (`nano_` or legacy `xrb_`).
///
/// Returns `None` if the address is malformed or has an invalid checksum.
pub fn decode_address(address: &str) -> Option<PublicKey> {
    let encoded = address
        .strip_prefix(Account::PREFIX)
        .or_else(|| address.strip_prefix(Account::LEGACY_PREFIX))?;
    if encoded.len() != ENCODED_LEN {
        return None;
    }

    let (pubkey_encoded, checksum_encoded) = encoded.split_at(PUBKEY_CHARS);
    let pubkey_bytes: [u8; 32] = decode_base32_fixed(pubkey_encoded)?;
    let checksum_bytes: [u8; 5] = decode_base32_fixed(checksum_encoded)?;

    if checksum_bytes != crate::address_checksum(&pubkey_bytes) {
        return None;
    }

    Some(PublicKey(pubkey_bytes))
}

/// Validate that an address string is well-formed and its checksum is correct.
pub fn validate_address(address: &str) -> bool {
    decode_address(address).is_some()
}

/// Parse and validate an address, normalising the legacy prefix to `nano_`.
pub fn parse_account(address: &str) -> Result<Account, KeyError> {
    decode_address(address.trim())
        .map(|public| derive_address(&public))
        .ok_or_else(|| KeyError::InvalidAddress(address.to_string()))
}

/// The public key an account address encodes.
pub fn account_public_key(account: &Account) -> Result<PublicKey, KeyError> {
    decode_address(account.as_str()).ok_or_else(|| KeyError::InvalidAddress(account.to_string()))
}
