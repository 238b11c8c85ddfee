//! Ed25519-Blake2b key derivation.
//!
//! The ledger uses Ed25519 with Blake2b-512 in place of SHA-512, both for
//! expanding the 32-byte secret and for the signature challenge. The
//! `hazmat` API of `ed25519-dalek` lets us plug in that digest.

use blake2::{Blake2b512, Digest};
use ed25519_dalek::hazmat::ExpandedSecretKey;
use ed25519_dalek::VerifyingKey;
use relay_types::{KeyPair, PrivateKey, PublicKey};
use zeroize::Zeroize;

use crate::error::KeyError;

/// Expand a secret into the clamped scalar and nonce prefix.
pub(crate) fn expand_secret(private: &PrivateKey) -> ExpandedSecretKey {
    let mut bytes = [0u8; 64];
    bytes.copy_from_slice(&Blake2b512::digest(private.expose()));
    let expanded = ExpandedSecretKey::from_bytes(&bytes);
    bytes.zeroize();
    expanded
}

/// Derive the public key from a private key.
pub fn public_from_private(private: &PrivateKey) -> PublicKey {
    let expanded = expand_secret(private);
    PublicKey(VerifyingKey::from(&expanded).to_bytes())
}

/// Reconstruct a full key pair from a private key.
pub fn keypair_from_private(private: PrivateKey) -> KeyPair {
    let public = public_from_private(&private);
    KeyPair { public, private }
}

/// Parse a hex-encoded 256-bit secret.
///
/// Surrounding whitespace (e.g. the newline a hashing tool prints) is ignored;
/// anything other than exactly 64 hex characters is `InvalidSecretFormat`.
pub fn parse_private_key(hex: &str) -> Result<PrivateKey, KeyError> {
    PrivateKey::from_hex(hex).map_err(|e| KeyError::InvalidSecretFormat(e.to_string()))
}
