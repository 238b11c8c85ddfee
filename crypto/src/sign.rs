//! Ed25519-Blake2b message signing and verification.

use blake2::Blake2b512;
use ed25519_dalek::hazmat::{raw_sign, raw_verify};
use ed25519_dalek::VerifyingKey;
use relay_types::{PrivateKey, PublicKey, Signature};

use crate::keys::expand_secret;

/// Sign a message (for blocks: the 32-byte block hash) with a private key.
pub fn sign_message(message: &[u8], private_key: &PrivateKey) -> Signature {
    let expanded = expand_secret(private_key);
    let verifying_key = VerifyingKey::from(&expanded);
    let sig = raw_sign::<Blake2b512>(&expanded, message, &verifying_key);
    Signature(sig.to_bytes())
}

/// Verify a signature against a message and public key.
///
/// Returns `true` if the signature is valid, `false` otherwise.
pub fn verify_signature(message: &[u8], signature: &Signature, public_key: &PublicKey) -> bool {
    let Ok(verifying_key) = VerifyingKey::from_bytes(&public_key.0) else {
        return false;
    };
    let dalek_sig = ed25519_dalek::Signature::from_bytes(&signature.0);
    raw_verify::<Blake2b512>(&verifying_key, message, &dalek_sig).is_ok()
}
