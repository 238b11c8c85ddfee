//! Sealing of relayed messages.
//!
//! The symmetric key is Blake2b-256 over a domain tag, the recipient address
//! and the relay secret, so only someone holding both can open the message.
//! Messages are sealed with ChaCha20-Poly1305 under a random 96-bit nonce,
//! which is prepended to the ciphertext.

use chacha20poly1305::{
    aead::{Aead, AeadCore, KeyInit},
    ChaCha20Poly1305, Key, Nonce,
};
use rand::rngs::OsRng;
use relay_types::Account;

use crate::error::CipherError;

const MESSAGE_KEY_DOMAIN: &[u8] = b"relay-message-key";
const NONCE_LEN: usize = 12;
const TAG_LEN: usize = 16;

/// Derive the symmetric key bound to a recipient address and relay secret.
pub fn message_key(recipient: &Account, secret: &[u8]) -> [u8; 32] {
    let address_len = (recipient.as_str().len() as u32).to_le_bytes();
    crate::blake2b_256_multi(&[
        MESSAGE_KEY_DOMAIN,
        &address_len,
        recipient.as_str().as_bytes(),
        secret,
    ])
}

/// Seal `plaintext`, returning `nonce || ciphertext || tag`.
pub fn encrypt_message(plaintext: &[u8], key: &[u8; 32]) -> Result<Vec<u8>, CipherError> {
    let cipher = ChaCha20Poly1305::new(Key::from_slice(key));
    let nonce = ChaCha20Poly1305::generate_nonce(&mut OsRng);
    let ciphertext = cipher
        .encrypt(&nonce, plaintext)
        .map_err(|_| CipherError::Encryption)?;

    let mut sealed = Vec::with_capacity(NONCE_LEN + ciphertext.len());
    sealed.extend_from_slice(&nonce);
    sealed.extend_from_slice(&ciphertext);
    Ok(sealed)
}

/// Open a message sealed by [`encrypt_message`].
pub fn decrypt_message(sealed: &[u8], key: &[u8; 32]) -> Result<Vec<u8>, CipherError> {
    if sealed.len() < NONCE_LEN + TAG_LEN {
        return Err(CipherError::Truncated(sealed.len()));
    }
    let (nonce, ciphertext) = sealed.split_at(NONCE_LEN);
    let cipher = ChaCha20Poly1305::new(Key::from_slice(key));
    cipher
        .decrypt(Nonce::from_slice(nonce), ciphertext)
        .map_err(|_| CipherError::Authentication)
}
