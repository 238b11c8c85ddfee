//! Secondary-secret derivation from arbitrary input.

use relay_types::PrivateKey;

/// Maps arbitrary input (the relayed message) to a 256-bit secret.
///
/// Must be deterministic: the same input always yields the same secret, so a
/// relay can be resumed from the message alone.
pub trait SeedHasher: Send + Sync {
    fn derive_secret(&self, input: &[u8]) -> PrivateKey;
}

/// BLAKE3 of the input followed by a newline, the root hash that
/// `echo <message> | bao hash` prints.
#[derive(Clone, Copy, Debug, Default)]
pub struct Blake3SeedHasher;

impl SeedHasher for Blake3SeedHasher {
    fn derive_secret(&self, input: &[u8]) -> PrivateKey {
        let mut hasher = blake3::Hasher::new();
        hasher.update(input);
        hasher.update(b"\n");
        PrivateKey(*hasher.finalize().as_bytes())
    }
}

/// Public fingerprint of a secondary secret, carried in relay tokens.
///
/// The token holds this hash rather than the secret, so a token never hands
/// out the secondary account's signing key.
pub fn seed_hash(secret: &PrivateKey) -> [u8; 32] {
    crate::blake2b_256_multi(&[b"relay-seed-hash", secret.expose()])
}
