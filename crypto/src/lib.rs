//! Cryptographic primitives for the account-chain relay.
//!
//! - **Ed25519 with Blake2b-512** for key expansion and block signatures (the ledger's curve convention)
//! - **Blake2b** for hashing (block hashes, address checksums, work values)
//! - **BLAKE3** for deriving a secondary secret from arbitrary input
//! - **ChaCha20-Poly1305** for sealing relayed messages
//! - Address derivation with `nano_` prefix and base32 encoding

pub mod address;
pub mod encryption;
pub mod error;
pub mod hash;
pub mod keys;
pub mod seed;
pub mod sign;

pub use address::{account_public_key, decode_address, derive_address, parse_account, validate_address};
pub use encryption::{decrypt_message, encrypt_message, message_key};
pub use error::{CipherError, KeyError};
pub use hash::{address_checksum, blake2b_256, blake2b_256_multi, blake2b_64_multi};
pub use keys::{keypair_from_private, parse_private_key, public_from_private};
pub use seed::{seed_hash, Blake3SeedHasher, SeedHasher};
pub use sign::{sign_message, verify_signature};
