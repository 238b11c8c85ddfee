//! Blake2b hashing for blocks, address checksums and work values.

use blake2::digest::consts::{U32, U5, U8};
use blake2::{Blake2b, Digest};

type Blake2b256 = Blake2b<U32>;
type Blake2b64 = Blake2b<U8>;
type Blake2b40 = Blake2b<U5>;

/// Compute a 256-bit Blake2b hash of arbitrary data.
pub fn blake2b_256(data: &[u8]) -> [u8; 32] {
    blake2b_256_multi(&[data])
}

/// Hash multiple byte slices in sequence (avoids concatenation allocation).
pub fn blake2b_256_multi(parts: &[&[u8]]) -> [u8; 32] {
    let mut hasher = Blake2b256::new();
    for part in parts {
        hasher.update(part);
    }
    hasher.finalize().into()
}

/// 64-bit Blake2b over several slices, as used for work values.
pub fn blake2b_64_multi(parts: &[&[u8]]) -> [u8; 8] {
    let mut hasher = Blake2b64::new();
    for part in parts {
        hasher.update(part);
    }
    hasher.finalize().into()
}

/// The 40-bit address checksum: Blake2b-40 of the public key, byte-reversed.
pub fn address_checksum(public_key: &[u8; 32]) -> [u8; 5] {
    let mut checksum: [u8; 5] = Blake2b40::digest(public_key).into();
    checksum.reverse();
    checksum
}
