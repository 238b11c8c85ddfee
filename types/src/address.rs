//! Account address type with `nano_` prefix.

use serde::{Deserialize, Serialize};
use std::fmt;

/// An account address on the ledger, e.g. `nano_3t6k35gi95xu...`.
///
/// Derived from the account's public key via base32 encoding plus a Blake2b
/// checksum. This type only carries the text; checksum validation lives in
/// `relay_crypto::parse_account`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Account(String);

impl Account {
    /// The canonical prefix for addresses produced by this workspace.
    pub const PREFIX: &'static str = "nano_";

    /// Legacy prefix still accepted on input.
    pub const LEGACY_PREFIX: &'static str = "xrb_";

    /// Wrap an address string without validating it.
    ///
    /// Used for values produced by address derivation and for addresses echoed
    /// back by the node.
    pub fn new_unchecked(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Return the raw address string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Cheap shape check (prefix only). Use the crypto crate for full validation.
    pub fn has_known_prefix(&self) -> bool {
        self.0.starts_with(Self::PREFIX) || self.0.starts_with(Self::LEGACY_PREFIX)
    }
}

impl fmt::Display for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Account {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
