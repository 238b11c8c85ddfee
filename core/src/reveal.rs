//! Opening a relay token, with on-chain provenance.

use relay_rpc::LedgerClient;
use relay_types::{Account, BlockHash, Raw, Timestamp};
use serde::Serialize;

use crate::codec::RelayToken;
use crate::error::RevealError;

/// A decrypted message and the confirmed send that vouches for it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Revealed {
    pub message: String,
    pub secondary: Account,
    /// When the node first saw the secondary's send back to the recipient.
    pub timestamp: Timestamp,
    pub hash: BlockHash,
    pub amount: Raw,
}

/// Decode `token`, open it for `recipient`, then find the newest send from the
/// token's secondary account to `recipient` within `history_limit` blocks.
///
/// Token and decryption errors are reported before the ledger is contacted.
pub async fn reveal<L: LedgerClient + ?Sized>(
    ledger: &L,
    token: &str,
    recipient: &Account,
    history_limit: usize,
) -> Result<Revealed, RevealError> {
    let token = RelayToken::decode(token)?;
    let message = token.open(recipient)?;

    let send = ledger
        .find_send(&token.secondary, recipient, history_limit)
        .await?;
    tracing::debug!(
        secondary = %token.secondary,
        hash = %send.hash,
        timestamp = send.local_timestamp.as_secs(),
        "provenance found"
    );

    Ok(Revealed {
        message,
        secondary: token.secondary,
        timestamp: send.local_timestamp,
        hash: send.hash,
        amount: send.amount,
    })
}
