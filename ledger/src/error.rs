use relay_crypto::KeyError;
use relay_types::{Account, Raw};
use relay_work::WorkError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("insufficient balance: account {account} has nothing to send")]
    InsufficientBalance { account: Account },

    #[error("balance overflow on {account}: {balance} + {amount} exceeds 128 bits")]
    BalanceOverflow {
        account: Account,
        balance: Raw,
        amount: Raw,
    },

    #[error("secret does not own account {expected} (derives {actual})")]
    KeyMismatch { expected: Account, actual: Account },

    #[error(transparent)]
    Key(#[from] KeyError),

    #[error("work generation failed: {0}")]
    Work(#[from] WorkError),
}
