//! Relay progress.

use serde::Serialize;
use std::fmt;

/// How far a relay has got. Each step is only taken once the previous one has
/// been accepted by the ledger.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RelayStage {
    Idle,
    /// The original balance has been sent to the secondary account.
    SentOut,
    ReceivedBySecondary,
    /// The secondary balance has been sent back to the original account.
    SentBack,
    /// Terminal success.
    ReceivedByOriginal,
}

impl RelayStage {
    pub fn next(self) -> Option<Self> {
        match self {
            Self::Idle => Some(Self::SentOut),
            Self::SentOut => Some(Self::ReceivedBySecondary),
            Self::ReceivedBySecondary => Some(Self::SentBack),
            Self::SentBack => Some(Self::ReceivedByOriginal),
            Self::ReceivedByOriginal => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        self == Self::ReceivedByOriginal
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::SentOut => "sent_out",
            Self::ReceivedBySecondary => "received_by_secondary",
            Self::SentBack => "sent_back",
            Self::ReceivedByOriginal => "received_by_original",
        }
    }
}

impl fmt::Display for RelayStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A relay is either at some stage or has stopped short of the end.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RelayState {
    At(RelayStage),
    Aborted { at: RelayStage, reason: String },
}

impl RelayState {
    pub fn is_terminal(&self) -> bool {
        match self {
            Self::At(stage) => stage.is_terminal(),
            Self::Aborted { .. } => true,
        }
    }
}
