use thiserror::Error;

#[derive(Debug, Error)]
pub enum WorkError {
    #[error("work difficulty {actual:016x} below minimum {minimum:016x}")]
    InsufficientDifficulty { actual: u64, minimum: u64 },

    #[error("work generation cancelled")]
    Cancelled,

    #[error("work generation failed: {0}")]
    GenerationFailed(String),

    #[error("malformed work value {0:?}")]
    MalformedWork(String),

    #[error("invalid difficulty {0:?}: expected up to 16 hex digits")]
    InvalidDifficulty(String),
}
