use reef_engine::EngineError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ListError {
    #[error("invalid list meta key")]
    InvalidMetaKey,

    #[error("invalid list key")]
    InvalidListKey,

    #[error("invalid list meta data")]
    InvalidMeta,

    #[error("invalid list sequence, overflow")]
    InvalidSeq,

    #[error("invalid list index")]
    InvalidIndex,

    #[error("too many items in batch")]
    TooMuchBatchSize,

    #[error("invalid key size")]
    InvalidKeySize,

    #[error("invalid table name")]
    InvalidTableName,

    #[error(transparent)]
    Engine(#[from] EngineError),
}

pub type Result<T> = std::result::Result<T, ListError>;
