use thiserror::Error;

/// All errors produced by polyglot-core.
#[derive(Debug, Error)]
pub enum PolyglotError {
    #[error("detector error: {0}")]
    Detector(String),

    #[error("persistence error: {0}")]
    Persistence(String),

    #[error("corrupt snapshot record `{record}`: {detail}")]
    CorruptSnapshot { record: &'static str, detail: String },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, PolyglotError>;
