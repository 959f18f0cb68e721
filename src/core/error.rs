use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Storage error: {0}")]
    Storage(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Caller input rejected before any state changed
    #[error("{0}")]
    Validation(String),

    /// The inference round trip (or persisting its result) failed
    #[error("Analysis failed: {0}")]
    Analysis(String),

    #[error("Pipeline busy: {0}")]
    Busy(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;
