// crates/vtrans-engine/src/error.rs
//
// Crate-wide error type. Intentionally decoupled from `anyhow` so downstream
// consumers (vtrans-cli, or any other frontend) aren't forced to adopt it in
// their own public APIs.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("setup error: {0}")]
    Setup(String),

    #[error("{collaborator} failed for stream {stream:?}: {detail}")]
    Collaborator {
        collaborator: &'static str,
        stream: crate::StreamId,
        detail: String,
    },

    #[error("decode error rate {rate:.4} exceeds maximum {max:.4}")]
    ErrorRateExceeded { rate: f64, max: f64 },

    #[error("out of memory")]
    OutOfMemory,

    #[error("{0}")]
    Other(String),
}

impl Error {
    pub fn collaborator(collaborator: &'static str, stream: crate::StreamId, detail: impl Into<String>) -> Self {
        Error::Collaborator { collaborator, stream, detail: detail.into() }
    }
}
