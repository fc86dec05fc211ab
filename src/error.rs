//! Error types shared by the engine seams

use thiserror::Error;

/// Failure of a single catalogue call. Every kind is handled the same way by
/// the engine: the triggering hook aborts and prior state is left untouched.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RemoteError {
    #[error("remote returned status {0}")]
    Status(i64),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("malformed payload: {0}")]
    Malformed(String),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store io: {0}")]
    Io(#[from] std::io::Error),
    #[error("could not encode record: {0}")]
    Encode(String),
    #[error("could not decode record: {0}")]
    Decode(String),
}
