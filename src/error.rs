use std::path::PathBuf;
use thiserror::Error;

/// Contract violations found while validating a stored album document.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RecordError {
    #[error("album document has no id")]
    MissingId,

    #[error("album document stored under {key:?} carries id {embedded:?}")]
    IdMismatch { key: String, embedded: String },

    #[error("album {id:?} has an invalid {field} timestamp: {reason}")]
    InvalidTimestamp {
        id: String,
        field: &'static str,
        reason: String,
    },
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to access {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to decode album documents: {0}")]
    Decode(#[from] serde_json::Error),

    #[error(transparent)]
    Record(#[from] RecordError),

    #[error("album {0:?} is not in the collection")]
    NotFound(String),

    #[error("album {0:?} is already in the collection")]
    AlreadyExists(String),
}
