use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Sink I/O error on {path}: {source}")]
    SinkIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed event record at {path}:{line}: {source}")]
    MalformedRecord {
        path: PathBuf,
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("Event serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
