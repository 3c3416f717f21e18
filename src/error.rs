use std::path::PathBuf;

use thiserror::Error;

/// Transport-level failures of a [`crate::backend::Backend`] call.
///
/// A request the backend understood but declined is not an error; it comes
/// back as a [`crate::types::ControlReply`] with `success: false`.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed record on line {line}: {source}")]
    Decode {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("event channel closed")]
    ChannelClosed,

    #[error("control task failed: {0}")]
    Task(String),
}

pub type BackendResult<T> = Result<T, BackendError>;
