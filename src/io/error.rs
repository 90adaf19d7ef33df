use std::path::PathBuf;

use super::backend::BackendKind;
use super::{AccessType, Format, OperationKind};

/// Errors raised while constructing a handler or executing its queue
#[derive(Debug, thiserror::Error)]
pub enum HandlerError {
    /// The backend's native library is not part of this build
    #[error("openPMD built without {backend} support")]
    BackendUnavailable {
        /// Backend that was requested
        backend: BackendKind,
    },

    /// A parallel communicator was supplied but no parallel backend exists
    #[error("No parallel {format} backend available for {ranks} ranks")]
    ParallelUnavailable {
        /// Requested storage format
        format: Format,
        /// Number of participating ranks
        ranks: usize,
    },

    /// A mutating operation was queued against read-only storage
    #[error("Can not perform {operation} in {access} mode")]
    AccessViolation {
        /// Rejected operation
        operation: OperationKind,
        /// Access mode of the handler
        access: AccessType,
    },

    /// A file to open does not exist
    #[error("No such file: {0}")]
    NoSuchFile(PathBuf),

    /// A group path to open does not exist
    #[error("No such path: {0}")]
    NoSuchPath(String),

    /// An attribute to read does not exist
    #[error("No such attribute: {0}")]
    NoSuchAttribute(String),

    /// The target has no known position in storage
    #[error("{operation} on an object that was never created or opened")]
    Unpositioned {
        /// Operation that needed the position
        operation: OperationKind,
    },

    /// Generic failure reported by a backend
    #[error("{operation} failed: {message}")]
    TaskFailed {
        /// Failing operation
        operation: OperationKind,
        /// Backend-specific description
        message: String,
    },

    /// The backend dropped a flush without reporting its outcome
    #[error("Flush aborted before completion")]
    FlushAborted,

    /// I/O error from the filesystem
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
